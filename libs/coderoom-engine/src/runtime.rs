//! The sandbox runtime boundary and its Docker implementation.
//!
//! `SandboxRuntime` is the injected dependency of the execution pipeline:
//! given a staged workspace, run the submission to completion inside an
//! isolated environment and return the raw multiplexed log stream. Production
//! talks to the Docker daemon through bollard; tests substitute deterministic
//! doubles that answer in the same wire format.

use std::future::Future;
use std::time::Duration;

use bollard::container::{
    Config, CreateContainerOptions, KillContainerOptions, LogOutput, LogsOptions,
    RemoveContainerOptions, StartContainerOptions, WaitContainerOptions,
};
use bollard::image::CreateImageOptions;
use bollard::models::HostConfig;
use bollard::Docker;
use futures_util::stream::StreamExt;
use tracing::{debug, info, warn};

use crate::config::RuntimeConfig;
use crate::error::SandboxError;
use crate::stream::{self, STDERR_FRAME, STDOUT_FRAME};
use crate::workspace::{Workspace, INPUT_FILE, SOURCE_FILE};

/// Fixed path the workspace is bind-mounted at inside the environment.
pub const MOUNT_POINT: &str = "/submission";

/// An execution backend that runs one staged submission to completion.
///
/// Contract: one ephemeral, single-use environment per call, destroyed before
/// the call returns regardless of outcome. The returned bytes are the
/// environment's combined log stream in the multiplexed frame format decoded
/// by [`stream::demux`]. Side effects are confined to the environment and the
/// read-only-mounted workspace.
pub trait SandboxRuntime: Send + Sync {
    fn execute(
        &self,
        workspace: &Workspace,
    ) -> impl Future<Output = Result<Vec<u8>, SandboxError>> + Send;
}

/// Removes the container on drop, so cleanup happens even if the owning
/// future is dropped mid-run.
struct ContainerGuard {
    docker: Docker,
    container_id: String,
}

impl Drop for ContainerGuard {
    fn drop(&mut self) {
        // Drop cannot be async; hand removal to the runtime.
        let docker = self.docker.clone();
        let container_id = self.container_id.clone();

        tokio::spawn(async move {
            let options = RemoveContainerOptions {
                force: true,
                ..Default::default()
            };
            if let Err(err) = docker.remove_container(&container_id, Some(options)).await {
                warn!(container = %container_id, error = %err, "failed to remove container");
            }
        });
    }
}

/// Docker-backed sandbox.
///
/// Each run gets a fresh container with the workspace bind-mounted read-only
/// at [`MOUNT_POINT`], network access disabled, memory capped, and `Tty` off
/// so the daemon keeps stdout and stderr in separate frames. The staged input
/// file is redirected onto stdin by the container's own shell, keeping the
/// sandbox's I/O isolation intact.
pub struct DockerRuntime {
    docker: Docker,
    config: RuntimeConfig,
}

impl DockerRuntime {
    /// Connect to the local Docker daemon.
    pub fn new(config: RuntimeConfig) -> Result<Self, SandboxError> {
        let docker = Docker::connect_with_local_defaults().map_err(SandboxError::Connect)?;
        Ok(Self { docker, config })
    }

    /// Verify the runtime image is present, pulling it on a cache miss.
    async fn ensure_image(&self) -> Result<(), SandboxError> {
        if self.docker.inspect_image(&self.config.image).await.is_ok() {
            debug!(image = %self.config.image, "image cache hit");
            return Ok(());
        }

        warn!(image = %self.config.image, "image cache miss, pulling");
        let options = Some(CreateImageOptions {
            from_image: self.config.image.as_str(),
            ..Default::default()
        });

        let mut pull = self.docker.create_image(options, None, None);
        while let Some(progress) = pull.next().await {
            progress.map_err(|source| SandboxError::ImagePull {
                image: self.config.image.clone(),
                source,
            })?;
        }

        info!(image = %self.config.image, "image pulled");
        Ok(())
    }

    fn container_config(&self, workspace: &Workspace) -> Config<String> {
        // Redirection happens inside the sandbox's own shell, not by piping
        // from the host.
        let command = format!(
            "{} {}/{} < {}/{}",
            self.config.interpreter, MOUNT_POINT, SOURCE_FILE, MOUNT_POINT, INPUT_FILE
        );

        Config {
            image: Some(self.config.image.clone()),
            cmd: Some(vec!["sh".to_string(), "-c".to_string(), command]),
            attach_stdout: Some(true),
            attach_stderr: Some(true),
            network_disabled: Some(true),
            // Tty would merge the streams into one unframed byte soup.
            tty: Some(false),
            host_config: Some(HostConfig {
                binds: Some(vec![format!("{}:{}:ro", workspace.dir().display(), MOUNT_POINT)]),
                memory: Some((self.config.memory_limit_mib * 1024 * 1024) as i64),
                network_mode: Some("none".to_string()),
                ..Default::default()
            }),
            ..Default::default()
        }
    }

    /// Block until the container exits, enforcing the wall-clock limit.
    async fn wait_for_exit(&self, container_id: &str) -> Result<(), SandboxError> {
        let wait = async {
            let options = WaitContainerOptions {
                condition: "not-running",
            };
            let mut stream = self.docker.wait_container(container_id, Some(options));
            match stream.next().await {
                Some(Ok(response)) => {
                    debug!(container = %container_id, exit_code = response.status_code, "container exited");
                    Ok(())
                }
                // A non-zero exit code is the submission's failure, not ours;
                // its stderr is still wanted for the error log.
                Some(Err(bollard::errors::Error::DockerContainerWaitError { code, .. })) => {
                    debug!(container = %container_id, exit_code = code, "container exited nonzero");
                    Ok(())
                }
                Some(Err(err)) => Err(SandboxError::Wait(err)),
                None => Ok(()),
            }
        };

        let limit = Duration::from_millis(self.config.run_timeout_ms);
        match tokio::time::timeout(limit, wait).await {
            Ok(result) => result,
            Err(_) => {
                warn!(container = %container_id, limit_ms = self.config.run_timeout_ms, "run timed out, killing container");
                if let Err(err) = self
                    .docker
                    .kill_container(container_id, None::<KillContainerOptions<String>>)
                    .await
                {
                    warn!(container = %container_id, error = %err, "failed to kill timed-out container");
                }
                Err(SandboxError::Timeout {
                    limit_ms: self.config.run_timeout_ms,
                })
            }
        }
    }

    /// Retrieve the completed container's combined log stream as wire-format
    /// multiplexed bytes.
    async fn collect_logs(&self, container_id: &str) -> Result<Vec<u8>, SandboxError> {
        let options = LogsOptions::<String> {
            stdout: true,
            stderr: true,
            follow: false,
            ..Default::default()
        };

        // bollard parses the daemon's frames on receipt; the runtime contract
        // is the wire stream itself, so frames are re-encoded untouched.
        let mut logs = self.docker.logs(container_id, Some(options));
        let mut raw = Vec::new();
        while let Some(entry) = logs.next().await {
            match entry.map_err(SandboxError::Logs)? {
                LogOutput::StdOut { message } => raw.extend(stream::frame(STDOUT_FRAME, &message)),
                LogOutput::StdErr { message } => raw.extend(stream::frame(STDERR_FRAME, &message)),
                _ => {}
            }
        }
        Ok(raw)
    }
}

impl SandboxRuntime for DockerRuntime {
    async fn execute(&self, workspace: &Workspace) -> Result<Vec<u8>, SandboxError> {
        self.ensure_image().await?;

        let name = format!("coderoom-{}", workspace.id());
        let options = CreateContainerOptions {
            name: name.as_str(),
            platform: None,
        };

        let container = self
            .docker
            .create_container(Some(options), self.container_config(workspace))
            .await
            .map_err(SandboxError::Create)?;

        // Guard goes up before start so the container cannot outlive this
        // call on any path.
        let _guard = ContainerGuard {
            docker: self.docker.clone(),
            container_id: container.id.clone(),
        };

        self.docker
            .start_container(&container.id, None::<StartContainerOptions<String>>)
            .await
            .map_err(SandboxError::Start)?;

        self.wait_for_exit(&container.id).await?;
        self.collect_logs(&container.id).await
    }
}
