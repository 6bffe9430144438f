//! Staging of per-execution workspace directories.
//!
//! Every execution gets a fresh directory named by a v4 uuid, holding exactly
//! the submitted source and its input payload. The directory is the isolation
//! boundary between submissions: it is owned by one in-flight execution,
//! bind-mounted read-only into that execution's container, and removed on
//! every exit path.

use std::path::{Path, PathBuf};

use tokio::fs;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::error::ProvisioningError;
use crate::types::Submission;

/// File name the interpreter is pointed at inside the sandbox.
pub const SOURCE_FILE: &str = "main.py";
/// File name redirected onto the program's standard input.
pub const INPUT_FILE: &str = "input.txt";

/// A staged, exclusively owned execution directory.
#[derive(Debug)]
pub struct Workspace {
    id: String,
    dir: PathBuf,
}

impl Workspace {
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Absolute host path of the staged directory.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn source_path(&self) -> PathBuf {
        self.dir.join(SOURCE_FILE)
    }

    pub fn input_path(&self) -> PathBuf {
        self.dir.join(INPUT_FILE)
    }
}

/// Creates and destroys workspaces under a single root directory.
#[derive(Debug, Clone)]
pub struct WorkspaceManager {
    root: PathBuf,
}

impl WorkspaceManager {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Stage a fresh workspace holding the submission's source and input.
    ///
    /// The directory name is a freshly generated uuid, so concurrent
    /// executions never share a path. If staging fails after the directory
    /// was created, the partial directory is removed before the error is
    /// returned.
    pub async fn provision(&self, submission: &Submission) -> Result<Workspace, ProvisioningError> {
        let id = Uuid::new_v4().to_string();
        let dir = self.absolute_root()?.join(&id);

        fs::create_dir_all(&dir).await.map_err(|source| ProvisioningError {
            path: dir.clone(),
            source,
        })?;

        let workspace = Workspace { id, dir };
        if let Err(err) = stage_files(&workspace, submission).await {
            self.destroy(&workspace).await;
            return Err(err);
        }

        debug!(workspace = %workspace.id, dir = %workspace.dir.display(), "workspace staged");
        Ok(workspace)
    }

    /// Recursively remove a workspace directory.
    ///
    /// Failure to remove is logged, never escalated: a stale directory must
    /// not mask or override the owning execution's result.
    pub async fn destroy(&self, workspace: &Workspace) {
        match fs::remove_dir_all(workspace.dir()).await {
            Ok(()) => debug!(workspace = %workspace.id, "workspace removed"),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {}
            Err(err) => {
                warn!(
                    workspace = %workspace.id,
                    dir = %workspace.dir.display(),
                    error = %err,
                    "failed to remove workspace"
                );
            }
        }
    }

    // The container daemon resolves bind sources against its own filesystem,
    // so the host side of the bind must be absolute.
    fn absolute_root(&self) -> Result<PathBuf, ProvisioningError> {
        if self.root.is_absolute() {
            return Ok(self.root.clone());
        }
        let cwd = std::env::current_dir().map_err(|source| ProvisioningError {
            path: self.root.clone(),
            source,
        })?;
        Ok(cwd.join(&self.root))
    }
}

async fn stage_files(workspace: &Workspace, submission: &Submission) -> Result<(), ProvisioningError> {
    fs::write(workspace.source_path(), &submission.source_code)
        .await
        .map_err(|source| ProvisioningError {
            path: workspace.source_path(),
            source,
        })?;

    fs::write(workspace.input_path(), &submission.stdin)
        .await
        .map_err(|source| ProvisioningError {
            path: workspace.input_path(),
            source,
        })?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scratch_root() -> PathBuf {
        std::env::temp_dir().join(format!("coderoom-ws-test-{}", Uuid::new_v4()))
    }

    #[tokio::test]
    async fn provision_stages_source_and_input() {
        let root = scratch_root();
        let manager = WorkspaceManager::new(&root);
        let submission = Submission::new("print('hi')", "5\n10");

        let workspace = manager.provision(&submission).await.unwrap();

        assert_eq!(
            fs::read_to_string(workspace.source_path()).await.unwrap(),
            "print('hi')"
        );
        assert_eq!(
            fs::read_to_string(workspace.input_path()).await.unwrap(),
            "5\n10"
        );
        assert!(workspace.dir().is_absolute());

        manager.destroy(&workspace).await;
        let _ = fs::remove_dir_all(&root).await;
    }

    #[tokio::test]
    async fn empty_input_is_staged_not_rejected() {
        let root = scratch_root();
        let manager = WorkspaceManager::new(&root);

        let workspace = manager
            .provision(&Submission::new("", ""))
            .await
            .unwrap();

        assert_eq!(fs::read_to_string(workspace.input_path()).await.unwrap(), "");
        assert_eq!(fs::read_to_string(workspace.source_path()).await.unwrap(), "");

        manager.destroy(&workspace).await;
        let _ = fs::remove_dir_all(&root).await;
    }

    #[tokio::test]
    async fn concurrent_provisions_never_collide() {
        let root = scratch_root();
        let manager = WorkspaceManager::new(&root);
        let submission = Submission::new("pass", "");

        let a = manager.provision(&submission).await.unwrap();
        let b = manager.provision(&submission).await.unwrap();

        assert_ne!(a.id(), b.id());
        assert_ne!(a.dir(), b.dir());

        manager.destroy(&a).await;
        manager.destroy(&b).await;
        let _ = fs::remove_dir_all(&root).await;
    }

    #[tokio::test]
    async fn destroy_removes_the_directory() {
        let root = scratch_root();
        let manager = WorkspaceManager::new(&root);

        let workspace = manager
            .provision(&Submission::new("pass", ""))
            .await
            .unwrap();
        let dir = workspace.dir().to_path_buf();
        assert!(dir.exists());

        manager.destroy(&workspace).await;
        assert!(!dir.exists());

        let _ = fs::remove_dir_all(&root).await;
    }

    #[tokio::test]
    async fn destroy_tolerates_an_already_missing_directory() {
        let root = scratch_root();
        let manager = WorkspaceManager::new(&root);

        let workspace = manager
            .provision(&Submission::new("pass", ""))
            .await
            .unwrap();
        manager.destroy(&workspace).await;
        // Second call must not panic or log an error for NotFound.
        manager.destroy(&workspace).await;

        let _ = fs::remove_dir_all(&root).await;
    }

    #[tokio::test]
    async fn provision_fails_cleanly_when_root_is_a_file() {
        let root = scratch_root();
        fs::create_dir_all(root.parent().unwrap()).await.unwrap();
        fs::write(&root, "not a directory").await.unwrap();

        let manager = WorkspaceManager::new(&root);
        let err = manager
            .provision(&Submission::new("pass", ""))
            .await
            .unwrap_err();
        assert!(err.path.starts_with(&root));

        let _ = fs::remove_file(&root).await;
    }
}
