use std::path::PathBuf;

use thiserror::Error;

use crate::stream::DecodeError;

/// Top-level failure modes surfaced to callers of the engine.
///
/// Resource-acquisition and sandbox errors are contained per execution; the
/// grading loop degrades the affected case instead of aborting the report.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error(transparent)]
    Provisioning(#[from] ProvisioningError),

    #[error(transparent)]
    Sandbox(#[from] SandboxError),

    /// The catalog holds zero test cases for the problem. No sandbox work is
    /// performed when this is raised.
    #[error("no test cases registered for problem `{0}`")]
    NoTestCases(String),

    /// Rejected before any workspace or container resource is allocated.
    #[error("malformed request: {0}")]
    MalformedRequest(String),
}

/// The workspace directory could not be created or written.
#[derive(Debug, Error)]
#[error("could not stage workspace at {path}: {source}")]
pub struct ProvisioningError {
    pub path: PathBuf,
    #[source]
    pub source: std::io::Error,
}

/// The ephemeral execution environment failed at some lifecycle stage.
///
/// `Timeout` is its own kind so callers can distinguish a wall-clock kill
/// from an infrastructure fault.
#[derive(Debug, Error)]
pub enum SandboxError {
    #[error("failed to connect to container runtime: {0}")]
    Connect(#[source] bollard::errors::Error),

    #[error("failed to pull image `{image}`: {source}")]
    ImagePull {
        image: String,
        #[source]
        source: bollard::errors::Error,
    },

    #[error("failed to create container: {0}")]
    Create(#[source] bollard::errors::Error),

    #[error("failed to start container: {0}")]
    Start(#[source] bollard::errors::Error),

    #[error("error while waiting for container exit: {0}")]
    Wait(#[source] bollard::errors::Error),

    #[error("failed to retrieve container logs: {0}")]
    Logs(#[source] bollard::errors::Error),

    #[error("execution exceeded the {limit_ms}ms wall-clock limit")]
    Timeout { limit_ms: u64 },

    #[error("malformed output stream: {0}")]
    Stream(#[from] DecodeError),
}

/// A configuration or catalog file could not be loaded.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("could not parse {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}
