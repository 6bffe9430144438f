//! Sandboxed, ephemeral code execution and grading.
//!
//! Untrusted submitted source runs to completion inside a single-use Docker
//! container with the staged workspace bind-mounted read-only, no network,
//! and a fixed memory ceiling. The container's multiplexed log stream is
//! decoded into stdout/stderr, and the grader scores a submission against a
//! problem's ordered test cases, one isolated run per case, with teardown
//! guaranteed on every path.
//!
//! The moving parts, composed linearly per execution:
//!
//! - [`workspace::WorkspaceManager`] stages and destroys per-run directories
//! - [`runtime::SandboxRuntime`] runs a staged workspace in isolation
//!   ([`runtime::DockerRuntime`] in production, doubles in tests)
//! - [`stream::demux`] splits the multiplexed log stream
//! - [`runner::SubmissionRunner`] drives one execution end to end
//! - [`grader::Grader`] loops the runner over a problem's test cases

pub mod catalog;
pub mod config;
pub mod error;
pub mod grader;
pub mod runner;
pub mod runtime;
pub mod stream;
pub mod types;
pub mod workspace;

pub use catalog::{ProblemCatalog, StaticCatalog};
pub use config::{EngineConfig, RuntimeConfig};
pub use error::{ConfigError, EngineError, ProvisioningError, SandboxError};
pub use grader::Grader;
pub use runner::SubmissionRunner;
pub use runtime::{DockerRuntime, SandboxRuntime};
pub use types::{CaseResult, ExecutionResult, GradeReport, RunOutcome, Submission, TestCase};
pub use workspace::{Workspace, WorkspaceManager};
