//! Per-execution pipeline: validate, stage, run, decode, tear down.

use tracing::error;

use crate::error::{EngineError, SandboxError};
use crate::runtime::SandboxRuntime;
use crate::stream;
use crate::types::{ExecutionResult, Submission};
use crate::workspace::WorkspaceManager;

/// Upper bound on submitted source size.
pub const MAX_SOURCE_BYTES: usize = 1024 * 1024; // 1 MiB
/// Upper bound on a single run's input size.
pub const MAX_STDIN_BYTES: usize = 10 * 1024 * 1024; // 10 MiB

/// Runs one submission at a time through an injected sandbox runtime.
///
/// Each call stages a fresh workspace, executes inside a fresh environment,
/// decodes the multiplexed output, and destroys the workspace on every exit
/// path. Sandbox failures do not propagate: they surface as an execution with
/// empty stdout and a bracketed error marker on stderr, so a single bad
/// submission never takes down a grading loop.
pub struct SubmissionRunner<R> {
    runtime: R,
    workspaces: WorkspaceManager,
}

impl<R: SandboxRuntime> SubmissionRunner<R> {
    pub fn new(runtime: R, workspaces: WorkspaceManager) -> Self {
        Self { runtime, workspaces }
    }

    /// Execute a submission to completion and return its captured output.
    ///
    /// Errors only on rejected requests and on workspace provisioning
    /// failures, both of which occur before or instead of sandbox work.
    pub async fn run(&self, submission: &Submission) -> Result<ExecutionResult, EngineError> {
        validate(submission)?;

        let workspace = self.workspaces.provision(submission).await?;
        let outcome = self.execute_and_decode(&workspace).await;
        // Teardown runs before any error is surfaced.
        self.workspaces.destroy(&workspace).await;

        match outcome {
            Ok(result) => Ok(result),
            Err(err) => {
                error!(error = %err, "sandbox execution failed");
                Ok(ExecutionResult {
                    stdout: String::new(),
                    stderr: error_marker(&err),
                })
            }
        }
    }

    async fn execute_and_decode(
        &self,
        workspace: &crate::workspace::Workspace,
    ) -> Result<ExecutionResult, SandboxError> {
        let raw = self.runtime.execute(workspace).await?;
        Ok(stream::demux(&raw)?)
    }
}

/// Reject oversized requests before any workspace or container resource is
/// allocated. An empty source is a valid, executable submission.
pub(crate) fn validate(submission: &Submission) -> Result<(), EngineError> {
    if submission.source_code.len() > MAX_SOURCE_BYTES {
        return Err(EngineError::MalformedRequest(format!(
            "source code exceeds maximum size of {MAX_SOURCE_BYTES} bytes"
        )));
    }
    if submission.stdin.len() > MAX_STDIN_BYTES {
        return Err(EngineError::MalformedRequest(format!(
            "input exceeds maximum size of {MAX_STDIN_BYTES} bytes"
        )));
    }
    Ok(())
}

fn error_marker(err: &SandboxError) -> String {
    match err {
        SandboxError::Timeout { limit_ms } => {
            format!("[execution timed out after {limit_ms}ms]")
        }
        other => format!("[sandbox error: {other}]"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_submission_is_valid() {
        assert!(validate(&Submission::new("", "")).is_ok());
    }

    #[test]
    fn oversized_source_is_rejected() {
        let submission = Submission::new("x".repeat(MAX_SOURCE_BYTES + 1), "");
        let err = validate(&submission).unwrap_err();
        assert!(matches!(err, EngineError::MalformedRequest(_)));
    }

    #[test]
    fn oversized_input_is_rejected() {
        let submission = Submission::new("print(input())", "y".repeat(MAX_STDIN_BYTES + 1));
        let err = validate(&submission).unwrap_err();
        assert!(matches!(err, EngineError::MalformedRequest(_)));
    }

    #[test]
    fn timeout_marker_names_the_limit() {
        let marker = error_marker(&SandboxError::Timeout { limit_ms: 5000 });
        assert_eq!(marker, "[execution timed out after 5000ms]");
    }
}
