//! Shared fixtures: scripted sandbox runtimes that answer in the daemon's
//! multiplexed wire format, driven by the files actually staged in the
//! workspace they are handed.

// Each test binary exercises its own subset of the fixtures.
#![allow(dead_code)]

use std::path::PathBuf;

use coderoom_engine::error::SandboxError;
use coderoom_engine::runtime::SandboxRuntime;
use coderoom_engine::stream::{frame, STDERR_FRAME, STDOUT_FRAME};
use coderoom_engine::workspace::Workspace;
use uuid::Uuid;

/// Deterministic stand-ins for the container runtime.
pub enum FakeRuntime {
    /// Reads the staged input file and prints the sum of its two integers,
    /// like the reference `sum-2-nums` submission would.
    SumOfTwo,
    /// Fails every run with an interpreter-style traceback on stderr.
    Crash,
    /// Answers every run with the same raw framed bytes.
    Frames(Vec<u8>),
    /// Hits the wall-clock limit on every run.
    Timeout { limit_ms: u64 },
    /// Echoes the staged input file to stdout.
    EchoStdin,
}

impl SandboxRuntime for FakeRuntime {
    async fn execute(&self, workspace: &Workspace) -> Result<Vec<u8>, SandboxError> {
        match self {
            FakeRuntime::SumOfTwo => {
                let input = tokio::fs::read_to_string(workspace.input_path())
                    .await
                    .expect("input file must be staged");
                let sum: i64 = input
                    .split_whitespace()
                    .map(|token| token.parse::<i64>().expect("integer input"))
                    .sum();
                Ok(frame(STDOUT_FRAME, format!("{sum}\n").as_bytes()))
            }
            FakeRuntime::Crash => {
                let mut raw = frame(
                    STDERR_FRAME,
                    b"Traceback (most recent call last):\n  File \"/submission/main.py\", line 1, in <module>\n",
                );
                raw.extend(frame(STDERR_FRAME, b"ValueError: invalid literal\n"));
                Ok(raw)
            }
            FakeRuntime::Frames(raw) => Ok(raw.clone()),
            FakeRuntime::Timeout { limit_ms } => Err(SandboxError::Timeout {
                limit_ms: *limit_ms,
            }),
            FakeRuntime::EchoStdin => {
                let input = tokio::fs::read(workspace.input_path())
                    .await
                    .expect("input file must be staged");
                Ok(frame(STDOUT_FRAME, &input))
            }
        }
    }
}

/// A unique workspace root per test, so suites never observe each other.
pub fn scratch_root() -> PathBuf {
    std::env::temp_dir().join(format!("coderoom-test-{}", Uuid::new_v4()))
}

/// Count of leftover entries under a workspace root.
pub fn leftover_entries(root: &PathBuf) -> usize {
    match std::fs::read_dir(root) {
        Ok(entries) => entries.count(),
        Err(_) => 0,
    }
}
