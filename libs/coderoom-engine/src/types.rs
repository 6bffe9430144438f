use serde::{Deserialize, Serialize};

/// One submitted program together with the text fed to its standard input.
///
/// Submissions are transient: they exist for the duration of a single
/// execution and are never persisted.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Submission {
    pub source_code: String,
    /// Empty input is valid, not an error.
    pub stdin: String,
}

impl Submission {
    pub fn new(source_code: impl Into<String>, stdin: impl Into<String>) -> Self {
        Self {
            source_code: source_code.into(),
            stdin: stdin.into(),
        }
    }
}

/// Captured output of one sandbox run, already split into streams.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionResult {
    pub stdout: String,
    pub stderr: String,
}

/// One input/expected-output pair from the problem catalog.
///
/// `hidden` is a presentation concern of the caller; hidden cases are graded
/// exactly like visible ones.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestCase {
    pub input: String,
    pub expected_output: String,
    #[serde(default)]
    pub hidden: bool,
}

/// Verdict for a single test case, reported regardless of pass/fail.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CaseResult {
    pub input: String,
    pub expected: String,
    pub actual: String,
    pub passed: bool,
    /// Stderr text (or an internal error marker) when the case did not run
    /// cleanly; empty for clean passes.
    pub error_log: String,
}

/// Aggregated scoring result for one submission against one problem.
///
/// Entries in `details` follow catalog order. `score` is the integer percent
/// `round(100 * passed_tests / total_tests)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GradeReport {
    pub score: u8,
    pub total_tests: u32,
    pub passed_tests: u32,
    pub details: Vec<CaseResult>,
}

/// Result shape handed to the presentation layer, discriminated by `kind`
/// so callers never have to sniff fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum RunOutcome {
    ScratchRun(ExecutionResult),
    Grade(GradeReport),
}
