//! Multi-case grading over the execution pipeline.
//!
//! Comparison rules, applied identically to every case:
//! - actual stdout and expected output are compared trim-equal (leading and
//!   trailing whitespace ignored, internal whitespace significant)
//! - a case passes only if the outputs match and stderr is empty; any stderr
//!   text fails the case and becomes its error log

use tracing::{info, warn};

use crate::catalog::ProblemCatalog;
use crate::error::EngineError;
use crate::runner::{self, SubmissionRunner};
use crate::runtime::SandboxRuntime;
use crate::types::{CaseResult, ExecutionResult, GradeReport, Submission};

/// Grades submissions against a problem catalog, one sandbox run per case.
pub struct Grader<R, C> {
    runner: SubmissionRunner<R>,
    catalog: C,
}

impl<R: SandboxRuntime, C: ProblemCatalog> Grader<R, C> {
    pub fn new(runner: SubmissionRunner<R>, catalog: C) -> Self {
        Self { runner, catalog }
    }

    /// Run the submission against every test case of the problem, in catalog
    /// order, and aggregate a score report.
    ///
    /// Cases are evaluated independently: a sandbox or provisioning failure
    /// degrades that case to a failure with an error log and grading
    /// continues. Fails with [`EngineError::NoTestCases`] before any sandbox
    /// work when the catalog has nothing for the problem.
    pub async fn grade(
        &self,
        problem_id: &str,
        source_code: &str,
    ) -> Result<GradeReport, EngineError> {
        if problem_id.trim().is_empty() {
            return Err(EngineError::MalformedRequest(
                "problem id must not be empty".to_string(),
            ));
        }
        runner::validate(&Submission::new(source_code, ""))?;

        let cases = self.catalog.test_cases(problem_id);
        if cases.is_empty() {
            return Err(EngineError::NoTestCases(problem_id.to_string()));
        }

        let mut details = Vec::with_capacity(cases.len());
        let mut passed_count = 0usize;

        for case in &cases {
            let submission = Submission::new(source_code, case.input.clone());
            let result = match self.runner.run(&submission).await {
                Ok(result) => result,
                Err(err) => {
                    warn!(problem = problem_id, error = %err, "case degraded to failure");
                    ExecutionResult {
                        stdout: String::new(),
                        stderr: format!("[internal error: {err}]"),
                    }
                }
            };

            let output_matches = result.stdout.trim() == case.expected_output.trim();
            let passed = output_matches && result.stderr.is_empty();
            if passed {
                passed_count += 1;
            }

            details.push(CaseResult {
                input: case.input.clone(),
                expected: case.expected_output.clone(),
                actual: result.stdout,
                passed,
                error_log: result.stderr,
            });
        }

        let report = GradeReport {
            score: score(passed_count, cases.len()),
            total_tests: cases.len() as u32,
            passed_tests: passed_count as u32,
            details,
        };

        info!(
            problem = problem_id,
            score = report.score,
            passed = report.passed_tests,
            total = report.total_tests,
            "grading complete"
        );
        Ok(report)
    }
}

/// Integer percent, ties rounded to nearest. Callers guarantee `total > 0`.
fn score(passed: usize, total: usize) -> u8 {
    (100.0 * passed as f64 / total as f64).round() as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn score_is_rounded_to_nearest_integer() {
        assert_eq!(score(0, 3), 0);
        assert_eq!(score(1, 3), 33);
        assert_eq!(score(2, 3), 67);
        assert_eq!(score(3, 3), 100);
        assert_eq!(score(1, 6), 17);
        assert_eq!(score(1, 2), 50);
        assert_eq!(score(1, 8), 13);
    }
}
