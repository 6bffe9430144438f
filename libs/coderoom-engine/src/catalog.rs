// Problem catalog boundary. The real store lives outside the engine; the
// grader only needs an ordered test-case lookup by problem id.

use std::collections::HashMap;
use std::path::Path;

use serde::Deserialize;

use crate::error::ConfigError;
use crate::types::TestCase;

/// Ordered test-case lookup by problem id.
///
/// Implementations must return the same order across calls for the same
/// problem; the grade report's `details` follow it. An unknown problem is an
/// empty sequence, which the grader reports as a no-test-cases failure.
pub trait ProblemCatalog: Send + Sync {
    fn test_cases(&self, problem_id: &str) -> Vec<TestCase>;
}

/// In-memory catalog, loadable from a JSON problems file.
///
/// File shape:
///
/// ```json
/// {
///   "problems": {
///     "sum-2-nums": [
///       { "input": "5\n10", "expectedOutput": "15", "hidden": false }
///     ]
///   }
/// }
/// ```
#[derive(Debug, Clone, Default)]
pub struct StaticCatalog {
    problems: HashMap<String, Vec<TestCase>>,
}

#[derive(Deserialize)]
struct ProblemsFile {
    problems: HashMap<String, Vec<TestCase>>,
}

impl StaticCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a problem's ordered test cases, replacing any previous entry.
    pub fn with_problem(mut self, id: impl Into<String>, cases: Vec<TestCase>) -> Self {
        self.problems.insert(id.into(), cases);
        self
    }

    /// Load a catalog from a JSON problems file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let file: ProblemsFile =
            serde_json::from_str(&content).map_err(|source| ConfigError::Parse {
                path: path.to_path_buf(),
                source,
            })?;
        Ok(Self {
            problems: file.problems,
        })
    }
}

impl ProblemCatalog for StaticCatalog {
    fn test_cases(&self, problem_id: &str) -> Vec<TestCase> {
        self.problems.get(problem_id).cloned().unwrap_or_default()
    }
}
