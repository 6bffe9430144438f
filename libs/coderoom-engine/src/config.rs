// Engine configuration with JSON-file loading.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Settings for the ephemeral execution environment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuntimeConfig {
    /// Image providing the target language interpreter.
    #[serde(default = "default_image")]
    pub image: String,

    /// Interpreter binary invoked against the staged source.
    #[serde(default = "default_interpreter")]
    pub interpreter: String,

    /// Memory ceiling for one run, in MiB.
    #[serde(default = "default_memory_limit_mib")]
    pub memory_limit_mib: u64,

    /// Wall-clock limit for one run. On expiry the container is killed and
    /// the run surfaces as a timeout.
    #[serde(default = "default_run_timeout_ms")]
    pub run_timeout_ms: u64,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            image: default_image(),
            interpreter: default_interpreter(),
            memory_limit_mib: default_memory_limit_mib(),
            run_timeout_ms: default_run_timeout_ms(),
        }
    }
}

/// Top-level engine configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    #[serde(default)]
    pub runtime: RuntimeConfig,

    /// Root directory under which per-execution workspaces are staged.
    #[serde(default = "default_workspace_root")]
    pub workspace_root: PathBuf,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            runtime: RuntimeConfig::default(),
            workspace_root: default_workspace_root(),
        }
    }
}

impl EngineConfig {
    /// Load configuration from a JSON file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }
}

fn default_image() -> String {
    "python:3.10-alpine".to_string()
}

fn default_interpreter() -> String {
    "python".to_string()
}

fn default_memory_limit_mib() -> u64 {
    100
}

fn default_run_timeout_ms() -> u64 {
    5000
}

fn default_workspace_root() -> PathBuf {
    PathBuf::from("temp")
}
