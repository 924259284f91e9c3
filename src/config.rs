//! Optional `cbh2pgn.toml` overrides for batch behavior. An absent
//! config file is not an error; [`Config::default`] covers it.

use std::path::{Path, PathBuf};

use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    /// 0 means "number of logical CPUs", resolved by the caller.
    pub jobs: usize,
    pub always_emit_fen: bool,
    pub error_log: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Config { jobs: 0, always_emit_fen: false, error_log: None }
    }
}

impl Config {
    pub fn load(path: &Path) -> Result<Self, crate::error::AppError> {
        let text = std::fs::read_to_string(path).map_err(|source| crate::error::AppError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&text).map_err(|e| crate::error::AppError::Structural {
            file: "cbh2pgn.toml",
            detail: e.to_string(),
        })
    }

    pub fn worker_count(&self) -> usize {
        if self.jobs == 0 {
            std::thread::available_parallelism().map(|n| n.get()).unwrap_or(1)
        } else {
            self.jobs
        }
    }
}
