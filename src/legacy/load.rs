//! Reading legacy documents from YAML

use super::types::LegacyConfig;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors that can occur while loading a legacy document
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("cannot read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("scrape config #{0} has no job_name")]
    MissingJobName(usize),

    #[error("duplicate job_name: {0}")]
    DuplicateJob(String),
}

/// Result type for loading
pub type LoadResult<T> = Result<T, LoadError>;

impl LegacyConfig {
    /// Parse and check a legacy document
    pub fn from_yaml(text: &str) -> LoadResult<Self> {
        let config: LegacyConfig = serde_yaml::from_str(text)?;
        config.check()?;
        Ok(config)
    }

    /// Read and parse a legacy document from disk
    pub fn load(path: impl AsRef<Path>) -> LoadResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| LoadError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_yaml(&text)
    }

    /// Job names must be present and distinct
    fn check(&self) -> LoadResult<()> {
        let mut seen = HashSet::new();
        for (i, job) in self.jobs.iter().enumerate() {
            if job.name.is_empty() {
                return Err(LoadError::MissingJobName(i));
            }
            if !seen.insert(job.name.as_str()) {
                return Err(LoadError::DuplicateJob(job.name.clone()));
            }
        }
        Ok(())
    }
}
