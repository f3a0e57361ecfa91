//! Conversion errors and per-stanza diagnostics

use crate::graph::{FieldType, GraphError};
use serde::Serialize;
use thiserror::Error;

/// Why a field mapper could not produce an argument record
#[derive(Debug, Clone, PartialEq, Error)]
pub enum MapError {
    #[error("no field mapper registered for discovery kind '{0}'")]
    UnknownKind(String),

    #[error("{mapper} mapper cannot map a '{found}' stanza")]
    KindMismatch { mapper: String, found: String },

    #[error("unsupported docker filter '{0}'")]
    UnsupportedFilter(String),

    #[error("{0}")]
    Invalid(String),
}

/// Errors from converting a job.
///
/// `Unmappable` is stanza-local and ends up as a [`Diagnostic`]. The other
/// variants mean the converter itself is wrong and abort the run.
#[derive(Debug, Error)]
pub enum ConvertError {
    #[error("job '{job}' stanza #{index}: {source}")]
    Unmappable {
        job: String,
        index: usize,
        kind: String,
        #[source]
        source: MapError,
    },

    #[error(transparent)]
    Graph(#[from] GraphError),

    #[error("override for {field_type:?} in {block} needs {missing}, which this context does not provide")]
    MissingContext {
        field_type: FieldType,
        block: String,
        missing: &'static str,
    },
}

impl ConvertError {
    /// True for errors that only concern one stanza
    pub fn is_stanza_local(&self) -> bool {
        matches!(self, ConvertError::Unmappable { .. })
    }
}

/// A problem with one stanza (or one job) that did not stop conversion
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Diagnostic {
    pub job: String,
    /// Stanza ordinal, or `None` when the whole job was skipped
    pub stanza: Option<usize>,
    pub kind: Option<String>,
    pub message: String,
}

impl Diagnostic {
    pub fn for_job(job: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            job: job.into(),
            stanza: None,
            kind: None,
            message: message.into(),
        }
    }
}

impl std::fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match (self.stanza, &self.kind) {
            (Some(i), Some(kind)) => write!(f, "job '{}' stanza #{} ({}): {}", self.job, i, kind, self.message),
            (Some(i), None) => write!(f, "job '{}' stanza #{}: {}", self.job, i, self.message),
            _ => write!(f, "job '{}': {}", self.job, self.message),
        }
    }
}

impl TryFrom<ConvertError> for Diagnostic {
    type Error = ConvertError;

    /// Stanza-local errors become diagnostics; anything else is handed back
    fn try_from(err: ConvertError) -> Result<Self, Self::Error> {
        match err {
            ConvertError::Unmappable { job, index, kind, source } => Ok(Diagnostic {
                job,
                stanza: Some(index),
                kind: Some(kind),
                message: source.to_string(),
            }),
            other => Err(other),
        }
    }
}
