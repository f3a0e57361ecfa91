//! Pipeline-wide conversion settings

use crate::graph::{BlockName, Reference};

/// Type path of the write block every job's sink forwards to
pub const WRITE_BLOCK: &[&str] = &["loki", "write"];

/// Label of the default write block
pub const DEFAULT_WRITE_LABEL: &str = "default";

/// Settings shared by every job of one conversion
#[derive(Debug, Clone)]
pub struct ConvertOptions {
    /// Prepended to every generated label
    pub label_prefix: Option<String>,
    /// Receivers each job's shared sink forwards to
    pub write_receivers: Vec<Reference>,
}

impl Default for ConvertOptions {
    fn default() -> Self {
        Self {
            label_prefix: None,
            write_receivers: vec![default_write_block().export("receiver")],
        }
    }
}

impl ConvertOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_label_prefix(mut self, prefix: impl Into<String>) -> Self {
        let prefix = prefix.into();
        self.label_prefix = if prefix.is_empty() { None } else { Some(prefix) };
        self
    }

    pub fn with_write_receivers(mut self, receivers: Vec<Reference>) -> Self {
        self.write_receivers = receivers;
        self
    }
}

/// Identity of the write block emitted for the legacy push clients
pub fn default_write_block() -> BlockName {
    BlockName::new(WRITE_BLOCK, DEFAULT_WRITE_LABEL)
}
