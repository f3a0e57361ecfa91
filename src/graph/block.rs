//! Blocks, block names and references between them

use super::value::Arguments;
use serde::ser::Serializer;
use serde::{Deserialize, Serialize};

/// Symbolic expression naming another block's export or a shared value.
///
/// A reference carries no value of its own; the executing engine
/// resolves it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Reference {
    expr: String,
}

impl Reference {
    pub fn new(expr: impl Into<String>) -> Self {
        Self { expr: expr.into() }
    }

    /// Reference to an export of a block, e.g. `discovery.docker.app_0.targets`
    pub fn export(block: &BlockName, field: &str) -> Self {
        Self::new(format!("{}.{}", block, field))
    }

    /// Concatenation of several list-valued references.
    ///
    /// A single reference is returned as is.
    pub fn concat(parts: &[Reference]) -> Self {
        match parts {
            [single] => single.clone(),
            _ => {
                let joined: Vec<&str> = parts.iter().map(|r| r.as_str()).collect();
                Self::new(format!("concat({})", joined.join(", ")))
            }
        }
    }

    pub fn as_str(&self) -> &str {
        &self.expr
    }
}

impl std::fmt::Display for Reference {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.expr)
    }
}

/// Fully qualified identity of a block: its type path plus its label.
///
/// Displays as `discovery.docker.app_0`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct BlockName {
    #[serde(rename = "type", serialize_with = "serialize_path")]
    type_path: Vec<String>,
    label: String,
}

impl BlockName {
    pub fn new(type_path: &[&str], label: impl Into<String>) -> Self {
        Self {
            type_path: type_path.iter().map(|s| s.to_string()).collect(),
            label: label.into(),
        }
    }

    pub fn type_path(&self) -> &[String] {
        &self.type_path
    }

    /// Dotted type path, e.g. `loki.source.docker`
    pub fn kind(&self) -> String {
        self.type_path.join(".")
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    /// Reference to one of this block's exports
    pub fn export(&self, field: &str) -> Reference {
        Reference::export(self, field)
    }
}

impl std::fmt::Display for BlockName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}", self.type_path.join("."), self.label)
    }
}

fn serialize_path<S: Serializer>(path: &[String], serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&path.join("."))
}

/// A named node of the output graph
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Block {
    #[serde(flatten)]
    pub name: BlockName,
    pub arguments: Arguments,
}

impl Block {
    pub fn new(name: BlockName, arguments: Arguments) -> Self {
        Self { name, arguments }
    }

    pub fn label(&self) -> &str {
        self.name.label()
    }
}
