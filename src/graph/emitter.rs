//! Graph: the ordered, append-only output of a conversion

use super::block::{Block, BlockName};
use serde::{Serialize, Serializer};
use std::collections::HashSet;
use thiserror::Error;

/// Errors raised while appending to a graph
#[derive(Debug, Clone, PartialEq, Error)]
pub enum GraphError {
    /// Two blocks with the same identity were appended. This is a defect in
    /// label allocation or orchestration, never a malformed input.
    #[error("label collision: {0} was already appended")]
    LabelCollision(BlockName),
}

/// Result type for graph operations
pub type GraphResult<T> = Result<T, GraphError>;

/// An ordered sequence of blocks.
///
/// Blocks keep insertion order, and each block identity (type path plus
/// label) appears at most once. Appended blocks are never mutated.
#[derive(Debug, Clone, Default)]
pub struct Graph {
    blocks: Vec<Block>,
    names: HashSet<BlockName>,
}

impl Graph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a block after all previously appended blocks.
    ///
    /// Fails without modifying the graph if a block with the same identity
    /// is already present.
    pub fn append(&mut self, block: Block) -> GraphResult<()> {
        if !self.names.insert(block.name.clone()) {
            return Err(GraphError::LabelCollision(block.name));
        }
        tracing::debug!(block = %block.name, "appended block");
        self.blocks.push(block);
        Ok(())
    }

    /// Append every block in order, stopping at the first collision
    pub fn extend<I: IntoIterator<Item = Block>>(&mut self, blocks: I) -> GraphResult<()> {
        for block in blocks {
            self.append(block)?;
        }
        Ok(())
    }

    pub fn contains(&self, name: &BlockName) -> bool {
        self.names.contains(name)
    }

    pub fn get(&self, name: &BlockName) -> Option<&Block> {
        self.blocks.iter().find(|b| &b.name == name)
    }

    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    pub fn iter(&self) -> impl Iterator<Item = &Block> {
        self.blocks.iter()
    }

    /// Block identities in insertion order
    pub fn names(&self) -> impl Iterator<Item = &BlockName> {
        self.blocks.iter().map(|b| &b.name)
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    pub fn into_blocks(self) -> Vec<Block> {
        self.blocks
    }
}

impl Serialize for Graph {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(&self.blocks)
    }
}
