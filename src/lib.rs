//! jobgraph: legacy scrape jobs to pipeline component graphs
//!
//! Converts flat scrape-job configuration (a job name, a list of
//! service-discovery stanzas, shared relabeling and shared forwarding) into
//! an ordered graph of named, wired blocks for a dataflow pipeline engine.
//!
//! # Core Concepts
//!
//! - **Blocks**: typed nodes with a label and an argument record
//! - **References**: symbolic expressions pointing at another block's export
//! - **Override rules**: replace fields by declared type, turning literal
//!   records into wired ones
//! - **Receiver pool**: one shared downstream stage per job
//!
//! # Example
//!
//! ```
//! use jobgraph::{discovery, ConvertOptions, JobConverter, ScrapeJob};
//!
//! let converter = JobConverter::new(discovery::default_registry(), ConvertOptions::default());
//! let output = converter.convert(&ScrapeJob::new("app")).unwrap();
//! assert!(output.graph.is_empty());
//! ```

pub mod convert;
pub mod discovery;
mod graph;
pub mod legacy;

pub use convert::{
    convert_config, Conversion, ConvertError, ConvertOptions, Diagnostic, FieldMapper,
    JobConverter, JobOutput, MapError, MapperRegistry, OverrideContext, OverrideRules,
    SharedSink,
};
pub use graph::{
    format_duration, Arguments, Block, BlockName, Field, FieldType, Graph, GraphError,
    GraphResult, Reference, Value,
};
pub use legacy::{DiscoveryStanza, LegacyConfig, LoadError, ScrapeJob};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
