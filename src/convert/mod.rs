//! Graph synthesis: from scrape jobs to wired blocks
//!
//! The pieces, leaves first: label allocation, field mappers, the receiver
//! pool, the override engine, and the job converter that drives them.

mod document;
mod error;
mod job;
pub mod label;
mod mapper;
mod options;
mod overrides;
mod pool;

pub use document::{convert_config, Conversion};
pub use error::{ConvertError, Diagnostic, MapError};
pub use job::{JobConverter, JobOutput};
pub use label::LabelAllocator;
pub use mapper::{FieldMapper, ForwardingContext, MapperRegistry};
pub use options::{default_write_block, ConvertOptions};
pub use overrides::{OverrideContext, OverrideRules, Producer};
pub use pool::{
    PoolOutput, ReceiverPool, SharedSink, FILE_MATCH_BLOCK, FILE_SOURCE_BLOCK, PROCESS_BLOCK,
    RELABEL_BLOCK,
};
