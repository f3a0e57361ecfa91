//! Output graph data structures

mod block;
mod emitter;
mod value;

pub use block::{Block, BlockName, Reference};
pub use emitter::{Graph, GraphError, GraphResult};
pub use value::{format_duration, Arguments, Field, FieldType, Value};
