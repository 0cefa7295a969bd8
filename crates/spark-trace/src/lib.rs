//! Decoding and normalization of AgentCore supervisor stream events.
//!
//! The managed runtime emits a loosely documented union of chunk and trace
//! events. `schema` holds the raw wire shapes, `decode` collapses them into
//! a closed set of typed actions, and `normalize` turns each action into at
//! most one client-facing [`spark_types::ProgressRecord`].

pub mod decode;
pub mod normalize;
pub mod schema;

pub use decode::{StreamPayload, ToolEnd, ToolStart, TraceAction, TraceStep, decode_event};
pub use normalize::{InvocationState, normalize};
pub use schema::RawStreamEvent;
