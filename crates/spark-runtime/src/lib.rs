//! Runtime layer: drives one "ask the supervisor for a plan" operation
//! end-to-end against the managed agent runtime, and wraps the auxiliary
//! AgentCore services (memory, direct model calls) the server needs.

pub mod chat;
pub mod client;
pub mod config;
pub mod error;
pub mod http;
pub mod memory;
pub mod retry;
pub mod session;

pub use chat::{ChatClient, ChatOptions};
pub use client::{AgentEventStream, AgentStreamClient, ClientError, InvokeAgentRequest};
pub use config::{AgentTargets, MemoryConfig, RuntimeConfig};
pub use error::{Error, Result};
pub use http::AgentRuntimeHttpClient;
pub use memory::{MemoryEvent, MemoryRecorder, MemoryRole};
pub use retry::RetryPolicy;
pub use session::{InvocationSession, OutputEventStream};
