//! Testing infrastructure for CareerSpark integration tests.
//!
//! This crate provides utilities for writing robust integration tests:
//! - `clients`: scripted [`spark_runtime::AgentStreamClient`] implementations
//! - `events`: raw stream-frame builders matching the gateway wire format

pub mod clients;
pub mod events;

pub use clients::{ScriptedAgentClient, ScriptedFrame};
