use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Category of an agent-requested tool invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToolCallKind {
    /// Lambda-backed action group function call
    ActionGroup,
    /// Retrieval query against a managed document index
    KnowledgeBase,
}

/// Lifecycle state of one tool invocation as seen by the client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToolCallStatus {
    Calling,
    Completed,
}

/// One tool or knowledge-base invocation, as surfaced to the client.
///
/// A `calling` record is emitted when the runtime announces the invocation;
/// the matching `completed` record merges the announced fields with the
/// observed output and timing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolCallRecord {
    pub kind: ToolCallKind,

    /// Display name (action group name, knowledge base id, or a fallback label)
    pub name: String,

    /// Function within the action group, when the runtime reports one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub function: Option<String>,

    pub status: ToolCallStatus,

    /// Invocation parameters keyed by parameter name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parameters: Option<BTreeMap<String, String>>,

    /// Output text reported by the completion observation
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<String>,

    /// Wall-clock duration reported by the runtime
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub elapsed_ms: Option<u64>,

    /// Number of retrieved references (knowledge-base lookups only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reference_count: Option<usize>,
}

impl ToolCallRecord {
    /// Start-of-invocation record with no output fields yet.
    pub fn calling(kind: ToolCallKind, name: impl Into<String>) -> Self {
        Self {
            kind,
            name: name.into(),
            function: None,
            status: ToolCallStatus::Calling,
            parameters: None,
            result: None,
            elapsed_ms: None,
            reference_count: None,
        }
    }
}
