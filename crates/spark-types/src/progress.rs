use serde::{Deserialize, Serialize};

use crate::tool::ToolCallRecord;

/// Client-facing status of one orchestration step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProgressStatus {
    /// The agent is reasoning or otherwise mid-step
    Progress,
    /// A collaborator or tool invocation was announced
    Started,
    /// A previously announced invocation produced output
    Completed,
    /// The runtime reported a failure for this step
    Failed,
}

/// A collaborator's response as relayed by the supervisor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollaboratorResponse {
    /// Collaborator agent name
    pub agent: String,
    /// Response text, absent when the runtime omitted it
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output: Option<String>,
}

/// Normalized, client-facing representation of one upstream trace event.
///
/// The UI groups every record under one supervisor row via
/// `supervisor_session_key`; `call_id` distinguishes repeated invocations of
/// the same collaborator or tool within a single plan request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProgressRecord {
    /// "Supervisor" or "Collaborator: {name}"
    pub agent: String,

    pub status: ProgressStatus,

    /// Constant for the life of one invocation: `supervisor_{session_id}`
    pub supervisor_session_key: String,

    /// `{session_id}_{name}_{counter}` for counted invocations
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub call_id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reasoning: Option<String>,

    /// Collaborator name when the supervisor delegates a sub-task
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub calling_collaborator: Option<String>,

    /// Input text handed to the collaborator
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub collaborator_input: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub collaborator_response: Option<CollaboratorResponse>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tool_calls: Vec<ToolCallRecord>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failure_reason: Option<String>,
}

impl ProgressRecord {
    /// Bare record for the given agent label and status; callers fill in
    /// whatever the trace event carried.
    pub fn new(
        agent: impl Into<String>,
        status: ProgressStatus,
        supervisor_session_key: impl Into<String>,
    ) -> Self {
        Self {
            agent: agent.into(),
            status,
            supervisor_session_key: supervisor_session_key.into(),
            call_id: None,
            reasoning: None,
            calling_collaborator: None,
            collaborator_input: None,
            collaborator_response: None,
            tool_calls: Vec::new(),
            failure_reason: None,
        }
    }

    /// True when the record carries nothing a client could render.
    ///
    /// Failed records are never considered empty: the failure reason (even a
    /// missing one) must reach the client.
    pub fn is_empty(&self) -> bool {
        self.status != ProgressStatus::Failed
            && self.reasoning.is_none()
            && self.calling_collaborator.is_none()
            && self.collaborator_response.is_none()
            && self.tool_calls.is_empty()
    }
}
