use serde::{Deserialize, Serialize};
use serde_json::Value;

// Raw wire shapes for the supervisor stream. Every field the runtime may
// omit is an Option with a default: the upstream event shape is externally
// controlled and only loosely documented, so deserialization must never be
// the place where an invocation dies.

/// One frame of the supervisor stream: a generated-text fragment or one
/// orchestration trace.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct RawStreamEvent {
    #[serde(default)]
    pub chunk: Option<RawChunk>,
    #[serde(default)]
    pub trace: Option<RawTraceEnvelope>,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct RawChunk {
    /// Base64-encoded UTF-8 text
    #[serde(default)]
    pub bytes: Option<String>,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct RawTraceEnvelope {
    #[serde(default)]
    pub agent_id: Option<String>,
    #[serde(default)]
    pub agent_alias_id: Option<String>,
    #[serde(default)]
    pub session_id: Option<String>,
    /// Present when the step ran inside a collaborator rather than the
    /// supervisor itself
    #[serde(default)]
    pub collaborator_name: Option<String>,
    #[serde(default)]
    pub trace: Option<RawTraceBody>,
}

#[derive(Debug, Deserialize, Serialize, Clone, Default)]
#[serde(rename_all = "camelCase")]
pub struct RawTraceBody {
    #[serde(default)]
    pub orchestration_trace: Option<RawOrchestration>,
    #[serde(default)]
    pub failure_trace: Option<RawFailure>,
}

/// Orchestration step payload. The runtime sends exactly one of these per
/// trace in practice; all are optional here and the decoder picks whichever
/// is present.
#[derive(Debug, Deserialize, Serialize, Clone, Default)]
#[serde(rename_all = "camelCase")]
pub struct RawOrchestration {
    #[serde(default)]
    pub rationale: Option<RawRationale>,
    #[serde(default)]
    pub invocation_input: Option<RawInvocationInput>,
    #[serde(default)]
    pub observation: Option<RawObservation>,
    /// Model invocation bookkeeping the client never sees
    #[serde(default)]
    pub model_invocation_input: Option<Value>,
    #[serde(default)]
    pub model_invocation_output: Option<Value>,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct RawRationale {
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub trace_id: Option<String>,
}

#[derive(Debug, Deserialize, Serialize, Clone, Default)]
#[serde(rename_all = "camelCase")]
pub struct RawInvocationInput {
    #[serde(default)]
    pub invocation_type: Option<String>,
    #[serde(default)]
    pub trace_id: Option<String>,
    #[serde(default)]
    pub agent_collaborator_invocation_input: Option<RawCollaboratorInput>,
    #[serde(default)]
    pub action_group_invocation_input: Option<RawActionGroupInput>,
    #[serde(default)]
    pub knowledge_base_lookup_input: Option<RawKnowledgeBaseInput>,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct RawCollaboratorInput {
    #[serde(default)]
    pub agent_collaborator_name: Option<String>,
    #[serde(default)]
    pub input: Option<RawText>,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct RawActionGroupInput {
    #[serde(default)]
    pub action_group_name: Option<String>,
    #[serde(default)]
    pub function: Option<String>,
    #[serde(default)]
    pub parameters: Option<Vec<RawParameter>>,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct RawKnowledgeBaseInput {
    #[serde(default)]
    pub knowledge_base_id: Option<String>,
    #[serde(default)]
    pub text: Option<String>,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct RawParameter {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub value: Option<String>,
}

#[derive(Debug, Deserialize, Serialize, Clone, Default)]
#[serde(rename_all = "camelCase")]
pub struct RawObservation {
    #[serde(rename = "type", default)]
    pub observation_type: Option<String>,
    #[serde(default)]
    pub trace_id: Option<String>,
    #[serde(default)]
    pub agent_collaborator_invocation_output: Option<RawCollaboratorOutput>,
    #[serde(default)]
    pub action_group_invocation_output: Option<RawActionGroupOutput>,
    #[serde(default)]
    pub knowledge_base_lookup_output: Option<RawKnowledgeBaseOutput>,
    #[serde(default)]
    pub final_response: Option<RawText>,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct RawCollaboratorOutput {
    #[serde(default)]
    pub agent_collaborator_name: Option<String>,
    #[serde(default)]
    pub output: Option<RawText>,
    #[serde(default)]
    pub metadata: Option<RawObservationMetadata>,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct RawActionGroupOutput {
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub metadata: Option<RawObservationMetadata>,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct RawKnowledgeBaseOutput {
    #[serde(default)]
    pub retrieved_references: Option<Vec<Value>>,
    #[serde(default)]
    pub metadata: Option<RawObservationMetadata>,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct RawObservationMetadata {
    #[serde(default)]
    pub total_time_ms: Option<u64>,
    #[serde(default)]
    pub client_request_id: Option<String>,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct RawText {
    #[serde(default)]
    pub text: Option<String>,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct RawFailure {
    #[serde(default)]
    pub failure_reason: Option<String>,
    #[serde(default)]
    pub trace_id: Option<String>,
}
