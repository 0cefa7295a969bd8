use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use std::collections::BTreeMap;

use spark_types::ToolCallKind;

use crate::schema::{
    RawInvocationInput, RawObservation, RawStreamEvent, RawTraceEnvelope,
};

/// A stream frame after boundary decoding.
#[derive(Debug, Clone, PartialEq)]
pub enum StreamPayload {
    /// Generated text to append verbatim to the running response
    Chunk(String),
    /// One orchestration step to normalize
    Trace(TraceStep),
    /// Anything the decoder could not interpret; dropped without error
    Unrecognized,
}

/// One decoded orchestration step.
#[derive(Debug, Clone, PartialEq)]
pub struct TraceStep {
    /// Collaborator that produced the step, when not the supervisor itself
    pub collaborator_name: Option<String>,
    pub action: TraceAction,
}

impl TraceStep {
    /// Display label the client shows beside the step.
    pub fn agent_label(&self) -> String {
        match &self.collaborator_name {
            Some(name) => format!("Collaborator: {}", name),
            None => "Supervisor".to_string(),
        }
    }
}

/// Closed union of orchestration actions the normalizer handles.
///
/// Collaborator invocations carry no trace id on the wire, so their start
/// and completion are separate variants from tool invocations rather than a
/// shared shape with an optional correlation key.
#[derive(Debug, Clone, PartialEq)]
pub enum TraceAction {
    Reasoning {
        text: String,
    },
    CollaboratorStarted {
        name: Option<String>,
        input_text: Option<String>,
    },
    CollaboratorCompleted {
        name: Option<String>,
        output_text: Option<String>,
    },
    ToolStarted(ToolStart),
    ToolCompleted(ToolEnd),
    Failure {
        reason: Option<String>,
    },
    Unrecognized,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ToolStart {
    pub kind: ToolCallKind,
    pub trace_id: Option<String>,
    pub name: String,
    pub function: Option<String>,
    pub parameters: Option<BTreeMap<String, String>>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ToolEnd {
    pub kind: ToolCallKind,
    pub trace_id: Option<String>,
    pub output_text: Option<String>,
    pub reference_count: Option<usize>,
    pub elapsed_ms: Option<u64>,
    pub request_id: Option<String>,
}

/// Collapse one raw frame into a [`StreamPayload`].
///
/// Never fails: frames that cannot be interpreted decode to `Unrecognized`.
pub fn decode_event(event: RawStreamEvent) -> StreamPayload {
    if let Some(chunk) = event.chunk {
        return match chunk.bytes {
            Some(encoded) => match BASE64.decode(encoded.as_bytes()) {
                Ok(bytes) => StreamPayload::Chunk(String::from_utf8_lossy(&bytes).into_owned()),
                Err(_) => StreamPayload::Unrecognized,
            },
            None => StreamPayload::Unrecognized,
        };
    }

    match event.trace {
        Some(envelope) => decode_trace(envelope),
        None => StreamPayload::Unrecognized,
    }
}

fn decode_trace(envelope: RawTraceEnvelope) -> StreamPayload {
    let collaborator_name = envelope.collaborator_name;
    let Some(body) = envelope.trace else {
        return StreamPayload::Unrecognized;
    };

    if let Some(failure) = body.failure_trace {
        return StreamPayload::Trace(TraceStep {
            collaborator_name,
            action: TraceAction::Failure {
                reason: failure.failure_reason,
            },
        });
    }

    let Some(orchestration) = body.orchestration_trace else {
        return StreamPayload::Unrecognized;
    };

    let action = if let Some(rationale) = orchestration.rationale {
        match rationale.text {
            Some(text) => TraceAction::Reasoning { text },
            None => TraceAction::Unrecognized,
        }
    } else if let Some(input) = orchestration.invocation_input {
        decode_invocation_input(input)
    } else if let Some(observation) = orchestration.observation {
        decode_observation(observation)
    } else {
        // Model invocation bookkeeping and future payloads land here
        TraceAction::Unrecognized
    };

    StreamPayload::Trace(TraceStep {
        collaborator_name,
        action,
    })
}

fn decode_invocation_input(input: RawInvocationInput) -> TraceAction {
    let trace_id = input.trace_id;

    if let Some(collab) = input.agent_collaborator_invocation_input {
        return TraceAction::CollaboratorStarted {
            name: collab.agent_collaborator_name,
            input_text: collab.input.and_then(|i| i.text),
        };
    }

    if let Some(action_group) = input.action_group_invocation_input {
        let parameters = action_group.parameters.map(|params| {
            params
                .into_iter()
                .filter_map(|p| Some((p.name?, p.value.unwrap_or_default())))
                .collect::<BTreeMap<_, _>>()
        });
        return TraceAction::ToolStarted(ToolStart {
            kind: ToolCallKind::ActionGroup,
            trace_id,
            name: action_group
                .action_group_name
                .unwrap_or_else(|| "action_group".to_string()),
            function: action_group.function,
            parameters: parameters.filter(|p| !p.is_empty()),
        });
    }

    if let Some(lookup) = input.knowledge_base_lookup_input {
        let parameters = lookup
            .text
            .map(|query| BTreeMap::from([("query".to_string(), query)]));
        return TraceAction::ToolStarted(ToolStart {
            kind: ToolCallKind::KnowledgeBase,
            trace_id,
            name: lookup
                .knowledge_base_id
                .unwrap_or_else(|| "knowledge_base".to_string()),
            function: None,
            parameters,
        });
    }

    TraceAction::Unrecognized
}

fn decode_observation(observation: RawObservation) -> TraceAction {
    let trace_id = observation.trace_id;

    if let Some(collab) = observation.agent_collaborator_invocation_output {
        return TraceAction::CollaboratorCompleted {
            name: collab.agent_collaborator_name,
            output_text: collab.output.and_then(|o| o.text),
        };
    }

    if let Some(action_group) = observation.action_group_invocation_output {
        let metadata = action_group.metadata;
        return TraceAction::ToolCompleted(ToolEnd {
            kind: ToolCallKind::ActionGroup,
            trace_id,
            output_text: action_group.text,
            reference_count: None,
            elapsed_ms: metadata.as_ref().and_then(|m| m.total_time_ms),
            request_id: metadata.and_then(|m| m.client_request_id),
        });
    }

    if let Some(lookup) = observation.knowledge_base_lookup_output {
        let metadata = lookup.metadata;
        return TraceAction::ToolCompleted(ToolEnd {
            kind: ToolCallKind::KnowledgeBase,
            trace_id,
            output_text: None,
            reference_count: lookup.retrieved_references.map(|refs| refs.len()),
            elapsed_ms: metadata.as_ref().and_then(|m| m.total_time_ms),
            request_id: metadata.and_then(|m| m.client_request_id),
        });
    }

    // FINISH / final response text arrives via chunks; nothing to surface here
    TraceAction::Unrecognized
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decode_json(json: &str) -> StreamPayload {
        decode_event(serde_json::from_str(json).unwrap())
    }

    #[test]
    fn test_decode_chunk() {
        match decode_json(r#"{"chunk":{"bytes":"SGVyZSBpcyB5b3VyIHBsYW4="}}"#) {
            StreamPayload::Chunk(text) => assert_eq!(text, "Here is your plan"),
            other => panic!("Expected chunk, got {:?}", other),
        }
    }

    #[test]
    fn test_decode_chunk_with_invalid_base64() {
        assert_eq!(
            decode_json(r#"{"chunk":{"bytes":"not base64!!"}}"#),
            StreamPayload::Unrecognized
        );
    }

    #[test]
    fn test_decode_rationale() {
        let payload = decode_json(
            r#"{"trace":{"trace":{"orchestrationTrace":{"rationale":{"text":"Let me check course data"}}}}}"#,
        );
        match payload {
            StreamPayload::Trace(step) => {
                assert_eq!(step.agent_label(), "Supervisor");
                assert_eq!(
                    step.action,
                    TraceAction::Reasoning {
                        text: "Let me check course data".to_string()
                    }
                );
            }
            other => panic!("Expected trace, got {:?}", other),
        }
    }

    #[test]
    fn test_decode_collaborator_invocation() {
        let payload = decode_json(
            r#"{"trace":{"trace":{"orchestrationTrace":{"invocationInput":{
                "invocationType":"AGENT_COLLABORATOR",
                "agentCollaboratorInvocationInput":{
                    "agentCollaboratorName":"CourseCatalog",
                    "input":{"text":"Map skills to coursework"}
                }}}}}}"#,
        );
        match payload {
            StreamPayload::Trace(TraceStep {
                action: TraceAction::CollaboratorStarted { name, input_text },
                ..
            }) => {
                assert_eq!(name.as_deref(), Some("CourseCatalog"));
                assert_eq!(input_text.as_deref(), Some("Map skills to coursework"));
            }
            other => panic!("Expected collaborator start, got {:?}", other),
        }
    }

    #[test]
    fn test_decode_action_group_invocation_with_parameters() {
        let payload = decode_json(
            r#"{"trace":{"trace":{"orchestrationTrace":{"invocationInput":{
                "traceId":"t1",
                "actionGroupInvocationInput":{
                    "actionGroupName":"NebulaAPI",
                    "function":"get_course_information",
                    "parameters":[{"name":"course","type":"string","value":"CS 1337"}]
                }}}}}}"#,
        );
        match payload {
            StreamPayload::Trace(TraceStep {
                action: TraceAction::ToolStarted(start),
                ..
            }) => {
                assert_eq!(start.kind, ToolCallKind::ActionGroup);
                assert_eq!(start.trace_id.as_deref(), Some("t1"));
                assert_eq!(start.name, "NebulaAPI");
                assert_eq!(start.function.as_deref(), Some("get_course_information"));
                assert_eq!(
                    start.parameters.unwrap().get("course").map(String::as_str),
                    Some("CS 1337")
                );
            }
            other => panic!("Expected tool start, got {:?}", other),
        }
    }

    #[test]
    fn test_decode_knowledge_base_observation() {
        let payload = decode_json(
            r#"{"trace":{"trace":{"orchestrationTrace":{"observation":{
                "type":"KNOWLEDGE_BASE",
                "traceId":"t2",
                "knowledgeBaseLookupOutput":{
                    "retrievedReferences":[{},{},{}],
                    "metadata":{"totalTimeMs":85,"clientRequestId":"req-9"}
                }}}}}}"#,
        );
        match payload {
            StreamPayload::Trace(TraceStep {
                action: TraceAction::ToolCompleted(end),
                ..
            }) => {
                assert_eq!(end.kind, ToolCallKind::KnowledgeBase);
                assert_eq!(end.reference_count, Some(3));
                assert_eq!(end.elapsed_ms, Some(85));
                assert_eq!(end.request_id.as_deref(), Some("req-9"));
            }
            other => panic!("Expected tool completion, got {:?}", other),
        }
    }

    #[test]
    fn test_decode_failure_trace() {
        let payload = decode_json(
            r#"{"trace":{"collaboratorName":"JobMarket","trace":{"failureTrace":{"failureReason":"Access denied"}}}}"#,
        );
        match payload {
            StreamPayload::Trace(step) => {
                assert_eq!(step.agent_label(), "Collaborator: JobMarket");
                assert_eq!(
                    step.action,
                    TraceAction::Failure {
                        reason: Some("Access denied".to_string())
                    }
                );
            }
            other => panic!("Expected failure trace, got {:?}", other),
        }
    }

    #[test]
    fn test_decode_model_invocation_is_unrecognized() {
        let payload = decode_json(
            r#"{"trace":{"trace":{"orchestrationTrace":{"modelInvocationInput":{"text":"..."}}}}}"#,
        );
        match payload {
            StreamPayload::Trace(TraceStep {
                action: TraceAction::Unrecognized,
                ..
            }) => {}
            other => panic!("Expected unrecognized action, got {:?}", other),
        }
    }

    #[test]
    fn test_decode_empty_frame_is_unrecognized() {
        assert_eq!(decode_json("{}"), StreamPayload::Unrecognized);
    }
}
