//! Builders for raw gateway stream frames.
//!
//! Each builder produces the JSON shape the runtime gateway emits so tests
//! exercise the same decode path as production traffic.

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use serde_json::json;

use spark_trace::RawStreamEvent;

fn from_value(value: serde_json::Value) -> RawStreamEvent {
    serde_json::from_value(value).expect("builder produced an undecodable frame")
}

/// Text fragment frame (`bytes` is base64 on the wire).
pub fn chunk(text: &str) -> RawStreamEvent {
    from_value(json!({
        "chunk": {"bytes": BASE64.encode(text.as_bytes())}
    }))
}

/// Supervisor reasoning step.
pub fn reasoning(text: &str) -> RawStreamEvent {
    from_value(json!({
        "trace": {"trace": {"orchestrationTrace": {
            "rationale": {"text": text}
        }}}
    }))
}

/// Supervisor delegating a sub-task to a collaborator.
pub fn collaborator_start(name: &str, input_text: &str) -> RawStreamEvent {
    from_value(json!({
        "trace": {"trace": {"orchestrationTrace": {
            "invocationInput": {
                "invocationType": "AGENT_COLLABORATOR",
                "agentCollaboratorInvocationInput": {
                    "agentCollaboratorName": name,
                    "input": {"text": input_text}
                }
            }
        }}}
    }))
}

/// Collaborator response observation.
pub fn collaborator_end(name: &str, output_text: &str) -> RawStreamEvent {
    from_value(json!({
        "trace": {"trace": {"orchestrationTrace": {
            "observation": {
                "type": "AGENT_COLLABORATOR",
                "agentCollaboratorInvocationOutput": {
                    "agentCollaboratorName": name,
                    "output": {"text": output_text}
                }
            }
        }}}
    }))
}

/// Action-group invocation announcement.
pub fn tool_start(trace_id: &str, name: &str, function: &str) -> RawStreamEvent {
    from_value(json!({
        "trace": {"trace": {"orchestrationTrace": {
            "invocationInput": {
                "invocationType": "ACTION_GROUP",
                "traceId": trace_id,
                "actionGroupInvocationInput": {
                    "actionGroupName": name,
                    "function": function
                }
            }
        }}}
    }))
}

/// Action-group completion observation with timing metadata.
pub fn tool_end(trace_id: &str, output_text: &str, elapsed_ms: u64) -> RawStreamEvent {
    from_value(json!({
        "trace": {"trace": {"orchestrationTrace": {
            "observation": {
                "type": "ACTION_GROUP",
                "traceId": trace_id,
                "actionGroupInvocationOutput": {
                    "text": output_text,
                    "metadata": {"totalTimeMs": elapsed_ms}
                }
            }
        }}}
    }))
}

/// Knowledge-base lookup announcement.
pub fn knowledge_base_start(trace_id: &str, knowledge_base_id: &str, query: &str) -> RawStreamEvent {
    from_value(json!({
        "trace": {"trace": {"orchestrationTrace": {
            "invocationInput": {
                "invocationType": "KNOWLEDGE_BASE",
                "traceId": trace_id,
                "knowledgeBaseLookupInput": {
                    "knowledgeBaseId": knowledge_base_id,
                    "text": query
                }
            }
        }}}
    }))
}

/// Knowledge-base lookup completion with the given reference count.
pub fn knowledge_base_end(trace_id: &str, reference_count: usize) -> RawStreamEvent {
    let references: Vec<serde_json::Value> =
        (0..reference_count).map(|_| json!({})).collect();
    from_value(json!({
        "trace": {"trace": {"orchestrationTrace": {
            "observation": {
                "type": "KNOWLEDGE_BASE",
                "traceId": trace_id,
                "knowledgeBaseLookupOutput": {
                    "retrievedReferences": references
                }
            }
        }}}
    }))
}

/// Failure trace, optionally attributed to a collaborator.
pub fn failure(reason: &str, collaborator_name: Option<&str>) -> RawStreamEvent {
    let mut envelope = json!({
        "trace": {"failureTrace": {"failureReason": reason}}
    });
    if let Some(name) = collaborator_name {
        envelope["collaboratorName"] = json!(name);
    }
    from_value(json!({"trace": envelope}))
}

/// A frame the decoder should drop (model invocation bookkeeping).
pub fn model_invocation_noise() -> RawStreamEvent {
    from_value(json!({
        "trace": {"trace": {"orchestrationTrace": {
            "modelInvocationInput": {"text": "system prompt elided"}
        }}}
    }))
}
