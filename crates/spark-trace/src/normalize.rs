use std::collections::BTreeMap;
use std::collections::HashMap;

use spark_types::{
    CollaboratorResponse, ProgressRecord, ProgressStatus, ToolCallKind, ToolCallRecord,
    ToolCallStatus, call_id, supervisor_session_key,
};

use crate::decode::{ToolEnd, ToolStart, TraceAction, TraceStep};

/// Keyword vocabulary for classifying tool output whose start event was
/// never observed. Deliberately small: this exists to avoid dropping data,
/// not to be an accurate classifier.
const FALLBACK_LABELS: &[(&[&str], &str)] = &[
    (&["job", "hiring"], "Job Market Tools"),
    (&["course", "cs "], "Course Catalog Tools"),
    (&["project", "portfolio"], "Project Advisor Tools"),
];

const FALLBACK_DEFAULT_LABEL: &str = "Agent Tools";
const FALLBACK_RESULT: &str = "Tool results received.";

/// Mutable state scoped to exactly one invocation.
///
/// Owned by the invocation session and created fresh per call; sharing one
/// instance across concurrent invocations would corrupt correlation for all
/// of them.
#[derive(Debug, Default)]
pub struct InvocationState {
    counters: HashMap<String, u32>,
    pending: HashMap<String, PendingToolCall>,
}

#[derive(Debug, Clone)]
struct PendingToolCall {
    kind: ToolCallKind,
    name: String,
    function: Option<String>,
    parameters: Option<BTreeMap<String, String>>,
    call_id: String,
}

impl InvocationState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Advance the per-name counter and return the new value (1-indexed).
    fn next_invocation(&mut self, name: &str) -> u32 {
        let counter = self.counters.entry(name.to_string()).or_insert(0);
        *counter += 1;
        *counter
    }

    /// Current counter value for a name that has started at least once.
    fn current_invocation(&self, name: &str) -> Option<u32> {
        self.counters.get(name).copied()
    }

    /// Consume the pending entry for a trace id, if any (at most once).
    fn take_pending(&mut self, trace_id: &str) -> Option<PendingToolCall> {
        self.pending.remove(trace_id)
    }

    #[cfg(test)]
    pub(crate) fn has_pending(&self, trace_id: &str) -> bool {
        self.pending.contains_key(trace_id)
    }
}

/// Turn one decoded trace step into at most one client-facing record.
///
/// Returns `None` for unrecognized actions and for progress records with
/// nothing to render. Failure steps are always emitted.
pub fn normalize(
    step: &TraceStep,
    session_id: &str,
    state: &mut InvocationState,
) -> Option<ProgressRecord> {
    let supervisor_key = supervisor_session_key(session_id);
    let agent = step.agent_label();

    let record = match &step.action {
        TraceAction::Reasoning { text } => {
            let mut record = ProgressRecord::new(agent, ProgressStatus::Progress, supervisor_key);
            let text = text.trim();
            if !text.is_empty() {
                record.reasoning = Some(text.to_string());
            }
            record
        }

        TraceAction::CollaboratorStarted { name, input_text } => {
            let mut record = ProgressRecord::new(agent, ProgressStatus::Started, supervisor_key);
            if let Some(name) = name {
                let counter = state.next_invocation(name);
                record.call_id = Some(call_id(session_id, name, counter));
                record.calling_collaborator = Some(name.clone());
                record.collaborator_input = input_text.clone();
            }
            record
        }

        TraceAction::CollaboratorCompleted { name, output_text } => {
            let mut record = ProgressRecord::new(agent, ProgressStatus::Completed, supervisor_key);
            let resolved = name
                .clone()
                .or_else(|| step.collaborator_name.clone())
                .unwrap_or_else(|| "unknown".to_string());
            if let Some(counter) = state.current_invocation(&resolved) {
                record.call_id = Some(call_id(session_id, &resolved, counter));
            }
            record.collaborator_response = Some(CollaboratorResponse {
                agent: resolved,
                output: output_text.clone(),
            });
            record
        }

        TraceAction::ToolStarted(start) => {
            let mut record = ProgressRecord::new(agent, ProgressStatus::Started, supervisor_key);
            record.tool_calls.push(register_tool_start(
                start,
                session_id,
                state,
                &mut record.call_id,
            ));
            record
        }

        TraceAction::ToolCompleted(end) => {
            let mut record = ProgressRecord::new(agent, ProgressStatus::Completed, supervisor_key);
            record
                .tool_calls
                .push(resolve_tool_end(end, state, &mut record.call_id));
            record
        }

        TraceAction::Failure { reason } => {
            let mut record = ProgressRecord::new(agent, ProgressStatus::Failed, supervisor_key);
            record.failure_reason = reason.clone();
            record
        }

        TraceAction::Unrecognized => return None,
    };

    if record.is_empty() { None } else { Some(record) }
}

fn register_tool_start(
    start: &ToolStart,
    session_id: &str,
    state: &mut InvocationState,
    record_call_id: &mut Option<String>,
) -> ToolCallRecord {
    let counter = state.next_invocation(&start.name);
    let id = call_id(session_id, &start.name, counter);
    *record_call_id = Some(id.clone());

    if let Some(trace_id) = &start.trace_id {
        state.pending.insert(
            trace_id.clone(),
            PendingToolCall {
                kind: start.kind,
                name: start.name.clone(),
                function: start.function.clone(),
                parameters: start.parameters.clone(),
                call_id: id,
            },
        );
    }

    let mut tool_call = ToolCallRecord::calling(start.kind, start.name.clone());
    tool_call.function = start.function.clone();
    tool_call.parameters = start.parameters.clone();
    tool_call
}

fn resolve_tool_end(
    end: &ToolEnd,
    state: &mut InvocationState,
    record_call_id: &mut Option<String>,
) -> ToolCallRecord {
    let pending = end
        .trace_id
        .as_deref()
        .and_then(|trace_id| state.take_pending(trace_id));

    match pending {
        Some(pending) => {
            *record_call_id = Some(pending.call_id);
            ToolCallRecord {
                kind: pending.kind,
                name: pending.name,
                function: pending.function,
                status: ToolCallStatus::Completed,
                parameters: pending.parameters,
                result: end.output_text.clone(),
                elapsed_ms: end.elapsed_ms,
                reference_count: end.reference_count,
            }
        }
        // Correlation lost: classify from the output so the event still
        // reaches the client instead of vanishing.
        None => ToolCallRecord {
            kind: end.kind,
            name: classify_output(end.output_text.as_deref().unwrap_or_default()).to_string(),
            function: None,
            status: ToolCallStatus::Completed,
            parameters: None,
            result: Some(FALLBACK_RESULT.to_string()),
            elapsed_ms: end.elapsed_ms,
            reference_count: end.reference_count,
        },
    }
}

fn classify_output(text: &str) -> &'static str {
    let lowered = text.to_lowercase();
    for (keywords, label) in FALLBACK_LABELS {
        if keywords.iter().any(|keyword| lowered.contains(keyword)) {
            return label;
        }
    }
    FALLBACK_DEFAULT_LABEL
}
