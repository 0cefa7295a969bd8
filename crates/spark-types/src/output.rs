use serde::{Deserialize, Serialize};

use crate::progress::ProgressRecord;

/// One element of the consumer-facing event sequence produced by an
/// invocation.
///
/// Text fragments pass through untouched as `chunk`; every surviving
/// normalized trace record is wrapped in `trace`. The transport layer adds
/// its own `session`/`done`/`error` envelope events around this sequence.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum OutputEvent {
    Chunk {
        text: String,
        session_id: String,
    },
    Trace {
        data: ProgressRecord,
        session_id: String,
    },
}

impl OutputEvent {
    pub fn chunk(text: impl Into<String>, session_id: impl Into<String>) -> Self {
        OutputEvent::Chunk {
            text: text.into(),
            session_id: session_id.into(),
        }
    }

    pub fn trace(data: ProgressRecord, session_id: impl Into<String>) -> Self {
        OutputEvent::Trace {
            data,
            session_id: session_id.into(),
        }
    }

    pub fn session_id(&self) -> &str {
        match self {
            OutputEvent::Chunk { session_id, .. } => session_id,
            OutputEvent::Trace { session_id, .. } => session_id,
        }
    }
}
