//! Scripted streaming clients.
//!
//! `ScriptedAgentClient` replays a fixed frame script per invocation so
//! session behavior (ordering, normalization, retry, error handling) can be
//! asserted without a live runtime.

use async_trait::async_trait;
use std::sync::Mutex;
use std::sync::atomic::{AtomicU32, Ordering};

use spark_runtime::{AgentEventStream, AgentStreamClient, ClientError, InvokeAgentRequest};
use spark_trace::RawStreamEvent;

/// One scripted stream element.
#[derive(Debug, Clone)]
pub enum ScriptedFrame {
    Event(RawStreamEvent),
    /// Mid-stream transport failure with the given message
    TransportError(String),
}

impl From<RawStreamEvent> for ScriptedFrame {
    fn from(event: RawStreamEvent) -> Self {
        ScriptedFrame::Event(event)
    }
}

/// [`AgentStreamClient`] that serves a canned script.
///
/// Every successful invocation replays the same script; the client can be
/// configured to throttle the first N initiation attempts to exercise the
/// retry path. Requests are captured for assertions.
pub struct ScriptedAgentClient {
    script: Vec<ScriptedFrame>,
    throttle_first: u32,
    calls: AtomicU32,
    requests: Mutex<Vec<InvokeAgentRequest>>,
}

impl ScriptedAgentClient {
    pub fn new(script: Vec<ScriptedFrame>) -> Self {
        Self {
            script,
            throttle_first: 0,
            calls: AtomicU32::new(0),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Convenience constructor from plain events.
    pub fn from_events(events: Vec<RawStreamEvent>) -> Self {
        Self::new(events.into_iter().map(ScriptedFrame::Event).collect())
    }

    /// Fail the first `attempts` initiations with a throttling error.
    pub fn throttling_first(mut self, attempts: u32) -> Self {
        self.throttle_first = attempts;
        self
    }

    /// Number of initiation attempts observed so far.
    pub fn attempts(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }

    /// Requests captured from successful and throttled attempts alike.
    pub fn requests(&self) -> Vec<InvokeAgentRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl AgentStreamClient for ScriptedAgentClient {
    async fn invoke_agent(
        &self,
        request: InvokeAgentRequest,
    ) -> std::result::Result<AgentEventStream, ClientError> {
        self.requests.lock().unwrap().push(request);

        let attempt = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        if attempt <= self.throttle_first {
            return Err(ClientError::Throttled(format!(
                "throttlingException on attempt {}",
                attempt
            )));
        }

        let frames: Vec<std::result::Result<RawStreamEvent, ClientError>> = self
            .script
            .clone()
            .into_iter()
            .map(|frame| match frame {
                ScriptedFrame::Event(event) => Ok(event),
                ScriptedFrame::TransportError(message) => {
                    Err(ClientError::Transport(message))
                }
            })
            .collect();

        Ok(Box::pin(futures::stream::iter(frames)))
    }
}
