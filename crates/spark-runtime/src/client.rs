use async_trait::async_trait;
use futures::stream::BoxStream;
use std::collections::BTreeMap;
use std::fmt;

use spark_trace::RawStreamEvent;

/// Raw supervisor stream as delivered by a client implementation: frames in
/// network order, each either an event or a transport failure.
pub type AgentEventStream = BoxStream<'static, std::result::Result<RawStreamEvent, ClientError>>;

/// One invocation request against the managed agent runtime.
#[derive(Debug, Clone)]
pub struct InvokeAgentRequest {
    pub agent_id: String,
    pub agent_alias_id: String,
    pub session_id: String,
    pub input_text: String,
    pub enable_trace: bool,
    /// Profile attributes forwarded as runtime session state
    pub session_attributes: Option<BTreeMap<String, String>>,
}

/// The injected streaming-call capability.
///
/// Implementations open the streaming invocation and hand back the event
/// sequence; they perform no retries and no event interpretation. The
/// invocation session owns both.
#[async_trait]
pub trait AgentStreamClient: Send + Sync {
    async fn invoke_agent(
        &self,
        request: InvokeAgentRequest,
    ) -> std::result::Result<AgentEventStream, ClientError>;
}

/// Error types that can occur in a streaming-client implementation
#[derive(Debug)]
pub enum ClientError {
    /// The runtime rejected the call for rate-limiting reasons
    Throttled(String),

    /// Non-throttling HTTP error response
    Http { status: u16, message: String },

    /// Connection-level failure (send, read, or mid-stream drop)
    Transport(String),
}

impl ClientError {
    /// True for failures worth retrying at call initiation.
    pub fn is_throttling(&self) -> bool {
        matches!(self, ClientError::Throttled(_))
    }
}

impl fmt::Display for ClientError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ClientError::Throttled(msg) => write!(f, "Throttled: {}", msg),
            ClientError::Http { status, message } => {
                write!(f, "HTTP error ({}): {}", status, message)
            }
            ClientError::Transport(msg) => write!(f, "Transport error: {}", msg),
        }
    }
}

impl std::error::Error for ClientError {}

impl From<reqwest::Error> for ClientError {
    fn from(err: reqwest::Error) -> Self {
        ClientError::Transport(err.to_string())
    }
}
