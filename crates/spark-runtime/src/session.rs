use futures::StreamExt;
use futures::stream::BoxStream;
use std::sync::Arc;
use tracing::{debug, info};

use spark_trace::{InvocationState, StreamPayload, decode_event, normalize};
use spark_types::{OutputEvent, UserContext};

use crate::client::{AgentEventStream, AgentStreamClient, ClientError, InvokeAgentRequest};
use crate::config::AgentTargets;
use crate::error::{Error, Result};
use crate::retry::RetryPolicy;

const TASK_PREAMBLE: &str = "Create a comprehensive career plan for:";

/// Consumer-facing event sequence for one invocation. Finite, ends with the
/// upstream stream, and not restartable; a mid-stream failure is yielded
/// once as `Err` and terminates the sequence.
pub type OutputEventStream = BoxStream<'static, Result<OutputEvent>>;

/// Drives one "ask the supervisor agent for a plan" operation end-to-end.
///
/// The session holds no per-invocation state: counters and the correlation
/// table live inside each returned stream, so one session instance can
/// serve concurrent `invoke` calls without cross-request corruption.
pub struct InvocationSession {
    client: Arc<dyn AgentStreamClient>,
    targets: AgentTargets,
    retry: RetryPolicy,
}

impl InvocationSession {
    pub fn new(client: Arc<dyn AgentStreamClient>, targets: AgentTargets) -> Self {
        Self {
            client,
            targets,
            retry: RetryPolicy::default(),
        }
    }

    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Open the supervisor stream and return the normalized event sequence.
    ///
    /// Initiation is retried on throttling per the session's retry policy;
    /// any other initiation failure, or exhaustion of retries, is fatal for
    /// this invocation. Dropping the returned stream releases the upstream
    /// connection.
    pub async fn invoke(
        &self,
        goal: &str,
        session_id: &str,
        user_context: Option<&UserContext>,
    ) -> Result<OutputEventStream> {
        let request = InvokeAgentRequest {
            agent_id: self.targets.agent_id.clone(),
            agent_alias_id: self.targets.agent_alias_id.clone(),
            session_id: session_id.to_string(),
            input_text: build_input_text(goal, user_context),
            enable_trace: true,
            session_attributes: user_context
                .map(|context| context.session_attributes())
                .filter(|attributes| !attributes.is_empty()),
        };

        info!(session_id = %session_id, "invoking supervisor agent");

        let upstream = self
            .retry
            .run(ClientError::is_throttling, || {
                self.client.invoke_agent(request.clone())
            })
            .await
            .map_err(|err| match err {
                ClientError::Throttled(message) => Error::RateLimited {
                    attempts: self.retry.max_attempts,
                    message,
                },
                other => Error::Client(other),
            })?;

        Ok(drive(upstream, session_id.to_string()))
    }
}

/// Deterministic prompt: task preamble plus labeled profile fields in fixed
/// order, blank fields skipped.
pub fn build_input_text(goal: &str, user_context: Option<&UserContext>) -> String {
    let mut parts = vec![format!("{} {}", TASK_PREAMBLE, goal.trim())];

    if let Some(context) = user_context {
        for (_, label, value) in context.fields() {
            parts.push(format!("{}: {}", label, value));
        }
    }

    parts.join("\n")
}

struct StreamDriver {
    upstream: AgentEventStream,
    state: InvocationState,
    session_id: String,
    chunks: usize,
    traces: usize,
    done: bool,
}

fn drive(upstream: AgentEventStream, session_id: String) -> OutputEventStream {
    // Per-invocation state starts empty here and dies with the stream
    let driver = StreamDriver {
        upstream,
        state: InvocationState::new(),
        session_id,
        chunks: 0,
        traces: 0,
        done: false,
    };

    Box::pin(futures::stream::unfold(driver, |mut driver| async move {
        if driver.done {
            return None;
        }
        loop {
            match driver.upstream.next().await {
                None => {
                    info!(
                        session_id = %driver.session_id,
                        chunks = driver.chunks,
                        traces = driver.traces,
                        "supervisor stream completed"
                    );
                    return None;
                }
                Some(Err(err)) => {
                    driver.done = true;
                    return Some((Err(Error::Client(err)), driver));
                }
                Some(Ok(raw)) => match decode_event(raw) {
                    StreamPayload::Chunk(text) => {
                        driver.chunks += 1;
                        let event = OutputEvent::chunk(text, driver.session_id.clone());
                        return Some((Ok(event), driver));
                    }
                    StreamPayload::Trace(step) => {
                        driver.traces += 1;
                        if let Some(record) =
                            normalize(&step, &driver.session_id, &mut driver.state)
                        {
                            let event = OutputEvent::trace(record, driver.session_id.clone());
                            return Some((Ok(event), driver));
                        }
                        // Suppressed records yield nothing; keep reading
                    }
                    StreamPayload::Unrecognized => {
                        debug!(session_id = %driver.session_id, "dropping unrecognized stream frame");
                    }
                },
            }
        }
    }))
}
