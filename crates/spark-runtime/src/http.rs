use async_trait::async_trait;
use bytes::Bytes;
use futures::StreamExt;
use futures::stream::BoxStream;
use serde::Serialize;
use std::collections::{BTreeMap, VecDeque};
use tracing::{debug, error};

use spark_trace::RawStreamEvent;

use crate::client::{AgentEventStream, AgentStreamClient, ClientError, InvokeAgentRequest};

/// HTTP implementation of [`AgentStreamClient`] against the agent runtime
/// gateway.
///
/// The gateway fronts the managed runtime's binary event framing and emits
/// newline-delimited JSON frames. Malformed lines are skipped rather than
/// failing the invocation.
#[derive(Debug, Clone)]
pub struct AgentRuntimeHttpClient {
    client: reqwest::Client,
    endpoint: String,
}

impl AgentRuntimeHttpClient {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint: endpoint.into().trim_end_matches('/').to_string(),
        }
    }

    fn invoke_url(&self, request: &InvokeAgentRequest) -> String {
        format!(
            "{}/agents/{}/agentAliases/{}/sessions/{}/text",
            self.endpoint, request.agent_id, request.agent_alias_id, request.session_id
        )
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct InvokeAgentBody<'a> {
    input_text: &'a str,
    enable_trace: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    session_state: Option<SessionState<'a>>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SessionState<'a> {
    session_attributes: &'a BTreeMap<String, String>,
}

#[async_trait]
impl AgentStreamClient for AgentRuntimeHttpClient {
    async fn invoke_agent(
        &self,
        request: InvokeAgentRequest,
    ) -> std::result::Result<AgentEventStream, ClientError> {
        let url = self.invoke_url(&request);
        let body = InvokeAgentBody {
            input_text: &request.input_text,
            enable_trace: request.enable_trace,
            session_state: request
                .session_attributes
                .as_ref()
                .map(|attributes| SessionState {
                    session_attributes: attributes,
                }),
        };

        debug!(session_id = %request.session_id, agent_id = %request.agent_id, "opening supervisor stream");

        let response = self.client.post(&url).json(&body).send().await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            error!(status = %status, message = %message, "agent runtime returned error status");
            if status.as_u16() == 429 || message.to_lowercase().contains("throttl") {
                return Err(ClientError::Throttled(message));
            }
            return Err(ClientError::Http {
                status: status.as_u16(),
                message,
            });
        }

        Ok(event_lines(response.bytes_stream().boxed()))
    }
}

struct LineDecoder {
    body: BoxStream<'static, reqwest::Result<Bytes>>,
    buffer: String,
    queue: VecDeque<RawStreamEvent>,
    done: bool,
}

/// Frame the byte stream into parsed events, one JSON object per line.
fn event_lines(body: BoxStream<'static, reqwest::Result<Bytes>>) -> AgentEventStream {
    let decoder = LineDecoder {
        body,
        buffer: String::new(),
        queue: VecDeque::new(),
        done: false,
    };

    Box::pin(futures::stream::unfold(decoder, |mut decoder| async move {
        loop {
            if let Some(event) = decoder.queue.pop_front() {
                return Some((Ok(event), decoder));
            }
            if decoder.done {
                return None;
            }

            match decoder.body.next().await {
                Some(Ok(chunk)) => {
                    decoder.buffer.push_str(&String::from_utf8_lossy(&chunk));
                    drain_complete_lines(&mut decoder.buffer, &mut decoder.queue);
                }
                Some(Err(err)) => {
                    decoder.done = true;
                    return Some((Err(ClientError::Transport(err.to_string())), decoder));
                }
                None => {
                    decoder.done = true;
                    let rest = std::mem::take(&mut decoder.buffer);
                    push_parsed(&mut decoder.queue, &rest);
                }
            }
        }
    }))
}

fn drain_complete_lines(buffer: &mut String, queue: &mut VecDeque<RawStreamEvent>) {
    while let Some(newline) = buffer.find('\n') {
        let line: String = buffer.drain(..=newline).collect();
        push_parsed(queue, &line);
    }
}

fn push_parsed(queue: &mut VecDeque<RawStreamEvent>, line: &str) {
    let line = line.trim();
    if line.is_empty() {
        return;
    }
    match serde_json::from_str::<RawStreamEvent>(line) {
        Ok(event) => queue.push_back(event),
        Err(err) => debug!(error = %err, "skipping malformed stream line"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_drain_splits_multiple_lines_and_keeps_partial() {
        let mut buffer = String::from(
            "{\"chunk\":{\"bytes\":\"YQ==\"}}\n{\"chunk\":{\"bytes\":\"Yg==\"}}\n{\"chu",
        );
        let mut queue = VecDeque::new();

        drain_complete_lines(&mut buffer, &mut queue);

        assert_eq!(queue.len(), 2);
        assert_eq!(buffer, "{\"chu");
    }

    #[test]
    fn test_malformed_lines_are_skipped() {
        let mut buffer = String::from("not json\n{\"chunk\":{\"bytes\":\"YQ==\"}}\n");
        let mut queue = VecDeque::new();

        drain_complete_lines(&mut buffer, &mut queue);

        assert_eq!(queue.len(), 1);
        assert!(buffer.is_empty());
    }

    #[test]
    fn test_invoke_url_shape() {
        let client = AgentRuntimeHttpClient::new("http://localhost:9100/");
        let request = InvokeAgentRequest {
            agent_id: "AG1".to_string(),
            agent_alias_id: "AL1".to_string(),
            session_id: "abc".to_string(),
            input_text: "plan".to_string(),
            enable_trace: true,
            session_attributes: None,
        };

        assert_eq!(
            client.invoke_url(&request),
            "http://localhost:9100/agents/AG1/agentAliases/AL1/sessions/abc/text"
        );
    }

    #[test]
    fn test_body_omits_absent_session_state() {
        let body = InvokeAgentBody {
            input_text: "plan",
            enable_trace: true,
            session_state: None,
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["inputText"], "plan");
        assert_eq!(json["enableTrace"], true);
        assert!(json.get("sessionState").is_none());
    }
}
