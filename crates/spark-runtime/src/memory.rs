use chrono::Utc;
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::{info, warn};

use crate::config::MemoryConfig;

/// Longest payload the memory service accepts comfortably; longer texts are
/// cut at a character boundary.
const MEMORY_TEXT_LIMIT: usize = 1800;

const USER_ACTOR: &str = "Student";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemoryRole {
    User,
    Assistant,
}

impl MemoryRole {
    fn as_wire(self) -> &'static str {
        match self {
            MemoryRole::User => "USER",
            MemoryRole::Assistant => "ASSISTANT",
        }
    }
}

/// One conversational event to persist to AgentCore memory.
#[derive(Debug, Clone)]
pub struct MemoryEvent {
    pub session_id: String,
    pub actor: String,
    pub role: MemoryRole,
    pub text: String,
}

/// Thin wrapper around the AgentCore memory service.
///
/// Recording is best-effort: a failed write is logged and dropped, never
/// surfaced to the request that triggered it.
#[derive(Debug, Clone)]
pub struct MemoryRecorder {
    client: reqwest::Client,
    endpoint: String,
    memory_id: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct CreateEventBody<'a> {
    actor_id: &'a str,
    session_id: &'a str,
    event_timestamp: String,
    payload: Vec<ConversationalEntry>,
}

#[derive(Serialize)]
struct ConversationalEntry {
    conversational: Conversational,
}

#[derive(Serialize)]
struct Conversational {
    content: ConversationalContent,
    role: &'static str,
}

#[derive(Serialize)]
struct ConversationalContent {
    text: String,
}

impl MemoryRecorder {
    /// Build a recorder when memory is enabled and fully configured.
    pub fn from_config(config: &MemoryConfig) -> Option<Self> {
        if !config.enabled {
            return None;
        }
        let (Some(endpoint), Some(memory_id)) = (&config.endpoint, &config.memory_id) else {
            warn!("agent memory enabled but endpoint or memory id is missing; recording disabled");
            return None;
        };

        info!(memory_id = %memory_id, "agent memory recording enabled");
        Some(Self {
            client: reqwest::Client::new(),
            endpoint: endpoint.trim_end_matches('/').to_string(),
            memory_id: memory_id.clone(),
        })
    }

    /// Capture the raw user request for a session.
    pub async fn record_user_goal(&self, session_id: &str, goal: &str) {
        if goal.trim().is_empty() {
            return;
        }
        self.record_events(&[MemoryEvent {
            session_id: session_id.to_string(),
            actor: USER_ACTOR.to_string(),
            role: MemoryRole::User,
            text: goal.to_string(),
        }])
        .await;
    }

    /// Persist an individual agent's response.
    pub async fn record_agent_output(&self, session_id: &str, agent: &str, text: &str) {
        if text.trim().is_empty() {
            return;
        }
        self.record_events(&[MemoryEvent {
            session_id: session_id.to_string(),
            actor: agent.to_string(),
            role: MemoryRole::Assistant,
            text: text.to_string(),
        }])
        .await;
    }

    /// Persist a batch of events, one service call per `(session, actor)`.
    pub async fn record_events(&self, events: &[MemoryEvent]) {
        let mut batches: BTreeMap<(String, String), Vec<&MemoryEvent>> = BTreeMap::new();
        for event in events {
            if event.text.trim().is_empty() {
                continue;
            }
            batches
                .entry((event.session_id.clone(), event.actor.clone()))
                .or_default()
                .push(event);
        }

        for ((session_id, actor), batch) in batches {
            let body = CreateEventBody {
                actor_id: &actor,
                session_id: &session_id,
                event_timestamp: Utc::now().to_rfc3339(),
                payload: batch
                    .iter()
                    .map(|event| ConversationalEntry {
                        conversational: Conversational {
                            content: ConversationalContent {
                                text: truncate_for_memory(&event.text),
                            },
                            role: event.role.as_wire(),
                        },
                    })
                    .collect(),
            };

            let url = format!("{}/memories/{}/events", self.endpoint, self.memory_id);
            match self.client.post(&url).json(&body).send().await {
                Ok(response) if response.status().is_success() => {}
                Ok(response) => {
                    warn!(actor = %actor, status = %response.status(), "failed to persist memory event");
                }
                Err(err) => {
                    warn!(actor = %actor, error = %err, "failed to persist memory event");
                }
            }
        }
    }
}

/// Cut overly long payloads at a character boundary and mark the cut.
fn truncate_for_memory(text: &str) -> String {
    let text = text.trim();
    if text.chars().count() <= MEMORY_TEXT_LIMIT {
        return text.to_string();
    }

    let cut: String = text.chars().take(MEMORY_TEXT_LIMIT).collect();
    format!("{} …", cut.trim_end())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_text_is_untouched() {
        assert_eq!(truncate_for_memory("  hello  "), "hello");
    }

    #[test]
    fn test_long_text_is_cut_with_marker() {
        let long = "x".repeat(MEMORY_TEXT_LIMIT + 100);
        let truncated = truncate_for_memory(&long);
        assert!(truncated.ends_with(" …"));
        assert!(truncated.chars().count() <= MEMORY_TEXT_LIMIT + 2);
    }

    #[test]
    fn test_multibyte_text_is_cut_on_char_boundary() {
        let long = "é".repeat(MEMORY_TEXT_LIMIT * 2);
        let truncated = truncate_for_memory(&long);
        assert!(truncated.ends_with(" …"));
    }

    #[test]
    fn test_recorder_requires_full_configuration() {
        assert!(MemoryRecorder::from_config(&MemoryConfig::default()).is_none());

        let partial = MemoryConfig {
            enabled: true,
            endpoint: Some("http://localhost:9200".to_string()),
            memory_id: None,
        };
        assert!(MemoryRecorder::from_config(&partial).is_none());

        let full = MemoryConfig {
            enabled: true,
            endpoint: Some("http://localhost:9200".to_string()),
            memory_id: Some("mem-1".to_string()),
        };
        assert!(MemoryRecorder::from_config(&full).is_some());
    }
}
