use std::sync::Arc;
use tracing::warn;

use spark_runtime::{
    AgentRuntimeHttpClient, ChatClient, InvocationSession, MemoryRecorder, RuntimeConfig,
};

/// Shared handles for request handlers.
///
/// Optional members stay `None` when their configuration is absent; the
/// corresponding endpoints answer 503 instead of failing at startup.
#[derive(Clone)]
pub struct AppState {
    pub session: Option<Arc<InvocationSession>>,
    pub chat: Option<Arc<ChatClient>>,
    pub memory: Option<Arc<MemoryRecorder>>,
    pub region: String,
    pub planner_agent_id: Option<String>,
    pub planner_alias_id: Option<String>,
}

impl AppState {
    pub fn from_config(config: &RuntimeConfig) -> Self {
        let session = match config.agent_targets() {
            Some(targets) => {
                let client = Arc::new(AgentRuntimeHttpClient::new(config.endpoint.clone()));
                Some(Arc::new(InvocationSession::new(client, targets)))
            }
            None => {
                warn!("planner agent ids not configured; /api/plan will be unavailable");
                None
            }
        };

        let chat = match ChatClient::from_env() {
            Ok(client) => Some(Arc::new(client)),
            Err(err) => {
                warn!(error = %err, "chat client unavailable; intake endpoints will be degraded");
                None
            }
        };

        let memory = MemoryRecorder::from_config(&config.memory).map(Arc::new);

        Self {
            session,
            chat,
            memory,
            region: config.region.clone(),
            planner_agent_id: config.planner_agent_id.clone(),
            planner_alias_id: config.planner_alias_id.clone(),
        }
    }
}
