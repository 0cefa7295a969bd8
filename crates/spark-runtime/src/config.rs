use std::env;

/// Supervisor agent coordinates needed to invoke it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AgentTargets {
    pub agent_id: String,
    pub agent_alias_id: String,
}

/// AgentCore memory settings. Recording is opt-in and requires a
/// pre-provisioned memory id; provisioning itself is deployment territory.
#[derive(Debug, Clone, Default)]
pub struct MemoryConfig {
    pub enabled: bool,
    pub endpoint: Option<String>,
    pub memory_id: Option<String>,
}

/// Environment-driven runtime configuration.
///
/// Resolution order for the region follows the AWS convention:
/// `AWS_REGION`, then `AWS_DEFAULT_REGION`, then `us-east-1`. All values
/// are opaque strings; presence checks happen at the server layer.
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    pub region: String,
    /// Base URL of the agent runtime gateway
    pub endpoint: String,
    pub planner_agent_id: Option<String>,
    pub planner_alias_id: Option<String>,
    pub memory: MemoryConfig,
}

impl RuntimeConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build from an arbitrary key lookup (tests supply a map).
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let region = get("AWS_REGION")
            .or_else(|| get("AWS_DEFAULT_REGION"))
            .unwrap_or_else(|| "us-east-1".to_string());

        let endpoint = get("AGENT_RUNTIME_ENDPOINT")
            .unwrap_or_else(|| format!("https://bedrock-agent-runtime.{}.amazonaws.com", region));

        let memory = MemoryConfig {
            enabled: get("USE_AGENT_MEMORY").as_deref() == Some("1"),
            endpoint: get("AGENTCORE_MEMORY_ENDPOINT")
                .or_else(|| Some(format!("https://bedrock-agentcore.{}.amazonaws.com", region))),
            memory_id: get("AGENTCORE_MEMORY_ID"),
        };

        Self {
            region,
            endpoint,
            planner_agent_id: get("AGENTCORE_PLANNER_AGENT_ID"),
            planner_alias_id: get("AGENTCORE_PLANNER_ALIAS_ID"),
            memory,
        }
    }

    /// Both planner ids, when the environment provides them.
    pub fn agent_targets(&self) -> Option<AgentTargets> {
        Some(AgentTargets {
            agent_id: self.planner_agent_id.clone()?,
            agent_alias_id: self.planner_alias_id.clone()?,
        })
    }
}
