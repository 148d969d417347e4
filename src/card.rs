//! Agent descriptors served at `/.well-known/agent-card.json`

use serde::{Deserialize, Serialize};

use crate::protocol::Message;

/// Protocol version advertised by every agent
pub const PROTOCOL_VERSION: &str = "0.3.0";

/// Well-known path of the descriptor relative to an agent's base address
pub const AGENT_CARD_PATH: &str = "/.well-known/agent-card.json";

/// Discovery document of one capability agent
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentCard {
    pub name: String,
    pub description: String,
    pub url: String,
    pub version: String,
    pub protocol_version: String,
    pub skills: Vec<AgentSkill>,
    pub capabilities: AgentCapabilities,
    pub default_input_modes: Vec<String>,
    pub default_output_modes: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provider: Option<AgentProvider>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentCapabilities {
    #[serde(default)]
    pub streaming: bool,
    #[serde(default)]
    pub push_notifications: bool,
    #[serde(default)]
    pub state_transition_history: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentSkill {
    pub id: String,
    pub name: String,
    pub description: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub examples: Vec<String>,
}

impl AgentSkill {
    pub fn new(id: &str, name: &str, description: &str) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            description: description.to_string(),
            tags: Vec::new(),
            examples: Vec::new(),
        }
    }

    pub fn with_tags(mut self, tags: &[&str]) -> Self {
        self.tags = tags.iter().map(|t| t.to_string()).collect();
        self
    }

    pub fn with_examples(mut self, examples: &[&str]) -> Self {
        self.examples = examples.iter().map(|e| e.to_string()).collect();
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentProvider {
    pub organization: String,
    pub url: String,
}

impl AgentCard {
    /// A streaming-capable card accepting and producing plain text
    pub fn new(name: &str, url: &str) -> Self {
        Self {
            name: name.to_string(),
            description: String::new(),
            url: url.to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            protocol_version: PROTOCOL_VERSION.to_string(),
            skills: Vec::new(),
            capabilities: AgentCapabilities {
                streaming: true,
                push_notifications: false,
                state_transition_history: true,
            },
            default_input_modes: vec!["text/plain".to_string()],
            default_output_modes: vec!["text/plain".to_string()],
            provider: None,
        }
    }

    pub fn with_description(mut self, description: &str) -> Self {
        self.description = description.to_string();
        self
    }

    /// Replace the advertised address, e.g. with the configured public URL
    pub fn with_url(mut self, url: &str) -> Self {
        self.url = url.to_string();
        self
    }

    pub fn with_output_modes(mut self, modes: &[&str]) -> Self {
        self.default_output_modes = modes.iter().map(|m| m.to_string()).collect();
        self
    }

    pub fn with_push_notifications(mut self) -> Self {
        self.capabilities.push_notifications = true;
        self
    }

    pub fn with_provider(mut self, organization: &str, url: &str) -> Self {
        self.provider = Some(AgentProvider {
            organization: organization.to_string(),
            url: url.to_string(),
        });
        self
    }

    pub fn add_skill(mut self, skill: AgentSkill) -> Self {
        self.skills.push(skill);
        self
    }

    /// Whether some part of `message` has a media type this agent declares
    pub fn accepts(&self, message: &Message) -> bool {
        message
            .parts
            .iter()
            .any(|part| self.default_input_modes.iter().any(|m| m == part.media_type()))
    }
}
