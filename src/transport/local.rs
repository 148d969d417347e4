//! In-process transport: agents registered by address

use std::collections::HashMap;

use async_trait::async_trait;
use futures_util::StreamExt;
use parking_lot::RwLock;
use tracing::debug;

use super::{normalize_address, BoxEventStream, Transport};
use crate::agent::{spawn_execute, AgentHandle, RequestContext};
use crate::card::AgentCard;
use crate::error::CourierError;
use crate::protocol::Message;

/// Registry of in-process agents, keyed by the address on their card
#[derive(Default)]
pub struct LocalTransport {
    agents: RwLock<HashMap<String, AgentHandle>>,
}

impl LocalTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make `agent` reachable at the address its card advertises
    pub fn register(&self, agent: AgentHandle) {
        let address = normalize_address(&agent.card().url).to_string();
        debug!(agent = %agent.card().name, address = %address, "Registering local agent");
        self.agents.write().insert(address, agent);
    }

    pub fn with_agent(self, agent: AgentHandle) -> Self {
        self.register(agent);
        self
    }

    pub fn agent(&self, address: &str) -> Option<AgentHandle> {
        self.agents.read().get(normalize_address(address)).cloned()
    }

    fn lookup(&self, address: &str) -> Result<AgentHandle, CourierError> {
        self.agent(address)
            .ok_or_else(|| CourierError::Transport(format!("no local agent at {address}")))
    }
}

#[async_trait]
impl Transport for LocalTransport {
    async fn fetch_card(&self, address: &str) -> Result<AgentCard, CourierError> {
        Ok(self.lookup(address)?.card().clone())
    }

    async fn open_stream(&self, card: &AgentCard, message: Message) -> Result<BoxEventStream, CourierError> {
        let agent = self.lookup(&card.url)?;
        let events = spawn_execute(agent, RequestContext::new(message));
        Ok(Box::pin(events.map(Ok::<_, CourierError>)))
    }
}
