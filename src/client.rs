//! Calling a capability agent and reducing its task to text

use std::sync::Arc;
use std::time::Duration;

use futures_util::StreamExt;
use tokio::sync::OnceCell;
use tracing::{debug, instrument, warn};

use crate::card::AgentCard;
use crate::error::CourierError;
use crate::protocol::{Event, Message, TaskState};
use crate::transport::Transport;

/// Fold over a task's events, keeping the last non-empty agent reply
#[derive(Debug, Default, Clone)]
pub struct Reduction {
    reply: Option<String>,
    final_state: Option<TaskState>,
    events: usize,
}

impl Reduction {
    pub fn observe(&mut self, event: &Event) {
        self.events += 1;
        match event {
            Event::Message(message) if message.is_agent() => {
                let text = message.joined_text();
                if !text.is_empty() {
                    self.reply = Some(text);
                }
            }
            Event::StatusUpdate(update) if update.is_final => {
                self.final_state = Some(update.status.state);
            }
            _ => {}
        }
    }

    pub fn reply(&self) -> Option<&str> {
        self.reply.as_deref()
    }

    pub fn final_state(&self) -> Option<TaskState> {
        self.final_state
    }
}

/// Text of the last agent message among `events`
pub fn reduce_events<'a>(events: impl IntoIterator<Item = &'a Event>) -> Option<String> {
    let mut reduction = Reduction::default();
    for event in events {
        reduction.observe(event);
    }
    reduction.reply
}

/// Client bound to one remote capability agent
pub struct RemoteClient {
    capability: String,
    address: String,
    transport: Arc<dyn Transport>,
    card: OnceCell<AgentCard>,
    deadline: Option<Duration>,
}

impl RemoteClient {
    pub fn new(capability: &str, address: &str, transport: Arc<dyn Transport>) -> Self {
        Self {
            capability: capability.to_string(),
            address: address.to_string(),
            transport,
            card: OnceCell::new(),
            deadline: None,
        }
    }

    /// Bound every call by `deadline`; `None` waits indefinitely
    pub fn with_deadline(mut self, deadline: Option<Duration>) -> Self {
        self.deadline = deadline;
        self
    }

    pub fn capability(&self) -> &str {
        &self.capability
    }

    pub fn address(&self) -> &str {
        &self.address
    }

    /// The agent's card, fetched once per client
    pub async fn resolve(&self) -> Result<&AgentCard, CourierError> {
        self.card
            .get_or_try_init(|| async {
                debug!(capability = %self.capability, address = %self.address, "Resolving agent card");
                self.transport
                    .fetch_card(&self.address)
                    .await
                    .map_err(|e| CourierError::remote_call(&self.capability, e))
            })
            .await
    }

    /// Send `query` and return the agent's final reply.
    ///
    /// A task that ends `failed` is an error carrying the agent's reply.
    #[instrument(skip(self, query), fields(capability = %self.capability))]
    pub async fn call(&self, query: &str) -> Result<String, CourierError> {
        match self.deadline {
            Some(deadline) => tokio::time::timeout(deadline, self.call_unbounded(query))
                .await
                .map_err(|_| {
                    warn!(capability = %self.capability, ?deadline, "Remote call timed out");
                    CourierError::remote_call(&self.capability, format!("no result within {deadline:?}"))
                })?,
            None => self.call_unbounded(query).await,
        }
    }

    async fn call_unbounded(&self, query: &str) -> Result<String, CourierError> {
        let card = self.resolve().await?;
        let mut events = self
            .transport
            .open_stream(card, Message::user_text(query))
            .await
            .map_err(|e| CourierError::remote_call(&self.capability, e))?;

        let mut reduction = Reduction::default();
        while let Some(event) = events.next().await {
            let event = event.map_err(|e| CourierError::remote_call(&self.capability, e))?;
            reduction.observe(&event);
        }
        debug!(capability = %self.capability, events = reduction.events, "Task stream ended");

        match (reduction.reply(), reduction.final_state()) {
            (Some(reply), Some(TaskState::Failed)) => Err(CourierError::remote_call(&self.capability, reply)),
            (Some(reply), _) => Ok(reply.to_string()),
            (None, _) => Err(CourierError::remote_call(
                &self.capability,
                "stream ended without an agent message",
            )),
        }
    }
}
