//! How a client reaches an agent
//!
//! [`LocalTransport`] runs agents in-process; [`HttpTransport`] talks to an
//! [`AgentServer`](crate::server::AgentServer). Both hand back the task's
//! events as one ordered stream.

pub mod http;
pub mod local;

use std::pin::Pin;

use async_trait::async_trait;
use futures_util::Stream;
use serde::{Deserialize, Serialize};

use crate::card::AgentCard;
use crate::error::CourierError;
use crate::protocol::{Event, Message, TaskId, TaskState};

pub use http::HttpTransport;
pub use local::LocalTransport;

/// Events of one task, in publish order
pub type BoxEventStream = Pin<Box<dyn Stream<Item = Result<Event, CourierError>> + Send>>;

#[async_trait]
pub trait Transport: Send + Sync {
    /// Fetch the descriptor of the agent at `address`
    async fn fetch_card(&self, address: &str) -> Result<AgentCard, CourierError>;

    /// Submit `message` to the agent and stream the resulting task
    async fn open_stream(&self, card: &AgentCard, message: Message) -> Result<BoxEventStream, CourierError>;
}

/// Delivery mode of `POST /message`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SendMode {
    #[default]
    Blocking,
    Streaming,
}

/// Body of `POST /message`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SendRequest {
    pub message: Message,
    #[serde(default)]
    pub mode: SendMode,
}

/// Answer to a blocking `POST /message`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlockingReply {
    pub task_id: Option<TaskId>,
    pub state: Option<TaskState>,
    pub message: Option<Message>,
}

/// Address without trailing slashes, used as a lookup key and URL base
pub fn normalize_address(address: &str) -> &str {
    address.trim().trim_end_matches('/')
}

/// `path` resolved against an agent's base address
pub fn endpoint(address: &str, path: &str) -> String {
    format!("{}/{}", normalize_address(address), path.trim_start_matches('/'))
}
