//! Long-lived provider sessions shared by all tasks of an agent
//!
//! Tool-augmented agents keep one connection to their tool provider. It is
//! opened on first use, reused by every later task, and dropped by
//! [`SharedSession::release`] when the agent is cancelled.
//!
//! Concurrent first use connects once: the slot's async mutex is held across
//! the connect call. The session itself is not isolated per task.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::error::CourierError;
use crate::provider::Provider;

/// Opens a provider session
#[async_trait]
pub trait Connector: Send + Sync {
    async fn connect(&self) -> Result<Arc<dyn Provider>, CourierError>;
}

/// Connector for a provider that needs no handshake
pub struct Ready(pub Arc<dyn Provider>);

#[async_trait]
impl Connector for Ready {
    async fn connect(&self) -> Result<Arc<dyn Provider>, CourierError> {
        Ok(Arc::clone(&self.0))
    }
}

/// Lazily connected, reference-counted provider session
pub struct SharedSession {
    label: String,
    connector: Box<dyn Connector>,
    slot: Mutex<Option<Arc<dyn Provider>>>,
    connects: AtomicUsize,
}

impl SharedSession {
    pub fn new(label: &str, connector: impl Connector + 'static) -> Self {
        Self {
            label: label.to_string(),
            connector: Box::new(connector),
            slot: Mutex::new(None),
            connects: AtomicUsize::new(0),
        }
    }

    /// Session over an already usable provider
    pub fn ready(label: &str, provider: Arc<dyn Provider>) -> Self {
        Self::new(label, Ready(provider))
    }

    /// The live session, connecting first if needed
    pub async fn get(&self) -> Result<Arc<dyn Provider>, CourierError> {
        let mut slot = self.slot.lock().await;
        if let Some(provider) = slot.as_ref() {
            return Ok(Arc::clone(provider));
        }

        debug!(session = %self.label, "Connecting provider session");
        let provider = self.connector.connect().await?;
        self.connects.fetch_add(1, Ordering::Relaxed);
        info!(session = %self.label, provider = provider.name(), "Provider session connected");

        *slot = Some(Arc::clone(&provider));
        Ok(provider)
    }

    /// Close and forget the session. Returns whether one was open.
    pub async fn release(&self) -> bool {
        let provider = self.slot.lock().await.take();
        match provider {
            Some(provider) => {
                provider.close().await;
                info!(session = %self.label, "Provider session released");
                true
            }
            None => false,
        }
    }

    pub async fn is_connected(&self) -> bool {
        self.slot.lock().await.is_some()
    }

    /// How many times a connection has been opened
    pub fn connect_count(&self) -> usize {
        self.connects.load(Ordering::Relaxed)
    }
}
