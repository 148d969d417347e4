//! External capability providers
//!
//! Weather services, search engines, translators and language models all sit
//! behind [`Provider`]. Calls are asynchronous and answer with a
//! [`ProviderReply`]; a provider never panics the agent on failure, it
//! replies [`ProviderReply::Error`].

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

use crate::error::CourierError;

/// Outcome of one provider call
#[derive(Debug, Clone, PartialEq)]
pub enum ProviderReply {
    Text(String),
    Data(Value),
    Error(String),
}

impl ProviderReply {
    /// Text result, or a provider error naming `provider`
    pub fn into_text(self, provider: &str) -> Result<String, CourierError> {
        match self {
            ProviderReply::Text(text) if !text.trim().is_empty() => Ok(text),
            ProviderReply::Text(_) => Err(CourierError::provider(provider, "empty response")),
            ProviderReply::Data(_) => Err(CourierError::provider(
                provider,
                "expected text, got structured data",
            )),
            ProviderReply::Error(reason) => Err(CourierError::provider(provider, reason)),
        }
    }

    /// Structured result, or a provider error naming `provider`
    pub fn into_data(self, provider: &str) -> Result<Value, CourierError> {
        match self {
            ProviderReply::Data(data) => Ok(data),
            ProviderReply::Text(_) => Err(CourierError::provider(
                provider,
                "expected structured data, got text",
            )),
            ProviderReply::Error(reason) => Err(CourierError::provider(provider, reason)),
        }
    }
}

/// Black-box external capability
#[async_trait]
pub trait Provider: Send + Sync {
    fn name(&self) -> &str;

    async fn provide(&self, query: &str, context: Option<&Value>) -> ProviderReply;

    /// Release held connections; the default holds none
    async fn close(&self) {}
}

type Respond = dyn Fn(&str, Option<&Value>) -> ProviderReply + Send + Sync;

/// Deterministic in-process provider, used for simulation and tests
pub struct SyntheticProvider {
    name: String,
    delay: Duration,
    respond: Box<Respond>,
}

impl SyntheticProvider {
    pub fn new(
        name: &str,
        respond: impl Fn(&str, Option<&Value>) -> ProviderReply + Send + Sync + 'static,
    ) -> Self {
        Self {
            name: name.to_string(),
            delay: Duration::ZERO,
            respond: Box::new(respond),
        }
    }

    /// Always answer with the same text
    pub fn fixed(name: &str, text: &str) -> Self {
        let text = text.to_string();
        Self::new(name, move |_, _| ProviderReply::Text(text.clone()))
    }

    /// Wait this long before answering
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }
}

#[async_trait]
impl Provider for SyntheticProvider {
    fn name(&self) -> &str {
        &self.name
    }

    async fn provide(&self, query: &str, context: Option<&Value>) -> ProviderReply {
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        (self.respond)(query, context)
    }
}

#[derive(Serialize)]
struct HttpProviderRequest<'a> {
    query: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    context: Option<&'a Value>,
}

#[derive(Deserialize)]
struct HttpProviderResponse {
    text: Option<String>,
    data: Option<Value>,
    error: Option<String>,
}

/// JSON bridge to a provider service
///
/// `POST {endpoint}` with `{"query", "context"}`; the service answers with
/// one of `{"text"}`, `{"data"}` or `{"error"}`.
pub struct HttpProvider {
    name: String,
    endpoint: String,
    api_key: Option<String>,
    client: reqwest::Client,
}

impl HttpProvider {
    pub fn new(name: &str, endpoint: &str, timeout: Duration) -> Result<Self, CourierError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("courier/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            name: name.to_string(),
            endpoint: endpoint.to_string(),
            api_key: None,
            client,
        })
    }

    pub fn with_api_key(mut self, api_key: Option<String>) -> Self {
        self.api_key = api_key;
        self
    }

    async fn call(&self, query: &str, context: Option<&Value>) -> Result<ProviderReply, reqwest::Error> {
        let mut request = self
            .client
            .post(&self.endpoint)
            .json(&HttpProviderRequest { query, context });
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let response: HttpProviderResponse = request.send().await?.error_for_status()?.json().await?;
        Ok(match response {
            HttpProviderResponse { error: Some(error), .. } => ProviderReply::Error(error),
            HttpProviderResponse { text: Some(text), .. } => ProviderReply::Text(text),
            HttpProviderResponse { data: Some(data), .. } => ProviderReply::Data(data),
            _ => ProviderReply::Error("response carried no text, data or error".to_string()),
        })
    }
}

#[async_trait]
impl Provider for HttpProvider {
    fn name(&self) -> &str {
        &self.name
    }

    async fn provide(&self, query: &str, context: Option<&Value>) -> ProviderReply {
        debug!(provider = %self.name, endpoint = %self.endpoint, "Calling provider");
        match self.call(query, context).await {
            Ok(reply) => reply,
            Err(e) => {
                warn!(provider = %self.name, error = %e, "Provider request failed");
                ProviderReply::Error(e.to_string())
            }
        }
    }
}
