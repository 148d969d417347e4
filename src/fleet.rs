//! Agents assembled from configuration
//!
//! With simulation on, every provider is synthetic and the planner answers
//! from templates. With it off, providers are HTTP bridges and the planner
//! calls the other agents over the network. The calculator keeps its local
//! math tools unless an endpoint is configured.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tracing::info;

use crate::agent::{Agent, AgentHandle};
use crate::capabilities::{
    BudgetTool, SyntheticSearch, SyntheticTranslator, SyntheticWeather, ToolCapability, TranslatorCapability,
    WeatherCapability,
};
use crate::config::{AgentKind, AppConfig};
use crate::error::CourierError;
use crate::orchestrator::{CapabilityEndpoints, LiveServices, Planner, SyntheticComposer};
use crate::provider::{HttpProvider, Provider};
use crate::session::{Connector, SharedSession};
use crate::transport::{HttpTransport, LocalTransport, Transport};

/// Opens an [`HttpProvider`] on first use of a session
pub struct HttpConnector {
    name: String,
    endpoint: String,
    timeout: Duration,
    api_key: Option<String>,
}

impl HttpConnector {
    pub fn new(name: &str, endpoint: &str, timeout: Duration, api_key: Option<String>) -> Self {
        Self {
            name: name.to_string(),
            endpoint: endpoint.to_string(),
            timeout,
            api_key,
        }
    }
}

#[async_trait]
impl Connector for HttpConnector {
    async fn connect(&self) -> Result<Arc<dyn Provider>, CourierError> {
        let provider = HttpProvider::new(&self.name, &self.endpoint, self.timeout)?.with_api_key(self.api_key.clone());
        Ok(Arc::new(provider))
    }
}

/// Builds agents for one configuration
pub struct Fleet<'a> {
    config: &'a AppConfig,
}

impl<'a> Fleet<'a> {
    pub fn new(config: &'a AppConfig) -> Self {
        Self { config }
    }

    fn simulated(&self) -> bool {
        self.config.simulation.enabled
    }

    /// Endpoint for a provider, `None` when the synthetic one applies
    fn endpoint<'e>(&self, name: &str, endpoint: &'e Option<String>) -> Result<Option<&'e str>, CourierError> {
        match endpoint.as_deref() {
            _ if self.simulated() => Ok(None),
            Some(url) => Ok(Some(url)),
            None => Err(CourierError::Config(format!(
                "simulation is off but no {name} provider endpoint is configured"
            ))),
        }
    }

    fn http_provider(&self, name: &str, endpoint: &str) -> Result<Arc<dyn Provider>, CourierError> {
        let providers = &self.config.providers;
        let provider = HttpProvider::new(name, endpoint, providers.timeout())?.with_api_key(providers.api_key.clone());
        Ok(Arc::new(provider))
    }

    fn connector(&self, name: &str, endpoint: &str) -> HttpConnector {
        let providers = &self.config.providers;
        HttpConnector::new(name, endpoint, providers.timeout(), providers.api_key.clone())
    }

    pub fn weather(&self) -> Result<AgentHandle, CourierError> {
        let provider: Arc<dyn Provider> = match self.endpoint("weather", &self.config.providers.weather)? {
            Some(url) => self.http_provider("weather", url)?,
            None => Arc::new(SyntheticWeather),
        };
        let url = self.config.url(AgentKind::Weather);
        Ok(Arc::new(Agent::new(WeatherCapability::new(provider)?).with_url(&url)))
    }

    pub fn translator(&self) -> Result<AgentHandle, CourierError> {
        let provider: Arc<dyn Provider> = match self.endpoint("translator", &self.config.providers.translator)? {
            Some(url) => self.http_provider("translator", url)?,
            None => Arc::new(SyntheticTranslator),
        };
        let url = self.config.url(AgentKind::Translator);
        Ok(Arc::new(Agent::new(TranslatorCapability::new(provider)?).with_url(&url)))
    }

    pub fn search(&self) -> Result<AgentHandle, CourierError> {
        let session = match self.endpoint("search", &self.config.providers.search)? {
            Some(url) => SharedSession::new("search", self.connector("search", url)),
            None => SharedSession::ready("search", Arc::new(SyntheticSearch)),
        };
        let url = self.config.url(AgentKind::Search);
        Ok(Arc::new(Agent::new(ToolCapability::search(session)).with_url(&url)))
    }

    pub fn calculator(&self) -> Result<AgentHandle, CourierError> {
        let session = match &self.config.providers.calculator {
            Some(url) if !self.simulated() => SharedSession::new("math", self.connector("math-tools", url)),
            _ => SharedSession::ready("math", Arc::new(BudgetTool::new()?)),
        };
        let url = self.config.url(AgentKind::Calculator);
        Ok(Arc::new(Agent::new(ToolCapability::calculator(session)).with_url(&url)))
    }

    fn endpoints(&self) -> CapabilityEndpoints {
        CapabilityEndpoints {
            search: self.config.url(AgentKind::Search),
            weather: self.config.url(AgentKind::Weather),
            calculator: self.config.url(AgentKind::Calculator),
            translator: self.config.url(AgentKind::Translator),
        }
    }

    fn composer(&self) -> Result<Arc<dyn Provider>, CourierError> {
        match self.endpoint("composer", &self.config.providers.composer)? {
            Some(url) => self.http_provider("composer", url),
            None => Ok(Arc::new(SyntheticComposer)),
        }
    }

    /// Planner calling the capability agents through `transport`
    pub fn planner_over(&self, transport: Arc<dyn Transport>) -> Result<AgentHandle, CourierError> {
        let services = LiveServices::new(
            transport,
            &self.endpoints(),
            self.composer()?,
            self.config.client.deadline(),
        );
        let url = self.config.url(AgentKind::Planner);
        Ok(Arc::new(Planner::new(Arc::new(services)).with_url(&url)))
    }

    /// Standalone planner: templates in simulation, HTTP otherwise
    pub fn planner(&self) -> Result<AgentHandle, CourierError> {
        if self.simulated() {
            let url = self.config.url(AgentKind::Planner);
            return Ok(Arc::new(Planner::simulated(self.config.simulation.delay()).with_url(&url)));
        }
        let transport = HttpTransport::new(self.config.client.connect_timeout())?;
        self.planner_over(Arc::new(transport))
    }

    pub fn agent(&self, kind: AgentKind) -> Result<AgentHandle, CourierError> {
        match kind {
            AgentKind::Weather => self.weather(),
            AgentKind::Translator => self.translator(),
            AgentKind::Planner => self.planner(),
            AgentKind::Search => self.search(),
            AgentKind::Calculator => self.calculator(),
        }
    }

    /// Every agent in one process; the planner reaches the others in-process
    pub fn local(&self) -> Result<LocalTransport, CourierError> {
        let capabilities = LocalTransport::new()
            .with_agent(self.weather()?)
            .with_agent(self.translator()?)
            .with_agent(self.search()?)
            .with_agent(self.calculator()?);

        let all = LocalTransport::new();
        for kind in [AgentKind::Weather, AgentKind::Translator, AgentKind::Search, AgentKind::Calculator] {
            if let Some(agent) = capabilities.agent(&self.config.url(kind)) {
                all.register(agent);
            }
        }
        all.register(self.planner_over(Arc::new(capabilities))?);
        info!("Local fleet assembled");
        Ok(all)
    }
}
