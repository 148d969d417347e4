//! Runtime configuration
//!
//! Loaded from `config/default.toml` (optional), then an explicit file, then
//! `COURIER__*` environment variables with `__` as the nesting separator
//! (`COURIER__SIMULATION__ENABLED=false`).

use std::collections::HashMap;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use serde::Deserialize;

use crate::error::CourierError;
use crate::orchestrator::simulation::MAX_STEP_DELAY;

/// The five agents a deployment runs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AgentKind {
    Weather,
    Translator,
    Planner,
    Search,
    Calculator,
}

impl AgentKind {
    pub const ALL: [AgentKind; 5] = [
        AgentKind::Weather,
        AgentKind::Translator,
        AgentKind::Planner,
        AgentKind::Search,
        AgentKind::Calculator,
    ];

    pub fn name(self) -> &'static str {
        match self {
            AgentKind::Weather => "weather",
            AgentKind::Translator => "translator",
            AgentKind::Planner => "planner",
            AgentKind::Search => "search",
            AgentKind::Calculator => "calculator",
        }
    }

    pub fn default_port(self) -> u16 {
        match self {
            AgentKind::Weather => 4000,
            AgentKind::Translator => 4001,
            AgentKind::Planner => 4002,
            AgentKind::Search => 4003,
            AgentKind::Calculator => 4004,
        }
    }
}

impl fmt::Display for AgentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for AgentKind {
    type Err = CourierError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        AgentKind::ALL
            .into_iter()
            .find(|kind| kind.name().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| CourierError::Config(format!("unknown agent \"{s}\"")))
    }
}

/// Configuration root
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct AppConfig {
    pub agents: HashMap<AgentKind, AgentAddress>,
    pub simulation: SimulationSection,
    pub client: ClientSection,
    pub providers: ProvidersSection,
}

/// `[agents.<name>]`: where an agent listens and how others reach it
#[derive(Debug, Clone, Deserialize, Default)]
pub struct AgentAddress {
    pub bind: Option<String>,
    pub url: Option<String>,
}

/// [simulation]
#[derive(Debug, Clone, Deserialize)]
pub struct SimulationSection {
    #[serde(default = "default_simulation_enabled")]
    pub enabled: bool,
    /// Artificial delay per simulated step
    #[serde(default = "default_delay_ms")]
    pub delay_ms: u64,
}

fn default_simulation_enabled() -> bool {
    true
}

fn default_delay_ms() -> u64 {
    250
}

impl Default for SimulationSection {
    fn default() -> Self {
        Self {
            enabled: default_simulation_enabled(),
            delay_ms: default_delay_ms(),
        }
    }
}

impl SimulationSection {
    pub fn delay(&self) -> Duration {
        Duration::from_millis(self.delay_ms).min(MAX_STEP_DELAY)
    }
}

/// [client]
#[derive(Debug, Clone, Deserialize)]
pub struct ClientSection {
    /// Deadline for one remote capability call; unbounded when unset
    pub timeout_secs: Option<u64>,
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,
}

fn default_connect_timeout_secs() -> u64 {
    5
}

impl Default for ClientSection {
    fn default() -> Self {
        Self {
            timeout_secs: None,
            connect_timeout_secs: default_connect_timeout_secs(),
        }
    }
}

impl ClientSection {
    pub fn deadline(&self) -> Option<Duration> {
        self.timeout_secs.map(Duration::from_secs)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }
}

/// [providers]: HTTP endpoints of external providers. Unset means synthetic.
#[derive(Debug, Clone, Deserialize)]
pub struct ProvidersSection {
    pub weather: Option<String>,
    pub search: Option<String>,
    pub calculator: Option<String>,
    pub translator: Option<String>,
    pub composer: Option<String>,
    pub api_key: Option<String>,
    #[serde(default = "default_provider_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_provider_timeout_secs() -> u64 {
    30
}

impl Default for ProvidersSection {
    fn default() -> Self {
        Self {
            weather: None,
            search: None,
            calculator: None,
            translator: None,
            composer: None,
            api_key: None,
            timeout_secs: default_provider_timeout_secs(),
        }
    }
}

impl ProvidersSection {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl AppConfig {
    /// Socket address `kind` listens on
    pub fn bind(&self, kind: AgentKind) -> String {
        self.agents
            .get(&kind)
            .and_then(|a| a.bind.clone())
            .unwrap_or_else(|| format!("127.0.0.1:{}", kind.default_port()))
    }

    /// Base URL other agents use to reach `kind`
    pub fn url(&self, kind: AgentKind) -> String {
        self.agents
            .get(&kind)
            .and_then(|a| a.url.clone())
            .unwrap_or_else(|| format!("http://localhost:{}/", kind.default_port()))
    }
}

/// Load configuration: defaults, then `path`, then `COURIER__*` overrides
pub fn load_config(path: Option<PathBuf>) -> Result<AppConfig, CourierError> {
    let mut builder = config::Config::builder();

    if std::path::Path::new("config/default.toml").exists() {
        builder = builder.add_source(config::File::with_name("config/default").required(false));
    }
    if let Some(p) = path {
        if !p.exists() {
            return Err(CourierError::Config(format!("config file {} not found", p.display())));
        }
        builder = builder.add_source(config::File::from(p));
    }

    builder = builder.add_source(
        config::Environment::with_prefix("COURIER")
            .separator("__")
            .try_parsing(true),
    );

    Ok(builder.build()?.try_deserialize()?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_config(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_defaults() {
        let config = AppConfig::default();
        assert!(config.simulation.enabled);
        assert_eq!(config.bind(AgentKind::Planner), "127.0.0.1:4002");
        assert_eq!(config.url(AgentKind::Calculator), "http://localhost:4004/");
        assert_eq!(config.client.deadline(), None);
        assert_eq!(config.providers.timeout(), Duration::from_secs(30));
    }

    #[test]
    fn test_file_overrides_sections() {
        let file = write_config(
            r#"
            [agents.weather]
            bind = "0.0.0.0:9000"
            url = "http://weather.internal:9000/"

            [simulation]
            enabled = false
            delay_ms = 60000

            [client]
            timeout_secs = 12

            [providers]
            composer = "http://llm.internal/compose"
            "#,
        );

        let config = load_config(Some(file.path().to_path_buf())).unwrap();
        assert_eq!(config.bind(AgentKind::Weather), "0.0.0.0:9000");
        assert_eq!(config.url(AgentKind::Weather), "http://weather.internal:9000/");
        assert_eq!(config.url(AgentKind::Search), "http://localhost:4003/");
        assert!(!config.simulation.enabled);
        assert_eq!(config.simulation.delay(), MAX_STEP_DELAY);
        assert_eq!(config.client.deadline(), Some(Duration::from_secs(12)));
        assert_eq!(config.providers.composer.as_deref(), Some("http://llm.internal/compose"));
        assert_eq!(config.providers.weather, None);
    }

    #[test]
    fn test_missing_explicit_file_is_error() {
        let err = load_config(Some(PathBuf::from("/nonexistent/courier.toml"))).unwrap_err();
        assert!(matches!(err, CourierError::Config(_)));
    }

    #[test]
    fn test_agent_kind_parsing() {
        assert_eq!("Planner".parse::<AgentKind>().unwrap(), AgentKind::Planner);
        assert_eq!(" search ".parse::<AgentKind>().unwrap(), AgentKind::Search);
        assert!("mailer".parse::<AgentKind>().is_err());
        for kind in AgentKind::ALL {
            assert_eq!(kind.to_string().parse::<AgentKind>().unwrap(), kind);
        }
    }
}
