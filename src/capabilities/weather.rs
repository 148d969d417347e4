//! Weather lookup for a city named in free text

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::info;

use super::rules::RuleTable;
use crate::agent::{Capability, Outcome};
use crate::card::{AgentCard, AgentSkill};
use crate::error::CourierError;
use crate::protocol::Artifact;
use crate::provider::{Provider, ProviderReply};

const CITY_RULES: &[&str] = &[
    r"météo (?:à|a|pour) ([a-zàâäéèêëïîôöùûüÿæœç\s-]+)",
    r"weather (?:in|for) ([a-z\s-]+)",
    r"forecast (?:in|for) ([a-z\s-]+)",
    r"([a-zàâäéèêëïîôöùûüÿæœç\s-]+)\s*météo",
    r"^([a-zàâäéèêëïîôöùûüÿæœç\s-]+)$",
];

/// Current conditions as returned by a weather provider
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WeatherReport {
    pub city: String,
    pub temperature: i32,
    pub description: String,
    pub humidity: u32,
    pub wind_speed: u32,
}

impl WeatherReport {
    fn summary(&self, city: &str) -> String {
        format!(
            "Current weather in {city}:\nTemperature: {}°C\nConditions: {}\nHumidity: {}%\nWind: {} m/s",
            self.temperature, self.description, self.humidity, self.wind_speed
        )
    }
}

pub fn weather_card() -> AgentCard {
    AgentCard::new("Weather Agent", "http://localhost:4000/")
        .with_description("Provides weather information for any city")
        .with_output_modes(&["text/plain", "application/json"])
        .with_provider("Courier", "https://a2a-protocol.org")
        .add_skill(
            AgentSkill::new(
                "get_weather",
                "Get Weather",
                "Retrieves current weather forecast for a given city",
            )
            .with_tags(&["weather", "forecast", "temperature"])
            .with_examples(&["What's the weather in Paris?", "Weather in Tokyo", "Forecast for London"]),
        )
}

pub struct WeatherCapability {
    provider: Arc<dyn Provider>,
    cities: RuleTable<()>,
}

impl WeatherCapability {
    pub fn new(provider: Arc<dyn Provider>) -> Result<Self, CourierError> {
        let rules: Vec<(&str, ())> = CITY_RULES.iter().map(|rule| (*rule, ())).collect();
        Ok(Self {
            provider,
            cities: RuleTable::compile(&rules)?,
        })
    }

    /// City named by the first matching rule
    pub fn extract_city(&self, text: &str) -> Option<String> {
        let (_, caps) = self.cities.first_match(text.trim())?;
        let city = caps.get(1)?.as_str().trim();
        (!city.is_empty()).then(|| city.to_string())
    }
}

#[async_trait]
impl Capability for WeatherCapability {
    fn label(&self) -> &'static str {
        "Weather"
    }

    fn card(&self) -> AgentCard {
        weather_card()
    }

    async fn run(&self, text: &str) -> Result<Outcome, CourierError> {
        let city = self
            .extract_city(text)
            .ok_or_else(|| CourierError::input("unable to extract a city name from the message"))?;
        info!(city = %city, "Fetching weather");

        let provider = self.provider.name();
        let data = self.provider.provide(&city, None).await.into_data(provider)?;
        let report: WeatherReport = serde_json::from_value(data)
            .map_err(|e| CourierError::provider(provider, format!("malformed weather data: {e}")))?;

        let artifact = Artifact::text(
            format!("weather_{}.json", city.to_lowercase()),
            format!("Weather data for {city}"),
            report.summary(&city),
        );
        Ok(Outcome::reply(format!(
            "Weather data retrieved for {city}. It's currently {}°C with {}.",
            report.temperature, report.description
        ))
        .with_artifact(artifact))
    }
}

const CONDITIONS: [&str; 4] = ["Sunny", "Cloudy", "Rainy", "Partly cloudy"];

/// Deterministic stand-in for a weather service
///
/// Conditions are derived from the city name, so the same city always gets
/// the same report.
#[derive(Debug, Default, Clone, Copy)]
pub struct SyntheticWeather;

impl SyntheticWeather {
    pub fn report(city: &str) -> WeatherReport {
        // FNV-1a over the lowercased name
        let seed = city
            .to_lowercase()
            .bytes()
            .fold(0xcbf2_9ce4_8422_2325_u64, |hash, byte| {
                (hash ^ u64::from(byte)).wrapping_mul(0x0100_0000_01b3)
            });

        WeatherReport {
            city: city.to_string(),
            temperature: 15 + (seed % 16) as i32,
            description: CONDITIONS[((seed >> 8) % 4) as usize].to_string(),
            humidity: 40 + ((seed >> 16) % 41) as u32,
            wind_speed: 5 + ((seed >> 24) % 11) as u32,
        }
    }
}

#[async_trait]
impl Provider for SyntheticWeather {
    fn name(&self) -> &str {
        "synthetic-weather"
    }

    async fn provide(&self, query: &str, _context: Option<&Value>) -> ProviderReply {
        let city = query.trim();
        if city.is_empty() {
            return ProviderReply::Error("no city given".to_string());
        }
        match serde_json::to_value(Self::report(city)) {
            Ok(data) => ProviderReply::Data(data),
            Err(e) => ProviderReply::Error(e.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::SyntheticProvider;
    use serde_json::json;

    fn capability() -> WeatherCapability {
        WeatherCapability::new(Arc::new(SyntheticWeather)).unwrap()
    }

    #[test]
    fn test_rule_french_preposition() {
        let weather = capability();
        assert_eq!(weather.extract_city("Météo à Marseille").as_deref(), Some("Marseille"));
        assert_eq!(weather.extract_city("météo pour Saint-Étienne").as_deref(), Some("Saint-Étienne"));
    }

    #[test]
    fn test_rule_weather_in() {
        let weather = capability();
        assert_eq!(weather.extract_city("What is the weather in Tokyo?").as_deref(), Some("Tokyo"));
        assert_eq!(weather.extract_city("Weather for New York").as_deref(), Some("New York"));
    }

    #[test]
    fn test_rule_forecast_for() {
        let weather = capability();
        assert_eq!(weather.extract_city("Forecast for London").as_deref(), Some("London"));
    }

    #[test]
    fn test_rule_city_then_meteo() {
        let weather = capability();
        assert_eq!(weather.extract_city("Lyon météo").as_deref(), Some("Lyon"));
    }

    #[test]
    fn test_rule_bare_city() {
        let weather = capability();
        assert_eq!(weather.extract_city("  Paris ").as_deref(), Some("Paris"));
        assert!(weather.extract_city("How hot is it at 5pm?").is_none());
        assert!(weather.extract_city("").is_none());
    }

    #[test]
    fn test_synthetic_weather_is_deterministic() {
        let first = SyntheticWeather::report("Tokyo");
        assert_eq!(first, SyntheticWeather::report("tokyo").with_city("Tokyo"));
        assert!((15..=30).contains(&first.temperature));
        assert!((40..=80).contains(&first.humidity));
        assert!((5..=15).contains(&first.wind_speed));
        assert!(CONDITIONS.contains(&first.description.as_str()));
    }

    impl WeatherReport {
        fn with_city(mut self, city: &str) -> Self {
            self.city = city.to_string();
            self
        }
    }

    #[tokio::test]
    async fn test_run_publishes_artifact_and_reply() {
        let provider = SyntheticProvider::new("weather", |city, _| {
            ProviderReply::Data(json!({
                "city": city,
                "temperature": 22,
                "description": "clear sky",
                "humidity": 55,
                "windSpeed": 4
            }))
        });
        let weather = WeatherCapability::new(Arc::new(provider)).unwrap();

        let outcome = weather.run("Weather in Rome").await.unwrap();
        assert_eq!(outcome.reply, "Weather data retrieved for Rome. It's currently 22°C with clear sky.");

        let artifact = &outcome.artifacts[0];
        assert_eq!(artifact.name.as_deref(), Some("weather_rome.json"));
        assert_eq!(artifact.description.as_deref(), Some("Weather data for Rome"));
        assert_eq!(
            artifact.parts[0].as_text().unwrap(),
            "Current weather in Rome:\nTemperature: 22°C\nConditions: clear sky\nHumidity: 55%\nWind: 4 m/s"
        );
    }

    #[tokio::test]
    async fn test_run_without_city_is_input_error() {
        let err = capability().run("1234?").await.unwrap_err();
        assert!(matches!(err, CourierError::Input(_)));
    }

    #[tokio::test]
    async fn test_provider_error_propagates() {
        let provider = SyntheticProvider::new("weather", |_, _| ProviderReply::Error("city not found".into()));
        let weather = WeatherCapability::new(Arc::new(provider)).unwrap();

        let err = weather.run("Weather in Atlantis").await.unwrap_err();
        assert_eq!(err.to_string(), "weather provider failed: city not found");
    }
}
