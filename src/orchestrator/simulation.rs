//! Offline planning: synthetic results, no network

use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use tracing::debug;

use super::request::{ItineraryBrief, TripRequest};
use super::services::TripServices;
use crate::capabilities::{synthetic_results, synthetic_translation, MathTool};
use crate::error::CourierError;
use crate::provider::{Provider, ProviderReply};

/// Upper bound on the artificial delay of one simulated step
pub const MAX_STEP_DELAY: Duration = Duration::from_secs(10);

/// One-day itinerary skeleton between two cities
pub fn itinerary_template(departure: &str, destination: &str) -> String {
    format!(
        "## {departure} to {destination}: 1-Day Itinerary\n\n\
         Morning (9:00 - 12:00)\n\
         - Visit the historic old town\n\
         - Explore local markets\n\
         - Try traditional breakfast\n\n\
         Afternoon (12:00 - 18:00)\n\
         - Lunch at popular restaurant\n\
         - Visit main attractions and museums\n\
         - Walk through city parks\n\n\
         Evening (18:00 - 22:00)\n\
         - Dinner at waterfront restaurant\n\
         - Sunset viewing point\n\
         - Experience local nightlife\n\n\
         Budget: $1225 for 7 nights\n\
         Weather: Expect pleasant 22°C with clear skies"
    )
}

/// Deterministic stand-ins for every planning step
#[derive(Debug, Clone)]
pub struct SimulatedServices {
    delay: Duration,
}

impl SimulatedServices {
    /// `delay` is applied to every step and capped at [`MAX_STEP_DELAY`]
    pub fn new(delay: Duration) -> Self {
        Self {
            delay: delay.min(MAX_STEP_DELAY),
        }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    async fn step(&self, stage: &str) {
        debug!(stage, delay_ms = self.delay.as_millis() as u64, "Simulating step");
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
    }
}

impl Default for SimulatedServices {
    fn default() -> Self {
        Self::new(Duration::ZERO)
    }
}

#[async_trait]
impl TripServices for SimulatedServices {
    async fn activities(&self, trip: &TripRequest) -> Result<String, CourierError> {
        self.step("activities").await;
        Ok(synthetic_results(&trip.destination))
    }

    async fn weather(&self, trip: &TripRequest) -> Result<String, CourierError> {
        self.step("weather").await;
        Ok(format!(
            "Weather data retrieved for {}. It's currently 22°C with clear sky.",
            trip.destination
        ))
    }

    async fn budget(&self, _trip: &TripRequest) -> Result<String, CourierError> {
        self.step("budget").await;
        Ok(MathTool::CalculateTripBudget {
            hotel_per_night: 150.0,
            nights: 7.0,
            meals_per_day: 25.0,
        }
        .evaluate())
    }

    async fn itinerary(&self, brief: &ItineraryBrief<'_>) -> Result<String, CourierError> {
        self.step("itinerary").await;
        Ok(itinerary_template(brief.departure, brief.destination))
    }

    async fn translate(&self, trip: &TripRequest, text: &str) -> Result<String, CourierError> {
        self.step("translation").await;
        Ok(synthetic_translation(&trip.language, text))
    }
}

/// Itinerary composer that fills [`itinerary_template`] from the call context
#[derive(Debug, Default, Clone, Copy)]
pub struct SyntheticComposer;

#[async_trait]
impl Provider for SyntheticComposer {
    fn name(&self) -> &str {
        "synthetic-composer"
    }

    async fn provide(&self, _query: &str, context: Option<&Value>) -> ProviderReply {
        let field = |name: &str| context.and_then(|c| c.get(name)).and_then(Value::as_str);
        match (field("departure"), field("destination")) {
            (Some(departure), Some(destination)) => ProviderReply::Text(itinerary_template(departure, destination)),
            _ => ProviderReply::Error("departure and destination are required".to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_delay_is_bounded() {
        assert_eq!(SimulatedServices::new(Duration::from_secs(60)).delay(), MAX_STEP_DELAY);
        assert_eq!(SimulatedServices::new(Duration::from_millis(5)).delay(), Duration::from_millis(5));
    }

    #[tokio::test]
    async fn test_templates_follow_request() {
        let services = SimulatedServices::default();
        let trip = TripRequest::parse("Lisbon, Madrid, German");

        assert!(services.activities(&trip).await.unwrap().contains("Top attractions in Lisbon:"));
        assert!(services.weather(&trip).await.unwrap().starts_with("Weather data retrieved for Lisbon."));
        assert!(services.budget(&trip).await.unwrap().ends_with("Total Budget: $1225"));
        assert_eq!(
            services.translate(&trip, "hello").await.unwrap(),
            "[MOCK TRANSLATION TO GERMAN]\n\nhello"
        );
    }

    #[tokio::test]
    async fn test_step_waits_for_delay() {
        let services = SimulatedServices::new(Duration::from_millis(30));
        let started = tokio::time::Instant::now();
        services.weather(&TripRequest::default()).await.unwrap();
        assert!(started.elapsed() >= Duration::from_millis(30));
    }

    #[tokio::test]
    async fn test_composer_requires_cities() {
        let reply = SyntheticComposer
            .provide("", Some(&json!({"departure": "Rome", "destination": "Cairo"})))
            .await;
        assert!(matches!(reply, ProviderReply::Text(ref t) if t.starts_with("## Rome to Cairo")));
        assert!(matches!(SyntheticComposer.provide("", None).await, ProviderReply::Error(_)));
    }
}
