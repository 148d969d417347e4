//! What the planner calls out to

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use futures_util::future::try_join_all;
use serde_json::json;
use tracing::{info, warn};

use super::request::{ItineraryBrief, TripRequest, BUDGET_QUERY};
use crate::client::RemoteClient;
use crate::error::CourierError;
use crate::provider::Provider;
use crate::transport::Transport;

/// The capabilities a trip plan is assembled from
#[async_trait]
pub trait TripServices: Send + Sync {
    /// Make sure every dependency is reachable before the first stage runs
    async fn prepare(&self) -> Result<(), CourierError> {
        Ok(())
    }

    async fn activities(&self, trip: &TripRequest) -> Result<String, CourierError>;

    async fn weather(&self, trip: &TripRequest) -> Result<String, CourierError>;

    async fn budget(&self, trip: &TripRequest) -> Result<String, CourierError>;

    async fn itinerary(&self, brief: &ItineraryBrief<'_>) -> Result<String, CourierError>;

    async fn translate(&self, trip: &TripRequest, text: &str) -> Result<String, CourierError>;

    /// Drop any held connections
    async fn release(&self) {}
}

/// Where the four capability agents live
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CapabilityEndpoints {
    pub search: String,
    pub weather: String,
    pub calculator: String,
    pub translator: String,
}

/// Remote capability agents plus a generative composer for the itinerary
pub struct LiveServices {
    search: RemoteClient,
    weather: RemoteClient,
    calculator: RemoteClient,
    translator: RemoteClient,
    composer: Arc<dyn Provider>,
}

impl LiveServices {
    pub fn new(
        transport: Arc<dyn Transport>,
        endpoints: &CapabilityEndpoints,
        composer: Arc<dyn Provider>,
        deadline: Option<Duration>,
    ) -> Self {
        let client = |capability: &str, address: &str| {
            RemoteClient::new(capability, address, Arc::clone(&transport)).with_deadline(deadline)
        };
        Self {
            search: client("search", &endpoints.search),
            weather: client("weather", &endpoints.weather),
            calculator: client("calculator", &endpoints.calculator),
            translator: client("translator", &endpoints.translator),
            composer,
        }
    }

    fn clients(&self) -> [&RemoteClient; 4] {
        [&self.search, &self.weather, &self.calculator, &self.translator]
    }
}

#[async_trait]
impl TripServices for LiveServices {
    async fn prepare(&self) -> Result<(), CourierError> {
        let resolutions = self.clients().map(|client| async move {
            client.resolve().await.map_err(|e| {
                warn!(capability = client.capability(), address = client.address(), error = %e, "Capability agent unreachable");
                CourierError::DependencyUnavailable(format!("{} agent at {}: {e}", client.capability(), client.address()))
            })
        });
        try_join_all(resolutions).await?;
        info!("All capability agents resolved");
        Ok(())
    }

    async fn activities(&self, trip: &TripRequest) -> Result<String, CourierError> {
        self.search.call(&trip.activities_query()).await
    }

    async fn weather(&self, trip: &TripRequest) -> Result<String, CourierError> {
        self.weather.call(&trip.weather_query()).await
    }

    async fn budget(&self, _trip: &TripRequest) -> Result<String, CourierError> {
        self.calculator.call(BUDGET_QUERY).await
    }

    async fn itinerary(&self, brief: &ItineraryBrief<'_>) -> Result<String, CourierError> {
        let context = json!({
            "departure": brief.departure,
            "destination": brief.destination,
        });
        self.composer
            .provide(&brief.prompt(), Some(&context))
            .await
            .into_text(self.composer.name())
    }

    async fn translate(&self, trip: &TripRequest, text: &str) -> Result<String, CourierError> {
        self.translator.call(&trip.translation_query(text)).await
    }

    async fn release(&self) {
        self.composer.close().await;
    }
}
