//! Trip planner - sequences the capability agents into one report
//!
//! ```text
//!   "Rome, Berlin, French"
//!          │ parse + defaults
//!          ▼
//!   activities ─► weather ─► budget ─► itinerary ─► translation?
//!          │                                            │
//!          └──────────── one stage at a time ───────────┘
//!                               ▼
//!            "Travel Plan: Berlin to Rome\n\n<report>"
//! ```
//!
//! Any stage failure aborts the plan; the task ends `failed` with a
//! `Planner error:` reply.

pub mod pipeline;
pub mod request;
pub mod services;
pub mod simulation;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tracing::{info, instrument};

use crate::agent::{run_task, CapabilityAgent, Outcome, RequestContext};
use crate::card::{AgentCard, AgentSkill};
use crate::channel::EventBus;
use crate::error::CourierError;
use crate::lifecycle::ProtocolViolation;
use crate::protocol::Artifact;

pub use pipeline::{Schedule, ScheduleError, Stage, StageResults};
pub use request::{ItineraryBrief, TripRequest};
pub use services::{CapabilityEndpoints, LiveServices, TripServices};
pub use simulation::{SimulatedServices, SyntheticComposer};

pub fn planner_card() -> AgentCard {
    AgentCard::new("Travel Planner Agent", "http://localhost:4002/")
        .with_description("Plans complete trips by coordinating the weather, search, calculator and translator agents")
        .with_push_notifications()
        .with_provider("Courier", "https://a2a-protocol.org")
        .add_skill(
            AgentSkill::new(
                "plan_trip",
                "Plan Complete Trip",
                "Plan a trip including activities, weather, budget and translation",
            )
            .with_tags(&["travel", "planning", "orchestration"])
            .with_examples(&["Tokyo, Paris, French", "New York, London, English", "Barcelona, Berlin, Spanish"]),
        )
}

/// A finished plan and the stage outputs it was built from
#[derive(Debug, Clone)]
pub struct TripPlan {
    pub report: String,
    pub stages: StageResults,
}

/// The orchestrating agent
pub struct Planner {
    card: AgentCard,
    services: Arc<dyn TripServices>,
    schedule: Schedule,
}

impl Planner {
    pub fn new(services: Arc<dyn TripServices>) -> Self {
        Self {
            card: planner_card(),
            services,
            schedule: Schedule::standard(),
        }
    }

    /// Planner backed entirely by synthetic results
    pub fn simulated(delay: Duration) -> Self {
        Self::new(Arc::new(SimulatedServices::new(delay)))
    }

    pub fn with_url(mut self, url: &str) -> Self {
        self.card = self.card.with_url(url);
        self
    }

    /// Run stages in a different (validated) order
    pub fn with_schedule(mut self, schedule: Schedule) -> Self {
        self.schedule = schedule;
        self
    }

    async fn run_stage(&self, stage: Stage, trip: &TripRequest, done: &StageResults) -> Result<String, CourierError> {
        let output_of = |input: Stage| {
            done.get(input)
                .ok_or_else(|| CourierError::Config(format!("stage {stage} ran before its input {input}")))
        };

        match stage {
            Stage::Activities => self.services.activities(trip).await,
            Stage::Weather => self.services.weather(trip).await,
            Stage::Budget => self.services.budget(trip).await,
            Stage::Itinerary => {
                let brief = ItineraryBrief {
                    departure: &trip.departure,
                    destination: &trip.destination,
                    activities: output_of(Stage::Activities)?,
                    weather: output_of(Stage::Weather)?,
                    budget: output_of(Stage::Budget)?,
                };
                self.services.itinerary(&brief).await
            }
            Stage::Translation => self.services.translate(trip, output_of(Stage::Itinerary)?).await,
        }
    }

    /// Build the report for `trip`, one stage after another
    #[instrument(skip(self), fields(destination = %trip.destination, language = %trip.language))]
    pub async fn plan(&self, trip: &TripRequest) -> Result<TripPlan, CourierError> {
        self.services.prepare().await?;

        let mut done = StageResults::default();
        for &stage in self.schedule.stages() {
            if stage == Stage::Translation && !trip.needs_translation() {
                info!(language = %trip.language, "Report already in requested language, skipping translation");
                continue;
            }
            info!(%stage, "Running stage");
            let output = self.run_stage(stage, trip, &done).await?;
            done.record(stage, output);
        }

        let body = done
            .get(Stage::Translation)
            .or_else(|| done.get(Stage::Itinerary))
            .ok_or_else(|| CourierError::Config("schedule produced no itinerary".to_string()))?;
        Ok(TripPlan {
            report: format!("{}\n\n{}", trip.title(), body),
            stages: done,
        })
    }
}

#[async_trait]
impl CapabilityAgent for Planner {
    fn card(&self) -> &AgentCard {
        &self.card
    }

    #[instrument(skip_all, fields(agent = %self.card.name))]
    async fn execute(&self, request: RequestContext, bus: &EventBus) -> Result<(), ProtocolViolation> {
        run_task("Planner", request, bus, |input| async move {
            let trip = TripRequest::parse(&input.text);
            let plan = self.plan(&trip).await?;

            let mut outcome = Outcome::reply(plan.report.clone());
            for &stage in plan.stages.completed() {
                let output = plan.stages.get(stage).unwrap_or_default();
                outcome = outcome.with_artifact(Artifact::text(
                    format!("{stage}.txt"),
                    format!("Output of the {stage} stage"),
                    output,
                ));
            }
            Ok(outcome)
        })
        .await
    }

    async fn cancel(&self) {
        info!(agent = %self.card.name, "Cancel requested");
        self.services.release().await;
    }
}
