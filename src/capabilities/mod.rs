//! The four capability agents

pub mod calculator;
pub mod rules;
pub mod search;
pub mod translator;
pub mod weather;

use async_trait::async_trait;
use tracing::info;

use crate::agent::{Capability, Outcome};
use crate::card::AgentCard;
use crate::error::CourierError;
use crate::session::SharedSession;

pub use calculator::{calculator_card, BudgetTool, MathTool};
pub use rules::RuleTable;
pub use search::{search_card, synthetic_results, SyntheticSearch};
pub use translator::{synthetic_translation, translator_card, Language, SyntheticTranslator, TranslatorCapability};
pub use weather::{weather_card, SyntheticWeather, WeatherCapability, WeatherReport};

/// A capability answered by one call to a tool provider held in a shared
/// session (calculation, search)
pub struct ToolCapability {
    label: &'static str,
    card: AgentCard,
    session: SharedSession,
}

impl ToolCapability {
    pub fn new(label: &'static str, card: AgentCard, session: SharedSession) -> Self {
        Self { label, card, session }
    }

    pub fn calculator(session: SharedSession) -> Self {
        Self::new("Calculation", calculator_card(), session)
    }

    pub fn search(session: SharedSession) -> Self {
        Self::new("Search", search_card(), session)
    }

    pub fn session(&self) -> &SharedSession {
        &self.session
    }
}

#[async_trait]
impl Capability for ToolCapability {
    fn label(&self) -> &'static str {
        self.label
    }

    fn card(&self) -> AgentCard {
        self.card.clone()
    }

    async fn run(&self, text: &str) -> Result<Outcome, CourierError> {
        let provider = self.session.get().await?;
        info!(capability = self.label, provider = provider.name(), "Invoking tool provider");
        let answer = provider.provide(text, None).await.into_text(provider.name())?;
        Ok(Outcome::reply(answer))
    }

    async fn release(&self) {
        self.session.release().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::{Agent, CapabilityAgent, RequestContext};
    use crate::channel::EventBus;
    use crate::protocol::{Message, TaskState};
    use futures_util::StreamExt;
    use std::sync::Arc;

    #[tokio::test]
    async fn test_calculator_agent_end_to_end() {
        let tools = BudgetTool::new().unwrap();
        let agent = Agent::new(ToolCapability::calculator(SharedSession::ready(
            "math",
            Arc::new(tools),
        )));

        let bus = EventBus::new();
        let stream = bus.subscribe();
        let request = RequestContext::new(Message::user_text(
            "Calculate trip budget for 7 nights at $150 per night with $25 meals per day",
        ));
        agent.execute(request, &bus).await.unwrap();

        let events: Vec<_> = stream.collect().await;
        let reply = events.iter().rev().find_map(|e| e.as_agent_message()).unwrap();
        assert!(reply.joined_text().ends_with("Total Budget: $1225"));
        assert_eq!(bus.task_state(), Some(TaskState::Completed));
    }

    #[tokio::test]
    async fn test_tool_failure_uses_label() {
        let tools = BudgetTool::new().unwrap();
        let agent = Agent::new(ToolCapability::calculator(SharedSession::ready(
            "math",
            Arc::new(tools),
        )));

        let bus = EventBus::new();
        let stream = bus.subscribe();
        agent
            .execute(RequestContext::new(Message::user_text("sing a song")), &bus)
            .await
            .unwrap();

        let events: Vec<_> = stream.collect().await;
        let reply = events.iter().find_map(|e| e.as_agent_message()).unwrap();
        assert!(reply.joined_text().starts_with("Calculation error: math-tools provider failed"));
        assert_eq!(bus.task_state(), Some(TaskState::Failed));
    }

    #[tokio::test]
    async fn test_cancel_releases_session_and_next_task_reconnects() {
        let agent = Agent::new(ToolCapability::search(SharedSession::ready(
            "search",
            Arc::new(SyntheticSearch),
        )));

        for _ in 0..2 {
            let bus = EventBus::new();
            agent
                .execute(RequestContext::new(Message::user_text("attractions in Oslo")), &bus)
                .await
                .unwrap();
        }
        assert_eq!(agent.capability().session().connect_count(), 1);

        agent.cancel().await;
        assert!(!agent.capability().session().is_connected().await);

        let bus = EventBus::new();
        agent
            .execute(RequestContext::new(Message::user_text("attractions in Oslo")), &bus)
            .await
            .unwrap();
        assert_eq!(agent.capability().session().connect_count(), 2);
    }
}
