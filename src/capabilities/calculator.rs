//! Arithmetic and trip budgets
//!
//! The calculator agent forwards its input to a tool provider. [`BudgetTool`]
//! is the built-in one: three math tools plus a small interpreter that maps
//! phrases like `Calculate trip budget for 7 nights at $150 per night` onto
//! them.

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

use super::rules::RuleTable;
use crate::card::{AgentCard, AgentSkill};
use crate::error::CourierError;
use crate::provider::{Provider, ProviderReply};

const DEFAULT_MEALS_PER_DAY: f64 = 25.0;

pub fn calculator_card() -> AgentCard {
    AgentCard::new("Calculator Agent", "http://localhost:4004/")
        .with_description("Performs mathematical calculations through a math tool provider")
        .with_provider("Courier", "https://a2a-protocol.org")
        .add_skill(
            AgentSkill::new(
                "calculate",
                "Calculate",
                "Perform math operations and budget calculations for travel planning",
            )
            .with_tags(&["math", "calculator", "budget"])
            .with_examples(&[
                "Calculate 150 times 7",
                "What is 50 + 75?",
                "Calculate trip budget for 7 nights at $150/night",
            ]),
        )
}

fn default_meals() -> f64 {
    DEFAULT_MEALS_PER_DAY
}

/// One math tool invocation, `{"tool": .., "arguments": {..}}` on the wire
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "tool", content = "arguments", rename_all = "snake_case")]
pub enum MathTool {
    Add {
        a: f64,
        b: f64,
    },
    Multiply {
        a: f64,
        b: f64,
    },
    CalculateTripBudget {
        hotel_per_night: f64,
        nights: f64,
        #[serde(default = "default_meals")]
        meals_per_day: f64,
    },
}

impl MathTool {
    pub fn evaluate(&self) -> String {
        match *self {
            MathTool::Add { a, b } => format!("{}", a + b),
            MathTool::Multiply { a, b } => format!("{}", a * b),
            MathTool::CalculateTripBudget {
                hotel_per_night,
                nights,
                meals_per_day,
            } => {
                let hotel_total = hotel_per_night * nights;
                let meals_total = meals_per_day * nights;
                debug!(hotel_total, meals_total, "Trip budget calculated");
                [
                    format!("Hotel: ${hotel_per_night}/night × {nights} nights = ${hotel_total}"),
                    format!("Meals: ${meals_per_day}/day × {nights} days = ${meals_total}"),
                    format!("Total Budget: ${}", hotel_total + meals_total),
                ]
                .join("\n")
            }
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum Phrase {
    TripBudget,
    Add,
    Multiply,
}

const NUMBER: &str = r"\$?(\d+(?:\.\d+)?)";

/// Built-in math tool provider
pub struct BudgetTool {
    phrases: RuleTable<Phrase>,
}

impl BudgetTool {
    pub fn new() -> Result<Self, CourierError> {
        let trip = format!(
            r"(\d+)\s+nights?\s+at\s+{NUMBER}\s*(?:per night|/night|a night)(?:.*?{NUMBER}\s*(?:meals per day|per day|/day))?"
        );
        let add = format!(r"{NUMBER}\s*(?:\+|plus)\s*{NUMBER}");
        let multiply = format!(r"{NUMBER}\s*(?:\*|×|x|times)\s*{NUMBER}");

        Ok(Self {
            phrases: RuleTable::compile(&[
                (trip.as_str(), Phrase::TripBudget),
                (add.as_str(), Phrase::Add),
                (multiply.as_str(), Phrase::Multiply),
            ])?,
        })
    }

    /// Map a free-text request onto a tool call
    pub fn interpret(&self, query: &str) -> Option<MathTool> {
        let (phrase, caps) = self.phrases.first_match(query)?;
        let number = |index: usize| caps.get(index).and_then(|m| m.as_str().parse::<f64>().ok());

        Some(match phrase {
            Phrase::TripBudget => MathTool::CalculateTripBudget {
                nights: number(1)?,
                hotel_per_night: number(2)?,
                meals_per_day: number(3).unwrap_or(DEFAULT_MEALS_PER_DAY),
            },
            Phrase::Add => MathTool::Add {
                a: number(1)?,
                b: number(2)?,
            },
            Phrase::Multiply => MathTool::Multiply {
                a: number(1)?,
                b: number(2)?,
            },
        })
    }
}

#[async_trait]
impl Provider for BudgetTool {
    fn name(&self) -> &str {
        "math-tools"
    }

    async fn provide(&self, query: &str, context: Option<&Value>) -> ProviderReply {
        let tool = match context {
            Some(call) => match MathTool::deserialize(call) {
                Ok(tool) => Some(tool),
                Err(e) => return ProviderReply::Error(format!("invalid tool call: {e}")),
            },
            None => self.interpret(query),
        };

        match tool {
            Some(tool) => ProviderReply::Text(tool.evaluate()),
            None => ProviderReply::Error(format!("no math tool matches \"{}\"", query.trim())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_trip_budget_breakdown() {
        let tool = MathTool::CalculateTripBudget {
            hotel_per_night: 150.0,
            nights: 7.0,
            meals_per_day: 25.0,
        };
        assert_eq!(
            tool.evaluate(),
            "Hotel: $150/night × 7 nights = $1050\nMeals: $25/day × 7 days = $175\nTotal Budget: $1225"
        );
    }

    #[test]
    fn test_rule_trip_budget() {
        let tools = BudgetTool::new().unwrap();
        assert_eq!(
            tools.interpret("Calculate trip budget for 7 nights at $150 per night with $25 meals per day"),
            Some(MathTool::CalculateTripBudget {
                hotel_per_night: 150.0,
                nights: 7.0,
                meals_per_day: 25.0
            })
        );
        assert_eq!(
            tools.interpret("Calculate trip budget for 3 nights at $99.5/night"),
            Some(MathTool::CalculateTripBudget {
                hotel_per_night: 99.5,
                nights: 3.0,
                meals_per_day: 25.0
            })
        );
    }

    #[test]
    fn test_rule_add() {
        let tools = BudgetTool::new().unwrap();
        assert_eq!(tools.interpret("What is 50 + 75?"), Some(MathTool::Add { a: 50.0, b: 75.0 }));
        assert_eq!(tools.interpret("2 plus 2.5"), Some(MathTool::Add { a: 2.0, b: 2.5 }));
    }

    #[test]
    fn test_rule_multiply() {
        let tools = BudgetTool::new().unwrap();
        assert_eq!(
            tools.interpret("Calculate 150 times 7"),
            Some(MathTool::Multiply { a: 150.0, b: 7.0 })
        );
        assert_eq!(tools.interpret("6 x 7"), Some(MathTool::Multiply { a: 6.0, b: 7.0 }));
        assert!(tools.interpret("how much is a coffee").is_none());
    }

    #[tokio::test]
    async fn test_explicit_tool_call_context() {
        let tools = BudgetTool::new().unwrap();
        let call = json!({"tool": "calculate_trip_budget", "arguments": {"hotel_per_night": 100, "nights": 2}});

        let reply = tools.provide("ignored", Some(&call)).await;
        assert_eq!(
            reply,
            ProviderReply::Text(
                "Hotel: $100/night × 2 nights = $200\nMeals: $25/day × 2 days = $50\nTotal Budget: $250".into()
            )
        );

        let bad = json!({"tool": "divide", "arguments": {"a": 1, "b": 0}});
        assert!(matches!(tools.provide("", Some(&bad)).await, ProviderReply::Error(_)));
    }

    #[tokio::test]
    async fn test_unmatched_query_is_error() {
        let tools = BudgetTool::new().unwrap();
        assert_eq!(
            tools.provide("  tell me a joke ", None).await,
            ProviderReply::Error("no math tool matches \"tell me a joke\"".into())
        );
    }
}
