//! Planning stages and the order they run in

use std::collections::{HashMap, HashSet};
use std::fmt;

use thiserror::Error;

/// One step of a trip plan
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    Activities,
    Weather,
    Budget,
    Itinerary,
    Translation,
}

impl Stage {
    pub const ALL: [Stage; 5] = [
        Stage::Activities,
        Stage::Weather,
        Stage::Budget,
        Stage::Itinerary,
        Stage::Translation,
    ];

    /// Stages whose output this one consumes
    pub fn inputs(self) -> &'static [Stage] {
        match self {
            Stage::Activities | Stage::Weather | Stage::Budget => &[],
            Stage::Itinerary => &[Stage::Activities, Stage::Weather, Stage::Budget],
            Stage::Translation => &[Stage::Itinerary],
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Stage::Activities => "activities",
            Stage::Weather => "weather",
            Stage::Budget => "budget",
            Stage::Itinerary => "itinerary",
            Stage::Translation => "translation",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ScheduleError {
    #[error("stage {0} scheduled twice")]
    Duplicate(Stage),

    #[error("stage {stage} scheduled before its input {input}")]
    InputNotReady { stage: Stage, input: Stage },

    #[error("stage {0} missing from schedule")]
    Missing(Stage),
}

/// A total order of every stage in which each input runs before its consumer.
///
/// Translation stays in the order even for English requests; the planner
/// skips it at run time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Schedule {
    order: Vec<Stage>,
}

impl Schedule {
    pub fn new(order: Vec<Stage>) -> Result<Self, ScheduleError> {
        let mut done = HashSet::new();
        for &stage in &order {
            if let Some(&input) = stage.inputs().iter().find(|input| !done.contains(*input)) {
                return Err(ScheduleError::InputNotReady { stage, input });
            }
            if !done.insert(stage) {
                return Err(ScheduleError::Duplicate(stage));
            }
        }
        if let Some(&missing) = Stage::ALL.iter().find(|stage| !done.contains(*stage)) {
            return Err(ScheduleError::Missing(missing));
        }
        Ok(Self { order })
    }

    /// Search, weather, budget, itinerary, translation
    pub fn standard() -> Self {
        Self {
            order: Stage::ALL.to_vec(),
        }
    }

    pub fn stages(&self) -> &[Stage] {
        &self.order
    }
}

impl Default for Schedule {
    fn default() -> Self {
        Self::standard()
    }
}

/// Outputs of completed stages
#[derive(Debug, Default, Clone)]
pub struct StageResults {
    outputs: HashMap<Stage, String>,
    completed: Vec<Stage>,
}

impl StageResults {
    pub fn record(&mut self, stage: Stage, output: String) {
        self.completed.push(stage);
        self.outputs.insert(stage, output);
    }

    pub fn get(&self, stage: Stage) -> Option<&str> {
        self.outputs.get(&stage).map(String::as_str)
    }

    /// Stages in the order they finished
    pub fn completed(&self) -> &[Stage] {
        &self.completed
    }
}
