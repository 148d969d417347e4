//! Capability agents and the task driver they share
//!
//! Every agent publishes the same sequence for a task:
//!
//! ```text
//! task(submitted) → status(working) → artifact* → message(agent) → status(completed | failed, final)
//! ```
//!
//! [`run_task`] owns that sequence. Agents only supply the computation; any
//! error or panic it raises becomes an agent message plus a `failed` status.

use std::any::Any;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures_util::FutureExt;
use tracing::{error, info, instrument, warn};

use crate::card::AgentCard;
use crate::channel::{EventBus, EventStream};
use crate::error::CourierError;
use crate::lifecycle::ProtocolViolation;
use crate::protocol::{
    Artifact, ArtifactUpdate, ContextId, Event, Message, StatusUpdate, Task, TaskId, TaskState,
    TaskStatus,
};

/// Inbound message plus the task it continues, if any
#[derive(Debug, Clone)]
pub struct RequestContext {
    pub message: Message,
    pub task: Option<Task>,
}

impl RequestContext {
    pub fn new(message: Message) -> Self {
        Self { message, task: None }
    }

    pub fn with_task(mut self, task: Task) -> Self {
        self.task = Some(task);
        self
    }

    /// Existing task id, then the message's task id, then a fresh one
    pub fn resolve_task_id(&self) -> TaskId {
        self.task
            .as_ref()
            .map(|task| task.id.clone())
            .or_else(|| self.message.task_id.clone())
            .unwrap_or_default()
    }

    /// Message context, then the existing task's context, then a fresh one
    pub fn resolve_context_id(&self) -> ContextId {
        self.message
            .context_id
            .clone()
            .or_else(|| self.task.as_ref().map(|task| task.context_id.clone()))
            .unwrap_or_default()
    }
}

/// An agent serving one capability behind the task protocol
#[async_trait]
pub trait CapabilityAgent: Send + Sync {
    fn card(&self) -> &AgentCard;

    /// Run one task to its terminal event and finish `bus`.
    ///
    /// User-facing failures are reported on the bus; only contract breaches
    /// come back as `Err`.
    async fn execute(&self, request: RequestContext, bus: &EventBus) -> Result<(), ProtocolViolation>;

    /// Best-effort release of held external connections. Does not stop an
    /// `execute` that is already running.
    async fn cancel(&self);
}

/// Shared handle to any agent
pub type AgentHandle = Arc<dyn CapabilityAgent>;

/// Run `request` on its own tokio task with a fresh bus and return the
/// task's event stream
pub fn spawn_execute(agent: AgentHandle, request: RequestContext) -> EventStream {
    let bus = EventBus::new();
    let stream = bus.subscribe();

    tokio::spawn(async move {
        if let Err(violation) = agent.execute(request, &bus).await {
            error!(agent = %agent.card().name, error = %violation, "Agent broke the task protocol");
        }
        // consumers must not hang on a misbehaving agent
        bus.finished();
    });

    stream
}

/// What a successful computation produced
#[derive(Debug, Clone, Default)]
pub struct Outcome {
    pub artifacts: Vec<Artifact>,
    pub reply: String,
}

impl Outcome {
    pub fn reply(text: impl Into<String>) -> Self {
        Self {
            artifacts: Vec::new(),
            reply: text.into(),
        }
    }

    pub fn with_artifact(mut self, artifact: Artifact) -> Self {
        self.artifacts.push(artifact);
        self
    }
}

/// Text and correlation ids handed to a computation
#[derive(Debug, Clone)]
pub struct TaskInput {
    pub text: String,
    pub task_id: TaskId,
    pub context_id: ContextId,
}

/// Publisher for one task, keeping status timestamps monotonic
pub struct TaskRun<'a> {
    bus: &'a EventBus,
    task_id: TaskId,
    context_id: ContextId,
    last_timestamp: DateTime<Utc>,
}

impl<'a> TaskRun<'a> {
    /// Publish task-created and `working`
    pub fn start(request: &RequestContext, bus: &'a EventBus) -> Result<Self, ProtocolViolation> {
        let mut run = Self {
            bus,
            task_id: request.resolve_task_id(),
            context_id: request.resolve_context_id(),
            last_timestamp: Utc::now(),
        };

        bus.publish(Event::Task(Task {
            id: run.task_id.clone(),
            context_id: run.context_id.clone(),
            status: TaskStatus::new(TaskState::Submitted, run.last_timestamp),
        }))?;
        run.transition(TaskState::Working)?;
        Ok(run)
    }

    pub fn task_id(&self) -> &TaskId {
        &self.task_id
    }

    pub fn context_id(&self) -> &ContextId {
        &self.context_id
    }

    fn tick(&mut self) -> DateTime<Utc> {
        self.last_timestamp = Utc::now().max(self.last_timestamp);
        self.last_timestamp
    }

    pub fn transition(&mut self, state: TaskState) -> Result<(), ProtocolViolation> {
        let timestamp = self.tick();
        self.bus.publish(Event::StatusUpdate(StatusUpdate {
            task_id: self.task_id.clone(),
            context_id: self.context_id.clone(),
            status: TaskStatus::new(state, timestamp),
            is_final: state.is_terminal(),
        }))
    }

    pub fn artifact(&mut self, artifact: Artifact) -> Result<(), ProtocolViolation> {
        self.bus.publish(Event::ArtifactUpdate(ArtifactUpdate {
            task_id: self.task_id.clone(),
            context_id: self.context_id.clone(),
            artifact,
        }))
    }

    pub fn reply(&mut self, text: impl Into<String>) -> Result<(), ProtocolViolation> {
        self.bus.publish(Event::Message(
            Message::agent_text(text).for_task(self.task_id.clone(), self.context_id.clone()),
        ))
    }

    /// Publish the terminal status and finish the bus
    pub fn finish(mut self, state: TaskState) -> Result<(), ProtocolViolation> {
        self.transition(state)?;
        self.bus.finished();
        Ok(())
    }
}

fn panic_reason(payload: Box<dyn Any + Send>) -> String {
    if let Some(reason) = payload.downcast_ref::<&str>() {
        reason.to_string()
    } else if let Some(reason) = payload.downcast_ref::<String>() {
        reason.clone()
    } else {
        "computation panicked".to_string()
    }
}

/// Drive one task through the lifecycle around `work`.
///
/// `label` prefixes failure replies: `"<label> error: <reason>"`.
pub async fn run_task<F, Fut>(
    label: &str,
    request: RequestContext,
    bus: &EventBus,
    work: F,
) -> Result<(), ProtocolViolation>
where
    F: FnOnce(TaskInput) -> Fut,
    Fut: Future<Output = Result<Outcome, CourierError>>,
{
    let mut run = TaskRun::start(&request, bus)?;
    info!(capability = label, task_id = %run.task_id(), "Task started");

    let text = request
        .message
        .first_text()
        .map(str::trim)
        .filter(|text| !text.is_empty())
        .map(str::to_string);

    let result = match text {
        Some(text) => {
            let input = TaskInput {
                text,
                task_id: run.task_id().clone(),
                context_id: run.context_id().clone(),
            };
            match AssertUnwindSafe(work(input)).catch_unwind().await {
                Ok(result) => result,
                Err(payload) => Err(CourierError::provider(label, panic_reason(payload))),
            }
        }
        None => Err(CourierError::input("message has no text content")),
    };

    match result {
        Ok(outcome) => {
            for artifact in outcome.artifacts {
                run.artifact(artifact)?;
            }
            run.reply(outcome.reply)?;
            info!(capability = label, task_id = %run.task_id(), "Task completed");
            run.finish(TaskState::Completed)
        }
        Err(CourierError::Protocol(violation)) => {
            error!(capability = label, task_id = %run.task_id(), %violation, "Protocol violation during task");
            Err(violation)
        }
        Err(e) => {
            warn!(capability = label, task_id = %run.task_id(), error = %e, "Task failed");
            run.reply(format!("{label} error: {e}"))?;
            run.finish(TaskState::Failed)
        }
    }
}

/// One capability: a function of the input text
#[async_trait]
pub trait Capability: Send + Sync {
    /// Prefix for failure replies, e.g. `Weather`
    fn label(&self) -> &'static str;

    fn card(&self) -> AgentCard;

    async fn run(&self, text: &str) -> Result<Outcome, CourierError>;

    /// Drop held external sessions
    async fn release(&self) {}
}

/// A [`CapabilityAgent`] serving a single [`Capability`]
pub struct Agent<C> {
    capability: C,
    card: AgentCard,
}

impl<C: Capability> Agent<C> {
    pub fn new(capability: C) -> Self {
        let card = capability.card();
        Self { capability, card }
    }

    /// Advertise `url` instead of the capability's default address
    pub fn with_url(mut self, url: &str) -> Self {
        self.card = self.card.with_url(url);
        self
    }

    pub fn capability(&self) -> &C {
        &self.capability
    }
}

#[async_trait]
impl<C: Capability> CapabilityAgent for Agent<C> {
    fn card(&self) -> &AgentCard {
        &self.card
    }

    #[instrument(skip_all, fields(agent = %self.card.name))]
    async fn execute(&self, request: RequestContext, bus: &EventBus) -> Result<(), ProtocolViolation> {
        let capability = &self.capability;
        run_task(capability.label(), request, bus, |input| async move {
            capability.run(&input.text).await
        })
        .await
    }

    async fn cancel(&self) {
        info!(agent = %self.card.name, "Cancel requested");
        self.capability.release().await;
    }
}
