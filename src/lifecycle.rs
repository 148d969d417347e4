//! Task lifecycle state machine
//!
//! ```text
//! submitted ──▶ working ──┬──▶ completed
//!                         └──▶ failed
//! ```
//!
//! [`TaskLifecycle`] validates a task's event sequence as it is published.
//! Anything it rejects is a [`ProtocolViolation`]: a bug in the publishing
//! agent, never a user-facing runtime condition.

use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::protocol::{ContextId, Event, TaskId, TaskState};

impl TaskState {
    /// `completed` and `failed` end a task
    pub fn is_terminal(self) -> bool {
        matches!(self, TaskState::Completed | TaskState::Failed)
    }

    /// Legal single-step transitions; nothing skips `working`
    pub fn can_transition_to(self, next: TaskState) -> bool {
        matches!(
            (self, next),
            (TaskState::Submitted, TaskState::Working)
                | (TaskState::Working, TaskState::Completed)
                | (TaskState::Working, TaskState::Failed)
        )
    }
}

/// Contract breaches detected while publishing task events
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProtocolViolation {
    #[error("{kind} event published before the task was created")]
    NotCreated { kind: &'static str },

    #[error("task {0} created twice")]
    DuplicateCreate(TaskId),

    #[error("task must be created in submitted, got {0}")]
    InitialState(TaskState),

    #[error("{kind} event does not belong to task {expected}")]
    ForeignEvent { kind: &'static str, expected: TaskId },

    #[error("illegal transition {from} -> {to}")]
    IllegalTransition { from: TaskState, to: TaskState },

    #[error("final flag {is_final} does not match state {state}")]
    FinalFlagMismatch { state: TaskState, is_final: bool },

    #[error("task completed without an agent message")]
    CompletedWithoutReply,

    #[error("artifact published while task is {0}")]
    ArtifactOutsideWorking(TaskState),

    #[error("status timestamp went backwards")]
    TimestampRegressed,

    #[error("{kind} event published after the final status update")]
    AfterFinal { kind: &'static str },

    #[error("{kind} event published on a finished bus")]
    BusFinished { kind: &'static str },
}

/// Tracks one task's position in the state machine
#[derive(Debug, Default)]
pub struct TaskLifecycle {
    ids: Option<(TaskId, ContextId)>,
    state: Option<TaskState>,
    last_timestamp: Option<DateTime<Utc>>,
    replied: bool,
}

impl TaskLifecycle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current state, `None` before the task-created event
    pub fn state(&self) -> Option<TaskState> {
        self.state
    }

    /// Whether the final status update has been observed
    pub fn is_terminated(&self) -> bool {
        self.state.map(TaskState::is_terminal).unwrap_or(false)
    }

    /// Check `event` against the machine and advance on success.
    ///
    /// A rejected event leaves the tracker untouched.
    pub fn observe(&mut self, event: &Event) -> Result<(), ProtocolViolation> {
        let kind = event.kind();

        if self.is_terminated() {
            return Err(ProtocolViolation::AfterFinal { kind });
        }

        let Some((task_id, context_id)) = self.ids.clone() else {
            return match event {
                Event::Task(task) => {
                    if task.status.state != TaskState::Submitted {
                        return Err(ProtocolViolation::InitialState(task.status.state));
                    }
                    self.ids = Some((task.id.clone(), task.context_id.clone()));
                    self.state = Some(TaskState::Submitted);
                    self.last_timestamp = Some(task.status.timestamp);
                    Ok(())
                }
                _ => Err(ProtocolViolation::NotCreated { kind }),
            };
        };

        if event.task_id() != Some(&task_id) || event.context_id() != Some(&context_id) {
            return Err(ProtocolViolation::ForeignEvent {
                kind,
                expected: task_id,
            });
        }

        let current = self.state.unwrap_or(TaskState::Submitted);
        match event {
            Event::Task(task) => Err(ProtocolViolation::DuplicateCreate(task.id.clone())),
            Event::StatusUpdate(update) => {
                let next = update.status.state;
                if !current.can_transition_to(next) {
                    return Err(ProtocolViolation::IllegalTransition {
                        from: current,
                        to: next,
                    });
                }
                if update.is_final != next.is_terminal() {
                    return Err(ProtocolViolation::FinalFlagMismatch {
                        state: next,
                        is_final: update.is_final,
                    });
                }
                if next == TaskState::Completed && !self.replied {
                    return Err(ProtocolViolation::CompletedWithoutReply);
                }
                if matches!(self.last_timestamp, Some(last) if update.status.timestamp < last) {
                    return Err(ProtocolViolation::TimestampRegressed);
                }
                self.state = Some(next);
                self.last_timestamp = Some(update.status.timestamp);
                Ok(())
            }
            Event::ArtifactUpdate(_) => {
                if current != TaskState::Working {
                    return Err(ProtocolViolation::ArtifactOutsideWorking(current));
                }
                Ok(())
            }
            Event::Message(message) => {
                if message.is_agent() {
                    self.replied = true;
                }
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::{Artifact, ArtifactUpdate, Message, StatusUpdate, Task, TaskStatus};
    use chrono::Duration;

    struct Fixture {
        task_id: TaskId,
        context_id: ContextId,
        start: DateTime<Utc>,
    }

    impl Fixture {
        fn new() -> Self {
            Self {
                task_id: TaskId::new(),
                context_id: ContextId::new(),
                start: Utc::now(),
            }
        }

        fn created(&self) -> Event {
            Event::Task(Task {
                id: self.task_id.clone(),
                context_id: self.context_id.clone(),
                status: TaskStatus::new(TaskState::Submitted, self.start),
            })
        }

        fn status(&self, state: TaskState, offset_ms: i64) -> Event {
            Event::StatusUpdate(StatusUpdate {
                task_id: self.task_id.clone(),
                context_id: self.context_id.clone(),
                status: TaskStatus::new(state, self.start + Duration::milliseconds(offset_ms)),
                is_final: state.is_terminal(),
            })
        }

        fn reply(&self) -> Event {
            Event::Message(
                Message::agent_text("done").for_task(self.task_id.clone(), self.context_id.clone()),
            )
        }

        fn artifact(&self) -> Event {
            Event::ArtifactUpdate(ArtifactUpdate {
                task_id: self.task_id.clone(),
                context_id: self.context_id.clone(),
                artifact: Artifact::text("a.json", "an artifact", "payload"),
            })
        }
    }

    #[test]
    fn test_transition_table() {
        use TaskState::*;
        assert!(Submitted.can_transition_to(Working));
        assert!(Working.can_transition_to(Completed));
        assert!(Working.can_transition_to(Failed));
        assert!(!Submitted.can_transition_to(Completed));
        assert!(!Submitted.can_transition_to(Failed));
        assert!(!Completed.can_transition_to(Working));
        assert!(!Failed.can_transition_to(Failed));
        assert!(Completed.is_terminal() && Failed.is_terminal());
        assert!(!Working.is_terminal());
    }

    #[test]
    fn test_happy_path() {
        let f = Fixture::new();
        let mut lifecycle = TaskLifecycle::new();

        for event in [
            f.created(),
            f.status(TaskState::Working, 1),
            f.artifact(),
            f.reply(),
            f.status(TaskState::Completed, 2),
        ] {
            lifecycle.observe(&event).unwrap();
        }

        assert_eq!(lifecycle.state(), Some(TaskState::Completed));
        assert!(lifecycle.is_terminated());
    }

    #[test]
    fn test_event_before_creation_is_rejected() {
        let f = Fixture::new();
        let mut lifecycle = TaskLifecycle::new();
        assert_eq!(
            lifecycle.observe(&f.status(TaskState::Working, 0)),
            Err(ProtocolViolation::NotCreated { kind: "status-update" })
        );
    }

    #[test]
    fn test_skipping_working_is_rejected() {
        let f = Fixture::new();
        let mut lifecycle = TaskLifecycle::new();
        lifecycle.observe(&f.created()).unwrap();
        lifecycle.observe(&f.reply()).unwrap();

        let err = lifecycle.observe(&f.status(TaskState::Completed, 1)).unwrap_err();
        assert!(matches!(err, ProtocolViolation::IllegalTransition { .. }));
        assert_eq!(lifecycle.state(), Some(TaskState::Submitted));
    }

    #[test]
    fn test_completed_requires_reply() {
        let f = Fixture::new();
        let mut lifecycle = TaskLifecycle::new();
        lifecycle.observe(&f.created()).unwrap();
        lifecycle.observe(&f.status(TaskState::Working, 1)).unwrap();

        assert_eq!(
            lifecycle.observe(&f.status(TaskState::Completed, 2)),
            Err(ProtocolViolation::CompletedWithoutReply)
        );
        // failing without a reply is a publisher choice the machine allows
        lifecycle.observe(&f.status(TaskState::Failed, 2)).unwrap();
    }

    #[test]
    fn test_nothing_after_final() {
        let f = Fixture::new();
        let mut lifecycle = TaskLifecycle::new();
        lifecycle.observe(&f.created()).unwrap();
        lifecycle.observe(&f.status(TaskState::Working, 1)).unwrap();
        lifecycle.observe(&f.reply()).unwrap();
        lifecycle.observe(&f.status(TaskState::Failed, 2)).unwrap();

        assert_eq!(
            lifecycle.observe(&f.status(TaskState::Failed, 3)),
            Err(ProtocolViolation::AfterFinal { kind: "status-update" })
        );
        assert_eq!(
            lifecycle.observe(&f.reply()),
            Err(ProtocolViolation::AfterFinal { kind: "message" })
        );
    }

    #[test]
    fn test_final_flag_must_match_state() {
        let f = Fixture::new();
        let mut lifecycle = TaskLifecycle::new();
        lifecycle.observe(&f.created()).unwrap();

        let mut working = f.status(TaskState::Working, 1);
        if let Event::StatusUpdate(update) = &mut working {
            update.is_final = true;
        }
        assert!(matches!(
            lifecycle.observe(&working),
            Err(ProtocolViolation::FinalFlagMismatch { .. })
        ));
    }

    #[test]
    fn test_timestamp_regression_is_rejected() {
        let f = Fixture::new();
        let mut lifecycle = TaskLifecycle::new();
        lifecycle.observe(&f.created()).unwrap();
        assert_eq!(
            lifecycle.observe(&f.status(TaskState::Working, -5)),
            Err(ProtocolViolation::TimestampRegressed)
        );
    }

    #[test]
    fn test_foreign_and_duplicate_events() {
        let f = Fixture::new();
        let other = Fixture::new();
        let mut lifecycle = TaskLifecycle::new();
        lifecycle.observe(&f.created()).unwrap();

        assert!(matches!(
            lifecycle.observe(&other.status(TaskState::Working, 1)),
            Err(ProtocolViolation::ForeignEvent { .. })
        ));
        assert!(matches!(
            lifecycle.observe(&f.created()),
            Err(ProtocolViolation::DuplicateCreate(_))
        ));
    }

    #[test]
    fn test_artifact_only_while_working() {
        let f = Fixture::new();
        let mut lifecycle = TaskLifecycle::new();
        lifecycle.observe(&f.created()).unwrap();
        assert_eq!(
            lifecycle.observe(&f.artifact()),
            Err(ProtocolViolation::ArtifactOutsideWorking(TaskState::Submitted))
        );
    }
}
