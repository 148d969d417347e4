//! Task protocol types shared by agents, transports and clients
//!
//! Everything here serializes to the A2A 0.3.0 JSON shapes: camelCase
//! fields and a `kind` discriminator on events and parts.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Generate a fresh random identifier
            pub fn new() -> Self {
                Self(Uuid::new_v4().to_string())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<String> for $name {
            fn from(value: String) -> Self {
                Self(value)
            }
        }

        impl From<&str> for $name {
            fn from(value: &str) -> Self {
                Self(value.to_string())
            }
        }
    };
}

string_id!(
    /// Identifier of one unit of work
    TaskId
);
string_id!(
    /// Correlates tasks and messages of one conversation
    ContextId
);
string_id!(
    /// Identifier of a single message
    MessageId
);
string_id!(
    /// Identifier of an artifact
    ArtifactId
);

/// Who authored a message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Agent,
}

/// One piece of message or artifact content
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Part {
    Text { text: String },
    Data { data: Value },
}

impl Part {
    pub fn text(text: impl Into<String>) -> Self {
        Part::Text { text: text.into() }
    }

    pub fn data(data: Value) -> Self {
        Part::Data { data }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Part::Text { text } => Some(text),
            Part::Data { .. } => None,
        }
    }

    /// Media type advertised for this kind of part in agent cards
    pub fn media_type(&self) -> &'static str {
        match self {
            Part::Text { .. } => "text/plain",
            Part::Data { .. } => "application/json",
        }
    }
}

/// A role-tagged payload of content parts
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    pub message_id: MessageId,
    pub role: Role,
    pub parts: Vec<Part>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub task_id: Option<TaskId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context_id: Option<ContextId>,
}

impl Message {
    pub fn new(role: Role, parts: Vec<Part>) -> Self {
        Self {
            message_id: MessageId::new(),
            role,
            parts,
            task_id: None,
            context_id: None,
        }
    }

    /// A user message with a single text part
    pub fn user_text(text: impl Into<String>) -> Self {
        Self::new(Role::User, vec![Part::text(text)])
    }

    /// An agent message with a single text part
    pub fn agent_text(text: impl Into<String>) -> Self {
        Self::new(Role::Agent, vec![Part::text(text)])
    }

    /// Attach task correlation ids
    pub fn for_task(mut self, task_id: TaskId, context_id: ContextId) -> Self {
        self.task_id = Some(task_id);
        self.context_id = Some(context_id);
        self
    }

    pub fn with_context(mut self, context_id: ContextId) -> Self {
        self.context_id = Some(context_id);
        self
    }

    /// The first text part, if any
    pub fn first_text(&self) -> Option<&str> {
        self.parts.iter().find_map(Part::as_text)
    }

    /// All text parts joined with a single space
    pub fn joined_text(&self) -> String {
        self.parts
            .iter()
            .filter_map(Part::as_text)
            .collect::<Vec<_>>()
            .join(" ")
    }

    pub fn is_agent(&self) -> bool {
        self.role == Role::Agent
    }
}

/// Lifecycle state of a task
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskState {
    Submitted,
    Working,
    Completed,
    Failed,
}

impl fmt::Display for TaskState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TaskState::Submitted => "submitted",
            TaskState::Working => "working",
            TaskState::Completed => "completed",
            TaskState::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// Current state plus the time of the last transition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskStatus {
    pub state: TaskState,
    pub timestamp: DateTime<Utc>,
}

impl TaskStatus {
    pub fn new(state: TaskState, timestamp: DateTime<Utc>) -> Self {
        Self { state, timestamp }
    }
}

/// A unit of work
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: TaskId,
    pub context_id: ContextId,
    pub status: TaskStatus,
}

/// Intermediate structured output of a task
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Artifact {
    pub artifact_id: ArtifactId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub parts: Vec<Part>,
}

impl Artifact {
    /// A named, described artifact with one text part
    pub fn text(name: impl Into<String>, description: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            artifact_id: ArtifactId::new(),
            name: Some(name.into()),
            description: Some(description.into()),
            parts: vec![Part::text(text)],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusUpdate {
    pub task_id: TaskId,
    pub context_id: ContextId,
    pub status: TaskStatus,
    #[serde(rename = "final")]
    pub is_final: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArtifactUpdate {
    pub task_id: TaskId,
    pub context_id: ContextId,
    pub artifact: Artifact,
}

/// One datum of a task's outbound stream
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum Event {
    /// Task created in `submitted`
    Task(Task),
    StatusUpdate(StatusUpdate),
    ArtifactUpdate(ArtifactUpdate),
    Message(Message),
}

impl Event {
    pub fn kind(&self) -> &'static str {
        match self {
            Event::Task(_) => "task",
            Event::StatusUpdate(_) => "status-update",
            Event::ArtifactUpdate(_) => "artifact-update",
            Event::Message(_) => "message",
        }
    }

    /// Task this event belongs to (messages may be uncorrelated)
    pub fn task_id(&self) -> Option<&TaskId> {
        match self {
            Event::Task(task) => Some(&task.id),
            Event::StatusUpdate(update) => Some(&update.task_id),
            Event::ArtifactUpdate(update) => Some(&update.task_id),
            Event::Message(message) => message.task_id.as_ref(),
        }
    }

    pub fn context_id(&self) -> Option<&ContextId> {
        match self {
            Event::Task(task) => Some(&task.context_id),
            Event::StatusUpdate(update) => Some(&update.context_id),
            Event::ArtifactUpdate(update) => Some(&update.context_id),
            Event::Message(message) => message.context_id.as_ref(),
        }
    }

    pub fn is_final(&self) -> bool {
        matches!(self, Event::StatusUpdate(update) if update.is_final)
    }

    /// The message if this is an agent-authored message event
    pub fn as_agent_message(&self) -> Option<&Message> {
        match self {
            Event::Message(message) if message.is_agent() => Some(message),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_status_update_wire_shape() {
        let event = Event::StatusUpdate(StatusUpdate {
            task_id: TaskId::from("t-1"),
            context_id: ContextId::from("c-1"),
            status: TaskStatus::new(TaskState::Working, Utc::now()),
            is_final: false,
        });

        let value = serde_json::to_value(&event).unwrap();
        assert_eq!(value["kind"], "status-update");
        assert_eq!(value["taskId"], "t-1");
        assert_eq!(value["contextId"], "c-1");
        assert_eq!(value["status"]["state"], "working");
        assert_eq!(value["final"], false);
    }

    #[test]
    fn test_parse_agent_message_event() {
        let raw = json!({
            "kind": "message",
            "messageId": "m-1",
            "role": "agent",
            "parts": [
                {"kind": "text", "text": "Hello"},
                {"kind": "data", "data": {"temp": 22}},
                {"kind": "text", "text": "world"}
            ],
            "taskId": "t-1"
        });

        let event: Event = serde_json::from_value(raw).unwrap();
        let message = event.as_agent_message().expect("agent message");
        assert_eq!(message.joined_text(), "Hello world");
        assert_eq!(message.first_text(), Some("Hello"));
        assert_eq!(event.task_id(), Some(&TaskId::from("t-1")));
        assert!(event.context_id().is_none());
    }

    #[test]
    fn test_user_message_is_not_agent_message() {
        let event = Event::Message(Message::user_text("hi"));
        assert!(event.as_agent_message().is_none());
        assert!(!event.is_final());
    }

    #[test]
    fn test_part_media_types() {
        assert_eq!(Part::text("x").media_type(), "text/plain");
        assert_eq!(Part::data(json!({})).media_type(), "application/json");
    }
}
