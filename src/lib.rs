//! # Courier
//!
//! Capability agents and a trip planner that coordinates them.
//!
//! Every agent speaks the same task protocol: it receives a message, opens a
//! task and streams status, artifact and message events until the task
//! reaches `completed` or `failed`.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────────┐
//! │                       PLANNER (port 4002)                         │
//! │  ┌───────────────┐  ┌───────────────┐  ┌────────────────┐         │
//! │  │ TripRequest   │  │ Schedule      │  │ TripServices   │         │
//! │  │ (parse)       │  │ (stage order) │  │ live|simulated │         │
//! │  └───────────────┘  └───────────────┘  └───────┬────────┘         │
//! └────────────────────────────────────────────────┼─────────────────┘
//!                               RemoteClient + Transport (local | http)
//!        ┌──────────────┬───────────────┼───────────────┐
//!        ▼              ▼               ▼               ▼
//!  ┌───────────┐  ┌───────────┐  ┌────────────┐  ┌────────────┐
//!  │ weather   │  │ search    │  │ calculator │  │ translator │
//!  │ 4000      │  │ 4003      │  │ 4004       │  │ 4001       │
//!  └─────┬─────┘  └─────┬─────┘  └─────┬──────┘  └─────┬──────┘
//!        ▼              ▼              ▼               ▼
//!                 Provider (synthetic | HTTP bridge)
//! ```
//!
//! ## Key Concepts
//!
//! - **Capability agent**: one function behind the task protocol ([`Agent`])
//! - **Task**: a unit of work, correlated with others by its context id
//! - **Event bus**: the ordered outbound stream of one task ([`EventBus`])
//! - **Provider**: the external service a capability delegates to
//! - **Simulation**: synthetic providers and planner results, no network

pub mod agent;
pub mod capabilities;
pub mod card;
pub mod channel;
pub mod client;
pub mod config;
pub mod error;
pub mod fleet;
pub mod lifecycle;
pub mod observability;
pub mod orchestrator;
pub mod protocol;
pub mod provider;
pub mod server;
pub mod session;
pub mod transport;

pub use agent::{Agent, AgentHandle, Capability, CapabilityAgent, RequestContext};
pub use card::AgentCard;
pub use channel::{EventBus, EventStream};
pub use client::RemoteClient;
pub use error::CourierError;
pub use orchestrator::{Planner, TripRequest};
pub use provider::{Provider, ProviderReply};
pub use session::SharedSession;

// Protocol types used at every seam
pub use protocol::{
    Artifact, ArtifactUpdate, ContextId, Event, Message, Part, Role, StatusUpdate, Task, TaskId, TaskState,
    TaskStatus,
};
