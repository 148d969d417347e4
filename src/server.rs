//! HTTP front for one capability agent
//!
//! | Route                              | Purpose                               |
//! |------------------------------------|---------------------------------------|
//! | `GET /.well-known/agent-card.json` | agent card                            |
//! | `GET /`                            | liveness document                     |
//! | `POST /message`                    | submit a task, blocking or NDJSON     |
//! | `POST /cancel`                     | release the agent's held sessions     |

use axum::{
    body::Body,
    extract::State,
    http::{header, HeaderValue},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use bytes::Bytes;
use futures_util::StreamExt;
use serde_json::{json, Value};
use tokio::net::TcpListener;
use tracing::{debug, info};

use crate::agent::{spawn_execute, AgentHandle, RequestContext};
use crate::card::{AgentCard, AGENT_CARD_PATH};
use crate::error::CourierError;
use crate::protocol::Event;
use crate::transport::{endpoint, BlockingReply, SendMode, SendRequest};

const NDJSON: &str = "application/x-ndjson; charset=utf-8";

pub struct AgentServer {
    agent: AgentHandle,
}

impl AgentServer {
    pub fn new(agent: AgentHandle) -> Self {
        Self { agent }
    }

    pub fn router(&self) -> Router {
        Router::new()
            .route(AGENT_CARD_PATH, get(card_handler))
            .route("/", get(status_handler))
            .route("/message", post(message_handler))
            .route("/cancel", post(cancel_handler))
            .with_state(self.agent.clone())
    }

    pub async fn serve(self, bind: &str) -> Result<(), CourierError> {
        let listener = TcpListener::bind(bind)
            .await
            .map_err(|e| CourierError::Transport(format!("bind {bind}: {e}")))?;
        self.serve_on(listener).await
    }

    /// Serve on an already bound listener
    pub async fn serve_on(self, listener: TcpListener) -> Result<(), CourierError> {
        if let Ok(addr) = listener.local_addr() {
            info!(agent = %self.agent.card().name, %addr, "Agent server listening");
        }
        axum::serve(listener, self.router().into_make_service())
            .await
            .map_err(|e| CourierError::Transport(format!("server error: {e}")))
    }
}

async fn card_handler(State(agent): State<AgentHandle>) -> Json<AgentCard> {
    Json(agent.card().clone())
}

async fn status_handler(State(agent): State<AgentHandle>) -> Json<Value> {
    let card = agent.card();
    Json(json!({
        "agent": card.name,
        "status": "running",
        "version": card.version,
        "agentCard": endpoint(&card.url, AGENT_CARD_PATH),
    }))
}

async fn message_handler(State(agent): State<AgentHandle>, Json(request): Json<SendRequest>) -> Response {
    debug!(agent = %agent.card().name, mode = ?request.mode, "Task submitted");
    let events = spawn_execute(agent, RequestContext::new(request.message));

    match request.mode {
        SendMode::Streaming => {
            let lines = events.map(|event| {
                serde_json::to_vec(&event).map(|mut line| {
                    line.push(b'\n');
                    Bytes::from(line)
                })
            });
            let mut response = Response::new(Body::from_stream(lines));
            response
                .headers_mut()
                .insert(header::CONTENT_TYPE, HeaderValue::from_static(NDJSON));
            response
        }
        SendMode::Blocking => {
            let events: Vec<Event> = events.collect().await;
            Json(blocking_reply(&events)).into_response()
        }
    }
}

fn blocking_reply(events: &[Event]) -> BlockingReply {
    let mut reply = BlockingReply {
        task_id: None,
        state: None,
        message: None,
    };
    for event in events {
        if reply.task_id.is_none() {
            reply.task_id = event.task_id().cloned();
        }
        match event {
            Event::Message(message) if message.is_agent() => reply.message = Some(message.clone()),
            Event::StatusUpdate(update) if update.is_final => reply.state = Some(update.status.state),
            _ => {}
        }
    }
    reply
}

async fn cancel_handler(State(agent): State<AgentHandle>) -> Json<Value> {
    agent.cancel().await;
    Json(json!({ "cancelled": true }))
}
