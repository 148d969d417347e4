//! Per-task event bus
//!
//! An agent publishes a task's events into an [`EventBus`]; exactly one
//! consumer drains them through the [`EventStream`] returned by
//! [`EventBus::subscribe`].

use std::pin::Pin;
use std::task::{Context, Poll};

use futures_util::Stream;
use parking_lot::Mutex;
use tokio::sync::mpsc;
use tracing::{debug, trace};

use crate::lifecycle::{ProtocolViolation, TaskLifecycle};
use crate::protocol::{Event, TaskState};

struct BusState {
    /// Dropped by `finished()` to close the stream
    event_tx: Option<mpsc::UnboundedSender<Event>>,
    /// Taken by the first subscriber
    event_rx: Option<mpsc::UnboundedReceiver<Event>>,
    lifecycle: TaskLifecycle,
}

/// Buffered, order-preserving channel for one task's events
///
/// Publishing never waits for a consumer. Every event is checked against the
/// task state machine first; breaches are returned as [`ProtocolViolation`].
pub struct EventBus {
    state: Mutex<BusState>,
}

impl EventBus {
    pub fn new() -> Self {
        let (event_tx, event_rx) = mpsc::unbounded_channel();
        Self {
            state: Mutex::new(BusState {
                event_tx: Some(event_tx),
                event_rx: Some(event_rx),
                lifecycle: TaskLifecycle::new(),
            }),
        }
    }

    /// Append an event to the task's stream
    pub fn publish(&self, event: Event) -> Result<(), ProtocolViolation> {
        let mut state = self.state.lock();

        let Some(event_tx) = state.event_tx.clone() else {
            return Err(ProtocolViolation::BusFinished { kind: event.kind() });
        };
        state.lifecycle.observe(&event)?;

        trace!(kind = event.kind(), task_id = ?event.task_id(), "Publishing event");
        // A dropped stream only means nobody is listening any more
        let _ = event_tx.send(event);
        Ok(())
    }

    /// Signal that no further events follow. Idempotent.
    pub fn finished(&self) {
        let mut state = self.state.lock();
        if state.event_tx.take().is_some() {
            debug!(state = ?state.lifecycle.state(), "Event bus finished");
        }
    }

    pub fn is_finished(&self) -> bool {
        self.state.lock().event_tx.is_none()
    }

    /// Latest task state seen on this bus
    pub fn task_state(&self) -> Option<TaskState> {
        self.state.lock().lifecycle.state()
    }

    /// Attach the consumer. Only the first call receives events; later
    /// calls get a stream that is already exhausted.
    pub fn subscribe(&self) -> EventStream {
        EventStream {
            event_rx: self.state.lock().event_rx.take(),
        }
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

/// Single-pass stream over a task's events, ends after `finished()`
pub struct EventStream {
    event_rx: Option<mpsc::UnboundedReceiver<Event>>,
}

impl EventStream {
    /// Receive the next event, `None` once the bus is finished and drained
    pub async fn recv(&mut self) -> Option<Event> {
        match self.event_rx.as_mut() {
            Some(rx) => rx.recv().await,
            None => None,
        }
    }
}

impl Stream for EventStream {
    type Item = Event;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Event>> {
        match self.event_rx.as_mut() {
            Some(rx) => rx.poll_recv(cx),
            None => Poll::Ready(None),
        }
    }
}
