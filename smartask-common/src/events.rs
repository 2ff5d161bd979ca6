//! Client event types and EventBus
//!
//! Views and the subscription listener publish what happened to them here so
//! a front end (the CLI, a test) can observe progress without reaching into
//! view state.

use crate::ids::{CalendarId, RequestId};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

/// Connection state of a subscription listener
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ListenerState {
    Disconnected,
    Connecting,
    Connected,
}

impl ListenerState {
    pub fn as_str(&self) -> &'static str {
        match self {
            ListenerState::Disconnected => "Disconnected",
            ListenerState::Connecting => "Connecting",
            ListenerState::Connected => "Connected",
        }
    }
}

/// SmartTask client events
///
/// Events are broadcast via EventBus and can be serialized for logging.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ClientEvent {
    /// Subscription listener moved between states
    ListenerStateChanged {
        topic: String,
        old_state: ListenerState,
        new_state: ListenerState,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// An analysis was accepted by the backend and registered locally
    AnalysisSubmitted {
        request_id: RequestId,
        calendar_id: CalendarId,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// A broadcast entry resolved to one of this client's calendars
    AnalysisResultReceived {
        request_id: RequestId,
        calendar_id: CalendarId,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// A broadcast frame could not be parsed and was dropped
    BatchDropped {
        reason: String,
        timestamp: chrono::DateTime<chrono::Utc>,
    },
}

/// Central event distribution for one client process
///
/// Wraps a tokio broadcast channel. Receivers that fall behind by more than
/// `capacity` events observe a lag error and skip ahead.
pub struct EventBus {
    tx: broadcast::Sender<ClientEvent>,
    capacity: usize,
}

impl EventBus {
    /// Creates a new EventBus with specified channel capacity
    ///
    /// # Examples
    ///
    /// ```
    /// use smartask_common::events::EventBus;
    ///
    /// let event_bus = EventBus::new(100);
    /// assert_eq!(event_bus.capacity(), 100);
    /// ```
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx, capacity }
    }

    /// Subscribe to all future events
    ///
    /// Events emitted before subscription are not received.
    pub fn subscribe(&self) -> broadcast::Receiver<ClientEvent> {
        self.tx.subscribe()
    }

    /// Emit an event to all subscribers
    ///
    /// Returns `Ok(subscriber_count)` if at least one subscriber exists.
    #[allow(clippy::result_large_err)]
    pub fn emit(
        &self,
        event: ClientEvent,
    ) -> Result<usize, broadcast::error::SendError<ClientEvent>> {
        self.tx.send(event)
    }

    /// Emit an event, ignoring if no subscribers are listening
    pub fn emit_lossy(&self, event: ClientEvent) {
        let _ = self.tx.send(event);
    }

    /// Get the current number of active subscribers
    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }

    /// Get the configured channel capacity
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}
