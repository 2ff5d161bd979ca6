//! Broadcast subscription listener
//!
//! Holds one subscription to the shared results topic and hands back only the
//! batch entries the caller's correlator knows about. The listener never
//! reconnects on its own; after a failure it stays `Disconnected` until
//! `connect` is called again.

use super::correlator::{parse_batch, Correlator, ResolvedEntry};
use super::transport::{BroadcastTransport, FrameStream, TransportError};
use crate::error::Result;
use futures::StreamExt;
use smartask_common::events::{ClientEvent, EventBus, ListenerState};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// Subscription to one broadcast topic
pub struct SubscriptionListener<T> {
    transport: T,
    topic: String,
    state: ListenerState,
    frames: Option<FrameStream>,
    events: Option<Arc<EventBus>>,
}

impl<T> SubscriptionListener<T> {
    pub fn new(transport: T, topic: impl Into<String>) -> Self {
        Self {
            transport,
            topic: topic.into(),
            state: ListenerState::Disconnected,
            frames: None,
            events: None,
        }
    }

    /// Publish state changes and received results on `bus`
    pub fn with_events(mut self, bus: Arc<EventBus>) -> Self {
        self.events = Some(bus);
        self
    }

    pub fn state(&self) -> ListenerState {
        self.state
    }

    pub fn topic(&self) -> &str {
        &self.topic
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Drop the subscription; safe to call repeatedly
    pub fn close(&mut self) {
        if self.state == ListenerState::Disconnected {
            return;
        }
        self.frames = None;
        self.set_state(ListenerState::Disconnected);
        info!(topic = %self.topic, "Subscription closed");
    }

    /// Parse one frame and keep the entries registered in `correlator`
    ///
    /// Returns `None` when the frame is not a batch or when the listener is
    /// not connected. A malformed frame is logged and dropped.
    pub fn handle_frame(&self, frame: &str, correlator: &Correlator) -> Option<Vec<ResolvedEntry>> {
        if self.state != ListenerState::Connected {
            debug!(topic = %self.topic, "Frame ignored while not connected");
            return None;
        }

        let batch = match parse_batch(frame) {
            Ok(batch) => batch,
            Err(e) => {
                warn!(topic = %self.topic, error = %e, "Dropping malformed result batch");
                self.emit(ClientEvent::BatchDropped {
                    reason: e.to_string(),
                    timestamp: chrono::Utc::now(),
                });
                return None;
            }
        };

        let total = batch.len();
        let resolved = correlator.resolve_batch(batch);
        debug!(total, relevant = resolved.len(), "Result batch received");

        for entry in &resolved {
            self.emit(ClientEvent::AnalysisResultReceived {
                request_id: entry.request_id.clone(),
                calendar_id: entry.calendar_id.clone(),
                timestamp: chrono::Utc::now(),
            });
        }
        Some(resolved)
    }

    fn set_state(&mut self, new_state: ListenerState) {
        let old_state = self.state;
        if old_state == new_state {
            return;
        }
        self.state = new_state;
        self.emit(ClientEvent::ListenerStateChanged {
            topic: self.topic.clone(),
            old_state,
            new_state,
            timestamp: chrono::Utc::now(),
        });
    }

    fn emit(&self, event: ClientEvent) {
        if let Some(bus) = &self.events {
            bus.emit_lossy(event);
        }
    }
}

impl<T: BroadcastTransport> SubscriptionListener<T> {
    /// Subscribe to the topic
    ///
    /// Already connected is a no-op. On failure the error is logged and
    /// returned, and the listener is left `Disconnected`. A listener found
    /// `Connecting` had an earlier `connect` future dropped mid-subscribe;
    /// the subscription is started over.
    pub async fn connect(&mut self) -> Result<()> {
        match self.state {
            ListenerState::Connected => return Ok(()),
            ListenerState::Connecting => {
                debug!(topic = %self.topic, "Restarting interrupted subscription");
                self.frames = None;
            }
            ListenerState::Disconnected => {}
        }

        self.set_state(ListenerState::Connecting);
        match self.transport.subscribe(&self.topic).await {
            Ok(frames) => {
                self.frames = Some(frames);
                self.set_state(ListenerState::Connected);
                info!(topic = %self.topic, "Subscribed to result broadcasts");
                Ok(())
            }
            Err(e) => {
                error!(topic = %self.topic, error = %e, "Subscription failed");
                self.set_state(ListenerState::Disconnected);
                Err(e.into())
            }
        }
    }

    /// Wait for the next batch with at least one entry for us
    ///
    /// Batches without relevant entries and malformed frames are skipped.
    /// Returns `None` once the listener is (or becomes) disconnected.
    pub async fn next_batch(&mut self, correlator: &Correlator) -> Option<Vec<ResolvedEntry>> {
        loop {
            if self.state != ListenerState::Connected {
                return None;
            }
            let frames = self.frames.as_mut()?;

            match frames.next().await {
                Some(Ok(frame)) => {
                    if let Some(resolved) = self.handle_frame(&frame, correlator) {
                        if !resolved.is_empty() {
                            return Some(resolved);
                        }
                    }
                }
                Some(Err(TransportError::Lagged(skipped))) => {
                    warn!(topic = %self.topic, skipped, "Subscription lagged; frames lost");
                }
                Some(Err(e)) => {
                    error!(topic = %self.topic, error = %e, "Subscription stream failed");
                    self.close();
                    return None;
                }
                None => {
                    info!(topic = %self.topic, "Broadcast stream ended");
                    self.close();
                    return None;
                }
            }
        }
    }
}

impl<T> Drop for SubscriptionListener<T> {
    fn drop(&mut self) {
        self.close();
    }
}
