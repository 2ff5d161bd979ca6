//! Single-calendar view
//!
//! Owns the correlation state for one calendar: mounting subscribes to the
//! results topic, submitting registers request ids, and dropping the view
//! closes the subscription and discards the correlator.

use crate::api::BackendClient;
use crate::correlation::{
    BroadcastTransport, Correlator, ResolvedEntry, ResultByCalendar, SubscriptionListener,
};
use crate::error::{ClientError, Result};
use crate::submission::{submit_and_register, AnalysisInput};
use serde_json::Value;
use smartask_common::events::{ClientEvent, EventBus, ListenerState};
use smartask_common::metrics::{KpiMetrics, KpiReport};
use smartask_common::{CalendarId, RequestId};
use std::sync::Arc;
use tracing::{info, warn};

pub struct CalendarView<T> {
    calendar_id: CalendarId,
    correlator: Correlator,
    results: ResultByCalendar,
    listener: SubscriptionListener<T>,
    events: Option<Arc<EventBus>>,
}

impl<T: BroadcastTransport> CalendarView<T> {
    /// Create the view and subscribe to `topic`
    ///
    /// A failed subscription is logged and returned; the view is not built.
    pub async fn mount(
        calendar_id: CalendarId,
        transport: T,
        topic: &str,
        events: Option<Arc<EventBus>>,
    ) -> Result<Self> {
        let mut listener = SubscriptionListener::new(transport, topic);
        if let Some(bus) = &events {
            listener = listener.with_events(Arc::clone(bus));
        }
        listener.connect().await?;
        info!(calendar_id = %calendar_id, topic, "Calendar view mounted");

        Ok(Self {
            calendar_id,
            correlator: Correlator::new(),
            results: ResultByCalendar::new(),
            listener,
            events,
        })
    }

    /// Wait until a result for this calendar arrives
    ///
    /// Returns `None` if the subscription ends first.
    pub async fn wait_for_result(&mut self) -> Option<Value> {
        loop {
            let entries = self.listener.next_batch(&self.correlator).await?;
            if self.merge(entries) {
                return self.result().cloned();
            }
        }
    }
}

impl<T> CalendarView<T> {
    pub fn calendar_id(&self) -> &CalendarId {
        &self.calendar_id
    }

    pub fn listener_state(&self) -> ListenerState {
        self.listener.state()
    }

    pub fn correlator(&self) -> &Correlator {
        &self.correlator
    }

    /// Map a request id to this view's calendar
    pub fn register(&mut self, request_id: RequestId) {
        self.correlator
            .register(request_id.clone(), self.calendar_id.clone());
        self.emit(ClientEvent::AnalysisSubmitted {
            request_id,
            calendar_id: self.calendar_id.clone(),
            timestamp: chrono::Utc::now(),
        });
    }

    /// Submit this calendar for analysis and register the request id
    pub async fn submit(&mut self, client: &BackendClient, input: &AnalysisInput) -> Result<RequestId> {
        if input.calendar_id != self.calendar_id {
            return Err(ClientError::InvalidState(format!(
                "view for {} cannot submit calendar {}",
                self.calendar_id, input.calendar_id
            )));
        }
        let request_id = submit_and_register(client, &mut self.correlator, input).await?;
        self.emit(ClientEvent::AnalysisSubmitted {
            request_id: request_id.clone(),
            calendar_id: self.calendar_id.clone(),
            timestamp: chrono::Utc::now(),
        });
        Ok(request_id)
    }

    /// Process one raw broadcast frame; true if the result changed
    pub fn apply_frame(&mut self, frame: &str) -> bool {
        match self.listener.handle_frame(frame, &self.correlator) {
            Some(entries) => self.merge(entries),
            None => false,
        }
    }

    /// Store the first relevant result of a batch
    ///
    /// Later entries in the same batch that disagree with the first are
    /// logged and ignored. Returns false for an empty batch.
    pub fn merge(&mut self, entries: Vec<ResolvedEntry>) -> bool {
        let mut entries = entries.into_iter();
        let Some(first) = entries.next() else {
            return false;
        };
        for other in entries {
            if other.result != first.result {
                warn!(
                    calendar_id = %self.calendar_id,
                    kept = %first.request_id,
                    ignored = %other.request_id,
                    "Batch carried diverging results for one calendar; keeping the first"
                );
            }
        }
        self.results.insert(first.calendar_id, first.result);
        true
    }

    /// Latest raw result for this calendar
    pub fn result(&self) -> Option<&Value> {
        self.results.get(&self.calendar_id)
    }

    /// Validated KPI record of the latest result
    pub fn metrics(&self) -> Result<Option<KpiMetrics>> {
        match self.result() {
            Some(value) => Ok(Some(KpiMetrics::from_value(value)?)),
            None => Ok(None),
        }
    }

    pub fn report(&self) -> Result<Option<KpiReport>> {
        Ok(self.metrics()?.as_ref().map(KpiReport::from_metrics))
    }

    /// Close the subscription now; dropping the view does the same
    pub fn unmount(mut self) {
        self.listener.close();
        info!(calendar_id = %self.calendar_id, "Calendar view unmounted");
    }

    fn emit(&self, event: ClientEvent) {
        if let Some(bus) = &self.events {
            bus.emit_lossy(event);
        }
    }
}
