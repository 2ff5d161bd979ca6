//! Two-calendar comparison view
//!
//! Both calendars are analyzed through one subscription and one correlator.
//! Each new result for a side replaces the previous one.

use crate::api::BackendClient;
use crate::correlation::{
    BroadcastTransport, Correlator, ResolvedEntry, ResultByCalendar, SubscriptionListener,
};
use crate::error::{ClientError, Result};
use crate::submission::{submit_and_register, AnalysisInput};
use serde_json::Value;
use smartask_common::events::{ClientEvent, EventBus, ListenerState};
use smartask_common::metrics::{compare_metrics, KpiMetrics, MetricDiff};
use smartask_common::{CalendarId, RequestId};
use std::sync::Arc;
use tracing::{debug, info};

pub struct CompareView<T> {
    one: CalendarId,
    two: CalendarId,
    correlator: Correlator,
    results: ResultByCalendar,
    listener: SubscriptionListener<T>,
    events: Option<Arc<EventBus>>,
}

impl<T: BroadcastTransport> CompareView<T> {
    pub async fn mount(
        one: CalendarId,
        two: CalendarId,
        transport: T,
        topic: &str,
        events: Option<Arc<EventBus>>,
    ) -> Result<Self> {
        let mut listener = SubscriptionListener::new(transport, topic);
        if let Some(bus) = &events {
            listener = listener.with_events(Arc::clone(bus));
        }
        listener.connect().await?;
        info!(one = %one, two = %two, topic, "Compare view mounted");

        Ok(Self {
            one,
            two,
            correlator: Correlator::new(),
            results: ResultByCalendar::new(),
            listener,
            events,
        })
    }

    /// Wait for the next batch touching either side and apply it
    ///
    /// Returns false once the subscription has ended.
    pub async fn next_update(&mut self) -> bool {
        match self.listener.next_batch(&self.correlator).await {
            Some(entries) => {
                self.apply(entries);
                true
            }
            None => false,
        }
    }

    /// Wait until both sides have a result
    pub async fn wait_until_complete(&mut self) -> bool {
        while !self.is_complete() {
            if !self.next_update().await {
                return false;
            }
        }
        true
    }
}

impl<T> CompareView<T> {
    pub fn sides(&self) -> (&CalendarId, &CalendarId) {
        (&self.one, &self.two)
    }

    pub fn listener_state(&self) -> ListenerState {
        self.listener.state()
    }

    pub fn correlator(&self) -> &Correlator {
        &self.correlator
    }

    pub fn results(&self) -> &ResultByCalendar {
        &self.results
    }

    /// Map a request id to one of the two calendars
    pub fn register(&mut self, request_id: RequestId, calendar_id: CalendarId) -> Result<()> {
        self.check_side(&calendar_id)?;
        self.correlator
            .register(request_id.clone(), calendar_id.clone());
        self.emit(ClientEvent::AnalysisSubmitted {
            request_id,
            calendar_id,
            timestamp: chrono::Utc::now(),
        });
        Ok(())
    }

    /// Submit one side for analysis and register the request id
    pub async fn submit(&mut self, client: &BackendClient, input: &AnalysisInput) -> Result<RequestId> {
        self.check_side(&input.calendar_id)?;
        let request_id = submit_and_register(client, &mut self.correlator, input).await?;
        self.emit(ClientEvent::AnalysisSubmitted {
            request_id: request_id.clone(),
            calendar_id: input.calendar_id.clone(),
            timestamp: chrono::Utc::now(),
        });
        Ok(request_id)
    }

    pub fn apply_frame(&mut self, frame: &str) -> usize {
        match self.listener.handle_frame(frame, &self.correlator) {
            Some(entries) => self.apply(entries),
            None => 0,
        }
    }

    /// Overwrite each side's result; returns entries written
    pub fn apply(&mut self, entries: Vec<ResolvedEntry>) -> usize {
        let written = self.results.apply(entries);
        debug!(written, "Comparison results updated");
        written
    }

    pub fn result_one(&self) -> Option<&Value> {
        self.results.get(&self.one)
    }

    pub fn result_two(&self) -> Option<&Value> {
        self.results.get(&self.two)
    }

    pub fn is_complete(&self) -> bool {
        self.results.contains(&self.one) && self.results.contains(&self.two)
    }

    /// Per-metric differences (side two minus side one)
    ///
    /// `None` until both sides have a result; an error when either result
    /// is not a JSON object.
    pub fn comparison(&self) -> Result<Option<Vec<MetricDiff>>> {
        let (Some(one), Some(two)) = (self.result_one(), self.result_two()) else {
            return Ok(None);
        };
        let one = KpiMetrics::from_value(one)?;
        let two = KpiMetrics::from_value(two)?;
        Ok(Some(compare_metrics(&one, &two)))
    }

    pub fn unmount(mut self) {
        self.listener.close();
        info!(one = %self.one, two = %self.two, "Compare view unmounted");
    }

    fn check_side(&self, calendar_id: &CalendarId) -> Result<()> {
        if *calendar_id == self.one || *calendar_id == self.two {
            Ok(())
        } else {
            Err(ClientError::InvalidState(format!(
                "calendar {} is not part of this comparison",
                calendar_id
            )))
        }
    }

    fn emit(&self, event: ClientEvent) {
        if let Some(bus) = &self.events {
            bus.emit_lossy(event);
        }
    }
}
