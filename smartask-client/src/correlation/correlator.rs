//! Request correlation
//!
//! The backend pushes results for every outstanding job to one shared topic.
//! A `Correlator` remembers which of those jobs this client submitted and for
//! which calendar, so a batch can be filtered down to what concerns us.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use smartask_common::{CalendarId, RequestId};
use std::collections::HashMap;

/// One `{ requestId, result }` pair of a pushed batch
///
/// Both fields are required; a batch with an entry missing either one is
/// rejected as a whole.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchEntry {
    pub request_id: RequestId,
    pub result: Value,
}

/// Entries delivered by one push; order carries no meaning
pub type ResultBatch = Vec<BatchEntry>;

/// Parse one broadcast frame
pub fn parse_batch(frame: &str) -> Result<ResultBatch, serde_json::Error> {
    serde_json::from_str(frame)
}

/// A batch entry that belongs to one of our calendars
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedEntry {
    pub request_id: RequestId,
    pub calendar_id: CalendarId,
    pub result: Value,
}

/// RequestId -> CalendarId map owned by one view
///
/// Entries are never removed; they live as long as the owning view.
#[derive(Debug, Default, Clone)]
pub struct Correlator {
    entries: HashMap<RequestId, CalendarId>,
}

impl Correlator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or overwrite the mapping for `request_id`
    ///
    /// Returns the calendar previously mapped to this request id, if any.
    /// Several request ids may map to the same calendar.
    pub fn register(&mut self, request_id: RequestId, calendar_id: CalendarId) -> Option<CalendarId> {
        tracing::debug!(request_id = %request_id, calendar_id = %calendar_id, "Registering analysis request");
        self.entries.insert(request_id, calendar_id)
    }

    /// `None` when the id was never registered here (another client's job)
    pub fn resolve(&self, request_id: &RequestId) -> Option<&CalendarId> {
        self.entries.get(request_id)
    }

    /// Keep the entries whose request id is registered, in batch order
    pub fn resolve_batch(&self, batch: ResultBatch) -> Vec<ResolvedEntry> {
        batch
            .into_iter()
            .filter_map(|entry| {
                let calendar_id = self.resolve(&entry.request_id)?.clone();
                Some(ResolvedEntry {
                    request_id: entry.request_id,
                    calendar_id,
                    result: entry.result,
                })
            })
            .collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// CalendarId -> last-known analysis result
///
/// Writes overwrite; nothing accumulates, so applying the same entries twice
/// leaves the same state as applying them once.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct ResultByCalendar {
    results: HashMap<CalendarId, Value>,
}

impl ResultByCalendar {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, calendar_id: CalendarId, result: Value) {
        self.results.insert(calendar_id, result);
    }

    /// Overwrite the result of every entry's calendar; returns entries written
    pub fn apply(&mut self, entries: Vec<ResolvedEntry>) -> usize {
        let count = entries.len();
        for entry in entries {
            self.results.insert(entry.calendar_id, entry.result);
        }
        count
    }

    pub fn get(&self, calendar_id: &CalendarId) -> Option<&Value> {
        self.results.get(calendar_id)
    }

    pub fn contains(&self, calendar_id: &CalendarId) -> bool {
        self.results.contains_key(calendar_id)
    }

    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn batch(value: Value) -> ResultBatch {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_unregistered_id_resolves_to_none() {
        let correlator = Correlator::new();
        assert!(correlator.resolve(&RequestId::new("req-9")).is_none());
        assert!(correlator.is_empty());
    }

    #[test]
    fn test_register_then_overwrite() {
        let mut correlator = Correlator::new();
        let req = RequestId::new("req-1");

        assert!(correlator.register(req.clone(), CalendarId::new("cal-A")).is_none());
        assert_eq!(correlator.resolve(&req).unwrap().as_str(), "cal-A");

        let previous = correlator.register(req.clone(), CalendarId::new("cal-B"));
        assert_eq!(previous.unwrap().as_str(), "cal-A");
        assert_eq!(correlator.resolve(&req).unwrap().as_str(), "cal-B");
        assert_eq!(correlator.len(), 1);
    }

    #[test]
    fn test_many_requests_share_a_calendar() {
        let mut correlator = Correlator::new();
        correlator.register(RequestId::new("req-1"), CalendarId::new("cal-A"));
        correlator.register(RequestId::new("req-2"), CalendarId::new("cal-A"));

        let resolved = correlator.resolve_batch(batch(json!([
            {"requestId": "req-2", "result": {"tmFails": 1}},
            {"requestId": "req-1", "result": {"tmFails": 2}},
        ])));
        assert_eq!(resolved.len(), 2);
        assert_eq!(resolved[0].request_id.as_str(), "req-2");
        assert!(resolved.iter().all(|e| e.calendar_id.as_str() == "cal-A"));
    }

    #[test]
    fn test_unknown_entries_never_written() {
        let mut correlator = Correlator::new();
        correlator.register(RequestId::new("req-1"), CalendarId::new("cal-A"));
        let mut results = ResultByCalendar::new();

        let resolved = correlator.resolve_batch(batch(json!([
            {"requestId": "req-9", "result": {"missedWorkDays": 7}}
        ])));
        assert_eq!(results.apply(resolved), 0);
        assert!(results.is_empty());
    }

    #[test]
    fn test_apply_is_idempotent() {
        let mut correlator = Correlator::new();
        correlator.register(RequestId::new("req-1"), CalendarId::new("cal-A"));
        correlator.register(RequestId::new("req-2"), CalendarId::new("cal-B"));

        let pushed = batch(json!([
            {"requestId": "req-1", "result": {"missedWorkDays": 3}},
            {"requestId": "req-2", "result": {"missedWorkDays": 4}},
            {"requestId": "req-x", "result": {"missedWorkDays": 5}},
        ]));

        let mut once = ResultByCalendar::new();
        once.apply(correlator.resolve_batch(pushed.clone()));

        let mut twice = ResultByCalendar::new();
        twice.apply(correlator.resolve_batch(pushed.clone()));
        twice.apply(correlator.resolve_batch(pushed));

        assert_eq!(once, twice);
        assert_eq!(
            twice.get(&CalendarId::new("cal-A")),
            Some(&json!({"missedWorkDays": 3}))
        );
    }

    #[test]
    fn test_parse_batch_shapes() {
        assert!(parse_batch("[]").unwrap().is_empty());
        let parsed = parse_batch(r#"[{"requestId":"req-1","result":{"a":1}}]"#).unwrap();
        assert_eq!(parsed[0].request_id.as_str(), "req-1");
        assert!(parse_batch(r#"{"requestId":"req-1"}"#).is_err());
        assert!(parse_batch("not json").is_err());
    }

    #[test]
    fn test_entry_without_result_rejects_batch() {
        assert!(parse_batch(r#"[{"requestId":"req-1"}]"#).is_err());
        assert!(parse_batch(r#"[{"requestId":"req-1","result":{"a":1}},{"requestId":"req-2"}]"#).is_err());
        assert!(parse_batch(r#"[{"result":{"a":1}}]"#).is_err());
    }
}
