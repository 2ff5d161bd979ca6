//! smartask-client library
//!
//! Client for the SmartTask scheduling backend: typed REST wrappers, the
//! analysis-result correlation flow (correlator, broadcast listener,
//! submission), the calendar and compare views that own that flow, and
//! form validation for schedule generation and rule-set editing.

pub mod api;
pub mod correlation;
pub mod error;
pub mod forms;
pub mod holidays;
pub mod submission;
pub mod views;

pub use api::BackendClient;
pub use correlation::{Correlator, ResultByCalendar, SubscriptionListener};
pub use error::{ClientError, FieldErrors, Result};
pub use views::{CalendarView, CompareView};
