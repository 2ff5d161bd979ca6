//! Views owning analysis correlation state
//!
//! A view is mounted with a transport, submits analyses, and folds incoming
//! results into its own `ResultByCalendar`. Nothing is shared between views.

mod calendar;
mod compare;

pub use calendar::CalendarView;
pub use compare::CompareView;
