//! # SmartTask Common Library
//!
//! Shared code for the SmartTask manager client including:
//! - Opaque identifiers (request ids, calendar ids)
//! - Backend payload models (schedules, tasks, rule sets, templates, roster)
//! - KPI metric records and the report/comparison display policy
//! - Schedule grid handling (CSV, cell abbreviation, month slicing)
//! - Configuration loading
//! - Client event bus

pub mod config;
pub mod error;
pub mod events;
pub mod grid;
pub mod ids;
pub mod metrics;
pub mod models;

pub use error::{Error, Result};
pub use ids::{CalendarId, RequestId};
