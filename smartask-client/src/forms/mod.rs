//! Form validation
//!
//! Validation runs before any request is sent. Failures are returned as a
//! field -> message map so a front end can show them next to each input.

pub mod generation;
pub mod ruleset;

pub use generation::GenerationForm;
pub use ruleset::{RuleCatalog, RuleDraft, RuleSetDraft};
