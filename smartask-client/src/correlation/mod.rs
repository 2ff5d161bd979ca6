//! Analysis result correlation
//!
//! Analyses are submitted over HTTP and answered asynchronously on a shared
//! broadcast topic. This module pairs each answer with the calendar it was
//! requested for.

mod correlator;
pub mod listener;
pub mod transport;

pub use correlator::{
    parse_batch, BatchEntry, Correlator, ResolvedEntry, ResultBatch, ResultByCalendar,
};
pub use listener::SubscriptionListener;
pub use transport::{BroadcastTransport, ChannelTransport, SseTransport, TransportError};
