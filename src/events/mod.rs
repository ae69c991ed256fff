//! Dispatcher diagnostics: event types and broadcast bus.
//!
//! ## Contents
//! - [`EventKind`], [`Event`] event classification and metadata
//! - [`Bus`] thin wrapper over `tokio::sync::broadcast`
//!
//! ## Quick reference
//! - **Publishers**: `Dispatcher` (match/subscriber changes), the fan-out
//!   worker (lifecycle, dropped/failed deliveries, pruning).
//! - **Consumers**: anything holding [`Dispatcher::events`](crate::Dispatcher::events),
//!   e.g. the optional `LogWriter`.
//!
//! These events complement `tracing` output; they are meant for programmatic
//! inspection (tests, health checks).

mod bus;
mod event;
#[cfg(feature = "logging")]
mod log;

pub use bus::Bus;
pub use event::{Event, EventKind};
#[cfg(feature = "logging")]
pub use log::LogWriter;
