//! # Bus connection seam.
//!
//! The dispatcher never talks to a socket. Everything it needs from the
//! transport is captured by [`BusConnection`]:
//!
//! ```text
//!  Dispatcher ── add_match / remove_match ──► BusConnection ──► bus daemon
//!      ▲                                          │
//!      └──────── take_signals(): one feed ◄───────┘
//!               closed_token(): shutdown
//! ```
//!
//! [`LocalBus`] is an in-memory implementation for tests and for wiring the
//! dispatcher to a transport that already produces [`RawEvent`](crate::RawEvent)s.

mod connection;
mod local;
mod match_rule;

pub use connection::BusConnection;
pub use local::LocalBus;
pub use match_rule::MatchRule;
