//! # Delivery policies for subscriber queues.
//!
//! [`DeliveryPolicy`] determines what the fan-out worker does when a
//! subscriber's queue has no free slot.
//!
//! - [`DeliveryPolicy::Block`] wait for a slot (default).
//! - [`DeliveryPolicy::DropWhenFull`] drop the value for that subscriber only.
//! - [`DeliveryPolicy::Timeout`] wait up to a deadline, then drop.
//!
//! ## Choosing the right policy
//!
//! **Every value matters** (state machines fed by change signals):
//! ```text
//! DeliveryPolicy::Block          → no value is lost; one stalled reader
//!                                  stalls delivery to everybody
//! ```
//!
//! **Readers of unknown quality** (UI, optional listeners):
//! ```text
//! DeliveryPolicy::DropWhenFull   → never waits; overflow reported as
//!                                  EventKind::DeliveryDropped
//! DeliveryPolicy::Timeout(d)     → bounded stall of at most `d` per value
//! ```
//!
//! Dropped values are logged at `warn` and published as diagnostics events.

use std::time::Duration;

/// Policy applied when a subscriber queue is full.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DeliveryPolicy {
    /// Wait for queue capacity (default).
    Block,
    /// Drop the value for the full subscriber.
    DropWhenFull,
    /// Wait up to the given duration, then drop.
    Timeout(Duration),
}

impl Default for DeliveryPolicy {
    /// Returns [`DeliveryPolicy::Block`].
    fn default() -> Self {
        DeliveryPolicy::Block
    }
}

impl DeliveryPolicy {
    /// Normalized form: a zero timeout behaves like `DropWhenFull`.
    pub fn normalized(self) -> Self {
        match self {
            DeliveryPolicy::Timeout(d) if d.is_zero() => DeliveryPolicy::DropWhenFull,
            other => other,
        }
    }
}
