//! # Dispatcher configuration.
//!
//! Provides [`DispatcherConfig`] centralized settings for one dispatcher.
//!
//! ## Sentinel values
//! - `events_capacity = 0` → clamped to 1 (diagnostics ring buffer cannot be empty)
//! - `DeliveryPolicy::Timeout(0s)` → behaves like `DropWhenFull`

use crate::policies::DeliveryPolicy;

/// Configuration for a [`Dispatcher`](crate::Dispatcher).
///
/// ## Field semantics
/// - `delivery`: what the worker does when a subscriber queue is full
/// - `withdraw_on_empty`: remove the match rule when a key loses its last subscriber
/// - `prune_closed`: detach subscribers whose receiver was dropped
/// - `events_capacity`: diagnostics bus ring buffer size (min 1)
#[derive(Clone, Debug)]
pub struct DispatcherConfig {
    /// Policy applied on a full subscriber queue.
    ///
    /// Defaults to [`DeliveryPolicy::Block`]: nothing is dropped, a stalled
    /// subscriber stalls the worker.
    pub delivery: DeliveryPolicy,

    /// Withdraw the match rule once a key has no subscribers left.
    ///
    /// With `false` the key stays registered (and the rule active) for the
    /// lifetime of the dispatcher.
    pub withdraw_on_empty: bool,

    /// Detach subscribers whose receiving half was dropped.
    ///
    /// Detection happens lazily, on the first failed delivery.
    pub prune_closed: bool,

    /// Capacity of the diagnostics broadcast channel.
    pub events_capacity: usize,
}

impl DispatcherConfig {
    /// Returns the diagnostics capacity clamped to a minimum of 1.
    #[inline]
    pub fn events_capacity_clamped(&self) -> usize {
        self.events_capacity.max(1)
    }
}

impl Default for DispatcherConfig {
    /// Default configuration:
    ///
    /// - `delivery = DeliveryPolicy::Block`
    /// - `withdraw_on_empty = true`
    /// - `prune_closed = true`
    /// - `events_capacity = 256`
    fn default() -> Self {
        Self {
            delivery: DeliveryPolicy::default(),
            withdraw_on_empty: true,
            prune_closed: true,
            events_capacity: 256,
        }
    }
}
