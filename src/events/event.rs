//! # Diagnostics events emitted by the dispatcher.
//!
//! The [`EventKind`] enum classifies what happened:
//! - **Worker lifecycle**: the fan-out worker started or stopped
//! - **Registration**: match rules and subscribers added/removed
//! - **Delivery**: a value was dropped (backpressure) or failed (conversion defect)
//!
//! The [`Event`] struct carries the routing key, subscriber id and reason.
//!
//! ## Ordering guarantees
//! Each event has a globally unique sequence number (`seq`) that increases monotonically.
//!
//! ## Example
//! ```rust
//! use sigmux::{Event, EventKind};
//!
//! let ev = Event::new(EventKind::DeliveryDropped)
//!     .with_key("/iface/0:com.example.Iface.Ready")
//!     .with_sink(7)
//!     .with_reason("delivery_full");
//!
//! assert_eq!(ev.kind, EventKind::DeliveryDropped);
//! assert_eq!(ev.sink, Some(7));
//! ```

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use std::time::SystemTime;

use crate::error::DeliveryError;
use crate::sinks::SinkId;
use crate::wire::RoutingKey;

/// Global sequence counter for event ordering.
static EVENT_SEQ: AtomicU64 = AtomicU64::new(0);

/// Classification of dispatcher events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    // === Worker lifecycle ===
    /// The fan-out worker took the signal feed and started.
    WorkerStarted,

    /// The fan-out worker stopped (connection closed, shutdown, or feed ended).
    ///
    /// Sets:
    /// - `reason`: `"connection_closed"`, `"shutdown"` or `"feed_closed"`
    WorkerStopped,

    // === Registration ===
    /// A match rule was issued for a new key.
    ///
    /// Sets:
    /// - `key`: routing key
    MatchAdded,

    /// A match rule was rejected; the subscription was not installed.
    ///
    /// Sets:
    /// - `key`: routing key
    /// - `reason`: bus error
    MatchRejected,

    /// A match rule was withdrawn after its last subscriber left.
    ///
    /// Sets:
    /// - `key`: routing key
    MatchRemoved,

    /// A subscriber was attached to a key.
    ///
    /// Sets:
    /// - `key`: routing key
    /// - `sink`: subscriber id
    /// - `reason`: strategy label (`identity`, `builtin`, `custom`)
    SubscriberAdded,

    /// A subscriber was detached (unsubscribed or its receiver was dropped).
    ///
    /// Sets:
    /// - `key`: routing key
    /// - `sink`: subscriber id
    /// - `reason`: `"unsubscribed"` or `"receiver_dropped"`
    SubscriberRemoved,

    // === Delivery ===
    /// A value was dropped for one subscriber because its queue was full.
    ///
    /// Sets:
    /// - `key`, `sink`
    /// - `reason`: `"delivery_full"` or `"delivery_timeout"`
    DeliveryDropped,

    /// A value could not be converted for one subscriber.
    ///
    /// Sets:
    /// - `key`, `sink`
    /// - `reason`: conversion error message
    DeliveryFailed,
}

/// Dispatcher event with optional metadata.
#[derive(Clone, Debug)]
pub struct Event {
    /// Globally unique, monotonically increasing sequence number.
    pub seq: u64,
    /// Wall-clock timestamp.
    pub at: SystemTime,
    /// Event classification.
    pub kind: EventKind,
    /// Rendered routing key, if applicable.
    pub key: Option<Arc<str>>,
    /// Subscriber id, if applicable.
    pub sink: Option<u64>,
    /// Human-readable reason.
    pub reason: Option<Arc<str>>,
}

impl Event {
    /// Creates a new event of the given kind with current timestamp and next sequence number.
    pub fn new(kind: EventKind) -> Self {
        Self {
            seq: EVENT_SEQ.fetch_add(1, AtomicOrdering::Relaxed),
            at: SystemTime::now(),
            kind,
            key: None,
            sink: None,
            reason: None,
        }
    }

    /// Attaches a routing key.
    #[inline]
    pub fn with_key(mut self, key: impl Into<Arc<str>>) -> Self {
        self.key = Some(key.into());
        self
    }

    /// Attaches a subscriber id.
    #[inline]
    pub fn with_sink(mut self, sink: u64) -> Self {
        self.sink = Some(sink);
        self
    }

    /// Attaches a human-readable reason.
    #[inline]
    pub fn with_reason(mut self, reason: impl Into<Arc<str>>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    /// Creates the event describing a failed or dropped delivery.
    pub(crate) fn delivery(key: &RoutingKey, sink: SinkId, err: &DeliveryError) -> Self {
        let ev = if err.is_backpressure() {
            Event::new(EventKind::DeliveryDropped).with_reason(err.as_label())
        } else {
            Event::new(EventKind::DeliveryFailed).with_reason(err.to_string())
        };
        ev.with_key(key.to_string()).with_sink(sink.get())
    }

    /// True for [`EventKind::DeliveryDropped`] and [`EventKind::DeliveryFailed`].
    #[inline]
    pub fn is_delivery_problem(&self) -> bool {
        matches!(self.kind, EventKind::DeliveryDropped | EventKind::DeliveryFailed)
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{:?}]", self.kind)?;
        if let Some(key) = &self.key {
            write!(f, " key={key}")?;
        }
        if let Some(sink) = self.sink {
            write!(f, " sink={sink}")?;
        }
        if let Some(reason) = &self.reason {
            write!(f, " reason={reason:?}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ConvertError;
    use crate::wire::ValueType;

    #[test]
    fn test_delivery_events_are_classified() {
        let key = RoutingKey::parse("/a", "com.example.Iface.Ready").unwrap();
        let sink = SinkId::next();

        let dropped = Event::delivery(&key, sink, &DeliveryError::Full);
        assert_eq!(dropped.kind, EventKind::DeliveryDropped);
        assert_eq!(dropped.reason.as_deref(), Some("delivery_full"));
        assert!(dropped.is_delivery_problem());

        let drift = DeliveryError::Convert(ConvertError::Mismatch {
            expected: ValueType::Bool,
            actual: ValueType::Str,
        });
        let failed = Event::delivery(&key, sink, &drift);
        assert_eq!(failed.kind, EventKind::DeliveryFailed);
        assert_eq!(failed.sink, Some(sink.get()));
        assert!(failed.is_delivery_problem());

        assert!(!Event::new(EventKind::MatchAdded).is_delivery_problem());
    }
}
