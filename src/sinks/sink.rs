//! # Type-erased subscriber contract.

use std::any::Any;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;

use crate::convert::ConversionStrategy;
use crate::error::DeliveryError;
use crate::policies::DeliveryPolicy;
use crate::wire::{Value, ValueType};

static SINK_SEQ: AtomicU64 = AtomicU64::new(1);

/// Process-unique subscriber id (for logs, events and pruning).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SinkId(u64);

impl SinkId {
    pub(crate) fn next() -> Self {
        Self(SINK_SEQ.fetch_add(1, Ordering::Relaxed))
    }

    /// Raw numeric id.
    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for SinkId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "sink#{}", self.0)
    }
}

/// Contract for subscriber endpoints stored in the registry.
///
/// Called from the fan-out worker. `deliver` may wait (depending on the
/// [`DeliveryPolicy`]) but must never block the runtime thread.
#[async_trait]
pub trait Sink: Send + Sync + 'static {
    /// Unique id of this subscriber.
    fn id(&self) -> SinkId;

    /// Declared element type of the output queue.
    fn declared(&self) -> ValueType;

    /// Strategy resolved at subscribe time.
    fn strategy(&self) -> &ConversionStrategy;

    /// True once the receiving side of the queue has been dropped.
    fn is_closed(&self) -> bool;

    /// True if `other` feeds the same output queue as `self`.
    fn same_target(&self, other: &dyn Sink) -> bool;

    /// Upcast used for identity checks.
    fn as_any(&self) -> &dyn Any;

    /// Converts one wire value and hands it to the output queue.
    async fn deliver(&self, value: Value, policy: DeliveryPolicy) -> Result<(), DeliveryError>;
}
