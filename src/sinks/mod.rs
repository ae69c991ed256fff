//! # Subscriber endpoints.
//!
//! A subscriber is an output queue (`mpsc::Sender<T>`) plus the
//! [`ConversionStrategy`](crate::ConversionStrategy) resolved for it at
//! subscribe time. The registry stores them type-erased as [`Sink`] trait
//! objects; [`TypedSink`] is the only implementation.
//!
//! ## Architecture
//! ```text
//! RawEvent.body[i] ──► Sink::deliver(value, policy)
//!                          │
//!                          ├─► strategy.apply(value)      (identity / builtin / custom)
//!                          ├─► T::from_value(converted)
//!                          └─► tx.send / try_send / send_timeout  (per DeliveryPolicy)
//!                                   │
//!                                   ▼
//!                          proxy-owned mpsc::Receiver<T>
//! ```
//!
//! ## Identity
//! Two sinks are the same subscriber when they feed the same channel
//! (`Sender::same_channel`). Re-subscribing a clone of an already registered
//! sender for the same key is a no-op.

mod sink;
mod typed;

pub use sink::{Sink, SinkId};
pub use typed::TypedSink;
