//! Delivery policies.
//!
//! This module groups the knobs that control **what happens** when a
//! subscriber cannot keep up with the signal feed.
//!
//! ## Contents
//! - [`DeliveryPolicy`] block / drop / bounded wait on a full subscriber queue
//!
//! ## Quick wiring
//! ```text
//! DispatcherConfig { delivery: DeliveryPolicy, .. }
//!      └─► core::worker::FanOutWorker passes it to Sink::deliver for every value
//! ```
//!
//! ## Defaults
//! - `DeliveryPolicy::Block`: no value is ever dropped.

mod delivery;

pub use delivery::DeliveryPolicy;
