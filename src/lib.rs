//! # sigmux
//!
//! **sigmux** multiplexes the signal feed of one message-bus connection to
//! many typed subscriber queues.
//!
//! A bus connection delivers every subscribed signal through a single
//! untyped stream. Proxies, on the other hand, want a typed
//! `mpsc::Receiver<T>` per signal they care about. The crate sits in
//! between: it issues one match rule per distinct (path, member), reconciles
//! each queue's element type with the signal's wire type up front, and runs a
//! single worker that converts and fans out every argument.
//!
//! ## Architecture
//! ### Overview
//! ```text
//!   BusObject::signal / Dispatcher::subscribe::<T>(path, iface, member, wire, tx)
//!        │
//!        ▼
//! ┌───────────────────────────────────────────────────────────────────┐
//! │  Dispatcher (one per connection)                                  │
//! │  - reconcile(T, wire, converter?) → ConversionStrategy            │
//! │  - Registry: RoutingKey → [Sink]   (add_match once per key)       │
//! │  - Bus (diagnostics events)                                       │
//! │  - FanOutWorker (started on first subscribe, never restarted)     │
//! └──────┬─────────────────────────────────────────────▲──────────────┘
//!        │ add_match / remove_match                    │ RawEvent
//!        ▼                                             │
//! ┌───────────────────────────────────────────────────────────────────┐
//! │  BusConnection (transport: LocalBus in tests, real bus otherwise) │
//! └───────────────────────────────────────────────────────────────────┘
//!
//! FanOutWorker:  RawEvent ─► snapshot(key) ─► for value ─► for sink ─► Sink::deliver
//!                                                                         │
//!                                              strategy.apply ─► T ─► tx.send (DeliveryPolicy)
//! ```
//!
//! ### Type reconciliation
//! ```text
//! converter given?  ── yes ─► signature (wire → declared)? ─ no ─► ConverterSignatureMismatch
//!       │ no                          │ yes ─► Custom
//!       ▼
//! wire == declared? ── yes ─► Identity
//!       │ no
//!       ▼
//! builtin exists?   ── yes ─► Builtin (widen / retag / path→string / element-wise)
//!       │ no
//!       ▼
//! TypeIncompatible   (nothing registered, no remote call)
//! ```
//!
//! ## Features
//! | Area              | Description                                                        | Key types                               |
//! |-------------------|--------------------------------------------------------------------|-----------------------------------------|
//! | **Subscriptions** | Typed queues per (path, interface, member) with match-rule dedup.  | [`Dispatcher`], [`BusObject`]           |
//! | **Conversion**    | Identity, built-in and caller-supplied conversions.                | [`SignalValue`], [`Converter`]          |
//! | **Backpressure**  | Block, drop, or bounded wait on a full subscriber queue.           | [`DeliveryPolicy`]                      |
//! | **Diagnostics**   | Broadcast stream of registration and delivery events.              | [`Event`], [`EventKind`]                |
//! | **Transport**     | Seam to the bus; in-process implementation for tests and demos.    | [`BusConnection`], [`LocalBus`]         |
//!
//! ## Optional features
//! - `logging`: exports [`LogWriter`], a simple event printer (demo/reference).
//!
//! ## Example
//! ```rust
//! use std::sync::Arc;
//! use tokio::sync::mpsc;
//! use sigmux::{BusObject, Dispatcher, LocalBus, ObjectPath, RawEvent, Value, ValueType};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let bus = Arc::new(LocalBus::new(16));
//!     let dispatcher = Dispatcher::builder(bus.clone()).build();
//!     let device = BusObject::new(dispatcher.clone(), ObjectPath::new("/devices/0")?);
//!
//!     let (tx_a, mut rx_a) = mpsc::channel::<bool>(4);
//!     let (tx_b, mut rx_b) = mpsc::channel::<bool>(4);
//!     device.signal("com.example.Device", "Ready", ValueType::Bool, tx_a, None).await?;
//!     device.signal("com.example.Device", "Ready", ValueType::Bool, tx_b, None).await?;
//!     assert_eq!(bus.add_match_calls(), 1);
//!
//!     bus.emit(RawEvent::parse("/devices/0", "com.example.Device.Ready", vec![Value::Bool(true)])?)
//!         .await?;
//!     assert_eq!(rx_a.recv().await, Some(true));
//!     assert_eq!(rx_b.recv().await, Some(true));
//!
//!     dispatcher.shutdown().await;
//!     Ok(())
//! }
//! ```

mod connection;
mod convert;
mod core;
mod error;
mod events;
mod policies;
mod proxy;
mod sinks;
mod wire;

// ---- Public re-exports ----

pub use connection::{BusConnection, LocalBus, MatchRule};
pub use convert::{Builtin, ConversionStrategy, Converter, SignalValue, reconcile};
pub use crate::core::{Dispatcher, DispatcherBuilder, DispatcherConfig, Registration};
pub use error::{BusError, ConvertError, DeliveryError, DispatchError};
pub use events::{Bus, Event, EventKind};
pub use policies::DeliveryPolicy;
pub use proxy::BusObject;
pub use sinks::{Sink, SinkId, TypedSink};
pub use wire::{IntRepr, MemberName, ObjectPath, RawEvent, RoutingKey, Value, ValueType};

// Optional: expose a simple built-in event printer (demo/reference).
#[cfg(feature = "logging")]
pub use events::LogWriter;
