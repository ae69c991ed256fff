//! # Proxy-side helpers.
//!
//! [`BusObject`] binds a dispatcher to one object path so generated proxies
//! can subscribe by interface and member name only.
//!
//! ## Example
//! ```rust
//! use std::sync::Arc;
//! use tokio::sync::mpsc;
//! use sigmux::{BusObject, Dispatcher, IntRepr, LocalBus, ObjectPath, RawEvent, SignalValue, Value, ValueType};
//!
//! #[derive(Debug, PartialEq)]
//! enum State { Idle, Busy, Failed }
//!
//! impl SignalValue for State {
//!     fn value_type() -> ValueType { ValueType::Enum { name: "State", repr: IntRepr::U32 } }
//!     fn from_value(v: Value) -> Option<Self> {
//!         match v.as_unsigned()? { 0 => Some(State::Idle), 1 => Some(State::Busy), 2 => Some(State::Failed), _ => None }
//!     }
//!     fn into_value(self) -> Value { Value::Uint32(self as u32) }
//! }
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let bus = Arc::new(LocalBus::new(16));
//!     let obj = BusObject::new(Dispatcher::builder(bus.clone()).build(), ObjectPath::new("/jobs/1")?);
//!
//!     let (tx, mut rx) = mpsc::channel::<State>(4);
//!     obj.uint_signal("com.example.Job", "StateChanged", tx).await?;
//!
//!     bus.emit(RawEvent::parse("/jobs/1", "com.example.Job.StateChanged", vec![Value::Uint32(2)])?)
//!         .await?;
//!     assert_eq!(rx.recv().await, Some(State::Failed));
//!     Ok(())
//! }
//! ```

use std::sync::Arc;

use tokio::sync::mpsc;

use crate::convert::{Converter, SignalValue};
use crate::core::{Dispatcher, Registration};
use crate::error::DispatchError;
use crate::wire::{ObjectPath, ValueType};

/// A remote object: a dispatcher plus the object path signals come from.
#[derive(Clone)]
pub struct BusObject {
    dispatcher: Arc<Dispatcher>,
    path: ObjectPath,
}

impl BusObject {
    /// Binds `dispatcher` to the object at `path`.
    pub fn new(dispatcher: Arc<Dispatcher>, path: ObjectPath) -> Self {
        Self { dispatcher, path }
    }

    /// Object path signals are subscribed at.
    pub fn path(&self) -> &ObjectPath {
        &self.path
    }

    /// Dispatcher shared with other objects on the same connection.
    pub fn dispatcher(&self) -> &Arc<Dispatcher> {
        &self.dispatcher
    }

    /// Subscribes `tx` to `interface.member` on this object.
    ///
    /// The queue's element type must be compatible with `wire`; see
    /// [`Dispatcher::subscribe`].
    pub async fn signal<T: SignalValue>(
        &self,
        interface: &str,
        member: &str,
        wire: ValueType,
        tx: mpsc::Sender<T>,
        converter: Option<Converter>,
    ) -> Result<Registration, DispatchError> {
        self.dispatcher
            .subscribe(&self.path, interface, member, wire, tx, converter)
            .await
    }

    /// Subscribes `tx` to a signal whose arguments are sent as `uint32`.
    ///
    /// This is the usual wire form of enumerations; any queue type that
    /// reconciles with `uint32` (the integer itself, a wider integer, or an
    /// enum over `u32`) is accepted.
    pub async fn uint_signal<T: SignalValue>(
        &self,
        interface: &str,
        member: &str,
        tx: mpsc::Sender<T>,
    ) -> Result<Registration, DispatchError> {
        self.signal(interface, member, ValueType::Uint32, tx, None).await
    }

    /// Detaches `tx` from `interface.member` on this object.
    pub async fn unsubscribe<T: SignalValue>(
        &self,
        interface: &str,
        member: &str,
        tx: &mpsc::Sender<T>,
    ) -> Result<bool, DispatchError> {
        self.dispatcher
            .unsubscribe(&self.path, interface, member, tx)
            .await
    }
}
