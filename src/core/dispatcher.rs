//! # Dispatcher: composition root for signal subscriptions.
//!
//! The [`Dispatcher`] owns the subscription registry, the diagnostics bus and
//! the single fan-out worker of one bus connection. Proxies receive it as an
//! `Arc<Dispatcher>`; there is no process-wide instance.
//!
//! ## High-level architecture
//! ```text
//! subscribe::<T>(path, iface, member, wire, tx, converter?)
//!   ├─► validate names                        → InvalidPath / InvalidMember
//!   ├─► reconcile(T::value_type(), wire, conv) → TypeIncompatible / ConverterSignatureMismatch
//!   ├─► ensure_worker()                        (first call only: take feed, spawn worker)
//!   └─► registry.subscribe(key, TypedSink<T>)  → RegistrationFailed
//!
//! BusConnection feed ──► FanOutWorker ──► registry.snapshot(key) ──► TypedSink::deliver
//!                                                                       └─► proxy's mpsc::Receiver<T>
//!
//! Shutdown path:
//!   connection closed_token ─┐
//!                            ├─► stop token (child) ─► worker exits, WorkerStopped
//!   Dispatcher::shutdown() ──┘
//! ```
//!
//! ## Example
//! ```rust
//! use std::sync::Arc;
//! use tokio::sync::mpsc;
//! use sigmux::{Dispatcher, LocalBus, ObjectPath, RawEvent, Value, ValueType};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let bus = Arc::new(LocalBus::new(16));
//!     let dispatcher = Dispatcher::builder(bus.clone()).build();
//!
//!     let (tx, mut rx) = mpsc::channel::<bool>(8);
//!     let path = ObjectPath::new("/iface/0")?;
//!     dispatcher
//!         .subscribe(&path, "com.example.Iface", "Ready", ValueType::Bool, tx, None)
//!         .await?;
//!
//!     bus.emit(RawEvent::parse("/iface/0", "com.example.Iface.Ready", vec![Value::Bool(true)])?)
//!         .await?;
//!     assert_eq!(rx.recv().await, Some(true));
//!
//!     dispatcher.shutdown().await;
//!     Ok(())
//! }
//! ```

use std::sync::Arc;

use tokio::sync::{Mutex, broadcast, mpsc};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::connection::BusConnection;
use crate::convert::{Converter, SignalValue, reconcile};
use crate::core::builder::DispatcherBuilder;
use crate::core::config::DispatcherConfig;
use crate::core::registry::{Registration, Registry};
use crate::core::worker::FanOutWorker;
use crate::error::{BusError, DispatchError};
use crate::events::{Bus, Event};
use crate::sinks::{Sink, TypedSink};
use crate::wire::{MemberName, ObjectPath, RoutingKey, ValueType};

/// Lifecycle of the fan-out worker.
enum WorkerState {
    /// Not started yet; the feed is still with the connection.
    Idle,
    /// Running (or finished on its own, see `JoinHandle::is_finished`).
    Running(JoinHandle<()>),
    /// Joined after shutdown.
    Stopped,
}

/// Multiplexes one connection's signal feed to typed subscriber queues.
pub struct Dispatcher {
    cfg: DispatcherConfig,
    conn: Arc<dyn BusConnection>,
    registry: Arc<Registry>,
    bus: Bus,
    closed: CancellationToken,
    stop: CancellationToken,
    worker: Mutex<WorkerState>,
}

impl Dispatcher {
    /// Returns a builder for a dispatcher over `conn`.
    pub fn builder(conn: Arc<dyn BusConnection>) -> DispatcherBuilder {
        DispatcherBuilder::new(conn)
    }

    pub(crate) fn new_internal(cfg: DispatcherConfig, conn: Arc<dyn BusConnection>) -> Self {
        let bus = Bus::new(cfg.events_capacity_clamped());
        let registry = Registry::new(Arc::clone(&conn), bus.clone(), cfg.withdraw_on_empty);
        let closed = conn.closed_token();
        let stop = closed.child_token();
        Self {
            cfg,
            conn,
            registry,
            bus,
            closed,
            stop,
            worker: Mutex::new(WorkerState::Idle),
        }
    }

    /// Subscribes `tx` to the signal `interface.member` emitted at `path`.
    ///
    /// `wire` is the type of the signal arguments as sent by the service.
    /// Every argument of every matching signal is converted to `T` and sent
    /// to `tx`, in order.
    ///
    /// ### Errors
    /// - [`DispatchError::InvalidMember`]: malformed interface or member
    /// - [`DispatchError::Closed`]: connection closed or dispatcher shut down
    /// - [`DispatchError::ConverterSignatureMismatch`], [`DispatchError::TypeIncompatible`]:
    ///   rejected before any remote call
    /// - [`DispatchError::RegistrationFailed`]: the match rule was refused
    ///
    /// Subscribing the same channel twice to the same key is not an error
    /// ([`Registration::AlreadyPresent`]).
    pub async fn subscribe<T: SignalValue>(
        &self,
        path: &ObjectPath,
        interface: &str,
        member: &str,
        wire: ValueType,
        tx: mpsc::Sender<T>,
        converter: Option<Converter>,
    ) -> Result<Registration, DispatchError> {
        let key = RoutingKey::new(path.clone(), MemberName::new(interface, member)?);
        self.subscribe_key(key, wire, tx, converter).await
    }

    /// Same as [`subscribe`](Self::subscribe) with a prebuilt key.
    pub async fn subscribe_key<T: SignalValue>(
        &self,
        key: RoutingKey,
        wire: ValueType,
        tx: mpsc::Sender<T>,
        converter: Option<Converter>,
    ) -> Result<Registration, DispatchError> {
        if self.stop.is_cancelled() {
            return Err(DispatchError::Closed);
        }

        let strategy = reconcile(&T::value_type(), &wire, converter).inspect_err(|err| {
            tracing::debug!(%key, error = %err, "subscription rejected");
        })?;

        self.ensure_worker(&key).await?;

        let sink: Arc<dyn Sink> = Arc::new(TypedSink::new(tx, strategy));
        self.registry.subscribe(key, sink).await
    }

    /// Detaches `tx` from `interface.member` at `path`.
    ///
    /// Returns `false` if `tx` was not subscribed there. When the key loses
    /// its last subscriber and `withdraw_on_empty` is set, the match rule is
    /// removed; if that fails, `tx` is still detached and
    /// [`DispatchError::WithdrawFailed`] is returned.
    pub async fn unsubscribe<T: SignalValue>(
        &self,
        path: &ObjectPath,
        interface: &str,
        member: &str,
        tx: &mpsc::Sender<T>,
    ) -> Result<bool, DispatchError> {
        let key = RoutingKey::new(path.clone(), MemberName::new(interface, member)?);
        let removed = self
            .registry
            .remove(&key, |s| TypedSink::feeds(s, tx), "unsubscribed")
            .await?;
        Ok(!removed.is_empty())
    }

    /// Starts the worker on first use; exactly once per dispatcher.
    async fn ensure_worker(&self, key: &RoutingKey) -> Result<(), DispatchError> {
        let mut state = self.worker.lock().await;
        match &*state {
            WorkerState::Running(handle) if handle.is_finished() => return Err(DispatchError::Closed),
            WorkerState::Running(_) => return Ok(()),
            WorkerState::Stopped => return Err(DispatchError::Closed),
            WorkerState::Idle => {}
        }

        let feed = self.conn.take_signals().map_err(|source| match source {
            BusError::Closed => DispatchError::Closed,
            source => DispatchError::RegistrationFailed {
                key: key.clone(),
                source,
            },
        })?;

        let worker = FanOutWorker {
            registry: Arc::clone(&self.registry),
            bus: self.bus.clone(),
            policy: self.cfg.delivery,
            prune_closed: self.cfg.prune_closed,
        };
        tracing::debug!(connection = self.conn.name(), "starting fan-out worker");
        *state = WorkerState::Running(worker.spawn(feed, self.closed.clone(), self.stop.clone()));
        Ok(())
    }

    /// Stops the worker and waits for it to exit.
    ///
    /// Subsequent `subscribe` calls fail with [`DispatchError::Closed`].
    /// Registered match rules are left to the connection's lifetime.
    pub async fn shutdown(&self) {
        self.stop.cancel();
        let prev = std::mem::replace(&mut *self.worker.lock().await, WorkerState::Stopped);
        if let WorkerState::Running(handle) = prev {
            if let Err(err) = handle.await {
                tracing::error!(error = %err, "fan-out worker panicked");
            }
        }
    }

    /// True while the fan-out worker is running.
    pub async fn is_running(&self) -> bool {
        matches!(&*self.worker.lock().await, WorkerState::Running(h) if !h.is_finished())
    }

    /// Receiver for diagnostics events published after this call.
    pub fn events(&self) -> broadcast::Receiver<Event> {
        self.bus.subscribe()
    }

    /// Sorted list of keys with an active match rule.
    pub async fn keys(&self) -> Vec<RoutingKey> {
        self.registry.keys().await
    }

    /// Number of subscribers attached to `key`.
    pub async fn subscriber_count(&self, key: &RoutingKey) -> usize {
        self.registry.subscriber_count(key).await
    }

    /// Dispatcher configuration.
    pub fn config(&self) -> &DispatcherConfig {
        &self.cfg
    }
}

impl Drop for Dispatcher {
    fn drop(&mut self) {
        self.stop.cancel();
    }
}
