//! # FanOutWorker: the single reader of the signal feed.
//!
//! ## Event flow
//! ```text
//! feed.recv() ─► RawEvent { path, member, body }
//!                   │
//!                   ├─► key = (path, member)
//!                   ├─► sinks = registry.snapshot(key)          (empty → no-op)
//!                   └─► for value in body:                      (payload order)
//!                         for sink in sinks:                    (unspecified order)
//!                           sink.deliver(value, policy)
//!                             ├─ Ok
//!                             ├─ Closed        → prune after the event
//!                             ├─ Full/Timeout  → warn + DeliveryDropped
//!                             ├─ Convert error → error + DeliveryFailed
//!                             └─ panic         → error + DeliveryFailed
//! ```
//!
//! ## Rules
//! - Started at most once per dispatcher; never restarted.
//! - Stops when the connection closes, the dispatcher shuts down, or the feed ends.
//! - A failed delivery only affects that value for that subscriber.
//! - Cancellation is honoured while waiting on a full queue.

use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures::FutureExt;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::core::registry::Registry;
use crate::error::{ConvertError, DeliveryError};
use crate::events::{Bus, Event, EventKind};
use crate::policies::DeliveryPolicy;
use crate::sinks::SinkId;
use crate::wire::{RawEvent, RoutingKey};

/// Parameters the worker needs from the dispatcher.
pub(crate) struct FanOutWorker {
    pub registry: Arc<Registry>,
    pub bus: Bus,
    pub policy: DeliveryPolicy,
    pub prune_closed: bool,
}

/// Why the loop ended.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum StopReason {
    ConnectionClosed,
    Shutdown,
    FeedClosed,
}

impl StopReason {
    fn as_label(self) -> &'static str {
        match self {
            StopReason::ConnectionClosed => "connection_closed",
            StopReason::Shutdown => "shutdown",
            StopReason::FeedClosed => "feed_closed",
        }
    }
}

impl FanOutWorker {
    /// Spawns the worker loop.
    ///
    /// `stop` must be a child of `closed` so that both a closed connection
    /// and an explicit shutdown end the loop.
    pub fn spawn(
        self,
        feed: mpsc::Receiver<RawEvent>,
        closed: CancellationToken,
        stop: CancellationToken,
    ) -> JoinHandle<()> {
        tokio::spawn(self.run(feed, closed, stop))
    }

    async fn run(
        self,
        mut feed: mpsc::Receiver<RawEvent>,
        closed: CancellationToken,
        stop: CancellationToken,
    ) {
        tracing::debug!(policy = ?self.policy, "fan-out worker started");
        self.bus.publish(Event::new(EventKind::WorkerStarted));

        let reason = loop {
            let next = tokio::select! {
                biased;
                _ = stop.cancelled() => None,
                ev = feed.recv() => Some(ev),
            };
            match next {
                None => break Self::cancel_reason(&closed),
                Some(None) => break StopReason::FeedClosed,
                Some(Some(ev)) => {
                    if !self.dispatch(ev, &stop).await {
                        break Self::cancel_reason(&closed);
                    }
                }
            }
        };

        tracing::debug!(reason = reason.as_label(), "fan-out worker stopped");
        self.bus
            .publish(Event::new(EventKind::WorkerStopped).with_reason(reason.as_label()));
    }

    fn cancel_reason(closed: &CancellationToken) -> StopReason {
        if closed.is_cancelled() {
            StopReason::ConnectionClosed
        } else {
            StopReason::Shutdown
        }
    }

    /// Delivers one event. Returns `false` if cancelled mid-way.
    async fn dispatch(&self, ev: RawEvent, stop: &CancellationToken) -> bool {
        let key = ev.routing_key();
        let sinks = self.registry.snapshot(&key).await;
        if sinks.is_empty() {
            tracing::trace!(%key, "no subscribers for signal");
            return true;
        }
        tracing::trace!(%key, values = ev.body.len(), subscribers = sinks.len(), "dispatching signal");

        let mut closed: Vec<SinkId> = Vec::new();
        for value in ev.body {
            for sink in &sinks {
                let id = sink.id();
                if closed.contains(&id) {
                    continue;
                }

                let fut = AssertUnwindSafe(sink.deliver(value.clone(), self.policy)).catch_unwind();
                let outcome = tokio::select! {
                    biased;
                    _ = stop.cancelled() => return false,
                    outcome = fut => outcome,
                };

                match outcome {
                    Ok(Ok(())) => {}
                    Ok(Err(DeliveryError::Closed)) => {
                        tracing::debug!(%key, sink = %id, "subscriber queue closed");
                        closed.push(id);
                    }
                    Ok(Err(err)) => self.report(&key, id, &err),
                    Err(panic_err) => {
                        let info = panic_message(&*panic_err);
                        self.report(&key, id, &DeliveryError::Convert(ConvertError::Panicked { info }));
                    }
                }
            }
        }

        if self.prune_closed && !closed.is_empty() {
            self.prune(&key, &closed).await;
        }
        true
    }

    fn report(&self, key: &RoutingKey, id: SinkId, err: &DeliveryError) {
        if err.is_backpressure() {
            tracing::warn!(%key, sink = %id, reason = err.as_label(), "value dropped for subscriber");
        } else {
            tracing::error!(%key, sink = %id, error = %err, "value could not be delivered");
        }
        self.bus.publish(Event::delivery(key, id, err));
    }

    async fn prune(&self, key: &RoutingKey, ids: &[SinkId]) {
        let res = self
            .registry
            .remove(key, |s| ids.contains(&s.id()), "receiver_dropped")
            .await;
        if let Err(err) = res {
            tracing::warn!(%key, error = %err, "pruning closed subscribers left the match rule active");
        }
    }
}

fn panic_message(any: &(dyn std::any::Any + Send)) -> String {
    if let Some(msg) = any.downcast_ref::<&'static str>() {
        (*msg).to_string()
    } else if let Some(msg) = any.downcast_ref::<String>() {
        msg.clone()
    } else {
        "unknown panic".to_string()
    }
}
