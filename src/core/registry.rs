//! # Subscription registry - routing key → subscribers, with match-rule dedup.
//!
//! ## Architecture
//! ```text
//! Dispatcher::subscribe ──► Registry::subscribe(key, sink)      (write lock)
//!                              ├─► key new?  add_match(rule) ──► Err → nothing inserted
//!                              ├─► insert key → []
//!                              └─► push sink unless same channel already present
//!
//! FanOutWorker ──► Registry::snapshot(key)                      (read lock, cloned Vec)
//!
//! unsubscribe / pruning ──► Registry::remove(key, pred)         (write lock)
//!                              └─► list empty && withdraw_on_empty → remove_match(rule)
//! ```
//!
//! ## Rules
//! - A key is present iff its match rule is currently issued.
//! - `add_match` runs under the write lock, so concurrent subscribes for the
//!   same new key issue exactly one rule.
//! - Snapshots are cloned `Arc`s; delivery never holds the lock.

use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::sync::Arc;

use tokio::sync::RwLock;

use crate::connection::{BusConnection, MatchRule};
use crate::error::DispatchError;
use crate::events::{Bus, Event, EventKind};
use crate::sinks::{Sink, SinkId};
use crate::wire::RoutingKey;

/// Outcome of a successful subscribe.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Registration {
    /// A new subscriber was attached.
    Added(SinkId),
    /// The same queue was already attached to this key; nothing changed.
    AlreadyPresent(SinkId),
}

impl Registration {
    /// Id of the (new or existing) subscriber.
    pub fn sink(&self) -> SinkId {
        match *self {
            Registration::Added(id) | Registration::AlreadyPresent(id) => id,
        }
    }
}

/// Registry of subscribers keyed by routing key.
pub(crate) struct Registry {
    entries: RwLock<HashMap<RoutingKey, Vec<Arc<dyn Sink>>>>,
    conn: Arc<dyn BusConnection>,
    bus: Bus,
    withdraw_on_empty: bool,
}

impl Registry {
    /// Creates an empty registry.
    pub fn new(conn: Arc<dyn BusConnection>, bus: Bus, withdraw_on_empty: bool) -> Arc<Self> {
        Arc::new(Self {
            entries: RwLock::new(HashMap::new()),
            conn,
            bus,
            withdraw_on_empty,
        })
    }

    /// Attaches `sink` to `key`, issuing the match rule if `key` is new.
    pub async fn subscribe(
        &self,
        key: RoutingKey,
        sink: Arc<dyn Sink>,
    ) -> Result<Registration, DispatchError> {
        let label = key.to_string();
        let mut entries = self.entries.write().await;

        let sinks = match entries.entry(key) {
            Entry::Occupied(o) => o.into_mut(),
            Entry::Vacant(v) => {
                let rule = MatchRule::for_key(v.key());
                if let Err(source) = self.conn.add_match(&rule).await {
                    tracing::warn!(key = %label, error = %source, "match rule rejected");
                    self.bus.publish(
                        Event::new(EventKind::MatchRejected)
                            .with_key(label)
                            .with_reason(source.to_string()),
                    );
                    return Err(DispatchError::RegistrationFailed {
                        key: v.into_key(),
                        source,
                    });
                }
                tracing::debug!(key = %label, %rule, "match rule added");
                self.bus
                    .publish(Event::new(EventKind::MatchAdded).with_key(label.as_str()));
                v.insert(Vec::new())
            }
        };

        if let Some(existing) = sinks.iter().find(|s| s.same_target(sink.as_ref())) {
            tracing::trace!(key = %label, sink = %existing.id(), "queue already subscribed");
            return Ok(Registration::AlreadyPresent(existing.id()));
        }

        let id = sink.id();
        let strategy = sink.strategy().as_label();
        tracing::debug!(key = %label, sink = %id, declared = %sink.declared(), strategy, "subscriber added");
        sinks.push(sink);
        self.bus.publish(
            Event::new(EventKind::SubscriberAdded)
                .with_key(label)
                .with_sink(id.get())
                .with_reason(strategy),
        );
        Ok(Registration::Added(id))
    }

    /// Stable snapshot of the subscribers at `key` (empty if none).
    pub async fn snapshot(&self, key: &RoutingKey) -> Vec<Arc<dyn Sink>> {
        self.entries
            .read()
            .await
            .get(key)
            .cloned()
            .unwrap_or_default()
    }

    /// Removes the subscribers at `key` matching `pred`.
    ///
    /// Returns the removed ids. If the key ends up empty and withdrawal is
    /// enabled, the match rule is removed too; a failed withdrawal keeps the
    /// (empty) key and is returned as [`DispatchError::WithdrawFailed`]. The
    /// subscribers are detached either way.
    pub async fn remove<F>(
        &self,
        key: &RoutingKey,
        pred: F,
        reason: &'static str,
    ) -> Result<Vec<SinkId>, DispatchError>
    where
        F: Fn(&dyn Sink) -> bool,
    {
        let mut entries = self.entries.write().await;
        let Some(sinks) = entries.get_mut(key) else {
            return Ok(Vec::new());
        };

        let mut removed = Vec::new();
        sinks.retain(|s| {
            if pred(s.as_ref()) {
                removed.push(s.id());
                false
            } else {
                true
            }
        });

        for id in &removed {
            tracing::debug!(%key, sink = %id, reason, "subscriber removed");
            self.bus.publish(
                Event::new(EventKind::SubscriberRemoved)
                    .with_key(key.to_string())
                    .with_sink(id.get())
                    .with_reason(reason),
            );
        }

        if !sinks.is_empty() || !self.withdraw_on_empty {
            return Ok(removed);
        }

        let rule = MatchRule::for_key(key);
        match self.conn.remove_match(&rule).await {
            Ok(()) => {
                entries.remove(key);
                tracing::debug!(%key, %rule, "match rule withdrawn");
                self.bus
                    .publish(Event::new(EventKind::MatchRemoved).with_key(key.to_string()));
                Ok(removed)
            }
            Err(source) => {
                tracing::warn!(%key, error = %source, "match rule withdrawal failed");
                Err(DispatchError::WithdrawFailed {
                    key: key.clone(),
                    source,
                })
            }
        }
    }

    /// Sorted list of registered keys.
    pub async fn keys(&self) -> Vec<RoutingKey> {
        let mut keys: Vec<RoutingKey> = self.entries.read().await.keys().cloned().collect();
        keys.sort_unstable();
        keys
    }

    /// Number of subscribers at `key`.
    pub async fn subscriber_count(&self, key: &RoutingKey) -> usize {
        self.entries.read().await.get(key).map_or(0, Vec::len)
    }
}
