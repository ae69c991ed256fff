//! # LocalBus: in-memory bus connection.
//!
//! Behaves like a bus daemon seen from one client:
//! - [`LocalBus::emit`] forwards a signal only if an active match rule covers it;
//! - [`LocalBus::inject`] forwards unconditionally (a signal that arrived
//!   through some unrelated rule);
//! - [`LocalBus::close`] cancels the connection token.
//!
//! It also counts `add_match`/`remove_match` calls and can be told to reject
//! them, which is what the dispatcher tests rely on.

use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::connection::{BusConnection, MatchRule};
use crate::error::BusError;
use crate::wire::{RawEvent, RoutingKey};

/// In-memory [`BusConnection`].
#[derive(Debug)]
pub struct LocalBus {
    tx: mpsc::Sender<RawEvent>,
    rx: Mutex<Option<mpsc::Receiver<RawEvent>>>,
    closed: CancellationToken,
    rules: Mutex<HashSet<MatchRule>>,
    rejected: Mutex<HashSet<MatchRule>>,
    reject_remove: AtomicBool,
    add_calls: AtomicUsize,
    remove_calls: AtomicUsize,
}

impl LocalBus {
    /// Creates a bus whose signal feed buffers up to `capacity` events (min 1).
    pub fn new(capacity: usize) -> Self {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        Self {
            tx,
            rx: Mutex::new(Some(rx)),
            closed: CancellationToken::new(),
            rules: Mutex::new(HashSet::new()),
            rejected: Mutex::new(HashSet::new()),
            reject_remove: AtomicBool::new(false),
            add_calls: AtomicUsize::new(0),
            remove_calls: AtomicUsize::new(0),
        }
    }

    /// Sends a signal if an active rule matches it.
    ///
    /// Returns `Ok(false)` if no rule matched and the signal was discarded.
    pub async fn emit(&self, event: RawEvent) -> Result<bool, BusError> {
        let key = event.routing_key();
        if !self.rules.lock().iter().any(|r| r.matches(&key)) {
            return Ok(false);
        }
        self.inject(event).await.map(|()| true)
    }

    /// Sends a signal regardless of active rules.
    pub async fn inject(&self, event: RawEvent) -> Result<(), BusError> {
        if self.closed.is_cancelled() {
            return Err(BusError::Closed);
        }
        self.tx.send(event).await.map_err(|_| BusError::Closed)
    }

    /// Closes the connection.
    pub fn close(&self) {
        self.closed.cancel();
    }

    /// Makes every future `add_match` for `key` fail.
    pub fn reject_add_match_for(&self, key: &RoutingKey) {
        self.rejected.lock().insert(MatchRule::for_key(key));
    }

    /// Lifts a rejection set by [`reject_add_match_for`](Self::reject_add_match_for).
    pub fn accept_add_match_for(&self, key: &RoutingKey) {
        self.rejected.lock().remove(&MatchRule::for_key(key));
    }

    /// Makes `remove_match` fail (`true`) or succeed (`false`).
    pub fn reject_remove_match(&self, reject: bool) {
        self.reject_remove.store(reject, Ordering::SeqCst);
    }

    /// Number of `add_match` calls so far, including rejected ones.
    pub fn add_match_calls(&self) -> usize {
        self.add_calls.load(Ordering::SeqCst)
    }

    /// Number of `remove_match` calls so far, including rejected ones.
    pub fn remove_match_calls(&self) -> usize {
        self.remove_calls.load(Ordering::SeqCst)
    }

    /// Currently active rules, rendered and sorted.
    pub fn active_rules(&self) -> Vec<String> {
        let mut rules: Vec<String> = self.rules.lock().iter().map(ToString::to_string).collect();
        rules.sort_unstable();
        rules
    }
}

impl Default for LocalBus {
    /// Feed capacity of 64.
    fn default() -> Self {
        Self::new(64)
    }
}

#[async_trait]
impl BusConnection for LocalBus {
    async fn add_match(&self, rule: &MatchRule) -> Result<(), BusError> {
        self.add_calls.fetch_add(1, Ordering::SeqCst);
        // A real add_match is a round trip; give other callers a chance to interleave.
        tokio::task::yield_now().await;

        if self.closed.is_cancelled() {
            return Err(BusError::Closed);
        }
        if self.rejected.lock().contains(rule) {
            return Err(BusError::Rejected {
                rule: rule.to_string(),
                reason: "rejected by LocalBus".into(),
            });
        }
        self.rules.lock().insert(rule.clone());
        Ok(())
    }

    async fn remove_match(&self, rule: &MatchRule) -> Result<(), BusError> {
        self.remove_calls.fetch_add(1, Ordering::SeqCst);
        tokio::task::yield_now().await;

        if self.closed.is_cancelled() {
            return Err(BusError::Closed);
        }
        if self.reject_remove.load(Ordering::SeqCst) {
            return Err(BusError::Rejected {
                rule: rule.to_string(),
                reason: "rejected by LocalBus".into(),
            });
        }
        self.rules.lock().remove(rule);
        Ok(())
    }

    fn take_signals(&self) -> Result<mpsc::Receiver<RawEvent>, BusError> {
        if self.closed.is_cancelled() {
            return Err(BusError::Closed);
        }
        self.rx.lock().take().ok_or(BusError::FeedTaken)
    }

    fn closed_token(&self) -> CancellationToken {
        self.closed.clone()
    }

    fn name(&self) -> &str {
        "local"
    }
}
