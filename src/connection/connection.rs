use async_trait::async_trait;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::connection::MatchRule;
use crate::error::BusError;
use crate::wire::RawEvent;

/// Contract the dispatcher needs from a bus connection.
///
/// ### Rules
/// - `add_match` is **not** required to be idempotent; the dispatcher issues
///   it at most once per key while the key is registered.
/// - `take_signals` hands out the single ordered feed of incoming signals;
///   a second call fails with [`BusError::FeedTaken`].
/// - `closed_token` is cancelled when the connection goes away; the fan-out
///   worker stops on it.
#[async_trait]
pub trait BusConnection: Send + Sync + 'static {
    /// Registers interest in the signals described by `rule`.
    async fn add_match(&self, rule: &MatchRule) -> Result<(), BusError>;

    /// Withdraws a previously added rule.
    async fn remove_match(&self, rule: &MatchRule) -> Result<(), BusError>;

    /// Takes the incoming signal feed.
    fn take_signals(&self) -> Result<mpsc::Receiver<RawEvent>, BusError>;

    /// Token cancelled when the connection is closed.
    fn closed_token(&self) -> CancellationToken;

    /// Human-readable name (for logs).
    fn name(&self) -> &str {
        "bus"
    }
}
