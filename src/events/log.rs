//! # LogWriter: simple diagnostics printer
//!
//! Drains a dispatcher's event stream and prints one line per event.
//! Use it for tests or demos.
//!
//! ## Example output
//! ```text
//! [worker-started]
//! [match-added] key=/iface/0:com.example.Iface.Ready
//! [subscriber-added] key=/iface/0:com.example.Iface.Ready sink=1 strategy=identity
//! [dropped] key=/iface/0:com.example.Iface.Ready sink=1 reason=delivery_full
//! [worker-stopped] reason=shutdown
//! ```

use tokio::sync::broadcast;
use tokio::task::JoinHandle;

use crate::events::{Event, EventKind};

/// Event printer.
#[derive(Default)]
pub struct LogWriter;

impl LogWriter {
    /// Construct a new [`LogWriter`].
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Renders one event as a log line.
    pub fn line(&self, e: &Event) -> String {
        let key = e.key.as_deref().unwrap_or("-");
        let sink = e.sink.unwrap_or_default();
        let reason = e.reason.as_deref().unwrap_or("unknown");
        match e.kind {
            EventKind::WorkerStarted => "[worker-started]".to_string(),
            EventKind::WorkerStopped => format!("[worker-stopped] reason={reason}"),
            EventKind::MatchAdded => format!("[match-added] key={key}"),
            EventKind::MatchRejected => format!("[match-rejected] key={key} err={reason:?}"),
            EventKind::MatchRemoved => format!("[match-removed] key={key}"),
            EventKind::SubscriberAdded => {
                format!("[subscriber-added] key={key} sink={sink} strategy={reason}")
            }
            EventKind::SubscriberRemoved => {
                format!("[subscriber-removed] key={key} sink={sink} reason={reason}")
            }
            EventKind::DeliveryDropped => format!("[dropped] key={key} sink={sink} reason={reason}"),
            EventKind::DeliveryFailed => format!("[failed] key={key} sink={sink} err={reason:?}"),
        }
    }

    /// Prints every event from `rx` until the bus is gone.
    pub fn spawn(self, mut rx: broadcast::Receiver<Event>) -> JoinHandle<()> {
        tokio::spawn(async move {
            loop {
                match rx.recv().await {
                    Ok(e) => println!("{}", self.line(&e)),
                    Err(broadcast::error::RecvError::Lagged(n)) => println!("[lagged] skipped={n}"),
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        })
    }
}
