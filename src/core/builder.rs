use std::sync::Arc;

use crate::{connection::BusConnection, core::DispatcherConfig, policies::DeliveryPolicy};

use super::dispatcher::Dispatcher;

/// Builder for constructing a [`Dispatcher`] over one connection.
pub struct DispatcherBuilder {
    conn: Arc<dyn BusConnection>,
    cfg: DispatcherConfig,
}

impl DispatcherBuilder {
    /// Creates a builder with the default configuration.
    pub fn new(conn: Arc<dyn BusConnection>) -> Self {
        Self {
            conn,
            cfg: DispatcherConfig::default(),
        }
    }

    /// Replaces the whole configuration.
    pub fn with_config(mut self, cfg: DispatcherConfig) -> Self {
        self.cfg = cfg;
        self
    }

    /// Sets the policy applied when a subscriber queue is full.
    pub fn with_delivery(mut self, policy: DeliveryPolicy) -> Self {
        self.cfg.delivery = policy;
        self
    }

    /// Keeps match rules active after their last subscriber leaves.
    pub fn keep_rules(mut self) -> Self {
        self.cfg.withdraw_on_empty = false;
        self
    }

    /// Builds the dispatcher.
    ///
    /// Nothing is spawned here: the fan-out worker starts on the first
    /// successful subscription.
    pub fn build(self) -> Arc<Dispatcher> {
        Arc::new(Dispatcher::new_internal(self.cfg, self.conn))
    }
}
