//! Dispatch core: registry, fan-out worker and the public façade.
//!
//! The only entry points from this module are [`Dispatcher`] and its
//! [`DispatcherBuilder`].
//!
//! Internal modules:
//! - [`registry`]: routing key → subscribers, issues and withdraws match rules;
//! - [`worker`]: the single task reading the connection feed and fanning out;
//! - [`dispatcher`]: validation, type reconciliation and worker lifecycle.

mod builder;
mod config;
mod dispatcher;
mod registry;
mod worker;

pub use builder::DispatcherBuilder;
pub use config::DispatcherConfig;
pub use dispatcher::Dispatcher;
pub use registry::Registration;
