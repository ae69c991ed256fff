//! Error types used by the dispatcher, the connection seam and delivery.
//!
//! - [`DispatchError`]: returned synchronously from `subscribe`/`unsubscribe`.
//! - [`BusError`]: failures reported by a [`BusConnection`](crate::BusConnection).
//! - [`ConvertError`]: a stored conversion strategy could not be applied.
//! - [`DeliveryError`]: one value could not be handed to one subscriber.
//!
//! The last two never reach callers: the fan-out worker logs them and publishes
//! a diagnostics event, then moves on to the next subscriber.
//!
//! Every type exposes `as_label` (stable snake_case) for logs and metrics.

use thiserror::Error;

use crate::wire::{RoutingKey, ValueType};

/// # Errors surfaced to subscribe/unsubscribe callers.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum DispatchError {
    /// The remote interest registration (add match) failed; nothing was installed.
    #[error("match registration for {key} failed: {source}")]
    RegistrationFailed {
        /// Key whose match rule was rejected.
        key: RoutingKey,
        /// Underlying connection error.
        #[source]
        source: BusError,
    },

    /// Withdrawing the match rule of a now-empty key failed; the key stays registered.
    #[error("match withdrawal for {key} failed: {source}")]
    WithdrawFailed {
        /// Key whose match rule could not be removed.
        key: RoutingKey,
        /// Underlying connection error.
        #[source]
        source: BusError,
    },

    /// The wire type cannot be delivered as the declared element type without a converter.
    #[error("{wire} is not convertible to {declared}")]
    TypeIncompatible {
        /// Runtime type of the signal argument.
        wire: ValueType,
        /// Element type of the subscriber queue.
        declared: ValueType,
    },

    /// A converter was supplied but its signature does not bridge wire → declared.
    #[error("converter {input} -> {output} does not match {wire} -> {declared}")]
    ConverterSignatureMismatch {
        /// Runtime type of the signal argument.
        wire: ValueType,
        /// Element type of the subscriber queue.
        declared: ValueType,
        /// Converter's declared input type.
        input: ValueType,
        /// Converter's declared output type.
        output: ValueType,
    },

    /// Malformed object path.
    #[error("invalid object path {path:?}")]
    InvalidPath {
        /// Offending input.
        path: String,
    },

    /// Malformed interface or member name.
    #[error("invalid member name {member:?}")]
    InvalidMember {
        /// Offending input.
        member: String,
    },

    /// The connection is closed or the dispatcher was shut down.
    #[error("dispatcher closed")]
    Closed,
}

impl DispatchError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    ///
    /// # Example
    /// ```
    /// use sigmux::{DispatchError, ValueType};
    ///
    /// let err = DispatchError::TypeIncompatible { wire: ValueType::Str, declared: ValueType::Bool };
    /// assert_eq!(err.as_label(), "type_incompatible");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            DispatchError::RegistrationFailed { .. } => "registration_failed",
            DispatchError::WithdrawFailed { .. } => "withdraw_failed",
            DispatchError::TypeIncompatible { .. } => "type_incompatible",
            DispatchError::ConverterSignatureMismatch { .. } => "converter_signature_mismatch",
            DispatchError::InvalidPath { .. } => "invalid_path",
            DispatchError::InvalidMember { .. } => "invalid_member",
            DispatchError::Closed => "dispatcher_closed",
        }
    }
}

/// # Errors reported by a bus connection.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BusError {
    /// Connection is closed.
    #[error("bus connection closed")]
    Closed,

    /// The signal feed was already handed to another reader.
    #[error("signal feed already taken")]
    FeedTaken,

    /// The bus refused the match rule.
    #[error("match rule {rule:?} rejected: {reason}")]
    Rejected {
        /// Rendered match rule.
        rule: String,
        /// Reason given by the bus.
        reason: String,
    },

    /// Any other transport-level failure.
    #[error("bus transport error: {0}")]
    Transport(String),
}

impl BusError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            BusError::Closed => "bus_closed",
            BusError::FeedTaken => "bus_feed_taken",
            BusError::Rejected { .. } => "bus_rejected",
            BusError::Transport(_) => "bus_transport",
        }
    }
}

/// # A stored conversion strategy could not be applied to a value.
///
/// Subscribe-time reconciliation makes these defects, not expected outcomes.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConvertError {
    /// The value's runtime type drifted from the type checked at subscribe time.
    #[error("expected {expected}, got {actual}")]
    Mismatch {
        /// Type the strategy was built for.
        expected: ValueType,
        /// Type actually received.
        actual: ValueType,
    },

    /// The converted value could not be decoded into the subscriber's element type.
    #[error("cannot decode {actual} as {target}")]
    Decode {
        /// Subscriber element type.
        target: ValueType,
        /// Type of the converted value.
        actual: ValueType,
    },

    /// A user converter returned no value.
    #[error("converter {input} -> {output} rejected the value")]
    Rejected {
        /// Converter input type.
        input: ValueType,
        /// Converter output type.
        output: ValueType,
    },

    /// A user converter panicked.
    #[error("converter panicked: {info}")]
    Panicked {
        /// Panic payload, if it was a string.
        info: String,
    },
}

impl ConvertError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            ConvertError::Mismatch { .. } => "convert_mismatch",
            ConvertError::Decode { .. } => "convert_decode",
            ConvertError::Rejected { .. } => "convert_rejected",
            ConvertError::Panicked { .. } => "convert_panicked",
        }
    }
}

/// # One value could not be delivered to one subscriber.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DeliveryError {
    /// Conversion failed.
    #[error(transparent)]
    Convert(#[from] ConvertError),

    /// Queue full under [`DeliveryPolicy::DropWhenFull`](crate::DeliveryPolicy::DropWhenFull).
    #[error("subscriber queue full")]
    Full,

    /// Queue stayed full for the whole [`DeliveryPolicy::Timeout`](crate::DeliveryPolicy::Timeout).
    #[error("subscriber queue send timed out")]
    Timeout,

    /// Receiver was dropped.
    #[error("subscriber queue closed")]
    Closed,
}

impl DeliveryError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            DeliveryError::Convert(e) => e.as_label(),
            DeliveryError::Full => "delivery_full",
            DeliveryError::Timeout => "delivery_timeout",
            DeliveryError::Closed => "delivery_closed",
        }
    }

    /// True if the value was dropped because of backpressure rather than a defect.
    pub fn is_backpressure(&self) -> bool {
        matches!(self, DeliveryError::Full | DeliveryError::Timeout)
    }
}
