//! # Rust element types that can sit at the end of a subscriber queue.
//!
//! [`SignalValue`] ties a Rust type to the [`ValueType`] it declares and to the
//! decoding from an untyped [`Value`]. Implementations are provided for the
//! basic bus types; enumerations implement it themselves.
//!
//! ## Example: a state enumeration
//! ```rust
//! use sigmux::{IntRepr, SignalValue, Value, ValueType};
//!
//! #[derive(Debug, PartialEq)]
//! enum State { Unknown = 0, Asleep = 10, Connected = 70 }
//!
//! impl SignalValue for State {
//!     fn value_type() -> ValueType {
//!         ValueType::Enum { name: "State", repr: IntRepr::U32 }
//!     }
//!     fn from_value(value: Value) -> Option<Self> {
//!         match value.as_unsigned()? {
//!             0 => Some(State::Unknown),
//!             10 => Some(State::Asleep),
//!             70 => Some(State::Connected),
//!             _ => None,
//!         }
//!     }
//!     fn into_value(self) -> Value {
//!         Value::Uint32(self as u32)
//!     }
//! }
//!
//! assert_eq!(State::from_value(Value::Uint32(70)), Some(State::Connected));
//! ```

use crate::wire::{ObjectPath, Value, ValueType};

/// A Rust type deliverable through a subscriber queue.
pub trait SignalValue: Send + Sized + 'static {
    /// Declared element type.
    fn value_type() -> ValueType;

    /// Decodes an already converted value; `None` if the shape does not fit.
    fn from_value(value: Value) -> Option<Self>;

    /// Encodes back into an untyped value (used by converters).
    fn into_value(self) -> Value;
}

macro_rules! basic_signal_value {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(
            impl SignalValue for $ty {
                fn value_type() -> ValueType {
                    ValueType::$variant
                }

                fn from_value(value: Value) -> Option<Self> {
                    match value {
                        Value::$variant(v) => Some(v),
                        _ => None,
                    }
                }

                fn into_value(self) -> Value {
                    Value::$variant(self)
                }
            }
        )*
    };
}

basic_signal_value! {
    bool => Bool,
    u8 => Byte,
    i16 => Int16,
    u16 => Uint16,
    i32 => Int32,
    u32 => Uint32,
    i64 => Int64,
    u64 => Uint64,
    f64 => Double,
    String => Str,
    ObjectPath => ObjectPath,
}

impl<T: SignalValue> SignalValue for Vec<T> {
    fn value_type() -> ValueType {
        ValueType::array_of(T::value_type())
    }

    fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Array(_, items) => items.into_iter().map(T::from_value).collect(),
            _ => None,
        }
    }

    fn into_value(self) -> Value {
        Value::Array(
            T::value_type(),
            self.into_iter().map(SignalValue::into_value).collect(),
        )
    }
}
