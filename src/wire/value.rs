//! # Payload values and their runtime types.
//!
//! [`Value`] is the untyped form of one signal argument as the connection
//! hands it over; [`ValueType`] describes it. `ValueType` also describes the
//! element type a subscriber *declares*, which is why it has an
//! [`ValueType::Enum`] variant that never occurs on the wire: an enumeration
//! is carried as an unsigned integer of its [`IntRepr`] width and only gets
//! its name on the receiving side.
//!
//! ## Signatures
//! | ValueType      | signature |
//! |----------------|-----------|
//! | `Bool`         | `b`       |
//! | `Byte`         | `y`       |
//! | `Int16`        | `n`       |
//! | `Uint16`       | `q`       |
//! | `Int32`        | `i`       |
//! | `Uint32`       | `u`       |
//! | `Int64`        | `x`       |
//! | `Uint64`       | `t`       |
//! | `Double`       | `d`       |
//! | `Str`          | `s`       |
//! | `ObjectPath`   | `o`       |
//! | `Array(T)`     | `a` + T   |
//! | `Enum{repr}`   | repr      |

use std::fmt;

use crate::wire::ObjectPath;

/// Unsigned integer width backing an enumeration.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum IntRepr {
    U8,
    U16,
    U32,
    U64,
}

impl IntRepr {
    /// The wire type carrying this representation.
    pub fn wire_type(self) -> ValueType {
        match self {
            IntRepr::U8 => ValueType::Byte,
            IntRepr::U16 => ValueType::Uint16,
            IntRepr::U32 => ValueType::Uint32,
            IntRepr::U64 => ValueType::Uint64,
        }
    }

    /// Width in bits.
    pub fn bits(self) -> u32 {
        match self {
            IntRepr::U8 => 8,
            IntRepr::U16 => 16,
            IntRepr::U32 => 32,
            IntRepr::U64 => 64,
        }
    }
}

/// Runtime type of a [`Value`], or the declared element type of a subscriber.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum ValueType {
    Bool,
    Byte,
    Int16,
    Uint16,
    Int32,
    Uint32,
    Int64,
    Uint64,
    Double,
    Str,
    ObjectPath,
    /// Homogeneous array.
    Array(Box<ValueType>),
    /// Named enumeration carried as an unsigned integer.
    Enum {
        /// Enumeration name (for diagnostics).
        name: &'static str,
        /// Width of the carrying integer.
        repr: IntRepr,
    },
}

impl ValueType {
    /// Shorthand for `Array(Box::new(elem))`.
    pub fn array_of(elem: ValueType) -> Self {
        ValueType::Array(Box::new(elem))
    }

    /// True if values of this type can be received from the bus.
    ///
    /// Enumerations are declared-only: they travel as their carrying integer.
    pub fn is_wire(&self) -> bool {
        match self {
            ValueType::Enum { .. } => false,
            ValueType::Array(elem) => elem.is_wire(),
            _ => true,
        }
    }

    /// Bus type signature; enumerations report their carrying integer.
    pub fn signature(&self) -> String {
        match self {
            ValueType::Bool => "b".into(),
            ValueType::Byte => "y".into(),
            ValueType::Int16 => "n".into(),
            ValueType::Uint16 => "q".into(),
            ValueType::Int32 => "i".into(),
            ValueType::Uint32 => "u".into(),
            ValueType::Int64 => "x".into(),
            ValueType::Uint64 => "t".into(),
            ValueType::Double => "d".into(),
            ValueType::Str => "s".into(),
            ValueType::ObjectPath => "o".into(),
            ValueType::Array(elem) => format!("a{}", elem.signature()),
            ValueType::Enum { repr, .. } => repr.wire_type().signature(),
        }
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValueType::Bool => f.write_str("bool"),
            ValueType::Byte => f.write_str("byte"),
            ValueType::Int16 => f.write_str("int16"),
            ValueType::Uint16 => f.write_str("uint16"),
            ValueType::Int32 => f.write_str("int32"),
            ValueType::Uint32 => f.write_str("uint32"),
            ValueType::Int64 => f.write_str("int64"),
            ValueType::Uint64 => f.write_str("uint64"),
            ValueType::Double => f.write_str("double"),
            ValueType::Str => f.write_str("string"),
            ValueType::ObjectPath => f.write_str("object_path"),
            ValueType::Array(elem) => write!(f, "array<{elem}>"),
            ValueType::Enum { name, repr } => write!(f, "enum {name}({})", repr.wire_type()),
        }
    }
}

/// One untyped payload value.
#[derive(Clone, Debug, PartialEq)]
pub enum Value {
    Bool(bool),
    Byte(u8),
    Int16(i16),
    Uint16(u16),
    Int32(i32),
    Uint32(u32),
    Int64(i64),
    Uint64(u64),
    Double(f64),
    Str(String),
    ObjectPath(ObjectPath),
    /// Array with its element type, so that empty arrays stay typed.
    Array(ValueType, Vec<Value>),
}

impl Value {
    /// Runtime type of this value.
    pub fn value_type(&self) -> ValueType {
        match self {
            Value::Bool(_) => ValueType::Bool,
            Value::Byte(_) => ValueType::Byte,
            Value::Int16(_) => ValueType::Int16,
            Value::Uint16(_) => ValueType::Uint16,
            Value::Int32(_) => ValueType::Int32,
            Value::Uint32(_) => ValueType::Uint32,
            Value::Int64(_) => ValueType::Int64,
            Value::Uint64(_) => ValueType::Uint64,
            Value::Double(_) => ValueType::Double,
            Value::Str(_) => ValueType::Str,
            Value::ObjectPath(_) => ValueType::ObjectPath,
            Value::Array(elem, _) => ValueType::Array(Box::new(elem.clone())),
        }
    }

    /// Unsigned payload widened to `u64`, if this is an unsigned integer.
    pub fn as_unsigned(&self) -> Option<u64> {
        match *self {
            Value::Byte(v) => Some(u64::from(v)),
            Value::Uint16(v) => Some(u64::from(v)),
            Value::Uint32(v) => Some(u64::from(v)),
            Value::Uint64(v) => Some(v),
            _ => None,
        }
    }

    /// Signed payload widened to `i64`, if this is a signed integer.
    pub fn as_signed(&self) -> Option<i64> {
        match *self {
            Value::Int16(v) => Some(i64::from(v)),
            Value::Int32(v) => Some(i64::from(v)),
            Value::Int64(v) => Some(v),
            _ => None,
        }
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<u32> for Value {
    fn from(v: u32) -> Self {
        Value::Uint32(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Str(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Str(v)
    }
}

impl From<ObjectPath> for Value {
    fn from(v: ObjectPath) -> Self {
        Value::ObjectPath(v)
    }
}
