//! # Built-in lossless conversions.

use crate::error::ConvertError;
use crate::wire::{IntRepr, Value, ValueType};

/// A conversion the dispatcher knows to be lossless.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Builtin {
    /// Integer widening, or integer (≤ 32 bits) to double.
    Widen { from: ValueType, to: ValueType },
    /// Unsigned integer to an enumeration whose repr is at least as wide.
    Retag {
        from: ValueType,
        name: &'static str,
        repr: IntRepr,
    },
    /// Object path to string.
    PathToString,
    /// Element-wise conversion of an array.
    Elements {
        from: ValueType,
        to: ValueType,
        inner: Box<Builtin>,
    },
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Int {
    Unsigned(u32),
    Signed(u32),
}

fn int_class(ty: &ValueType) -> Option<Int> {
    match ty {
        ValueType::Byte => Some(Int::Unsigned(8)),
        ValueType::Uint16 => Some(Int::Unsigned(16)),
        ValueType::Uint32 => Some(Int::Unsigned(32)),
        ValueType::Uint64 => Some(Int::Unsigned(64)),
        ValueType::Int16 => Some(Int::Signed(16)),
        ValueType::Int32 => Some(Int::Signed(32)),
        ValueType::Int64 => Some(Int::Signed(64)),
        _ => None,
    }
}

fn widens(from: Int, to: Int) -> bool {
    match (from, to) {
        (Int::Unsigned(a), Int::Unsigned(b)) => a < b,
        (Int::Unsigned(a), Int::Signed(b)) => a < b,
        (Int::Signed(a), Int::Signed(b)) => a < b,
        (Int::Signed(_), Int::Unsigned(_)) => false,
    }
}

impl Builtin {
    /// Finds a built-in conversion from `wire` to `declared`, if one exists.
    ///
    /// Identical types are not a built-in conversion; callers check equality first.
    ///
    /// # Example
    /// ```
    /// use sigmux::{Builtin, IntRepr, ValueType};
    ///
    /// let state = ValueType::Enum { name: "State", repr: IntRepr::U32 };
    /// assert!(Builtin::between(&ValueType::Uint32, &state).is_some());
    /// assert!(Builtin::between(&ValueType::Uint64, &state).is_none());
    /// assert!(Builtin::between(&ValueType::Str, &ValueType::Bool).is_none());
    /// ```
    pub fn between(wire: &ValueType, declared: &ValueType) -> Option<Builtin> {
        if wire == declared {
            return None;
        }
        match (wire, declared) {
            (ValueType::ObjectPath, ValueType::Str) => Some(Builtin::PathToString),
            (from, ValueType::Enum { name, repr }) => match int_class(from)? {
                Int::Unsigned(bits) if bits <= repr.bits() => Some(Builtin::Retag {
                    from: from.clone(),
                    name: *name,
                    repr: *repr,
                }),
                _ => None,
            },
            (from, ValueType::Double) => match int_class(from)? {
                Int::Unsigned(bits) | Int::Signed(bits) if bits <= 32 => Some(Builtin::Widen {
                    from: from.clone(),
                    to: ValueType::Double,
                }),
                _ => None,
            },
            (ValueType::Array(a), ValueType::Array(b)) => {
                let inner = Builtin::between(a, b)?;
                Some(Builtin::Elements {
                    from: (**a).clone(),
                    to: (**b).clone(),
                    inner: Box::new(inner),
                })
            }
            (from, to) => {
                let (a, b) = (int_class(from)?, int_class(to)?);
                widens(a, b).then(|| Builtin::Widen {
                    from: from.clone(),
                    to: to.clone(),
                })
            }
        }
    }

    /// Wire type this conversion accepts.
    pub fn input(&self) -> ValueType {
        match self {
            Builtin::Widen { from, .. } | Builtin::Retag { from, .. } => from.clone(),
            Builtin::PathToString => ValueType::ObjectPath,
            Builtin::Elements { from, .. } => ValueType::array_of(from.clone()),
        }
    }

    /// Applies the conversion; fails only if `value` is not of [`Builtin::input`] type.
    pub fn apply(&self, value: Value) -> Result<Value, ConvertError> {
        let mismatch = |value: &Value| ConvertError::Mismatch {
            expected: self.input(),
            actual: value.value_type(),
        };

        match self {
            Builtin::Widen { from, to } => {
                if value.value_type() != *from {
                    return Err(mismatch(&value));
                }
                widen(&value, to).ok_or_else(|| mismatch(&value))
            }
            Builtin::Retag { from, repr, .. } => {
                if value.value_type() != *from {
                    return Err(mismatch(&value));
                }
                widen(&value, &repr.wire_type()).ok_or_else(|| mismatch(&value))
            }
            Builtin::PathToString => match value {
                Value::ObjectPath(p) => Ok(Value::Str(p.as_str().to_string())),
                other => Err(mismatch(&other)),
            },
            Builtin::Elements { from, to, inner } => match value {
                Value::Array(elem, items) if elem == *from => {
                    let items = items
                        .into_iter()
                        .map(|v| inner.apply(v))
                        .collect::<Result<Vec<_>, _>>()?;
                    Ok(Value::Array(to.clone(), items))
                }
                other => Err(mismatch(&other)),
            },
        }
    }
}

/// Re-encodes an integer value into the integer or double type `to`.
fn widen(value: &Value, to: &ValueType) -> Option<Value> {
    let n: i128 = match (value.as_unsigned(), value.as_signed()) {
        (Some(u), _) => i128::from(u),
        (_, Some(s)) => i128::from(s),
        _ => return None,
    };
    let out = match to {
        ValueType::Byte => Value::Byte(u8::try_from(n).ok()?),
        ValueType::Uint16 => Value::Uint16(u16::try_from(n).ok()?),
        ValueType::Uint32 => Value::Uint32(u32::try_from(n).ok()?),
        ValueType::Uint64 => Value::Uint64(u64::try_from(n).ok()?),
        ValueType::Int16 => Value::Int16(i16::try_from(n).ok()?),
        ValueType::Int32 => Value::Int32(i32::try_from(n).ok()?),
        ValueType::Int64 => Value::Int64(i64::try_from(n).ok()?),
        // Only reachable for widths up to 32 bits, exact in f64.
        ValueType::Double => Value::Double(n as f64),
        _ => return None,
    };
    Some(out)
}
