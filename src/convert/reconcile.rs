use crate::convert::{Builtin, ConversionStrategy, Converter};
use crate::error::DispatchError;
use crate::wire::ValueType;

/// Decides, once per subscription, how wire values reach the declared element type.
///
/// A `wire` type containing an enumeration is rejected outright: enums are
/// only ever declared, the bus carries their integer.
///
/// Rules, tried in order:
/// 1. a converter is given: its signature must be exactly `wire -> declared`;
/// 2. `wire == declared`: identity;
/// 3. a [`Builtin`] conversion exists;
/// 4. otherwise [`DispatchError::TypeIncompatible`].
///
/// # Example
/// ```
/// use sigmux::{reconcile, ConversionStrategy, Converter, ValueType};
///
/// let s = reconcile(&ValueType::Bool, &ValueType::Bool, None).unwrap();
/// assert!(matches!(s, ConversionStrategy::Identity(_)));
///
/// let err = reconcile(&ValueType::Bool, &ValueType::Str, None).unwrap_err();
/// assert_eq!(err.as_label(), "type_incompatible");
///
/// let conv = Converter::new(|s: String| s == "yes");
/// let s = reconcile(&ValueType::Bool, &ValueType::Str, Some(conv)).unwrap();
/// assert!(matches!(s, ConversionStrategy::Custom(_)));
/// ```
pub fn reconcile(
    declared: &ValueType,
    wire: &ValueType,
    converter: Option<Converter>,
) -> Result<ConversionStrategy, DispatchError> {
    if !wire.is_wire() {
        return Err(DispatchError::TypeIncompatible {
            wire: wire.clone(),
            declared: declared.clone(),
        });
    }

    if let Some(conv) = converter {
        if conv.input() != wire || conv.output() != declared {
            return Err(DispatchError::ConverterSignatureMismatch {
                wire: wire.clone(),
                declared: declared.clone(),
                input: conv.input().clone(),
                output: conv.output().clone(),
            });
        }
        return Ok(ConversionStrategy::Custom(conv));
    }

    if wire == declared {
        return Ok(ConversionStrategy::Identity(wire.clone()));
    }

    Builtin::between(wire, declared)
        .map(ConversionStrategy::Builtin)
        .ok_or_else(|| DispatchError::TypeIncompatible {
            wire: wire.clone(),
            declared: declared.clone(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wire::{IntRepr, Value};

    #[test]
    fn test_converter_takes_precedence_over_identity() {
        let conv = Converter::new(|b: bool| !b);
        let s = reconcile(&ValueType::Bool, &ValueType::Bool, Some(conv)).unwrap();
        assert!(matches!(s, ConversionStrategy::Custom(_)));
        assert_eq!(s.apply(Value::Bool(true)).unwrap(), Value::Bool(false));
    }

    #[test]
    fn test_converter_output_mismatch() {
        let conv = Converter::new(|s: String| s.len() as u32);
        let err = reconcile(&ValueType::Bool, &ValueType::Str, Some(conv)).unwrap_err();
        match err {
            DispatchError::ConverterSignatureMismatch { output, declared, .. } => {
                assert_eq!(output, ValueType::Uint32);
                assert_eq!(declared, ValueType::Bool);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_converter_input_mismatch() {
        let conv = Converter::new(|n: u32| n > 0);
        let err = reconcile(&ValueType::Bool, &ValueType::Str, Some(conv)).unwrap_err();
        assert_eq!(err.as_label(), "converter_signature_mismatch");
    }

    #[derive(Debug, PartialEq)]
    enum State {
        Idle,
        Busy,
    }

    impl crate::convert::SignalValue for State {
        fn value_type() -> ValueType {
            ValueType::Enum {
                name: "State",
                repr: IntRepr::U32,
            }
        }

        fn from_value(value: Value) -> Option<Self> {
            match value.as_unsigned()? {
                0 => Some(State::Idle),
                1 => Some(State::Busy),
                _ => None,
            }
        }

        fn into_value(self) -> Value {
            Value::Uint32(self as u32)
        }
    }

    fn state() -> ValueType {
        <State as crate::convert::SignalValue>::value_type()
    }

    #[test]
    fn test_enum_wire_rejected_for_identity() {
        let err = reconcile(&state(), &state(), None).unwrap_err();
        assert_eq!(err.as_label(), "type_incompatible");
    }

    #[test]
    fn test_enum_wire_rejected_with_converter() {
        let conv = Converter::new(|s: State| s == State::Busy);
        let err = reconcile(&ValueType::Bool, &state(), Some(conv)).unwrap_err();
        assert!(matches!(err, DispatchError::TypeIncompatible { .. }));
    }

    #[test]
    fn test_enum_array_wire_rejected() {
        let arr = ValueType::array_of(state());
        let err = reconcile(&arr, &arr, None).unwrap_err();
        assert_eq!(err.as_label(), "type_incompatible");

        // the integer carrier still reaches an enum array
        let s = reconcile(&arr, &ValueType::array_of(ValueType::Uint32), None).unwrap();
        assert_eq!(s.as_label(), "builtin");
    }

    #[test]
    fn test_builtin_enum() {
        let state = ValueType::Enum {
            name: "State",
            repr: IntRepr::U32,
        };
        let s = reconcile(&state, &ValueType::Uint32, None).unwrap();
        assert_eq!(s.as_label(), "builtin");
        assert_eq!(s.input(), ValueType::Uint32);
    }
}
