//! # User-supplied conversion functions.
//!
//! A [`Converter`] wraps a typed closure `In -> Out` and remembers both types as
//! its declared signature. The closure itself is erased to `Value -> Value`
//! so that it can be stored next to any subscriber.
//!
//! ## Example
//! ```rust
//! use sigmux::{Converter, Value, ValueType};
//!
//! // "connected" flag derived from a numeric state
//! let conv = Converter::new(|state: u32| state >= 70);
//! assert_eq!(conv.input(), &ValueType::Uint32);
//! assert_eq!(conv.output(), &ValueType::Bool);
//! assert_eq!(conv.apply(Value::Uint32(70)).unwrap(), Value::Bool(true));
//! ```

use std::fmt;
use std::sync::Arc;

use crate::convert::SignalValue;
use crate::error::ConvertError;
use crate::wire::{Value, ValueType};

type ErasedFn = dyn Fn(Value) -> Option<Value> + Send + Sync;

/// Type-erased conversion function with a declared signature.
#[derive(Clone)]
pub struct Converter {
    input: ValueType,
    output: ValueType,
    f: Arc<ErasedFn>,
}

impl Converter {
    /// Wraps an infallible conversion.
    pub fn new<In, Out, F>(f: F) -> Self
    where
        In: SignalValue,
        Out: SignalValue,
        F: Fn(In) -> Out + Send + Sync + 'static,
    {
        Self::try_new(move |input: In| Some(f(input)))
    }

    /// Wraps a conversion that may reject a value (`None`).
    ///
    /// A rejected value is dropped for this subscriber and reported.
    pub fn try_new<In, Out, F>(f: F) -> Self
    where
        In: SignalValue,
        Out: SignalValue,
        F: Fn(In) -> Option<Out> + Send + Sync + 'static,
    {
        Self {
            input: In::value_type(),
            output: Out::value_type(),
            f: Arc::new(move |value: Value| f(In::from_value(value)?).map(SignalValue::into_value)),
        }
    }

    /// Declared input type.
    pub fn input(&self) -> &ValueType {
        &self.input
    }

    /// Declared output type.
    pub fn output(&self) -> &ValueType {
        &self.output
    }

    /// Runs the conversion.
    pub fn apply(&self, value: Value) -> Result<Value, ConvertError> {
        let actual = value.value_type();
        if actual != self.input {
            return Err(ConvertError::Mismatch {
                expected: self.input.clone(),
                actual,
            });
        }
        (self.f)(value).ok_or_else(|| ConvertError::Rejected {
            input: self.input.clone(),
            output: self.output.clone(),
        })
    }
}

impl fmt::Debug for Converter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Converter")
            .field("input", &self.input)
            .field("output", &self.output)
            .finish_non_exhaustive()
    }
}
