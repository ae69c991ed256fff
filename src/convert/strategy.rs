use crate::convert::{Builtin, Converter};
use crate::error::ConvertError;
use crate::wire::{Value, ValueType};

/// How one subscriber turns a wire value into its element type.
///
/// Resolved once by [`reconcile`](crate::convert::reconcile) and stored with
/// the subscriber; the worker only calls [`apply`](Self::apply).
#[derive(Clone, Debug)]
pub enum ConversionStrategy {
    /// Pass the value through unchanged.
    Identity(ValueType),
    /// Apply a built-in lossless conversion.
    Builtin(Builtin),
    /// Invoke a user converter.
    Custom(Converter),
}

impl ConversionStrategy {
    /// Wire type this strategy was resolved for.
    pub fn input(&self) -> ValueType {
        match self {
            ConversionStrategy::Identity(ty) => ty.clone(),
            ConversionStrategy::Builtin(b) => b.input(),
            ConversionStrategy::Custom(c) => c.input().clone(),
        }
    }

    /// Converts one value.
    pub fn apply(&self, value: Value) -> Result<Value, ConvertError> {
        match self {
            ConversionStrategy::Identity(ty) => {
                let actual = value.value_type();
                if actual == *ty {
                    Ok(value)
                } else {
                    Err(ConvertError::Mismatch {
                        expected: ty.clone(),
                        actual,
                    })
                }
            }
            ConversionStrategy::Builtin(b) => b.apply(value),
            ConversionStrategy::Custom(c) => c.apply(value),
        }
    }

    /// Short label for logs.
    pub fn as_label(&self) -> &'static str {
        match self {
            ConversionStrategy::Identity(_) => "identity",
            ConversionStrategy::Builtin(_) => "builtin",
            ConversionStrategy::Custom(_) => "custom",
        }
    }
}
