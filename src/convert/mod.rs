//! # Type reconciliation between wire values and subscriber element types.
//!
//! A subscriber declares the element type of its queue (through
//! [`SignalValue::value_type`]) and the caller states the wire type of the
//! signal argument. [`reconcile`] compares the two **once**, at subscribe
//! time, and yields a [`ConversionStrategy`] that the fan-out worker applies to
//! every value afterwards.
//!
//! ```text
//! reconcile(declared, wire, converter?)
//!     ├─ converter given ─► signature == (wire → declared) ? Custom : ConverterSignatureMismatch
//!     ├─ wire == declared ─► Identity
//!     ├─ Builtin::between(wire, declared) ─► Builtin(..)
//!     └─ otherwise ─► TypeIncompatible
//! ```
//!
//! Built-in conversions are lossless: integer widening, integer → double for
//! widths up to 32 bits, unsigned → enumeration of equal or wider repr,
//! object path → string, and element-wise versions of these for arrays.

mod builtin;
mod converter;
mod reconcile;
mod strategy;
mod value;

pub use builtin::Builtin;
pub use converter::Converter;
pub use reconcile::reconcile;
pub use strategy::ConversionStrategy;
pub use value::SignalValue;
