//! Wire data model: names, routing keys, payload values.
//!
//! ## Contents
//! - [`ObjectPath`], [`MemberName`] validated bus names
//! - [`RoutingKey`] `(path, interface.member)` pair used to route signals
//! - [`Value`], [`ValueType`] untyped payload values and their runtime types
//! - [`RawEvent`] one incoming signal as delivered by the connection
//!
//! Nothing here performs I/O; the connection layer produces [`RawEvent`]s and
//! the dispatcher consumes them.

mod key;
mod path;
mod raw;
mod value;

pub use key::{MemberName, RoutingKey};
pub use path::ObjectPath;
pub use raw::RawEvent;
pub use value::{IntRepr, Value, ValueType};
