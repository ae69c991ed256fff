//! # Object paths.
//!
//! An [`ObjectPath`] is `/` or a sequence of `/segment` elements where each
//! segment is a non-empty run of `[A-Za-z0-9_]`. A trailing slash is only
//! allowed for the root path.

use std::borrow::Borrow;
use std::fmt;

use crate::error::DispatchError;

/// Validated bus object path.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjectPath(String);

impl ObjectPath {
    /// Parses and validates an object path.
    ///
    /// # Example
    /// ```
    /// use sigmux::ObjectPath;
    ///
    /// assert!(ObjectPath::new("/org/freedesktop/NetworkManager").is_ok());
    /// assert!(ObjectPath::new("org/freedesktop").is_err());
    /// assert!(ObjectPath::new("/trailing/").is_err());
    /// ```
    pub fn new(path: impl Into<String>) -> Result<Self, DispatchError> {
        let path = path.into();
        if is_valid(&path) {
            Ok(Self(path))
        } else {
            Err(DispatchError::InvalidPath { path })
        }
    }

    /// The root path `/`.
    pub fn root() -> Self {
        Self("/".to_string())
    }

    /// Borrow the path as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns a child path `self/segment`.
    pub fn join(&self, segment: &str) -> Result<Self, DispatchError> {
        if self.0 == "/" {
            Self::new(format!("/{segment}"))
        } else {
            Self::new(format!("{}/{segment}", self.0))
        }
    }
}

fn is_valid(path: &str) -> bool {
    if path == "/" {
        return true;
    }
    let Some(rest) = path.strip_prefix('/') else {
        return false;
    };
    rest.split('/').all(|seg| {
        !seg.is_empty() && seg.bytes().all(|b| b.is_ascii_alphanumeric() || b == b'_')
    })
}

impl fmt::Display for ObjectPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for ObjectPath {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for ObjectPath {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl TryFrom<&str> for ObjectPath {
    type Error = DispatchError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl TryFrom<String> for ObjectPath {
    type Error = DispatchError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}
