//! # Member names and routing keys.
//!
//! A signal is routed by its [`RoutingKey`]: the emitting object's path plus
//! the fully qualified member name (`interface + "." + member`).
//!
//! ```text
//! RoutingKey {
//!     path:   /org/freedesktop/NetworkManager
//!     member: org.freedesktop.NetworkManager . StateChanged
//!             └──────── interface ────────┘   └─ member ─┘
//! }
//! ```

use std::fmt;

use crate::error::DispatchError;
use crate::wire::ObjectPath;

/// Fully qualified member name (`interface.member`).
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MemberName {
    interface: String,
    member: String,
}

impl MemberName {
    /// Builds a member name from its interface and member parts.
    ///
    /// # Example
    /// ```
    /// use sigmux::MemberName;
    ///
    /// let name = MemberName::new("com.example.Iface", "Ready").unwrap();
    /// assert_eq!(name.to_string(), "com.example.Iface.Ready");
    /// assert!(MemberName::new("noDots", "Ready").is_err());
    /// ```
    pub fn new(interface: impl Into<String>, member: impl Into<String>) -> Result<Self, DispatchError> {
        let interface = interface.into();
        let member = member.into();
        if !valid_interface(&interface) || !valid_element(&member) {
            return Err(DispatchError::InvalidMember {
                member: format!("{interface}.{member}"),
            });
        }
        Ok(Self { interface, member })
    }

    /// Splits `interface.member` at the last dot.
    pub fn parse(qualified: &str) -> Result<Self, DispatchError> {
        match qualified.rsplit_once('.') {
            Some((iface, member)) => Self::new(iface, member),
            None => Err(DispatchError::InvalidMember {
                member: qualified.to_string(),
            }),
        }
    }

    /// Interface part, e.g. `org.freedesktop.NetworkManager`.
    pub fn interface(&self) -> &str {
        &self.interface
    }

    /// Member part, e.g. `StateChanged`.
    pub fn member(&self) -> &str {
        &self.member
    }
}

fn valid_element(s: &str) -> bool {
    let mut bytes = s.bytes();
    match bytes.next() {
        Some(b) if b.is_ascii_alphabetic() || b == b'_' => {}
        _ => return false,
    }
    bytes.all(|b| b.is_ascii_alphanumeric() || b == b'_')
}

fn valid_interface(s: &str) -> bool {
    let mut parts = 0usize;
    for part in s.split('.') {
        if !valid_element(part) {
            return false;
        }
        parts += 1;
    }
    parts >= 2
}

impl fmt::Display for MemberName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.interface, self.member)
    }
}

/// Immutable `(path, member)` pair; the registry's map key.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RoutingKey {
    path: ObjectPath,
    member: MemberName,
}

impl RoutingKey {
    /// Creates a routing key.
    pub fn new(path: ObjectPath, member: MemberName) -> Self {
        Self { path, member }
    }

    /// Parses a key from raw strings.
    ///
    /// # Example
    /// ```
    /// use sigmux::RoutingKey;
    ///
    /// let key = RoutingKey::parse("/iface/0", "com.example.Iface.Ready").unwrap();
    /// assert_eq!(key.path().as_str(), "/iface/0");
    /// assert_eq!(key.member().member(), "Ready");
    /// ```
    pub fn parse(path: &str, qualified_member: &str) -> Result<Self, DispatchError> {
        Ok(Self {
            path: ObjectPath::new(path)?,
            member: MemberName::parse(qualified_member)?,
        })
    }

    /// Object path of the emitter.
    pub fn path(&self) -> &ObjectPath {
        &self.path
    }

    /// Fully qualified member.
    pub fn member(&self) -> &MemberName {
        &self.member
    }
}

impl fmt::Display for RoutingKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.path, self.member)
    }
}
