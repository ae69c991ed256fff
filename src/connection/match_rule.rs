use std::fmt;

use crate::wire::{MemberName, ObjectPath, RoutingKey};

/// Interest registration for one routing key.
///
/// Renders in bus match-rule syntax:
/// `type='signal',path='/p',interface='a.b',member='M'`.
///
/// # Example
/// ```
/// use sigmux::{MatchRule, RoutingKey};
///
/// let key = RoutingKey::parse("/iface/0", "com.example.Iface.Ready").unwrap();
/// assert_eq!(
///     MatchRule::for_key(&key).to_string(),
///     "type='signal',path='/iface/0',interface='com.example.Iface',member='Ready'"
/// );
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct MatchRule {
    path: ObjectPath,
    member: MemberName,
}

impl MatchRule {
    /// Rule matching exactly the signals routed to `key`.
    pub fn for_key(key: &RoutingKey) -> Self {
        Self {
            path: key.path().clone(),
            member: key.member().clone(),
        }
    }

    /// Object path the rule is restricted to.
    pub fn path(&self) -> &ObjectPath {
        &self.path
    }

    /// Interface part of the member name.
    pub fn interface(&self) -> &str {
        self.member.interface()
    }

    /// Signal name without the interface.
    pub fn member(&self) -> &str {
        self.member.member()
    }

    /// True if a signal with this key would be delivered under this rule.
    pub fn matches(&self, key: &RoutingKey) -> bool {
        self.path == *key.path() && self.member == *key.member()
    }
}

impl fmt::Display for MatchRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "type='signal',path='{}',interface='{}',member='{}'",
            self.path,
            self.member.interface(),
            self.member.member()
        )
    }
}
