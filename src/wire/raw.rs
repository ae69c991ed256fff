use crate::error::DispatchError;
use crate::wire::{MemberName, ObjectPath, RoutingKey, Value};

/// One incoming signal: emitter path, qualified member and ordered body.
///
/// Produced by the connection, consumed once by the fan-out worker.
#[derive(Clone, Debug, PartialEq)]
pub struct RawEvent {
    pub path: ObjectPath,
    pub member: MemberName,
    pub body: Vec<Value>,
}

impl RawEvent {
    /// Creates an event from already validated parts.
    pub fn new(path: ObjectPath, member: MemberName, body: Vec<Value>) -> Self {
        Self { path, member, body }
    }

    /// Creates an event from raw strings.
    ///
    /// # Example
    /// ```
    /// use sigmux::{RawEvent, Value};
    ///
    /// let ev = RawEvent::parse("/iface/0", "com.example.Iface.Ready", vec![Value::Bool(true)]).unwrap();
    /// assert_eq!(ev.routing_key().to_string(), "/iface/0:com.example.Iface.Ready");
    /// ```
    pub fn parse(path: &str, member: &str, body: Vec<Value>) -> Result<Self, DispatchError> {
        Ok(Self {
            path: ObjectPath::new(path)?,
            member: MemberName::parse(member)?,
            body,
        })
    }

    /// Routing key of this event.
    pub fn routing_key(&self) -> RoutingKey {
        RoutingKey::new(self.path.clone(), self.member.clone())
    }
}
