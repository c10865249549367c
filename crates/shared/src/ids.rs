use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Unique identifier for an outbox event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EventId(pub Uuid);

impl EventId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for EventId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for EventId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifier of the business entity an event is about (user, restaurant,
/// dish, import job). Aggregate ids come from several upstream systems so
/// they are kept as opaque strings rather than UUIDs.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AggregateId(pub String);

impl AggregateId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AggregateId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for AggregateId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for AggregateId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_id_display_roundtrip() {
        let id = EventId::new();
        let text = id.to_string();
        assert_eq!(Uuid::parse_str(&text).unwrap(), id.0);
    }

    #[test]
    fn test_aggregate_id_from_str() {
        let id = AggregateId::from("restaurant-42");
        assert_eq!(id.as_str(), "restaurant-42");
        assert_eq!(id.to_string(), "restaurant-42");
    }
}
