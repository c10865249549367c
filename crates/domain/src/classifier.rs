//! Event Classifier
//!
//! Pure, stateless routing of event type strings to a category and a target
//! bus. Known event types are resolved through an exact-match table built at
//! startup; unknown types fall back to a fixed, ordered rule list where the
//! first matching rule wins.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::events::event_types;

/// Category of a domain event, used for audit and monitoring breakdowns
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EventCategory {
    AuthEvent,
    UserEvent,
    AnalyticsEvent,
    SystemEvent,
}

impl std::fmt::Display for EventCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EventCategory::AuthEvent => write!(f, "AUTH_EVENT"),
            EventCategory::UserEvent => write!(f, "USER_EVENT"),
            EventCategory::AnalyticsEvent => write!(f, "ANALYTICS_EVENT"),
            EventCategory::SystemEvent => write!(f, "SYSTEM_EVENT"),
        }
    }
}

/// Target bus for an event, used by the outbox processor to route publishes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventBusKind {
    Auth,
    User,
    Analytics,
    System,
}

impl EventBusKind {
    /// Logical bus name as configured on the transport side
    pub fn bus_name(&self) -> &'static str {
        match self {
            EventBusKind::Auth => "AUTH",
            EventBusKind::User => "USER",
            EventBusKind::Analytics => "ANALYTICS",
            EventBusKind::System => "SYSTEM",
        }
    }
}

impl From<EventCategory> for EventBusKind {
    fn from(category: EventCategory) -> Self {
        match category {
            EventCategory::AuthEvent => EventBusKind::Auth,
            EventCategory::UserEvent => EventBusKind::User,
            EventCategory::AnalyticsEvent => EventBusKind::Analytics,
            EventCategory::SystemEvent => EventBusKind::System,
        }
    }
}

/// Classify an event type through the ordered rule list.
///
/// Rule order is part of the contract: an event type matching several rules
/// resolves to the first one evaluated.
pub fn event_category(event_type: &str) -> EventCategory {
    const AUTH_PREFIXES: [&str; 3] = ["AUTH_", "LOGIN_", "SIGNUP_"];
    const USER_PREFIXES: [&str; 2] = ["USER_", "PROFILE_"];

    if AUTH_PREFIXES.iter().any(|p| event_type.starts_with(p)) {
        return EventCategory::AuthEvent;
    }
    if USER_PREFIXES.iter().any(|p| event_type.starts_with(p)) {
        return EventCategory::UserEvent;
    }
    if event_type.starts_with("ANALYTICS_") || event_type.ends_with("_ANALYTICS") {
        return EventCategory::AnalyticsEvent;
    }
    EventCategory::SystemEvent
}

/// Bus selection for an event type; same rules, different enum.
pub fn event_bus_kind(event_type: &str) -> EventBusKind {
    event_category(event_type).into()
}

/// Exact-match classification table
///
/// Seeded with every known event type at startup so routing does not depend
/// on naming-convention prefixes for the schemas we own. The rule list above
/// remains the explicit default path for types the table has never seen.
#[derive(Debug, Clone)]
pub struct ClassifierTable {
    exact: HashMap<&'static str, EventCategory>,
}

impl ClassifierTable {
    /// Build the table over all known event types.
    pub fn with_known_types() -> Self {
        let mut exact = HashMap::new();
        exact.insert(event_types::SIGNUP_COMPLETED, EventCategory::AuthEvent);
        exact.insert(event_types::LOGIN_SUCCEEDED, EventCategory::AuthEvent);
        exact.insert(event_types::AUTH_PASSWORD_RESET, EventCategory::AuthEvent);
        exact.insert(event_types::PROFILE_UPDATED, EventCategory::UserEvent);
        exact.insert(event_types::USER_DELETED, EventCategory::UserEvent);
        exact.insert(event_types::RESTAURANT_IMPORTED, EventCategory::SystemEvent);
        exact.insert(event_types::DISH_CREATED, EventCategory::SystemEvent);
        exact.insert(event_types::IMPORT_JOB_CREATED, EventCategory::SystemEvent);
        exact.insert(event_types::CLICK_ANALYTICS, EventCategory::AnalyticsEvent);
        exact.insert(event_types::SEARCH_ANALYTICS, EventCategory::AnalyticsEvent);
        Self { exact }
    }

    /// Category for an event type: exact table first, rule list as default.
    pub fn classify(&self, event_type: &str) -> EventCategory {
        self.exact
            .get(event_type)
            .copied()
            .unwrap_or_else(|| event_category(event_type))
    }

    /// Bus the processor should publish this event type to.
    pub fn bus_for(&self, event_type: &str) -> EventBusKind {
        self.classify(event_type).into()
    }
}

impl Default for ClassifierTable {
    fn default() -> Self {
        Self::with_known_types()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_auth_prefixes() {
        assert_eq!(event_category("SIGNUP_COMPLETED"), EventCategory::AuthEvent);
        assert_eq!(event_category("LOGIN_FAILED"), EventCategory::AuthEvent);
        assert_eq!(event_category("AUTH_TOKEN_REFRESHED"), EventCategory::AuthEvent);
    }

    #[test]
    fn test_user_prefixes() {
        assert_eq!(event_category("PROFILE_UPDATED"), EventCategory::UserEvent);
        assert_eq!(event_category("USER_DELETED"), EventCategory::UserEvent);
    }

    #[test]
    fn test_analytics_prefix_and_suffix() {
        assert_eq!(
            event_category("CLICK_ANALYTICS"),
            EventCategory::AnalyticsEvent
        );
        assert_eq!(
            event_category("ANALYTICS_EXPORTED"),
            EventCategory::AnalyticsEvent
        );
    }

    #[test]
    fn test_unknown_defaults_to_system() {
        assert_eq!(event_category("UNKNOWN_THING"), EventCategory::SystemEvent);
        assert_eq!(event_category(""), EventCategory::SystemEvent);
    }

    #[test]
    fn test_first_rule_wins_on_overlap() {
        // Matches both the AUTH_ prefix and the _ANALYTICS suffix; auth rules
        // are evaluated first.
        assert_eq!(
            event_category("AUTH_SESSION_ANALYTICS"),
            EventCategory::AuthEvent
        );
    }

    #[test]
    fn test_bus_kind_mirrors_category() {
        assert_eq!(event_bus_kind("SIGNUP_COMPLETED"), EventBusKind::Auth);
        assert_eq!(event_bus_kind("PROFILE_UPDATED"), EventBusKind::User);
        assert_eq!(event_bus_kind("CLICK_ANALYTICS"), EventBusKind::Analytics);
        assert_eq!(event_bus_kind("IMPORT_JOB_CREATED"), EventBusKind::System);
    }

    #[test]
    fn test_table_matches_rule_list_for_known_types() {
        let table = ClassifierTable::with_known_types();
        assert_eq!(
            table.classify("SIGNUP_COMPLETED"),
            EventCategory::AuthEvent
        );
        assert_eq!(table.classify("PROFILE_UPDATED"), EventCategory::UserEvent);
        assert_eq!(
            table.classify("CLICK_ANALYTICS"),
            EventCategory::AnalyticsEvent
        );
        assert_eq!(table.classify("UNKNOWN_THING"), EventCategory::SystemEvent);
    }

    #[test]
    fn test_table_pins_types_regardless_of_prefix() {
        // RESTAURANT_IMPORTED carries no routing prefix; the exact table pins
        // it to SYSTEM instead of relying on the default rule.
        let table = ClassifierTable::with_known_types();
        assert_eq!(
            table.classify("RESTAURANT_IMPORTED"),
            EventCategory::SystemEvent
        );
        assert_eq!(table.bus_for("RESTAURANT_IMPORTED"), EventBusKind::System);
    }
}
