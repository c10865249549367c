//! Domain Events
//!
//! Typed schemas for every event the pipeline knows about, plus an `Unknown`
//! fallback for event types introduced by newer producers. Payloads are
//! validated at the deserialization boundary; downstream code never touches
//! untyped JSON for a known event type.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Event type string tags as they appear in the outbox and on the wire.
pub mod event_types {
    pub const SIGNUP_COMPLETED: &str = "SIGNUP_COMPLETED";
    pub const LOGIN_SUCCEEDED: &str = "LOGIN_SUCCEEDED";
    pub const AUTH_PASSWORD_RESET: &str = "AUTH_PASSWORD_RESET";
    pub const PROFILE_UPDATED: &str = "PROFILE_UPDATED";
    pub const USER_DELETED: &str = "USER_DELETED";
    pub const RESTAURANT_IMPORTED: &str = "RESTAURANT_IMPORTED";
    pub const DISH_CREATED: &str = "DISH_CREATED";
    pub const IMPORT_JOB_CREATED: &str = "IMPORT_JOB_CREATED";
    pub const CLICK_ANALYTICS: &str = "CLICK_ANALYTICS";
    pub const SEARCH_ANALYTICS: &str = "SEARCH_ANALYTICS";
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignupCompleted {
    pub user_id: String,
    pub email: String,
    #[serde(default)]
    pub display_name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoginSucceeded {
    pub user_id: String,
    #[serde(default)]
    pub method: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PasswordReset {
    pub user_id: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProfileUpdated {
    pub user_id: String,
    /// Names of the profile fields that changed
    #[serde(default)]
    pub changed_fields: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserDeleted {
    pub user_id: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RestaurantImported {
    pub restaurant_id: String,
    pub name: String,
    /// Upstream feed the restaurant was imported from
    pub source: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DishCreated {
    pub dish_id: String,
    pub restaurant_id: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImportJobCreated {
    pub job_id: String,
    pub format: String,
    #[serde(default)]
    pub source_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClickAnalytics {
    pub session_id: String,
    pub target: String,
    #[serde(default)]
    pub occurred_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchAnalytics {
    pub session_id: String,
    pub query: String,
    #[serde(default)]
    pub result_count: Option<u32>,
}

/// Sum type over every known event schema
#[derive(Debug, Clone, PartialEq)]
pub enum DomainEvent {
    SignupCompleted(SignupCompleted),
    LoginSucceeded(LoginSucceeded),
    PasswordReset(PasswordReset),
    ProfileUpdated(ProfileUpdated),
    UserDeleted(UserDeleted),
    RestaurantImported(RestaurantImported),
    DishCreated(DishCreated),
    ImportJobCreated(ImportJobCreated),
    ClickAnalytics(ClickAnalytics),
    SearchAnalytics(SearchAnalytics),
    /// Event type the pipeline has no schema for; payload carried as-is
    Unknown { event_type: String, payload: Value },
}

impl DomainEvent {
    /// The event type tag this variant serializes under.
    pub fn event_type(&self) -> &str {
        match self {
            DomainEvent::SignupCompleted(_) => event_types::SIGNUP_COMPLETED,
            DomainEvent::LoginSucceeded(_) => event_types::LOGIN_SUCCEEDED,
            DomainEvent::PasswordReset(_) => event_types::AUTH_PASSWORD_RESET,
            DomainEvent::ProfileUpdated(_) => event_types::PROFILE_UPDATED,
            DomainEvent::UserDeleted(_) => event_types::USER_DELETED,
            DomainEvent::RestaurantImported(_) => event_types::RESTAURANT_IMPORTED,
            DomainEvent::DishCreated(_) => event_types::DISH_CREATED,
            DomainEvent::ImportJobCreated(_) => event_types::IMPORT_JOB_CREATED,
            DomainEvent::ClickAnalytics(_) => event_types::CLICK_ANALYTICS,
            DomainEvent::SearchAnalytics(_) => event_types::SEARCH_ANALYTICS,
            DomainEvent::Unknown { event_type, .. } => event_type,
        }
    }

    /// Decode a payload against the schema for `event_type`.
    ///
    /// A payload that does not match a known schema is an error; an event
    /// type the pipeline has never seen becomes `Unknown` rather than a
    /// failure, so new producers do not break old consumers.
    pub fn decode(event_type: &str, payload: &Value) -> Result<Self, serde_json::Error> {
        let event = match event_type {
            event_types::SIGNUP_COMPLETED => {
                DomainEvent::SignupCompleted(serde_json::from_value(payload.clone())?)
            }
            event_types::LOGIN_SUCCEEDED => {
                DomainEvent::LoginSucceeded(serde_json::from_value(payload.clone())?)
            }
            event_types::AUTH_PASSWORD_RESET => {
                DomainEvent::PasswordReset(serde_json::from_value(payload.clone())?)
            }
            event_types::PROFILE_UPDATED => {
                DomainEvent::ProfileUpdated(serde_json::from_value(payload.clone())?)
            }
            event_types::USER_DELETED => {
                DomainEvent::UserDeleted(serde_json::from_value(payload.clone())?)
            }
            event_types::RESTAURANT_IMPORTED => {
                DomainEvent::RestaurantImported(serde_json::from_value(payload.clone())?)
            }
            event_types::DISH_CREATED => {
                DomainEvent::DishCreated(serde_json::from_value(payload.clone())?)
            }
            event_types::IMPORT_JOB_CREATED => {
                DomainEvent::ImportJobCreated(serde_json::from_value(payload.clone())?)
            }
            event_types::CLICK_ANALYTICS => {
                DomainEvent::ClickAnalytics(serde_json::from_value(payload.clone())?)
            }
            event_types::SEARCH_ANALYTICS => {
                DomainEvent::SearchAnalytics(serde_json::from_value(payload.clone())?)
            }
            other => DomainEvent::Unknown {
                event_type: other.to_string(),
                payload: payload.clone(),
            },
        };
        Ok(event)
    }

    /// Serialize the event body back to a JSON payload.
    pub fn to_payload(&self) -> Result<Value, serde_json::Error> {
        match self {
            DomainEvent::SignupCompleted(e) => serde_json::to_value(e),
            DomainEvent::LoginSucceeded(e) => serde_json::to_value(e),
            DomainEvent::PasswordReset(e) => serde_json::to_value(e),
            DomainEvent::ProfileUpdated(e) => serde_json::to_value(e),
            DomainEvent::UserDeleted(e) => serde_json::to_value(e),
            DomainEvent::RestaurantImported(e) => serde_json::to_value(e),
            DomainEvent::DishCreated(e) => serde_json::to_value(e),
            DomainEvent::ImportJobCreated(e) => serde_json::to_value(e),
            DomainEvent::ClickAnalytics(e) => serde_json::to_value(e),
            DomainEvent::SearchAnalytics(e) => serde_json::to_value(e),
            DomainEvent::Unknown { payload, .. } => Ok(payload.clone()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_decode_known_type() {
        let payload = json!({"job_id": "job-1", "format": "csv"});
        let event = DomainEvent::decode(event_types::IMPORT_JOB_CREATED, &payload).unwrap();
        assert_eq!(event.event_type(), "IMPORT_JOB_CREATED");
        match event {
            DomainEvent::ImportJobCreated(e) => {
                assert_eq!(e.job_id, "job-1");
                assert_eq!(e.format, "csv");
                assert!(e.source_url.is_none());
            }
            other => panic!("unexpected variant: {:?}", other),
        }
    }

    #[test]
    fn test_decode_invalid_payload_fails() {
        let payload = json!({"not_a_job_id": 1});
        let result = DomainEvent::decode(event_types::IMPORT_JOB_CREATED, &payload);
        assert!(result.is_err());
    }

    #[test]
    fn test_decode_unknown_type_falls_back() {
        let payload = json!({"anything": true});
        let event = DomainEvent::decode("MENU_REGENERATED", &payload).unwrap();
        match event {
            DomainEvent::Unknown {
                event_type,
                payload,
            } => {
                assert_eq!(event_type, "MENU_REGENERATED");
                assert_eq!(payload["anything"], true);
            }
            other => panic!("unexpected variant: {:?}", other),
        }
    }

    #[test]
    fn test_payload_roundtrip() {
        let event = DomainEvent::SignupCompleted(SignupCompleted {
            user_id: "user-7".to_string(),
            email: "diner@example.com".to_string(),
            display_name: Some("Diner".to_string()),
        });
        let payload = event.to_payload().unwrap();
        let decoded = DomainEvent::decode(event.event_type(), &payload).unwrap();
        assert_eq!(decoded, event);
    }
}
