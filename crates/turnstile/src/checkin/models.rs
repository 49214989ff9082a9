//! Request and response bodies for the check-in operations.

use serde::{Deserialize, Serialize};

/// Where an event keeps its participant list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EventDatabase {
    /// A shared Google spreadsheet.
    GoogleSpreadsheet,
    /// The service's own store.
    #[serde(rename = "OwnDB")]
    OwnDb,
}

/// Body of `CreateEvent`.
///
/// ```
/// use turnstile::checkin::{EventCreation, EventDatabase};
///
/// let body: EventCreation =
///     serde_json::from_str(r#"{"name":"Launch","database":"OwnDB"}"#).unwrap();
/// assert_eq!(body.database, EventDatabase::OwnDb);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventCreation {
    /// Event name.
    pub name: String,
    /// Participant store.
    pub database: EventDatabase,
}

/// An event as returned by the service. Every field is optional on the
/// wire; timestamps are RFC 3339 strings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    /// Event ID.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    /// Event name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Participant store.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub database: Option<String>,
    /// Creation time.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    /// Last update time.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_creation_database_names() {
        let body: EventCreation =
            serde_json::from_str(r#"{"name":"Launch","database":"GoogleSpreadsheet"}"#).unwrap();
        assert_eq!(body.database, EventDatabase::GoogleSpreadsheet);
        assert_eq!(
            serde_json::to_string(&EventDatabase::OwnDb).unwrap(),
            r#""OwnDB""#
        );
    }

    #[test]
    fn test_event_creation_requires_both_fields() {
        assert!(serde_json::from_str::<EventCreation>(r#"{"name":"Launch"}"#).is_err());
        assert!(serde_json::from_str::<EventCreation>(r#"{"name":"x","database":"Redis"}"#).is_err());
    }

    #[test]
    fn test_event_omits_absent_fields() {
        let event = Event {
            id: Some(7),
            name: Some("Launch".into()),
            created_at: Some("2026-10-16T09:00:00Z".into()),
            ..Event::default()
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"id": 7, "name": "Launch", "createdAt": "2026-10-16T09:00:00Z"})
        );
        assert_eq!(serde_json::from_value::<Event>(json).unwrap(), event);
    }
}
