//! # Domain models for inventory components and auth sessions
//!
//! Defines the data structures that cross the boundary between the client and the
//! hosted backend. All of them are `Serialize + Deserialize` and match the JSON the
//! backend sends and accepts.
//!
//! ## Types
//!
//! | Struct | Represents |
//! |--------|-----------|
//! | [`ComponentRow`] | A persisted row of the `components` table, including its server-assigned `id`. Optional text columns are nullable. |
//! | [`NewComponent`] | The insert payload built from a draft. Empty optional fields are left out of the JSON so the columns stay `null`. |
//! | [`Session`] | An authenticated session as issued by the auth service (tokens plus the [`Identity`]). |
//! | [`Identity`] | The signed-in user. Opaque to the rest of the crate beyond `id` and the `email` display field. |
//!
//! [`display_or_dash`] is the rendering helper the list view uses for nullable columns.

use serde::{Deserialize, Serialize};

/// A component row as stored in the remote table.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ComponentRow {
    pub id: i64,
    pub name: String,
    pub category: Option<String>,
    pub description: Option<String>,
    pub image_url: Option<String>,
    pub quantity: i64,
}

/// A row ready to be inserted. The server assigns the id.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct NewComponent {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    pub quantity: i64,
}

impl NewComponent {
    /// Attach a server id, producing the row the table would return.
    pub fn into_row(self, id: i64) -> ComponentRow {
        ComponentRow {
            id,
            name: self.name,
            category: self.category,
            description: self.description,
            image_url: self.image_url,
            quantity: self.quantity,
        }
    }
}

/// Provider metadata attached to an identity by the auth service.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct AppMetadata {
    #[serde(default)]
    pub provider: Option<String>,
}

/// The authenticated user behind a session.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Identity {
    pub id: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub app_metadata: AppMetadata,
}

impl Identity {
    /// Email if the provider shared one, otherwise the user id.
    pub fn display_name(&self) -> &str {
        self.email.as_deref().unwrap_or(&self.id)
    }
}

/// An authenticated session.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: String,
    #[serde(default = "default_token_type")]
    pub token_type: String,
    #[serde(default)]
    pub expires_in: i64,
    /// Unix timestamp (seconds) after which the access token is invalid.
    #[serde(default)]
    pub expires_at: Option<i64>,
    pub user: Identity,
}

fn default_token_type() -> String {
    "bearer".to_string()
}

impl Session {
    /// Whether the access token expires within `margin_secs` of `now`.
    pub fn is_expired(&self, now: i64, margin_secs: i64) -> bool {
        match self.expires_at {
            Some(at) => at <= now.saturating_add(margin_secs),
            None => false,
        }
    }
}

/// Render a nullable text column, using `-` when it is missing or empty.
pub fn display_or_dash(value: Option<&str>) -> &str {
    match value {
        Some(v) if !v.is_empty() => v,
        _ => "-",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_row_deserializes_nullable_columns() {
        let json = r#"{"id":7,"name":"Resistor","category":null,"description":"10k","image_url":null,"quantity":3}"#;
        let row: ComponentRow = serde_json::from_str(json).unwrap();
        assert_eq!(row.id, 7);
        assert_eq!(row.category, None);
        assert_eq!(row.description.as_deref(), Some("10k"));
        assert_eq!(row.quantity, 3);
    }

    #[test]
    fn test_new_component_omits_empty_optionals() {
        let row = NewComponent {
            name: "Capacitor".to_string(),
            category: Some("passive".to_string()),
            quantity: 5,
            ..Default::default()
        };
        let json = serde_json::to_value(&row).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"name": "Capacitor", "category": "passive", "quantity": 5})
        );
    }

    #[test]
    fn test_session_expiry() {
        let session: Session = serde_json::from_str(
            r#"{"access_token":"a","refresh_token":"r","expires_at":1000,"user":{"id":"u1"}}"#,
        )
        .unwrap();
        assert_eq!(session.token_type, "bearer");
        assert!(!session.is_expired(900, 10));
        assert!(session.is_expired(995, 10));
        assert_eq!(session.user.display_name(), "u1");
    }

    #[test]
    fn test_display_or_dash() {
        assert_eq!(display_or_dash(None), "-");
        assert_eq!(display_or_dash(Some("")), "-");
        assert_eq!(display_or_dash(Some("ic")), "ic");
    }
}
