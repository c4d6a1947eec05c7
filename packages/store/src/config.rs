//! # Application configuration: `inventory.toml`
//!
//! Describes where the hosted backend lives and how sign-in behaves. The file is
//! optional: every section has defaults, and the `api` crate lets environment
//! variables override the backend endpoint and key.
//!
//! ## Structure
//!
//! ```toml
//! [backend]
//! url = "https://xyzcompany.supabase.co"
//! anon_key = "public-anon-key"
//!
//! [auth]
//! provider = "github"
//! redirect_to = "http://localhost:8080/"
//!
//! [table]
//! name = "components"
//! ```
//!
//! | Struct | Purpose |
//! |--------|---------|
//! | [`InventoryConfig`] | Top-level config with TOML (de)serialisation and the canonical filename. |
//! | [`BackendConfig`] | Endpoint URL and public (anon) API key. Empty means "not configured". |
//! | [`AuthConfig`] | OAuth provider (default **github**) and the optional post-login redirect. |
//! | [`TableConfig`] | Name of the component table (default **components**). |

use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct InventoryConfig {
    #[serde(default)]
    pub backend: BackendConfig,
    #[serde(default)]
    pub auth: AuthConfig,
    #[serde(default)]
    pub table: TableConfig,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct BackendConfig {
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub anon_key: String,
}

impl BackendConfig {
    pub fn is_configured(&self) -> bool {
        !self.url.is_empty() && !self.anon_key.is_empty()
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AuthConfig {
    #[serde(default = "default_provider")]
    pub provider: String,
    /// Where the provider sends the browser after sign-in. None uses the backend's site URL.
    #[serde(default)]
    pub redirect_to: Option<String>,
}

fn default_provider() -> String {
    "github".to_string()
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            redirect_to: None,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TableConfig {
    #[serde(default = "default_table")]
    pub name: String,
}

fn default_table() -> String {
    "components".to_string()
}

impl Default for TableConfig {
    fn default() -> Self {
        Self {
            name: default_table(),
        }
    }
}

impl InventoryConfig {
    pub fn new(url: impl Into<String>, anon_key: impl Into<String>) -> Self {
        Self {
            backend: BackendConfig {
                url: url.into(),
                anon_key: anon_key.into(),
            },
            ..Default::default()
        }
    }

    /// Builder method to set the post-login redirect.
    pub fn with_redirect(mut self, redirect_to: impl Into<String>) -> Self {
        self.auth.redirect_to = Some(redirect_to.into());
        self
    }

    /// The well-known filename for the config file.
    pub fn filename() -> &'static str {
        "inventory.toml"
    }

    /// Parse from TOML string.
    pub fn from_toml(s: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(s)
    }

    /// Serialize to TOML string.
    pub fn to_toml(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_file_uses_defaults() {
        let config = InventoryConfig::from_toml("").unwrap();
        assert_eq!(config, InventoryConfig::default());
        assert_eq!(config.auth.provider, "github");
        assert_eq!(config.table.name, "components");
        assert!(!config.backend.is_configured());
    }

    #[test]
    fn test_partial_file() {
        let config = InventoryConfig::from_toml(
            r#"
            [backend]
            url = "https://demo.supabase.co"
            anon_key = "anon"

            [auth]
            redirect_to = "http://localhost:8080/"
            "#,
        )
        .unwrap();
        assert!(config.backend.is_configured());
        assert_eq!(config.auth.provider, "github");
        assert_eq!(config.auth.redirect_to.as_deref(), Some("http://localhost:8080/"));
    }

    #[test]
    fn test_toml_roundtrip() {
        let config = InventoryConfig::new("https://demo.supabase.co", "anon")
            .with_redirect("http://localhost:8080/");
        let text = config.to_toml().unwrap();
        assert_eq!(InventoryConfig::from_toml(&text).unwrap(), config);
    }
}
