//! Supabase connection settings from `inventory.toml` and environment variables.

use store::InventoryConfig;

/// Connection settings for the hosted backend.
#[derive(Debug, Clone, PartialEq)]
pub struct SupabaseConfig {
    /// Project URL without a trailing slash, e.g. `https://xyz.supabase.co`.
    pub url: String,
    pub anon_key: String,
    pub provider: String,
    pub redirect_to: Option<String>,
    pub table: String,
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{0} not set")]
    Missing(&'static str),
    #[error("invalid {name}: {reason}")]
    Invalid { name: &'static str, reason: String },
    #[error("failed to read {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

impl SupabaseConfig {
    /// Load settings: `inventory.toml` (if present) overridden by
    /// `SUPABASE_URL`, `SUPABASE_ANON_KEY` and `AUTH_REDIRECT_URL`.
    #[cfg(not(target_arch = "wasm32"))]
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let path = std::env::var("INVENTORY_CONFIG")
            .unwrap_or_else(|_| InventoryConfig::filename().to_string());
        let file = match std::fs::read_to_string(&path) {
            Ok(text) => InventoryConfig::from_toml(&text).map_err(|e| ConfigError::Invalid {
                name: "inventory.toml",
                reason: e.to_string(),
            })?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => InventoryConfig::default(),
            Err(source) => return Err(ConfigError::Read { path, source }),
        };

        Self::resolve(file, |key| std::env::var(key).ok())
    }

    /// Browser builds read the variables at compile time.
    #[cfg(target_arch = "wasm32")]
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::resolve(InventoryConfig::default(), |key| match key {
            "SUPABASE_URL" => option_env!("SUPABASE_URL").map(str::to_string),
            "SUPABASE_ANON_KEY" => option_env!("SUPABASE_ANON_KEY").map(str::to_string),
            "AUTH_REDIRECT_URL" => option_env!("AUTH_REDIRECT_URL").map(str::to_string),
            _ => None,
        })
    }

    /// Merge a config file with variables looked up through `env`.
    pub fn resolve(
        file: InventoryConfig,
        env: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ConfigError> {
        let non_empty = |value: Option<String>| value.filter(|v| !v.trim().is_empty());

        let url = non_empty(env("SUPABASE_URL"))
            .or_else(|| non_empty(Some(file.backend.url.clone())))
            .ok_or(ConfigError::Missing("SUPABASE_URL"))?;
        let anon_key = non_empty(env("SUPABASE_ANON_KEY"))
            .or_else(|| non_empty(Some(file.backend.anon_key.clone())))
            .ok_or(ConfigError::Missing("SUPABASE_ANON_KEY"))?;
        let redirect_to = non_empty(env("AUTH_REDIRECT_URL")).or(file.auth.redirect_to);

        let parsed = reqwest::Url::parse(url.trim()).map_err(|e| ConfigError::Invalid {
            name: "SUPABASE_URL",
            reason: e.to_string(),
        })?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(ConfigError::Invalid {
                name: "SUPABASE_URL",
                reason: format!("unsupported scheme {}", parsed.scheme()),
            });
        }

        Ok(Self {
            url: url.trim().trim_end_matches('/').to_string(),
            anon_key: anon_key.trim().to_string(),
            provider: file.auth.provider,
            redirect_to,
            table: file.table.name,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_env_only() {
        let config = SupabaseConfig::resolve(
            InventoryConfig::default(),
            env_from(&[
                ("SUPABASE_URL", "https://demo.supabase.co/"),
                ("SUPABASE_ANON_KEY", "anon"),
            ]),
        )
        .unwrap();
        assert_eq!(config.url, "https://demo.supabase.co");
        assert_eq!(config.anon_key, "anon");
        assert_eq!(config.provider, "github");
        assert_eq!(config.table, "components");
        assert_eq!(config.redirect_to, None);
    }

    #[test]
    fn test_env_overrides_file() {
        let file = InventoryConfig::new("https://file.supabase.co", "file-key")
            .with_redirect("http://localhost:8080/");
        let config = SupabaseConfig::resolve(
            file,
            env_from(&[("SUPABASE_ANON_KEY", "env-key"), ("SUPABASE_URL", "")]),
        )
        .unwrap();
        assert_eq!(config.url, "https://file.supabase.co");
        assert_eq!(config.anon_key, "env-key");
        assert_eq!(config.redirect_to.as_deref(), Some("http://localhost:8080/"));
    }

    #[test]
    fn test_missing_key() {
        let err = SupabaseConfig::resolve(
            InventoryConfig::default(),
            env_from(&[("SUPABASE_URL", "https://demo.supabase.co")]),
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::Missing("SUPABASE_ANON_KEY")));
    }

    #[test]
    fn test_invalid_url() {
        let err = SupabaseConfig::resolve(
            InventoryConfig::default(),
            env_from(&[("SUPABASE_URL", "ftp://demo"), ("SUPABASE_ANON_KEY", "anon")]),
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { name: "SUPABASE_URL", .. }));
    }
}
