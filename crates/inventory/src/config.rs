//! Configuration loading and validation for the inventory service.
//!
//! All values are read from environment variables at startup. The process will
//! exit with a clear error message if any required variable is missing or invalid.

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::key::SecretKey;

/// Where records are persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    /// AWS DynamoDB table named by `TABLE_NAME`.
    Dynamodb,
    /// Process-local map; contents are lost on exit.
    Memory,
}

/// A secret string that never appears in `Debug` output.
#[derive(Clone, Deserialize)]
#[serde(transparent)]
pub struct Redacted(String);

impl Redacted {
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Debug for Redacted {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("[REDACTED]")
    }
}

/// Validated service configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// AES-256 key as 64 hex characters. **Required.**
    pub secret_key: SecretKey,

    /// DynamoDB table holding the records. **Required** for the `dynamodb` backend.
    #[serde(default)]
    pub table_name: Option<String>,

    /// Storage backend selector.
    #[serde(default = "default_storage_backend")]
    pub storage_backend: StorageBackend,

    /// Endpoint override for DynamoDB (e.g. DynamoDB Local).
    #[serde(default)]
    pub dynamodb_endpoint: Option<String>,

    /// Bearer token required on item routes. Unset or empty disables the check.
    #[serde(default)]
    pub auth_token: Option<Redacted>,

    /// Port the HTTP server listens on.
    #[serde(default = "default_listen_port")]
    pub listen_port: u16,

    /// OTLP endpoint for span export. Unset disables export.
    #[serde(default)]
    pub otel_exporter_otlp_endpoint: Option<String>,

    /// Tracing log level (e.g. `"info"`, `"debug"`).
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_storage_backend() -> StorageBackend {
    StorageBackend::Dynamodb
}
fn default_listen_port() -> u16 {
    3000
}
fn default_log_level() -> String {
    "info".into()
}

impl Config {
    /// Load and validate configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if any required variable is absent or cannot be parsed,
    /// including a `SECRET_KEY` that is not 64 hex characters.
    pub fn from_env() -> Result<Self> {
        Self::from_source(config::Environment::default())
    }

    /// Load and validate configuration from an environment source.
    fn from_source(env: config::Environment) -> Result<Self> {
        let cfg = config::Config::builder()
            .add_source(env)
            .build()
            .context("failed to build configuration from environment")?;

        let c: Config = cfg
            .try_deserialize()
            .context("failed to deserialise configuration (is SECRET_KEY 64 hex characters?)")?;

        c.validate()?;
        Ok(c)
    }

    /// The bearer token, if authorisation is enabled.
    pub fn auth_token(&self) -> Option<&str> {
        self.auth_token
            .as_ref()
            .map(Redacted::expose)
            .filter(|t| !t.is_empty())
    }

    /// Validate all fields, returning a descriptive error on the first failure.
    fn validate(&self) -> Result<()> {
        if self.storage_backend == StorageBackend::Dynamodb {
            ensure_non_empty(self.table_name.as_deref().unwrap_or(""), "TABLE_NAME")?;
        }
        if let Some(endpoint) = &self.otel_exporter_otlp_endpoint {
            ensure_non_empty(endpoint, "OTEL_EXPORTER_OTLP_ENDPOINT")?;
        }
        if self.listen_port == 0 {
            anyhow::bail!("LISTEN_PORT must be > 0");
        }
        Ok(())
    }
}

fn ensure_non_empty(value: &str, name: &str) -> Result<()> {
    if value.trim().is_empty() {
        anyhow::bail!("{name} is required and must not be empty");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;
    use crate::crypto::KEY_LEN;

    const HEX_KEY: &str = "000102030405060708090a0b0c0d0e0f101112131415161718191a1b1c1d1e1f";

    fn load(vars: &[(&str, &str)]) -> Result<Config> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
            .collect();
        Config::from_source(config::Environment::default().source(Some(map)))
    }

    fn base() -> Config {
        Config {
            secret_key: SecretKey::from_bytes(&[0x42u8; KEY_LEN]).unwrap(),
            table_name: Some("inventory".into()),
            storage_backend: default_storage_backend(),
            dynamodb_endpoint: None,
            auth_token: None,
            listen_port: default_listen_port(),
            otel_exporter_otlp_endpoint: None,
            log_level: default_log_level(),
        }
    }

    #[test]
    fn defaults_are_correct() {
        assert_eq!(default_storage_backend(), StorageBackend::Dynamodb);
        assert_eq!(default_listen_port(), 3000);
        assert_eq!(default_log_level(), "info");
    }

    #[test]
    fn validate_accepts_base() {
        assert!(base().validate().is_ok());
    }

    #[test]
    fn validate_rejects_missing_table_for_dynamodb() {
        let cfg = Config {
            table_name: None,
            ..base()
        };
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn memory_backend_needs_no_table() {
        let cfg = Config {
            table_name: None,
            storage_backend: StorageBackend::Memory,
            ..base()
        };
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn validate_rejects_zero_port() {
        let cfg = Config {
            listen_port: 0,
            ..base()
        };
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn empty_auth_token_disables_auth() {
        let cfg = Config {
            auth_token: Some(Redacted(String::new())),
            ..base()
        };
        assert_eq!(cfg.auth_token(), None);

        let cfg = Config {
            auth_token: Some(Redacted("s3cret".into())),
            ..base()
        };
        assert_eq!(cfg.auth_token(), Some("s3cret"));
    }

    #[test]
    fn debug_output_hides_secrets() {
        let cfg = Config {
            auth_token: Some(Redacted("s3cret".into())),
            ..base()
        };
        let rendered = format!("{cfg:?}");
        assert!(!rendered.contains("s3cret"));
        assert!(rendered.contains("REDACTED"));
    }

    #[test]
    fn storage_backend_parses_lowercase() {
        let b: StorageBackend = serde_json::from_str(r#""memory""#).unwrap();
        assert_eq!(b, StorageBackend::Memory);
    }

    #[test]
    fn loads_memory_backend_from_environment() {
        let cfg = load(&[
            ("SECRET_KEY", HEX_KEY),
            ("STORAGE_BACKEND", "memory"),
            ("LISTEN_PORT", "8080"),
            ("AUTH_TOKEN", "tok"),
        ])
        .unwrap();
        assert_eq!(cfg.storage_backend, StorageBackend::Memory);
        assert_eq!(cfg.listen_port, 8080);
        assert_eq!(cfg.auth_token(), Some("tok"));
        assert_eq!(cfg.secret_key.as_bytes()[31], 0x1f);
    }

    #[test]
    fn missing_secret_key_aborts_loading() {
        let err = load(&[("STORAGE_BACKEND", "memory")]).unwrap_err();
        assert!(format!("{err:#}").contains("secret_key"), "{err:#}");
    }

    #[test]
    fn short_secret_key_aborts_loading() {
        assert!(load(&[("SECRET_KEY", &HEX_KEY[..62]), ("STORAGE_BACKEND", "memory")]).is_err());
    }

    #[test]
    fn dynamodb_backend_requires_table_name() {
        assert!(load(&[("SECRET_KEY", HEX_KEY)]).is_err());
        let cfg = load(&[("SECRET_KEY", HEX_KEY), ("TABLE_NAME", "inventory")]).unwrap();
        assert_eq!(cfg.storage_backend, StorageBackend::Dynamodb);
        assert_eq!(cfg.table_name.as_deref(), Some("inventory"));
    }
}
