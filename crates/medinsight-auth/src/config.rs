//! Identity provider and backend service configuration.
//!
//! The configuration is built once at process start and handed to the
//! components that need it. Nothing in this crate reads the environment.
//!
//! # Example (TOML)
//!
//! ```toml
//! [identity.provider]
//! url = "http://localhost:8180"
//! realm = "medinsight"
//! client_id = "medinsight-client"
//!
//! [identity.services]
//! patient_url = "http://localhost:8081"
//! ```

use std::time::Duration;

use serde::{Deserialize, Serialize};
use url::Url;

/// Root configuration for the identity gateway.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct IdentityConfig {
    /// Identity provider connection settings.
    pub provider: ProviderConfig,

    /// Backend profile service locations.
    pub services: ServicesConfig,

    /// Public frontend client maintained by the setup endpoint.
    pub frontend_client: FrontendClientConfig,
}

/// Identity provider (Keycloak) settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ProviderConfig {
    /// Base URL of the provider, without the `/realms` suffix.
    pub url: String,

    /// Realm holding the application users and roles.
    pub realm: String,

    /// Client used for the end-user password grant.
    pub client_id: String,

    /// Realm of the service account used for admin calls.
    pub admin_realm: String,

    /// Client used for the admin password grant.
    pub admin_client_id: String,

    /// Service account username.
    pub admin_username: String,

    /// Service account password.
    pub admin_password: String,

    /// Prefix prepended to application role names to form provider role names.
    pub role_prefix: String,

    /// Page size used when listing realm users.
    pub list_max: u32,

    /// Deadline for each outbound provider call, in milliseconds.
    pub request_timeout_ms: u64,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            url: "http://localhost:8180".to_string(),
            realm: "medinsight".to_string(),
            client_id: "medinsight-client".to_string(),
            admin_realm: "master".to_string(),
            admin_client_id: "admin-cli".to_string(),
            admin_username: "admin".to_string(),
            admin_password: "admin".to_string(),
            role_prefix: "ROLE_".to_string(),
            list_max: 1000,
            request_timeout_ms: 10_000,
        }
    }
}

impl ProviderConfig {
    /// Returns the per-call request timeout.
    #[must_use]
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    /// Returns the base URL without a trailing slash.
    #[must_use]
    pub fn base_url(&self) -> &str {
        self.url.trim_end_matches('/')
    }
}

/// Base URLs of the backend profile services.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ServicesConfig {
    /// Patient service base URL.
    pub patient_url: String,

    /// Medecin service base URL.
    pub medecin_url: String,

    /// Gestion (manager) service base URL.
    pub gestion_url: String,

    /// Deadline for each profile creation call, in milliseconds.
    pub request_timeout_ms: u64,
}

impl Default for ServicesConfig {
    fn default() -> Self {
        Self {
            patient_url: "http://localhost:8081".to_string(),
            medecin_url: "http://localhost:8082".to_string(),
            gestion_url: "http://localhost:8084".to_string(),
            request_timeout_ms: 10_000,
        }
    }
}

impl ServicesConfig {
    /// Returns the per-call request timeout.
    #[must_use]
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }
}

/// Public client registered in the realm for the browser application.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct FrontendClientConfig {
    /// Client id of the frontend application.
    pub client_id: String,

    /// Root URL the frontend is served from.
    pub root_url: String,
}

impl Default for FrontendClientConfig {
    fn default() -> Self {
        Self {
            client_id: "medinsight-frontend".to_string(),
            root_url: "http://localhost:3000".to_string(),
        }
    }
}

/// Configuration validation errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// An invalid configuration value was provided.
    #[error("Invalid configuration value: {0}")]
    InvalidValue(String),

    /// A required configuration value is missing.
    #[error("Missing required configuration: {0}")]
    Missing(String),
}

impl IdentityConfig {
    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Missing` if a realm, client or admin account is
    /// empty, and `ConfigError::InvalidValue` for unparsable URLs or a zero
    /// timeout.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let provider = &self.provider;

        check_url("identity.provider.url", &provider.url)?;
        check_url("identity.services.patient_url", &self.services.patient_url)?;
        check_url("identity.services.medecin_url", &self.services.medecin_url)?;
        check_url("identity.services.gestion_url", &self.services.gestion_url)?;

        for (name, value) in [
            ("identity.provider.realm", &provider.realm),
            ("identity.provider.client_id", &provider.client_id),
            ("identity.provider.admin_realm", &provider.admin_realm),
            ("identity.provider.admin_client_id", &provider.admin_client_id),
            ("identity.provider.admin_username", &provider.admin_username),
        ] {
            if value.trim().is_empty() {
                return Err(ConfigError::Missing(name.to_string()));
            }
        }

        if provider.request_timeout_ms == 0 || self.services.request_timeout_ms == 0 {
            return Err(ConfigError::InvalidValue(
                "request_timeout_ms must be > 0".to_string(),
            ));
        }

        if provider.list_max == 0 {
            return Err(ConfigError::InvalidValue(
                "identity.provider.list_max must be > 0".to_string(),
            ));
        }

        Ok(())
    }
}

fn check_url(name: &str, value: &str) -> Result<(), ConfigError> {
    let url = Url::parse(value)
        .map_err(|e| ConfigError::InvalidValue(format!("{name}: '{value}' ({e})")))?;

    match url.scheme() {
        "http" | "https" => Ok(()),
        other => Err(ConfigError::InvalidValue(format!(
            "{name}: unsupported scheme '{other}'"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_development_setup() {
        let config = IdentityConfig::default();

        assert_eq!(config.provider.url, "http://localhost:8180");
        assert_eq!(config.provider.realm, "medinsight");
        assert_eq!(config.provider.client_id, "medinsight-client");
        assert_eq!(config.provider.admin_client_id, "admin-cli");
        assert_eq!(config.services.patient_url, "http://localhost:8081");
        assert_eq!(config.services.medecin_url, "http://localhost:8082");
        assert_eq!(config.services.gestion_url, "http://localhost:8084");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_base_url_trims_trailing_slash() {
        let provider = ProviderConfig {
            url: "http://kc.local:8080/".to_string(),
            ..Default::default()
        };
        assert_eq!(provider.base_url(), "http://kc.local:8080");
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut config = IdentityConfig::default();
        config.provider.url = "not a url".to_string();
        assert!(matches!(config.validate(), Err(ConfigError::InvalidValue(_))));

        let mut config = IdentityConfig::default();
        config.services.gestion_url = "ftp://gestion".to_string();
        assert!(matches!(config.validate(), Err(ConfigError::InvalidValue(_))));

        let mut config = IdentityConfig::default();
        config.provider.realm = "  ".to_string();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("identity.provider.realm"));

        let mut config = IdentityConfig::default();
        config.provider.request_timeout_ms = 0;
        assert!(config.validate().is_err());
    }
}
