use medinsight_auth::IdentityConfig;
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    /// Identity provider, profile services and frontend client settings
    #[serde(default)]
    pub identity: IdentityConfig,
}

impl AppConfig {
    pub fn validate(&self) -> Result<(), String> {
        if self.server.port == 0 {
            return Err("server.port must be > 0".into());
        }
        if self.server.body_limit_bytes == 0 {
            return Err("server.body_limit_bytes must be > 0".into());
        }
        let lvl = self.logging.level.to_ascii_lowercase();
        let valid_levels = ["trace", "debug", "info", "warn", "error", "off"];
        if !valid_levels.contains(&lvl.as_str()) {
            return Err(format!("logging.level must be one of {valid_levels:?}"));
        }
        self.identity.validate().map_err(|e| e.to_string())
    }

    pub fn addr(&self) -> SocketAddr {
        use std::net::{IpAddr, Ipv4Addr};
        let host: IpAddr = self
            .server
            .host
            .parse()
            .unwrap_or(IpAddr::V4(Ipv4Addr::new(0, 0, 0, 0)));
        SocketAddr::from((host, self.server.port))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_body_limit")]
    pub body_limit_bytes: usize,
}

fn default_host() -> String {
    "0.0.0.0".into()
}
fn default_port() -> u16 {
    3001
}
fn default_body_limit() -> usize {
    1024 * 1024
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            body_limit_bytes: default_body_limit(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
}

fn default_log_level() -> String {
    "info".into()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

pub mod loader {
    use super::AppConfig;
    use config::{Config, ConfigBuilder, Environment, File, builder::DefaultState};
    use std::collections::HashMap;
    use std::env;
    use std::path::PathBuf;

    /// Default configuration file looked up in the working directory.
    pub const DEFAULT_CONFIG_FILE: &str = "medinsight.toml";

    /// Deployment variables that predate the `MEDINSIGHT__` scheme and the
    /// keys they set. They win over both the file and prefixed variables.
    const LEGACY_VARS: [(&str, &str); 7] = [
        ("KEYCLOAK_URL", "identity.provider.url"),
        ("KEYCLOAK_REALM", "identity.provider.realm"),
        ("KEYCLOAK_ADMIN", "identity.provider.admin_username"),
        ("KEYCLOAK_ADMIN_PASSWORD", "identity.provider.admin_password"),
        ("PATIENT_SERVICE_URL", "identity.services.patient_url"),
        ("MEDECIN_SERVICE_URL", "identity.services.medecin_url"),
        ("GESTION_SERVICE_URL", "identity.services.gestion_url"),
    ];

    pub fn load_config(path: Option<&str>) -> Result<AppConfig, String> {
        load_config_with_env(path, env::vars().collect())
    }

    /// Loads the configuration against an explicit set of environment
    /// variables instead of the process environment.
    pub fn load_config_with_env(
        path: Option<&str>,
        vars: HashMap<String, String>,
    ) -> Result<AppConfig, String> {
        let mut builder = Config::builder();
        let pathbuf = PathBuf::from(path.unwrap_or(DEFAULT_CONFIG_FILE));
        if pathbuf.exists() {
            builder = builder.add_source(File::from(pathbuf));
        }
        // Environment variable overrides, e.g., MEDINSIGHT__SERVER__PORT=9090
        builder = builder.add_source(
            Environment::with_prefix("MEDINSIGHT")
                .try_parsing(true)
                .separator("__")
                .source(Some(vars.clone().into_iter().collect())),
        );
        builder = apply_legacy_overrides(builder, &vars)?;

        let cfg = builder
            .build()
            .map_err(|e| format!("config build error: {e}"))?;
        let merged: AppConfig = cfg
            .try_deserialize()
            .map_err(|e| format!("config deserialize error: {e}"))?;
        merged.validate()?;
        Ok(merged)
    }

    fn apply_legacy_overrides(
        mut builder: ConfigBuilder<DefaultState>,
        vars: &HashMap<String, String>,
    ) -> Result<ConfigBuilder<DefaultState>, String> {
        for (var, key) in LEGACY_VARS {
            let value = vars.get(var).filter(|v| !v.is_empty()).cloned();
            builder = builder
                .set_override_option(key, value)
                .map_err(|e| format!("config override error for {var}: {e}"))?;
        }
        Ok(builder)
    }
}
