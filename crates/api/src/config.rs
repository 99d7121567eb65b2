use serde::Deserialize;
use std::net::SocketAddr;

use domain::services::AlertSettings;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub logging: LoggingConfig,
    pub security: SecurityConfig,
    /// JWT authentication configuration
    pub jwt: JwtAuthConfig,
    /// Push notification delivery
    #[serde(default)]
    pub fcm: FcmConfig,
    /// Alert lifecycle tunables
    #[serde(default)]
    pub alerts: AlertsConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,

    #[serde(default = "default_max_connections")]
    pub max_connections: u32,

    #[serde(default = "default_min_connections")]
    pub min_connections: u32,

    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,

    #[serde(default = "default_idle_timeout")]
    pub idle_timeout_secs: u64,
}

impl From<&DatabaseConfig> for persistence::db::DatabaseConfig {
    fn from(config: &DatabaseConfig) -> Self {
        Self {
            url: config.url.clone(),
            max_connections: config.max_connections,
            min_connections: config.min_connections,
            connect_timeout_secs: config.connect_timeout_secs,
            idle_timeout_secs: config.idle_timeout_secs,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,

    #[serde(default = "default_log_format")]
    pub format: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SecurityConfig {
    #[serde(default)]
    pub cors_origins: Vec<String>,

    /// Requests per minute per authenticated principal. 0 disables limiting.
    #[serde(default = "default_rate_limit")]
    pub rate_limit_per_minute: u32,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}
fn default_port() -> u16 {
    8080
}
fn default_request_timeout() -> u64 {
    30
}
fn default_max_connections() -> u32 {
    20
}
fn default_min_connections() -> u32 {
    5
}
fn default_connect_timeout() -> u64 {
    10
}
fn default_idle_timeout() -> u64 {
    600
}
fn default_log_level() -> String {
    "info".to_string()
}
fn default_log_format() -> String {
    "json".to_string()
}
fn default_rate_limit() -> u32 {
    100
}

#[derive(Debug, Clone, Deserialize)]
pub struct JwtAuthConfig {
    /// RSA private key in PEM format for signing tokens
    pub private_key: String,

    /// RSA public key in PEM format for verifying tokens
    pub public_key: String,

    /// Access token expiration in seconds (default: 86400 = 1 day)
    #[serde(default = "default_access_token_expiry")]
    pub access_token_expiry_secs: i64,

    /// Leeway in seconds for clock skew tolerance (default: 30)
    #[serde(default = "default_jwt_leeway")]
    pub leeway_secs: u64,
}

fn default_access_token_expiry() -> i64 {
    86400
}

fn default_jwt_leeway() -> u64 {
    30
}

/// Firebase Cloud Messaging configuration.
///
/// When disabled, push messages are logged instead of sent.
#[derive(Debug, Clone, Deserialize)]
pub struct FcmConfig {
    #[serde(default)]
    pub enabled: bool,

    #[serde(default)]
    pub project_id: String,

    /// Service account JSON, inline or as a file path.
    #[serde(default)]
    pub credentials: String,

    #[serde(default = "default_fcm_timeout_ms")]
    pub timeout_ms: u64,

    #[serde(default = "default_fcm_max_retries")]
    pub max_retries: u32,

    /// Send with high priority on Android and APNs.
    #[serde(default = "default_fcm_high_priority")]
    pub high_priority: bool,
}

impl Default for FcmConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            project_id: String::new(),
            credentials: String::new(),
            timeout_ms: default_fcm_timeout_ms(),
            max_retries: default_fcm_max_retries(),
            high_priority: default_fcm_high_priority(),
        }
    }
}

fn default_fcm_timeout_ms() -> u64 {
    10_000
}
fn default_fcm_max_retries() -> u32 {
    3
}
fn default_fcm_high_priority() -> bool {
    true
}

#[derive(Debug, Clone, Deserialize)]
pub struct AlertsConfig {
    #[serde(default = "default_alert_ttl_hours")]
    pub alert_ttl_hours: i64,

    #[serde(default = "default_notify_radius_km")]
    pub default_notify_radius_km: f64,

    #[serde(default = "default_nearby_search_radius_km")]
    pub nearby_search_radius_km: f64,

    #[serde(default = "default_max_search_radius_km")]
    pub max_search_radius_km: f64,
}

impl Default for AlertsConfig {
    fn default() -> Self {
        Self {
            alert_ttl_hours: default_alert_ttl_hours(),
            default_notify_radius_km: default_notify_radius_km(),
            nearby_search_radius_km: default_nearby_search_radius_km(),
            max_search_radius_km: default_max_search_radius_km(),
        }
    }
}

impl AlertsConfig {
    pub fn to_settings(&self) -> AlertSettings {
        AlertSettings {
            ttl: chrono::Duration::hours(self.alert_ttl_hours),
            default_notify_radius_km: self.default_notify_radius_km,
            nearby_search_radius_km: self.nearby_search_radius_km,
            max_search_radius_km: self.max_search_radius_km,
        }
    }
}

fn default_alert_ttl_hours() -> i64 {
    24
}
fn default_notify_radius_km() -> f64 {
    10.0
}
fn default_nearby_search_radius_km() -> f64 {
    50.0
}
fn default_max_search_radius_km() -> f64 {
    500.0
}

/// Configuration validation error
#[derive(Debug, thiserror::Error)]
pub enum ConfigValidationError {
    #[error("Missing required configuration: {0}")]
    MissingRequired(String),

    #[error("Invalid configuration value: {0}")]
    InvalidValue(String),
}

impl Config {
    /// Load configuration from files and environment variables.
    ///
    /// Loading order (later sources override earlier):
    /// 1. config/default.toml - base configuration with defaults
    /// 2. config/local.toml - local overrides (optional, not in git)
    /// 3. Environment variables with BL__ prefix
    pub fn load() -> Result<Self, config::ConfigError> {
        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default"))
            .add_source(config::File::with_name("config/local").required(false))
            .add_source(
                config::Environment::with_prefix("BL")
                    .prefix_separator("__")
                    .separator("__")
                    .list_separator(",")
                    .with_list_parse_key("security.cors_origins")
                    .try_parsing(true),
            )
            .build()?;

        let cfg: Self = config.try_deserialize()?;
        cfg.validate()
            .map_err(|e| config::ConfigError::Message(e.to_string()))?;
        Ok(cfg)
    }

    /// Load configuration for testing with custom overrides.
    ///
    /// Built entirely from embedded defaults and overrides so tests don't
    /// depend on the working directory.
    #[cfg(test)]
    pub fn load_for_test(overrides: &[(&str, &str)]) -> Result<Self, config::ConfigError> {
        let defaults = r#"
            [server]
            host = "0.0.0.0"
            port = 8080
            request_timeout_secs = 30

            [database]
            url = ""
            max_connections = 20
            min_connections = 5
            connect_timeout_secs = 10
            idle_timeout_secs = 600

            [logging]
            level = "info"
            format = "json"

            [security]
            cors_origins = []
            rate_limit_per_minute = 100

            [jwt]
            private_key = "test-private-key"
            public_key = "test-public-key"
            access_token_expiry_secs = 3600
            leeway_secs = 30
        "#;

        let mut builder = config::Config::builder()
            .add_source(config::File::from_str(defaults, config::FileFormat::Toml));

        for (key, value) in overrides {
            builder = builder.set_override(*key, *value)?;
        }

        let cfg: Self = builder.build()?.try_deserialize()?;
        // Validation is left to the individual tests
        Ok(cfg)
    }

    /// Validate configuration values.
    fn validate(&self) -> Result<(), ConfigValidationError> {
        if self.database.url.is_empty() {
            return Err(ConfigValidationError::MissingRequired(
                "BL__DATABASE__URL environment variable must be set".to_string(),
            ));
        }

        if self.server.port == 0 {
            return Err(ConfigValidationError::InvalidValue(
                "Server port cannot be 0".to_string(),
            ));
        }

        if self.database.min_connections > self.database.max_connections {
            return Err(ConfigValidationError::InvalidValue(
                "min_connections cannot exceed max_connections".to_string(),
            ));
        }

        if self.alerts.alert_ttl_hours <= 0 {
            return Err(ConfigValidationError::InvalidValue(
                "alerts.alert_ttl_hours must be positive".to_string(),
            ));
        }

        let radii = [
            ("default_notify_radius_km", self.alerts.default_notify_radius_km),
            ("nearby_search_radius_km", self.alerts.nearby_search_radius_km),
            ("max_search_radius_km", self.alerts.max_search_radius_km),
        ];
        for (name, value) in radii {
            if let Err(e) = shared::validation::validate_radius_km(value) {
                return Err(ConfigValidationError::InvalidValue(format!(
                    "alerts.{}: {}",
                    name,
                    shared::validation::message_of(&e)
                )));
            }
            if value > self.alerts.max_search_radius_km {
                return Err(ConfigValidationError::InvalidValue(format!(
                    "alerts.{} cannot exceed max_search_radius_km",
                    name
                )));
            }
        }

        if self.fcm.enabled && (self.fcm.project_id.is_empty() || self.fcm.credentials.is_empty())
        {
            return Err(ConfigValidationError::MissingRequired(
                "fcm.project_id and fcm.credentials are required when FCM is enabled".to_string(),
            ));
        }

        Ok(())
    }

    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigValidationError> {
        format!("{}:{}", self.server.host, self.server.port)
            .parse()
            .map_err(|e| ConfigValidationError::InvalidValue(format!("server address: {}", e)))
    }
}
