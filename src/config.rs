use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

use crate::models::Coordinate;

/// Application configuration
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub server: ServerSettings,
    pub database: DatabaseSettings,
    #[serde(default)]
    pub geocoding: GeocodingSettings,
    #[serde(default)]
    pub cache: CacheSettings,
    #[serde(default)]
    pub discovery: DiscoverySettings,
    #[serde(default)]
    pub logging: LoggingSettings,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
    pub workers: Option<usize>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseSettings {
    pub url: String,
    pub max_connections: Option<u32>,
    pub min_connections: Option<u32>,
    pub acquire_timeout_secs: Option<u64>,
    pub idle_timeout_secs: Option<u64>,
    /// Upper bound on rows fetched per discovery call
    pub max_candidates: Option<i64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GeocodingSettings {
    #[serde(default = "default_geocoding_endpoint")]
    pub endpoint: String,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    pub timeout_secs: Option<u64>,
    /// Location reported as "current" when a request asks for it
    pub fallback_latitude: Option<f64>,
    pub fallback_longitude: Option<f64>,
}

impl Default for GeocodingSettings {
    fn default() -> Self {
        Self {
            endpoint: default_geocoding_endpoint(),
            user_agent: default_user_agent(),
            timeout_secs: None,
            fallback_latitude: None,
            fallback_longitude: None,
        }
    }
}

impl GeocodingSettings {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs.unwrap_or(10))
    }

    /// The configured fallback location, if both halves are set
    pub fn fallback_location(&self) -> Result<Option<Coordinate>, ConfigError> {
        match (self.fallback_latitude, self.fallback_longitude) {
            (Some(latitude), Some(longitude)) => Coordinate::new(latitude, longitude)
                .map(Some)
                .map_err(|e| ConfigError::Message(format!("geocoding fallback: {}", e))),
            (None, None) => Ok(None),
            _ => Err(ConfigError::Message(
                "geocoding fallback needs both latitude and longitude".to_string(),
            )),
        }
    }
}

fn default_geocoding_endpoint() -> String { "https://nominatim.openstreetmap.org".to_string() }
fn default_user_agent() -> String { format!("classifieds-discovery/{}", env!("CARGO_PKG_VERSION")) }

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CacheSettings {
    /// Without a Redis URL only the in-process cache is used
    pub redis_url: Option<String>,
    pub ttl_secs: Option<u64>,
    pub l1_cache_size: Option<u64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DiscoverySettings {
    #[serde(default = "default_max_results")]
    pub max_results: usize,
    /// Radius used when distance sorting is asked for without a radius
    #[serde(default = "default_radius_km")]
    pub default_radius_km: f64,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

impl Default for DiscoverySettings {
    fn default() -> Self {
        Self {
            max_results: default_max_results(),
            default_radius_km: default_radius_km(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

fn default_max_results() -> usize { crate::core::engine::DEFAULT_MAX_RESULTS }
fn default_radius_km() -> f64 { 25.0 }
fn default_request_timeout_secs() -> u64 { 10 }

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingSettings {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default = "default_log_format")]
    pub format: String,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

fn default_log_level() -> String { "info".to_string() }
fn default_log_format() -> String { "json".to_string() }

impl Settings {
    /// Load configuration from file and environment variables
    ///
    /// Configuration is loaded in the following order (later overrides earlier):
    /// 1. Default values in the struct
    /// 2. Configuration file (config/default.toml)
    /// 3. Local overrides (config/local.toml)
    /// 4. Environment variables (prefixed with CLASSIFIEDS__)
    /// 5. DATABASE_URL
    pub fn load() -> Result<Self, ConfigError> {
        let settings = Config::builder()
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name("config/local").required(false))
            // e.g., CLASSIFIEDS__SERVER__PORT -> server.port
            .add_source(environment())
            .build()?;

        Self::from_config(with_database_url(settings)?)
    }

    /// Load configuration from a custom path
    pub fn load_from<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let settings = Config::builder()
            .add_source(File::from(path.as_ref()))
            .add_source(environment())
            .build()?;

        Self::from_config(with_database_url(settings)?)
    }

    fn from_config(config: Config) -> Result<Self, ConfigError> {
        let settings: Self = config.try_deserialize()?;
        settings.geocoding.fallback_location()?;
        Ok(settings)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.discovery.request_timeout_secs)
    }
}

fn environment() -> Environment {
    Environment::with_prefix("CLASSIFIEDS")
        .prefix_separator("__")
        .separator("__")
        .try_parsing(true)
}

/// `DATABASE_URL` wins over every other source, as sqlx tooling expects
fn with_database_url(settings: Config) -> Result<Config, ConfigError> {
    match std::env::var("DATABASE_URL") {
        Ok(url) => Config::builder()
            .add_source(settings)
            .set_override("database.url", url)?
            .build(),
        Err(_) => Ok(settings),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use config::FileFormat;

    fn parse(toml: &str) -> Result<Settings, ConfigError> {
        let config = Config::builder()
            .add_source(File::from_str(toml, FileFormat::Toml))
            .build()?;
        Settings::from_config(config)
    }

    const MINIMAL: &str = r#"
        [server]
        host = "127.0.0.1"
        port = 8080

        [database]
        url = "postgres://localhost/classifieds"
    "#;

    #[test]
    fn test_minimal_settings_use_defaults() {
        let settings = parse(MINIMAL).unwrap();

        assert_eq!(settings.discovery.max_results, 100);
        assert_eq!(settings.discovery.default_radius_km, 25.0);
        assert_eq!(settings.request_timeout(), Duration::from_secs(10));
        assert!(settings.cache.redis_url.is_none());
        assert_eq!(settings.geocoding.endpoint, "https://nominatim.openstreetmap.org");
        assert_eq!(settings.geocoding.fallback_location().unwrap(), None);
    }

    #[test]
    fn test_default_logging() {
        let logging = LoggingSettings::default();
        assert_eq!(logging.level, "info");
        assert_eq!(logging.format, "json");
    }

    #[test]
    fn test_fallback_location() {
        let settings = parse(&format!(
            "{}\n[geocoding]\nfallback_latitude = 45.4215\nfallback_longitude = -75.6972\n",
            MINIMAL
        ))
        .unwrap();

        let fallback = settings.geocoding.fallback_location().unwrap().unwrap();
        assert_eq!(fallback.latitude(), 45.4215);
    }

    #[test]
    fn test_half_fallback_is_rejected() {
        let result = parse(&format!("{}\n[geocoding]\nfallback_latitude = 45.0\n", MINIMAL));
        assert!(result.is_err());
    }

    #[test]
    fn test_out_of_range_fallback_is_rejected() {
        let result = parse(&format!(
            "{}\n[geocoding]\nfallback_latitude = 95.0\nfallback_longitude = 0.0\n",
            MINIMAL
        ));
        assert!(result.is_err());
    }
}
