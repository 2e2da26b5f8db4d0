use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::OnceLock;

use crate::model::sat::{
    DEFAULT_TRANSMITTER_API_URL, TleSourceConfig, UpdateIntervals, default_sources,
};
use crate::module::visibility::{DEFAULT_HORIZON_SECONDS, PassQuery, SearchConfig, SearchStrategy};

pub static CONFIG: OnceLock<BackendConfig> = OnceLock::new();

const CONFIG_ENV: &str = "SATVIS_CONFIG";
const DEFAULT_CONFIG_PATH: &str = "config.toml";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default = "default_log_level")]
    pub log_level: String,

    #[serde(default = "default_log_dir")]
    pub log_dir: String,

    /// Where the catalog cache file lives
    #[serde(default = "default_cache_dir")]
    pub cache_dir: String,

    #[serde(default = "default_update_interval_minutes")]
    pub update_interval_minutes: u64,

    /// SatNOGS transmitter refresh
    #[serde(default = "default_transmitter_update_interval_minutes")]
    pub transmitter_update_interval_minutes: u64,

    #[serde(default = "default_transmitter_api_url")]
    pub transmitter_api_url: String,

    /// Refresh elements and transmitters once at start-up, in the background
    #[serde(default = "default_perform_initial_update")]
    pub perform_initial_update: bool,

    #[serde(default = "default_sources")]
    pub sources: Vec<TleSourceConfig>,

    #[serde(default)]
    pub search: SearchSettings,

    #[serde(default)]
    pub passes: PassSettings,
}

/// AOS/LOS search. A step of 1 scans every second, anything larger
/// samples coarsely and bisects. The horizon cannot exceed 5400 s.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchSettings {
    #[serde(default = "default_horizon_seconds")]
    pub horizon_seconds: i64,

    #[serde(default = "default_search_step_seconds")]
    pub step_seconds: u32,
}

/// Defaults for /api/passes
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PassSettings {
    #[serde(default = "default_window_hours")]
    pub window_hours: u32,

    #[serde(default = "default_pass_step_seconds")]
    pub step_seconds: u32,

    #[serde(default)]
    pub min_elevation_deg: f64,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    3000
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_dir() -> String {
    "logs".to_string()
}

fn default_cache_dir() -> String {
    "data".to_string()
}

fn default_update_interval_minutes() -> u64 {
    360
}

fn default_transmitter_update_interval_minutes() -> u64 {
    1440
}

fn default_transmitter_api_url() -> String {
    DEFAULT_TRANSMITTER_API_URL.to_string()
}

fn default_perform_initial_update() -> bool {
    true
}

fn default_horizon_seconds() -> i64 {
    DEFAULT_HORIZON_SECONDS
}

fn default_search_step_seconds() -> u32 {
    1
}

fn default_window_hours() -> u32 {
    24
}

fn default_pass_step_seconds() -> u32 {
    60
}

impl Default for SearchSettings {
    fn default() -> Self {
        Self {
            horizon_seconds: default_horizon_seconds(),
            step_seconds: default_search_step_seconds(),
        }
    }
}

impl Default for PassSettings {
    fn default() -> Self {
        Self {
            window_hours: default_window_hours(),
            step_seconds: default_pass_step_seconds(),
            min_elevation_deg: 0.0,
        }
    }
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            log_level: default_log_level(),
            log_dir: default_log_dir(),
            cache_dir: default_cache_dir(),
            update_interval_minutes: default_update_interval_minutes(),
            transmitter_update_interval_minutes: default_transmitter_update_interval_minutes(),
            transmitter_api_url: default_transmitter_api_url(),
            perform_initial_update: default_perform_initial_update(),
            sources: default_sources(),
            search: SearchSettings::default(),
            passes: PassSettings::default(),
        }
    }
}

impl BackendConfig {
    pub fn from_file<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("Failed to read config file '{}': {}", path.display(), e))?;
        let config: BackendConfig = toml::from_str(&content)
            .map_err(|e| anyhow::anyhow!("Failed to parse config file '{}': {}", path.display(), e))?;
        Ok(config)
    }

    pub fn server_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn update_intervals(&self) -> UpdateIntervals {
        UpdateIntervals {
            catalog_minutes: self.update_interval_minutes,
            transmitter_minutes: self.transmitter_update_interval_minutes,
        }
    }

    pub fn search_config(&self) -> SearchConfig {
        let strategy = if self.search.step_seconds > 1 {
            SearchStrategy::Coarse {
                step_seconds: self.search.step_seconds,
            }
        } else {
            SearchStrategy::Exact
        };
        SearchConfig {
            horizon_seconds: self.search.horizon_seconds.clamp(1, DEFAULT_HORIZON_SECONDS),
            strategy,
        }
    }

    pub fn pass_query(&self) -> PassQuery {
        PassQuery {
            window_hours: self.passes.window_hours,
            min_elevation_deg: self.passes.min_elevation_deg,
            step_seconds: self.passes.step_seconds.max(1),
        }
    }
}

/// Load the configuration into `CONFIG`.
///
/// Reads `$SATVIS_CONFIG` or `config.toml`; a missing file means defaults.
pub fn read_config() -> anyhow::Result<&'static BackendConfig> {
    let path = std::env::var(CONFIG_ENV).unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
    let config = if Path::new(&path).exists() {
        BackendConfig::from_file(&path)?
    } else {
        BackendConfig::default()
    };
    Ok(CONFIG.get_or_init(|| config))
}

#[cfg(test)]
mod tests {
    use super::*;
    use satvis_common::SatelliteCategory;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_empty_file_gives_defaults() {
        let config: BackendConfig = toml::from_str("").unwrap();
        assert_eq!(config.port, 3000);
        assert_eq!(config.search.horizon_seconds, 5400);
        assert_eq!(config.search_config(), SearchConfig::default());
        assert_eq!(config.sources, default_sources());
        assert_eq!(config.server_address(), "0.0.0.0:3000");
        assert_eq!(config.update_intervals().transmitter_minutes, 1440);
        assert_eq!(config.transmitter_api_url, "https://db.satnogs.org/api/transmitters/");
    }

    #[test]
    fn test_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        write!(
            file,
            r#"
host = "127.0.0.1"
port = 8080
update_interval_minutes = 30
transmitter_update_interval_minutes = 720

[search]
step_seconds = 30

[passes]
window_hours = 48
min_elevation_deg = 10.0

[[sources]]
url = "https://celestrak.org/NORAD/elements/noaa.txt"
category = "weather"
"#
        )
        .unwrap();

        let config = BackendConfig::from_file(file.path()).unwrap();
        assert_eq!(config.server_address(), "127.0.0.1:8080");
        assert_eq!(config.update_intervals().catalog_minutes, 30);
        assert_eq!(config.update_intervals().transmitter_minutes, 720);
        assert_eq!(
            config.search_config().strategy,
            SearchStrategy::Coarse { step_seconds: 30 }
        );
        assert_eq!(config.pass_query().window_hours, 48);
        assert_eq!(config.pass_query().step_seconds, 60);
        assert_eq!(config.sources.len(), 1);
        assert_eq!(config.sources[0].category, SatelliteCategory::Weather);
    }

    #[test]
    fn test_search_horizon_is_capped() {
        let config: BackendConfig = toml::from_str("[search]\nhorizon_seconds = 86400").unwrap();
        assert_eq!(config.search_config().horizon_seconds, DEFAULT_HORIZON_SECONDS);

        let config: BackendConfig = toml::from_str("[search]\nhorizon_seconds = 600").unwrap();
        assert_eq!(config.search_config().horizon_seconds, 600);
    }

    #[test]
    fn test_from_file_reports_bad_toml() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "port = \"not a number\"").unwrap();
        assert!(BackendConfig::from_file(file.path()).is_err());
        assert!(BackendConfig::from_file("/nonexistent/config.toml").is_err());
    }
}
