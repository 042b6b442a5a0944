use crate::scenarios::{knn::DEFAULT_NEIGHBOURS, DEFAULT_SEED};
use std::env;
use std::fmt;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;

pub const DEFAULT_BANDS_PATH: &str = "data/bands_v1.json";
pub const DEFAULT_DATASET_PATH: &str = "data/suppliers.json";
const DEFAULT_HOST: &str = "127.0.0.1";
const DEFAULT_PORT: u16 = 3000;
const DEFAULT_LOG_LEVEL: &str = "info";

/// Deployment stage, read from `APP_ENV`. Unknown values mean development.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AppEnvironment {
    #[default]
    Development,
    Test,
    Production,
}

impl AppEnvironment {
    fn parse(value: &str) -> Self {
        match value.to_ascii_lowercase().as_str() {
            "prod" | "production" => Self::Production,
            "test" | "ci" => Self::Test,
            _ => Self::Development,
        }
    }
}

/// Everything the binary needs: where to listen, how loud to log, and
/// where the engine finds its inputs.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub environment: AppEnvironment,
    pub server: ServerConfig,
    pub telemetry: TelemetryConfig,
    pub engine: EngineConfig,
}

impl AppConfig {
    /// Reads `.env` when present, then the process environment.
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        Ok(Self {
            environment: non_empty_var("APP_ENV")
                .map(|raw| AppEnvironment::parse(&raw))
                .unwrap_or_default(),
            server: ServerConfig::from_env()?,
            telemetry: TelemetryConfig::from_env(),
            engine: EngineConfig::from_env()?,
        })
    }
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl ServerConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let port = match non_empty_var("APP_PORT") {
            Some(raw) => raw.parse::<u16>().map_err(|_| ConfigError::InvalidPort)?,
            None => DEFAULT_PORT,
        };
        Ok(Self {
            host: non_empty_var("APP_HOST").unwrap_or_else(|| DEFAULT_HOST.to_string()),
            port,
        })
    }

    /// `localhost` maps to the IPv4 loopback; anything else must be a
    /// literal address.
    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        let ip = if self.host.eq_ignore_ascii_case("localhost") {
            IpAddr::from([127, 0, 0, 1])
        } else {
            self.host
                .parse()
                .map_err(|source| ConfigError::InvalidHost { source })?
        };
        Ok(SocketAddr::new(ip, self.port))
    }
}

#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub log_level: String,
}

impl TelemetryConfig {
    fn from_env() -> Self {
        Self {
            log_level: non_empty_var("APP_LOG_LEVEL")
                .unwrap_or_else(|| DEFAULT_LOG_LEVEL.to_string()),
        }
    }
}

/// Where the engine's inputs live and the scenario defaults.
#[derive(Debug, Clone, PartialEq)]
pub struct EngineConfig {
    pub bands_path: PathBuf,
    pub dataset_path: PathBuf,
    /// Scoring settings document; built-in defaults apply when unset.
    pub settings_path: Option<PathBuf>,
    pub scenario_seed: u64,
    pub knn_k: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            bands_path: PathBuf::from(DEFAULT_BANDS_PATH),
            dataset_path: PathBuf::from(DEFAULT_DATASET_PATH),
            settings_path: None,
            scenario_seed: DEFAULT_SEED,
            knn_k: DEFAULT_NEIGHBOURS,
        }
    }
}

impl EngineConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let scenario_seed = match non_empty_var("ESG_SCENARIO_SEED") {
            Some(raw) => raw.parse::<u64>().map_err(|_| ConfigError::InvalidSeed)?,
            None => defaults.scenario_seed,
        };
        let knn_k = match non_empty_var("ESG_KNN_K") {
            Some(raw) => raw
                .parse::<usize>()
                .ok()
                .filter(|k| *k > 0)
                .ok_or(ConfigError::InvalidNeighbours)?,
            None => defaults.knn_k,
        };

        Ok(Self {
            bands_path: non_empty_var("ESG_BANDS_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.bands_path),
            dataset_path: non_empty_var("ESG_DATASET_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.dataset_path),
            settings_path: non_empty_var("ESG_SETTINGS_PATH").map(PathBuf::from),
            scenario_seed,
            knn_k,
        })
    }
}

fn non_empty_var(key: &str) -> Option<String> {
    env::var(key)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidPort,
    InvalidHost { source: std::net::AddrParseError },
    InvalidSeed,
    InvalidNeighbours,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidPort => write!(f, "APP_PORT must be a valid u16"),
            ConfigError::InvalidHost { .. } => {
                write!(f, "APP_HOST must parse to an IPv4 or IPv6 address")
            }
            ConfigError::InvalidSeed => write!(f, "ESG_SCENARIO_SEED must be a valid u64"),
            ConfigError::InvalidNeighbours => {
                write!(f, "ESG_KNN_K must be a positive integer")
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::InvalidHost { source } => Some(source),
            ConfigError::InvalidPort
            | ConfigError::InvalidSeed
            | ConfigError::InvalidNeighbours => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;
    use std::sync::{Mutex, OnceLock};

    fn env_guard() -> &'static Mutex<()> {
        static GUARD: OnceLock<Mutex<()>> = OnceLock::new();
        GUARD.get_or_init(|| Mutex::new(()))
    }

    fn reset_env() {
        for key in [
            "APP_ENV",
            "APP_HOST",
            "APP_PORT",
            "APP_LOG_LEVEL",
            "ESG_BANDS_PATH",
            "ESG_DATASET_PATH",
            "ESG_SETTINGS_PATH",
            "ESG_SCENARIO_SEED",
            "ESG_KNN_K",
        ] {
            env::remove_var(key);
        }
    }

    #[test]
    fn unset_env_yields_local_defaults() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        let config = AppConfig::load().expect("defaults load");
        assert_eq!(config.environment, AppEnvironment::Development);
        assert_eq!(
            config.server.socket_addr().expect("default address"),
            SocketAddr::new(IpAddr::from([127, 0, 0, 1]), 3000)
        );
        assert_eq!(config.telemetry.log_level, "info");
        assert_eq!(config.engine, EngineConfig::default());
        assert_eq!(config.engine.scenario_seed, 42);
        assert_eq!(config.engine.knn_k, 3);
    }

    #[test]
    fn host_accepts_localhost_and_rejects_names() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("APP_HOST", "LocalHost");
        env::set_var("APP_PORT", "8080");
        let config = AppConfig::load().expect("config loads");
        assert_eq!(
            config.server.socket_addr().expect("localhost resolves"),
            SocketAddr::new(IpAddr::from([127, 0, 0, 1]), 8080)
        );

        env::set_var("APP_HOST", "esg.internal");
        let config = AppConfig::load().expect("config loads");
        assert!(matches!(
            config.server.socket_addr(),
            Err(ConfigError::InvalidHost { .. })
        ));

        env::set_var("APP_PORT", "70000");
        assert!(matches!(AppConfig::load(), Err(ConfigError::InvalidPort)));
        reset_env();
    }

    #[test]
    fn engine_paths_and_scenario_defaults_come_from_env() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("APP_ENV", "production");
        env::set_var("ESG_BANDS_PATH", "/srv/esg/bands_v2.json");
        env::set_var("ESG_SETTINGS_PATH", "/srv/esg/settings.json");
        env::set_var("ESG_SCENARIO_SEED", "7");
        env::set_var("ESG_KNN_K", "5");

        let config = AppConfig::load().expect("config loads");
        assert_eq!(config.environment, AppEnvironment::Production);
        assert_eq!(
            config.engine.bands_path,
            PathBuf::from("/srv/esg/bands_v2.json")
        );
        assert_eq!(
            config.engine.dataset_path,
            PathBuf::from(DEFAULT_DATASET_PATH)
        );
        assert_eq!(
            config.engine.settings_path,
            Some(PathBuf::from("/srv/esg/settings.json"))
        );
        assert_eq!(config.engine.scenario_seed, 7);
        assert_eq!(config.engine.knn_k, 5);
        reset_env();
    }

    #[test]
    fn rejects_invalid_seed_and_neighbours() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("ESG_SCENARIO_SEED", "-1");
        assert!(matches!(AppConfig::load(), Err(ConfigError::InvalidSeed)));

        reset_env();
        env::set_var("ESG_KNN_K", "0");
        assert!(matches!(
            AppConfig::load(),
            Err(ConfigError::InvalidNeighbours)
        ));
        reset_env();
    }
}
