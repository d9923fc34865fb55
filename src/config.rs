//! Application-level configuration loading: storage backend selection and game tunables.

use std::{env, fmt, fs, io::ErrorKind, path::PathBuf, str::FromStr};

use serde::Deserialize;
use tracing::{info, warn};

/// Default location on disk where the server looks for the JSON configuration.
const DEFAULT_CONFIG_PATH: &str = "config/app.json";
/// Environment variable that overrides [`DEFAULT_CONFIG_PATH`].
const CONFIG_PATH_ENV: &str = "CONNECT_FIVE_CONFIG_PATH";
/// Environment variable selecting the storage backend.
pub const DB_TYPE_ENV: &str = "CONNECT_5_DB_TYPE";
/// Commits one join-by-search may try when nothing is configured.
const DEFAULT_MAX_ATTEMPTS: usize = 64;
/// Seats in a game created without an explicit `max_players`.
const DEFAULT_MAX_PLAYERS: usize = 2;
/// Smallest and largest number of seats a game may have.
pub const PLAYER_RANGE: (usize, usize) = (2, 3);

/// Storage backend holding game records.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum StoreBackend {
    /// In-process map; records vanish with the process.
    #[default]
    Memory,
    /// CouchDB over HTTP.
    CouchDb,
    /// MongoDB.
    MongoDb,
}

/// Unrecognised backend name.
#[derive(Debug, thiserror::Error)]
#[error("unknown storage backend `{0}` (expected memory, couchdb or mongodb)")]
pub struct UnknownBackend(String);

impl FromStr for StoreBackend {
    type Err = UnknownBackend;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "memory" | "mem" => Ok(StoreBackend::Memory),
            "couchdb" | "couch" => Ok(StoreBackend::CouchDb),
            "mongodb" | "mongo" => Ok(StoreBackend::MongoDb),
            _ => Err(UnknownBackend(s.to_owned())),
        }
    }
}

impl fmt::Display for StoreBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            StoreBackend::Memory => "memory",
            StoreBackend::CouchDb => "couchdb",
            StoreBackend::MongoDb => "mongodb",
        })
    }
}

#[derive(Debug, Clone)]
/// Immutable runtime configuration shared across the application.
pub struct AppConfig {
    backend: StoreBackend,
    max_join_attempts: usize,
    default_max_players: usize,
}

impl AppConfig {
    /// Load the configuration from disk, falling back to built-in defaults, then
    /// apply the backend override from [`DB_TYPE_ENV`].
    pub fn load() -> Self {
        let path = resolve_config_path();
        let config = match fs::read_to_string(&path) {
            Ok(contents) => match Self::from_json(&contents) {
                Ok(app_config) => {
                    info!(
                        path = %path.display(),
                        backend = %app_config.backend,
                        "loaded configuration"
                    );
                    app_config
                }
                Err(err) => {
                    warn!(
                        path = %path.display(),
                        error = %err,
                        "failed to parse config; falling back to defaults"
                    );
                    Self::default()
                }
            },
            Err(err) if err.kind() == ErrorKind::NotFound => {
                info!(
                    path = %path.display(),
                    "config file not found; using built-in defaults"
                );
                Self::default()
            }
            Err(err) => {
                warn!(
                    path = %path.display(),
                    error = %err,
                    "failed to read config; falling back to defaults"
                );
                Self::default()
            }
        };

        match env::var(DB_TYPE_ENV) {
            Ok(value) => config.with_backend_override(&value),
            Err(_) => config,
        }
    }

    /// Parse the JSON configuration document.
    pub fn from_json(contents: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str::<RawConfig>(contents).map(Into::into)
    }

    fn with_backend_override(mut self, value: &str) -> Self {
        match value.parse() {
            Ok(backend) => self.backend = backend,
            Err(err) => warn!(var = DB_TYPE_ENV, error = %err, "ignoring backend override"),
        }
        self
    }

    /// Selected storage backend.
    pub fn backend(&self) -> StoreBackend {
        self.backend
    }

    /// Upper bound on join commits tried by a single join-by-search.
    pub fn max_join_attempts(&self) -> usize {
        self.max_join_attempts
    }

    /// Seats used when a request does not choose.
    pub fn default_max_players(&self) -> usize {
        self.default_max_players
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            backend: StoreBackend::default(),
            max_join_attempts: DEFAULT_MAX_ATTEMPTS,
            default_max_players: DEFAULT_MAX_PLAYERS,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
/// JSON representation of the configuration file located at [`DEFAULT_CONFIG_PATH`].
struct RawConfig {
    #[serde(default)]
    backend: Option<String>,
    #[serde(default)]
    join: RawJoin,
    #[serde(default)]
    default_max_players: Option<usize>,
}

#[derive(Debug, Default, Deserialize)]
struct RawJoin {
    #[serde(default, alias = "max_candidates")]
    max_attempts: Option<usize>,
}

impl From<RawConfig> for AppConfig {
    fn from(value: RawConfig) -> Self {
        let defaults = AppConfig::default();
        let backend = match value.backend.as_deref().map(str::parse::<StoreBackend>) {
            Some(Ok(backend)) => backend,
            Some(Err(err)) => {
                warn!(error = %err, "unknown backend in config; using memory");
                defaults.backend
            }
            None => defaults.backend,
        };
        let max_join_attempts = value
            .join
            .max_attempts
            .filter(|count| *count > 0)
            .unwrap_or(defaults.max_join_attempts);
        let default_max_players = value
            .default_max_players
            .filter(|seats| (PLAYER_RANGE.0..=PLAYER_RANGE.1).contains(seats))
            .unwrap_or(defaults.default_max_players);

        Self {
            backend,
            max_join_attempts,
            default_max_players,
        }
    }
}

/// Resolve the configuration path taking the environment override into account.
fn resolve_config_path() -> PathBuf {
    env::var_os(CONFIG_PATH_ENV)
        .map(PathBuf::from)
        .filter(|path| !path.as_os_str().is_empty())
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH))
}
