//! Server configuration and environment overrides.

use std::env;
use std::fmt::Display;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use proxima_cache::GeoCacheConfig;
use proxima_presence::PresenceConfig;
use proxima_proximity::ProximityConfig;
use tracing::{debug, info};

/// A configuration value that could not be parsed.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid {key} value {value:?}: {reason}")]
    Invalid {
        key: &'static str,
        value: String,
        reason: String,
    },
}

/// Everything the server needs to start.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Address the WebSocket listener binds to.
    pub bind_addr: String,
    /// How long a client gets to complete the WebSocket upgrade after its
    /// TCP connection is accepted.
    pub handshake_timeout: Duration,
    /// A connection that sends nothing for this long is treated as
    /// disconnected.
    pub idle_timeout: Duration,
    /// Location updates buffered per connection while a resolve runs.
    pub location_queue_depth: usize,
    /// HS256 secret for login tokens. Without one the server falls back
    /// to a static development verifier.
    pub jwt_secret: Option<String>,
    /// Redis/Valkey URL for the cache tier. Without one the cache lives in
    /// process memory.
    pub redis_url: Option<String>,
    /// JSON seed for the in-memory store.
    pub seed_file: Option<PathBuf>,
    pub proximity: ProximityConfig,
    pub presence: PresenceConfig,
    pub cache: GeoCacheConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: "0.0.0.0:5000".to_string(),
            handshake_timeout: Duration::from_secs(10),
            idle_timeout: Duration::from_secs(120),
            location_queue_depth: 32,
            jwt_secret: None,
            redis_url: None,
            seed_file: None,
            proximity: ProximityConfig::default(),
            presence: PresenceConfig::default(),
            cache: GeoCacheConfig::default(),
        }
    }
}

impl ServerConfig {
    /// Loads overrides from the process environment.
    ///
    /// | Variable | Field |
    /// |---|---|
    /// | `PROXIMA_BIND` | `bind_addr` |
    /// | `PROXIMA_HANDSHAKE_TIMEOUT_SECS` | `handshake_timeout` |
    /// | `PROXIMA_IDLE_TIMEOUT_SECS` | `idle_timeout` |
    /// | `PROXIMA_QUEUE_DEPTH` | `location_queue_depth` |
    /// | `JWT_SECRET` | `jwt_secret` |
    /// | `VALKEY_URI`, then `REDIS_URL` | `redis_url` |
    /// | `PROXIMA_SEED_FILE` | `seed_file` |
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Like [`from_env`](Self::from_env), reading variables through `lookup`.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let bind_addr = var("PROXIMA_BIND").unwrap_or_else(|| {
            info!("PROXIMA_BIND not set, using default: {}", defaults.bind_addr);
            defaults.bind_addr.clone()
        });

        let handshake_timeout = match var("PROXIMA_HANDSHAKE_TIMEOUT_SECS") {
            Some(raw) => match parse::<u64>("PROXIMA_HANDSHAKE_TIMEOUT_SECS", &raw)? {
                0 => {
                    return Err(ConfigError::Invalid {
                        key: "PROXIMA_HANDSHAKE_TIMEOUT_SECS",
                        value: raw,
                        reason: "must be at least 1".into(),
                    });
                }
                secs => Duration::from_secs(secs),
            },
            None => defaults.handshake_timeout,
        };

        let idle_timeout = match var("PROXIMA_IDLE_TIMEOUT_SECS") {
            Some(raw) => Duration::from_secs(parse("PROXIMA_IDLE_TIMEOUT_SECS", &raw)?),
            None => defaults.idle_timeout,
        };

        let location_queue_depth = match var("PROXIMA_QUEUE_DEPTH") {
            Some(raw) => match parse::<usize>("PROXIMA_QUEUE_DEPTH", &raw)? {
                0 => {
                    return Err(ConfigError::Invalid {
                        key: "PROXIMA_QUEUE_DEPTH",
                        value: raw,
                        reason: "must be at least 1".into(),
                    });
                }
                depth => depth,
            },
            None => defaults.location_queue_depth,
        };

        let jwt_secret = var("JWT_SECRET");
        if jwt_secret.is_none() {
            info!("JWT_SECRET not set, login tokens will not be verified cryptographically");
        }

        let redis_url = var("VALKEY_URI").or_else(|| var("REDIS_URL"));
        if redis_url.is_none() {
            debug!("no cache URL set, using the in-process cache tier");
        }

        Ok(Self {
            bind_addr,
            handshake_timeout,
            idle_timeout,
            location_queue_depth,
            jwt_secret,
            redis_url,
            seed_file: var("PROXIMA_SEED_FILE").map(PathBuf::from),
            ..defaults
        })
    }
}

fn parse<T: FromStr>(key: &'static str, raw: &str) -> Result<T, ConfigError>
where
    T::Err: Display,
{
    raw.trim().parse().map_err(|e: T::Err| ConfigError::Invalid {
        key,
        value: raw.to_string(),
        reason: e.to_string(),
    })
}
