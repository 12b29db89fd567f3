// crates/quill-daemon/src/config.rs
//
// Runtime configuration for the Quill daemon.
// Loaded from a TOML file or populated with sensible defaults, then
// overridden by environment variables and CLI flags.

use serde::Deserialize;
use std::fs;
use std::time::Duration;

use quill_core::origin::normalize_origin;

/// Environment variable overriding `admin_secret`.
pub const ENV_ADMIN_SECRET: &str = "QUILL_ADMIN_SECRET";
/// Environment variable overriding `origin`.
pub const ENV_ORIGIN: &str = "QUILL_ORIGIN";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("cannot read {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },
    #[error("cannot parse {path}: {source}")]
    Parse {
        path: String,
        source: toml::de::Error,
    },
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Runtime configuration for the daemon.
#[derive(Debug, Clone, Deserialize)]
pub struct QuillConfig {
    /// This instance's public origin (host[:port]), as other instances
    /// address it.
    #[serde(default = "default_origin")]
    pub origin: String,

    /// Scheme used to reach remote instances: "https", or "http" for local
    /// development.
    #[serde(default = "default_scheme")]
    pub scheme: String,

    /// Admin secret. Empty disables every admin action.
    #[serde(default)]
    pub admin_secret: String,

    /// Directory for local data storage (RocksDB).
    #[serde(default = "default_data_dir")]
    pub data_dir: String,

    /// Host address for the HTTP server.
    #[serde(default = "default_http_host")]
    pub http_host: String,

    /// Port for the HTTP server.
    #[serde(default = "default_http_port")]
    pub http_port: u16,

    /// Log level used when RUST_LOG is unset.
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Timeout for every outbound probe and push, in milliseconds.
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,

    /// How long probe outcomes are cached, in seconds. 0 disables the cache.
    #[serde(default = "default_probe_cache_ttl_secs")]
    pub probe_cache_ttl_secs: u64,

    /// Upper bound on simultaneous outbound feed pushes.
    #[serde(default = "default_max_concurrent_pushes")]
    pub max_concurrent_pushes: usize,
}

fn default_origin() -> String {
    "localhost:8080".to_string()
}

fn default_scheme() -> String {
    "https".to_string()
}

fn default_data_dir() -> String {
    "~/.quill/data".to_string()
}

fn default_http_host() -> String {
    "127.0.0.1".to_string()
}

fn default_http_port() -> u16 {
    8080
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_request_timeout_ms() -> u64 {
    3000
}

fn default_probe_cache_ttl_secs() -> u64 {
    60
}

fn default_max_concurrent_pushes() -> usize {
    16
}

impl Default for QuillConfig {
    fn default() -> Self {
        Self {
            origin: default_origin(),
            scheme: default_scheme(),
            admin_secret: String::new(),
            data_dir: default_data_dir(),
            http_host: default_http_host(),
            http_port: default_http_port(),
            log_level: default_log_level(),
            request_timeout_ms: default_request_timeout_ms(),
            probe_cache_ttl_secs: default_probe_cache_ttl_secs(),
            max_concurrent_pushes: default_max_concurrent_pushes(),
        }
    }
}

impl QuillConfig {
    /// Load configuration from a TOML file at the given path.
    pub fn load(path: &str) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_string(),
            source,
        })?;
        Self::parse(&contents).map_err(|source| ConfigError::Parse {
            path: path.to_string(),
            source,
        })
    }

    pub fn parse(contents: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(contents)
    }

    /// Apply `QUILL_ADMIN_SECRET` / `QUILL_ORIGIN` from `lookup`.
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(secret) = lookup(ENV_ADMIN_SECRET) {
            self.admin_secret = secret;
        }
        if let Some(origin) = lookup(ENV_ORIGIN).filter(|o| !o.trim().is_empty()) {
            self.origin = origin;
        }
    }

    /// Normalize the origin and check the remaining fields.
    pub fn validate(&mut self) -> Result<(), ConfigError> {
        self.origin = normalize_origin(&self.origin)
            .map_err(|e| ConfigError::Invalid(format!("origin: {}", e)))?;

        self.scheme = self.scheme.trim().to_ascii_lowercase();
        if self.scheme != "http" && self.scheme != "https" {
            return Err(ConfigError::Invalid(format!(
                "scheme must be http or https, got '{}'",
                self.scheme
            )));
        }
        if self.request_timeout_ms == 0 {
            return Err(ConfigError::Invalid("request_timeout_ms must be > 0".to_string()));
        }
        if self.max_concurrent_pushes == 0 {
            return Err(ConfigError::Invalid(
                "max_concurrent_pushes must be > 0".to_string(),
            ));
        }
        Ok(())
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    pub fn probe_cache_ttl(&self) -> Duration {
        Duration::from_secs(self.probe_cache_ttl_secs)
    }
}
