use std::net::SocketAddr;
use std::path::PathBuf;

/// Application-level constants
pub const APP_NAME: &str = "MamaCare";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

pub const DEFAULT_BIND: &str = "127.0.0.1:8080";
pub const DATABASE_FILE: &str = "mamacare.db";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid {var}: {value} ({reason})")]
    Invalid {
        var: &'static str,
        value: String,
        reason: String,
    },
    #[error("Cannot determine home directory; set MAMACARE_DATA_DIR")]
    NoHomeDir,
}

/// Runtime configuration, read from `MAMACARE_*` environment variables.
#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    pub bind: SocketAddr,
    pub data_dir: PathBuf,
    pub seed_catalog: bool,
    pub cors_origin: Option<String>,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`from_env`](Self::from_env) with an injectable lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let bind_raw = lookup("MAMACARE_BIND").unwrap_or_else(|| DEFAULT_BIND.to_string());
        let bind = bind_raw.parse().map_err(|e: std::net::AddrParseError| ConfigError::Invalid {
            var: "MAMACARE_BIND",
            value: bind_raw.clone(),
            reason: e.to_string(),
        })?;

        let data_dir = match lookup("MAMACARE_DATA_DIR").filter(|v| !v.trim().is_empty()) {
            Some(dir) => PathBuf::from(dir),
            None => app_data_dir()?,
        };

        let seed_catalog = match lookup("MAMACARE_SEED") {
            None => true,
            Some(raw) => parse_bool(&raw).ok_or_else(|| ConfigError::Invalid {
                var: "MAMACARE_SEED",
                value: raw.clone(),
                reason: "expected true/false".into(),
            })?,
        };

        let cors_origin = lookup("MAMACARE_CORS_ORIGIN").filter(|v| !v.trim().is_empty());

        Ok(Self {
            bind,
            data_dir,
            seed_catalog,
            cors_origin,
        })
    }

    pub fn database_path(&self) -> PathBuf {
        self.data_dir.join(DATABASE_FILE)
    }
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// Get the application data directory
/// ~/MamaCare/ on all platforms
pub fn app_data_dir() -> Result<PathBuf, ConfigError> {
    let home = dirs::home_dir().ok_or(ConfigError::NoHomeDir)?;
    Ok(home.join(APP_NAME))
}

/// Log filter used when `RUST_LOG` is unset.
pub fn default_log_filter() -> &'static str {
    if cfg!(debug_assertions) {
        "mamacare=debug,mamacare_lib=debug,tower_http=info"
    } else {
        "mamacare=info,mamacare_lib=info,tower_http=warn"
    }
}
