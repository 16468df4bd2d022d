use std::env;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

const DEFAULT_HOST: &str = "0.0.0.0";
const DEFAULT_PORT: u16 = 8000;
const DEFAULT_API_KEY: &str = "changeme";
const DEFAULT_BACKEND_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Missing {0}")]
    Missing(&'static str),
    #[error("Invalid value for {name}: '{value}'")]
    Invalid { name: &'static str, value: String },
}

/// Connection settings for the managed backend.
#[derive(Debug, Clone)]
pub struct BackendConfig {
    pub url: String,
    pub service_key: String,
    pub timeout: Duration,
}

/// Row extraction knobs applied to every upload.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ImportLimits {
    pub max_rows: Option<usize>,
    pub skip_malformed_rows: bool,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub api_key: String,
    pub backend: BackendConfig,
    pub upload_dir: PathBuf,
    pub import: ImportLimits,
    pub cors_allowed_origins: Vec<String>,
}

impl AppConfig {
    /// Reads the process environment. Call `dotenv().ok()` first if a `.env` file should apply.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let url = get("SUPABASE_URL").ok_or(ConfigError::Missing("SUPABASE_URL"))?;
        let service_key = get("SUPABASE_SERVICE_ROLE_KEY")
            .ok_or(ConfigError::Missing("SUPABASE_SERVICE_ROLE_KEY"))?;

        let api_key = match get("MY_API_KEY") {
            Some(key) => key,
            None => {
                log::warn!("⚠️  MY_API_KEY not set, falling back to the default shared secret");
                DEFAULT_API_KEY.to_string()
            }
        };

        let port = parse_or("PORT", get("PORT"), DEFAULT_PORT)?;
        let timeout_secs = parse_or(
            "BACKEND_TIMEOUT_SECS",
            get("BACKEND_TIMEOUT_SECS"),
            DEFAULT_BACKEND_TIMEOUT_SECS,
        )?;
        let max_rows = get("IMPORT_MAX_ROWS")
            .map(|raw| parse_value("IMPORT_MAX_ROWS", &raw))
            .transpose()?;
        let skip_malformed_rows = get("IMPORT_SKIP_MALFORMED_ROWS")
            .map(|raw| parse_flag("IMPORT_SKIP_MALFORMED_ROWS", &raw))
            .transpose()?
            .unwrap_or(false);

        let cors_allowed_origins = get("CORS_ALLOWED_ORIGINS")
            .map(|raw| {
                raw.split(',')
                    .map(|s| s.trim().to_string())
                    .filter(|s| !s.is_empty())
                    .collect()
            })
            .unwrap_or_default();

        Ok(Self {
            host: get("HOST").unwrap_or_else(|| DEFAULT_HOST.to_string()),
            port,
            api_key,
            backend: BackendConfig {
                url: url.trim_end_matches('/').to_string(),
                service_key,
                timeout: Duration::from_secs(timeout_secs),
            },
            upload_dir: get("UPLOAD_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(env::temp_dir),
            import: ImportLimits {
                max_rows,
                skip_malformed_rows,
            },
            cors_allowed_origins,
        })
    }
}

fn parse_value<T: std::str::FromStr>(name: &'static str, raw: &str) -> Result<T, ConfigError> {
    raw.trim().parse().map_err(|_| ConfigError::Invalid {
        name,
        value: raw.to_string(),
    })
}

fn parse_or<T: std::str::FromStr>(
    name: &'static str,
    raw: Option<String>,
    default: T,
) -> Result<T, ConfigError> {
    match raw {
        Some(raw) => parse_value(name, &raw),
        None => Ok(default),
    }
}

fn parse_flag(name: &'static str, raw: &str) -> Result<bool, ConfigError> {
    match raw.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::Invalid {
            name,
            value: raw.to_string(),
        }),
    }
}
