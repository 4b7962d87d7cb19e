use std::env;
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_API_URL: &str = "http://localhost:8000";
const DEFAULT_TIMEOUT_SECS: u64 = 10;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub api_url: String,
    pub api_token: Option<String>,
    pub timeout: Duration,
    pub download_dir: PathBuf,
    pub log_file: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            api_token: None,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            download_dir: PathBuf::from("."),
            log_file: None,
        }
    }
}

impl Config {
    /// Reads `ROSTER_*` variables. Call after the `.env` files are loaded.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        let api_url = opt_value(&lookup, "ROSTER_API_URL")
            .map(|url| url.trim_end_matches('/').to_string())
            .unwrap_or(defaults.api_url);
        let timeout_secs = lookup("ROSTER_TIMEOUT_SECS")
            .and_then(|val| val.trim().parse::<u64>().ok())
            .unwrap_or(DEFAULT_TIMEOUT_SECS)
            .clamp(1, 120);
        Self {
            api_url,
            api_token: opt_value(&lookup, "ROSTER_API_TOKEN"),
            timeout: Duration::from_secs(timeout_secs),
            download_dir: opt_value(&lookup, "ROSTER_DOWNLOAD_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.download_dir),
            log_file: opt_value(&lookup, "ROSTER_LOG_FILE").map(PathBuf::from),
        }
    }
}

fn opt_value(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Option<String> {
    lookup(key)
        .map(|val| val.trim().to_string())
        .filter(|val| !val.is_empty())
}
