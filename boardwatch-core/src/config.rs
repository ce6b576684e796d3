use crate::error::ConfigError;
use crate::types::Rule;
use serde::{Deserialize, Serialize};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const DEFAULT_BOARD_BASE_URL: &str = "https://www.ptt.cc";
pub const DEFAULT_USER_AGENT: &str = concat!("boardwatch/", env!("CARGO_PKG_VERSION"));
/// One year, in minutes.
pub const MAX_CRAWLING_PERIOD: u64 = 60 * 24 * 365;

fn default_listen_addr() -> String {
    "127.0.0.1:8080".to_string()
}

fn default_board_base_url() -> String {
    DEFAULT_BOARD_BASE_URL.to_string()
}

fn default_page_delay_ms() -> u64 {
    1000
}

fn default_cursor_depth() -> usize {
    20
}

fn default_requests_per_minute() -> u32 {
    60
}

fn default_user_agent() -> String {
    DEFAULT_USER_AGENT.to_string()
}

/// Process configuration, loaded once at startup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Minutes between crawl cycles
    pub crawling_period: u64,
    pub rule_path: PathBuf,
    /// Directory holding one cursor file per board
    pub status_path: PathBuf,
    /// Directory holding one file per extracted article
    pub result_path: PathBuf,
    #[serde(default = "default_listen_addr", alias = "listen_port")]
    pub listen_addr: String,
    #[serde(default = "default_board_base_url")]
    pub board_base_url: String,
    #[serde(default = "default_page_delay_ms")]
    pub page_delay_ms: u64,
    #[serde(default = "default_cursor_depth")]
    pub cursor_depth: usize,
    #[serde(default = "default_requests_per_minute")]
    pub requests_per_minute: u32,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

impl Config {
    /// Load from a `.toml` or `.json` file, chosen by extension.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = read_file(path)?;

        let config: Config = match path.extension().and_then(|ext| ext.to_str()) {
            Some("toml") => toml::from_str(&text)?,
            Some("json") => {
                serde_json::from_str(&text).map_err(|e| ConfigError::InvalidFormat {
                    path: path.display().to_string(),
                    details: e.to_string(),
                })?
            }
            _ => {
                return Err(ConfigError::UnsupportedFormat {
                    path: path.display().to_string(),
                })
            }
        };

        config.validate()?;
        tracing::debug!(path = %path.display(), "Loaded configuration");
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.crawling_period == 0 || self.crawling_period > MAX_CRAWLING_PERIOD {
            return Err(ConfigError::InvalidValue {
                field: "crawling_period".to_string(),
                value: self.crawling_period.to_string(),
            });
        }
        for (field, value) in [
            ("rule_path", &self.rule_path),
            ("status_path", &self.status_path),
            ("result_path", &self.result_path),
        ] {
            if value.as_os_str().is_empty() {
                return Err(ConfigError::MissingField {
                    field: field.to_string(),
                });
            }
        }
        if self.cursor_depth == 0 {
            return Err(ConfigError::InvalidValue {
                field: "cursor_depth".to_string(),
                value: "0".to_string(),
            });
        }
        if self.requests_per_minute == 0 {
            return Err(ConfigError::InvalidValue {
                field: "requests_per_minute".to_string(),
                value: "0".to_string(),
            });
        }
        if self.board_base_url.trim().is_empty() {
            return Err(ConfigError::MissingField {
                field: "board_base_url".to_string(),
            });
        }
        Ok(())
    }

    pub fn crawl_period(&self) -> Duration {
        Duration::from_secs(self.crawling_period.saturating_mul(60))
    }

    pub fn page_delay(&self) -> Duration {
        Duration::from_millis(self.page_delay_ms)
    }

    /// Listen address with a bare `:port` expanded to all interfaces.
    pub fn socket_addr(&self) -> String {
        if self.listen_addr.starts_with(':') {
            format!("0.0.0.0{}", self.listen_addr)
        } else {
            self.listen_addr.clone()
        }
    }
}

/// Load the rule file: a JSON array of rules.
pub fn load_rules(path: impl AsRef<Path>) -> Result<Vec<Rule>, ConfigError> {
    let path = path.as_ref();
    let text = read_file(path)?;
    let rules: Vec<Rule> =
        serde_json::from_str(&text).map_err(|e| ConfigError::InvalidFormat {
            path: path.display().to_string(),
            details: e.to_string(),
        })?;

    for rule in &rules {
        if rule.board.trim().is_empty() {
            return Err(ConfigError::MissingField {
                field: "board".to_string(),
            });
        }
    }

    tracing::debug!(path = %path.display(), count = rules.len(), "Loaded rules");
    Ok(rules)
}

fn read_file(path: &Path) -> Result<String, ConfigError> {
    std::fs::read_to_string(path).map_err(|e| match e.kind() {
        ErrorKind::NotFound => ConfigError::FileNotFound {
            path: path.display().to_string(),
        },
        _ => ConfigError::ReadFailed {
            path: path.display().to_string(),
            source: e,
        },
    })
}
