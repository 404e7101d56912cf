use crate::domain::Decimal;
use std::collections::HashMap;
use std::time::Duration;
use thiserror::Error;

pub const DEFAULT_SOURCE_URL: &str =
    "https://app.hyperliquid.xyz/vaults/0xdfc24b077bc1425ad1dea75bcb6f8158e10df303";
pub const DEFAULT_WEBDRIVER_URL: &str = "http://localhost:4444";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub source_url: String,
    /// Alert when a position's absolute value (USD) is strictly above this.
    pub position_value_threshold: Decimal,
    pub table_wait: Duration,
    pub poll_interval: Duration,
    pub navigation_timeout: Duration,
    pub network_idle_timeout: Duration,
    pub webdriver_url: String,
    pub headless: bool,
    pub notifier: NotifierConfig,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NotifierConfig {
    /// Log messages only.
    Log,
    Webhook { url: String },
    Telegram { bot_token: String, chat_id: String },
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnv(String),
    #[error("Invalid value for {0}: {1}")]
    InvalidValue(String, String),
}

impl Default for Config {
    fn default() -> Self {
        Config {
            source_url: DEFAULT_SOURCE_URL.to_string(),
            position_value_threshold: rust_decimal::Decimal::from(50_000).into(),
            table_wait: Duration::from_secs(45),
            poll_interval: Duration::from_millis(1500),
            navigation_timeout: Duration::from_millis(60_000),
            network_idle_timeout: Duration::from_millis(15_000),
            webdriver_url: DEFAULT_WEBDRIVER_URL.to_string(),
            headless: true,
            notifier: NotifierConfig::Log,
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_env_map(std::env::vars().collect())
    }

    pub fn from_env_map(env_map: HashMap<String, String>) -> Result<Self, ConfigError> {
        let defaults = Config::default();

        let source_url = env_map
            .get("SOURCE_URL")
            .cloned()
            .unwrap_or(defaults.source_url);

        let position_value_threshold = match env_map.get("POSITION_VALUE_THRESHOLD") {
            Some(raw) => {
                let value = Decimal::from_str_canonical(raw.trim()).map_err(|_| {
                    ConfigError::InvalidValue(
                        "POSITION_VALUE_THRESHOLD".to_string(),
                        "must be a decimal number".to_string(),
                    )
                })?;
                if value.is_negative() {
                    return Err(ConfigError::InvalidValue(
                        "POSITION_VALUE_THRESHOLD".to_string(),
                        "must not be negative".to_string(),
                    ));
                }
                value
            }
            None => defaults.position_value_threshold,
        };

        let table_wait = Duration::from_secs(parse_positive(&env_map, "TABLE_WAIT_SECONDS", 45)?);
        let poll_interval =
            Duration::from_millis(parse_positive(&env_map, "ROW_POLL_INTERVAL_MS", 1500)?);
        let navigation_timeout =
            Duration::from_millis(parse_positive(&env_map, "NAVIGATION_TIMEOUT_MS", 60_000)?);
        let network_idle_timeout =
            Duration::from_millis(parse_positive(&env_map, "NETWORK_IDLE_TIMEOUT_MS", 15_000)?);

        let webdriver_url = env_map
            .get("WEBDRIVER_URL")
            .cloned()
            .unwrap_or(defaults.webdriver_url);

        let headless = match env_map
            .get("HEADLESS")
            .map(|s| s.as_str())
            .unwrap_or("true")
        {
            "true" | "1" => true,
            "false" | "0" => false,
            other => {
                return Err(ConfigError::InvalidValue(
                    "HEADLESS".to_string(),
                    format!("must be true or false, got {}", other),
                ))
            }
        };

        let notifier = parse_notifier_from_map(&env_map)?;

        Ok(Config {
            source_url,
            position_value_threshold,
            table_wait,
            poll_interval,
            navigation_timeout,
            network_idle_timeout,
            webdriver_url,
            headless,
            notifier,
        })
    }
}

fn parse_positive(
    env_map: &HashMap<String, String>,
    key: &str,
    default: u64,
) -> Result<u64, ConfigError> {
    let value = match env_map.get(key) {
        Some(raw) => raw.trim().parse::<u64>().map_err(|_| {
            ConfigError::InvalidValue(key.to_string(), "must be a valid u64".to_string())
        })?,
        None => default,
    };
    if value == 0 {
        return Err(ConfigError::InvalidValue(
            key.to_string(),
            "must be greater than zero".to_string(),
        ));
    }
    Ok(value)
}

fn required(env_map: &HashMap<String, String>, key: &str) -> Result<String, ConfigError> {
    env_map
        .get(key)
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .ok_or_else(|| ConfigError::MissingEnv(key.to_string()))
}

fn parse_notifier_from_map(env_map: &HashMap<String, String>) -> Result<NotifierConfig, ConfigError> {
    match env_map.get("NOTIFIER").map(|s| s.as_str()).unwrap_or("log") {
        "log" => Ok(NotifierConfig::Log),
        "webhook" => Ok(NotifierConfig::Webhook {
            url: required(env_map, "WEBHOOK_URL")?,
        }),
        "telegram" => Ok(NotifierConfig::Telegram {
            bot_token: required(env_map, "TELEGRAM_BOT_TOKEN")?,
            chat_id: required(env_map, "TELEGRAM_CHAT_ID")?,
        }),
        other => Err(ConfigError::InvalidValue(
            "NOTIFIER".to_string(),
            format!("must be log, webhook, or telegram, got {}", other),
        )),
    }
}
