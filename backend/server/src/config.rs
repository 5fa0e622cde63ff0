use std::{env, fmt::Display, fs::read_to_string, str::FromStr};

use store::{DEFAULT_API_URL, DEFAULT_BASE_ID};
use thiserror::Error;
use tracing::{info, warn};

const SECRETS_DIR: &str = "/run/secrets";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("{0} is required")]
    Missing(&'static str),

    #[error("Invalid {key} value: {message}")]
    Invalid { key: &'static str, message: String },
}

#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub airtable_api_key: String,
    pub airtable_base_id: String,
    pub airtable_api_url: String,
    pub discord_webhook_url: Option<String>,
}

impl Config {
    pub fn load() -> Result<Self, ConfigError> {
        let airtable_api_key =
            read_secret("AIRTABLE_API_KEY").ok_or(ConfigError::Missing("AIRTABLE_API_KEY"))?;

        if optional("PUBLIC_POSTHOG_KEY").is_none() {
            warn!("PostHog API key not found, analytics disabled");
        }

        Ok(Self {
            port: try_load("RUST_PORT", "1111")?,
            airtable_api_key,
            airtable_base_id: try_load("AIRTABLE_BASE_ID", DEFAULT_BASE_ID)?,
            airtable_api_url: try_load("AIRTABLE_API_URL", DEFAULT_API_URL)?,
            discord_webhook_url: read_secret("DISCORD_WEBHOOK_URL"),
        })
    }
}

fn var(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}

fn optional(key: &str) -> Option<String> {
    let value = var(key);
    if value.is_none() {
        info!("{key} not set");
    }
    value
}

fn try_load<T: FromStr>(key: &'static str, default: &str) -> Result<T, ConfigError>
where
    T::Err: Display,
{
    var(key)
        .unwrap_or_else(|| {
            info!("{key} not set, using default: {default}");
            default.to_string()
        })
        .parse()
        .map_err(|e: T::Err| ConfigError::Invalid {
            key,
            message: e.to_string(),
        })
}

/// Environment first, then a Docker secret file of the same name.
fn read_secret(secret_name: &str) -> Option<String> {
    if let Some(value) = var(secret_name) {
        return Some(value.trim().to_string());
    }

    let path = format!("{SECRETS_DIR}/{secret_name}");
    read_to_string(&path)
        .map(|s| s.trim().to_string())
        .map_err(|e| {
            info!("{secret_name} not in environment or {path}: {e}");
        })
        .ok()
        .filter(|s| !s.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_try_load_default() {
        let port: u16 = try_load("PUBLIPUCP_TEST_UNSET_PORT", "1111").unwrap();
        assert_eq!(port, 1111);
    }

    #[test]
    fn test_try_load_invalid() {
        let error = try_load::<u16>("PUBLIPUCP_TEST_UNSET_PORT", "not-a-port").unwrap_err();
        assert!(matches!(error, ConfigError::Invalid { key: "PUBLIPUCP_TEST_UNSET_PORT", .. }));
    }

    #[test]
    fn test_missing_secret() {
        assert_eq!(read_secret("PUBLIPUCP_TEST_UNSET_SECRET"), None);
    }
}
