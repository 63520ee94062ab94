use std::{env, fmt, time::Duration};

use crate::{domain::ChannelId, errors::Error, Result};

pub const DEFAULT_GITHUB_API_URL: &str = "https://api.github.com";
pub const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(10);

/// Typed configuration, loaded once at process start.
#[derive(Clone)]
pub struct Config {
    pub discord_token: String,
    pub github_token: String,
    pub channel_id: ChannelId,
    pub github_api_url: String,
    pub http_timeout: Duration,
}

impl Config {
    /// Load `.env` (if present) and read configuration from the environment.
    ///
    /// Variables already present in the environment take precedence over `.env`.
    pub fn load() -> Result<Self> {
        match dotenvy::dotenv() {
            Ok(path) => tracing::debug!(path = %path.display(), "loaded .env"),
            Err(e) if e.not_found() => tracing::debug!("no .env file, using process environment"),
            Err(e) => return Err(Error::Config(format!("failed to read .env: {e}"))),
        }
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let discord_token = required(&lookup, "DISCORD_TOKEN")?;
        let github_token = required(&lookup, "GITHUB_TOKEN")?;

        let raw_channel = required(&lookup, "DISCORD_CHANNEL_ID")?;
        let channel_id = raw_channel
            .trim()
            .parse::<u64>()
            .ok()
            .filter(|id| *id != 0)
            .map(ChannelId)
            .ok_or_else(|| {
                Error::Config(format!(
                    "DISCORD_CHANNEL_ID must be a non-zero numeric channel id, got {raw_channel:?}"
                ))
            })?;

        let github_api_url = lookup("GITHUB_API_URL")
            .and_then(non_empty)
            .unwrap_or_else(|| DEFAULT_GITHUB_API_URL.to_string());

        let http_timeout = match lookup("HTTP_TIMEOUT_MS").and_then(non_empty) {
            Some(ms) => ms
                .trim()
                .parse::<u64>()
                .ok()
                .filter(|ms| *ms != 0)
                .map(Duration::from_millis)
                .ok_or_else(|| {
                    Error::Config(format!(
                        "HTTP_TIMEOUT_MS must be a positive integer, got {ms:?}"
                    ))
                })?,
            None => DEFAULT_HTTP_TIMEOUT,
        };

        Ok(Self {
            discord_token,
            github_token,
            channel_id,
            github_api_url,
            http_timeout,
        })
    }
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("discord_token", &"<redacted>")
            .field("github_token", &"<redacted>")
            .field("channel_id", &self.channel_id)
            .field("github_api_url", &self.github_api_url)
            .field("http_timeout", &self.http_timeout)
            .finish()
    }
}

fn required(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Result<String> {
    lookup(key)
        .and_then(non_empty)
        .ok_or_else(|| Error::Config(format!("{key} environment variable is required")))
}

fn non_empty(s: String) -> Option<String> {
    if s.trim().is_empty() {
        None
    } else {
        Some(s)
    }
}
