//! Feature flag service settings.
//!
//! Values are validated when constructed or updated; the API base URL may also be taken
//! from the `DOMAIN_PROFILES_API_URL` environment variable.

use std::time::Duration;

use url::Url;

use crate::feature_flags::constants::{API_BASE_URL_ENV, DEFAULT_API_BASE_URL};
use crate::feature_flags::error::{invalid_argument, FlagsResult};

/// Default interval between polls for subscriptions that refetch (60 seconds).
pub const DEFAULT_POLL_INTERVAL_MILLIS: u64 = 60_000;
/// Default timeout for a single flag request (30 seconds).
pub const DEFAULT_FETCH_TIMEOUT_MILLIS: u64 = 30_000;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FeatureFlagSettings {
    api_base_url: String,
    poll_interval_millis: u64,
    fetch_timeout_millis: u64,
}

impl FeatureFlagSettings {
    pub fn new(
        api_base_url: impl Into<String>,
        poll_interval_millis: u64,
        fetch_timeout_millis: u64,
    ) -> FlagsResult<Self> {
        let api_base_url = api_base_url.into();
        validate_api_base_url(&api_base_url)?;
        validate_poll_interval(poll_interval_millis)?;
        validate_fetch_timeout(fetch_timeout_millis)?;
        Ok(Self {
            api_base_url,
            poll_interval_millis,
            fetch_timeout_millis,
        })
    }

    /// Default settings with the API base URL taken from `DOMAIN_PROFILES_API_URL` when set.
    pub fn from_env() -> FlagsResult<Self> {
        let api_base_url =
            std::env::var(API_BASE_URL_ENV).unwrap_or_else(|_| DEFAULT_API_BASE_URL.to_string());
        Self::new(
            api_base_url,
            DEFAULT_POLL_INTERVAL_MILLIS,
            DEFAULT_FETCH_TIMEOUT_MILLIS,
        )
    }

    pub fn api_base_url(&self) -> &str {
        &self.api_base_url
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_millis)
    }

    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_millis(self.fetch_timeout_millis)
    }

    /// Applies a partial update. Nothing changes if any value is invalid.
    pub fn apply(&mut self, update: FeatureFlagSettingsUpdate) -> FlagsResult<()> {
        if update.is_empty() {
            return Ok(());
        }
        let mut next = self.clone();
        if let Some(url) = update.api_base_url {
            validate_api_base_url(&url)?;
            next.api_base_url = url;
        }
        if let Some(interval) = update.poll_interval_millis {
            validate_poll_interval(interval)?;
            next.poll_interval_millis = interval;
        }
        if let Some(timeout) = update.fetch_timeout_millis {
            validate_fetch_timeout(timeout)?;
            next.fetch_timeout_millis = timeout;
        }
        *self = next;
        Ok(())
    }
}

impl Default for FeatureFlagSettings {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            poll_interval_millis: DEFAULT_POLL_INTERVAL_MILLIS,
            fetch_timeout_millis: DEFAULT_FETCH_TIMEOUT_MILLIS,
        }
    }
}

/// Partial update to apply on top of existing settings.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FeatureFlagSettingsUpdate {
    pub api_base_url: Option<String>,
    pub poll_interval_millis: Option<u64>,
    pub fetch_timeout_millis: Option<u64>,
}

impl FeatureFlagSettingsUpdate {
    pub fn is_empty(&self) -> bool {
        self.api_base_url.is_none()
            && self.poll_interval_millis.is_none()
            && self.fetch_timeout_millis.is_none()
    }
}

fn validate_api_base_url(value: &str) -> FlagsResult<()> {
    let url = Url::parse(value)
        .map_err(|err| invalid_argument(format!("invalid API base URL '{value}': {err}")))?;
    match url.scheme() {
        "http" | "https" => Ok(()),
        other => Err(invalid_argument(format!(
            "API base URL must use http or https, got '{other}'"
        ))),
    }
}

fn validate_poll_interval(value: u64) -> FlagsResult<()> {
    if value == 0 {
        return Err(invalid_argument("poll_interval_millis must be greater than zero"));
    }
    Ok(())
}

fn validate_fetch_timeout(value: u64) -> FlagsResult<()> {
    if value == 0 {
        return Err(invalid_argument("fetch_timeout_millis must be greater than zero"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_poll_every_minute() {
        let settings = FeatureFlagSettings::default();
        assert_eq!(settings.poll_interval(), Duration::from_secs(60));
        assert_eq!(settings.api_base_url(), DEFAULT_API_BASE_URL);
    }

    #[test]
    fn new_validates_values() {
        assert!(FeatureFlagSettings::new("https://api.example.com", 1, 1).is_ok());
        let err = FeatureFlagSettings::new("not a url", 1, 1).unwrap_err();
        assert_eq!(err.code_str(), "feature-flags/invalid-argument");
        assert!(FeatureFlagSettings::new("ftp://api.example.com", 1, 1).is_err());
        assert!(FeatureFlagSettings::new("https://api.example.com", 0, 1).is_err());
        assert!(FeatureFlagSettings::new("https://api.example.com", 1, 0).is_err());
    }

    #[test]
    fn apply_is_all_or_nothing() {
        let mut settings = FeatureFlagSettings::default();
        let result = settings.apply(FeatureFlagSettingsUpdate {
            api_base_url: Some("https://staging.example.com".into()),
            poll_interval_millis: Some(0),
            fetch_timeout_millis: None,
        });
        assert!(result.is_err());
        assert_eq!(settings, FeatureFlagSettings::default());

        settings
            .apply(FeatureFlagSettingsUpdate {
                poll_interval_millis: Some(5_000),
                ..Default::default()
            })
            .unwrap();
        assert_eq!(settings.poll_interval(), Duration::from_secs(5));
    }

    #[test]
    fn empty_update_is_noop() {
        let mut settings = FeatureFlagSettings::default();
        assert!(FeatureFlagSettingsUpdate::default().is_empty());
        settings.apply(FeatureFlagSettingsUpdate::default()).unwrap();
        assert_eq!(settings, FeatureFlagSettings::default());
    }
}
