//! Provider configuration.
//!
//! Connection settings for the remote vault: base URL, the operator's
//! armored private key and its passphrase. Values come from a
//! `provider.toml` file, and any value missing there falls back to the
//! `PASSBOLT_URL`, `PASSBOLT_KEY` and `PASSBOLT_PASS` environment variables.

use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::debug;
use zeroize::Zeroizing;

use crate::core::constants::{CONFIG_DIR, CONFIG_FILE, ENV_KEY, ENV_PASS, ENV_URL};
use crate::error::{ConfigError, Result};

/// Settings as written in the file. Every field is optional there.
#[derive(Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawConfig {
    base_url: Option<String>,
    private_key: Option<Zeroizing<String>>,
    passphrase: Option<Zeroizing<String>>,
}

/// Resolved connection settings.
#[derive(Clone)]
pub struct ProviderConfig {
    /// Base URL of the service, without a trailing slash.
    pub base_url: String,
    /// ASCII-armored private key of the operator account.
    pub private_key: Zeroizing<String>,
    pub passphrase: Zeroizing<String>,
}

impl std::fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderConfig")
            .field("base_url", &self.base_url)
            .field("private_key", &"<redacted>")
            .field("passphrase", &"<redacted>")
            .finish()
    }
}

impl ProviderConfig {
    pub fn new(
        base_url: impl Into<String>,
        private_key: impl Into<String>,
        passphrase: impl Into<String>,
    ) -> Result<Self> {
        let raw = RawConfig {
            base_url: Some(base_url.into()),
            private_key: Some(Zeroizing::new(private_key.into())),
            passphrase: Some(Zeroizing::new(passphrase.into())),
        };
        Self::build(raw, |_| None)
    }

    /// Default location: `<config dir>/latchkey/provider.toml`.
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join(CONFIG_DIR).join(CONFIG_FILE))
    }

    /// Build from environment variables alone.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Missing` naming the first unset variable.
    pub fn from_env() -> Result<Self> {
        Self::build(RawConfig::default(), env_var)
    }

    /// Parse TOML contents, filling gaps from the environment.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Parse` for malformed TOML, or the errors of
    /// [`ProviderConfig::from_env`] for values still missing.
    pub fn from_toml(contents: &str) -> Result<Self> {
        let raw: RawConfig = toml::from_str(contents).map_err(ConfigError::Parse)?;
        Self::build(raw, env_var)
    }

    /// Load from a file, filling gaps from the environment.
    pub fn load(path: &Path) -> Result<Self> {
        debug!(path = %path.display(), "loading provider config");
        let contents = std::fs::read_to_string(path).map_err(ConfigError::ReadFile)?;
        Self::from_toml(&contents)
    }

    /// Load from [`ProviderConfig::default_path`] when that file exists,
    /// otherwise from the environment.
    pub fn load_default() -> Result<Self> {
        match Self::default_path() {
            Some(path) if path.exists() => Self::load(&path),
            _ => {
                debug!("no provider config file, using environment");
                Self::from_env()
            }
        }
    }

    fn build(raw: RawConfig, env: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let base_url = pick(raw.base_url.map(Zeroizing::new), "base_url", ENV_URL, &env)?;
        let private_key = pick(raw.private_key, "private_key", ENV_KEY, &env)?;
        let passphrase = pick(raw.passphrase, "passphrase", ENV_PASS, &env)?;

        let base_url = validate_url(&base_url)?;
        debug!(base_url = %base_url, "provider config resolved");

        Ok(Self {
            base_url,
            private_key,
            passphrase,
        })
    }
}

fn env_var(name: &str) -> Option<String> {
    std::env::var(name).ok()
}

/// Take the file value, else the environment variable. Empty counts as unset.
fn pick(
    value: Option<Zeroizing<String>>,
    field: &'static str,
    env_name: &'static str,
    env: &impl Fn(&str) -> Option<String>,
) -> std::result::Result<Zeroizing<String>, ConfigError> {
    value
        .filter(|v| !v.is_empty())
        .or_else(|| env(env_name).map(Zeroizing::new).filter(|v| !v.is_empty()))
        .ok_or(ConfigError::Missing { field, env: env_name })
}

fn validate_url(url: &str) -> std::result::Result<String, ConfigError> {
    let trimmed = url.trim().trim_end_matches('/');
    let host = trimmed
        .strip_prefix("https://")
        .or_else(|| trimmed.strip_prefix("http://"));

    match host {
        Some(host) if !host.is_empty() => Ok(trimmed.to_string()),
        _ => Err(ConfigError::InvalidValue {
            field: "base_url",
            reason: format!("'{}' is not an http(s) URL", url),
        }),
    }
}
