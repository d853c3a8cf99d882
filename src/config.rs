//! Saver configuration.
//!
//! Configuration is JSON-backed and every field has a default, so an empty
//! document (`{}`) yields the standard chain. Environment variables can
//! override individual values after the file is loaded:
//!
//! - `SAVER_STRATEGIES`: comma-separated strategy kinds, in priority order
//! - `SAVER_FAILURE_MESSAGE`: text of the exhausted-chain notification
//! - `SAVER_FILENAME_PREFIX`: prefix of generated filenames

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::SaveError;
use crate::normalize::ILLEGAL_FILENAME_CHARS;
use crate::strategy::StrategyKind;

/// Environment variable overriding [`SaverConfig::strategies`].
pub const ENV_STRATEGIES: &str = "SAVER_STRATEGIES";
/// Environment variable overriding [`SaverConfig::failure_message`].
pub const ENV_FAILURE_MESSAGE: &str = "SAVER_FAILURE_MESSAGE";
/// Environment variable overriding [`FilenameConfig::prefix`].
pub const ENV_FILENAME_PREFIX: &str = "SAVER_FILENAME_PREFIX";

/// Default text shown when every strategy fails.
pub const DEFAULT_FAILURE_MESSAGE: &str = "Couldn't download";

/// Smallest accepted [`FilenameConfig::max_bytes`].
pub const MIN_FILENAME_BYTES: usize = 16;
/// Largest accepted [`FilenameConfig::max_bytes`].
pub const MAX_FILENAME_BYTES: usize = 255;

/// Top-level configuration for a [`Saver`](crate::Saver).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SaverConfig {
    /// Strategies to try, most preferred first.
    pub strategies: Vec<StrategyKind>,
    /// Notification text used when every strategy fails.
    pub failure_message: String,
    /// Shape of sanitized and generated filenames.
    pub filename: FilenameConfig,
}

impl Default for SaverConfig {
    fn default() -> Self {
        Self {
            strategies: StrategyKind::DEFAULT_ORDER.to_vec(),
            failure_message: DEFAULT_FAILURE_MESSAGE.to_string(),
            filename: FilenameConfig::default(),
        }
    }
}

/// Filename normalization settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FilenameConfig {
    /// Prefix of generated names (`<prefix>_<millis>_<n>.<extension>`).
    pub prefix: String,
    /// Extension of generated names, without the dot.
    pub extension: String,
    /// Upper bound on the UTF-8 length of a sanitized name.
    pub max_bytes: usize,
}

impl Default for FilenameConfig {
    fn default() -> Self {
        Self {
            prefix: "download".to_string(),
            extension: "txt".to_string(),
            max_bytes: MAX_FILENAME_BYTES,
        }
    }
}

impl SaverConfig {
    /// Parses and validates a JSON config document.
    ///
    /// # Errors
    ///
    /// Returns `SaveError::InvalidConfig` if the document is not valid JSON,
    /// has unknown fields, or fails [`SaverConfig::validate`].
    pub fn from_json_str(raw: &str) -> Result<Self, SaveError> {
        let config: Self = serde_json::from_str(raw)
            .map_err(|e| SaveError::invalid_config("config", e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Applies `SAVER_*` environment overrides, then re-validates.
    ///
    /// # Errors
    ///
    /// Returns `SaveError::InvalidConfig` if an override cannot be parsed or
    /// leaves the config invalid.
    pub fn apply_env(&mut self) -> Result<(), SaveError> {
        self.apply_overrides(|name| std::env::var(name).ok())
    }

    /// Applies overrides from an arbitrary variable lookup, then re-validates.
    ///
    /// # Errors
    ///
    /// Same as [`SaverConfig::apply_env`].
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<(), SaveError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(raw) = lookup(ENV_STRATEGIES) {
            self.strategies = raw
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::parse::<StrategyKind>)
                .collect::<Result<Vec<_>, _>>()?;
            debug!(strategies = ?self.strategies, "Strategy order overridden from environment");
        }
        if let Some(message) = lookup(ENV_FAILURE_MESSAGE) {
            self.failure_message = message;
        }
        if let Some(prefix) = lookup(ENV_FILENAME_PREFIX) {
            self.filename.prefix = prefix;
        }
        self.validate()
    }

    /// Validates config values.
    ///
    /// # Errors
    ///
    /// Returns `SaveError::InvalidConfig` for an empty or duplicated strategy
    /// list, an empty failure message, or invalid filename settings.
    pub fn validate(&self) -> Result<(), SaveError> {
        if self.strategies.is_empty() {
            return Err(SaveError::invalid_config(
                "strategies",
                "at least one strategy is required",
            ));
        }
        let mut seen = HashSet::new();
        for kind in &self.strategies {
            if !seen.insert(kind) {
                return Err(SaveError::invalid_config(
                    "strategies",
                    format!("'{kind}' is listed more than once"),
                ));
            }
        }
        if self.failure_message.trim().is_empty() {
            return Err(SaveError::invalid_config(
                "failure_message",
                "must not be empty",
            ));
        }
        self.filename.validate()
    }
}

impl FilenameConfig {
    /// Validates filename settings.
    ///
    /// # Errors
    ///
    /// Returns `SaveError::InvalidConfig` if the prefix is empty or contains
    /// illegal characters, the extension is not ASCII alphanumeric, or
    /// `max_bytes` is outside `16..=255`.
    pub fn validate(&self) -> Result<(), SaveError> {
        if self.prefix.is_empty()
            || self
                .prefix
                .chars()
                .any(|c| ILLEGAL_FILENAME_CHARS.contains(&c) || c.is_control())
        {
            return Err(SaveError::invalid_config(
                "filename.prefix",
                format!("'{}' is not a valid filename prefix", self.prefix),
            ));
        }
        if self.extension.is_empty() || !self.extension.chars().all(|c| c.is_ascii_alphanumeric())
        {
            return Err(SaveError::invalid_config(
                "filename.extension",
                format!(
                    "'{}' must be non-empty ASCII letters or digits",
                    self.extension
                ),
            ));
        }
        if !(MIN_FILENAME_BYTES..=MAX_FILENAME_BYTES).contains(&self.max_bytes) {
            return Err(SaveError::invalid_config(
                "filename.max_bytes",
                format!(
                    "{}. Expected range: {MIN_FILENAME_BYTES}..={MAX_FILENAME_BYTES}",
                    self.max_bytes
                ),
            ));
        }
        Ok(())
    }
}
