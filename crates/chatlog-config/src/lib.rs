//! Configuration management for chatlog rendering.
//!
//! Parses `chatlog.toml` configuration files with serde and provides
//! auto-discovery of config files in parent directories.
//!
//! ## Environment Variable Expansion
//!
//! String configuration values support environment variable expansion:
//!
//! - `${VAR}` - expands to the value of VAR, errors if unset
//! - `${VAR:-default}` - expands to VAR if set, otherwise uses default
//!
//! Expanded fields:
//! - `render.emoji_cdn`
//! - values of `emoji.shortcodes`

mod expand;

use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use expand::EnvExpander;

/// Configuration filename to search for.
const CONFIG_FILENAME: &str = "chatlog.toml";

/// Upper bound for `render.lookup_timeout_ms` (ten minutes).
const MAX_LOOKUP_TIMEOUT_MS: u64 = 600_000;

/// Application configuration.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Rendering configuration.
    pub render: RenderConfig,
    /// Emoji shortcode configuration.
    pub emoji: EmojiConfig,

    /// Path to the config file (set after loading).
    #[serde(skip)]
    pub config_path: Option<PathBuf>,
}

/// Rendering configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    /// Base URL custom emoji images are served from.
    pub emoji_cdn: String,
    /// Timeout for a single directory lookup, in milliseconds.
    pub lookup_timeout_ms: u64,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            emoji_cdn: "https://cdn.discordapp.com/emojis".to_owned(),
            lookup_timeout_ms: 10_000,
        }
    }
}

impl RenderConfig {
    /// Lookup timeout as a [`Duration`].
    #[must_use]
    pub fn lookup_timeout(&self) -> Duration {
        Duration::from_millis(self.lookup_timeout_ms)
    }
}

/// Emoji shortcode configuration.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct EmojiConfig {
    /// Extra `:shortcode:` entries, name without colons to grapheme.
    ///
    /// Entries override built-in shortcodes of the same name.
    pub shortcodes: BTreeMap<String, String>,
}

/// Configuration error.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// File not found.
    #[error("Configuration file not found: {}", .0.display())]
    NotFound(PathBuf),
    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// TOML parsing error.
    #[error("TOML parse error: {0}")]
    Parse(#[from] toml::de::Error),
    /// Validation error.
    #[error("Configuration error: {0}")]
    Validation(String),
    /// Environment variable error during expansion.
    #[error("Environment variable error in {field}: {message}")]
    EnvVar {
        /// Config field path (e.g., "`render.emoji_cdn`").
        field: String,
        /// Error message (e.g., "${`EMOJI_CDN`} not set").
        message: String,
    },
}

/// Require a string field to be non-empty.
fn require_non_empty(value: &str, field: &str) -> Result<(), ConfigError> {
    if value.is_empty() {
        return Err(ConfigError::Validation(format!("{field} cannot be empty")));
    }
    Ok(())
}

/// Require a URL field to use http:// or https:// scheme.
fn require_http_url(url: &str, field: &str) -> Result<(), ConfigError> {
    if !url.starts_with("http://") && !url.starts_with("https://") {
        return Err(ConfigError::Validation(format!(
            "{field} must start with http:// or https://"
        )));
    }
    Ok(())
}

impl Config {
    /// Load configuration.
    ///
    /// If `config_path` is provided, loads from that file.
    /// Otherwise, searches for `chatlog.toml` in current directory and parents,
    /// falling back to defaults when none is found.
    ///
    /// # Errors
    ///
    /// Returns error if explicit `config_path` doesn't exist, or if reading,
    /// parsing, expansion or validation fails.
    pub fn load(config_path: Option<&Path>) -> Result<Self, ConfigError> {
        if let Some(path) = config_path {
            if !path.exists() {
                return Err(ConfigError::NotFound(path.to_path_buf()));
            }
            return Self::load_from_file(path);
        }

        let discovered = std::env::current_dir()
            .ok()
            .and_then(|cwd| Self::discover_from(&cwd));
        match discovered {
            Some(path) => Self::load_from_file(&path),
            None => Ok(Self::default()),
        }
    }

    /// Search for config file in `start` and its parents.
    fn discover_from(start: &Path) -> Option<PathBuf> {
        let mut current = start.to_path_buf();
        loop {
            let candidate = current.join(CONFIG_FILENAME);
            if candidate.exists() {
                return Some(candidate);
            }
            if !current.pop() {
                return None;
            }
        }
    }

    /// Load configuration from a specific file.
    fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let mut config: Self = toml::from_str(&content)?;

        config.expand_env_vars()?;
        config.config_path = Some(path.to_path_buf());

        config.validate()?;

        Ok(config)
    }

    /// Validate configuration values.
    ///
    /// Called automatically after loading from file.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Validation` if any validation fails.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.validate_render()?;
        self.validate_emoji()?;
        Ok(())
    }

    fn validate_render(&self) -> Result<(), ConfigError> {
        require_non_empty(&self.render.emoji_cdn, "render.emoji_cdn")?;
        require_http_url(&self.render.emoji_cdn, "render.emoji_cdn")?;

        let timeout = self.render.lookup_timeout_ms;
        if timeout == 0 {
            return Err(ConfigError::Validation(
                "render.lookup_timeout_ms must be greater than 0".to_owned(),
            ));
        }
        if timeout > MAX_LOOKUP_TIMEOUT_MS {
            return Err(ConfigError::Validation(format!(
                "render.lookup_timeout_ms cannot exceed {MAX_LOOKUP_TIMEOUT_MS}"
            )));
        }

        Ok(())
    }

    fn validate_emoji(&self) -> Result<(), ConfigError> {
        for (name, grapheme) in &self.emoji.shortcodes {
            let valid_name = !name.is_empty()
                && name
                    .chars()
                    .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '+' | '-'));
            if !valid_name {
                return Err(ConfigError::Validation(format!(
                    "emoji.shortcodes: invalid shortcode name {name:?}"
                )));
            }
            require_non_empty(grapheme, &format!("emoji.shortcodes.{name}"))?;
        }
        Ok(())
    }

    /// Expand `${VAR}` references from the process environment.
    fn expand_env_vars(&mut self) -> Result<(), ConfigError> {
        self.expand_with(&EnvExpander::process())
    }

    fn expand_with<F>(&mut self, expander: &EnvExpander<F>) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        expander.expand("render.emoji_cdn", &mut self.render.emoji_cdn)?;
        for (name, grapheme) in &mut self.emoji.shortcodes {
            expander.expand(&format!("emoji.shortcodes.{name}"), grapheme)?;
        }
        Ok(())
    }
}
