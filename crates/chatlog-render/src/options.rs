//! Per-job render options.

use std::collections::BTreeMap;
use std::time::Duration;

use chatlog_config::Config;

use crate::markdown::{DEFAULT_EMOJI_CDN, EmojiTable};
use crate::mention::DEFAULT_LOOKUP_TIMEOUT;

/// Settings shared by every job created from them.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RenderOptions {
    /// Base URL custom emoji images are served from.
    pub emoji_cdn: String,
    /// Timeout for a single directory lookup.
    pub lookup_timeout: Duration,
    /// Shortcodes added to, or overriding, the built-in emoji table.
    pub extra_emoji: BTreeMap<String, String>,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            emoji_cdn: DEFAULT_EMOJI_CDN.to_owned(),
            lookup_timeout: DEFAULT_LOOKUP_TIMEOUT,
            extra_emoji: BTreeMap::new(),
        }
    }
}

impl RenderOptions {
    pub(crate) fn emoji_table(&self) -> EmojiTable {
        EmojiTable::new().with_extra(
            self.extra_emoji
                .iter()
                .map(|(name, grapheme)| (name.as_str(), grapheme.as_str())),
        )
    }
}

impl From<&Config> for RenderOptions {
    fn from(config: &Config) -> Self {
        Self {
            emoji_cdn: config.render.emoji_cdn.clone(),
            lookup_timeout: config.render.lookup_timeout(),
            extra_emoji: config.emoji.shortcodes.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_defaults_match_config_defaults() {
        assert_eq!(RenderOptions::from(&Config::default()), RenderOptions::default());
    }

    #[test]
    fn test_from_config() {
        let mut config = Config::default();
        config.render.emoji_cdn = "https://e.example".to_owned();
        config.render.lookup_timeout_ms = 250;
        config
            .emoji
            .shortcodes
            .insert("blobwave".to_owned(), "👋".to_owned());

        let options = RenderOptions::from(&config);

        assert_eq!(options.emoji_cdn, "https://e.example");
        assert_eq!(options.lookup_timeout, Duration::from_millis(250));
        assert_eq!(options.emoji_table().get("blobwave"), Some("👋"));
        assert_eq!(options.emoji_table().get("wave"), Some("👋"));
    }
}
