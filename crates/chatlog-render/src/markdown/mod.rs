//! Markdown transformation flows.
//!
//! A [`MarkdownTransformer`] owns the [`CodeBlockRegistry`] of one render
//! job. Each [`RenderMode`] selects a fixed sequence of passes:
//!
//! | Mode | Passes |
//! |------|--------|
//! | `PlainMarkdown` | code, linkify, links, lists, inline, headers, quotes, emoji |
//! | `Embed` | code, linkify, links, embed quotes, then as `PlainMarkdown` |
//! | `SpecialEmbed` | code, linkify, links, inline, emoji |
//! | `Reference` | strip preserve markers, inline code, linkify, links, inline, collapse lines |
//! | `EmojiOnly` | emoji |
//! | `None`, `MentionsOnly` | nothing |

mod code;
mod emoji;
mod inline;
mod links;
mod lists;
mod quote;

use std::sync::LazyLock;

use regex::Regex;

use crate::mode::{CodeStyle, RenderMode};
use crate::registry::CodeBlockRegistry;
pub use emoji::EmojiTable;
use lists::ListKind;
use quote::QuoteDialect;

/// Default base URL for custom emoji images.
pub const DEFAULT_EMOJI_CDN: &str = "https://cdn.discordapp.com/emojis";

static PRESERVE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?s)<span class="chatlog__markdown-preserve">(.*?)</span>"#).unwrap()
});

static LINE_BREAK_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[ \t]*(?:\r?\n|<br>)\s*").unwrap());

/// Applies markdown flows and owns code protection for one render job.
#[derive(Debug)]
pub struct MarkdownTransformer {
    registry: CodeBlockRegistry,
    emoji: EmojiTable,
    emoji_cdn: String,
}

impl Default for MarkdownTransformer {
    fn default() -> Self {
        Self {
            registry: CodeBlockRegistry::new(),
            emoji: EmojiTable::new(),
            emoji_cdn: DEFAULT_EMOJI_CDN.to_owned(),
        }
    }
}

impl MarkdownTransformer {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Use `emoji` for shortcode expansion.
    #[must_use]
    pub fn with_emoji(mut self, emoji: EmojiTable) -> Self {
        self.emoji = emoji;
        self
    }

    /// Serve custom emoji images from `cdn`.
    #[must_use]
    pub fn with_emoji_cdn(mut self, cdn: impl Into<String>) -> Self {
        self.emoji_cdn = cdn.into();
        self
    }

    /// Use `registry` for code protection.
    #[must_use]
    pub fn with_registry(mut self, registry: CodeBlockRegistry) -> Self {
        self.registry = registry;
        self
    }

    /// Code protected so far in this job.
    #[must_use]
    pub fn registry(&self) -> &CodeBlockRegistry {
        &self.registry
    }

    /// Extract code spans and blocks, leaving ids in their place.
    ///
    /// Text that has already been protected contains no backticks, so
    /// protecting twice is harmless.
    pub fn protect_code(&mut self, text: &str, style: CodeStyle) -> String {
        code::protect(&mut self.registry, text, style)
    }

    /// Run the flow selected by `mode` over `text`.
    pub fn run(&mut self, mode: RenderMode, text: &str) -> String {
        match mode {
            RenderMode::None | RenderMode::MentionsOnly => text.to_owned(),
            RenderMode::EmojiOnly => self.expand_emoji(text),
            RenderMode::PlainMarkdown => {
                let text = self.links(text, CodeStyle::Block);
                let text = Self::block_markdown(&text);
                self.expand_emoji(&text)
            }
            RenderMode::Embed => {
                let text = self.links(text, CodeStyle::Block);
                let text = quote::merge(&text, QuoteDialect::Embed);
                let text = Self::block_markdown(&text);
                self.expand_emoji(&text)
            }
            RenderMode::SpecialEmbed => {
                let text = self.links(text, CodeStyle::Block);
                let text = inline::style(&text);
                self.expand_emoji(&text)
            }
            RenderMode::Reference => {
                let text = strip_preserve(text);
                let text = self.links(&text, CodeStyle::Inline);
                let text = inline::style(&text);
                LINE_BREAK_RE.replace_all(&text, " ").into_owned()
            }
        }
    }

    /// Write protected code back into an assembled document.
    ///
    /// Restoring already-restored text changes nothing.
    #[must_use]
    pub fn restore(&self, document: &str) -> String {
        self.registry.restore(document)
    }

    /// Code protection followed by both link passes.
    fn links(&mut self, text: &str, style: CodeStyle) -> String {
        let text = self.protect_code(text, style);
        let text = links::linkify(&text, &self.registry);
        links::bracket_links(&text)
    }

    fn block_markdown(text: &str) -> String {
        let text = lists::render(text, ListKind::Ordered);
        let text = lists::render(&text, ListKind::Unordered);
        let text = inline::style(&text);
        let text = inline::headers(&text);
        quote::merge(&text, QuoteDialect::Message)
    }

    fn expand_emoji(&self, text: &str) -> String {
        emoji::expand(text, &self.emoji, &self.emoji_cdn)
    }
}

fn strip_preserve(text: &str) -> String {
    PRESERVE_RE.replace_all(text, "$1").into_owned()
}
