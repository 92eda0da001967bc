//! Mention token classification.
//!
//! One combined pattern finds every token in a text, escaped (`&lt;@1&gt;`) or
//! raw (`<@1>`). Each match is turned into a [`MentionToken`] together with
//! its byte range, so later rendering never has to re-scan text it produced.

use std::ops::Range;
use std::sync::LazyLock;

use regex::{Captures, Regex};

static TOKEN_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(concat!(
        r"(?P<open>&lt;|<)(?:",
        r"@(?P<amp>&amp;|&)(?P<role>[0-9]+)",
        r"|@!?(?P<member>[0-9]+)",
        r"|#(?P<channel>[0-9]+)",
        r"|(?P<animated>a)?:[^\s:<>&]+:(?P<emoji>[0-9]+)",
        r"|t:(?P<ts>[0-9]{1,13})(?::(?P<ts_fmt>[A-Za-z]))?",
        r"|/(?P<command>[\w -]+):[0-9]+",
        r")(?P<close>&gt;|>)",
        r"|@(?P<broadcast>everyone|here)(?:\s|$)",
    ))
    .unwrap()
});

/// A recognized mention token.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum MentionToken {
    /// `<#id>`
    Channel(u64),
    /// `<@id>` or `<@!id>`
    Member(u64),
    /// `<@&id>`
    Role(u64),
    /// `@everyone`
    Everyone,
    /// `@here`
    Here,
    /// `<:name:id>` or `<a:name:id>`
    CustomEmoji { id: u64, animated: bool },
    /// `<t:seconds>` or `<t:seconds:format>`
    Timestamp { seconds: u64, format: Option<char> },
    /// `</name:id>`
    SlashCommand(String),
}

/// Resolution sweeps, in the order they run.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Category {
    Channel,
    Member,
    Broadcast,
    Role,
    Timestamp,
    SlashCommand,
    Emoji,
}

impl Category {
    pub(crate) const ORDER: [Self; 7] = [
        Self::Channel,
        Self::Member,
        Self::Broadcast,
        Self::Role,
        Self::Timestamp,
        Self::SlashCommand,
        Self::Emoji,
    ];
}

impl MentionToken {
    pub(crate) fn category(&self) -> Category {
        match self {
            Self::Channel(_) => Category::Channel,
            Self::Member(_) => Category::Member,
            Self::Everyone | Self::Here => Category::Broadcast,
            Self::Role(_) => Category::Role,
            Self::Timestamp { .. } => Category::Timestamp,
            Self::SlashCommand(_) => Category::SlashCommand,
            Self::CustomEmoji { .. } => Category::Emoji,
        }
    }
}

/// A classified token and the byte range it occupies.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TokenMatch {
    pub range: Range<usize>,
    pub token: MentionToken,
}

/// Find and classify every mention token in `text`.
///
/// Tokens preceded by a backslash, with mixed escaped/raw delimiters, or
/// with ids that overflow `u64` are not reported and stay literal text.
pub fn scan(text: &str) -> Vec<TokenMatch> {
    TOKEN_RE
        .captures_iter(text)
        .filter_map(|caps| classify(text, &caps))
        .collect()
}

fn classify(text: &str, caps: &Captures<'_>) -> Option<TokenMatch> {
    let whole = caps.get(0)?;
    if text[..whole.start()].ends_with('\\') {
        return None;
    }

    if let Some(name) = caps.name("broadcast") {
        let token = if name.as_str() == "everyone" {
            MentionToken::Everyone
        } else {
            MentionToken::Here
        };
        return Some(TokenMatch {
            range: whole.start()..name.end(),
            token,
        });
    }

    let escaped = caps.name("open")?.as_str() == "&lt;";
    let close_escaped = caps.name("close")?.as_str() == "&gt;";
    if escaped != close_escaped {
        return None;
    }

    let id = |group: &str| caps.name(group).and_then(|m| m.as_str().parse::<u64>().ok());

    let token = if caps.name("role").is_some() {
        if escaped != (caps.name("amp")?.as_str() == "&amp;") {
            return None;
        }
        MentionToken::Role(id("role")?)
    } else if caps.name("member").is_some() {
        MentionToken::Member(id("member")?)
    } else if caps.name("channel").is_some() {
        MentionToken::Channel(id("channel")?)
    } else if caps.name("emoji").is_some() {
        MentionToken::CustomEmoji {
            id: id("emoji")?,
            animated: caps.name("animated").is_some(),
        }
    } else if caps.name("ts").is_some() {
        MentionToken::Timestamp {
            seconds: id("ts")?,
            format: caps
                .name("ts_fmt")
                .and_then(|m| m.as_str().chars().next()),
        }
    } else {
        MentionToken::SlashCommand(caps.name("command")?.as_str().to_owned())
    };

    Some(TokenMatch {
        range: whole.range(),
        token,
    })
}
