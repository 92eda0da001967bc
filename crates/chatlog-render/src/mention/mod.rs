//! Mention resolution.
//!
//! [`MentionResolver::resolve`] classifies every mention token of a text in one
//! scan, renders the tokens category by category (channels, members,
//! `@everyone`/`@here`, roles, timestamps, slash commands), then splices all
//! renderings into the text in a single pass. Rendered HTML is never scanned
//! again, so one category's output cannot be matched by a later category.
//!
//! Directory lookups are memoized for the lifetime of the resolver and
//! bounded by a timeout. A failed, timed-out or missing lookup renders the
//! category's fallback text. Misses and timeouts are remembered; other
//! failures are retried by the next token.

mod token;

use std::fmt::Write;
use std::time::Duration;

use chatlog_memo::{MemoCache, MemoKey};
use chrono::{DateTime, Utc};

use crate::directory::{Channel, Directory, GuildContext, Member, Role};
use crate::error::DirectoryError;
use crate::escape::{escape_html, escape_name, unescape_html};
use token::Category;
pub use token::{MentionToken, TokenMatch, scan};

/// Default timeout for a single directory lookup.
pub const DEFAULT_LOOKUP_TIMEOUT: Duration = Duration::from_secs(10);

const TIMESTAMP_FORMATS: &str = "tTdDfFR";

/// Resolves mention tokens against a [`Directory`].
#[derive(Debug)]
pub struct MentionResolver<D> {
    directory: D,
    timeout: Duration,
    channels: MemoCache<Option<Channel>>,
    members: MemoCache<Option<Member>>,
    roles: MemoCache<Option<Role>>,
    unavailable: Option<String>,
}

impl<D: Directory> MentionResolver<D> {
    /// Create a resolver using [`DEFAULT_LOOKUP_TIMEOUT`].
    #[must_use]
    pub fn new(directory: D) -> Self {
        Self {
            directory,
            timeout: DEFAULT_LOOKUP_TIMEOUT,
            channels: MemoCache::new(),
            members: MemoCache::new(),
            roles: MemoCache::new(),
            unavailable: None,
        }
    }

    /// Set the timeout applied to every directory lookup.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Reason the directory reported itself unavailable, if it did.
    ///
    /// Once set, no further lookups are attempted.
    #[must_use]
    pub fn unavailable(&self) -> Option<&str> {
        self.unavailable.as_deref()
    }

    /// Replace every mention token in `text` with its HTML rendering.
    ///
    /// Without a guild every category renders its fallback and the directory
    /// is never called. Custom emoji tokens are left for emoji expansion.
    pub async fn resolve(&mut self, guild: Option<&GuildContext>, text: &str) -> String {
        let tokens = scan(text);
        if tokens.is_empty() {
            return text.to_owned();
        }

        let mut rendered: Vec<Option<String>> = vec![None; tokens.len()];
        for category in Category::ORDER {
            for (slot, found) in rendered.iter_mut().zip(&tokens) {
                if found.token.category() == category {
                    *slot = self
                        .render(guild, &found.token, &text[found.range.clone()])
                        .await;
                }
            }
        }

        let mut out = String::with_capacity(text.len());
        let mut last = 0;
        for (found, html) in tokens.iter().zip(rendered) {
            if let Some(html) = html {
                out.push_str(&text[last..found.range.start]);
                out.push_str(&html);
                last = found.range.end;
            }
        }
        out.push_str(&text[last..]);

        tracing::debug!(tokens = tokens.len(), "resolved mentions");
        out
    }

    async fn render(
        &mut self,
        guild: Option<&GuildContext>,
        token: &MentionToken,
        raw: &str,
    ) -> Option<String> {
        match *token {
            MentionToken::Channel(id) => {
                let channel = match guild {
                    Some(guild) => self.lookup_channel(guild, id).await,
                    None => None,
                };
                Some(render_channel(id, channel.as_ref()))
            }
            MentionToken::Member(id) => {
                let member = match guild {
                    Some(guild) => self.lookup_member(guild, id).await,
                    None => None,
                };
                Some(render_member(id, member.as_ref()))
            }
            MentionToken::Everyone => Some(render_broadcast("everyone")),
            MentionToken::Here => Some(render_broadcast("here")),
            MentionToken::Role(id) => {
                let role = match guild {
                    Some(guild) => self.lookup_role(guild, id).await,
                    None => None,
                };
                Some(render_role(role.as_ref()))
            }
            MentionToken::Timestamp { seconds, format } => {
                render_timestamp(seconds, format, raw)
            }
            MentionToken::SlashCommand(ref name) => Some(format!(
                r#"<span class="mention" title="{name}">/{name}</span>"#
            )),
            MentionToken::CustomEmoji { .. } => None,
        }
    }

    async fn lookup_channel(&mut self, guild: &GuildContext, id: u64) -> Option<Channel> {
        if self.unavailable.is_some() {
            return None;
        }
        let key = MemoKey::new("Directory::channel").arg(guild.id).arg(id);
        let (directory, timeout) = (&self.directory, self.timeout);
        let result = self
            .channels
            .try_memo(key, || with_timeout(timeout, directory.channel(guild, id)))
            .await;
        self.settle("channel", id, result)
    }

    async fn lookup_member(&mut self, guild: &GuildContext, id: u64) -> Option<Member> {
        if self.unavailable.is_some() {
            return None;
        }
        let key = MemoKey::new("Directory::member").arg(guild.id).arg(id);
        let (directory, timeout) = (&self.directory, self.timeout);
        let result = self
            .members
            .try_memo(key, || with_timeout(timeout, directory.member(guild, id)))
            .await;
        self.settle("member", id, result)
    }

    async fn lookup_role(&mut self, guild: &GuildContext, id: u64) -> Option<Role> {
        if self.unavailable.is_some() {
            return None;
        }
        let key = MemoKey::new("Directory::role").arg(guild.id).arg(id);
        let (directory, timeout) = (&self.directory, self.timeout);
        let result = self
            .roles
            .try_memo(key, || with_timeout(timeout, directory.role(guild, id)))
            .await;
        self.settle("role", id, result)
    }

    /// Turn a lookup result into a hit or a miss, recording unavailability.
    fn settle<T>(
        &mut self,
        kind: &'static str,
        id: u64,
        result: Result<Option<T>, DirectoryError>,
    ) -> Option<T> {
        match result {
            Ok(found) => found,
            Err(e) => {
                tracing::warn!(kind, id, error = %e, "directory lookup failed, using fallback");
                if let DirectoryError::Unavailable(reason) = e {
                    self.unavailable.get_or_insert(reason);
                }
                None
            }
        }
    }
}

/// Bound `lookup` by `limit`.
///
/// A timeout counts as a miss rather than an error, so it is memoized and a
/// repeated token does not wait again.
async fn with_timeout<T>(
    limit: Duration,
    lookup: impl Future<Output = Result<Option<T>, DirectoryError>>,
) -> Result<Option<T>, DirectoryError> {
    let result = match tokio::time::timeout(limit, lookup).await {
        Ok(result) => result,
        Err(_) => Err(DirectoryError::Timeout(limit)),
    };
    match result {
        Err(e @ DirectoryError::Timeout(_)) => {
            tracing::warn!(error = %e, "directory lookup timed out, using fallback");
            Ok(None)
        }
        other => other,
    }
}

fn render_channel(id: u64, channel: Option<&Channel>) -> String {
    match channel {
        Some(channel) => format!(
            r#"<span class="mention" title="{id}">#{}</span>"#,
            escape_name(&channel.name)
        ),
        None => "#deleted-channel".to_owned(),
    }
}

fn render_member(id: u64, member: Option<&Member>) -> String {
    let name = match member {
        Some(member) => escape_name(&member.display_name),
        None => id.to_string(),
    };
    format!(r#"<span class="mention" title="{id}">@{name}</span>"#)
}

fn render_broadcast(name: &str) -> String {
    format!(r#"<span class="mention" title="{name}">@{name}</span>"#)
}

fn render_role(role: Option<&Role>) -> String {
    let Some(role) = role else {
        return "@deleted-role".to_owned();
    };
    // Uncolored roles render white to stay legible on a dark background.
    let color = if role.color == 0 { 0x00ff_ffff } else { role.color };
    format!(
        r#"<span style="color: #{color:06x};">@{}</span>"#,
        escape_name(&role.name)
    )
}

/// Render a timestamp token, or `None` when the instant is out of range.
///
/// The instant is one second before the token's value, matching how the chat
/// client displays these tokens.
fn render_timestamp(seconds: u64, format: Option<char>, raw: &str) -> Option<String> {
    let seconds = i64::try_from(seconds).ok()?.checked_sub(1)?;
    let instant = DateTime::<Utc>::from_timestamp(seconds, 0)?;
    let format = format
        .filter(|c| TIMESTAMP_FORMATS.contains(*c))
        .unwrap_or('f');
    let raw = escape_html(&unescape_html(raw));

    let mut html = String::new();
    write!(
        html,
        r#"<span class="unix-timestamp" data-timestamp="{}" data-timestamp-format="{format}" data-timestamp-raw="{raw}">{raw}</span>"#,
        instant.to_rfc3339()
    )
    .unwrap();
    Some(html)
}
