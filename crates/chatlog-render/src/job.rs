//! Render jobs.
//!
//! A [`RenderJob`] renders one document. It owns everything a render needs to
//! remember between values: the code block registry and the directory
//! lookup caches. Concurrent jobs share nothing but the directory.
//!
//! Values are rendered with [`RenderJob::render`] or substituted into
//! templates with [`RenderJob::fill`]. The assembled document is handed to
//! [`RenderJob::finish`], which writes protected code back and consumes the
//! job, so restoration happens exactly once.

use crate::directory::{Directory, GuildContext};
use crate::error::RenderError;
use crate::markdown::MarkdownTransformer;
use crate::mention::MentionResolver;
use crate::mode::RenderMode;
use crate::options::RenderOptions;
use crate::template::{Substitution, TemplateValues, is_marker_key};

/// Rendering state for one document.
#[derive(Debug)]
pub struct RenderJob<D> {
    guild: Option<GuildContext>,
    resolver: MentionResolver<D>,
    markdown: MarkdownTransformer,
}

impl<D: Directory> RenderJob<D> {
    /// Create a job with default [`RenderOptions`].
    ///
    /// `guild` is `None` for direct messages; mentions then render their
    /// fallbacks without consulting `directory`.
    #[must_use]
    pub fn new(directory: D, guild: Option<GuildContext>) -> Self {
        Self::with_options(directory, guild, &RenderOptions::default())
    }

    #[must_use]
    pub fn with_options(directory: D, guild: Option<GuildContext>, options: &RenderOptions) -> Self {
        Self {
            guild,
            resolver: MentionResolver::new(directory).with_timeout(options.lookup_timeout),
            markdown: MarkdownTransformer::new()
                .with_emoji(options.emoji_table())
                .with_emoji_cdn(options.emoji_cdn.clone()),
        }
    }

    /// Render one HTML-escaped value.
    ///
    /// Code is protected first so mentions inside code stay literal, then
    /// mentions are resolved, then the markdown flow of `mode` runs. The
    /// result may still contain protection ids until [`finish`](Self::finish).
    pub async fn render(&mut self, value: &str, mode: RenderMode) -> String {
        if !mode.resolves_mentions() {
            return value.to_owned();
        }
        let text = if mode.protects_code() {
            self.markdown.protect_code(value, mode.code_style())
        } else {
            value.to_owned()
        };
        let text = self.resolver.resolve(self.guild.as_ref(), &text).await;
        self.markdown.run(mode, &text)
    }

    /// Render every substitution and insert the results into `template`.
    ///
    /// Values are trimmed. When a key repeats, its first substitution wins.
    /// Keys a marker cannot name are skipped without rendering their value.
    /// All markers are replaced in one pass over `template`, so a rendered
    /// value is never searched for markers.
    pub async fn fill(&mut self, template: &str, substitutions: &[Substitution]) -> String {
        let mut values = TemplateValues::with_capacity(substitutions.len());
        for substitution in substitutions {
            if !is_marker_key(&substitution.key) {
                tracing::debug!(key = %substitution.key, "Skipping invalid template key");
                continue;
            }
            if values.contains(&substitution.key) {
                tracing::debug!(key = %substitution.key, "Skipping duplicate template key");
                continue;
            }
            let rendered = self.render(&substitution.value, substitution.mode).await;
            values.add(substitution.key.as_str(), rendered.trim());
        }

        tracing::debug!(substitutions = values.len(), "Filled template");
        values.apply(template)
    }

    /// [`fill`](Self::fill) a whole document and [`finish`](Self::finish) the job.
    ///
    /// # Errors
    ///
    /// Returns [`RenderError::DirectoryUnavailable`] if the directory could
    /// not be reached during the job.
    pub async fn fill_final(
        mut self,
        template: &str,
        substitutions: &[Substitution],
    ) -> Result<String, RenderError> {
        let document = self.fill(template, substitutions).await;
        self.finish(&document)
    }

    /// Restore protected code in the assembled `document` and end the job.
    ///
    /// # Errors
    ///
    /// Returns [`RenderError::DirectoryUnavailable`] if the directory could
    /// not be reached during the job.
    pub fn finish(self, document: &str) -> Result<String, RenderError> {
        if let Some(reason) = self.resolver.unavailable() {
            return Err(RenderError::DirectoryUnavailable(reason.to_owned()));
        }
        Ok(self.markdown.restore(document))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::directory::EmptyDirectory;
    use crate::directory::testing::MockDirectory;
    use crate::error::DirectoryError;
    use pretty_assertions::assert_eq;

    fn guild() -> Option<GuildContext> {
        Some(GuildContext::new(1))
    }

    async fn render_once<D: Directory>(mut job: RenderJob<D>, value: &str, mode: RenderMode) -> String {
        let out = job.render(value, mode).await;
        job.finish(&out).unwrap()
    }

    #[tokio::test]
    async fn test_member_mention() {
        let directory = MockDirectory::new().with_member(123, "Alice");
        let html = render_once(
            RenderJob::new(&directory, guild()),
            "&lt;@123&gt;",
            RenderMode::PlainMarkdown,
        )
        .await;
        assert_eq!(html, r#"<span class="mention" title="123">@Alice</span>"#);
    }

    #[tokio::test]
    async fn test_member_miss() {
        let html = render_once(
            RenderJob::new(EmptyDirectory, guild()),
            "<@123>",
            RenderMode::PlainMarkdown,
        )
        .await;
        assert_eq!(html, r#"<span class="mention" title="123">@123</span>"#);
    }

    #[tokio::test]
    async fn test_channel_without_guild() {
        let directory = MockDirectory::new().with_channel(555, "general");
        let html = render_once(RenderJob::new(&directory, None), "<#555>", RenderMode::PlainMarkdown).await;
        assert_eq!(html, "#deleted-channel");
        assert_eq!(directory.calls(), 0);
    }

    #[tokio::test]
    async fn test_nested_list() {
        let html = render_once(
            RenderJob::new(EmptyDirectory, None),
            "- a\n  - b",
            RenderMode::PlainMarkdown,
        )
        .await;
        assert_eq!(html.matches("<ul").count(), 2);
        let inner = html
            .split(r#"<ul class="markup">"#)
            .nth(1)
            .unwrap_or_default();
        assert_eq!(inner.matches("<li").count(), 1);
    }

    #[tokio::test]
    async fn test_timestamp() {
        let html = render_once(
            RenderJob::new(EmptyDirectory, None),
            "&lt;t:1700000000:R&gt;",
            RenderMode::PlainMarkdown,
        )
        .await;
        assert!(html.contains(r#"data-timestamp-format="R""#), "{html}");
        assert!(
            html.contains(r#"data-timestamp="2023-11-14T22:13:19+00:00""#),
            "{html}"
        );
    }

    #[tokio::test]
    async fn test_bold_and_code() {
        let html = render_once(
            RenderJob::new(EmptyDirectory, None),
            "**hi** `code`",
            RenderMode::PlainMarkdown,
        )
        .await;
        assert_eq!(
            html,
            r#"<strong>hi</strong> <span class="pre pre-inline">code</span>"#
        );
    }

    #[tokio::test]
    async fn test_mention_inside_code_is_literal() {
        let directory = MockDirectory::new().with_member(1, "Alice");
        let html = render_once(
            RenderJob::new(&directory, guild()),
            "`&lt;@1&gt;`",
            RenderMode::PlainMarkdown,
        )
        .await;
        assert_eq!(html, r#"<span class="pre pre-inline">&lt;@1&gt;</span>"#);
        assert_eq!(directory.calls(), 0);
    }

    #[tokio::test]
    async fn test_none_mode_is_untouched() {
        let directory = MockDirectory::new().with_member(1, "Alice");
        let mut job = RenderJob::new(&directory, guild());
        assert_eq!(job.render("<@1> **x**", RenderMode::None).await, "<@1> **x**");
        assert_eq!(directory.calls(), 0);
    }

    #[tokio::test]
    async fn test_mentions_only() {
        let directory = MockDirectory::new().with_member(1, "Alice");
        let html = render_once(
            RenderJob::new(&directory, guild()),
            "<@1> **x** `y`",
            RenderMode::MentionsOnly,
        )
        .await;
        assert_eq!(
            html,
            r#"<span class="mention" title="1">@Alice</span> **x** `y`"#
        );
    }

    #[tokio::test]
    async fn test_fill_is_disjoint() {
        let job = RenderJob::new(EmptyDirectory, None);
        let html = job
            .fill_final(
                "<b>{{AUTHOR}}</b><div>{{BODY}}</div>",
                &[
                    Substitution::raw("AUTHOR", "{{BODY}}"),
                    Substitution::new("BODY", "  **hi** `x`\n"),
                ],
            )
            .await
            .unwrap();
        assert_eq!(
            html,
            r#"<b>{{BODY}}</b><div><strong>hi</strong> <span class="pre pre-inline">x</span></div>"#
        );
    }

    #[tokio::test]
    async fn test_fill_duplicate_key_first_wins() {
        let mut job = RenderJob::new(EmptyDirectory, None);
        let html = job
            .fill(
                "{{K}}",
                &[Substitution::raw("K", "first"), Substitution::raw("K", "second")],
            )
            .await;
        assert_eq!(html, "first");
    }

    #[tokio::test]
    async fn test_fill_skips_invalid_key_without_lookup() {
        let directory = MockDirectory::new().with_member(1, "Alice");
        let mut job = RenderJob::new(&directory, guild());
        let html = job
            .fill(
                "{{user-name}} {{BODY}}",
                &[Substitution::new("user-name", "<@1>"), Substitution::raw("BODY", "b")],
            )
            .await;
        assert_eq!(html, "{{user-name}} b");
        assert_eq!(directory.calls(), 0);
    }

    #[tokio::test]
    async fn test_directory_names_are_not_markdown() {
        let directory = MockDirectory::new()
            .with_member(1, "`x` **y**")
            .with_channel(2, "a_b_c_")
            .with_role(3, "||mods||", 0);
        let html = render_once(
            RenderJob::new(&directory, guild()),
            "<@1> <#2> <@&3>",
            RenderMode::PlainMarkdown,
        )
        .await;
        assert_eq!(
            html,
            concat!(
                r#"<span class="mention" title="1">@&#96;x&#96; &#42;&#42;y&#42;&#42;</span> "#,
                r#"<span class="mention" title="2">#a&#95;b&#95;c&#95;</span> "#,
                r#"<span style="color: #ffffff;">@&#124;&#124;mods&#124;&#124;</span>"#,
            )
        );
    }

    #[tokio::test]
    async fn test_fill_then_finish_document() {
        let mut job = RenderJob::new(EmptyDirectory, None);
        let mut document = String::new();
        for body in ["`a`", "```\nb\n```"] {
            document.push_str(
                &job.fill("<p>{{BODY}}</p>", &[Substitution::new("BODY", body)])
                    .await,
            );
        }
        assert!(!document.contains('`'));
        assert_eq!(
            job.finish(&document).unwrap(),
            r#"<p><span class="pre pre-inline">a</span></p><p><div class="pre pre--multiline nohighlight">b</div></p>"#
        );
    }

    #[tokio::test]
    async fn test_options_configure_emoji() {
        let options = RenderOptions {
            emoji_cdn: "https://e.example/".to_owned(),
            extra_emoji: [("blob".to_owned(), "🫠".to_owned())].into(),
            ..RenderOptions::default()
        };
        let html = render_once(
            RenderJob::with_options(EmptyDirectory, None, &options),
            ":blob: &lt;a:spin:9&gt;",
            RenderMode::PlainMarkdown,
        )
        .await;
        assert_eq!(
            html,
            r#"🫠 <img class="emoji emoji--small" src="https://e.example/9.gif">"#
        );
    }

    #[tokio::test]
    async fn test_concurrent_jobs_are_isolated() {
        let directory = MockDirectory::new().with_member(1, "Alice");
        let mut first = RenderJob::new(&directory, guild());
        let mut second = RenderJob::new(&directory, guild());

        let (a, b) = tokio::join!(
            first.render("<@1> `one`", RenderMode::PlainMarkdown),
            second.render("<@1> `two`", RenderMode::PlainMarkdown),
        );

        let a = first.finish(&a).unwrap();
        let b = second.finish(&b).unwrap();
        assert_eq!(
            a,
            r#"<span class="mention" title="1">@Alice</span> <span class="pre pre-inline">one</span>"#
        );
        assert_eq!(
            b,
            r#"<span class="mention" title="1">@Alice</span> <span class="pre pre-inline">two</span>"#
        );
        // Each job has its own lookup cache.
        assert_eq!(directory.calls(), 2);
    }

    #[tokio::test]
    async fn test_unavailable_directory_fails_job() {
        let directory =
            MockDirectory::new().failing(DirectoryError::Unavailable("gateway down".to_owned()));
        let mut job = RenderJob::new(&directory, guild());

        let html = job.render("<@1> <@2>", RenderMode::PlainMarkdown).await;

        assert_eq!(
            html,
            r#"<span class="mention" title="1">@1</span> <span class="mention" title="2">@2</span>"#
        );
        assert_eq!(directory.calls(), 1);
        let err = job.finish(&html).unwrap_err();
        assert_eq!(err.to_string(), "Directory unavailable during render: gateway down");
    }

    #[tokio::test]
    async fn test_lookup_failure_degrades_silently() {
        let directory =
            MockDirectory::new().failing(DirectoryError::Lookup("not permitted".to_owned()));
        let html = render_once(
            RenderJob::new(&directory, guild()),
            "<@&5>",
            RenderMode::PlainMarkdown,
        )
        .await;
        assert_eq!(html, "@deleted-role");
    }
}
