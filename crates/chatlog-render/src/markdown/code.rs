//! Code span and block protection.
//!
//! Fenced blocks are extracted first, then double-backtick spans, then
//! single-backtick spans. Each extracted piece is stored in the
//! [`CodeBlockRegistry`] and replaced by markup around its id, so no later
//! pass ever sees code content.

use std::sync::LazyLock;

use regex::{Captures, Regex};

use crate::mode::CodeStyle;
use crate::registry::CodeBlockRegistry;

static FENCE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?s)```(.*?)```").unwrap());
// Inline spans never start or end on a backtick, so leftover fence
// backticks cannot open a span.
static DOUBLE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)``([^`](?:.*?[^`])?)``").unwrap());
static SINGLE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"`([^`]+)`").unwrap());

/// Fence languages that get a `language-*` class.
const LANGUAGES: &[&str] = &[
    "asciidoc",
    "autohotkey",
    "bash",
    "coffeescript",
    "cpp",
    "cs",
    "css",
    "diff",
    "fix",
    "glsl",
    "ini",
    "json",
    "md",
    "ml",
    "prolog",
    "py",
    "tex",
    "xl",
    "xml",
    "js",
    "html",
];

/// Markup produced by earlier passes, mapped back to the markdown that made it.
static MARKUP_REVERSALS: LazyLock<Vec<(Regex, &'static str)>> = LazyLock::new(|| {
    [
        (r"<strong>(.*?)</strong>", "**$1**"),
        (r"<em>([^<>]*)</em>", "*$1*"),
        (r"<h1>([^<>]*)</h1>", "# $1"),
        (r"<h2>([^<>]*)</h2>", "## $1"),
        (r"<h3>([^<>]*)</h3>", "### $1"),
        (
            r#"<span style="text-decoration: underline">([^<>]*)</span>"#,
            "__${1}__",
        ),
        (
            r#"<span style="text-decoration: line-through">([^<>]*)</span>"#,
            "~~$1~~",
        ),
        (r#"(?s)<div class="quote">(.*?)</div>"#, "&gt; $1"),
        (
            r#"<span class="spoiler spoiler--hidden" onclick="showSpoiler\(event, this\)"> <span class="spoiler-text">(.*?)</span></span>"#,
            "||$1||",
        ),
        (
            r#"<span class="unix-timestamp" data-timestamp="[^"]*" data-timestamp-format="[^"]*" data-timestamp-raw="([^"]*)">[^<]*</span>"#,
            "$1",
        ),
        (
            r#"<a href="([^"]+)" target="_blank" title="([^"]+)">([^<]*)</a>"#,
            "[$3]($1 &quot;$2&quot;)",
        ),
        (r"<br>", "\n"),
    ]
    .into_iter()
    .map(|(pattern, replacement)| (Regex::new(pattern).unwrap(), replacement))
    .collect()
});

static ANCHOR_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"<a href="([^"]+)" target="_blank">([^<]*)</a>"#).unwrap());

/// Extract all code from `text` into `registry`.
pub(crate) fn protect(registry: &mut CodeBlockRegistry, text: &str, style: CodeStyle) -> String {
    if !text.contains('`') {
        return text.to_owned();
    }

    let fenced = FENCE_RE
        .replace_all(text, |caps: &Captures<'_>| {
            let (class, content) = fence_parts(&caps[1]);
            let id = registry.protect(text, &content);
            match style {
                CodeStyle::Block => format!(r#"<div class="pre pre--multiline {class}">{id}</div>"#),
                CodeStyle::Inline => format!(r#"<span class="pre pre-inline">{id}</span>"#),
            }
        })
        .into_owned();

    let doubled = protect_inline(registry, &DOUBLE_RE, &fenced);
    protect_inline(registry, &SINGLE_RE, &doubled)
}

fn protect_inline(registry: &mut CodeBlockRegistry, re: &Regex, text: &str) -> String {
    re.replace_all(text, |caps: &Captures<'_>| {
        let id = registry.protect(text, &reverse_markup(&caps[1]));
        format!(r#"<span class="pre pre-inline">{id}</span>"#)
    })
    .into_owned()
}

/// Split a fence body into its CSS class and display content.
fn fence_parts(body: &str) -> (String, String) {
    let (class, content) = match body.split_once('\n') {
        Some((first, rest)) => {
            let tag = first.trim().to_ascii_lowercase();
            if LANGUAGES.contains(&tag.as_str()) {
                (format!("language-{tag}"), rest)
            } else {
                ("nohighlight".to_owned(), body)
            }
        }
        None => ("nohighlight".to_owned(), body),
    };

    let content = reverse_markup(content);
    let content = content.trim_matches(|c| c == '\n' || c == '\r');
    (class, content.replace("  ", "&nbsp;&nbsp;"))
}

/// Turn markup produced by this pipeline back into its markdown source.
///
/// Captured text is already escaped, so it is not escaped again.
fn reverse_markup(content: &str) -> String {
    if !content.contains('<') {
        return content.to_owned();
    }

    let mut content = content.to_owned();
    for (re, replacement) in MARKUP_REVERSALS.iter() {
        if re.is_match(&content) {
            content = re.replace_all(&content, *replacement).into_owned();
        }
    }
    ANCHOR_RE
        .replace_all(&content, |caps: &Captures<'_>| {
            if caps[1] == caps[2] {
                caps[1].to_owned()
            } else {
                format!("[{}]({})", &caps[2], &caps[1])
            }
        })
        .into_owned()
}
