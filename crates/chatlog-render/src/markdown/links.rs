//! Bare URL linkification and bracketed `[text](url)` links.

use std::sync::LazyLock;

use regex::{Captures, Regex};

use crate::registry::{CodeBlockRegistry, ProtectedBlock};

static WORD_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\S+").unwrap());

static SILENT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"&lt;(https?://\S+?)&gt;").unwrap());

static URL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"https?://[^\s<>`"*\x{E000}\x{E001}]+"#).unwrap());

static BRACKET_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(concat!(
        r"\[([^\]]+)\]\(([^)\s]+)",
        r#"(?:\s+(?:&#x27;|&quot;|'|")([^&#'"]+)(?:&#x27;|&quot;|'|"))?\)"#,
    ))
    .unwrap()
});

/// Entities that end a bare URL in escaped text.
const URL_TERMINATORS: [&str; 3] = ["&lt;", "&gt;", "&quot;"];

fn anchor(url: &str) -> String {
    format!(r#"<a href="{url}" target="_blank">{url}</a>"#)
}

/// Turn bare `http://` and `https://` URLs into anchors.
///
/// Words that already belong to a bracketed link or an HTML attribute are
/// skipped, as are URLs ending in `)`. An angle-bracket wrapped URL is a
/// "silent" link: the wrapper is dropped unless the URL also appears in
/// code protected out of this `text`.
pub(crate) fn linkify(text: &str, registry: &CodeBlockRegistry) -> String {
    if !text.contains("http://") && !text.contains("https://") {
        return text.to_owned();
    }

    let code: Vec<&ProtectedBlock> = registry.blocks_in(text).collect();
    let mut out = String::with_capacity(text.len());
    let mut last = 0;
    for word in WORD_RE.find_iter(text) {
        out.push_str(&text[last..word.start()]);
        out.push_str(&linkify_word(word.as_str(), &code));
        last = word.end();
    }
    out.push_str(&text[last..]);
    out
}

fn linkify_word(word: &str, code: &[&ProtectedBlock]) -> String {
    if !word.contains("http") || ["](", "href=", "src="].iter().any(|s| word.contains(s)) {
        return word.to_owned();
    }

    if SILENT_RE.is_match(word) {
        return SILENT_RE
            .replace_all(word, |caps: &Captures<'_>| {
                let url = &caps[1];
                if code.iter().any(|b| b.raw_content.contains(url)) {
                    format!("&lt;{}&gt;", anchor(url))
                } else {
                    anchor(url)
                }
            })
            .into_owned();
    }

    let Some(found) = URL_RE.find(word) else {
        return word.to_owned();
    };
    let mut url = found.as_str();
    if let Some(cut) = URL_TERMINATORS.iter().filter_map(|t| url.find(t)).min() {
        url = &url[..cut];
    }
    if url.ends_with(')') || !url.contains("://") || url.ends_with("://") {
        return word.to_owned();
    }

    let end = found.start() + url.len();
    format!("{}{}{}", &word[..found.start()], anchor(url), &word[end..])
}

/// Render `[text](url)` and `[text](url 'title')` links.
///
/// The URL may be wrapped in angle brackets. Links whose URL is not
/// `http://` or `https://` stay plain text.
pub(crate) fn bracket_links(text: &str) -> String {
    if !text.contains("](") {
        return text.to_owned();
    }

    BRACKET_RE
        .replace_all(text, |caps: &Captures<'_>| {
            let label = &caps[1];
            let url = unwrap_angle(&caps[2]);
            if !url.starts_with("http://") && !url.starts_with("https://") {
                return caps[0].to_owned();
            }
            match caps.get(3) {
                Some(title) => format!(
                    r#"<a href="{url}" target="_blank" title="{}">{label}</a>"#,
                    title.as_str()
                ),
                None => format!(r#"<a href="{url}" target="_blank">{label}</a>"#),
            }
        })
        .into_owned()
}

fn unwrap_angle(url: &str) -> &str {
    url.strip_prefix("&lt;")
        .and_then(|u| u.strip_suffix("&gt;"))
        .or_else(|| url.strip_prefix('<').and_then(|u| u.strip_suffix('>')))
        .unwrap_or(url)
}
