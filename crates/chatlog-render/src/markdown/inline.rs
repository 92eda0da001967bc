//! Inline styling and headers.
//!
//! Each marker is one independent regex pass. Two-character markers run
//! before the single-character markers they contain (`__` before `_`, `**`
//! before `*`). A match preceded by a backslash, or starting inside an HTML
//! tag produced by an earlier pass, is left alone.

use std::sync::LazyLock;

use regex::Regex;

struct InlineRule {
    re: Regex,
    open: &'static str,
    close: &'static str,
    /// Only match at word boundaries (`snake_case` is not italic).
    word_bound: bool,
}

impl InlineRule {
    fn new(pattern: &str, open: &'static str, close: &'static str) -> Self {
        Self {
            re: Regex::new(pattern).unwrap(),
            open,
            close,
            word_bound: false,
        }
    }

    fn word_bound(mut self) -> Self {
        self.word_bound = true;
        self
    }
}

static INLINE_RULES: LazyLock<Vec<InlineRule>> = LazyLock::new(|| {
    vec![
        InlineRule::new(
            r"__(.+?)__",
            r#"<span style="text-decoration: underline">"#,
            "</span>",
        ),
        InlineRule::new(r"\*\*(.+?)\*\*", "<strong>", "</strong>"),
        InlineRule::new(r"\*([^*\n]+)\*", "<em>", "</em>"),
        InlineRule::new(r"_([^_\n]+)_", "<em>", "</em>").word_bound(),
        InlineRule::new(
            r"~~(.+?)~~",
            r#"<span style="text-decoration: line-through">"#,
            "</span>",
        ),
        InlineRule::new(
            r"\|\|(.+?)\|\|",
            r#"<span class="spoiler spoiler--hidden" onclick="showSpoiler(event, this)"> <span class="spoiler-text">"#,
            "</span></span>",
        ),
    ]
});

static HEADER_RULES: LazyLock<Vec<(Regex, &'static str)>> = LazyLock::new(|| {
    [("###", "h3"), ("##", "h2"), ("#", "h1")]
        .into_iter()
        .map(|(marker, tag)| {
            let re = Regex::new(&format!(r"(?m)^{marker}[ \t]+(.+?)[ \t]*$")).unwrap();
            (re, tag)
        })
        .collect()
});

/// Apply underline, bold, italic, strikethrough and spoiler markers.
pub(crate) fn style(text: &str) -> String {
    let mut text = text.to_owned();
    for rule in INLINE_RULES.iter() {
        if rule.re.is_match(&text) {
            text = apply(rule, &text);
        }
    }
    text
}

/// Turn line-leading `#`, `##` and `###` markers into heading elements.
pub(crate) fn headers(text: &str) -> String {
    if !text.contains('#') {
        return text.to_owned();
    }
    let mut text = text.to_owned();
    for (re, tag) in HEADER_RULES.iter() {
        text = re
            .replace_all(&text, format!("<{tag}>$1</{tag}>").as_str())
            .into_owned();
    }
    text
}

fn apply(rule: &InlineRule, text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut last = 0;
    let mut pos = 0;

    while let Some(caps) = rule.re.captures_at(text, pos) {
        let Some(whole) = caps.get(0) else { break };
        let (start, end) = (whole.start(), whole.end());

        if is_escaped(text, start)
            || inside_tag(&text[..start])
            || (rule.word_bound && !at_word_boundary(text, start, end))
        {
            // Retry one character further so an overlapping match can still be found.
            pos = start + text[start..].chars().next().map_or(1, char::len_utf8);
            continue;
        }

        out.push_str(&text[last..start]);
        out.push_str(rule.open);
        out.push_str(&caps[1]);
        out.push_str(rule.close);
        last = end;
        pos = end;
    }

    out.push_str(&text[last..]);
    out
}

fn is_escaped(text: &str, start: usize) -> bool {
    text[..start].ends_with('\\')
}

/// Whether the end of `prefix` lies inside an HTML tag.
pub(crate) fn inside_tag(prefix: &str) -> bool {
    let Some(open) = prefix.rfind('<') else {
        return false;
    };
    if prefix[open..].contains('>') {
        return false;
    }
    prefix[open + 1..]
        .chars()
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '/')
}

fn at_word_boundary(text: &str, start: usize, end: usize) -> bool {
    let before = text[..start].chars().next_back();
    let after = text[end..].chars().next();
    !before.is_some_and(char::is_alphanumeric) && !after.is_some_and(char::is_alphanumeric)
}
