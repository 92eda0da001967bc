//! HTML escaping helpers.

use std::fmt::Write;

/// Escape HTML special characters.
#[must_use]
pub fn escape_html(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    for c in s.chars() {
        match html_entity(c) {
            Some(entity) => result.push_str(entity),
            None => result.push(c),
        }
    }
    result
}

fn html_entity(c: char) -> Option<&'static str> {
    match c {
        '&' => Some("&amp;"),
        '<' => Some("&lt;"),
        '>' => Some("&gt;"),
        '"' => Some("&quot;"),
        '\'' => Some("&#x27;"),
        _ => None,
    }
}

/// Escape a name supplied by the directory for insertion into markdown.
///
/// Besides the [`escape_html`] entities, characters the markdown passes react
/// to become numeric entities, so a name always renders as literal text.
pub(crate) fn escape_name(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '`' | '*' | '_' | '~' | '|' | '[' | ']' | '(' | ')' | ':' | '#' | '\\' => {
                write!(result, "&#{};", u32::from(c)).unwrap();
            }
            _ => match html_entity(c) {
                Some(entity) => result.push_str(entity),
                None => result.push(c),
            },
        }
    }
    result
}

/// Reverse [`escape_html`] for the entities it produces.
///
/// `&amp;` is decoded last so `&amp;lt;` becomes `&lt;`, not `<`.
#[must_use]
pub(crate) fn unescape_html(s: &str) -> String {
    if !s.contains('&') {
        return s.to_owned();
    }
    s.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#x27;", "'")
        .replace("&#39;", "'")
        .replace("&amp;", "&")
}
