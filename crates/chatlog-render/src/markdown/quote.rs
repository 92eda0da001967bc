//! Block quote merging.
//!
//! Consecutive quoted lines merge into one `<div class="quote">`, keeping
//! their line breaks. The two dialects differ only in the marker: message
//! bodies arrive HTML-escaped and use `&gt;`, embeds use a raw `> `.

/// Quote marker dialect.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum QuoteDialect {
    /// `&gt;` followed by optional whitespace and text.
    Message,
    /// `>` followed by one whitespace character and text.
    Embed,
}

impl QuoteDialect {
    /// Quoted text of `line`, if it is a quote line.
    fn body(self, line: &str) -> Option<&str> {
        match self {
            Self::Message => {
                let rest = line.strip_prefix("&gt;")?;
                if rest.is_empty() {
                    return None;
                }
                Some(rest.strip_prefix(' ').unwrap_or(rest))
            }
            Self::Embed => {
                let rest = line.strip_prefix('>')?;
                let mut chars = rest.chars();
                let first = chars.next()?;
                let body = chars.as_str();
                (first.is_whitespace() && !body.is_empty()).then_some(body)
            }
        }
    }
}

enum Segment<'a> {
    Line(&'a str),
    Quote(String),
}

/// Merge quoted lines of `text` into quote blocks.
///
/// A quote block is block-level, so the line break right after it is
/// dropped.
pub(crate) fn merge(text: &str, dialect: QuoteDialect) -> String {
    let mut segments: Vec<Segment<'_>> = Vec::new();
    for line in text.split('\n') {
        let body = dialect.body(line);
        if let (Some(body), Some(Segment::Quote(quote))) = (body, segments.last_mut()) {
            quote.push('\n');
            quote.push_str(body);
            continue;
        }
        segments.push(match body {
            Some(body) => Segment::Quote(body.to_owned()),
            None => Segment::Line(line),
        });
    }

    if !segments.iter().any(|s| matches!(s, Segment::Quote(_))) {
        return text.to_owned();
    }

    let mut out = String::with_capacity(text.len() + 32);
    let mut after_quote = false;
    for (i, segment) in segments.iter().enumerate() {
        if i > 0 && !after_quote {
            out.push('\n');
        }
        match segment {
            Segment::Line(line) => {
                out.push_str(line);
                after_quote = false;
            }
            Segment::Quote(quote) => {
                out.push_str(r#"<div class="quote">"#);
                out.push_str(quote);
                out.push_str("</div>");
                after_quote = true;
            }
        }
    }
    out
}
