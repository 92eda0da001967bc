//! Ordered and unordered lists.
//!
//! Nesting follows indentation parity: an even indentation width opens or
//! continues the level at that width, an odd width is rounded up to the next
//! even one. Two nesting levels are rendered reliably; deeper indentation
//! keeps nesting but is not otherwise normalized.

use std::sync::LazyLock;

use regex::Regex;

static ORDERED_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([ \t]*)[0-9]+\.[ \t]+(.+)$").unwrap());
static UNORDERED_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([ \t]*)[-*][ \t]+(.+)$").unwrap());

/// List flavor.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum ListKind {
    Ordered,
    Unordered,
}

impl ListKind {
    fn pattern(self) -> &'static Regex {
        match self {
            Self::Ordered => &ORDERED_RE,
            Self::Unordered => &UNORDERED_RE,
        }
    }

    fn tag(self) -> &'static str {
        match self {
            Self::Ordered => "ol",
            Self::Unordered => "ul",
        }
    }
}

/// Convert list item lines of one kind into nested list markup.
pub(crate) fn render(text: &str, kind: ListKind) -> String {
    let re = kind.pattern();
    if !text.lines().any(|line| re.is_match(line)) {
        return text.to_owned();
    }

    let tag = kind.tag();
    let top_open = format!(r#"<{tag} class="markup" style="padding-left: 20px;margin: 0 !important">"#);
    let nested_open = format!(r#"<{tag} class="markup">"#);
    let close = format!("</{tag}>");

    let mut lines: Vec<String> = Vec::new();
    // Indentation width of every open level; the top level is 0.
    let mut stack: Vec<usize> = Vec::new();

    for line in text.split('\n') {
        let Some(caps) = re.captures(line) else {
            close_all(&mut lines, &mut stack, &close);
            lines.push(line.to_owned());
            continue;
        };

        if stack.is_empty() {
            lines.push(top_open.clone());
            stack.push(0);
        }

        let indent = caps[1].chars().count();
        let level = if indent % 2 == 0 { indent } else { indent + 1 };
        while stack.len() > 1 && stack.last().is_some_and(|&top| level < top) {
            lines.push(close.clone());
            stack.pop();
        }
        if stack.last().is_some_and(|&top| level > top) {
            lines.push(nested_open.clone());
            stack.push(level);
        }

        lines.push(format!(r#"<li class="markup">{}</li>"#, caps[2].trim()));
    }

    close_all(&mut lines, &mut stack, &close);
    lines.join("\n")
}

/// Close every open level at the end of the last list line.
fn close_all(lines: &mut [String], stack: &mut Vec<usize>, close: &str) {
    if stack.is_empty() {
        return;
    }
    if let Some(last) = lines.last_mut() {
        last.push_str(&close.repeat(stack.len()));
    }
    stack.clear();
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const UL: &str = r#"<ul class="markup" style="padding-left: 20px;margin: 0 !important">"#;
    const OL: &str = r#"<ol class="markup" style="padding-left: 20px;margin: 0 !important">"#;

    #[test]
    fn test_flat_unordered() {
        assert_eq!(
            render("- a\n* b", ListKind::Unordered),
            format!("{UL}\n<li class=\"markup\">a</li>\n<li class=\"markup\">b</li></ul>")
        );
    }

    #[test]
    fn test_two_levels() {
        let html = render("- a\n  - b", ListKind::Unordered);
        assert_eq!(
            html,
            format!(
                "{UL}\n<li class=\"markup\">a</li>\n<ul class=\"markup\">\n<li class=\"markup\">b</li></ul></ul>"
            )
        );
        assert_eq!(html.matches("<ul").count(), 2);
        assert_eq!(html.matches("</ul>").count(), 2);
    }

    #[test]
    fn test_odd_indent_rounds_up() {
        let html = render("- a\n - b\n  - c", ListKind::Unordered);
        // ` - b` and `  - c` share the nested level.
        assert_eq!(html.matches("<ul").count(), 2);
        assert!(html.contains(
            "<ul class=\"markup\">\n<li class=\"markup\">b</li>\n<li class=\"markup\">c</li>"
        ));
    }

    #[test]
    fn test_dedent_closes_nested() {
        let html = render("- a\n  - b\n- c", ListKind::Unordered);
        assert_eq!(
            html,
            format!(
                "{UL}\n<li class=\"markup\">a</li>\n<ul class=\"markup\">\n<li class=\"markup\">b</li>\n</ul>\n<li class=\"markup\">c</li></ul>"
            )
        );
    }

    #[test]
    fn test_text_after_list_closes_it() {
        assert_eq!(
            render("1. one\n2. two\nafter", ListKind::Ordered),
            format!(
                "{OL}\n<li class=\"markup\">one</li>\n<li class=\"markup\">two</li></ol>\nafter"
            )
        );
    }

    #[test]
    fn test_text_before_list_kept() {
        assert_eq!(
            render("intro\n- a", ListKind::Unordered),
            format!("intro\n{UL}\n<li class=\"markup\">a</li></ul>")
        );
    }

    #[test]
    fn test_marker_without_space_is_not_a_list() {
        assert_eq!(render("-a\n*b*", ListKind::Unordered), "-a\n*b*");
    }

    #[test]
    fn test_ordered_ignores_unordered_lines() {
        assert_eq!(render("- a", ListKind::Ordered), "- a");
    }
}
