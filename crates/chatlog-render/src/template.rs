//! Template marker substitution.
//!
//! Markers have the form `{{KEY}}`. All values are collected first, then
//! [`TemplateValues::apply`] replaces every marker of the original template in
//! one pass. A substituted value is never scanned for markers, so a value
//! containing `{{OTHER}}` is inserted verbatim.

use std::collections::HashMap;
use std::sync::LazyLock;

use regex::{Captures, Regex};

use crate::mode::RenderMode;

static MARKER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{\{([A-Za-z0-9_]+)\}\}").unwrap());

/// Whether `key` can appear in a `{{KEY}}` marker.
pub(crate) fn is_marker_key(key: &str) -> bool {
    !key.is_empty() && key.bytes().all(|b| b.is_ascii_alphanumeric() || b == b'_')
}

/// One template value and the processing it receives before insertion.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Substitution {
    pub key: String,
    pub value: String,
    pub mode: RenderMode,
}

impl Substitution {
    /// Value rendered as a full message body ([`RenderMode::PlainMarkdown`]).
    #[must_use]
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self::with_mode(key, value, RenderMode::PlainMarkdown)
    }

    /// Value inserted unchanged ([`RenderMode::None`]).
    #[must_use]
    pub fn raw(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self::with_mode(key, value, RenderMode::None)
    }

    #[must_use]
    pub fn with_mode(key: impl Into<String>, value: impl Into<String>, mode: RenderMode) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
            mode,
        }
    }
}

/// Collects marker values for single-pass application.
///
/// # Example
///
/// ```
/// use chatlog_render::TemplateValues;
///
/// let mut values = TemplateValues::new();
/// values.add("NAME", "{{BODY}}");
/// values.add("BODY", "hello");
///
/// assert_eq!(
///     values.apply("<b>{{NAME}}</b>: {{BODY}}"),
///     "<b>{{BODY}}</b>: hello"
/// );
/// ```
#[derive(Debug, Default)]
pub struct TemplateValues {
    values: HashMap<String, String>,
}

impl TemplateValues {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            values: HashMap::with_capacity(capacity),
        }
    }

    /// Register the value for `{{key}}`.
    ///
    /// Returns `false` and keeps the earlier value if `key` is already set.
    /// Keys that are not ASCII letters, digits and `_` can never match a
    /// marker; they are rejected with `false` as well.
    pub fn add(&mut self, key: impl Into<String>, value: impl Into<String>) -> bool {
        let key = key.into();
        if !is_marker_key(&key) {
            tracing::debug!(key = %key, "Skipping invalid template key");
            return false;
        }
        if self.values.contains_key(&key) {
            return false;
        }
        self.values.insert(key, value.into());
        true
    }

    /// Whether a value is registered for `key`.
    #[must_use]
    pub fn contains(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Replace every known marker in `template`. Unknown markers stay as they are.
    ///
    /// Consumes the values to prevent accidental reuse.
    #[must_use]
    pub fn apply(self, template: &str) -> String {
        if self.values.is_empty() {
            return template.to_owned();
        }
        MARKER_RE
            .replace_all(template, |caps: &Captures<'_>| {
                self.values
                    .get(&caps[1])
                    .map_or_else(|| caps[0].to_owned(), Clone::clone)
            })
            .into_owned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_empty_values() {
        assert_eq!(TemplateValues::new().apply("a {{X}} b"), "a {{X}} b");
    }

    #[test]
    fn test_single_marker() {
        let mut values = TemplateValues::new();
        values.add("NAME", "world");
        assert_eq!(values.apply("hello {{NAME}}"), "hello world");
    }

    #[test]
    fn test_every_occurrence_replaced() {
        let mut values = TemplateValues::new();
        values.add("ID", "7");
        assert_eq!(values.apply(r#"<a id="{{ID}}">{{ID}}</a>"#), r#"<a id="7">7</a>"#);
    }

    #[test]
    fn test_unknown_marker_kept() {
        let mut values = TemplateValues::new();
        values.add("A", "1");
        assert_eq!(values.apply("{{A}} {{B}} {{}}"), "1 {{B}} {{}}");
    }

    #[test]
    fn test_value_is_not_rescanned() {
        let mut values = TemplateValues::new();
        values.add("FIRST", "{{SECOND}}");
        values.add("SECOND", "{{FIRST}}");
        assert_eq!(values.apply("{{FIRST}}|{{SECOND}}"), "{{SECOND}}|{{FIRST}}");
    }

    #[test]
    fn test_first_value_wins() {
        let mut values = TemplateValues::new();
        assert!(values.add("K", "first"));
        assert!(!values.add("K", "second"));
        assert_eq!(values.len(), 1);
        assert_eq!(values.apply("{{K}}"), "first");
    }

    #[test]
    fn test_invalid_key_rejected() {
        let mut values = TemplateValues::new();
        assert!(!values.add("MY-KEY", "x"));
        assert!(!values.add("", "x"));
        assert!(!values.add("KÉY", "x"));
        assert!(values.add("MY_KEY_2", "y"));
        assert_eq!(values.len(), 1);
        assert_eq!(values.apply("{{MY-KEY}} {{MY_KEY_2}}"), "{{MY-KEY}} y");
    }

    #[test]
    fn test_with_capacity() {
        let values = TemplateValues::with_capacity(4);
        assert!(values.is_empty());
        assert!(!values.contains("K"));
    }

    #[test]
    fn test_substitution_modes() {
        assert_eq!(Substitution::new("K", "v").mode, RenderMode::PlainMarkdown);
        assert_eq!(Substitution::raw("K", "v").mode, RenderMode::None);
        assert_eq!(
            Substitution::with_mode("K", "v", RenderMode::Reference).mode,
            RenderMode::Reference
        );
    }
}
