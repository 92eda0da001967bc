//! Emoji expansion.
//!
//! Custom guild emoji (`<:name:id>`, animated `<a:name:id>`) become `<img>`
//! tags pointing at the emoji CDN. `:shortcode:` names found in the
//! [`EmojiTable`] become their Unicode grapheme.

use std::collections::HashMap;
use std::sync::LazyLock;

use regex::{Captures, Regex};

use super::inline::inside_tag;

static CUSTOM_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?P<open>&lt;|<)(?P<animated>a)?:[^\s:<>&]+:(?P<id>[0-9]+)(?P<close>&gt;|>)")
        .unwrap()
});

static SHORTCODE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r":([a-zA-Z0-9_+\-]+):").unwrap());

static BUILTIN: LazyLock<HashMap<&'static str, &'static str>> = LazyLock::new(|| {
    HashMap::from([
        ("+1", "👍"),
        ("-1", "👎"),
        ("100", "💯"),
        ("angry", "😠"),
        ("blush", "😊"),
        ("boom", "💥"),
        ("broken_heart", "💔"),
        ("bug", "🐛"),
        ("check", "✔️"),
        ("clap", "👏"),
        ("confused", "😕"),
        ("cool", "🆒"),
        ("cry", "😢"),
        ("eyes", "👀"),
        ("facepalm", "🤦"),
        ("fire", "🔥"),
        ("frowning", "😦"),
        ("ghost", "👻"),
        ("grin", "😁"),
        ("grinning", "😀"),
        ("heart", "❤️"),
        ("heart_eyes", "😍"),
        ("hugging", "🤗"),
        ("innocent", "😇"),
        ("joy", "😂"),
        ("kiss", "💋"),
        ("laughing", "😆"),
        ("man_shrugging", "🤷‍♂️"),
        ("muscle", "💪"),
        ("neutral_face", "😐"),
        ("no_entry", "⛔"),
        ("ok", "🆗"),
        ("ok_hand", "👌"),
        ("partying_face", "🥳"),
        ("point_down", "👇"),
        ("point_left", "👈"),
        ("point_right", "👉"),
        ("point_up", "☝️"),
        ("poop", "💩"),
        ("pray", "🙏"),
        ("question", "❓"),
        ("rage", "😡"),
        ("raised_hands", "🙌"),
        ("relieved", "😌"),
        ("rocket", "🚀"),
        ("rofl", "🤣"),
        ("scream", "😱"),
        ("see_no_evil", "🙈"),
        ("shrug", "🤷"),
        ("skull", "💀"),
        ("sleeping", "😴"),
        ("slight_frown", "🙁"),
        ("slight_smile", "🙂"),
        ("smile", "😄"),
        ("smiley", "😃"),
        ("smirk", "😏"),
        ("sob", "😭"),
        ("sparkles", "✨"),
        ("star", "⭐"),
        ("sunglasses", "😎"),
        ("sweat_smile", "😅"),
        ("tada", "🎉"),
        ("thinking", "🤔"),
        ("thumbsdown", "👎"),
        ("thumbsup", "👍"),
        ("trophy", "🏆"),
        ("upside_down", "🙃"),
        ("warning", "⚠️"),
        ("wave", "👋"),
        ("white_check_mark", "✅"),
        ("wink", "😉"),
        ("x", "❌"),
        ("yum", "😋"),
        ("zap", "⚡"),
        ("zipper_mouth", "🤐"),
    ])
});

/// Shortcode name (without colons) to Unicode grapheme.
#[derive(Clone, Debug, Default)]
pub struct EmojiTable {
    extra: HashMap<String, String>,
}

impl EmojiTable {
    /// Table with the built-in shortcodes only.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or override shortcodes.
    #[must_use]
    pub fn with_extra<K, V>(mut self, entries: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        self.extra
            .extend(entries.into_iter().map(|(k, v)| (k.into(), v.into())));
        self
    }

    /// Grapheme for `name`, configured entries first.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.extra
            .get(name)
            .map(String::as_str)
            .or_else(|| BUILTIN.get(name).copied())
    }
}

/// Expand custom emoji and shortcodes in `text`.
pub(crate) fn expand(text: &str, table: &EmojiTable, cdn: &str) -> String {
    let text = expand_custom(text, cdn);
    expand_shortcodes(&text, table)
}

fn expand_custom(text: &str, cdn: &str) -> String {
    if !text.contains(':') {
        return text.to_owned();
    }
    let cdn = cdn.trim_end_matches('/');
    CUSTOM_RE
        .replace_all(text, |caps: &Captures<'_>| {
            let start = caps.get(0).map_or(0, |m| m.start());
            let escaped = &caps["open"] == "&lt;";
            if escaped != (&caps["close"] == "&gt;") || text[..start].ends_with('\\') {
                return caps[0].to_owned();
            }
            let extension = if caps.name("animated").is_some() {
                "gif"
            } else {
                "png"
            };
            format!(
                r#"<img class="emoji emoji--small" src="{cdn}/{}.{extension}">"#,
                &caps["id"]
            )
        })
        .into_owned()
}

fn expand_shortcodes(text: &str, table: &EmojiTable) -> String {
    let mut out = String::with_capacity(text.len());
    let mut last = 0;
    let mut pos = 0;

    while let Some(caps) = SHORTCODE_RE.captures_at(text, pos) {
        let Some(whole) = caps.get(0) else { break };
        let grapheme = table
            .get(&caps[1])
            .filter(|_| !inside_tag(&text[..whole.start()]));
        let Some(grapheme) = grapheme else {
            // The closing colon may open the next shortcode.
            pos = whole.start() + 1;
            continue;
        };
        out.push_str(&text[last..whole.start()]);
        out.push_str(grapheme);
        last = whole.end();
        pos = last;
    }

    out.push_str(&text[last..]);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const CDN: &str = "https://cdn.example.com/emojis";

    #[test]
    fn test_shortcodes() {
        assert_eq!(
            expand("hi :wave: :tada:", &EmojiTable::new(), CDN),
            "hi 👋 🎉"
        );
    }

    #[test]
    fn test_unknown_shortcode_kept() {
        assert_eq!(
            expand(":not_an_emoji:", &EmojiTable::new(), CDN),
            ":not_an_emoji:"
        );
    }

    #[test]
    fn test_adjacent_shortcodes_after_miss() {
        assert_eq!(
            expand(":nope:smile:", &EmojiTable::new(), CDN),
            ":nope😄"
        );
    }

    #[test]
    fn test_extra_entries_override() {
        let table = EmojiTable::new().with_extra([("wave", "🌊"), ("blob", "🫠")]);
        assert_eq!(expand(":wave: :blob:", &table, CDN), "🌊 🫠");
    }

    #[test]
    fn test_custom_emoji() {
        assert_eq!(
            expand("&lt;:pog:123&gt; <a:spin:456>", &EmojiTable::new(), CDN),
            concat!(
                r#"<img class="emoji emoji--small" src="https://cdn.example.com/emojis/123.png"> "#,
                r#"<img class="emoji emoji--small" src="https://cdn.example.com/emojis/456.gif">"#,
            )
        );
    }

    #[test]
    fn test_cdn_trailing_slash() {
        assert_eq!(
            expand("<:x:1>", &EmojiTable::new(), "https://cdn.example.com/"),
            r#"<img class="emoji emoji--small" src="https://cdn.example.com/1.png">"#
        );
    }

    #[test]
    fn test_shortcode_inside_tag_ignored() {
        let text = r#"<span title=":wave:">x</span>"#;
        assert_eq!(expand(text, &EmojiTable::new(), CDN), text);
    }

    #[test]
    fn test_timestamp_attribute_untouched() {
        let text = r#"<span data-timestamp="2023-11-14T22:13:19+00:00">t</span>"#;
        assert_eq!(expand(text, &EmojiTable::new(), CDN), text);
    }
}
