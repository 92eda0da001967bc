//! Render modes.

/// Processing applied to one template value.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum RenderMode {
    /// Value is inserted unchanged.
    None,
    /// Mentions are resolved, no markdown step runs.
    MentionsOnly,
    /// Full message body: inline and block styling, lists, quotes.
    #[default]
    PlainMarkdown,
    /// Like [`PlainMarkdown`](Self::PlainMarkdown), with raw `> ` quote
    /// markers merged before generic markdown.
    Embed,
    /// Inline styling only, for short field-name-like text.
    SpecialEmbed,
    /// Single-line preview of a replied-to message.
    Reference,
    /// Emoji expansion only.
    EmojiOnly,
}

/// How code spans and blocks are rendered in place of the protected content.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CodeStyle {
    /// Fenced blocks become block-level elements.
    Block,
    /// Every code span, fenced or not, renders inline.
    Inline,
}

impl RenderMode {
    /// Whether mentions are resolved for this mode.
    #[must_use]
    pub fn resolves_mentions(self) -> bool {
        self != Self::None
    }

    /// Whether this mode's flow extracts code before other passes.
    #[must_use]
    pub fn protects_code(self) -> bool {
        matches!(
            self,
            Self::PlainMarkdown | Self::Embed | Self::SpecialEmbed | Self::Reference
        )
    }

    /// Code rendering used when this mode protects code.
    #[must_use]
    pub fn code_style(self) -> CodeStyle {
        match self {
            Self::Reference => CodeStyle::Inline,
            _ => CodeStyle::Block,
        }
    }
}
