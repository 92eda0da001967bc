//! Code block protection registry.
//!
//! Code content is pulled out of the markdown stream, stored here under an
//! opaque id, and written back once by [`CodeBlockRegistry::restore`] after the
//! whole document is assembled. Every later markdown pass only ever sees the id.
//!
//! Ids have the form `U+E000 "CODEBLOCK" <32 lowercase hex digits> U+E001`.
//! The delimiters are private-use code points that no markdown pass matches
//! and that ordinary chat text does not contain; an id is still checked for
//! uniqueness against the current text and every stored entry before use.

use std::collections::HashMap;
use std::fmt;
use std::sync::LazyLock;

use rand::RngExt;
use regex::{Captures, Regex};

const ID_OPEN: char = '\u{E000}';
const ID_CLOSE: char = '\u{E001}';

static ID_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\x{E000}CODEBLOCK[0-9a-f]{32}\x{E001}").unwrap());

/// A protected code span or block.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ProtectedBlock {
    /// Opaque id standing in for the content in the markdown stream.
    pub id: String,
    /// Content written back verbatim on restoration.
    pub raw_content: String,
}

type IdSource = Box<dyn FnMut() -> u128 + Send>;

/// Mapping of protection ids to raw code content for one render job.
pub struct CodeBlockRegistry {
    blocks: Vec<ProtectedBlock>,
    index: HashMap<String, usize>,
    id_source: IdSource,
}

impl fmt::Debug for CodeBlockRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CodeBlockRegistry")
            .field("blocks", &self.blocks)
            .finish_non_exhaustive()
    }
}

impl Default for CodeBlockRegistry {
    fn default() -> Self {
        Self::with_id_source(|| rand::rng().random::<u128>())
    }
}

impl CodeBlockRegistry {
    /// Create an empty registry drawing ids from the thread-local RNG.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty registry drawing id payloads from `source`.
    #[must_use]
    pub fn with_id_source(source: impl FnMut() -> u128 + Send + 'static) -> Self {
        Self {
            blocks: Vec::new(),
            index: HashMap::new(),
            id_source: Box::new(source),
        }
    }

    /// Store `raw_content` and return the id that stands in for it.
    ///
    /// `text` is the document being processed; the returned id occurs neither
    /// in it nor in any stored entry. Ids of earlier entries nested inside
    /// `raw_content` are expanded before storing, so a single restoration
    /// pass is complete.
    pub fn protect(&mut self, text: &str, raw_content: &str) -> String {
        let raw_content = self.expand(raw_content);
        let id = self.mint_id(text, &raw_content);
        self.index.insert(id.clone(), self.blocks.len());
        self.blocks.push(ProtectedBlock {
            id: id.clone(),
            raw_content,
        });
        id
    }

    fn mint_id(&mut self, text: &str, pending: &str) -> String {
        loop {
            let id = format!("{ID_OPEN}CODEBLOCK{:032x}{ID_CLOSE}", (self.id_source)());
            let taken = self.index.contains_key(&id)
                || text.contains(&id)
                || pending.contains(&id)
                || self.contains_text(&id);
            if !taken {
                return id;
            }
            tracing::trace!("protection id collision, regenerating");
        }
    }

    /// Replace every known id in `text` with its raw content.
    ///
    /// Unknown id-shaped strings are left as they are. Remaining `<br>`
    /// line-break markers become literal newlines.
    #[must_use]
    pub fn restore(&self, text: &str) -> String {
        self.expand(text).replace("<br>", "\n")
    }

    fn expand(&self, text: &str) -> String {
        if self.blocks.is_empty() || !text.contains(ID_OPEN) {
            return text.to_owned();
        }
        ID_RE
            .replace_all(text, |caps: &Captures<'_>| match self.index.get(&caps[0]) {
                Some(&i) => self.blocks[i].raw_content.clone(),
                None => caps[0].to_owned(),
            })
            .into_owned()
    }

    /// Whether any stored content contains `needle`.
    #[must_use]
    pub fn contains_text(&self, needle: &str) -> bool {
        self.blocks.iter().any(|b| b.raw_content.contains(needle))
    }

    /// Stored entries whose ids occur in `text`.
    pub fn blocks_in<'a>(
        &'a self,
        text: &'a str,
    ) -> impl Iterator<Item = &'a ProtectedBlock> + 'a {
        ID_RE.find_iter(text).filter_map(|m| self.get(m.as_str()))
    }

    /// Stored entry for `id`.
    #[must_use]
    pub fn get(&self, id: &str) -> Option<&ProtectedBlock> {
        self.index.get(id).map(|&i| &self.blocks[i])
    }

    /// Stored entries in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &ProtectedBlock> {
        self.blocks.iter()
    }

    /// Number of stored entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    /// Whether nothing is stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    /// Drop every stored entry.
    pub fn clear(&mut self) {
        self.blocks.clear();
        self.index.clear();
    }
}
