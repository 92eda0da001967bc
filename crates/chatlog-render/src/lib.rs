//! Rich-text rendering for archived chat messages.
//!
//! This crate turns HTML-escaped chat content into HTML fragments: it resolves
//! mentions through a [`Directory`], applies the chat markdown dialect and
//! fills `{{KEY}}` markers of document templates.
//!
//! # Architecture
//!
//! - [`MentionResolver`]: classifies mention tokens and renders them, with
//!   memoized, time-bounded directory lookups
//! - [`MarkdownTransformer`]: code protection and the per-[`RenderMode`]
//!   markdown flows
//! - [`TemplateValues`]: disjoint single-pass marker substitution
//! - [`RenderJob`]: one document render, owning all of the above
//!
//! Code is extracted into a per-job [`CodeBlockRegistry`] before any other
//! pass and written back once, by [`RenderJob::finish`], after the whole
//! document is assembled.
//!
//! # Example
//!
//! ```
//! use chatlog_render::{EmptyDirectory, RenderJob, Substitution};
//!
//! let rt = tokio::runtime::Builder::new_current_thread().build().unwrap();
//! let html = rt.block_on(async {
//!     RenderJob::new(EmptyDirectory, None)
//!         .fill_final(
//!             "<p>{{BODY}}</p>",
//!             &[Substitution::new("BODY", "**hi** `code`")],
//!         )
//!         .await
//! });
//!
//! assert_eq!(
//!     html.unwrap(),
//!     r#"<p><strong>hi</strong> <span class="pre pre-inline">code</span></p>"#
//! );
//! ```

mod directory;
mod error;
mod escape;
mod job;
mod markdown;
mod mention;
mod mode;
mod options;
mod registry;
mod template;

pub use directory::{Channel, Directory, EmptyDirectory, GuildContext, Member, Role};
pub use error::{DirectoryError, RenderError};
pub use escape::escape_html;
pub use job::RenderJob;
pub use markdown::{DEFAULT_EMOJI_CDN, EmojiTable, MarkdownTransformer};
pub use mention::{DEFAULT_LOOKUP_TIMEOUT, MentionResolver, MentionToken, TokenMatch, scan};
pub use mode::{CodeStyle, RenderMode};
pub use options::RenderOptions;
pub use registry::{CodeBlockRegistry, ProtectedBlock};
pub use template::{Substitution, TemplateValues};
