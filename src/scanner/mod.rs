//! Word scanners: split file text into identifier-like spans.
//!
//! - [`simple`] - default character-class scanner (no context information)
//! - [`lexer`] - comment/string aware scanner configured per language
//!
//! Every scanner reports [`WordOccurrence`]s through a callback; the
//! occurrence kind is turned into an index mask by [`occurrence_mask`].

pub mod lexer;
pub mod simple;

pub use lexer::{CommentSyntax, LexerWordsScanner, scanner_for_language};
pub use simple::{MAX_WORD_LENGTH, SimpleWordsScanner, WordSpans};

use crate::index::types::OccurrenceMask;
use thiserror::Error;

/// Coarse lexical context of one word occurrence
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OccurrenceKind {
    Code,
    Comments,
    Literals,
    /// Code of another language embedded in the file, e.g. `<script>` bodies in HTML
    ForeignLanguage,
}

/// Mask bit for an occurrence kind; unknown kinds match every context
#[inline]
pub fn occurrence_mask(kind: Option<OccurrenceKind>) -> u8 {
    match kind {
        Some(OccurrenceKind::Code) => OccurrenceMask::IN_CODE,
        Some(OccurrenceKind::Comments) => OccurrenceMask::IN_COMMENTS,
        Some(OccurrenceKind::Literals) => OccurrenceMask::IN_STRINGS,
        Some(OccurrenceKind::ForeignLanguage) => OccurrenceMask::IN_FOREIGN_LANGUAGES,
        None => OccurrenceMask::ANY,
    }
}

/// One word found by a scanner: `text[start..end]` (byte offsets)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WordOccurrence<'a> {
    pub text: &'a str,
    pub start: usize,
    pub end: usize,
    pub kind: Option<OccurrenceKind>,
}

impl<'a> WordOccurrence<'a> {
    pub fn word(&self) -> &'a str {
        &self.text[self.start..self.end]
    }
}

/// Failure raised by a scanner while processing one file
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ScanError {
    /// Scanning was cancelled; callers propagate this instead of reporting it.
    #[error("scan cancelled")]
    Cancelled,

    #[error("{0}")]
    Failed(String),

    #[error("scanner panicked: {0}")]
    Panicked(String),
}

/// Pluggable word scanner for one kind of source text.
///
/// Implementations are stateless between calls and shared across worker
/// threads. The consumer returns `false` to stop scanning early.
pub trait WordsScanner: Send + Sync {
    /// Name used in error reports and warnings
    fn name(&self) -> &'static str;

    fn process_words(
        &self,
        text: &str,
        consumer: &mut dyn FnMut(WordOccurrence<'_>) -> bool,
    ) -> Result<(), ScanError>;
}
