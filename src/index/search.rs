//! Word lookup with collision filtering.
//!
//! The index only knows hashes, so a lookup returns every file whose map has
//! the word's hash. Verification re-scans those candidates and keeps files
//! that really contain the word.

use crate::index::entry::fold_char;
use crate::index::reader::{Candidate, IdIndexReader};
use crate::scanner::SimpleWordsScanner;
use crate::utils::decode_text;
use rayon::prelude::*;
use std::fs;
use std::path::Path;
use tracing::debug;

/// Options for [`find_word`]
#[derive(Debug, Clone, Copy)]
pub struct WordQuery<'a> {
    pub word: &'a str,
    /// Mask bits the occurrence must have at least one of
    pub context: u8,
    pub case_sensitive: bool,
    /// Re-scan candidate files to drop hash collisions
    pub verify: bool,
}

/// Files that contain `query.word` in one of the requested contexts
pub fn find_word(reader: &IdIndexReader, root: &Path, query: &WordQuery<'_>) -> Vec<Candidate> {
    let candidates = reader.files_with_word(query.word, query.context, query.case_sensitive);
    if !query.verify {
        return candidates;
    }

    let total = candidates.len();
    let verified: Vec<Candidate> = candidates
        .into_par_iter()
        .filter(|candidate| {
            let Ok(bytes) = fs::read(root.join(&candidate.path)) else {
                // Deleted since indexing
                return false;
            };
            decode_text(&bytes)
                .is_some_and(|text| contains_word(text, query.word, query.case_sensitive))
        })
        .collect();

    debug!(
        word = query.word,
        candidates = total,
        verified = verified.len(),
        "verified word candidates"
    );
    verified
}

/// Whether `text` has `word` as a whole word.
///
/// Words are split the same way the index splits them, with and without
/// escape handling, so a word inside a string literal is found either way.
pub fn contains_word(text: &str, word: &str, case_sensitive: bool) -> bool {
    let matches = |(start, end): (usize, usize)| {
        let found = &text[start..end];
        if case_sensitive {
            found == word
        } else {
            found.chars().map(fold_char).eq(word.chars().map(fold_char))
        }
    };

    SimpleWordsScanner::new().spans(text, 0, text.len()).any(&matches)
        || SimpleWordsScanner::with_escapes().spans(text, 0, text.len()).any(&matches)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_contains_whole_words_only() {
        assert!(contains_word("let fooBar = 1;", "fooBar", true));
        assert!(!contains_word("let fooBar = 1;", "foo", true));
        assert!(!contains_word("let fooBar = 1;", "foobar", true));
        assert!(contains_word("let fooBar = 1;", "FOOBAR", false));
    }

    #[test]
    fn test_contains_escaped_word() {
        assert!(contains_word(r#"print("\nvalue")"#, "value", true));
    }
}
