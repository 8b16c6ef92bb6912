//! Identifier hashing and the index key type.
//!
//! No identifier text is stored in the index, only a 32-bit hash of it.
//! Two identifiers with the same hash are indistinguishable, so lookups can
//! return false positives that callers re-check against the file content.

use crate::index::types::HashAlgorithm;
use std::fmt;

/// Key of the identifier index: one 32-bit identifier hash.
///
/// Equality and hashing are defined by the wrapped integer alone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct IdIndexEntry(i32);

impl IdIndexEntry {
    /// Wrap a precomputed hash
    #[inline]
    pub const fn new(hash: i32) -> Self {
        Self(hash)
    }

    /// Hash `word` with `algorithm`, folding case unless `case_sensitive`
    pub fn from_word(word: &str, case_sensitive: bool, algorithm: HashAlgorithm) -> Self {
        let hashes = WordHashes::compute(word, algorithm).unwrap_or_default();
        if case_sensitive {
            Self(hashes.sensitive)
        } else {
            Self(hashes.insensitive)
        }
    }

    #[inline]
    pub const fn hash(&self) -> i32 {
        self.0
    }
}

impl From<i32> for IdIndexEntry {
    fn from(hash: i32) -> Self {
        Self(hash)
    }
}

impl fmt::Display for IdIndexEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:08x}", self.0)
    }
}

/// Case-sensitive and case-insensitive hash of one word
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct WordHashes {
    pub sensitive: i32,
    pub insensitive: i32,
}

impl WordHashes {
    /// Hash a word both ways in a single pass. Returns `None` for an empty word.
    #[inline]
    pub fn compute(word: &str, algorithm: HashAlgorithm) -> Option<Self> {
        match algorithm {
            HashAlgorithm::Stronger => stronger_hashes(word),
            HashAlgorithm::Compact => compact_hashes(word),
        }
    }

    /// Both hashes coincide, so one index entry serves both kinds of lookup
    #[inline]
    pub fn is_case_invariant(&self) -> bool {
        self.sensitive == self.insensitive
    }
}

/// Lower-case a single character using the simple (one to one) mapping.
///
/// The only full lower-case mapping longer than one character is U+0130,
/// which becomes `i` plus a combining dot; its simple mapping is the leading `i`.
#[inline]
pub fn fold_char(c: char) -> char {
    if c.is_ascii() {
        return c.to_ascii_lowercase();
    }
    c.to_lowercase().next().unwrap_or(c)
}

/// Polynomial string hash with multiplier 31
pub fn string_hash(word: &str) -> i32 {
    word.chars()
        .fold(0i32, |h, c| h.wrapping_mul(31).wrapping_add(c as i32))
}

/// [`string_hash`] over the case-folded characters
pub fn string_hash_insensitive(word: &str) -> i32 {
    word.chars()
        .fold(0i32, |h, c| h.wrapping_mul(31).wrapping_add(fold_char(c) as i32))
}

/// `(first << 8) + (last << 4) + length`.
///
/// Only the first and last character and the length take part; interior
/// characters are ignored. Kept exactly as is since persisted hashes depend on it.
#[inline]
pub fn compact_hash(first: char, last: char, len: usize) -> i32 {
    ((first as i32) << 8)
        .wrapping_add((last as i32) << 4)
        .wrapping_add(len as i32)
}

fn stronger_hashes(word: &str) -> Option<WordHashes> {
    if word.is_empty() {
        return None;
    }

    let mut hash = 0i32;
    // Stays `None` while the prefix folds to itself; both hashes are equal until then.
    let mut hash_no_case: Option<i32> = None;

    for c in word.chars() {
        let lower = fold_char(c);
        if hash_no_case.is_some() || lower != c {
            let base = hash_no_case.unwrap_or(hash);
            hash_no_case = Some(base.wrapping_mul(31).wrapping_add(lower as i32));
        }
        hash = hash.wrapping_mul(31).wrapping_add(c as i32);
    }

    Some(WordHashes {
        sensitive: hash,
        insensitive: hash_no_case.unwrap_or(hash),
    })
}

fn compact_hashes(word: &str) -> Option<WordHashes> {
    let mut chars = word.chars();
    let first = chars.next()?;
    let last = chars.next_back().unwrap_or(first);
    let len = word.chars().count();

    let sensitive = compact_hash(first, last, len);
    let first_lower = fold_char(first);
    let last_lower = fold_char(last);
    let insensitive = if first_lower != first || last_lower != last {
        compact_hash(first_lower, last_lower, len)
    } else {
        sensitive
    };

    Some(WordHashes {
        sensitive,
        insensitive,
    })
}
