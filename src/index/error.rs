//! Error types for the identifier index.

use crate::scanner::ScanError;
use thiserror::Error;

/// Failure decoding a serialized id map
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CodecError {
    /// The entry count prefix is missing or malformed.
    #[error("id map header is truncated or malformed")]
    BadHeader,

    /// Fewer bytes than the declared entry count requires.
    #[error("id map truncated: {entries} entries need {needed} bytes, {available} available")]
    Truncated {
        entries: u32,
        needed: usize,
        available: usize,
    },
}

/// Failure mapping one file's content to an id map
#[derive(Debug, Error)]
pub enum IndexingError {
    /// Indexing was cancelled. Never reported as a per-file failure.
    #[error("indexing cancelled")]
    Cancelled,

    /// The indexer for this file failed; other files are unaffected.
    #[error("id indexer '{indexer}' failed: {source}")]
    Mapping {
        indexer: &'static str,
        #[source]
        source: ScanError,
    },
}

impl IndexingError {
    pub fn is_cancelled(&self) -> bool {
        matches!(self, IndexingError::Cancelled)
    }
}

/// Failure opening a persisted index
#[derive(Debug, Error)]
pub enum IndexError {
    /// The index was written with a different layout or hash algorithm.
    #[error(
        "index version {found_version}/{found_hash} does not match {expected_version}/{expected_hash}; rebuild with --force"
    )]
    VersionMismatch {
        found_version: u32,
        found_hash: String,
        expected_version: u32,
        expected_hash: String,
    },

    /// A stored document record could not be decoded.
    #[error("corrupt id map for document {doc_id}: {source}")]
    Corrupt {
        doc_id: u32,
        #[source]
        source: CodecError,
    },
}
