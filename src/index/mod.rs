//! Identifier index: per-file hash -> occurrence mask maps and their storage.
//!
//! - [`entry`] - word hashing
//! - [`hash_mask`] - compact map from hash to mask
//! - [`collector`] - accumulates occurrences while a file is scanned
//! - [`indexer`] - per-language indexers and the file mapper
//! - [`build`], [`writer`], [`reader`], [`search`] - on-disk index

pub mod build;
pub mod codec;
pub mod collector;
pub mod entry;
pub mod error;
pub mod hash_mask;
pub mod indexer;
pub mod reader;
pub mod search;
pub mod stats;
pub mod types;
pub mod writer;

pub use collector::OccurrenceCollector;
pub use entry::{IdIndexEntry, WordHashes};
pub use error::{CodecError, IndexError, IndexingError};
pub use hash_mask::IdHashMaskMap;
pub use indexer::{CancellationToken, FileContent, FileIdMapper, IdIndexer, IdMapping, IndexerRegistry, IndexingContext};
pub use reader::IdIndexReader;
pub use types::*;
pub use writer::IdIndexWriter;
