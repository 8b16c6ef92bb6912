//! # idindex - identifier occurrence index
//!
//! For every indexed file, idindex records which identifier-like words occur
//! in it and in which contexts (code, comments, string literals, foreign
//! language fragments, plain text). Words are stored as 32-bit hashes mapped
//! to a one-byte occurrence mask, so a lookup narrows a codebase to the few
//! files worth opening.
//!
//! ## Architecture
//!
//! - [`scanner`] - Splits text into words and classifies the regions they come from
//! - [`index`] - Hashing, the hash -> mask map, per-file indexers and the on-disk index
//! - [`output`] - Terminal output for lookups
//! - [`utils`] - Config, encoding, binary detection, progress and rate-limited warnings
//!
//! ## Quick Start
//!
//! ```
//! use idindex::index::{FileContent, FileIdMapper, IdIndexEntry, IndexConfig, OccurrenceMask};
//! use std::path::Path;
//!
//! let config = IndexConfig::default();
//! let mapper = FileIdMapper::with_config(&config);
//! let map = mapper
//!     .map_file(&FileContent::new(Path::new("Main.java"), "class Main { /* qwerty */ }"))
//!     .unwrap();
//!
//! let entry = IdIndexEntry::from_word("qwerty", true, config.hash_algorithm);
//! assert_eq!(map.get(&entry), Some(OccurrenceMask::IN_COMMENTS));
//! ```

pub mod index;
pub mod output;
pub mod scanner;
pub mod utils;
