//! Per-file id indexing: pick an indexer for the file, run it, and turn
//! whatever it returns into an [`IdHashMaskMap`].
//!
//! Failures are contained per file. A scanner error or panic becomes an
//! [`IndexingError::Mapping`] naming the indexer, except cancellation, which
//! always propagates as [`IndexingError::Cancelled`].

use crate::index::collector::OccurrenceCollector;
use crate::index::entry::IdIndexEntry;
use crate::index::error::IndexingError;
use crate::index::hash_mask::IdHashMaskMap;
use crate::index::types::{EAGER_SERIALIZATION_THRESHOLD, HashAlgorithm, IndexConfig, Language, OccurrenceMask};
use crate::scanner::{ScanError, SimpleWordsScanner, WordsScanner, occurrence_mask, scanner_for_language};
use crate::utils::RateLimitedWarnings;
use rustc_hash::FxHashMap;
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Shared flag for abandoning an indexing run between files
#[derive(Debug, Clone, Default)]
pub struct CancellationToken(Arc<AtomicBool>);

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// Text of one file selected for indexing
#[derive(Debug, Clone, Copy)]
pub struct FileContent<'a> {
    pub path: &'a Path,
    pub text: &'a str,
    pub language: Language,
}

impl<'a> FileContent<'a> {
    pub fn new(path: &'a Path, text: &'a str) -> Self {
        let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");
        Self {
            path,
            text,
            language: Language::from_extension(ext),
        }
    }
}

/// Settings every indexer needs, resolved once per run
#[derive(Debug, Clone)]
pub struct IndexingContext {
    pub algorithm: HashAlgorithm,
    pub eager_threshold: usize,
    pub cancel: CancellationToken,
}

impl IndexingContext {
    pub fn new(algorithm: HashAlgorithm) -> Self {
        Self {
            algorithm,
            eager_threshold: EAGER_SERIALIZATION_THRESHOLD,
            cancel: CancellationToken::new(),
        }
    }

    pub fn from_config(config: &IndexConfig, cancel: CancellationToken) -> Self {
        Self {
            algorithm: config.hash_algorithm,
            eager_threshold: config.eager_serialization_threshold,
            cancel,
        }
    }

    /// Fresh collector for one file
    pub fn collector(&self) -> OccurrenceCollector {
        OccurrenceCollector::new(self.algorithm).with_eager_threshold(self.eager_threshold)
    }

    pub fn check_cancelled(&self) -> Result<(), ScanError> {
        if self.cancel.is_cancelled() {
            Err(ScanError::Cancelled)
        } else {
            Ok(())
        }
    }
}

/// What an indexer produced for one file
#[derive(Debug)]
pub enum IdMapping {
    Optimized(IdHashMaskMap),
    /// Generic mapping from indexers that do not build an [`IdHashMaskMap`]
    Plain(FxHashMap<IdIndexEntry, u8>),
}

/// Maps one file's content to identifier hashes and occurrence masks
pub trait IdIndexer: Send + Sync {
    fn name(&self) -> &'static str;

    fn map(&self, content: &FileContent<'_>, ctx: &IndexingContext) -> Result<IdMapping, ScanError>;
}

/// Indexer driving a [`WordsScanner`], masking each word by its kind
pub struct WordsScannerIdIndexer {
    scanner: Arc<dyn WordsScanner>,
}

impl WordsScannerIdIndexer {
    pub fn new(scanner: Arc<dyn WordsScanner>) -> Self {
        Self { scanner }
    }
}

impl IdIndexer for WordsScannerIdIndexer {
    fn name(&self) -> &'static str {
        self.scanner.name()
    }

    fn map(&self, content: &FileContent<'_>, ctx: &IndexingContext) -> Result<IdMapping, ScanError> {
        ctx.check_cancelled()?;
        let mut collector = ctx.collector();
        self.scanner.process_words(content.text, &mut |occurrence| {
            collector.add_occurrence(
                occurrence.text,
                occurrence.start,
                occurrence.end,
                occurrence_mask(occurrence.kind),
            );
            true
        })?;
        Ok(IdMapping::Optimized(collector.into_result()))
    }
}

/// Indexer for files without a language scanner: every word is plain text
#[derive(Debug, Default)]
pub struct PlainTextIdIndexer {
    scanner: SimpleWordsScanner,
}

impl IdIndexer for PlainTextIdIndexer {
    fn name(&self) -> &'static str {
        "plain-text"
    }

    fn map(&self, content: &FileContent<'_>, ctx: &IndexingContext) -> Result<IdMapping, ScanError> {
        ctx.check_cancelled()?;
        let mut collector = ctx.collector();
        let text = content.text;
        self.scanner.scan(text, 0, text.len(), |text, start, end| {
            collector.add_occurrence(text, start, end, OccurrenceMask::IN_PLAIN_TEXT);
            true
        });
        Ok(IdMapping::Optimized(collector.into_result()))
    }
}

/// Indexer lookup by language.
///
/// Registered indexers win; otherwise the default registry builds a lexer
/// indexer from [`scanner_for_language`], and everything else falls back to
/// the plain-text indexer.
pub struct IndexerRegistry {
    by_language: FxHashMap<Language, Arc<dyn IdIndexer>>,
    language_scanners: bool,
    fallback: Arc<dyn IdIndexer>,
}

impl IndexerRegistry {
    /// Registry with only the plain-text fallback
    pub fn empty() -> Self {
        Self {
            by_language: FxHashMap::default(),
            language_scanners: false,
            fallback: Arc::new(PlainTextIdIndexer::default()),
        }
    }

    /// Replace the indexer used for `language`
    pub fn register(&mut self, language: Language, indexer: Arc<dyn IdIndexer>) {
        self.by_language.insert(language, indexer);
    }

    pub fn indexer_for(&self, language: Language) -> Arc<dyn IdIndexer> {
        if let Some(indexer) = self.by_language.get(&language) {
            return Arc::clone(indexer);
        }
        if self.language_scanners {
            if let Some(scanner) = scanner_for_language(language) {
                return Arc::new(WordsScannerIdIndexer::new(Arc::new(scanner)));
            }
        }
        Arc::clone(&self.fallback)
    }
}

impl Default for IndexerRegistry {
    /// Lexer scanners for every language that has one
    fn default() -> Self {
        Self {
            language_scanners: true,
            ..Self::empty()
        }
    }
}

/// Runs the right indexer for each file and normalizes its output.
///
/// Shared by all worker threads; each call is independent.
pub struct FileIdMapper {
    registry: IndexerRegistry,
    ctx: IndexingContext,
    warnings: RateLimitedWarnings,
}

impl FileIdMapper {
    pub fn new(registry: IndexerRegistry, ctx: IndexingContext) -> Self {
        Self {
            registry,
            ctx,
            warnings: RateLimitedWarnings::tracing(),
        }
    }

    /// Mapper with the default language registry and a fresh cancellation token
    pub fn with_config(config: &IndexConfig) -> Self {
        Self::new(
            IndexerRegistry::default(),
            IndexingContext::from_config(config, CancellationToken::new()),
        )
    }

    pub fn with_warnings(mut self, warnings: RateLimitedWarnings) -> Self {
        self.warnings = warnings;
        self
    }

    pub fn context(&self) -> &IndexingContext {
        &self.ctx
    }

    /// Map one file's content to its id map
    pub fn map_file(&self, content: &FileContent<'_>) -> Result<IdHashMaskMap, IndexingError> {
        if self.ctx.cancel.is_cancelled() {
            return Err(IndexingError::Cancelled);
        }

        let indexer = self.registry.indexer_for(content.language);
        let outcome = panic::catch_unwind(AssertUnwindSafe(|| indexer.map(content, &self.ctx)));

        match outcome {
            Ok(Ok(mapping)) => Ok(self.normalize(indexer.name(), content.path, mapping)),
            Ok(Err(ScanError::Cancelled)) => Err(IndexingError::Cancelled),
            Ok(Err(source)) => Err(IndexingError::Mapping {
                indexer: indexer.name(),
                source,
            }),
            Err(payload) => Err(IndexingError::Mapping {
                indexer: indexer.name(),
                source: ScanError::Panicked(panic_message(payload.as_ref())),
            }),
        }
    }

    fn normalize(&self, indexer: &'static str, path: &Path, mapping: IdMapping) -> IdHashMaskMap {
        match mapping {
            IdMapping::Optimized(map) => map,
            IdMapping::Plain(plain) if plain.is_empty() => IdHashMaskMap::new(),
            IdMapping::Plain(plain) => {
                self.warnings.warn(|| {
                    format!(
                        "id indexer '{}' returned a generic map ({} entries) for {}; converting",
                        indexer,
                        plain.len(),
                        path.display()
                    )
                });
                let mut map = IdHashMaskMap::from_entries(plain);
                if map.len() < self.ctx.eager_threshold {
                    map.prime_serialization();
                }
                map
            }
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::entry::string_hash;
    use crate::utils::throttle::testing::RecordingSink;
    use std::path::PathBuf;
    use std::time::Duration;

    struct PlainMapIndexer {
        entries: Vec<(i32, u8)>,
    }

    impl IdIndexer for PlainMapIndexer {
        fn name(&self) -> &'static str {
            "plain-map"
        }

        fn map(&self, _: &FileContent<'_>, _: &IndexingContext) -> Result<IdMapping, ScanError> {
            let mut plain = FxHashMap::default();
            for &(hash, mask) in &self.entries {
                *plain.entry(IdIndexEntry::new(hash)).or_insert(0) |= mask;
            }
            Ok(IdMapping::Plain(plain))
        }
    }

    struct FailingIndexer(ScanError);

    impl IdIndexer for FailingIndexer {
        fn name(&self) -> &'static str {
            "failing"
        }

        fn map(&self, _: &FileContent<'_>, _: &IndexingContext) -> Result<IdMapping, ScanError> {
            Err(self.0.clone())
        }
    }

    struct PanickingIndexer;

    impl IdIndexer for PanickingIndexer {
        fn name(&self) -> &'static str {
            "panicking"
        }

        fn map(&self, _: &FileContent<'_>, _: &IndexingContext) -> Result<IdMapping, ScanError> {
            panic!("tokenizer exploded")
        }
    }

    fn mapper_with(language: Language, indexer: Arc<dyn IdIndexer>) -> (FileIdMapper, Arc<RecordingSink>) {
        let mut registry = IndexerRegistry::empty();
        registry.register(language, indexer);
        let sink = Arc::new(RecordingSink::default());
        let mapper = FileIdMapper::new(registry, IndexingContext::new(HashAlgorithm::Stronger))
            .with_warnings(RateLimitedWarnings::new(sink.clone(), Duration::from_secs(3600)));
        (mapper, sink)
    }

    #[test]
    fn test_default_registry_follows_scanner_table() {
        let registry = IndexerRegistry::default();
        for ext in ["rs", "py", "html", "json", "sql", "zig", "ex", "md", "txt"] {
            let language = Language::from_extension(ext);
            let expected = scanner_for_language(language).map_or("plain-text", |s| s.name());
            assert_eq!(registry.indexer_for(language).name(), expected, "extension {}", ext);
        }
        assert_eq!(IndexerRegistry::empty().indexer_for(Language::Rust).name(), "plain-text");
    }

    #[test]
    fn test_plain_text_fallback_uses_plain_mask() {
        let mapper = FileIdMapper::new(IndexerRegistry::default(), IndexingContext::new(HashAlgorithm::Stronger));
        let path = PathBuf::from("notes.txt");
        let map = mapper.map_file(&FileContent::new(&path, "hello world")).unwrap();
        assert_eq!(map.get_mask(string_hash("hello")), Some(OccurrenceMask::IN_PLAIN_TEXT));
    }

    #[test]
    fn test_language_scanner_masks_by_kind() {
        let mapper = FileIdMapper::new(IndexerRegistry::default(), IndexingContext::new(HashAlgorithm::Stronger));
        let path = PathBuf::from("Foo.java");
        let text = "class Foo { void m() { String x = \"qwerty\"; qwerty(); } }";
        let map = mapper.map_file(&FileContent::new(&path, text)).unwrap();

        assert_eq!(
            map.get(&IdIndexEntry::from_word("qwerty", false, HashAlgorithm::Stronger)),
            Some(OccurrenceMask::IN_STRINGS | OccurrenceMask::IN_CODE)
        );
        assert!(map.contains_key(&IdIndexEntry::from_word("Foo", false, HashAlgorithm::Stronger)));
    }

    #[test]
    fn test_plain_mapping_is_rewrapped_with_one_warning() {
        let indexer = Arc::new(PlainMapIndexer {
            entries: vec![(1, 1), (0, 2), (1, 4)],
        });
        let (mapper, sink) = mapper_with(Language::Rust, indexer);
        let path = PathBuf::from("a.rs");

        let map = mapper.map_file(&FileContent::new(&path, "")).unwrap();
        assert_eq!(map.len(), 2);
        assert_eq!(map.get_mask(1), Some(5));
        assert_eq!(map.get_mask(0), Some(2));
        assert!(map.is_serialization_primed());

        mapper.map_file(&FileContent::new(&path, "")).unwrap();
        assert_eq!(sink.count(), 1);
    }

    #[test]
    fn test_empty_plain_mapping_is_silent() {
        let (mapper, sink) = mapper_with(Language::Rust, Arc::new(PlainMapIndexer { entries: vec![] }));
        let path = PathBuf::from("a.rs");
        let map = mapper.map_file(&FileContent::new(&path, "")).unwrap();
        assert!(map.is_empty());
        assert_eq!(sink.count(), 0);
    }

    #[test]
    fn test_scanner_error_names_indexer() {
        let indexer = Arc::new(FailingIndexer(ScanError::Failed("bad input".to_string())));
        let (mapper, _) = mapper_with(Language::Go, indexer);
        let path = PathBuf::from("main.go");

        match mapper.map_file(&FileContent::new(&path, "package main")) {
            Err(IndexingError::Mapping { indexer, source }) => {
                assert_eq!(indexer, "failing");
                assert_eq!(source, ScanError::Failed("bad input".to_string()));
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_cancellation_propagates() {
        let (mapper, _) = mapper_with(Language::Go, Arc::new(FailingIndexer(ScanError::Cancelled)));
        let path = PathBuf::from("main.go");
        let err = mapper.map_file(&FileContent::new(&path, "")).unwrap_err();
        assert!(err.is_cancelled());
    }

    #[test]
    fn test_cancel_token_checked_before_scan() {
        let ctx = IndexingContext::new(HashAlgorithm::Stronger);
        ctx.cancel.cancel();
        let mapper = FileIdMapper::new(IndexerRegistry::default(), ctx);
        let path = PathBuf::from("a.txt");
        assert!(mapper.map_file(&FileContent::new(&path, "x")).unwrap_err().is_cancelled());
    }

    #[test]
    fn test_panic_is_contained() {
        let (mapper, _) = mapper_with(Language::Python, Arc::new(PanickingIndexer));
        let path = PathBuf::from("x.py");
        match mapper.map_file(&FileContent::new(&path, "")) {
            Err(IndexingError::Mapping { indexer, source: ScanError::Panicked(msg) }) => {
                assert_eq!(indexer, "panicking");
                assert!(msg.contains("tokenizer exploded"));
            }
            other => panic!("unexpected {:?}", other),
        }
    }
}
