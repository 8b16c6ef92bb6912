use crate::index::error::IndexingError;
use crate::index::hash_mask::IdHashMaskMap;
use crate::index::indexer::{CancellationToken, FileContent, FileIdMapper, IndexerRegistry, IndexingContext};
use crate::index::types::{IndexConfig, IndexMeta};
use crate::index::writer::IdIndexWriter;
use crate::utils::progress::{file_progress, spinner};
use crate::utils::{decode_text, find_codebase_root, get_index_dir, remove_index};
use anyhow::{Context, Result};
use ignore::WalkBuilder;
use rayon::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::mpsc::{self, SyncSender};
use std::thread;
use tracing::{debug, info, warn};

/// Finished maps waiting for the writer
const WRITER_QUEUE_CAPACITY: usize = 1024;

/// A file selected for indexing
#[derive(Debug, Clone)]
pub struct SourceFile {
    pub full_path: PathBuf,
    pub rel_path: PathBuf,
}

/// Result of scanning one file, sent to the writer
enum FileOutcome {
    Indexed { rel_path: PathBuf, map: IdHashMaskMap },
    Failed,
}

/// Counts from one indexing run
#[derive(Debug, Clone)]
pub struct BuildSummary {
    pub meta: IndexMeta,
    pub index_path: PathBuf,
    /// Unreadable, binary, non-UTF-8 or oversized files
    pub skipped: usize,
}

/// Build or rebuild the id index for a codebase root
pub fn build_index(root_path: &Path, config: &IndexConfig, force: bool, silent: bool) -> Result<BuildSummary> {
    let root = root_path.canonicalize().context("Invalid path")?;
    let index_path = get_index_dir(&root)?;

    if force && index_path.exists() {
        remove_index(&root).context("Failed to remove existing index")?;
    }

    if !silent {
        println!("Indexing: {}", root.display());
    }

    let summary = build_index_at(&root, &index_path, config, &CancellationToken::new(), silent)?;

    if !silent {
        println!(
            "Indexed {} files ({} ids, hash: {})",
            summary.meta.doc_count, summary.meta.entry_count, summary.meta.hash_algorithm
        );
        if summary.meta.failed_count > 0 || summary.skipped > 0 {
            eprintln!(
                "({} files failed to index, {} skipped)",
                summary.meta.failed_count, summary.skipped
            );
        }
        println!("Index stored at: {}", summary.index_path.display());
    }

    Ok(summary)
}

/// Build index, detecting codebase root from `start_path`
pub fn build_index_auto(start_path: &Path, config: &IndexConfig, force: bool) -> Result<BuildSummary> {
    let root = find_codebase_root(start_path)?;
    println!("Detected codebase root: {}", root.display());
    build_index(&root, config, force, false)
}

/// Scan every file under `root` and write the index to `index_path`.
///
/// Files are scanned on the rayon pool (or the calling thread when
/// `config.parallel` is off). Each finished map goes through a bounded queue
/// to a single writer thread.
pub fn build_index_at(
    root: &Path,
    index_path: &Path,
    config: &IndexConfig,
    cancel: &CancellationToken,
    silent: bool,
) -> Result<BuildSummary> {
    let discover = spinner("Discovering files...", silent);
    let files = collect_files(root, config);
    if let Some(spinner) = discover {
        spinner.finish_with_message(format!("Found {} files", files.len()));
    }
    info!(root = %root.display(), files = files.len(), "indexing identifiers");

    let mapper = FileIdMapper::new(
        IndexerRegistry::default(),
        IndexingContext::from_config(config, cancel.clone()),
    );
    let writer = IdIndexWriter::create(index_path, root, config.hash_algorithm)?;
    let progress = file_progress(files.len(), silent);
    let skipped = AtomicUsize::new(0);

    let (tx, rx) = mpsc::sync_channel::<FileOutcome>(WRITER_QUEUE_CAPACITY);

    let writer = thread::scope(|scope| {
        let consumer = scope.spawn(move || -> Result<IdIndexWriter> {
            let mut writer = writer;
            for outcome in rx {
                match outcome {
                    FileOutcome::Indexed { rel_path, map } => {
                        writer.add_document(&rel_path, &map)?;
                    }
                    FileOutcome::Failed => writer.record_failure(),
                }
            }
            Ok(writer)
        });

        let produce = |tx: &mut SyncSender<FileOutcome>, file: &SourceFile| {
            if let Some(outcome) = index_file(&mapper, file, config.max_file_size, &skipped) {
                if tx.send(outcome).is_err() {
                    // Writer failed; stop scanning, its error is reported below
                    cancel.cancel();
                }
            }
            if let Some(pb) = &progress {
                pb.inc(1);
            }
        };

        if config.parallel {
            files.par_iter().for_each_with(tx, |tx, file| produce(tx, file));
        } else {
            let mut tx = tx;
            files.iter().for_each(|file| produce(&mut tx, file));
        }

        consumer
            .join()
            .unwrap_or_else(|_| Err(anyhow::anyhow!("index writer thread panicked")))
    })?;

    if cancel.is_cancelled() {
        anyhow::bail!("Indexing cancelled");
    }

    let finalize = spinner("Finalizing index...", silent);
    let meta = writer.finish()?;
    if let Some(spinner) = finalize {
        spinner.finish_with_message("Index complete");
    }
    if let Some(pb) = progress {
        pb.finish_with_message(format!("Processed {} files", meta.doc_count));
    }

    Ok(BuildSummary {
        meta,
        index_path: index_path.to_path_buf(),
        skipped: skipped.load(Ordering::Relaxed),
    })
}

/// Walk `root`, honouring .gitignore and the configured ignored directories
pub fn collect_files(root: &Path, config: &IndexConfig) -> Vec<SourceFile> {
    let ignored = config.ignored_paths.clone();
    let walker = WalkBuilder::new(root)
        .hidden(true)
        .git_ignore(true)
        .git_global(true)
        .git_exclude(true)
        .filter_entry(move |entry| {
            let name = entry.file_name().to_string_lossy();
            !ignored.iter().any(|ignored| ignored == name.as_ref())
        })
        .build();

    walker
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_some_and(|t| t.is_file()))
        .filter_map(|entry| {
            let full_path = entry.path().to_path_buf();
            let rel_path = full_path.strip_prefix(root).ok()?.to_path_buf();
            Some(SourceFile { full_path, rel_path })
        })
        .collect()
}

/// Read and map one file. `None` means the file was skipped or scanning was cancelled.
fn index_file(
    mapper: &FileIdMapper,
    file: &SourceFile,
    max_file_size: u64,
    skipped: &AtomicUsize,
) -> Option<FileOutcome> {
    let skip = || {
        skipped.fetch_add(1, Ordering::Relaxed);
        None
    };

    let bytes = match fs::read(&file.full_path) {
        Ok(bytes) => bytes,
        Err(e) => {
            debug!(path = %file.full_path.display(), error = %e, "unreadable file");
            return skip();
        }
    };
    if bytes.len() as u64 > max_file_size {
        return skip();
    }
    let Some(text) = decode_text(&bytes) else {
        return skip();
    };

    match mapper.map_file(&FileContent::new(&file.rel_path, text)) {
        Ok(map) => Some(FileOutcome::Indexed {
            rel_path: file.rel_path.clone(),
            map,
        }),
        Err(IndexingError::Cancelled) => None,
        Err(e) => {
            warn!(path = %file.rel_path.display(), error = %e, "file not indexed");
            Some(FileOutcome::Failed)
        }
    }
}
