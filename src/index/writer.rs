use crate::index::hash_mask::IdHashMaskMap;
use crate::index::types::*;
use crate::utils::{write_u32_le, write_u64_le};
use anyhow::{Context, Result};
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::debug;

pub const META_FILE: &str = "meta.json";
pub const IDS_FILE: &str = "ids.bin";
pub const DOCS_FILE: &str = "docs.bin";
pub const PATHS_FILE: &str = "paths.bin";

/// Location of one document's id map inside ids.bin
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DocRecord {
    pub offset: u64,
    pub len: u32,
}

impl DocRecord {
    /// Size of a record in docs.bin
    pub const SIZE: usize = 8 + 4;
}

/// Single writer for an id index.
///
/// Workers hand over finished maps; the writer appends their serialized form
/// (already cached for small maps) to ids.bin. meta.json is written last, so
/// an interrupted build leaves no readable index behind.
pub struct IdIndexWriter {
    index_path: PathBuf,
    meta: IndexMeta,
    ids: BufWriter<File>,
    offset: u64,
    documents: Vec<DocRecord>,
    paths: Vec<PathBuf>,
}

impl IdIndexWriter {
    /// Start a fresh index in `index_path`, replacing any previous one
    pub fn create(index_path: &Path, root_path: &Path, hash_algorithm: HashAlgorithm) -> Result<Self> {
        fs::create_dir_all(index_path)
            .with_context(|| format!("Failed to create index dir {}", index_path.display()))?;

        let meta_path = index_path.join(META_FILE);
        if meta_path.exists() {
            fs::remove_file(&meta_path).context("Failed to remove stale meta.json")?;
        }

        let ids = BufWriter::new(File::create(index_path.join(IDS_FILE))?);

        Ok(Self {
            index_path: index_path.to_path_buf(),
            meta: IndexMeta::new(root_path.to_path_buf(), hash_algorithm),
            ids,
            offset: 0,
            documents: Vec::new(),
            paths: Vec::new(),
        })
    }

    /// Append one file's id map
    pub fn add_document(&mut self, rel_path: &Path, map: &IdHashMaskMap) -> Result<DocId> {
        let bytes = map.serialized_bytes();
        self.ids.write_all(&bytes)?;

        let doc_id = self.documents.len() as DocId;
        self.documents.push(DocRecord {
            offset: self.offset,
            len: bytes.len() as u32,
        });
        self.paths.push(rel_path.to_path_buf());
        self.offset += bytes.len() as u64;
        self.meta.entry_count += map.len() as u64;

        Ok(doc_id)
    }

    /// Count a file that could not be indexed
    pub fn record_failure(&mut self) {
        self.meta.failed_count += 1;
    }

    pub fn doc_count(&self) -> usize {
        self.documents.len()
    }

    /// Flush everything and write meta.json
    pub fn finish(mut self) -> Result<IndexMeta> {
        self.ids.flush()?;
        self.write_documents()?;
        self.write_paths()?;

        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0);
        self.meta.doc_count = self.documents.len() as u32;
        self.meta.created_at = now;
        self.meta.updated_at = now;

        let meta_path = self.index_path.join(META_FILE);
        let file = File::create(&meta_path)?;
        serde_json::to_writer_pretty(file, &self.meta)?;

        debug!(
            docs = self.meta.doc_count,
            entries = self.meta.entry_count,
            bytes = self.offset,
            "id index written"
        );

        Ok(self.meta)
    }

    fn write_documents(&self) -> Result<()> {
        let mut file = BufWriter::new(File::create(self.index_path.join(DOCS_FILE))?);

        write_u32_le(&mut file, self.documents.len() as u32)?;
        for doc in &self.documents {
            write_u64_le(&mut file, doc.offset)?;
            write_u32_le(&mut file, doc.len)?;
        }

        file.flush()?;
        Ok(())
    }

    fn write_paths(&self) -> Result<()> {
        let mut file = BufWriter::new(File::create(self.index_path.join(PATHS_FILE))?);

        // Simple format: count, then [length, bytes]...
        write_u32_le(&mut file, self.paths.len() as u32)?;
        for path in &self.paths {
            let path_str = path.to_string_lossy();
            let bytes = path_str.as_bytes();
            write_u32_le(&mut file, bytes.len() as u32)?;
            file.write_all(bytes)?;
        }

        file.flush()?;
        Ok(())
    }
}
