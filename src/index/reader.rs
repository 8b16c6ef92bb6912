use crate::index::codec::{ENTRY_SIZE, decode_id_map, for_each_encoded};
use crate::index::entry::IdIndexEntry;
use crate::index::error::{CodecError, IndexError};
use crate::index::hash_mask::IdHashMaskMap;
use crate::index::types::*;
use crate::index::writer::{DOCS_FILE, DocRecord, IDS_FILE, META_FILE, PATHS_FILE};
use crate::utils::{decode_varint, get_index_dir, read_u32_le_at, read_u64_le_at};
use anyhow::{Context, Result};
use memmap2::Mmap;
use rustc_hash::FxHashMap;
use std::fs::{self, File};
use std::path::{Path, PathBuf};

/// Read side of an id index: hash -> documents with the stored masks
pub struct IdIndexReader {
    index_path: PathBuf,
    pub meta: IndexMeta,
    paths: Vec<PathBuf>,
    documents: Vec<DocRecord>,
    ids: Option<Mmap>,
    postings: FxHashMap<i32, Vec<Posting>>,
}

impl std::fmt::Debug for IdIndexReader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IdIndexReader")
            .field("index_path", &self.index_path)
            .field("meta", &self.meta)
            .field("distinct_hashes", &self.postings.len())
            .finish_non_exhaustive()
    }
}

/// A document whose id map matched a lookup
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    pub doc_id: DocId,
    pub path: PathBuf,
    pub mask: OccurrenceMask,
}

impl IdIndexReader {
    /// Open the index of a codebase root from the app data directory.
    ///
    /// With `hash_algorithm` set to `None` the index is read with the algorithm
    /// recorded in its meta.json; `Some` insists on that algorithm.
    pub fn open_for_root(root_path: &Path, hash_algorithm: Option<HashAlgorithm>) -> Result<Self> {
        let index_path = get_index_dir(root_path)?;
        if !index_path.join(META_FILE).exists() {
            anyhow::bail!("No index found. Run 'idx index' first.");
        }
        match hash_algorithm {
            Some(algorithm) => Self::open(&index_path, algorithm),
            None => Self::open_recorded(&index_path),
        }
    }

    /// Open an index directory written with `hash_algorithm`
    pub fn open(index_path: &Path, hash_algorithm: HashAlgorithm) -> Result<Self> {
        Self::open_with(index_path, Some(hash_algorithm))
    }

    /// Open an index directory with whichever hash algorithm built it
    pub fn open_recorded(index_path: &Path) -> Result<Self> {
        Self::open_with(index_path, None)
    }

    fn open_with(index_path: &Path, requested: Option<HashAlgorithm>) -> Result<Self> {
        let meta_file = File::open(index_path.join(META_FILE)).context("Failed to open meta.json")?;
        let meta: IndexMeta = serde_json::from_reader(meta_file).context("Failed to parse meta.json")?;

        let hash_algorithm = requested.unwrap_or(meta.hash_algorithm);
        if !meta.is_compatible(hash_algorithm) {
            return Err(IndexError::VersionMismatch {
                found_version: meta.version,
                found_hash: meta.hash_algorithm.to_string(),
                expected_version: BASE_VERSION,
                expected_hash: hash_algorithm.to_string(),
            }
            .into());
        }

        let paths = read_paths(index_path)?;
        let documents = read_documents(index_path)?;
        anyhow::ensure!(
            paths.len() == documents.len(),
            "paths.bin and docs.bin disagree ({} vs {} entries)",
            paths.len(),
            documents.len()
        );

        let ids_file = File::open(index_path.join(IDS_FILE)).context("Failed to open ids.bin")?;
        let ids = if ids_file.metadata()?.len() > 0 {
            // SAFETY: the index directory is only written by IdIndexWriter, never while open
            Some(unsafe { Mmap::map(&ids_file)? })
        } else {
            None
        };

        let postings = build_postings(ids.as_deref().unwrap_or(&[]), &documents)?;

        Ok(Self {
            index_path: index_path.to_path_buf(),
            meta,
            paths,
            documents,
            ids,
            postings,
        })
    }

    pub fn index_path(&self) -> &Path {
        &self.index_path
    }

    pub fn root_path(&self) -> &Path {
        &self.meta.root_path
    }

    pub fn doc_count(&self) -> usize {
        self.documents.len()
    }

    /// Distinct hashes across all documents
    pub fn distinct_hashes(&self) -> usize {
        self.postings.len()
    }

    pub fn path(&self, doc_id: DocId) -> Option<&Path> {
        self.paths.get(doc_id as usize).map(PathBuf::as_path)
    }

    /// Documents containing `entry`, in doc id order
    pub fn postings(&self, entry: IdIndexEntry) -> &[Posting] {
        self.postings
            .get(&entry.hash())
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Documents whose map has `word` in any of the `context` bits.
    ///
    /// Results may include hash collisions; see [`crate::index::search`] for
    /// verification against file content.
    pub fn files_with_word(&self, word: &str, context: u8, case_sensitive: bool) -> Vec<Candidate> {
        let entry = IdIndexEntry::from_word(word, case_sensitive, self.meta.hash_algorithm);
        self.postings(entry)
            .iter()
            .filter(|p| p.mask & context != 0)
            .filter_map(|p| {
                Some(Candidate {
                    doc_id: p.doc_id,
                    path: self.path(p.doc_id)?.to_path_buf(),
                    mask: OccurrenceMask(p.mask),
                })
            })
            .collect()
    }

    /// Decode one document's full id map
    pub fn document_map(&self, doc_id: DocId) -> Result<IdHashMaskMap> {
        let record = self
            .documents
            .get(doc_id as usize)
            .with_context(|| format!("No document {}", doc_id))?;
        let bytes = record_bytes(self.ids.as_deref().unwrap_or(&[]), record)
            .ok_or(IndexError::Corrupt {
                doc_id,
                source: CodecError::BadHeader,
            })?;
        let (map, _) = decode_id_map(bytes).map_err(|source| IndexError::Corrupt { doc_id, source })?;
        Ok(map)
    }

    /// Number of documents per stored mask bit
    pub fn context_histogram(&self) -> Vec<(u8, usize)> {
        let bits = [
            OccurrenceMask::IN_CODE,
            OccurrenceMask::IN_COMMENTS,
            OccurrenceMask::IN_STRINGS,
            OccurrenceMask::IN_FOREIGN_LANGUAGES,
            OccurrenceMask::IN_PLAIN_TEXT,
        ];
        let mut counts = [0usize; 5];
        for postings in self.postings.values() {
            for posting in postings {
                for (i, bit) in bits.iter().enumerate() {
                    if posting.mask & bit != 0 {
                        counts[i] += 1;
                    }
                }
            }
        }
        bits.into_iter().zip(counts).collect()
    }
}

fn record_bytes<'a>(ids: &'a [u8], record: &DocRecord) -> Option<&'a [u8]> {
    let start = usize::try_from(record.offset).ok()?;
    ids.get(start..start.checked_add(record.len as usize)?)
}

/// Invert the per-document maps into hash -> postings
fn build_postings(ids: &[u8], documents: &[DocRecord]) -> Result<FxHashMap<i32, Vec<Posting>>> {
    let mut postings: FxHashMap<i32, Vec<Posting>> = FxHashMap::default();

    for (doc_id, record) in documents.iter().enumerate() {
        let doc_id = doc_id as DocId;
        let corrupt = |source| IndexError::Corrupt { doc_id, source };

        let bytes = record_bytes(ids, record).ok_or_else(|| corrupt(CodecError::BadHeader))?;
        let (count, header) = decode_varint(bytes).ok_or_else(|| corrupt(CodecError::BadHeader))?;
        let needed = header + count as usize * ENTRY_SIZE;
        if bytes.len() != needed {
            return Err(corrupt(CodecError::Truncated {
                entries: count,
                needed,
                available: bytes.len(),
            })
            .into());
        }

        for_each_encoded(&bytes[header..], |hash, mask| {
            postings.entry(hash).or_default().push(Posting { doc_id, mask });
            true
        });
    }

    Ok(postings)
}

fn read_documents(index_path: &Path) -> Result<Vec<DocRecord>> {
    let data = fs::read(index_path.join(DOCS_FILE)).context("Failed to read docs.bin")?;
    let count = read_u32_le_at(&data, 0).context("docs.bin is truncated")? as usize;

    // The header is untrusted; never reserve more than the file can hold
    let mut documents = Vec::with_capacity(count.min(data.len().saturating_sub(4) / DocRecord::SIZE));
    for i in 0..count {
        let pos = 4 + i * DocRecord::SIZE;
        let offset = read_u64_le_at(&data, pos).context("docs.bin is truncated")?;
        let len = read_u32_le_at(&data, pos + 8).context("docs.bin is truncated")?;
        documents.push(DocRecord { offset, len });
    }

    Ok(documents)
}

fn read_paths(index_path: &Path) -> Result<Vec<PathBuf>> {
    let data = fs::read(index_path.join(PATHS_FILE)).context("Failed to read paths.bin")?;
    let count = read_u32_le_at(&data, 0).context("paths.bin is truncated")? as usize;

    let mut paths = Vec::with_capacity(count.min(data.len().saturating_sub(4) / 4));
    let mut pos = 4;
    for _ in 0..count {
        let len = read_u32_le_at(&data, pos).context("paths.bin is truncated")? as usize;
        pos += 4;
        let bytes = pos
            .checked_add(len)
            .and_then(|end| data.get(pos..end))
            .context("paths.bin is truncated")?;
        paths.push(PathBuf::from(String::from_utf8_lossy(bytes).as_ref()));
        pos += len;
    }

    Ok(paths)
}
