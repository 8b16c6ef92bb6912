use crate::index::reader::IdIndexReader;
use crate::index::types::OccurrenceMask;
use crate::utils::{find_codebase_root, get_index_dir};
use anyhow::Result;
use std::path::Path;

/// Display index statistics for the index built under `root_path`, whatever its hash algorithm
pub fn show_stats(root_path: &Path) -> Result<()> {
    let root = find_codebase_root(root_path)?;
    let reader = IdIndexReader::open_for_root(&root, None)?;
    let index_path = get_index_dir(&root)?;
    let meta = &reader.meta;

    println!("Index Statistics");
    println!("================");
    println!();
    println!("Root path:        {}", reader.root_path().display());
    println!("Index location:   {}", index_path.display());
    println!("Index version:    {}", meta.version);
    println!("Hash algorithm:   {} (v{})", meta.hash_algorithm, meta.hash_version);
    println!("Document count:   {}", meta.doc_count);
    println!("Failed files:     {}", meta.failed_count);
    println!("Id entries:       {}", meta.entry_count);
    println!("Distinct hashes:  {}", reader.distinct_hashes());

    println!();
    println!("Entries by context:");
    for (bit, count) in reader.context_histogram() {
        println!("  {:15} {}", OccurrenceMask(bit).to_string(), count);
    }

    if let Ok(size) = dir_size(&index_path) {
        println!();
        println!("Index size:       {}", format_size(size));
    }

    println!();
    println!("Created:          {}", format_timestamp(meta.created_at));

    Ok(())
}

fn dir_size(path: &Path) -> std::io::Result<u64> {
    let mut size = 0;
    for entry in std::fs::read_dir(path)? {
        let entry = entry?;
        let metadata = entry.metadata()?;
        if metadata.is_file() {
            size += metadata.len();
        } else if metadata.is_dir() {
            size += dir_size(&entry.path())?;
        }
    }
    Ok(size)
}

/// Format byte size to human readable
fn format_size(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;

    if bytes >= MB {
        format!("{:.2} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.2} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} bytes", bytes)
    }
}

fn format_timestamp(ts: u64) -> String {
    use std::time::{Duration, UNIX_EPOCH};
    format!("{:?}", UNIX_EPOCH + Duration::from_secs(ts))
}
