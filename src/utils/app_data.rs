use crate::index::types::{HashAlgorithm, IndexConfig};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::hash_map::DefaultHasher;
use std::fs;
use std::hash::{Hash, Hasher};
use std::path::{Path, PathBuf};

const APP_NAME: &str = "idindex";
const CONFIG_FILE: &str = "config.json";

/// Environment variable overriding the configured hash algorithm
pub const HASH_ALGORITHM_ENV: &str = "IDINDEX_HASH_ALGORITHM";

/// Application configuration stored in the app data directory
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Hash function for identifier keys; changing it invalidates existing indexes
    #[serde(default)]
    pub hash_algorithm: HashAlgorithm,

    /// Scan files on all cores
    #[serde(default = "default_parallel_indexing")]
    pub parallel_indexing: bool,

    /// Files larger than this are not indexed
    #[serde(default = "default_max_file_size")]
    pub max_file_size: u64,
}

fn default_parallel_indexing() -> bool {
    true
}

fn default_max_file_size() -> u64 {
    IndexConfig::default().max_file_size
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            hash_algorithm: HashAlgorithm::default(),
            parallel_indexing: default_parallel_indexing(),
            max_file_size: default_max_file_size(),
        }
    }
}

impl AppConfig {
    /// Load config from the app data directory, or return default if not found
    pub fn load() -> Result<Self> {
        let config_path = get_config_path()?;

        if config_path.exists() {
            let content = fs::read_to_string(&config_path)
                .context("Failed to read config file")?;
            let config: AppConfig = serde_json::from_str(&content)
                .context("Failed to parse config file")?;
            Ok(config)
        } else {
            Ok(Self::default())
        }
    }

    /// Apply `IDINDEX_HASH_ALGORITHM` if set
    pub fn with_env_overrides(mut self) -> Result<Self> {
        if let Ok(value) = std::env::var(HASH_ALGORITHM_ENV) {
            self.hash_algorithm = value
                .parse()
                .map_err(|e: String| anyhow::anyhow!(e))
                .with_context(|| format!("Invalid {}", HASH_ALGORITHM_ENV))?;
        }
        Ok(self)
    }

    /// Indexer settings derived from this config
    pub fn index_config(&self) -> IndexConfig {
        IndexConfig {
            max_file_size: self.max_file_size,
            hash_algorithm: self.hash_algorithm,
            parallel: self.parallel_indexing,
            ..IndexConfig::default()
        }
    }
}

/// Get the path to the config file
pub fn get_config_path() -> Result<PathBuf> {
    let app_dir = get_app_data_dir()?;
    Ok(app_dir.join(CONFIG_FILE))
}

/// Get the application data directory for storing indexes
pub fn get_app_data_dir() -> Result<PathBuf> {
    let base = if cfg!(target_os = "macos") {
        dirs::home_dir()
            .map(|h| h.join("Library").join("Application Support"))
    } else if cfg!(target_os = "windows") {
        dirs::data_local_dir()
    } else {
        // Linux/Unix: use XDG_DATA_HOME or ~/.local/share
        dirs::data_dir()
    };

    let base = base.context("Could not determine app data directory")?;
    let app_dir = base.join(APP_NAME);

    fs::create_dir_all(&app_dir)?;
    Ok(app_dir)
}

/// Get the index directory for a specific codebase root
pub fn get_index_dir(root_path: &Path) -> Result<PathBuf> {
    let indexes_dir = get_app_data_dir()?.join("indexes");
    fs::create_dir_all(&indexes_dir)?;
    Ok(indexes_dir.join(index_folder_name(root_path)))
}

/// Unique folder name for a root: sanitized dir name + path hash
fn index_folder_name(path: &Path) -> String {
    let canonical = path.canonicalize().unwrap_or_else(|_| path.to_path_buf());

    let dir_name = canonical
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("unknown");
    let sanitized: String = dir_name
        .chars()
        .filter(|c| c.is_alphanumeric() || *c == '-' || *c == '_')
        .take(16)
        .collect();

    let mut hasher = DefaultHasher::new();
    canonical.to_string_lossy().hash(&mut hasher);

    format!("{}-{:016x}", sanitized, hasher.finish())
}

/// Find the root of a codebase: the nearest ancestor with a `.git`
/// directory, or `start_path` itself
pub fn find_codebase_root(start_path: &Path) -> Result<PathBuf> {
    let start = start_path
        .canonicalize()
        .with_context(|| format!("Invalid path: {}", start_path.display()))?;

    let mut current = start.as_path();
    loop {
        if current.join(".git").exists() {
            return Ok(current.to_path_buf());
        }
        match current.parent() {
            Some(parent) => current = parent,
            None => return Ok(start),
        }
    }
}

/// Remove an index for a codebase
pub fn remove_index(root_path: &Path) -> Result<()> {
    let index_dir = get_index_dir(root_path)?;
    if index_dir.exists() {
        fs::remove_dir_all(&index_dir)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_defaults_when_fields_missing() {
        let config: AppConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config.hash_algorithm, HashAlgorithm::Stronger);
        assert!(config.parallel_indexing);
    }

    #[test]
    fn test_config_reads_algorithm() {
        let config: AppConfig = serde_json::from_str(r#"{"hash_algorithm": "compact"}"#).unwrap();
        assert_eq!(config.index_config().hash_algorithm, HashAlgorithm::Compact);
    }

    #[test]
    fn test_folder_name_is_stable() {
        let dir = tempfile::tempdir().unwrap();
        let a = index_folder_name(dir.path());
        let b = index_folder_name(dir.path());
        assert_eq!(a, b);
        assert!(a.contains('-'));
    }

    #[test]
    fn test_root_detection_finds_git_dir() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir(dir.path().join(".git")).unwrap();
        let nested = dir.path().join("src").join("deep");
        fs::create_dir_all(&nested).unwrap();

        let root = find_codebase_root(&nested).unwrap();
        assert_eq!(root, dir.path().canonicalize().unwrap());
    }
}
