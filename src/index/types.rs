use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

/// Unique identifier for a document in the index
pub type DocId = u32;

/// Fixed part of the persisted index version. Bump when the on-disk layout changes.
pub const BASE_VERSION: u32 = 16;

/// Maps with fewer distinct entries than this are serialized on the producing thread.
pub const EAGER_SERIALIZATION_THRESHOLD: usize = 500;

/// Language detection enum
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[repr(u16)]
pub enum Language {
    #[default]
    Unknown = 0,
    Rust = 1,
    Python = 2,
    JavaScript = 3,
    TypeScript = 4,
    Go = 5,
    C = 6,
    Cpp = 7,
    Java = 8,
    Ruby = 9,
    Shell = 10,
    Markdown = 11,
    Json = 12,
    Yaml = 13,
    Toml = 14,
    Html = 15,
    Css = 16,
    Sql = 17,
    Haskell = 18,
    Scala = 19,
    Kotlin = 20,
    Swift = 21,
    Php = 22,
    CSharp = 23,
    Elixir = 24,
    Lua = 26,
    Perl = 27,
    R = 28,
    Zig = 29,
}

impl Language {
    pub fn from_extension(ext: &str) -> Self {
        match ext.to_lowercase().as_str() {
            "rs" => Language::Rust,
            "py" | "pyi" | "pyw" => Language::Python,
            "js" | "mjs" | "cjs" => Language::JavaScript,
            "ts" | "mts" | "cts" => Language::TypeScript,
            "tsx" | "jsx" => Language::TypeScript,
            "go" => Language::Go,
            "c" | "h" => Language::C,
            "cpp" | "cc" | "cxx" | "hpp" | "hxx" | "hh" => Language::Cpp,
            "java" => Language::Java,
            "rb" | "rake" => Language::Ruby,
            "sh" | "bash" | "zsh" | "fish" => Language::Shell,
            "md" | "markdown" => Language::Markdown,
            "json" => Language::Json,
            "yaml" | "yml" => Language::Yaml,
            "toml" => Language::Toml,
            "html" | "htm" => Language::Html,
            "css" | "scss" | "sass" | "less" => Language::Css,
            "sql" => Language::Sql,
            "hs" | "lhs" => Language::Haskell,
            "scala" | "sc" => Language::Scala,
            "kt" | "kts" => Language::Kotlin,
            "swift" => Language::Swift,
            "php" => Language::Php,
            "cs" => Language::CSharp,
            "ex" | "exs" => Language::Elixir,
            "lua" => Language::Lua,
            "pl" | "pm" => Language::Perl,
            "r" => Language::R,
            "zig" => Language::Zig,
            _ => Language::Unknown,
        }
    }
}

/// Lexical contexts an identifier was seen in, one bit per context.
///
/// Masks for the same identifier hash are combined with bitwise OR, so a
/// stored mask is the union of every context observed in one file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
pub struct OccurrenceMask(pub u8);

impl OccurrenceMask {
    pub const NONE: u8 = 0;
    pub const IN_CODE: u8 = 1 << 0;
    pub const IN_COMMENTS: u8 = 1 << 1;
    pub const IN_STRINGS: u8 = 1 << 2;
    pub const IN_FOREIGN_LANGUAGES: u8 = 1 << 3;
    pub const IN_PLAIN_TEXT: u8 = 1 << 4;
    /// Unknown or unspecified context; matches every search context.
    pub const ANY: u8 = 0xFF;

    pub fn bits(&self) -> u8 {
        self.0
    }

    /// True if any bit of `context` is set in this mask
    pub fn intersects(&self, context: u8) -> bool {
        self.0 & context != 0
    }
}

impl fmt::Display for OccurrenceMask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0 == Self::ANY {
            return f.write_str("any");
        }
        let names = [
            (Self::IN_CODE, "code"),
            (Self::IN_COMMENTS, "comments"),
            (Self::IN_STRINGS, "strings"),
            (Self::IN_FOREIGN_LANGUAGES, "foreign"),
            (Self::IN_PLAIN_TEXT, "plain"),
        ];
        let mut first = true;
        for (bit, name) in names {
            if self.0 & bit != 0 {
                if !first {
                    f.write_str("|")?;
                }
                f.write_str(name)?;
                first = false;
            }
        }
        if first {
            f.write_str("none")?;
        }
        Ok(())
    }
}

/// Search context names accepted on the command line
impl FromStr for OccurrenceMask {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut bits = 0u8;
        for part in s.split([',', '|']) {
            bits |= match part.trim().to_ascii_lowercase().as_str() {
                "code" => Self::IN_CODE,
                "comments" | "comment" => Self::IN_COMMENTS,
                "strings" | "string" | "literals" => Self::IN_STRINGS,
                "foreign" => Self::IN_FOREIGN_LANGUAGES,
                "plain" | "text" => Self::IN_PLAIN_TEXT,
                "any" | "all" => Self::ANY,
                other => return Err(format!("unknown search context: {}", other)),
            };
        }
        Ok(Self(bits))
    }
}

/// Hash function used to turn identifier text into index keys.
///
/// Hashes produced by different algorithms are not comparable, so the
/// algorithm version is part of the persisted index version.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum HashAlgorithm {
    /// Polynomial hash (multiplier 31) over every character
    #[default]
    Stronger,
    /// `(first << 8) + (last << 4) + length`
    Compact,
}

impl HashAlgorithm {
    /// Version contribution recorded next to [`BASE_VERSION`]
    pub fn version(&self) -> u32 {
        match self {
            HashAlgorithm::Compact => 0,
            HashAlgorithm::Stronger => 1,
        }
    }
}

impl FromStr for HashAlgorithm {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "stronger" | "strong" => Ok(HashAlgorithm::Stronger),
            "compact" => Ok(HashAlgorithm::Compact),
            other => Err(format!("unknown hash algorithm: {}", other)),
        }
    }
}

impl fmt::Display for HashAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HashAlgorithm::Stronger => f.write_str("stronger"),
            HashAlgorithm::Compact => f.write_str("compact"),
        }
    }
}

/// Index metadata stored in meta.json
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexMeta {
    pub version: u32,
    pub hash_algorithm: HashAlgorithm,
    pub hash_version: u32,
    pub root_path: PathBuf,
    pub doc_count: u32,
    pub entry_count: u64,
    pub failed_count: u32,
    pub created_at: u64,
    pub updated_at: u64,
}

impl IndexMeta {
    pub fn new(root_path: PathBuf, hash_algorithm: HashAlgorithm) -> Self {
        Self {
            version: BASE_VERSION,
            hash_algorithm,
            hash_version: hash_algorithm.version(),
            root_path,
            doc_count: 0,
            entry_count: 0,
            failed_count: 0,
            created_at: 0,
            updated_at: 0,
        }
    }

    /// Whether data written under this meta can be read with `algorithm`
    pub fn is_compatible(&self, algorithm: HashAlgorithm) -> bool {
        self.version == BASE_VERSION
            && self.hash_algorithm == algorithm
            && self.hash_version == algorithm.version()
    }
}

/// Posting - a document whose id map contains a hash, with the stored mask
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Posting {
    pub doc_id: DocId,
    pub mask: u8,
}

/// Configuration for the indexer
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexConfig {
    pub max_file_size: u64,
    pub hash_algorithm: HashAlgorithm,
    /// Maps smaller than this are serialized eagerly by the producing worker
    pub eager_serialization_threshold: usize,
    pub ignored_paths: Vec<String>,
    /// Scan files on the rayon pool instead of the calling thread
    pub parallel: bool,
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            max_file_size: 10 * 1024 * 1024,
            hash_algorithm: HashAlgorithm::default(),
            eager_serialization_threshold: EAGER_SERIALIZATION_THRESHOLD,
            ignored_paths: vec![
                ".git".to_string(),
                "node_modules".to_string(),
                "target".to_string(),
                "__pycache__".to_string(),
                ".venv".to_string(),
            ],
            parallel: true,
        }
    }
}

impl IndexConfig {
    pub fn with_hash_algorithm(mut self, hash_algorithm: HashAlgorithm) -> Self {
        self.hash_algorithm = hash_algorithm;
        self
    }
}
