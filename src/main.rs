use anyhow::Result;
use clap::{Parser, Subcommand};
use idindex::index::reader::IdIndexReader;
use idindex::index::search::{WordQuery, find_word};
use idindex::index::types::{HashAlgorithm, OccurrenceMask};
use idindex::output::print_candidates;
use idindex::utils::{self, AppConfig};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "idx")]
#[command(about = "Identifier occurrence index for source trees")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build or rebuild the index
    Index {
        /// Path to index (auto-detects git root)
        #[arg(default_value = ".")]
        path: PathBuf,

        /// Remove the existing index before building
        #[arg(short, long)]
        force: bool,

        /// Hash algorithm for identifier keys (stronger, compact)
        #[arg(long)]
        algorithm: Option<HashAlgorithm>,
    },
    /// List files containing an identifier
    Find {
        /// Identifier to look up
        word: String,

        /// Path inside the indexed codebase
        #[arg(short, long, default_value = ".")]
        path: PathBuf,

        /// Occurrence contexts to match, e.g. "code,comments" (code, comments, strings, foreign, plain, any)
        #[arg(short, long, default_value = "any")]
        context: OccurrenceMask,

        /// Match case-insensitively
        #[arg(short, long)]
        ignore_case: bool,

        /// Report raw index hits without re-reading files
        #[arg(long)]
        no_verify: bool,

        /// Print the contexts each file uses the identifier in
        #[arg(short = 'm', long)]
        show_contexts: bool,

        /// Disable colored output
        #[arg(long)]
        no_color: bool,

        /// Require the index to use this hash algorithm (default: the one it was built with)
        #[arg(long)]
        algorithm: Option<HashAlgorithm>,
    },
    /// Show index statistics
    Stats {
        /// Path to index
        #[arg(default_value = ".")]
        path: PathBuf,
    },
    /// Remove an index
    Remove {
        /// Path to the codebase to remove index for
        path: PathBuf,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let app_config = AppConfig::load()?.with_env_overrides()?;

    match cli.command {
        Commands::Index { path, force, algorithm } => {
            let mut config = app_config.index_config();
            if let Some(algorithm) = algorithm {
                config = config.with_hash_algorithm(algorithm);
            }
            idindex::index::build::build_index_auto(&path, &config, force)?;
        }
        Commands::Find {
            word,
            path,
            context,
            ignore_case,
            no_verify,
            show_contexts,
            no_color,
            algorithm,
        } => {
            let root = utils::find_codebase_root(&path)?;
            let reader = IdIndexReader::open_for_root(&root, algorithm)?;
            let query = WordQuery {
                word: &word,
                context: context.bits(),
                case_sensitive: !ignore_case,
                verify: !no_verify,
            };
            let results = find_word(&reader, reader.root_path(), &query);
            print_candidates(&results, !no_color, show_contexts)?;
            if results.is_empty() {
                std::process::exit(1);
            }
        }
        Commands::Stats { path } => {
            idindex::index::stats::show_stats(&path)?;
        }
        Commands::Remove { path } => {
            let root = utils::find_codebase_root(&path)?;
            utils::remove_index(&root)?;
            println!("Removed index for: {}", root.display());
        }
    }

    Ok(())
}
