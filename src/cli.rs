use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

/// Reverse dependency index for TypeScript/JavaScript projects.
///
/// remote-deps walks a project, extracts every import specifier, resolves it
/// through an optional import map, and reports which files reference each
/// remote (http/https) module.
#[derive(Parser, Debug)]
#[command(
    name = "remote-deps",
    version,
    about,
    long_about = None,
    propagate_version = true,
)]
pub struct Cli {
    /// Log per-file progress to stderr (overridden by RUST_LOG).
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Output format for the dependency tree.
#[derive(Clone, Debug, ValueEnum, Default)]
pub enum OutputFormat {
    /// One URL per line followed by its indented references (default).
    #[default]
    Compact,
    /// Columnar table with optional ANSI color when stdout is a terminal.
    Table,
    /// JSON object mapping each URL to its list of references.
    Json,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Build the reverse dependency index of remote modules for a project.
    Tree {
        /// Path to the project root.
        path: PathBuf,

        /// Import map JSON file. Overrides `import_map` in remote-deps.toml.
        #[arg(long)]
        import_map: Option<PathBuf>,

        /// Output format.
        #[arg(long, value_enum, default_value_t = OutputFormat::Compact)]
        format: OutputFormat,

        /// Worker threads for reading and parsing files.
        #[arg(short, long, default_value_t = 1, value_parser = clap::value_parser!(u16).range(1..))]
        jobs: u16,

        /// Abort the build if it takes longer than this many seconds.
        #[arg(long)]
        timeout: Option<u64>,
    },

    /// List the script files the walk would visit.
    Files {
        /// Path to the project root.
        path: PathBuf,
    },
}
