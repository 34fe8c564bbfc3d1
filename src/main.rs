use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use remote_deps::cli::{Cli, Commands};
use remote_deps::config::RemoteDepsConfig;
use remote_deps::index::{CancelToken, IndexBuilder};
use remote_deps::output::{format_tree, print_diagnostics};
use remote_deps::walker::{FileWalker, WalkFilter};

fn init_tracing(verbose: bool) {
    let default = if verbose { "remote_deps=debug" } else { "remote_deps=warn" };
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| default.into()))
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Commands::Tree {
            path,
            import_map,
            format,
            jobs,
            timeout,
        } => {
            let root = std::path::absolute(&path)
                .with_context(|| format!("invalid project path {}", path.display()))?;
            let config = RemoteDepsConfig::load(&root);

            // A flag is taken relative to the working directory, a config
            // entry relative to the project root.
            let import_map = match import_map {
                Some(p) => Some(std::path::absolute(&p).unwrap_or(p)),
                None => config.import_map_path(&root),
            };

            let cancel = match timeout {
                Some(secs) => CancelToken::with_timeout(Duration::from_secs(secs)),
                None => CancelToken::new(),
            };

            let report = IndexBuilder::new(&root)
                .import_map(import_map)
                .exclude(config.exclude_patterns())
                .jobs(usize::from(jobs))
                .cancel_token(cancel)
                .build()
                .with_context(|| format!("failed to build dependency tree for {}", root.display()))?;

            format_tree(&report, &format, &root);
            print_diagnostics(&report);
        }

        Commands::Files { path } => {
            let root = std::path::absolute(&path)
                .with_context(|| format!("invalid project path {}", path.display()))?;
            let config = RemoteDepsConfig::load(&root);
            let filter = WalkFilter::project_default().with_extra_exclusions(&config.exclude_patterns());

            let files = FileWalker::new(&root, filter)?.collect_files();
            for file in &files {
                println!("{}", file.strip_prefix(&root).unwrap_or(file).display());
            }
            println!("{} file(s)", files.len());
        }
    }

    Ok(())
}
