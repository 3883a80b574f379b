use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use clap::Parser;
use tracing::{error, info, Level};
use tracing_subscriber::FmtSubscriber;

use mnist_idx::dataloader::info::print_dataset_info;
use mnist_idx::{
    load_dataset, DataLoader, DataLoaderConfig, DatasetKind, DatasetSplit, DecoderConfig,
    DirectorySource, PrefetchDataLoaderIterator,
};

/// Decode gzip-compressed IDX image and label files and summarize the batches.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Cli {
    /// Directory holding the four canonical `*-idx?-ubyte.gz` files
    #[arg(default_value = "data/")]
    data_dir: PathBuf,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,

    /// Only log errors
    #[arg(short, long)]
    quiet: bool,
}

fn setup_logging(verbose: bool, quiet: bool) {
    let level = if quiet {
        Level::ERROR
    } else if verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .finish();

    tracing::subscriber::set_global_default(subscriber).expect("Failed to set tracing subscriber");
}

fn run(data_dir: &Path) -> Result<()> {
    let source = DirectorySource::new(data_dir)?;
    let decoder_config = DecoderConfig::default().build()?;

    for kind in [DatasetKind::Train, DatasetKind::Test] {
        let dataset = load_dataset(&source, kind, &decoder_config)
            .with_context(|| {
                format!("Failed to load {} dataset from {}", kind, data_dir.display())
            })?;

        let config = DataLoaderConfig {
            shuffle_seed: Some(727),
            ..Default::default()
        };
        let dl = Arc::new(DataLoader::new(dataset, Some(config))?);
        println!("== {} ==", kind);
        print_dataset_info(&dl);

        let mut batches = dl.clone().par_iter(DatasetSplit::Train);
        if let Some(batch) = batches.next() {
            info!(
                samples = batch.samples_in_batch,
                values = batch.values_per_sample,
                "first batch ready"
            );
        }
        batches
            .stop()
            .map_err(|_| anyhow!("prefetch thread panicked"))?;
    }

    Ok(())
}

fn main() {
    let cli = Cli::parse();
    setup_logging(cli.verbose, cli.quiet);

    if let Err(e) = run(&cli.data_dir) {
        error!("{:#}", e);
        std::process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_defaults_to_data_dir() {
        let cli = Cli::parse_from(["mnist_idx"]);
        assert_eq!(cli.data_dir, PathBuf::from("data/"));
        assert!(!cli.verbose && !cli.quiet);
    }

    #[test]
    fn cli_parses_flags_and_directory() {
        let cli = Cli::parse_from(["mnist_idx", "-v", "--quiet", "/tmp/mnist"]);
        assert_eq!(cli.data_dir, PathBuf::from("/tmp/mnist"));
        assert!(cli.verbose && cli.quiet);
    }

    #[test]
    fn cli_rejects_unknown_flags() {
        assert!(Cli::try_parse_from(["mnist_idx", "--bogus"]).is_err());
    }
}
