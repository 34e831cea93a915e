//! drive_sync CLI - Download new files from a Google Drive folder.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use drive_sync::config::DEFAULT_TOKEN_FILE;
use drive_sync::{run, StdinCodeProvider, SyncOptions};

/// Download files from a Google Drive folder that are missing locally.
#[derive(Parser)]
#[command(name = "drive_sync")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Name of the Drive folder to sync from.
    src_dir: String,

    /// Local directory to download into (created if missing).
    target_dir: PathBuf,

    /// OAuth client secret JSON file.
    cred_file: PathBuf,

    /// Where the OAuth token is cached between runs.
    #[arg(long, default_value = DEFAULT_TOKEN_FILE)]
    token_file: PathBuf,

    /// Follow pagination instead of stopping after the newest 25 files.
    #[arg(long)]
    all: bool,

    /// Enable debug logging.
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .compact()
        .init();

    info!(
        "Arguments: {} {} {}",
        cli.src_dir,
        cli.target_dir.display(),
        cli.cred_file.display()
    );

    let options = SyncOptions {
        token_file: cli.token_file,
        all_pages: cli.all,
        ..SyncOptions::new(cli.src_dir, cli.target_dir, cli.cred_file)
    };

    let report = run(&options, &StdinCodeProvider)
        .await
        .with_context(|| format!("Failed to sync folder '{}'", options.folder_name))?;

    info!(
        "Done: {} downloaded, {} skipped, {} failed",
        report.downloaded(),
        report.skipped(),
        report.failed()
    );

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_three_positionals() {
        let cli = Cli::try_parse_from(["drive_sync", "Photos", "out", "secret.json"]).unwrap();
        assert_eq!(cli.src_dir, "Photos");
        assert_eq!(cli.target_dir, PathBuf::from("out"));
        assert_eq!(cli.token_file, PathBuf::from("token.json"));
        assert!(!cli.all);
    }

    #[test]
    fn test_options() {
        let cli = Cli::try_parse_from([
            "drive_sync",
            "Photos",
            "out",
            "secret.json",
            "--token-file",
            "/tmp/tok.json",
            "--all",
            "-v",
        ])
        .unwrap();
        assert_eq!(cli.token_file, PathBuf::from("/tmp/tok.json"));
        assert!(cli.all);
        assert!(cli.verbose);
    }

    #[test]
    fn test_wrong_argument_count() {
        assert!(Cli::try_parse_from(["drive_sync", "Photos", "out"]).is_err());
        assert!(Cli::try_parse_from(["drive_sync", "a", "b", "c", "d"]).is_err());
    }
}
