//! Command-line interface for the ipamod IPA modifier.
//!
//! Rewrites bundle identity, plugin identifiers and icons of an IPA according
//! to a JSON configuration file and writes `<name>_mod.ipa` next to the input.

use anyhow::Context;
use clap::Parser;
use ipamod::Modifier;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::error;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "ipamod")]
#[command(version, about = "IPA bundle modifier")]
struct Cli {
    /// IPA file (*.ipa)
    ipa: PathBuf,

    /// Config file (*.json)
    config: PathBuf,

    /// ZIP compression level (0-9, default: 6)
    /// 0 = no compression (fastest)
    /// 9 = maximum compression (slowest, smallest file)
    #[arg(short = 'z', long, default_value = "6")]
    zip_level: u32,

    /// Remove the unpacked working directory after packing
    #[arg(long)]
    cleanup: bool,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> anyhow::Result<ExitCode> {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => return report_usage(&e),
    };

    init_tracing(cli.verbose);

    if let Some(message) = missing_input(&cli.ipa, &cli.config) {
        error!("{message}");
        return Ok(ExitCode::FAILURE);
    }

    let result = Modifier::new(&cli.ipa, &cli.config)
        .compression_level(cli.zip_level)
        .cleanup(cli.cleanup)
        .run();

    match result {
        Ok(_) => Ok(ExitCode::SUCCESS),
        Err(e) if e.is_recoverable() => {
            error!("{e}");
            Ok(ExitCode::FAILURE)
        }
        Err(e) => Err(e).with_context(|| format!("Aborted modifying {}", cli.ipa.display())),
    }
}

/// Print a clap parse outcome. Help and version exit successfully, usage
/// errors exit with status 1.
fn report_usage(e: &clap::Error) -> anyhow::Result<ExitCode> {
    e.print().context("Failed to print usage")?;

    Ok(if e.use_stderr() {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    })
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_target(false)
        .init();
}

/// Message for the first input path that does not exist.
fn missing_input(ipa: &Path, config: &Path) -> Option<&'static str> {
    if !ipa.exists() {
        Some("IPA file was not found.")
    } else if !config.exists() {
        Some("Config file was not found.")
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_cli_parses_positionals() {
        let cli = Cli::try_parse_from(["ipamod", "App.ipa", "config.json"]).unwrap();
        assert_eq!(cli.ipa, PathBuf::from("App.ipa"));
        assert_eq!(cli.config, PathBuf::from("config.json"));
        assert_eq!(cli.zip_level, 6);
        assert!(!cli.cleanup);
    }

    #[test]
    fn test_cli_requires_both_arguments() {
        assert!(Cli::try_parse_from(["ipamod", "App.ipa"]).is_err());
        assert!(Cli::try_parse_from(["ipamod"]).is_err());
    }

    #[test]
    fn test_usage_exit_codes() {
        let missing = Cli::try_parse_from(["ipamod"]).err().unwrap();
        assert_eq!(report_usage(&missing).unwrap(), ExitCode::FAILURE);

        let help = Cli::try_parse_from(["ipamod", "--help"]).err().unwrap();
        assert_eq!(report_usage(&help).unwrap(), ExitCode::SUCCESS);
    }

    #[test]
    fn test_cli_flags() {
        let cli =
            Cli::try_parse_from(["ipamod", "-z", "0", "--cleanup", "-v", "a.ipa", "c.json"])
                .unwrap();
        assert_eq!(cli.zip_level, 0);
        assert!(cli.cleanup);
        assert!(cli.verbose);
    }

    #[test]
    fn test_missing_input_messages() {
        let temp_dir = TempDir::new().unwrap();
        let ipa = temp_dir.path().join("App.ipa");
        let config = temp_dir.path().join("config.json");

        assert_eq!(missing_input(&ipa, &config), Some("IPA file was not found."));

        fs::write(&ipa, b"ipa").unwrap();
        assert_eq!(missing_input(&ipa, &config), Some("Config file was not found."));

        fs::write(&config, b"{}").unwrap();
        assert_eq!(missing_input(&ipa, &config), None);
    }
}
