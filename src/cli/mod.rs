//! CLI routing and command dispatch.

use crate::constants;
use crate::core::{config, paths::StorePaths};
use crate::models::config::ExportConfig;
use crate::util::logging;
use anyhow::Result;
use clap::{ArgAction, Parser, Subcommand};
use std::path::PathBuf;
use tracing::warn;

pub mod doctor;
pub mod export;
pub mod scan;

/// Shared context passed to all command handlers.
pub struct CliContext {
    pub paths: StorePaths,
    pub config: ExportConfig,
    pub gpg_program: String,
    pub non_interactive: bool,
    pub config_warning: Option<String>,
}

#[derive(Parser, Debug)]
#[command(
    name = "pass-export",
    version,
    about = "Export a pass password store to a Bitwarden-importable CSV"
)]
pub struct Cli {
    /// Password store location (default: ~/.password-store)
    #[arg(long, global = true, value_name = "PATH", env = "PASSWORD_STORE_DIR")]
    pub password_store: Option<PathBuf>,

    /// Config file (default: <config dir>/pass-export/config.toml)
    #[arg(long, global = true, value_name = "PATH", env = "PASS_EXPORT_CONFIG")]
    pub config: Option<PathBuf>,

    /// Decryption program (default: gpg)
    #[arg(long, global = true, value_name = "PROGRAM", env = "PASS_EXPORT_GPG")]
    pub gpg: Option<String>,

    /// Run in non-interactive mode (no prompts, suitable for automation)
    #[arg(long, global = true, env = "PASS_EXPORT_NON_INTERACTIVE")]
    pub non_interactive: bool,

    /// More log output on stderr (-v info, -vv debug)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    /// Only log errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    pub fn run(self) -> Result<()> {
        logging::init(self.verbose, self.quiet);

        let (config, config_warning) = config::resolve(self.config.as_deref())?;
        if let Some(w) = &config_warning {
            warn!("{}", w);
        }

        let paths = StorePaths::resolve(self.password_store, config.store_dir.clone())?;
        let gpg_program = self
            .gpg
            .or_else(|| config.gpg_program.clone())
            .unwrap_or_else(|| constants::DEFAULT_GPG_PROGRAM.to_string());

        let ctx = CliContext {
            paths,
            config,
            gpg_program,
            non_interactive: self.non_interactive,
            config_warning,
        };

        match self.command {
            Commands::Export(args) => export::run(&ctx, args),
            Commands::Scan(args) => scan::run(&ctx, args),
            Commands::Doctor(args) => doctor::run(&ctx, args),
        }
    }
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Decrypt every entry and write the CSV
    Export(export::ExportArgs),
    /// List the entries that would be exported (no decryption)
    Scan(scan::ScanArgs),
    /// Diagnose store and gpg setup (safe, read-only)
    Doctor(doctor::DoctorArgs),
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_export_args() {
        let cli = Cli::try_parse_from([
            "pass-export",
            "--password-store",
            "/srv/pass",
            "export",
            "-o",
            "out.csv",
            "--jobs",
            "4",
            "--no-unlock",
        ])
        .unwrap();
        assert_eq!(cli.password_store, Some(PathBuf::from("/srv/pass")));
        match cli.command {
            Commands::Export(args) => {
                assert_eq!(args.output, Some(PathBuf::from("out.csv")));
                assert_eq!(args.jobs, Some(4));
                assert!(args.no_unlock);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_zero_jobs_rejected() {
        assert!(Cli::try_parse_from(["pass-export", "export", "--jobs", "0"]).is_err());
    }
}
