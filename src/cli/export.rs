use crate::cli::CliContext;
use crate::constants;
use crate::core::cancel::CancelToken;
use crate::core::decrypt::{Decryptor, GpgDecryptor};
use crate::core::pipeline::{self, ExportSummary};
use crate::util::fs::PrivateOutput;
use anyhow::{bail, Context, Result};
use clap::Args;
use dialoguer::Confirm;
use std::io::IsTerminal;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

fn parse_jobs(s: &str) -> Result<usize, String> {
    match s.parse::<usize>() {
        Ok(0) => Err("must be at least 1".into()),
        Ok(n) => Ok(n),
        Err(e) => Err(e.to_string()),
    }
}

#[derive(Args, Debug)]
pub struct ExportArgs {
    /// Output file (default: stdout)
    #[arg(short, long, value_name = "PATH")]
    pub output: Option<PathBuf>,

    /// Entries decrypted in parallel (default: 1)
    #[arg(short, long, value_name = "N", value_parser = parse_jobs)]
    pub jobs: Option<usize>,

    /// Skip the up-front key unlock
    #[arg(long)]
    pub no_unlock: bool,

    /// Print to a terminal without asking
    #[arg(long)]
    pub yes: bool,
}

pub fn run(ctx: &CliContext, args: ExportArgs) -> Result<()> {
    let root = &ctx.paths.root;
    if !root.is_dir() {
        bail!("password store not found: {}", root.display());
    }

    let jobs = args.jobs.or(ctx.config.jobs).unwrap_or(1).max(1);
    let unlock = !args.no_unlock && ctx.config.unlock.unwrap_or(true);
    let decryptor: Arc<dyn Decryptor> =
        Arc::new(GpgDecryptor::new(ctx.gpg_program.as_str()).with_unlock(unlock));
    let cancel = CancelToken::new();
    info!(store = %ctx.paths, jobs, unlock, "exporting");

    let summary = match &args.output {
        Some(path) => {
            let mut out = PrivateOutput::create(path, constants::EXPORT_FILE_MODE)?;
            let summary = pipeline::run(root, decryptor, jobs, &cancel, out.file())
                .context("export failed")?;
            out.persist()?;
            eprintln!("Wrote {}", path.display());
            summary
        }
        None => {
            confirm_stdout(ctx, args.yes)?;
            let stdout = std::io::stdout();
            pipeline::run(root, decryptor, jobs, &cancel, stdout.lock())
                .context("export failed")?
        }
    };

    print_summary(&summary);
    Ok(())
}

fn confirm_stdout(ctx: &CliContext, yes: bool) -> Result<()> {
    if yes || !std::io::stdout().is_terminal() {
        return Ok(());
    }
    if ctx.non_interactive {
        bail!("refusing to print passwords to a terminal; use --output or --yes");
    }
    let ok = Confirm::new()
        .with_prompt("Print every password in the store to this terminal?")
        .default(false)
        .interact()
        .context("read confirmation")?;
    if !ok {
        bail!("aborted");
    }
    Ok(())
}

fn print_summary(summary: &ExportSummary) {
    let degraded = summary.degraded_entries();
    if degraded == 0 {
        eprintln!("Exported {} entries", summary.records);
        return;
    }
    eprintln!(
        "Exported {} entries, {} degraded:",
        summary.records, degraded
    );
    for diag in &summary.diagnostics {
        eprintln!("  [WARN] {}", diag);
    }
    eprintln!("Check degraded entries in the target manager after import.");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_jobs() {
        assert_eq!(parse_jobs("3"), Ok(3));
        assert!(parse_jobs("0").is_err());
        assert!(parse_jobs("many").is_err());
    }
}
