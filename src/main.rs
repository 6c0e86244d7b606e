use anyhow::Result;
use clap::Parser;

fn main() -> Result<()> {
    let cli = pass_export::cli::Cli::parse();
    cli.run()
}
