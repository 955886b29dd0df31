//! `fiscal` binary entry point.

use anyhow::Context;
use clap::Parser;
use fiscal_cli::CliArgs;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = CliArgs::parse();
    let command = format!("{:?}", args.command);
    fiscal_cli::run(args)
        .await
        .with_context(|| format!("fiscal command failed: {command}"))
}
