#![forbid(unsafe_code)]

use clap::{Parser, Subcommand};
use tracing_subscriber::filter::EnvFilter;

mod generate;
mod verify;

#[derive(Parser, Debug)]
#[command(name = "merkle")]
#[command(about = "Instruction Merkle tree tools for caliber scripts", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    Generate(generate::Cli),
    Verify(verify::Cli),
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Generate(args) => generate::run(args)?,
        Commands::Verify(args) => verify::run(args)?,
    }

    Ok(())
}
