use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::filter::EnvFilter;

mod commands;
mod config;
mod host;

use commands::{CheckCommand, CompileCommand, DumpCommand, RunCommand};

#[derive(Parser)]
#[command(name = "rscript", version, about = "Retro game script compiler and VM")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Verbose output (repeat for more)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Commands {
    /// Compile a project into a bytecode image
    Compile(CompileCommand),
    /// Compile a single script and report diagnostics
    Check(CheckCommand),
    /// Disassemble a bytecode image
    Dump(DumpCommand),
    /// Run an event of one entity
    Run(RunCommand),
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(level.parse()?))
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Compile(cmd) => cmd.run(),
        Commands::Check(cmd) => cmd.run(),
        Commands::Dump(cmd) => cmd.run(),
        Commands::Run(cmd) => cmd.run(),
    }
}
