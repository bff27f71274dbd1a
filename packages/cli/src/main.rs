mod commands;

use clap::{Parser, Subcommand};
use commands::{edit, export, find, stats, validate, EditArgs, ExportArgs, FindArgs, StatsArgs, ValidateArgs};

/// Pagemark CLI - inspect and manipulate page annotation files
#[derive(Parser, Debug)]
#[command(name = "pagemark")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Load an annotation file and check every consistency invariant
    Validate(ValidateArgs),

    /// Per-page and per-category region counts
    Stats(StatsArgs),

    /// Search regions by category, text, and description state
    Find(FindArgs),

    /// Apply a metadata edit to one region and save
    Edit(EditArgs),

    /// Re-serialize an annotation file (normalizes formatting)
    Export(ExportArgs),
}

fn main() {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    let result = match cli.command {
        Command::Validate(args) => validate(args),
        Command::Stats(args) => stats(args),
        Command::Find(args) => find(args),
        Command::Edit(args) => edit(args),
        Command::Export(args) => export(args),
    };

    if let Err(error) = result {
        eprintln!("error: {error:#}");
        std::process::exit(1);
    }
}
