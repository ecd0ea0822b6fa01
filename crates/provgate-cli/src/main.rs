//! provgate CLI
//!
//! Dry-run front end for the attribute modification gate

use clap::{Parser, Subcommand};

mod commands;

#[derive(Debug, Parser)]
#[command(name = "provgate")]
#[command(about = "provgate - Attribute modification checks", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Run pre-commit checks on a batch without committing it
    Check(commands::check::CheckArgs),
    /// List the attribute catalogue
    Attrs(commands::attrs::AttrsArgs),
}

fn main() {
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Check(args) => commands::check::execute(args),
        Commands::Attrs(args) => commands::attrs::execute(args),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
