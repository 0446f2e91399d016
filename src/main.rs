//! crosslens CLI entry point.

use clap::Parser;
use crosslens::cli::{self, Cli, Commands, EXIT_ERROR};
use tracing_subscriber::EnvFilter;

fn init_tracing(verbose: bool) {
    let default = if verbose { "crosslens=debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.global.verbose);
    tracing::info!(root = %cli.global.root.display(), "crosslens starting");

    let global = &cli.global;
    let result = match &cli.command {
        Commands::Symbols(args) => cli::run_symbols(global, args),
        Commands::Definition(args) => cli::run_definition(global, args),
        Commands::Find(args) => cli::run_find(global, args),
        Commands::References(args) => cli::run_references(global, args),
        Commands::Hover(args) => cli::run_hover(global, args),
        Commands::Languages => cli::run_languages(global),
        Commands::Kinds(args) => cli::run_kinds(global, args),
    };

    let exit_code = match result {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            EXIT_ERROR
        }
    };

    std::process::exit(exit_code);
}
