//! Pinduct CLI: the `pinduct` command.

mod cli;
mod commands;
mod support;

use clap::Parser;
use cli::{Cli, Commands};
use tracing_subscriber::EnvFilter;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "warn".into()))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Search {
            data,
            target,
            positive,
            scorer,
            config,
            threshold,
            conditional_threshold,
            max_iters,
            columns,
            bins,
            sequential,
            json,
        } => commands::search::run(commands::search::Args {
            data,
            target,
            positive,
            scorer,
            config,
            threshold,
            conditional_threshold,
            max_iters,
            columns,
            bins,
            sequential,
            json,
        }),

        Commands::Inspect {
            data,
            target,
            config,
            json,
        } => commands::inspect::run(data, target, config, json),

        Commands::CheckConfig { config, json } => commands::check_config::run(config, json),
    }
}
