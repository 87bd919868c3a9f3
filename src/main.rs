use clap::Parser;
use secondbrain::cli::commands;
use secondbrain::cli::{Cli, Commands};
use secondbrain::{Settings, logging};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => Settings::load_from(path),
        None => Settings::load(),
    }
    .unwrap_or_else(|e| {
        eprintln!("Configuration error: {e}");
        eprintln!("Using default configuration for now.");
        Settings::default()
    });

    logging::init_with_config(&config.logging);

    if let Err(e) = run(cli.command, &config).await {
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
}

async fn run(command: Commands, config: &Settings) -> anyhow::Result<()> {
    match command {
        Commands::Init { force } => commands::init::run_init(force),
        Commands::Config => commands::init::run_config(config),
        Commands::Ingest { path, no_progress } => {
            commands::ingest::run(config, path, !no_progress)
        }
        Commands::Ask {
            query,
            user,
            ingest,
        } => commands::ask::run_ask(config, query, user, ingest).await,
        Commands::Chat { user } => commands::ask::run_chat(config, user).await,
        Commands::Search { query, k, json } => commands::search::run(config, &query, k, json),
        Commands::Memory { action } => commands::memory::run(action, config),
    }
}
