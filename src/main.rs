use anyhow::{Context, Result};
use clap::Parser;
use log::error;

use vsadhkar::cli::args::{Cli, Commands};
use vsadhkar::cli::handlers;
use vsadhkar::config::{AppConfig, api_key_from_env};
use vsadhkar::{db, server};

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    env_logger::init();

    let cli = Cli::parse();
    let config = AppConfig::load_or_init().context("Loading config")?;

    let command = cli.command.unwrap_or(Commands::Run);

    // The proxy keeps no user state, so it never touches the database
    if let Commands::Serve { port } = command {
        let api_key = api_key_from_env().inspect_err(|e| error!("{}", e))?;
        return server::serve(&config, api_key, port.unwrap_or(config.server.port)).await;
    }
    if let Commands::Geo { action } = &command {
        return handlers::handle_geo(&config, action).await;
    }

    AppConfig::ensure_data_dir()?;
    let db_path = AppConfig::db_path()?;
    let conn = db::open(&db_path)?;
    let session = handlers::build_session(conn, &config);

    if let Some((name, args)) = command.as_message() {
        return handlers::handle_message(&session, name, &args).await;
    }

    match command {
        Commands::Settings => handlers::handle_settings(&session),
        _ => handlers::handle_run(session).await,
    }
}
