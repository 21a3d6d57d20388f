#![forbid(unsafe_code)]

use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use tracing::{info, warn};

mod cli;
mod config;
mod db;
mod report;
mod utils;
mod web;

use cli::{Cli, Command};
use config::{Config, DbType};
use web::WebServer;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = Arc::new(Config::load(&cli.config)?);
    utils::logging::init_tracing(&config.logging)?;

    if !cli.config.exists() {
        info!(
            "config file {} not found, using defaults",
            cli.config.display()
        );
    }
    if config.database.db_type() == DbType::Remote && config.database.auth_token.is_none() {
        warn!("remote database configured without an auth token");
    }

    let db_manager = Arc::new(db::DatabaseManager::new(&config.database).await?);
    db_manager.migrate().await?;
    info!(backend = db_manager.db_type().as_str(), "database ready");

    match cli.command.unwrap_or(Command::Serve) {
        Command::Serve => {
            info!("pipelines api starting up");
            let web_server = WebServer::new(config.clone(), db_manager.clone());

            tokio::select! {
                result = web_server.start() => result?,
                _ = tokio::signal::ctrl_c() => info!("shutdown signal received"),
            }

            info!("pipelines api shutting down");
        }
        Command::Migrate => info!("database schema is up to date"),
        Command::Report { resource } => report::print_report(&db_manager, resource).await?,
    }

    Ok(())
}
