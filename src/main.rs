//! # Rental Management Main Entry Point
//!
//! `serve` (the default) runs the HTTP service; `migrate` applies pending
//! schema migrations and exits.

use std::sync::Arc;

use clap::{Parser, Subcommand};
use rental_management::{
    config::ConfigLoader,
    db::init_pool,
    migration::{Migrator, MigratorTrait},
    server::run_server,
    telemetry::init_tracing,
};

#[derive(Parser)]
#[command(name = "rental-management")]
#[command(about = "Maintenance request service for rental properties", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the HTTP service
    Serve,
    /// Apply pending database migrations and exit
    Migrate,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Load configuration from layered env files and variables
    let config = ConfigLoader::new().load()?;
    init_tracing(&config)?;

    tracing::info!(profile = %config.profile, "Loaded configuration");
    if let Ok(redacted_json) = config.redacted_json() {
        tracing::debug!(config = %redacted_json, "Effective configuration");
    }

    let db = init_pool(&config).await?;

    match cli.command.unwrap_or(Commands::Serve) {
        Commands::Migrate => {
            Migrator::up(&db, None).await?;
            tracing::info!("Migrations applied");
        }
        Commands::Serve => {
            if config.run_migrations {
                Migrator::up(&db, None).await?;
                tracing::info!("Migrations applied");
            }
            run_server(Arc::new(config), db).await?;
        }
    }

    Ok(())
}
