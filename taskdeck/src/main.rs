// /////////////////////////////////////////////////////////////////////////////
// TaskDeck
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! TaskDeck server binary: parse the CLI, load configuration, bring up the
//! database, and serve the HTTP facade until a shutdown signal arrives.

use anyhow::Context;
use clap::Parser;

use taskdeck::infrastructure::config::ServiceConfig;
use taskdeck::infrastructure::persistence::{schema, seed, SqliteStore};
use taskdeck::presentation::http;
use taskdeck_bootstrap::logger::{self, BootstrapLogger, ConsoleLogger};
use taskdeck_bootstrap::{shutdown_signal, Cli, Commands, ExitCode};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    logger::init_tracing(cli.verbose);
    let log = ConsoleLogger::new();

    if let Err(e) = run(cli, &log).await {
        log.error(&format!("{:#}", e));
        std::process::exit(ExitCode::from_error(e.as_ref()).as_i32());
    }
}

async fn run(cli: Cli, log: &dyn BootstrapLogger) -> anyhow::Result<()> {
    match cli.command {
        Commands::Serve {
            port,
            database,
            seed: seed_on_start,
        } => {
            let mut config = ServiceConfig::load(cli.config.as_deref())
                .await
                .context("loading configuration")?;
            if let Some(database) = database {
                config.database_url = normalize_database_url(database);
            }
            if let Some(port) = port {
                config.port = port;
            }

            let pool = schema::initialize_database(&config.database_url)
                .await
                .with_context(|| format!("initializing database {}", config.database_url))?;
            if seed_on_start {
                seed::ensure_demo_data(&pool).await?;
            }

            let state = http::AppState::build(SqliteStore::new(pool), &config)?;
            let app = http::router(state);

            let addr = format!("0.0.0.0:{}", config.port);
            let listener = tokio::net::TcpListener::bind(&addr)
                .await
                .with_context(|| format!("failed to bind address {}", addr))?;
            log.info(&format!("Listening on http://{}", addr));
            tracing::info!(port = config.port, database = %config.database_url, "Server started");

            axum::serve(listener, app)
                .with_graceful_shutdown(shutdown_signal())
                .await
                .context("server error")?;
            log.info("Shutdown complete");
        }
        Commands::Migrate { database } => {
            let config = resolved_config(cli.config.as_deref(), database).await?;
            schema::initialize_database(&config.database_url)
                .await
                .with_context(|| format!("migrating database {}", config.database_url))?;
            log.info(&format!("Migrations applied to {}", config.database_url));
        }
        Commands::Seed { database } => {
            let config = resolved_config(cli.config.as_deref(), database).await?;
            let pool = schema::initialize_database(&config.database_url).await?;
            seed::ensure_demo_data(&pool).await?;
            log.info(&format!("Demo data ensured in {}", config.database_url));
        }
    }
    Ok(())
}

async fn resolved_config(
    config_path: Option<&std::path::Path>,
    database: Option<String>,
) -> anyhow::Result<ServiceConfig> {
    let mut config = ServiceConfig::load(config_path)
        .await
        .context("loading configuration")?;
    if let Some(database) = database {
        config.database_url = normalize_database_url(database);
    }
    Ok(config)
}

/// Accepts either a full `sqlite://` URL or a bare file path.
fn normalize_database_url(raw: String) -> String {
    if raw.starts_with("sqlite:") {
        raw
    } else {
        format!("sqlite://{}", raw)
    }
}
