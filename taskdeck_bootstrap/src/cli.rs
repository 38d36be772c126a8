// /////////////////////////////////////////////////////////////////////////////
// TaskDeck
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! Command-line interface for the TaskDeck server binary.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug, Clone)]
#[command(name = "taskdeck")]
#[command(about = concat!("TaskDeck change-control server v", env!("CARGO_PKG_VERSION")))]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable debug logging (RUST_LOG overrides this)
    #[arg(short, long)]
    pub verbose: bool,

    /// Path to a TOML configuration file
    #[arg(short, long)]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Run the HTTP server
    Serve {
        /// Listen port (overrides config and PORT)
        #[arg(short, long)]
        port: Option<u16>,

        /// SQLite database URL or path (overrides config and DATABASE_URL)
        #[arg(short, long)]
        database: Option<String>,

        /// Insert the demo project on startup if the database is empty
        #[arg(long)]
        seed: bool,
    },
    /// Create the database if needed and run pending migrations
    Migrate {
        #[arg(short, long)]
        database: Option<String>,
    },
    /// Insert the demo project (idempotent)
    Seed {
        #[arg(short, long)]
        database: Option<String>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_serve_with_overrides() {
        let cli = Cli::parse_from([
            "taskdeck", "--verbose", "serve", "--port", "9000", "--database", "sqlite://x.db",
        ]);
        assert!(cli.verbose);
        match cli.command {
            Commands::Serve { port, database, seed } => {
                assert_eq!(port, Some(9000));
                assert_eq!(database.as_deref(), Some("sqlite://x.db"));
                assert!(!seed);
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn parses_migrate_and_seed() {
        let cli = Cli::parse_from(["taskdeck", "migrate"]);
        assert!(matches!(cli.command, Commands::Migrate { .. }));

        let cli = Cli::parse_from(["taskdeck", "seed", "--database", "sqlite://y.db"]);
        match cli.command {
            Commands::Seed { database } => assert_eq!(database.as_deref(), Some("sqlite://y.db")),
            other => panic!("unexpected command {:?}", other),
        }
    }
}
