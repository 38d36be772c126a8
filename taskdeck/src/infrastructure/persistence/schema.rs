// /////////////////////////////////////////////////////////////////////////////
// TaskDeck
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! SQLite schema helpers shared by the store and the integration tests.
//!
//! Applies migrations on start-up so services and tests always see a
//! consistent database.

use sqlx::migrate::MigrateDatabase;
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::SqlitePool;
use tracing::{debug, info};

/// Runs pending migrations against the provided SQLite pool.
pub async fn ensure_schema(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    debug!("Ensuring database schema is up to date");

    // sqlx tracks applied migrations in _sqlx_migrations.
    sqlx::migrate!("../migrations").run(pool).await?;

    info!("Database schema is up to date");
    Ok(())
}

/// Creates the SQLite database file if it doesn't exist.
///
/// `SqlitePool::connect` fails on a missing file unless connect options ask
/// for creation, so startup calls this first.
pub async fn create_database_if_missing(database_url: &str) -> Result<(), sqlx::Error> {
    if !sqlx::Sqlite::database_exists(database_url).await? {
        debug!("Database does not exist, creating: {}", database_url);
        sqlx::Sqlite::create_database(database_url).await?;
        info!("Created new SQLite database: {}", database_url);
    } else {
        debug!("Database already exists: {}", database_url);
    }
    Ok(())
}

/// Creates the database if missing, connects, and migrates. The one call
/// application startup needs.
pub async fn initialize_database(database_url: &str) -> Result<SqlitePool, sqlx::Error> {
    create_database_if_missing(database_url).await?;

    // An in-memory database exists per connection; the pool must stay on a
    // single connection or every checkout would see a different database.
    let pool = if database_url.contains(":memory:") {
        SqlitePoolOptions::new()
            .max_connections(1)
            .connect(database_url)
            .await?
    } else {
        SqlitePool::connect(database_url).await?
    };

    ensure_schema(&pool).await?;

    Ok(pool)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;

    #[tokio::test]
    async fn creates_database_automatically() {
        let temp = NamedTempFile::new().unwrap();
        let db_path = temp.path().to_str().unwrap().to_string();
        drop(temp); // Remove file so we can test creation

        let db_url = format!("sqlite://{}", db_path);
        let pool = initialize_database(&db_url).await.unwrap();

        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM sqlite_master WHERE type='table'")
                .fetch_one(&pool)
                .await
                .unwrap();
        assert!(count > 0, "Database should have tables after initialization");

        let _ = std::fs::remove_file(&db_path);
    }

    #[tokio::test]
    async fn in_memory_database_has_core_tables() {
        let pool = initialize_database("sqlite::memory:").await.unwrap();

        for table in ["projects", "tasks", "drafts", "audit_logs", "seed_meta"] {
            let found: i64 = sqlx::query_scalar(
                "SELECT COUNT(*) FROM sqlite_master WHERE type='table' AND name = ?",
            )
            .bind(table)
            .fetch_one(&pool)
            .await
            .unwrap();
            assert_eq!(found, 1, "table {} should exist", table);
        }
    }

    #[tokio::test]
    async fn initialization_is_idempotent() {
        let temp = NamedTempFile::new().unwrap();
        let db_path = temp.path().to_str().unwrap().to_string();
        drop(temp);

        let db_url = format!("sqlite://{}", db_path);
        let _pool1 = initialize_database(&db_url).await.unwrap();
        let _pool2 = initialize_database(&db_url).await.unwrap();

        let _ = std::fs::remove_file(&db_path);
    }
}
