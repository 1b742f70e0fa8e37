mod meal_repo;

pub use meal_repo::MealRepository;

use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use std::path::PathBuf;
use std::str::FromStr;
use thiserror::Error;

/// Errors surfaced by the local record store.
#[derive(Error, Debug)]
pub enum StoreError {
    /// The store cannot be opened or a statement cannot run.
    #[error("local store unavailable: {0}")]
    Unavailable(#[from] sqlx::Error),

    /// An update or lookup referenced a meal id that does not exist.
    #[error("meal not found: {0}")]
    NotFound(i64),

    #[error("schema migration failed: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),
}

/// Initialize the database connection pool and run migrations.
///
/// Migrations are versioned and run at most once each; re-running after an
/// interrupted upgrade picks up where it left off, so opening an older
/// on-disk generation is always safe.
pub async fn init_db(db_path: PathBuf) -> Result<SqlitePool, StoreError> {
    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent)
            .map_err(|e| StoreError::Unavailable(sqlx::Error::Io(e)))?;
    }

    let db_url = format!("sqlite:{}?mode=rwc", db_path.display());

    let options = SqliteConnectOptions::from_str(&db_url)?
        .foreign_keys(true)
        .create_if_missing(true);

    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect_with(options)
        .await?;

    sqlx::migrate!("./migrations").run(&pool).await?;

    Ok(pool)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_init_db_creates_meals_table() {
        let temp_dir = tempdir().unwrap();
        let pool = init_db(temp_dir.path().join("test.db")).await.unwrap();

        let tables: Vec<(String,)> = sqlx::query_as(
            "SELECT name FROM sqlite_master WHERE type='table' AND name NOT LIKE 'sqlite_%' AND name NOT LIKE '_sqlx_%'",
        )
        .fetch_all(&pool)
        .await
        .unwrap();

        assert!(tables.iter().any(|t| t.0 == "meals"));
    }

    #[tokio::test]
    async fn test_reopening_is_idempotent() {
        let temp_dir = tempdir().unwrap();
        let db_path = temp_dir.path().join("test.db");

        let pool = init_db(db_path.clone()).await.unwrap();
        drop(pool);

        // Second open re-checks migrations without error or data loss.
        init_db(db_path).await.unwrap();
    }

    #[tokio::test]
    async fn test_sync_columns_exist() {
        let temp_dir = tempdir().unwrap();
        let pool = init_db(temp_dir.path().join("test.db")).await.unwrap();

        let columns: Vec<(String,)> =
            sqlx::query_as("SELECT name FROM pragma_table_info('meals')")
                .fetch_all(&pool)
                .await
                .unwrap();
        let names: Vec<&str> = columns.iter().map(|c| c.0.as_str()).collect();

        assert!(names.contains(&"sync_id"));
        assert!(names.contains(&"modified_at"));
        assert!(names.contains(&"sugar"));
    }
}
