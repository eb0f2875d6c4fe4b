//! Database access for meterd

pub mod measures;

use anyhow::Result;
use sqlx::SqlitePool;
use std::path::Path;

/// Initialize database connection pool
pub async fn init_database_pool(db_path: &Path) -> Result<SqlitePool> {
    // Ensure parent directory exists
    if let Some(parent) = db_path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    // Use proper SQLite URI with mode=rwc (read, write, create)
    let db_url = format!("sqlite://{}?mode=rwc", db_path.display());
    tracing::debug!("Connecting to database: {}", db_url);

    let pool = SqlitePool::connect(&db_url).await?;

    init_tables(&pool).await?;

    Ok(pool)
}

/// Initialize the measures table and its uniqueness index
///
/// The unique index over (customer_code, measure_type, measure_month) is
/// what enforces the one-reading-per-month rule; the workflow's pre-insert
/// query only exists to produce the friendly 409 without an extraction
/// round-trip.
pub async fn init_tables(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS measures (
            id TEXT PRIMARY KEY,
            customer_code TEXT NOT NULL,
            measure_datetime TEXT NOT NULL,
            measure_month TEXT NOT NULL,
            measure_type TEXT,
            measure_value INTEGER NOT NULL,
            has_confirmed INTEGER NOT NULL DEFAULT 0,
            image_url TEXT NOT NULL,
            created_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE UNIQUE INDEX IF NOT EXISTS idx_measures_customer_type_month
        ON measures (customer_code, measure_type, measure_month)
        "#,
    )
    .execute(pool)
    .await?;

    tracing::info!("Database tables initialized (measures)");

    Ok(())
}
