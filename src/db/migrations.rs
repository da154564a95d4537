//! SQLite bootstrap: connection options, pragmas and the fuel ledger schema.

use sqlx::sqlite::{
    SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions, SqliteSynchronous,
};
use std::path::Path;
use std::time::Duration;
use tracing::{debug, info, warn};

const SCHEMA_SQL: &str = include_str!("schema.sql");
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);
const MAX_CONNECTIONS: u32 = 5;

/// Open (creating if needed) the ledger database at `db_path` and apply the schema.
pub async fn init_db(db_path: &str) -> Result<SqlitePool, sqlx::Error> {
    ensure_parent_dir(db_path);

    // Pragmas set here are applied to every pooled connection.
    let options = SqliteConnectOptions::new()
        .filename(db_path)
        .create_if_missing(true)
        .foreign_keys(true)
        .journal_mode(SqliteJournalMode::Wal)
        .synchronous(SqliteSynchronous::Normal)
        .busy_timeout(BUSY_TIMEOUT);

    let pool = SqlitePoolOptions::new()
        .max_connections(MAX_CONNECTIONS)
        .connect_with(options)
        .await?;

    apply_schema(&pool).await?;

    info!(path = %db_path, "Fuel ledger database ready");
    Ok(pool)
}

fn ensure_parent_dir(db_path: &str) {
    let Some(parent) = Path::new(db_path).parent() else {
        return;
    };
    if parent.as_os_str().is_empty() || parent.exists() {
        return;
    }
    if let Err(e) = std::fs::create_dir_all(parent) {
        warn!(path = %parent.display(), error = %e, "Failed to create database directory");
    }
}

/// Split the bundled schema into individual statements.
fn schema_statements() -> impl Iterator<Item = &'static str> {
    SCHEMA_SQL
        .split(';')
        .map(str::trim)
        .filter(|statement| !statement.is_empty())
}

/// Every statement is `IF NOT EXISTS`, so reapplying is a no-op.
async fn apply_schema(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    let mut applied = 0usize;
    for statement in schema_statements() {
        sqlx::query(statement).execute(pool).await?;
        applied += 1;
    }
    debug!(statements = applied, "Schema applied");
    Ok(())
}
