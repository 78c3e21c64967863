pub mod config;
pub mod data;
pub mod error;
pub mod models;
pub mod services;
pub mod state;

use std::path::Path;
use std::time::Duration;

use rusqlite::Connection;
use tracing::warn;

use crate::error::AppError;

/// Budget for startup schema creation. Embedded-store startup can stall on
/// slow devices; blowing this budget is non-fatal so the app still launches.
pub const SCHEMA_INIT_BUDGET: Duration = Duration::from_secs(5);

const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

fn open_store(db_path: &Path) -> Result<Connection, AppError> {
    if let Some(parent) = db_path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    let conn = Connection::open(db_path)?;
    conn.busy_timeout(BUSY_TIMEOUT)?;
    Ok(conn)
}

/// Open the store and apply the idempotent schema. If schema creation does
/// not finish inside [`SCHEMA_INIT_BUDGET`], initialization still resolves
/// with a fresh handle; the pending statements finish on the other
/// connection and every statement is create-if-not-exists.
pub async fn init_store(db_path: &Path) -> Result<Connection, AppError> {
    let conn = open_store(db_path)?;

    let init = tokio::task::spawn_blocking(move || -> Result<Connection, AppError> {
        data::migrations::run_migrations(&conn)?;
        Ok(conn)
    });

    match tokio::time::timeout(SCHEMA_INIT_BUDGET, init).await {
        Ok(Ok(result)) => result,
        Ok(Err(join_err)) => Err(AppError::General(format!(
            "schema initialization task failed: {join_err}"
        ))),
        Err(_elapsed) => {
            warn!(
                budget_ms = SCHEMA_INIT_BUDGET.as_millis() as u64,
                "Schema initialization exceeded budget, continuing with a fresh handle"
            );
            open_store(db_path)
        }
    }
}
