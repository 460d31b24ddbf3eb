pub mod migrations;
pub mod queries;

use std::time::Duration;

use anyhow::Context;
use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef};
use rusqlite::Connection;

use crate::models::ClockTime;

/// Upper bound on how long a write transaction may wait for the database lock.
pub const MAX_TRANSACTION_TIMEOUT: Duration = Duration::from_secs(5);

pub fn init_db(path: &str) -> anyhow::Result<Connection> {
    init_db_with_timeout(path, MAX_TRANSACTION_TIMEOUT)
}

pub fn init_db_with_timeout(path: &str, busy_timeout: Duration) -> anyhow::Result<Connection> {
    let conn = Connection::open(path).context("failed to open database")?;

    conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA foreign_keys=ON;")
        .context("failed to set database pragmas")?;
    conn.busy_timeout(busy_timeout.min(MAX_TRANSACTION_TIMEOUT))
        .context("failed to set busy timeout")?;

    migrations::run_migrations(&conn)?;

    Ok(conn)
}

impl ToSql for ClockTime {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.to_string()))
    }
}

impl FromSql for ClockTime {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        let s = value.as_str()?;
        ClockTime::parse(s).map_err(|e| FromSqlError::Other(Box::new(e)))
    }
}
