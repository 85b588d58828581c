//! Relational store for normalized indicator rows.
//!
//! - connection handling (`Store`)
//! - table provisioning (`schema`)
//! - existence-checked loading (`loader`)

use std::path::Path;

use rusqlite::Connection;

use crate::error::AppError;

pub mod loader;
pub mod schema;

pub use loader::load_records;
pub use schema::{TABLE, provision};

/// A single connection shared by every step of one pipeline run.
pub struct Store {
    conn: Connection,
}

impl Store {
    /// Open the database named by a connection string.
    ///
    /// Accepts `sqlite://path`, `sqlite:path`, a bare path, or `:memory:`.
    pub fn open(url: &str) -> Result<Self, AppError> {
        let path = database_path(url);
        if path.is_empty() {
            return Err(AppError::config(format!("empty database path in '{url}'")));
        }
        if path == ":memory:" {
            return Self::open_in_memory();
        }

        if let Some(parent) = Path::new(path).parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let conn = Connection::open(path)?;
        tracing::debug!(path, "opened store");
        Ok(Self { conn })
    }

    pub fn open_in_memory() -> Result<Self, AppError> {
        Ok(Self {
            conn: Connection::open_in_memory()?,
        })
    }

    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    pub(crate) fn connection_mut(&mut self) -> &mut Connection {
        &mut self.conn
    }

    /// Total persisted rows across all indicators.
    pub fn count_rows(&self) -> Result<usize, AppError> {
        let n: i64 = self
            .conn
            .query_row(&format!("SELECT COUNT(*) FROM {TABLE}"), [], |row| row.get(0))?;
        Ok(n as usize)
    }

    pub fn count_indicator(&self, indicator: &str) -> Result<usize, AppError> {
        let n: i64 = self.conn.query_row(
            &format!("SELECT COUNT(*) FROM {TABLE} WHERE indicador = ?1"),
            [indicator],
            |row| row.get(0),
        )?;
        Ok(n as usize)
    }
}

fn database_path(url: &str) -> &str {
    url.strip_prefix("sqlite://")
        .or_else(|| url.strip_prefix("sqlite:"))
        .unwrap_or(url)
        .trim()
}
