use std::path::{Path, PathBuf};
use std::time::Duration;

use log::{error, info};
use r2d2::{Pool, PooledConnection};
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::{Connection, OptionalExtension};

use crate::error::OpenHoursError;
use crate::schema::{CREATE_SCHEMA_SQL, SCHEMA_VERSION};

pub const DB_FILENAME: &str = "openhours.db";

const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

pub type DbConnection = PooledConnection<SqliteConnectionManager>;

pub struct Database {
    pool: Pool<SqliteConnectionManager>,
    path: PathBuf,
}

impl Database {
    /// Open (creating if needed) the database file at `path` and make sure the
    /// schema is present and current.
    pub fn open(path: &Path, pool_size: u32) -> Result<Self, OpenHoursError> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.is_dir() {
                return Err(OpenHoursError::Error(format!(
                    "Database folder '{}' does not exist or is not a directory",
                    parent.display()
                )));
            }
        }

        let manager = SqliteConnectionManager::file(path).with_init(|c| {
            c.busy_timeout(BUSY_TIMEOUT)?;
            c.execute_batch("PRAGMA foreign_keys = ON;")
        });

        let pool = Pool::builder().max_size(pool_size.max(1)).build(manager)?;

        let db = Database {
            pool,
            path: path.to_owned(),
        };

        let conn = db.get_connection()?;
        Self::ensure_schema(&conn)?;
        info!("Database opened at: {}", db.path.display());

        Ok(db)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn get_connection(&self) -> Result<DbConnection, OpenHoursError> {
        Ok(self.pool.get()?)
    }

    fn ensure_schema(conn: &Connection) -> Result<(), OpenHoursError> {
        let table_exists: bool = conn
            .query_row(
                "SELECT count(*) FROM sqlite_master WHERE type='table' AND name='meta'",
                [],
                |row| row.get::<_, i32>(0),
            )
            .map(|count| count > 0)?;

        if !table_exists {
            conn.execute_batch(CREATE_SCHEMA_SQL)?;
            return Ok(());
        }

        let stored_version: Option<String> = conn
            .query_row(
                "SELECT value FROM meta WHERE key = 'schema_version'",
                [],
                |row| row.get(0),
            )
            .optional()?;

        match stored_version.as_deref() {
            Some(SCHEMA_VERSION) => Ok(()),
            Some(other) => Err(OpenHoursError::Error(format!(
                "Schema version mismatch: expected {}, found {}",
                SCHEMA_VERSION, other
            ))),
            None => Err(OpenHoursError::Error("Schema version missing".to_string())),
        }
    }

    /// Run `f` inside a `BEGIN IMMEDIATE` transaction. Commits when `f`
    /// succeeds, rolls back when it fails, so the writes in `f` apply as a unit.
    pub fn immediate_transaction<T, F>(conn: &Connection, f: F) -> Result<T, OpenHoursError>
    where
        F: FnOnce(&Connection) -> Result<T, OpenHoursError>,
    {
        conn.execute_batch("BEGIN IMMEDIATE")?;

        let result = f(conn).and_then(|value| {
            conn.execute_batch("COMMIT")?;
            Ok(value)
        });

        if result.is_err() {
            if let Err(rollback_err) = conn.execute_batch("ROLLBACK") {
                error!("Rollback failed: {}", rollback_err);
            }
        }

        result
    }
}
