use rusqlite::Error as RusqliteError;
use std::io;
use thiserror::Error;

/// Failures produced while turning schedule text or query text into values.
///
/// Each variant carries the offending token or clause so the caller can show
/// the user exactly what was rejected.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error("Malformed time: '{0}'")]
    MalformedTime(String),

    #[error("Malformed schedule: {0}")]
    MalformedSchedule(String),

    #[error("Unknown day: '{0}'")]
    UnknownDay(String),
}

#[derive(Error, Debug)]
pub enum OpenHoursError {
    #[error("I/O error: {0}")]
    IoError(#[from] io::Error),

    #[error("Database error: {0}")]
    DatabaseError(#[from] RusqliteError),

    #[error("Connection pool error: {0}")]
    PoolError(#[from] r2d2::Error),

    #[error("CSV error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("{0}")]
    Parse(#[from] ParseError),

    /// A schedule in an ingestion batch could not be parsed. The whole batch is rejected.
    #[error("Invalid schedule for '{business}' (record {record}): {source}")]
    InvalidSpec {
        record: usize,
        business: String,
        #[source]
        source: ParseError,
    },

    #[error("Invalid record: {0}")]
    InvalidRecord(String),

    #[error("Error: {0}")]
    Error(String), // Allows custom application errors
}
