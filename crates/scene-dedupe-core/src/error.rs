use thiserror::Error;

pub type Result<T> = core::result::Result<T, Error>;

/// Custom error types for the scene-dedupe library
#[derive(Error, Debug)]
pub enum Error {
    /// I/O operation error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON (de)serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A property required for comparison is absent from the record
    #[error("Scene {record} is missing required field '{field}'")]
    MissingField { record: i64, field: String },

    /// A modification time that could not be parsed
    #[error("Scene {record} has an unparseable timestamp '{value}'")]
    TimestampParse { record: i64, value: String },

    /// Record that cannot be normalized at all
    #[error("Invalid scene record: {0}")]
    InvalidRecord(String),

    /// Invalid configuration error
    #[error("Invalid configuration: {0}")]
    Configuration(String),

    /// Resolution needs at least two candidates
    #[error("Duplicate group has {0} scene(s), at least 2 are required")]
    GroupTooSmall(usize),

    /// Failure reported by the scene store
    #[error("Scene store error: {0}")]
    Store(String),
}
