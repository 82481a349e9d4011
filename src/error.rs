use thiserror::Error;

#[derive(Error, Debug)]
pub enum FengError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Appwrite configuration is missing: {0}")]
    MissingConfig(&'static str),

    #[error("Appwrite error ({status}): {message}")]
    Remote { status: u16, message: String },

    #[error("Collection {0} not found")]
    CollectionNotFound(String),

    #[error("Unknown entity: {0}")]
    UnknownEntity(String),

    #[error("Unterminated quoted field starting on line {line}")]
    UnterminatedQuote { line: usize },

    #[error("Schema cannot be updated automatically: {0}")]
    SchemaBlocked(String),

    #[error("Settings error: {0}")]
    Settings(String),

    #[error("{0}")]
    Other(String),
}

pub type Result<T> = std::result::Result<T, FengError>;
