use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SalesError {
    #[error("file '{}' not found", .0.display())]
    NotFound(PathBuf),

    #[error("could not decode '{}' with any supported encoding", .0.display())]
    DecodeFailure(PathBuf),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON deserialization failed: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, SalesError>;
