//! Error types for lexbridge-studio

use thiserror::Error;

#[derive(Error, Debug)]
pub enum LexError {
    #[error("Graph payload rejected: {0}")]
    Graph(#[from] GraphError),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Service request failed with status {status}: {message}")]
    ServiceStatus { status: u16, message: String },

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Stale response discarded (token {token}, latest {latest})")]
    StaleResponse { token: u64, latest: u64 },
}

/// Structural problems that make a graph payload unusable as a snapshot.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GraphError {
    #[error("node #{index} has no id")]
    MissingId { index: usize },

    #[error("node #{index} ({id}) has no label")]
    MissingLabel { index: usize, id: String },

    #[error("duplicate node id: {0}")]
    DuplicateId(String),
}

/// Failure to draw a single node. Never aborts a frame.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RenderError {
    #[error("node {0} has no layout position yet")]
    NoPosition(String),

    #[error("node {id} has a non-finite position ({x}, {y})")]
    NonFinitePosition { id: String, x: f32, y: f32 },
}

pub type Result<T> = std::result::Result<T, LexError>;
