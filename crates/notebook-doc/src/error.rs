use thiserror::Error;

#[derive(Error, Debug)]
pub enum NotebookError {
    #[error("Invalid notebook format: {0}")]
    InvalidFormat(String),

    #[error("Unsupported notebook version: {0}.{1}")]
    UnsupportedVersion(i64, i64),

    #[error("Unknown cell type: {0}")]
    UnknownCellType(String),

    #[error("Unknown output type: {0}")]
    UnknownOutputType(String),

    #[error("Missing required field: {0}")]
    MissingField(&'static str),

    #[error("Duplicate cell ID: {0}")]
    DuplicateCellId(String),

    #[error("Cell not found: {0}")]
    CellNotFound(String),

    #[error("Index {index} is out of bounds for a notebook with {len} cells")]
    IndexOutOfBounds { index: usize, len: usize },

    #[error("JSON parsing error: {0}")]
    JsonError(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, NotebookError>;
