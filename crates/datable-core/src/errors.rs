//! Error types for the datable archive library.

/// Top-level error enum for the datable archive library.
#[derive(Debug, thiserror::Error)]
pub enum DatableError {
    #[error("Database error: {0}")]
    Database(String),

    #[error("Query error: {0}")]
    Query(String),

    #[error("Config error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

#[cfg(feature = "python")]
impl From<DatableError> for pyo3::PyErr {
    fn from(err: DatableError) -> pyo3::PyErr {
        use pyo3::exceptions::{PyIOError, PyRuntimeError, PyValueError};

        match &err {
            DatableError::Database(_) | DatableError::Sqlite(_) => {
                PyRuntimeError::new_err(err.to_string())
            }
            DatableError::Query(_) => PyValueError::new_err(err.to_string()),
            DatableError::Config(_) => PyValueError::new_err(err.to_string()),
            DatableError::Io(_) => PyIOError::new_err(err.to_string()),
            DatableError::Json(_) => PyValueError::new_err(err.to_string()),
        }
    }
}

pub type DatableResult<T> = Result<T, DatableError>;
