//! Error handling and JSON error output.
//!
//! # Error Variant Usage Patterns
//!
//! - **`Message`**: Use for errors with no underlying cause, typically validation
//!   failures or malformed data. Example: `HandwriteError::message(ErrorCode::InvalidData, "not an IDX label file")`
//!
//! - **`Context`**: Use when wrapping another error with additional context.
//!   Example: `HandwriteError::context(ErrorCode::Io, "failed to open weights", err)`
//!
//! - **Matrix variants** (`Shape`, `Dot`, `Reshape`, `IndexOutOfBounds`): raised by
//!   matrix arithmetic and carry the offending dimensions.
//!
//! - **Auto-converted variants** (`Io`, `Json`, `Csv`, etc.): Used via `?` operator
//!   for ergonomic error propagation. Prefer `Context` when the failing operation
//!   is not obvious from the source error alone.

use serde::Serialize;
use std::error::Error as StdError;
use std::fmt;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, HandwriteError>;

#[derive(Debug, Serialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    Io,
    Json,
    Csv,
    Http,
    Toml,
    Shape,
    Dot,
    Reshape,
    IndexOutOfBounds,
    InvalidData,
    InvalidInput,
    TaskFailed,
    Config,
}

#[derive(Debug, Error)]
pub enum HandwriteError {
    #[error("{message}")]
    Message { code: ErrorCode, message: String },
    #[error("{message}")]
    Context {
        code: ErrorCode,
        message: String,
        #[source]
        source: Box<dyn StdError + Send + Sync>,
    },
    #[error("expected a ({expected_rows}, {expected_cols}) matrix, but received ({rows}, {cols})")]
    Shape {
        expected_rows: usize,
        expected_cols: usize,
        rows: usize,
        cols: usize,
    },
    #[error("matrix ({left_rows}, {left_cols}) cannot be multiplied by ({right_rows}, {right_cols})")]
    Dot {
        left_rows: usize,
        left_cols: usize,
        right_rows: usize,
        right_cols: usize,
    },
    #[error("cannot reshape matrix ({rows}, {cols}) to ({target_rows}, {target_cols})")]
    Reshape {
        rows: usize,
        cols: usize,
        target_rows: usize,
        target_cols: usize,
    },
    #[error("matrix index out of range: (row: {row}, column: {col}, rows: {rows}, columns: {cols})")]
    IndexOutOfBounds {
        row: usize,
        col: usize,
        rows: usize,
        cols: usize,
    },
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),
}

impl HandwriteError {
    pub fn code(&self) -> ErrorCode {
        match self {
            HandwriteError::Message { code, .. } => *code,
            HandwriteError::Context { code, .. } => *code,
            HandwriteError::Shape { .. } => ErrorCode::Shape,
            HandwriteError::Dot { .. } => ErrorCode::Dot,
            HandwriteError::Reshape { .. } => ErrorCode::Reshape,
            HandwriteError::IndexOutOfBounds { .. } => ErrorCode::IndexOutOfBounds,
            HandwriteError::Io(_) => ErrorCode::Io,
            HandwriteError::Json(_) => ErrorCode::Json,
            HandwriteError::Csv(_) => ErrorCode::Csv,
            HandwriteError::Http(_) => ErrorCode::Http,
            HandwriteError::Toml(_) => ErrorCode::Toml,
        }
    }

    pub fn message(code: ErrorCode, message: impl Into<String>) -> Self {
        HandwriteError::Message {
            code,
            message: message.into(),
        }
    }

    pub fn context<E>(code: ErrorCode, message: impl Into<String>, source: E) -> Self
    where
        E: StdError + Send + Sync + 'static,
    {
        HandwriteError::Context {
            code,
            message: message.into(),
            source: Box::new(source),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub code: ErrorCode,
    pub message: String,
    /// The chain of underlying causes, outermost first.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub causes: Vec<String>,
}

impl From<&HandwriteError> for ErrorResponse {
    fn from(error: &HandwriteError) -> Self {
        let mut causes = Vec::new();
        let mut current: Option<&(dyn StdError + 'static)> = error.source();
        while let Some(cause) = current {
            causes.push(cause.to_string());
            current = cause.source();
        }

        Self {
            code: error.code(),
            message: error.to_string(),
            causes,
        }
    }
}

/// Prints an error as JSON to stderr, keeping stdout reserved for command output.
pub fn eprint_error_json(error: &HandwriteError) {
    let response = ErrorResponse::from(error);
    match serde_json::to_string_pretty(&response) {
        Ok(payload) => eprintln!("{payload}"),
        Err(err) => eprintln!(
            "{}: {} (serialization error: {err})",
            response.code, response.message
        ),
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ErrorCode::Io => "io",
            ErrorCode::Json => "json",
            ErrorCode::Csv => "csv",
            ErrorCode::Http => "http",
            ErrorCode::Toml => "toml",
            ErrorCode::Shape => "shape",
            ErrorCode::Dot => "dot",
            ErrorCode::Reshape => "reshape",
            ErrorCode::IndexOutOfBounds => "index_out_of_bounds",
            ErrorCode::InvalidData => "invalid_data",
            ErrorCode::InvalidInput => "invalid_input",
            ErrorCode::TaskFailed => "task_failed",
            ErrorCode::Config => "config",
        };
        write!(f, "{label}")
    }
}
