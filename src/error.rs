//! Error types for crosslens operations.
//!
//! Absence is not an error: a symbol, definition or reference that cannot be
//! found is reported as an empty list or `None`. The variants here cover input
//! problems (unknown language, missing file, bad offset) and adapter failures.

use std::path::PathBuf;
use thiserror::Error;

/// Result type for crosslens operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors surfaced to callers of the public API.
#[derive(Debug, Error)]
pub enum Error {
    /// No adapter is registered for the language.
    #[error("{}", unsupported_message(.language, .hint.as_deref()))]
    UnsupportedLanguage {
        language: String,
        /// Toolchain component that would add support, when known.
        hint: Option<String>,
    },

    /// Input file does not exist.
    #[error("file not found: {}", .0.display())]
    FileNotFound(PathBuf),

    /// The parser rejected the file.
    #[error("failed to parse {}: {message}", .path.display())]
    ParseFailure { path: PathBuf, message: String },

    /// Offset outside `[0, length)` for the file.
    #[error("offset {offset} is out of bounds for {} (length {length})", .path.display())]
    PositionOutOfBounds {
        path: PathBuf,
        offset: usize,
        length: usize,
    },

    /// An adapter failed while inspecting a tree.
    #[error("{language} adapter failed: {message}")]
    AdapterInternal { language: String, message: String },

    /// Invalid configuration file or option.
    #[error("configuration error: {0}")]
    Config(String),

    /// File system operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Convert an adapter's `anyhow` error, keeping typed errors intact.
    pub fn from_adapter(language: &str, err: anyhow::Error) -> Self {
        match err.downcast::<Error>() {
            Ok(typed) => typed,
            Err(other) => Error::AdapterInternal {
                language: language.to_string(),
                message: format!("{:#}", other),
            },
        }
    }

    /// Returns `true` for problems with the caller's input.
    pub fn is_input_error(&self) -> bool {
        matches!(
            self,
            Error::UnsupportedLanguage { .. }
                | Error::FileNotFound(_)
                | Error::ParseFailure { .. }
                | Error::PositionOutOfBounds { .. }
                | Error::Config(_)
        )
    }
}

fn unsupported_message(language: &str, hint: Option<&str>) -> String {
    match hint {
        Some(hint) => format!(
            "language {:?} is not supported: no adapter registered (requires {})",
            language, hint
        ),
        None => format!(
            "language {:?} is not supported: no adapter registered",
            language
        ),
    }
}
