//! Error types for report decoding in bambu-types.

use thiserror::Error;

/// Errors that can occur when decoding a printer report.
///
/// Only structural problems with the payload are errors. A single field with
/// an unexpected type never fails the decode; it falls back to its default.
///
/// This enum is marked `#[non_exhaustive]` to allow adding new error variants
/// in future versions without breaking downstream code.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum DecodeError {
    /// The payload is not syntactically valid JSON.
    #[error("Invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// The payload is valid JSON but the root is not an object.
    #[error("Report payload is not a JSON object")]
    NotAnObject,

    /// A required top-level key is missing or is not an object.
    #[error("Missing top-level object '{0}'")]
    MissingKey(&'static str),
}

/// Result type alias using bambu-types' DecodeError type.
pub type DecodeResult<T> = std::result::Result<T, DecodeError>;
