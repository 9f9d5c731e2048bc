//! Error types for the Quiver library.
//!
//! All fallible operations return [`Result`], whose error side is the
//! [`QuiverError`] enum. Schema problems that callers commonly branch on
//! (duplicate names, the field ceiling, unknown fields) have their own
//! variants; everything else carries a message.
//!
//! # Examples
//!
//! ```
//! use quiver::error::{QuiverError, Result};
//!
//! fn example_operation() -> Result<()> {
//!     Err(QuiverError::query("prefix too short"))
//! }
//!
//! match example_operation() {
//!     Ok(_) => println!("Success"),
//!     Err(e) => eprintln!("Error: {}", e),
//! }
//! ```

use std::io;

use thiserror::Error;

/// The main error type for Quiver operations.
#[derive(Error, Debug)]
pub enum QuiverError {
    /// I/O errors (reading configuration files and the like)
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A field with the same (case-insensitive) name already exists.
    #[error("Duplicate field: {0}")]
    DuplicateField(String),

    /// The index already holds the maximum number of fields.
    #[error("Max fields exceeded: an index holds at most {0} fields")]
    MaxFieldsExceeded(usize),

    /// A query or document referenced a field the schema does not have.
    #[error("Unknown field: {0}")]
    UnknownField(String),

    /// Schema-related errors
    #[error("Schema error: {0}")]
    Schema(String),

    /// Field-related errors (wrong type, bad value)
    #[error("Field error: {0}")]
    Field(String),

    /// Query-related errors (invalid node shape, bad prefix)
    #[error("Query error: {0}")]
    Query(String),

    /// Index-related errors
    #[error("Index error: {0}")]
    Index(String),

    /// A posting record could not be decoded.
    #[error("Decode error: {0}")]
    Decode(String),

    /// Document-related errors
    #[error("Document error: {0}")]
    Document(String),

    /// Generic error for other cases
    #[error("Error: {0}")]
    Other(String),
}

/// Result type alias for operations that may fail with QuiverError.
pub type Result<T> = std::result::Result<T, QuiverError>;

impl QuiverError {
    /// Create a new schema error.
    pub fn schema<S: Into<String>>(msg: S) -> Self {
        QuiverError::Schema(msg.into())
    }

    /// Create a new field error.
    pub fn field<S: Into<String>>(msg: S) -> Self {
        QuiverError::Field(msg.into())
    }

    /// Create a new query error.
    pub fn query<S: Into<String>>(msg: S) -> Self {
        QuiverError::Query(msg.into())
    }

    /// Create a new index error.
    pub fn index<S: Into<String>>(msg: S) -> Self {
        QuiverError::Index(msg.into())
    }

    /// Create a new decode error.
    pub fn decode<S: Into<String>>(msg: S) -> Self {
        QuiverError::Decode(msg.into())
    }

    /// Create a new document error.
    pub fn document<S: Into<String>>(msg: S) -> Self {
        QuiverError::Document(msg.into())
    }

    /// Create a new generic error.
    pub fn other<S: Into<String>>(msg: S) -> Self {
        QuiverError::Other(msg.into())
    }

    /// Create a new invalid config error.
    pub fn invalid_config<S: Into<String>>(msg: S) -> Self {
        QuiverError::Other(format!("Invalid configuration: {}", msg.into()))
    }

    /// Create a new unknown field error.
    pub fn unknown_field<S: Into<String>>(name: S) -> Self {
        QuiverError::UnknownField(name.into())
    }

    /// Whether this error stems from the schema rather than from data.
    pub fn is_schema_error(&self) -> bool {
        matches!(
            self,
            QuiverError::DuplicateField(_)
                | QuiverError::MaxFieldsExceeded(_)
                | QuiverError::UnknownField(_)
                | QuiverError::Schema(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_construction() {
        let error = QuiverError::schema("Test schema error");
        assert_eq!(error.to_string(), "Schema error: Test schema error");

        let error = QuiverError::decode("truncated record");
        assert_eq!(error.to_string(), "Decode error: truncated record");

        let error = QuiverError::MaxFieldsExceeded(1024);
        assert_eq!(
            error.to_string(),
            "Max fields exceeded: an index holds at most 1024 fields"
        );
    }

    #[test]
    fn test_schema_error_classification() {
        assert!(QuiverError::unknown_field("title").is_schema_error());
        assert!(QuiverError::DuplicateField("title".into()).is_schema_error());
        assert!(!QuiverError::decode("bad varint").is_schema_error());
    }

    #[test]
    fn test_io_error_conversion() {
        let io_error = io::Error::new(io::ErrorKind::NotFound, "File not found");
        let quiver_error = QuiverError::from(io_error);

        match quiver_error {
            QuiverError::Io(_) => {}
            _ => panic!("Expected IO error variant"),
        }
    }
}
