//! Unified error types for texdocx.
use thiserror::Error;

/// Main error type for texdocx operations.
///
/// Conversion failures of individual formulas never surface here: the
/// pipeline degrades them locally, and the single-formula APIs return
/// [`FormulaError`](crate::formula::FormulaError) directly. What remains are
/// failures of the container itself.
#[derive(Error, Debug)]
pub enum Error {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// XML generation or parsing error
    #[error("XML error: {0}")]
    XmlError(String),

    /// ZIP archive error
    #[error("ZIP error: {0}")]
    ZipError(String),

    /// Part missing from a package
    #[error("Component not found: {0}")]
    ComponentNotFound(String),

    /// Invalid format
    #[error("Invalid format: {0}")]
    InvalidFormat(String),

    /// Background task failed to complete
    #[error("Task error: {0}")]
    Task(String),

    /// Generic error
    #[error("{0}")]
    Other(String),
}

/// Result type for texdocx operations.
pub type Result<T> = std::result::Result<T, Error>;
