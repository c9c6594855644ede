//! Common types and utilities shared across the pipeline.
//!
//! This module provides the unified error type and the escaping helpers used
//! by the preview renderer, the OMML bridge, and the DOCX writer alike.

// Submodule declarations
pub mod error;
pub mod xml;

// Re-exports for convenience
pub use error::{Error, Result};
