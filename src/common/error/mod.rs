//! Unified error types for texdocx.
//!
//! This module provides a unified error type that encompasses errors from
//! formula conversion and DOCX packaging, presenting a consistent API to users.

// Submodule declarations
pub mod types;
pub mod conversions;

// Re-exports
pub use types::{Error, Result};
