//! Office Open XML (OOXML) output.
//!
//! Two layers:
//!
//! 1. **OPC Layer** (`opc`): part names, content types, relationships and
//!    the ZIP container
//! 2. **WordprocessingML** (`docx`): the document, paragraph and run writer
//!
//! # Example
//!
//! ```rust
//! use texdocx::ooxml::docx::MutableDocument;
//!
//! let mut doc = MutableDocument::new();
//! doc.add_paragraph().add_run_with_text("Plain text");
//! let bytes = doc.to_bytes()?;
//! assert_eq!(&bytes[..2], b"PK");
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
pub mod docx;
pub mod error;
pub mod opc;

// Re-export error types
pub use error::{OoxmlError, Result};
