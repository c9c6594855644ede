//! Texdocx - prose with embedded LaTeX math to live previews and Word documents
//!
//! Input is plain UTF-8 text where `$…$` marks an inline formula and `$$…$$`
//! a block formula. From it this library produces:
//!
//! - **Preview markup**: HTML with MathML formulas in containers that keep
//!   the original source for copy actions
//! - **Word documents**: `.docx` packages whose formulas are native Office
//!   Math (OMML), not images
//! - **Clipboard payloads**: the whole text with MathML inline, or a single
//!   formula as an OMML fragment
//!
//! Formulas that cannot be converted never abort anything: the preview marks
//! them as errors and the document keeps their source as plain text.
//!
//! # Example - Live preview
//!
//! ```
//! use texdocx::formula::LatexRenderer;
//! use texdocx::{preview, segment};
//!
//! let spans = segment::segment("The area is $\\pi r^2$.");
//! let html = preview::render(&spans, &LatexRenderer);
//! assert!(html.contains(r#"data-latex="\pi r^2""#));
//! ```
//!
//! # Example - Word export
//!
//! ```
//! use texdocx::export::{ExportOptions, export_docx};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let options = ExportOptions::new().with_title("Circles");
//! let docx = export_docx("The area is\n\n$$A = \\pi r^2$$", &options)?;
//! // std::fs::write("circles.docx", &docx)?;
//! assert_eq!(&docx[..2], b"PK");
//! # Ok(())
//! # }
//! ```
//!
//! # Example - Custom converters
//!
//! The formula renderer, the notation bridge and the document builder are
//! traits; closures work as converters.
//!
//! ```
//! use texdocx::export::{DocxBuilder, Exporter};
//! use texdocx::formula::{FormulaError, OmmlBridge};
//!
//! let renderer = |latex: &str, _display: bool| -> Result<String, FormulaError> {
//!     Ok(format!("<math><mi>{latex}</mi></math>"))
//! };
//! let exporter = Exporter::with_parts(renderer, OmmlBridge, DocxBuilder::default());
//! let docx = exporter.export("Let $x$ be given.")?;
//! assert!(!docx.is_empty());
//! # Ok::<(), texdocx::Error>(())
//! ```

/// Common types and utilities
pub mod common;

/// Splitting input into text and formula spans
pub mod segment;

/// Formula converters: LaTeX → MathML → OMML
pub mod formula;

/// HTML preview rendering
pub mod preview;

/// Word export pipeline
pub mod export;

/// OOXML (Office Open XML) package and WordprocessingML writing
///
/// Only the pieces export needs: the OPC zip layer and a small DOCX writer.
pub mod ooxml;

/// Clipboard payloads
pub mod clipboard;

// Re-export commonly used types for convenience
pub use common::{Error, Result};
pub use export::{ExportOptions, Exporter, export_docx};
pub use formula::{FormulaError, FormulaRenderer, LatexRenderer, MathNotationBridge, OmmlBridge};
pub use preview::{FormulaRef, PreviewOptions};
pub use segment::Span;
