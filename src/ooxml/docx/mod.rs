//! Word (.docx) document support.
//!
//! Writing only: [`writer::MutableDocument`] produces a complete
//! WordprocessingML package from paragraphs of text runs.
//!
//! # Example
//!
//! ```rust
//! use texdocx::ooxml::docx::{MutableDocument, ParagraphAlignment};
//!
//! let mut doc = MutableDocument::new();
//! let para = doc.add_paragraph();
//! para.set_alignment(ParagraphAlignment::Center);
//! para.add_run_with_text("Hello");
//! let bytes = doc.to_bytes()?;
//! assert!(!bytes.is_empty());
//! # Ok::<(), texdocx::ooxml::OoxmlError>(())
//! ```
pub mod format;
pub mod writer;

pub use format::ParagraphAlignment;
pub use writer::{MutableDocument, MutableParagraph, MutableRun};
