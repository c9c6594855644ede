//! Mutable document writer components for DOCX.
//!
//! A small writer API: documents hold paragraphs, paragraphs hold text runs.

pub mod doc;
pub mod paragraph;
pub mod run;
pub mod style;

pub use doc::{CoreProperties, DEFAULT_FONT, DEFAULT_FONT_SIZE, MutableDocument};
pub use paragraph::MutableParagraph;
pub use run::MutableRun;
pub use style::generate_styles_xml;
