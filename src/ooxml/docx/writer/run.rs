/// Run types and implementation for DOCX documents.
use crate::common::xml::escape_xml;
use crate::ooxml::error::Result;

/// A mutable run.
///
/// Runs carry a single piece of text; character formatting comes from the
/// document defaults in `styles.xml`.
#[derive(Debug, Clone, Default)]
pub struct MutableRun {
    pub(crate) text: String,
}

impl MutableRun {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Set the text content.
    pub fn set_text(&mut self, text: &str) {
        self.text = text.to_string();
    }

    pub(crate) fn to_xml(&self, xml: &mut String) -> Result<()> {
        // Leading/trailing whitespace is dropped by Word unless preserved
        if self.text.starts_with(char::is_whitespace) || self.text.ends_with(char::is_whitespace) {
            xml.push_str(r#"<w:r><w:t xml:space="preserve">"#);
        } else {
            xml.push_str("<w:r><w:t>");
        }
        xml.push_str(&escape_xml(&self.text));
        xml.push_str("</w:t></w:r>");
        Ok(())
    }
}
