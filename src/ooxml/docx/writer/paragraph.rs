/// Paragraph types and implementation for DOCX documents.
use crate::ooxml::error::{OoxmlError, Result};
use std::fmt::Write as FmtWrite;

pub use super::super::format::ParagraphAlignment;
use super::run::MutableRun;

/// A mutable paragraph in a document.
#[derive(Debug, Clone, Default)]
pub struct MutableParagraph {
    pub(crate) runs: Vec<MutableRun>,
    pub(crate) alignment: Option<ParagraphAlignment>,
}

impl MutableParagraph {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Add a new run to the paragraph.
    pub fn add_run(&mut self) -> &mut MutableRun {
        self.runs.push(MutableRun::new());
        let last = self.runs.len() - 1;
        &mut self.runs[last]
    }

    /// Add a run with text.
    pub fn add_run_with_text(&mut self, text: &str) -> &mut MutableRun {
        let run = self.add_run();
        run.set_text(text);
        run
    }

    /// Set paragraph alignment.
    pub fn set_alignment(&mut self, alignment: ParagraphAlignment) {
        self.alignment = Some(alignment);
    }

    /// Get the number of runs.
    pub fn run_count(&self) -> usize {
        self.runs.len()
    }

    pub(crate) fn to_xml(&self, xml: &mut String) -> Result<()> {
        xml.push_str("<w:p>");
        if let Some(alignment) = self.alignment {
            write!(xml, "<w:pPr><w:jc w:val=\"{}\"/></w:pPr>", alignment.as_str())
                .map_err(|e| OoxmlError::Xml(e.to_string()))?;
        }
        for run in &self.runs {
            run.to_xml(xml)?;
        }
        xml.push_str("</w:p>");
        Ok(())
    }
}
