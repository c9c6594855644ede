/// Document writer implementation for DOCX.
use crate::common::xml::escape_xml;
use crate::ooxml::error::{OoxmlError, Result};
use crate::ooxml::opc::PackageWriter;
use crate::ooxml::opc::constants::{content_type as ct, namespace, relationship_type as rt};
use chrono::{DateTime, SecondsFormat, Utc};
use std::fmt::Write as FmtWrite;

use super::paragraph::MutableParagraph;
use super::style::generate_styles_xml;

/// Default body font
pub const DEFAULT_FONT: &str = "Calibri";
/// Default body font size in points
pub const DEFAULT_FONT_SIZE: f64 = 11.0;

/// Package-level metadata written to `docProps/core.xml`.
#[derive(Debug, Clone, Default)]
pub struct CoreProperties {
    pub title: Option<String>,
    pub creator: Option<String>,
    pub created: Option<DateTime<Utc>>,
}

impl CoreProperties {
    /// Whether any property has a value.
    pub fn is_set(&self) -> bool {
        self.title.is_some() || self.creator.is_some() || self.created.is_some()
    }
}

/// A mutable Word document for writing.
///
/// Holds the body paragraphs plus the document-wide defaults needed to emit
/// a minimal, valid WordprocessingML package.
#[derive(Debug, Clone)]
pub struct MutableDocument {
    paragraphs: Vec<MutableParagraph>,
    core: CoreProperties,
    font_name: String,
    /// Half-points
    font_size: u32,
}

impl MutableDocument {
    /// Create a new empty mutable document.
    pub fn new() -> Self {
        Self {
            paragraphs: Vec::new(),
            core: CoreProperties::default(),
            font_name: DEFAULT_FONT.to_string(),
            font_size: (DEFAULT_FONT_SIZE * 2.0) as u32,
        }
    }

    /// Add a new paragraph to the end of the document.
    pub fn add_paragraph(&mut self) -> &mut MutableParagraph {
        self.paragraphs.push(MutableParagraph::new());
        let last = self.paragraphs.len() - 1;
        &mut self.paragraphs[last]
    }

    /// Get the number of paragraphs in the document.
    pub fn paragraph_count(&self) -> usize {
        self.paragraphs.len()
    }

    /// Get a mutable reference to the core properties.
    pub fn core_properties_mut(&mut self) -> &mut CoreProperties {
        &mut self.core
    }

    /// Set the default body font.
    pub fn set_default_font(&mut self, font_name: &str) {
        self.font_name = font_name.to_string();
    }

    /// Set the default body font size in points.
    pub fn set_default_font_size(&mut self, points: f64) {
        self.font_size = (points * 2.0).round() as u32;
    }

    /// Serialize `word/document.xml`.
    pub fn to_xml(&self) -> Result<String> {
        let mut xml = String::with_capacity(1024 + self.paragraphs.len() * 128);
        xml.push_str(r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#);
        write!(
            xml,
            r#"<w:document xmlns:w="{}" xmlns:r="{}">"#,
            namespace::WML_MAIN,
            namespace::OFC_RELATIONSHIPS
        )
        .map_err(|e| OoxmlError::Xml(e.to_string()))?;
        xml.push_str("<w:body>");
        for para in &self.paragraphs {
            para.to_xml(&mut xml)?;
        }
        // US Letter with one-inch margins; sectPr must close the body
        xml.push_str(r#"<w:sectPr><w:pgSz w:w="12240" w:h="15840"/><w:pgMar w:top="1440" w:right="1440" w:bottom="1440" w:left="1440" w:header="720" w:footer="720" w:gutter="0"/></w:sectPr>"#);
        xml.push_str("</w:body></w:document>");
        Ok(xml)
    }

    /// Serialize `docProps/core.xml`.
    fn core_xml(&self) -> Result<String> {
        let mut xml = String::with_capacity(512);
        xml.push_str(r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#);
        write!(
            xml,
            r#"<cp:coreProperties xmlns:cp="{}" xmlns:dc="http://purl.org/dc/elements/1.1/" xmlns:dcterms="http://purl.org/dc/terms/" xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance">"#,
            namespace::OPC_CORE_PROPERTIES
        )
        .map_err(|e| OoxmlError::Xml(e.to_string()))?;
        if let Some(ref title) = self.core.title {
            write!(xml, "<dc:title>{}</dc:title>", escape_xml(title))
                .map_err(|e| OoxmlError::Xml(e.to_string()))?;
        }
        if let Some(ref creator) = self.core.creator {
            write!(xml, "<dc:creator>{}</dc:creator>", escape_xml(creator))
                .map_err(|e| OoxmlError::Xml(e.to_string()))?;
        }
        if let Some(created) = self.core.created {
            let stamp = created.to_rfc3339_opts(SecondsFormat::Secs, true);
            write!(
                xml,
                r#"<dcterms:created xsi:type="dcterms:W3CDTF">{0}</dcterms:created><dcterms:modified xsi:type="dcterms:W3CDTF">{0}</dcterms:modified>"#,
                stamp
            )
            .map_err(|e| OoxmlError::Xml(e.to_string()))?;
        }
        xml.push_str("</cp:coreProperties>");
        Ok(xml)
    }

    /// Serialize the whole package to `.docx` bytes.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let mut pkg = PackageWriter::new();

        pkg.add_part("/word/document.xml", ct::WML_DOCUMENT_MAIN, self.to_xml()?.into_bytes())?;
        pkg.add_part(
            "/word/styles.xml",
            ct::WML_STYLES,
            generate_styles_xml(&self.font_name, self.font_size)?.into_bytes(),
        )?;
        pkg.relate_package(rt::OFFICE_DOCUMENT, "word/document.xml");
        pkg.relate_part("/word/document.xml", rt::STYLES, "styles.xml")?;

        if self.core.is_set() {
            pkg.add_part("/docProps/core.xml", ct::OPC_CORE_PROPERTIES, self.core_xml()?.into_bytes())?;
            pkg.relate_package(rt::CORE_PROPERTIES, "docProps/core.xml");
        }

        Ok(pkg.to_bytes()?)
    }
}

impl Default for MutableDocument {
    fn default() -> Self {
        Self::new()
    }
}
