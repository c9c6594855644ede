//! Package writer for OPC packages.
//!
//! Collects parts with their content types and relationships, then
//! serializes `[Content_Types].xml`, the `.rels` parts and the parts
//! themselves into a ZIP container.

use crate::common::xml::escape_xml;
use crate::ooxml::opc::constants::{content_type as ct, namespace};
use crate::ooxml::opc::error::{OpcError, Result};
use crate::ooxml::opc::packuri::{CONTENT_TYPES_URI, PACKAGE_URI, PackURI};
use crate::ooxml::opc::phys_pkg::PhysPkgWriter;
use std::collections::BTreeMap;

/// A relationship from a source (the package or a part) to a target part.
#[derive(Debug, Clone)]
struct Relationship {
    r_id: String,
    reltype: &'static str,
    target_ref: String,
}

#[derive(Debug)]
struct PartEntry {
    partname: PackURI,
    content_type: &'static str,
    blob: Vec<u8>,
    rels: Vec<Relationship>,
}

/// In-memory OPC package builder.
///
/// # Example
///
/// ```
/// use texdocx::ooxml::opc::PackageWriter;
/// use texdocx::ooxml::opc::constants::{content_type, relationship_type};
///
/// let mut pkg = PackageWriter::new();
/// pkg.add_part("/word/document.xml", content_type::WML_DOCUMENT_MAIN, b"<w:document/>".to_vec())?;
/// pkg.relate_package(relationship_type::OFFICE_DOCUMENT, "word/document.xml");
/// let bytes = pkg.to_bytes()?;
/// assert_eq!(&bytes[..2], b"PK");
/// # Ok::<(), texdocx::ooxml::opc::error::OpcError>(())
/// ```
#[derive(Debug, Default)]
pub struct PackageWriter {
    parts: Vec<PartEntry>,
    package_rels: Vec<Relationship>,
}

impl PackageWriter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a part. Part names must be absolute and unique.
    pub fn add_part(
        &mut self,
        partname: &str,
        content_type: &'static str,
        blob: Vec<u8>,
    ) -> Result<()> {
        let partname = PackURI::new(partname).map_err(OpcError::InvalidPackUri)?;
        if self.parts.iter().any(|p| p.partname == partname) {
            return Err(OpcError::InvalidPackUri(format!("duplicate part {}", partname)));
        }
        self.parts.push(PartEntry {
            partname,
            content_type,
            blob,
            rels: Vec::new(),
        });
        Ok(())
    }

    /// Add a package-level relationship and return its id.
    pub fn relate_package(&mut self, reltype: &'static str, target_ref: &str) -> String {
        push_relationship(&mut self.package_rels, reltype, target_ref)
    }

    /// Add a relationship from an existing part and return its id.
    pub fn relate_part(
        &mut self,
        source: &str,
        reltype: &'static str,
        target_ref: &str,
    ) -> Result<String> {
        let part = self
            .parts
            .iter_mut()
            .find(|p| p.partname.as_str() == source)
            .ok_or_else(|| OpcError::PartNotFound(source.to_string()))?;
        Ok(push_relationship(&mut part.rels, reltype, target_ref))
    }

    /// Serialize the package to ZIP bytes.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let mut phys_writer = PhysPkgWriter::new();

        let content_types_uri = PackURI::new(CONTENT_TYPES_URI).map_err(OpcError::InvalidPackUri)?;
        let cti = ContentTypesItem::from_parts(&self.parts);
        phys_writer.write(&content_types_uri, cti.to_xml().as_bytes())?;

        let package_uri = PackURI::new(PACKAGE_URI).map_err(OpcError::InvalidPackUri)?;
        let rels_uri = package_uri.rels_uri().map_err(OpcError::InvalidPackUri)?;
        phys_writer.write(&rels_uri, rels_xml(&self.package_rels).as_bytes())?;

        for part in &self.parts {
            phys_writer.write(&part.partname, &part.blob)?;
            if !part.rels.is_empty() {
                let rels_uri = part.partname.rels_uri().map_err(OpcError::InvalidPackUri)?;
                phys_writer.write(&rels_uri, rels_xml(&part.rels).as_bytes())?;
            }
        }

        phys_writer.finish()
    }
}

fn push_relationship(rels: &mut Vec<Relationship>, reltype: &'static str, target_ref: &str) -> String {
    let r_id = format!("rId{}", rels.len() + 1);
    rels.push(Relationship {
        r_id: r_id.clone(),
        reltype,
        target_ref: target_ref.to_string(),
    });
    r_id
}

fn rels_xml(rels: &[Relationship]) -> String {
    let mut xml = String::with_capacity(256 + rels.len() * 160);
    xml.push_str(r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#);
    xml.push('\n');
    xml.push_str(r#"<Relationships xmlns=""#);
    xml.push_str(namespace::OPC_RELATIONSHIPS);
    xml.push_str(r#"">"#);
    for rel in rels {
        xml.push_str(&format!(
            r#"<Relationship Id="{}" Type="{}" Target="{}"/>"#,
            escape_xml(&rel.r_id),
            escape_xml(rel.reltype),
            escape_xml(&rel.target_ref)
        ));
    }
    xml.push_str("</Relationships>");
    xml
}

/// Helper for building [Content_Types].xml content.
struct ContentTypesItem {
    /// Default content types by extension
    defaults: BTreeMap<String, &'static str>,
    /// Override content types by partname
    overrides: BTreeMap<String, &'static str>,
}

impl ContentTypesItem {
    fn from_parts(parts: &[PartEntry]) -> Self {
        let mut defaults = BTreeMap::new();
        defaults.insert("rels".to_string(), ct::OPC_RELATIONSHIPS);
        defaults.insert("xml".to_string(), ct::XML);

        let mut overrides = BTreeMap::new();
        for part in parts {
            let ext = part.partname.ext();
            if defaults.get(ext) == Some(&part.content_type) {
                continue;
            }
            overrides.insert(part.partname.to_string(), part.content_type);
        }

        Self { defaults, overrides }
    }

    fn to_xml(&self) -> String {
        let mut xml = String::with_capacity(1024);
        xml.push_str(r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#);
        xml.push('\n');
        xml.push_str(r#"<Types xmlns=""#);
        xml.push_str(namespace::OPC_CONTENT_TYPES);
        xml.push_str(r#"">"#);

        for (ext, content_type) in &self.defaults {
            xml.push_str(&format!(
                r#"<Default Extension="{}" ContentType="{}"/>"#,
                escape_xml(ext),
                escape_xml(content_type)
            ));
        }
        for (partname, content_type) in &self.overrides {
            xml.push_str(&format!(
                r#"<Override PartName="{}" ContentType="{}"/>"#,
                escape_xml(partname),
                escape_xml(content_type)
            ));
        }

        xml.push_str("</Types>");
        xml
    }
}
