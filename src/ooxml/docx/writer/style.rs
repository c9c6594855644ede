/// Style part generation for DOCX documents.
use crate::common::xml::escape_xml;
use crate::ooxml::error::{OoxmlError, Result};
use crate::ooxml::opc::constants::namespace;
use std::fmt::Write as FmtWrite;

/// Generate `word/styles.xml` with document defaults and a `Normal` style.
///
/// `font_size` is in half-points, as WordprocessingML stores it.
pub fn generate_styles_xml(font_name: &str, font_size: u32) -> Result<String> {
    let mut xml = String::with_capacity(1024);
    let font = escape_xml(font_name);

    xml.push_str(r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#);
    write!(xml, r#"<w:styles xmlns:w="{}">"#, namespace::WML_MAIN)
        .map_err(|e| OoxmlError::Xml(e.to_string()))?;

    xml.push_str("<w:docDefaults>");
    xml.push_str("<w:rPrDefault><w:rPr>");
    write!(
        xml,
        r#"<w:rFonts w:ascii="{0}" w:hAnsi="{0}" w:cs="{0}"/><w:sz w:val="{1}"/><w:szCs w:val="{1}"/>"#,
        font, font_size
    )
    .map_err(|e| OoxmlError::Xml(e.to_string()))?;
    xml.push_str("</w:rPr></w:rPrDefault>");
    xml.push_str(r#"<w:pPrDefault><w:pPr><w:spacing w:after="160" w:line="259" w:lineRule="auto"/></w:pPr></w:pPrDefault>"#);
    xml.push_str("</w:docDefaults>");

    xml.push_str(r#"<w:style w:type="paragraph" w:default="1" w:styleId="Normal"><w:name w:val="Normal"/><w:qFormat/></w:style>"#);
    xml.push_str("</w:styles>");

    Ok(xml)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_styles_defaults() {
        let xml = generate_styles_xml("Times New Roman", 24).unwrap();
        assert!(xml.contains(r#"w:ascii="Times New Roman""#));
        assert!(xml.contains(r#"<w:sz w:val="24"/>"#));
        assert!(xml.contains(r#"w:styleId="Normal""#));
        assert!(xml.ends_with("</w:styles>"));
    }

    #[test]
    fn test_font_name_escaped() {
        let xml = generate_styles_xml("A&B", 22).unwrap();
        assert!(xml.contains("A&amp;B"));
    }
}
