//! Container post-processing: splice OMML fragments over placeholder runs.
//!
//! The document builder writes each placeholder token as an ordinary
//! `w:r`/`w:t` run. This pass opens the serialized package, finds every run
//! whose only text is a registered token, replaces the whole run with the raw
//! fragment and re-zips. Any failure leaves the container untouched.

use super::placeholder::PlaceholderMap;
use crate::ooxml::opc::constants::{namespace, relationship_type as rt};
use crate::ooxml::opc::error::OpcError;
use crate::ooxml::opc::packuri::PACKAGE_URI;
use crate::ooxml::opc::{PackURI, PhysPkgReader, PhysPkgWriter, rel};
use bytes::Bytes;
use quick_xml::NsReader;
use quick_xml::events::{BytesStart, Event};
use quick_xml::name::{Namespace, ResolveResult};
use std::ops::Range;
use thiserror::Error;

/// Conventional body part name, used when the package relationship is absent
const DEFAULT_BODY_PART: &str = "/word/document.xml";

/// Reasons substitution could not run. Logged, never returned to callers.
#[derive(Error, Debug)]
pub enum PostProcessError {
    /// The container or one of its parts could not be read or rewritten
    #[error("package error: {0}")]
    Package(#[from] OpcError),

    /// The body part is not UTF-8
    #[error("document body is not UTF-8: {0}")]
    Encoding(#[from] std::string::FromUtf8Error),

    /// The body part is not well-formed XML
    #[error("document body XML error at {position}: {message}")]
    Xml { position: usize, message: String },
}

/// Replace placeholder runs in `container` with their OMML fragments.
///
/// Returns `container` itself when `placeholders` is empty, when no token
/// is found, or when the body part cannot be located or parsed.
pub fn substitute(container: Bytes, placeholders: &PlaceholderMap) -> Bytes {
    if placeholders.is_empty() {
        return container;
    }

    match try_substitute(&container, placeholders) {
        Ok(Some(patched)) => Bytes::from(patched),
        Ok(None) => container,
        Err(e) => {
            tracing::warn!(error = %e, "math substitution skipped, document returned unchanged");
            container
        },
    }
}

/// Returns `None` when the body holds none of the tokens.
fn try_substitute(
    container: &[u8],
    placeholders: &PlaceholderMap,
) -> Result<Option<Vec<u8>>, PostProcessError> {
    let mut reader = PhysPkgReader::new(container)?;
    let body_uri = locate_body(&mut reader)?;
    let body = String::from_utf8(reader.blob_for(&body_uri)?)?;

    let (patched, replaced) = splice_runs(&body, placeholders)?;
    if replaced < placeholders.len() {
        tracing::warn!(
            expected = placeholders.len(),
            replaced,
            part = %body_uri,
            "placeholder tokens missing from document body"
        );
    }
    if replaced == 0 {
        return Ok(None);
    }

    let mut writer = PhysPkgWriter::new();
    reader.copy_into(&mut writer, Some((&body_uri, patched.as_bytes())))?;
    Ok(Some(writer.finish()?))
}

/// Find the main document part through the package `officeDocument` relationship.
fn locate_body(reader: &mut PhysPkgReader<'_>) -> Result<PackURI, PostProcessError> {
    let package_uri = PackURI::new(PACKAGE_URI).map_err(OpcError::InvalidPackUri)?;

    if let Some(rels) = reader.rels_xml_for(&package_uri)?
        && let Some(target) = rel::find_target(&rels, rt::OFFICE_DOCUMENT)?
    {
        let uri = PackURI::from_rel_ref(package_uri.base_uri(), &target)
            .map_err(OpcError::InvalidPackUri)?;
        if reader.contains(&uri) {
            return Ok(uri);
        }
        tracing::debug!(part = %uri, "officeDocument target missing from package");
    }

    let fallback = PackURI::new(DEFAULT_BODY_PART).map_err(OpcError::InvalidPackUri)?;
    if reader.contains(&fallback) {
        Ok(fallback)
    } else {
        Err(OpcError::PartNotFound(fallback.to_string()).into())
    }
}

/// State of the `w:r` element currently being scanned.
struct RunScan {
    start: usize,
    depth: usize,
    /// Depth of the open `w:t`, if any
    text_depth: Option<usize>,
    text_elements: usize,
    text: String,
    has_reference: bool,
}

impl RunScan {
    fn new(start: usize) -> Self {
        Self {
            start,
            depth: 1,
            text_depth: None,
            text_elements: 0,
            text: String::new(),
            has_reference: false,
        }
    }

    /// The run's text, if it is exactly one plain `w:t`.
    fn sole_text(&self) -> Option<&str> {
        (self.text_elements == 1 && !self.has_reference).then_some(self.text.as_str())
    }
}

fn is_wml(ns: &ResolveResult<'_>, start: &BytesStart<'_>, local: &[u8]) -> bool {
    matches!(ns, ResolveResult::Bound(Namespace(uri)) if *uri == namespace::WML_MAIN.as_bytes())
        && start.local_name().as_ref() == local
}

/// Rewrite `body`, replacing each placeholder run with its fragment.
///
/// Returns the new body and the number of runs replaced.
fn splice_runs(body: &str, placeholders: &PlaceholderMap) -> Result<(String, usize), PostProcessError> {
    let mut reader = NsReader::from_str(body);
    reader.config_mut().trim_text(false);

    let mut replacements: Vec<(Range<usize>, &str)> = Vec::new();
    let mut run: Option<RunScan> = None;

    loop {
        let position = reader.buffer_position() as usize;
        let (ns, event) = reader.read_resolved_event().map_err(|e| PostProcessError::Xml {
            position,
            message: e.to_string(),
        })?;

        let Some(scan) = run.as_mut() else {
            match event {
                Event::Start(ref e) if is_wml(&ns, e, b"r") => run = Some(RunScan::new(position)),
                Event::Eof => break,
                _ => {},
            }
            continue;
        };

        match event {
            Event::Start(ref e) => {
                scan.depth += 1;
                if is_wml(&ns, e, b"t") {
                    scan.text_elements += 1;
                    scan.text_depth = Some(scan.depth);
                }
            },
            Event::Empty(ref e) if is_wml(&ns, e, b"t") => scan.text_elements += 1,
            Event::Text(ref t) if scan.text_depth.is_some() => {
                let raw = std::str::from_utf8(t).map_err(|e| PostProcessError::Xml {
                    position,
                    message: e.to_string(),
                })?;
                scan.text.push_str(raw);
            },
            Event::GeneralRef(_) if scan.text_depth.is_some() => scan.has_reference = true,
            Event::End(_) => {
                if scan.text_depth == Some(scan.depth) {
                    scan.text_depth = None;
                }
                scan.depth -= 1;
                if scan.depth == 0 {
                    let end = reader.buffer_position() as usize;
                    if let Some(fragment) = scan.sole_text().and_then(|text| placeholders.get(text)) {
                        replacements.push((scan.start..end, fragment));
                    }
                    run = None;
                }
            },
            Event::Eof => break,
            _ => {},
        }
    }

    let mut out = String::with_capacity(body.len() + replacements.iter().map(|(_, f)| f.len()).sum::<usize>());
    let mut last = 0;
    for (range, fragment) in &replacements {
        out.push_str(&body[last..range.start]);
        out.push_str(fragment);
        last = range.end;
    }
    out.push_str(&body[last..]);

    Ok((out, replacements.len()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::export::placeholder::{TOKEN_START, token};
    use crate::ooxml::opc::PackageWriter;
    use crate::ooxml::opc::constants::content_type as ct;

    const W: &str = r#"xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main""#;

    fn map(fragments: &[&str]) -> PlaceholderMap {
        let mut map = PlaceholderMap::new();
        for fragment in fragments {
            map.register(fragment.to_string());
        }
        map
    }

    fn package(body_part: &str, target: Option<&str>, body: &str) -> Bytes {
        let mut pkg = PackageWriter::new();
        pkg.add_part(body_part, ct::WML_DOCUMENT_MAIN, body.as_bytes().to_vec())
            .unwrap();
        if let Some(target) = target {
            pkg.relate_package(rt::OFFICE_DOCUMENT, target);
        }
        Bytes::from(pkg.to_bytes().unwrap())
    }

    fn body_of(container: &[u8], part: &str) -> String {
        let mut reader = PhysPkgReader::new(container).unwrap();
        String::from_utf8(reader.blob_for(&PackURI::new(part).unwrap()).unwrap()).unwrap()
    }

    #[test]
    fn test_splice_replaces_whole_run() {
        let body = format!(
            r#"<w:document {W}><w:body><w:p><w:r><w:t xml:space="preserve">a </w:t></w:r><w:r><w:rPr><w:sz w:val="24"/></w:rPr><w:t>{}</w:t></w:r></w:p></w:body></w:document>"#,
            token(0)
        );
        let (out, replaced) = splice_runs(&body, &map(&["<m:oMath/>"])).unwrap();
        assert_eq!(replaced, 1);
        assert!(out.contains(r#"<w:t xml:space="preserve">a </w:t></w:r><m:oMath/></w:p>"#));
        assert!(!out.contains(TOKEN_START));
    }

    #[test]
    fn test_partial_text_is_not_replaced() {
        let body = format!(
            r#"<w:document {W}><w:body><w:p><w:r><w:t>x{}</w:t></w:r><w:r><w:t>{}</w:t><w:t>y</w:t></w:r></w:p></w:body></w:document>"#,
            token(0),
            token(0)
        );
        let (out, replaced) = splice_runs(&body, &map(&["<m:oMath/>"])).unwrap();
        assert_eq!(replaced, 0);
        assert_eq!(out, body);
    }

    #[test]
    fn test_other_namespaces_ignored() {
        let body = format!(
            r#"<w:document {W} xmlns:x="urn:other"><w:body><w:p><x:r><x:t>{}</x:t></x:r></w:p></w:body></w:document>"#,
            token(0)
        );
        let (_, replaced) = splice_runs(&body, &map(&["<m:oMath/>"])).unwrap();
        assert_eq!(replaced, 0);
    }

    #[test]
    fn test_empty_map_is_identity() {
        let container = Bytes::from_static(b"not even a zip");
        let out = substitute(container.clone(), &PlaceholderMap::new());
        assert_eq!(out.as_ptr(), container.as_ptr());
    }

    #[test]
    fn test_unreadable_container_returned_unchanged() {
        let container = Bytes::from_static(b"not even a zip");
        let out = substitute(container.clone(), &map(&["<m:oMath/>"]));
        assert_eq!(out, container);
    }

    #[test]
    fn test_missing_body_returned_unchanged() {
        let mut pkg = PackageWriter::new();
        pkg.add_part("/word/styles.xml", ct::WML_STYLES, b"<w:styles/>".to_vec())
            .unwrap();
        let container = Bytes::from(pkg.to_bytes().unwrap());
        let out = substitute(container.clone(), &map(&["<m:oMath/>"]));
        assert_eq!(out, container);
    }

    #[test]
    fn test_malformed_body_returned_unchanged() {
        let container = package("/word/document.xml", Some("word/document.xml"), "<w:document></w:body>");
        let out = substitute(container.clone(), &map(&["<m:oMath/>"]));
        assert_eq!(out, container);
    }

    #[test]
    fn test_body_found_through_relationship() {
        let body = format!(r#"<w:document {W}><w:body><w:p><w:r><w:t>{}</w:t></w:r></w:p></w:body></w:document>"#, token(0));
        let container = package("/word/main.xml", Some("word/main.xml"), &body);
        let out = substitute(container, &map(&["<m:oMath>f</m:oMath>"]));
        let patched = body_of(&out, "/word/main.xml");
        assert!(patched.contains("<w:p><m:oMath>f</m:oMath></w:p>"));
    }

    #[test]
    fn test_body_fallback_without_relationship() {
        let body = format!(r#"<w:document {W}><w:body><w:p><w:r><w:t>{}</w:t></w:r></w:p></w:body></w:document>"#, token(0));
        let container = package("/word/document.xml", None, &body);
        let out = substitute(container, &map(&["<m:oMath/>"]));
        assert!(!body_of(&out, "/word/document.xml").contains(TOKEN_START));
    }

    #[test]
    fn test_other_parts_preserved() {
        let body = format!(r#"<w:document {W}><w:body><w:p><w:r><w:t>{}</w:t></w:r></w:p></w:body></w:document>"#, token(0));
        let mut pkg = PackageWriter::new();
        pkg.add_part("/word/document.xml", ct::WML_DOCUMENT_MAIN, body.into_bytes())
            .unwrap();
        pkg.add_part("/word/styles.xml", ct::WML_STYLES, b"<w:styles/>".to_vec())
            .unwrap();
        pkg.relate_package(rt::OFFICE_DOCUMENT, "word/document.xml");
        let container = Bytes::from(pkg.to_bytes().unwrap());

        let out = substitute(container.clone(), &map(&["<m:oMath/>"]));
        let before = PhysPkgReader::new(&container).unwrap().member_names();
        let after = PhysPkgReader::new(&out).unwrap().member_names();
        assert_eq!(before, after);
        assert_eq!(body_of(&out, "/word/styles.xml"), "<w:styles/>");
    }
}
