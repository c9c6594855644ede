//! Relationship part lookups.

use crate::common::xml::unescape_xml;
use crate::ooxml::opc::error::{OpcError, Result};
use quick_xml::Reader;
use quick_xml::events::Event;

/// `Target` of the first relationship of type `reltype` in a `.rels` part.
///
/// External relationships are skipped since they do not point into the
/// package.
pub fn find_target(rels_xml: &[u8], reltype: &str) -> Result<Option<String>> {
    let mut reader = Reader::from_reader(rels_xml);
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(ref e) | Event::Empty(ref e) if e.local_name().as_ref() == b"Relationship" => {
                let mut rel_type = None;
                let mut target = None;
                let mut external = false;

                for attr in e.attributes() {
                    let attr = attr.map_err(|e| OpcError::XmlError(e.to_string()))?;
                    let value = unescape_xml(&String::from_utf8_lossy(&attr.value));
                    match attr.key.local_name().as_ref() {
                        b"Type" => rel_type = Some(value),
                        b"Target" => target = Some(value),
                        b"TargetMode" => external = value == "External",
                        _ => {},
                    }
                }

                if !external && rel_type.as_deref() == Some(reltype) {
                    return Ok(target);
                }
            },
            Event::Eof => return Ok(None),
            _ => {},
        }
        buf.clear();
    }
}
