//! XML and HTML escaping helpers.

mod escape;

pub use escape::{escape_attr, escape_html, escape_xml, resolve_entity, unescape_xml};
