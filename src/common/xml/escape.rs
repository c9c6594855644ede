use aho_corasick::{AhoCorasick, MatchKind};
use once_cell::sync::Lazy;

// Static initialization: automatons are built only once, thread-safe
static XML_ESCAPER: Lazy<AhoCorasick> = Lazy::new(|| {
    AhoCorasick::builder()
        .build(["&", "<", ">", "\"", "'"])
        .expect("Failed to build XML escaper")
});

static HTML_TEXT_ESCAPER: Lazy<AhoCorasick> = Lazy::new(|| {
    AhoCorasick::builder()
        .build(["&", "<", ">"])
        .expect("Failed to build HTML text escaper")
});

// Use LeftmostLongest to ensure longer entities are matched first (e.g., &amp; instead of &lt;)
static XML_UNESCAPER: Lazy<AhoCorasick> = Lazy::new(|| {
    AhoCorasick::builder()
        .match_kind(MatchKind::LeftmostLongest)
        .build(["&amp;", "&lt;", "&gt;", "&quot;", "&apos;"])
        .expect("Failed to build XML unescaper")
});

/// Escape XML special characters.
///
/// Characters XML 1.0 forbids (C0 controls other than tab, newline and
/// carriage return, U+FFFE, U+FFFF) become U+FFFD.
///
/// # Examples
///
/// ```
/// use texdocx::common::xml::escape_xml;
/// assert_eq!(escape_xml("a & b"), "a &amp; b");
/// assert_eq!(escape_xml("<tag>\"hello\"</tag>"), "&lt;tag&gt;&quot;hello&quot;&lt;/tag&gt;");
/// ```
pub fn escape_xml(s: &str) -> String {
    let escaped = XML_ESCAPER.replace_all(s, &["&amp;", "&lt;", "&gt;", "&quot;", "&apos;"]);
    if escaped.chars().all(is_xml_char) {
        return escaped;
    }
    escaped
        .chars()
        .map(|c| if is_xml_char(c) { c } else { '\u{FFFD}' })
        .collect()
}

/// Whether `c` may appear in an XML 1.0 document.
#[inline]
fn is_xml_char(c: char) -> bool {
    matches!(c, '\t' | '\n' | '\r' | '\u{20}'..='\u{FFFD}' | '\u{10000}'..='\u{10FFFF}')
}

/// Escape text content for HTML (`&`, `<`, `>` only).
///
/// Quotes are left alone since text nodes never need them escaped.
///
/// ```
/// use texdocx::common::xml::escape_html;
/// assert_eq!(escape_html("a < b & \"c\""), "a &lt; b &amp; \"c\"");
/// ```
#[inline]
pub fn escape_html(s: &str) -> String {
    HTML_TEXT_ESCAPER.replace_all(s, &["&amp;", "&lt;", "&gt;"])
}

/// Escape a value for use inside a double- or single-quoted HTML attribute.
#[inline]
pub fn escape_attr(s: &str) -> String {
    escape_xml(s)
}

/// Unescape XML special characters.
///
/// Replaces the five standard XML entities with their corresponding characters.
/// Unknown or malformed entities are left unchanged.
///
/// # Examples
///
/// ```
/// use texdocx::common::xml::unescape_xml;
/// assert_eq!(unescape_xml("&lt;a &amp; b&gt;"), "<a & b>");
/// assert_eq!(unescape_xml("&amp;lt;"), "&lt;"); // &amp; is matched first
/// assert_eq!(unescape_xml("&invalid;"), "&invalid;"); // unknown entity
/// ```
#[inline]
pub fn unescape_xml(s: &str) -> String {
    XML_UNESCAPER.replace_all(s, &["&", "<", ">", "\"", "'"])
}

/// Resolve a general entity reference name (without `&` and `;`).
///
/// Handles the five predefined XML entities and decimal/hex character
/// references. Returns `None` for anything else.
pub fn resolve_entity(name: &str) -> Option<char> {
    match name {
        "amp" => Some('&'),
        "lt" => Some('<'),
        "gt" => Some('>'),
        "quot" => Some('"'),
        "apos" => Some('\''),
        "nbsp" => Some('\u{00A0}'),
        _ => {
            let num = name.strip_prefix('#')?;
            let code = match num.strip_prefix(['x', 'X']) {
                Some(hex) => u32::from_str_radix(hex, 16).ok()?,
                None => num.parse::<u32>().ok()?,
            };
            char::from_u32(code)
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_attr_quotes() {
        assert_eq!(escape_attr(r#"a"b'c"#), "a&quot;b&apos;c");
    }

    #[test]
    fn test_escape_html_keeps_quotes() {
        assert_eq!(escape_html("'x' > \"y\""), "'x' &gt; \"y\"");
    }

    #[test]
    fn test_resolve_entity() {
        assert_eq!(resolve_entity("amp"), Some('&'));
        assert_eq!(resolve_entity("#x2211"), Some('∑'));
        assert_eq!(resolve_entity("#8747"), Some('∫'));
        assert_eq!(resolve_entity("#xZZ"), None);
        assert_eq!(resolve_entity("bogus"), None);
    }

    #[test]
    fn test_escape_xml_replaces_forbidden_chars() {
        assert_eq!(escape_xml("a\u{0}b\u{1F}<\u{FFFF}"), "a\u{FFFD}b\u{FFFD}&lt;\u{FFFD}");
        assert_eq!(escape_xml("tab\there\r\n"), "tab\there\r\n");
        assert_eq!(escape_xml("\u{E000}x\u{E001}"), "\u{E000}x\u{E001}");
    }

    #[test]
    fn test_unescape_roundtrip() {
        let raw = "x < y && y > \"z\"";
        assert_eq!(unescape_xml(&escape_xml(raw)), raw);
    }
}
