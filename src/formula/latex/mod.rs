//! LaTeX rendering via pulldown-latex → MathML

use super::{FormulaError, FormulaRenderer};
use crate::common::xml::escape_html;
use memchr::memchr;
use pulldown_latex::{
    Parser, Storage, config::DisplayMode, config::RenderConfig, mathml::push_mathml,
};

/// Default [`FormulaRenderer`] backed by pulldown-latex.
///
/// Stateless; each call parses the source from scratch.
#[derive(Debug, Clone, Copy, Default)]
pub struct LatexRenderer;

impl LatexRenderer {
    /// Create a new renderer.
    #[inline]
    pub fn new() -> Self {
        Self
    }
}

impl FormulaRenderer for LatexRenderer {
    fn render_formula(&self, latex: &str, display_mode: bool) -> Result<String, FormulaError> {
        if latex.trim().is_empty() {
            return Err(FormulaError::Parse("empty formula".to_string()));
        }

        let storage = Storage::new();
        let parser = Parser::new(latex, &storage);
        let config = RenderConfig {
            display_mode: if display_mode {
                DisplayMode::Block
            } else {
                DisplayMode::Inline
            },
            ..Default::default()
        };

        // Collect events so parse errors are reported before anything is rendered
        let events: Vec<_> = parser.collect();
        let errors: Vec<String> = events
            .iter()
            .filter_map(|e| e.as_ref().err().map(|err| err.to_string()))
            .collect();

        if !errors.is_empty() {
            let message = errors.join("; ");
            tracing::debug!(%message, "LaTeX parse failed");
            return Err(FormulaError::Parse(message));
        }

        let mut mathml = String::new();
        push_mathml(&mut mathml, events.into_iter(), config)
            .map_err(|e| FormulaError::Parse(e.to_string()))?;
        well_formed(&mathml)
    }
}

/// Elements whose content pulldown-latex writes as raw text
const TOKEN_ELEMENTS: [&str; 6] = ["mi", "mn", "mo", "mtext", "ms", "annotation"];

/// Turn pulldown-latex output into well-formed XML.
///
/// Token text is written unescaped (`<mo><</mo>`), and some attributes follow
/// the previous value without a space. Tags are copied as-is apart from that
/// space; token content is escaped up to the matching close tag.
fn well_formed(mathml: &str) -> Result<String, FormulaError> {
    let mut out = String::with_capacity(mathml.len() + 32);
    let mut rest = mathml;

    while let Some(open) = memchr(b'<', rest.as_bytes()) {
        out.push_str(&escape_html(&rest[..open]));
        let (tag, after) = split_tag(&rest[open..])
            .ok_or_else(|| FormulaError::Parse("unterminated MathML tag".to_string()))?;
        push_tag(&mut out, tag);
        rest = after;

        if let Some(name) = token_element(tag) {
            let close = format!("</{name}>");
            let end = rest
                .find(&close)
                .ok_or_else(|| FormulaError::Parse(format!("unclosed <{name}> in MathML")))?;
            out.push_str(&escape_html(&rest[..end]));
            out.push_str(&close);
            rest = &rest[end + close.len()..];
        }
    }
    out.push_str(&escape_html(rest));
    Ok(out)
}

/// Split `s` (starting at `<`) after the `>` closing its first tag.
fn split_tag(s: &str) -> Option<(&str, &str)> {
    let mut quote = None;
    for (i, c) in s.char_indices().skip(1) {
        match (quote, c) {
            (Some(q), c) if c == q => quote = None,
            (None, '"' | '\'') => quote = Some(c),
            (None, '>') => return Some((&s[..=i], &s[i + 1..])),
            _ => {},
        }
    }
    None
}

fn push_tag(out: &mut String, tag: &str) {
    let mut quote = None;
    let mut after_value = false;
    for c in tag.chars() {
        if after_value && c.is_ascii_alphabetic() {
            out.push(' ');
        }
        after_value = false;
        match quote {
            Some(q) if c == q => {
                quote = None;
                after_value = true;
            },
            None if c == '"' || c == '\'' => quote = Some(c),
            _ => {},
        }
        out.push(c);
    }
}

/// Name of the token element `tag` opens, if any.
fn token_element(tag: &str) -> Option<&'static str> {
    if tag.starts_with("</") || tag.ends_with("/>") {
        return None;
    }
    let name = tag[1..]
        .split(|c: char| c.is_ascii_whitespace() || c == '>')
        .next()?;
    TOKEN_ELEMENTS.iter().find(|t| **t == name).copied()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_inline_math() {
        let mathml = LatexRenderer::new().render_formula("x^2", false).unwrap();
        assert!(mathml.contains("<math"));
        assert!(mathml.contains("</math>"));
        assert!(mathml.contains("inline"));
    }

    #[test]
    fn renders_display_math() {
        let mathml = LatexRenderer::new().render_formula(r"\frac{a}{b}", true).unwrap();
        assert!(mathml.contains("<mfrac"));
        assert!(mathml.contains("block"));
    }

    #[test]
    fn rejects_unclosed_brace() {
        let err = LatexRenderer::new().render_formula(r"\frac{a", false).unwrap_err();
        assert!(matches!(err, FormulaError::Parse(ref m) if !m.is_empty()));
    }

    #[test]
    fn rejects_blank_source() {
        assert!(LatexRenderer::new().render_formula("  ", true).is_err());
    }

    #[test]
    fn escapes_operator_text() {
        let mathml = LatexRenderer::new().render_formula("x < 1", false).unwrap();
        assert!(mathml.contains("&lt;</mo>"));
        assert!(!mathml.contains("><</"));

        let mathml = LatexRenderer::new().render_formula(r"a \& b", false).unwrap();
        assert!(mathml.contains("&amp;"));
    }

    #[test]
    fn escapes_text_content() {
        let mathml = LatexRenderer::new().render_formula(r"\text{a<b}", false).unwrap();
        assert!(mathml.contains("a&lt;b</mtext>"));
        assert!(!mathml.contains("<b"));
    }

    #[test]
    fn output_is_accepted_by_bridge() {
        use crate::formula::{MathNotationBridge, OmmlBridge};

        for latex in ["x < 1", r"a \& b", r"\text{a<b}", "x > y"] {
            let mathml = LatexRenderer::new().render_formula(latex, false).unwrap();
            assert!(OmmlBridge::new().convert_math_markup(&mathml).is_ok(), "{latex}: {mathml}");
        }
    }

    #[test]
    fn well_formed_repairs_markup() {
        assert_eq!(
            well_formed(r#"<math><mo stretchy="true"minsize="1.2em">(</mo><mi>&</mi></math>"#).unwrap(),
            r#"<math><mo stretchy="true" minsize="1.2em">(</mo><mi>&amp;</mi></math>"#
        );
        assert_eq!(
            well_formed(r#"<math><mspace width="0.1667em" /><mo><</mo></math>"#).unwrap(),
            r#"<math><mspace width="0.1667em" /><mo>&lt;</mo></math>"#
        );
        assert!(well_formed("<math><mi>x").is_err());
        assert!(well_formed("<math").is_err());
    }

    #[test]
    fn failure_is_deterministic() {
        let renderer = LatexRenderer::new();
        let first = renderer.render_formula(r"\frac{", true);
        let second = renderer.render_formula(r"\frac{", true);
        assert_eq!(first, second);
    }
}
