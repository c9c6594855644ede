//! Live preview: spans → HTML display markup.
//!
//! Text is HTML-escaped and its newlines become `<br>`. Each formula renders
//! to MathML inside a container carrying the original source in `data-latex`
//! and its mode in `data-display`, so a host UI can recover the formula for
//! copy actions with [`FormulaRef::from_attributes`]. Formulas that fail to
//! render show their delimited source inside an error marker instead.
//!
//! Rendering is pure string construction and safe to rerun on every edit.

use crate::common::xml::{escape_attr, escape_html, unescape_xml};
use crate::export::assemble::normalize_line_endings;
use crate::formula::FormulaRenderer;
use crate::segment::{Span, delimit};
use serde::{Deserialize, Serialize};

/// Default prefix for the CSS classes the preview emits
pub const DEFAULT_CLASS_PREFIX: &str = "texdocx-";

/// Configuration options for preview rendering.
///
/// # Examples
///
/// ```rust
/// use texdocx::preview::PreviewOptions;
///
/// let options = PreviewOptions::new().with_class_prefix("editor-");
/// assert_eq!(options.class_prefix, "editor-");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PreviewOptions {
    /// Prepended to `math`, `math-inline`, `math-block` and `math-error`
    pub class_prefix: String,
}

impl Default for PreviewOptions {
    fn default() -> Self {
        Self {
            class_prefix: DEFAULT_CLASS_PREFIX.to_string(),
        }
    }
}

impl PreviewOptions {
    /// Create a new `PreviewOptions` with default values.
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the CSS class prefix.
    #[inline]
    pub fn with_class_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.class_prefix = prefix.into();
        self
    }
}

/// Render spans to display markup with default options.
///
/// # Examples
///
/// ```
/// use texdocx::formula::LatexRenderer;
/// use texdocx::preview::render;
/// use texdocx::segment::segment;
///
/// let html = render(&segment("a < b: $a<b$"), &LatexRenderer);
/// assert!(html.starts_with("a &lt; b: <span"));
/// assert!(html.contains(r#"data-latex="a&lt;b""#));
/// ```
pub fn render<R>(spans: &[Span<'_>], renderer: &R) -> String
where
    R: FormulaRenderer + ?Sized,
{
    render_with(spans, renderer, &PreviewOptions::default())
}

/// Render spans to display markup.
pub fn render_with<R>(spans: &[Span<'_>], renderer: &R, options: &PreviewOptions) -> String
where
    R: FormulaRenderer + ?Sized,
{
    let prefix = options.class_prefix.as_str();
    let mut html = String::new();

    for span in spans {
        match *span {
            Span::Text(text) => push_text(&mut html, text),
            Span::Formula { source, display_mode } => match renderer.render_formula(source, display_mode) {
                Ok(markup) => {
                    let (tag, mode) = if display_mode {
                        ("div", "block")
                    } else {
                        ("span", "inline")
                    };
                    html.push_str(&format!(
                        r#"<{tag} class="{prefix}math {prefix}math-{mode}" data-latex="{}" data-display="{display_mode}">"#,
                        escape_attr(source)
                    ));
                    html.push_str(&markup);
                    html.push_str(&format!("</{tag}>"));
                },
                Err(e) => {
                    tracing::debug!(source, display_mode, error = %e, "formula shown as source in preview");
                    html.push_str(&format!(
                        r#"<span class="{prefix}math-error" title="{}">{}</span>"#,
                        escape_attr(&e.to_string()),
                        escape_html(&delimit(source, display_mode))
                    ));
                },
            },
        }
    }

    html
}

fn push_text(html: &mut String, text: &str) {
    let escaped = escape_html(&normalize_line_endings(text));
    for (i, line) in escaped.split('\n').enumerate() {
        if i > 0 {
            html.push_str("<br>");
        }
        html.push_str(line);
    }
}

/// A formula recovered from a preview container.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormulaRef {
    /// LaTeX source without delimiters
    pub latex: String,
    /// `true` for a block formula
    pub display_mode: bool,
}

impl FormulaRef {
    /// Rebuild a formula from the raw `data-latex` and `data-display`
    /// attribute values of a preview container.
    ///
    /// ```
    /// use texdocx::preview::FormulaRef;
    ///
    /// let formula = FormulaRef::from_attributes("a &lt; b", "true");
    /// assert_eq!(formula.latex, "a < b");
    /// assert!(formula.display_mode);
    /// ```
    pub fn from_attributes(latex: &str, display: &str) -> Self {
        Self {
            latex: unescape_xml(latex),
            display_mode: display.trim().eq_ignore_ascii_case("true"),
        }
    }

    /// The formula with its markers, as it appeared in the input.
    pub fn delimited(&self) -> String {
        delimit(&self.latex, self.display_mode)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::formula::FormulaError;
    use crate::segment::segment;

    fn echo(latex: &str, display: bool) -> Result<String, FormulaError> {
        Ok(format!("<math display=\"{}\">{latex}</math>", if display { "block" } else { "inline" }))
    }

    fn failing(_: &str, _: bool) -> Result<String, FormulaError> {
        Err(FormulaError::Parse("unexpected end".to_string()))
    }

    #[test]
    fn test_text_is_escaped_with_line_breaks() {
        let html = render(&segment("a & b\n<c>\r\nd"), &echo);
        assert_eq!(html, "a &amp; b<br>&lt;c&gt;<br>d");
    }

    #[test]
    fn test_inline_container() {
        let html = render(&segment("x $a$ y"), &echo);
        assert_eq!(
            html,
            r#"x <span class="texdocx-math texdocx-math-inline" data-latex="a" data-display="false"><math display="inline">a</math></span> y"#
        );
    }

    #[test]
    fn test_block_container() {
        let html = render(&segment("$$a$$"), &echo);
        assert!(html.starts_with(r#"<div class="texdocx-math texdocx-math-block" data-latex="a" data-display="true">"#));
        assert!(html.ends_with("</div>"));
    }

    #[test]
    fn test_attribute_escaping() {
        let html = render(&segment(r#"$a<"b"&'c'$"#), &echo);
        assert!(html.contains(r#"data-latex="a&lt;&quot;b&quot;&amp;&apos;c&apos;""#));
    }

    #[test]
    fn test_failed_formula_marked_as_error() {
        let html = render(&segment("see $a<b$"), &failing);
        assert_eq!(
            html,
            r#"see <span class="texdocx-math-error" title="LaTeX parse error: unexpected end">$a&lt;b$</span>"#
        );
    }

    #[test]
    fn test_class_prefix() {
        let options = PreviewOptions::new().with_class_prefix("ed-");
        let html = render_with(&segment("$$a$$ $b$"), &echo, &options);
        assert!(html.contains(r#"class="ed-math ed-math-block""#));
        assert!(html.contains(r#"class="ed-math ed-math-inline""#));

        let html = render_with(&segment("$b$"), &failing, &options);
        assert!(html.contains(r#"class="ed-math-error""#));
    }

    #[test]
    fn test_rendering_is_repeatable() {
        let spans = segment("p $x$ q $$y$$");
        assert_eq!(render(&spans, &echo), render(&spans, &echo));
    }

    #[test]
    fn test_formula_ref_roundtrip_through_attributes() {
        let source = r#"\text{"a" & b} < c"#;
        let escaped = escape_attr(source);
        let formula = FormulaRef::from_attributes(&escaped, "false");
        assert_eq!(formula.latex, source);
        assert!(!formula.display_mode);
        assert_eq!(formula.delimited(), format!("${source}$"));
    }

    #[test]
    fn test_default_renderer_escapes_token_text() {
        let html = render(&segment(r"$\text{a<b}$ tail"), &crate::formula::LatexRenderer);
        assert!(html.contains("a&lt;b"));
        assert!(!html.contains("<b"));
        assert!(html.ends_with("</span> tail"));

        let html = render(&segment("$x < 1$"), &crate::formula::LatexRenderer);
        assert!(html.contains("&lt;</mo>"));
        assert!(html.contains(r#"data-latex="x &lt; 1""#));
    }

    #[test]
    fn test_default_renderer_output() {
        let html = render(&segment("$x^2$"), &crate::formula::LatexRenderer);
        assert!(html.contains("<math"));
        assert!(html.contains("<msup>"));
    }
}
