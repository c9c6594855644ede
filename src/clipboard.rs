//! Clipboard payloads.
//!
//! Two artifacts besides the document: the whole input with formulas swapped
//! for their MathML, and a single formula as an OMML fragment ready to paste
//! into Word.

use crate::export::assemble::normalize_line_endings;
use crate::formula::{FormulaError, FormulaRenderer, MathNotationBridge, to_word_notation};
use crate::segment::{Span, segment};

/// Text of the whole document with each formula replaced by its MathML.
///
/// Formulas that fail to render stay as their delimited source.
///
/// ```
/// use texdocx::clipboard::document_text;
/// use texdocx::formula::LatexRenderer;
///
/// let text = document_text("Let $x$ be real.", &LatexRenderer);
/// assert!(text.starts_with("Let <math"));
/// assert!(text.ends_with("</math> be real."));
/// ```
pub fn document_text<R>(input: &str, renderer: &R) -> String
where
    R: FormulaRenderer + ?Sized,
{
    let input = normalize_line_endings(input);
    let mut out = String::with_capacity(input.len() * 2);

    for span in segment(&input) {
        match span {
            Span::Text(text) => out.push_str(text),
            Span::Formula { source, display_mode } => match renderer.render_formula(source, display_mode) {
                Ok(markup) => out.push_str(&markup),
                Err(e) => {
                    tracing::debug!(source, display_mode, error = %e, "formula copied as source");
                    out.push_str(&span.delimited());
                },
            },
        }
    }

    out
}

/// OMML fragment for one formula.
///
/// `source` and `display_mode` are what the preview stored on the formula's
/// container (see [`crate::preview::FormulaRef`]).
pub fn formula_fragment<R, B>(
    source: &str,
    display_mode: bool,
    renderer: &R,
    bridge: &B,
) -> Result<String, FormulaError>
where
    R: FormulaRenderer + ?Sized,
    B: MathNotationBridge + ?Sized,
{
    to_word_notation(source, display_mode, renderer, bridge)
}
