// Formula Module - LaTeX to MathML to OMML conversion
//
// Formulas travel through two pure converters before they reach a document:
//
// - **LaTeX → MathML**: the formula renderer, used both for the on-screen
//   preview and as the first export step
// - **MathML → OMML**: the notation bridge, producing the Office Math Markup
//   Language fragment Word embeds natively
//
// Both sit behind traits so hosts can plug in other engines; the defaults
// are `LatexRenderer` and `OmmlBridge`.

use thiserror::Error;

/// LaTeX renderer
///
/// Converts LaTeX source to presentation MathML using pulldown-latex.
pub mod latex;
/// MathML to OMML bridge
///
/// Parses MathML and rewrites it as Office Math Markup Language, the math
/// notation stored inside WordprocessingML documents.
///
/// Reference: https://devblogs.microsoft.com/math-in-office/officemath/
pub mod omml;

// Re-export public API
pub use latex::LatexRenderer;
pub use omml::OmmlBridge;

/// Errors raised by the formula converters.
///
/// The pipeline recovers from both variants locally; they only reach callers
/// of the single-formula APIs.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FormulaError {
    /// The LaTeX source is not valid
    #[error("LaTeX parse error: {0}")]
    Parse(String),

    /// The MathML has no OMML equivalent or is malformed
    #[error("MathML conversion error: {0}")]
    Conversion(String),
}

/// LaTeX → math markup converter.
pub trait FormulaRenderer {
    /// Render `latex` (without delimiters) to MathML.
    fn render_formula(&self, latex: &str, display_mode: bool) -> Result<String, FormulaError>;
}

/// Math markup → word notation converter.
pub trait MathNotationBridge {
    /// Convert a MathML string to a self-contained OMML fragment.
    fn convert_math_markup(&self, markup: &str) -> Result<String, FormulaError>;
}

impl<F> FormulaRenderer for F
where
    F: Fn(&str, bool) -> Result<String, FormulaError>,
{
    fn render_formula(&self, latex: &str, display_mode: bool) -> Result<String, FormulaError> {
        self(latex, display_mode)
    }
}

impl<F> MathNotationBridge for F
where
    F: Fn(&str) -> Result<String, FormulaError>,
{
    fn convert_math_markup(&self, markup: &str) -> Result<String, FormulaError> {
        self(markup)
    }
}

/// Run a formula through both converters.
pub fn to_word_notation<R, B>(
    latex: &str,
    display_mode: bool,
    renderer: &R,
    bridge: &B,
) -> Result<String, FormulaError>
where
    R: FormulaRenderer + ?Sized,
    B: MathNotationBridge + ?Sized,
{
    let markup = renderer.render_formula(latex, display_mode)?;
    bridge.convert_math_markup(&markup)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_closures_act_as_converters() {
        let renderer = |latex: &str, block: bool| -> Result<String, FormulaError> {
            Ok(format!("<math display=\"{}\"><mi>{latex}</mi></math>", if block { "block" } else { "inline" }))
        };
        let bridge = |markup: &str| -> Result<String, FormulaError> { Ok(markup.len().to_string()) };

        let out = to_word_notation("x", false, &renderer, &bridge).unwrap();
        assert_eq!(out, "40");
    }

    #[test]
    fn test_parse_error_short_circuits() {
        let renderer =
            |_: &str, _: bool| -> Result<String, FormulaError> { Err(FormulaError::Parse("bad".into())) };
        let bridge = |_: &str| -> Result<String, FormulaError> { panic!("bridge must not run") };

        let err = to_word_notation("\\frac{", true, &renderer, &bridge).unwrap_err();
        assert_eq!(err, FormulaError::Parse("bad".into()));
    }

    #[test]
    fn test_default_converters_end_to_end() {
        let omml = to_word_notation(r"\frac{a}{b}", true, &LatexRenderer::new(), &OmmlBridge::new()).unwrap();
        assert!(omml.starts_with("<m:oMathPara"));
        assert!(omml.contains("<m:f>"));
        assert!(omml.contains("<m:t>a</m:t>"));
    }
}
