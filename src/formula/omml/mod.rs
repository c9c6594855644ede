// OMML (Office Math Markup Language) Bridge
//
// Rewrites presentation MathML as OMML, the equation markup Word stores
// inside WordprocessingML runs. The conversion is two-pass:
//
// - a streaming quick-xml pass builds a small element tree
// - a writer walks the tree and emits `m:` elements through PHF lookup tables
//
// Every fragment declares the math namespace on its outermost element, so it
// can be spliced into any document body without further fix-ups.
//
// Reference: https://devblogs.microsoft.com/math-in-office/officemath/

mod lookup;
mod mathml;
mod writer;

use crate::formula::{FormulaError, MathNotationBridge};

/// Namespace URI of Office Math Markup Language
pub const OMML_NAMESPACE: &str = "http://schemas.openxmlformats.org/officeDocument/2006/math";

/// Default [`MathNotationBridge`]: MathML in, self-contained OMML out.
///
/// `<math display="block">` becomes an `m:oMathPara` wrapping one `m:oMath`;
/// anything else becomes a bare `m:oMath`.
///
/// # Examples
///
/// ```
/// use texdocx::formula::{MathNotationBridge, OmmlBridge};
///
/// let omml = OmmlBridge::new()
///     .convert_math_markup("<math><msup><mi>x</mi><mn>2</mn></msup></math>")
///     .unwrap();
/// assert!(omml.starts_with("<m:oMath "));
/// assert!(omml.contains("<m:sSup>"));
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct OmmlBridge;

impl OmmlBridge {
    /// Create a new bridge.
    #[inline]
    pub fn new() -> Self {
        Self
    }
}

impl MathNotationBridge for OmmlBridge {
    fn convert_math_markup(&self, markup: &str) -> Result<String, FormulaError> {
        let root = mathml::parse(markup)?;
        writer::write_math(&root).inspect_err(|e| {
            tracing::debug!(error = %e, "MathML has no OMML rendition");
        })
    }
}
