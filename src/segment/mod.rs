//! Splitting raw input into text and formula spans.
//!
//! The segmenter is the first stage shared by live preview and document
//! export. It recognizes two delimiter forms:
//!
//! - `$$ … $$` for block (display) formulas
//! - `$ … $` for inline formulas
//!
//! At every `$` the block form is tried first, so a doubled marker is never
//! read as two adjacent inline formulas. A formula body must be non-empty and
//! may not contain `$` itself; nested or escaped markers are not supported.
//! Anything that does not match stays in a [`Span::Text`] verbatim, so the
//! spans of an input always concatenate back to exactly that input.

use memchr::memchr;
use serde::Serialize;
use std::borrow::Cow;
use std::ops::Range;

/// Marker byte delimiting formulas.
pub const MARKER: u8 = b'$';

/// A classified slice of the input, borrowed from it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Span<'a> {
    /// Plain prose, unconverted.
    Text(&'a str),
    /// A formula body without its delimiters.
    Formula {
        /// LaTeX source between the markers
        source: &'a str,
        /// `true` for `$$…$$`, `false` for `$…$`
        display_mode: bool,
    },
}

impl<'a> Span<'a> {
    /// Whether this span is a formula.
    #[inline]
    pub fn is_formula(&self) -> bool {
        matches!(self, Span::Formula { .. })
    }

    /// The exact input text this span was cut from, delimiters included.
    ///
    /// For text spans this is a borrow; formula spans rebuild their markers.
    pub fn delimited(&self) -> Cow<'a, str> {
        match *self {
            Span::Text(text) => Cow::Borrowed(text),
            Span::Formula { source, display_mode } => Cow::Owned(delimit(source, display_mode)),
        }
    }
}

/// Wrap a formula body in the markers for its mode.
pub fn delimit(source: &str, display_mode: bool) -> String {
    let marker = if display_mode { "$$" } else { "$" };
    let mut out = String::with_capacity(source.len() + marker.len() * 2);
    out.push_str(marker);
    out.push_str(source);
    out.push_str(marker);
    out
}

/// A successful formula match starting at some marker.
struct FormulaMatch {
    body: Range<usize>,
    end: usize,
    display_mode: bool,
}

/// Split `input` into an ordered sequence of spans.
///
/// Scanning is strictly left to right and never revisits input consumed by
/// a completed match. Adjacent formulas produce adjacent spans with nothing
/// inserted between them.
///
/// # Examples
///
/// ```
/// use texdocx::segment::{segment, Span};
///
/// let spans = segment("$$a$$ and $b$");
/// assert_eq!(spans, vec![
///     Span::Formula { source: "a", display_mode: true },
///     Span::Text(" and "),
///     Span::Formula { source: "b", display_mode: false },
/// ]);
/// ```
pub fn segment(input: &str) -> Vec<Span<'_>> {
    let bytes = input.as_bytes();
    let mut spans = Vec::new();
    let mut text_start = 0;
    let mut pos = 0;

    while let Some(offset) = memchr(MARKER, &bytes[pos..]) {
        let at = pos + offset;
        match match_formula(bytes, at) {
            Some(found) => {
                if text_start < at {
                    spans.push(Span::Text(&input[text_start..at]));
                }
                spans.push(Span::Formula {
                    source: &input[found.body],
                    display_mode: found.display_mode,
                });
                pos = found.end;
                text_start = found.end;
            },
            None => pos = at + 1,
        }
    }

    if text_start < input.len() {
        spans.push(Span::Text(&input[text_start..]));
    }

    tracing::trace!(spans = spans.len(), "segmented input");
    spans
}

/// Try the block form, then the inline form, at the marker at `at`.
fn match_formula(bytes: &[u8], at: usize) -> Option<FormulaMatch> {
    if bytes.get(at + 1) == Some(&MARKER) {
        let body_start = at + 2;
        if let Some(len) = memchr(MARKER, &bytes[body_start..])
            && len > 0
            && bytes.get(body_start + len + 1) == Some(&MARKER)
        {
            return Some(FormulaMatch {
                body: body_start..body_start + len,
                end: body_start + len + 2,
                display_mode: true,
            });
        }
    }

    let body_start = at + 1;
    let len = memchr(MARKER, &bytes[body_start..])?;
    (len > 0).then(|| FormulaMatch {
        body: body_start..body_start + len,
        end: body_start + len + 1,
        display_mode: false,
    })
}
