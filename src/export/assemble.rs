//! Document assembly: segmented spans → paragraph tree with placeholders.
//!
//! Formulas are converted to OMML up front; each successful conversion is
//! registered in a [`PlaceholderMap`] and only its token enters the tree.
//! Paragraph breaks follow blank lines in the text, and block formulas
//! always stand in a centered paragraph of their own.

use super::placeholder::{PlaceholderMap, sanitize};
use crate::formula::{FormulaRenderer, MathNotationBridge, to_word_notation};
use crate::segment::{Span, segment};
use memchr::memchr_iter;
use serde::Serialize;
use std::borrow::Cow;

/// A span after formula conversion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContentItem {
    /// Prose, or the delimited source of a formula that failed to convert
    Text(String),
    /// A converted formula
    Math { word_notation: String, is_block: bool },
}

/// Paragraph alignment as decided by assembly.
///
/// The builder maps `Centered` to the configured block alignment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Alignment {
    #[default]
    Default,
    Centered,
}

/// One entry of a paragraph.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ParagraphEntry {
    Text(String),
    /// Token standing in for a math fragment
    Placeholder(String),
}

/// A non-empty paragraph.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Paragraph {
    pub alignment: Alignment,
    pub entries: Vec<ParagraphEntry>,
}

/// Ordered paragraphs handed to a document builder.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ParagraphTree {
    pub paragraphs: Vec<Paragraph>,
}

impl ParagraphTree {
    #[inline]
    pub fn len(&self) -> usize {
        self.paragraphs.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.paragraphs.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Paragraph> {
        self.paragraphs.iter()
    }

    /// Placeholder tokens in document order.
    pub fn placeholders(&self) -> impl Iterator<Item = &str> {
        self.paragraphs
            .iter()
            .flat_map(|p| p.entries.iter())
            .filter_map(|entry| match entry {
                ParagraphEntry::Placeholder(token) => Some(token.as_str()),
                ParagraphEntry::Text(_) => None,
            })
    }
}

impl<'a> IntoIterator for &'a ParagraphTree {
    type Item = &'a Paragraph;
    type IntoIter = std::slice::Iter<'a, Paragraph>;

    fn into_iter(self) -> Self::IntoIter {
        self.paragraphs.iter()
    }
}

/// Result of [`assemble`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Assembled {
    pub tree: ParagraphTree,
    pub placeholders: PlaceholderMap,
}

/// Accumulates entries of the paragraph currently being assembled.
#[derive(Debug, Default)]
struct ParagraphBuilder {
    entries: Vec<ParagraphEntry>,
}

impl ParagraphBuilder {
    fn push_text(&mut self, text: &str) {
        if let Some(ParagraphEntry::Text(last)) = self.entries.last_mut() {
            last.push_str(text);
        } else {
            self.entries.push(ParagraphEntry::Text(text.to_string()));
        }
    }

    fn push_placeholder(&mut self, token: String) {
        self.entries.push(ParagraphEntry::Placeholder(token));
    }

    /// Move the open paragraph into `tree`; an empty builder emits nothing.
    fn flush(&mut self, tree: &mut ParagraphTree) {
        if self.entries.is_empty() {
            return;
        }
        tree.paragraphs.push(Paragraph {
            alignment: Alignment::Default,
            entries: std::mem::take(&mut self.entries),
        });
    }
}

/// Rewrite `\r\n` and lone `\r` as `\n`.
pub fn normalize_line_endings(input: &str) -> Cow<'_, str> {
    if !input.contains('\r') {
        return Cow::Borrowed(input);
    }
    Cow::Owned(input.replace("\r\n", "\n").replace('\r', "\n"))
}

/// Convert spans, degrading failed formulas to their delimited source.
pub fn convert<R, B>(spans: &[Span<'_>], renderer: &R, bridge: &B) -> Vec<ContentItem>
where
    R: FormulaRenderer + ?Sized,
    B: MathNotationBridge + ?Sized,
{
    spans
        .iter()
        .map(|span| match *span {
            Span::Text(value) => ContentItem::Text(value.to_string()),
            Span::Formula { source, display_mode } => {
                match to_word_notation(source, display_mode, renderer, bridge) {
                    Ok(word_notation) => ContentItem::Math {
                        word_notation,
                        is_block: display_mode,
                    },
                    Err(e) => {
                        tracing::debug!(source, display_mode, error = %e, "formula kept as text");
                        ContentItem::Text(span.delimited().into_owned())
                    },
                }
            },
        })
        .collect()
}

/// Split on runs of two or more newlines.
fn split_blank_lines(text: &str) -> Vec<&str> {
    let bytes = text.as_bytes();
    let mut segments = Vec::new();
    let mut start = 0;
    let mut skip_until = 0;

    for at in memchr_iter(b'\n', bytes) {
        if at < skip_until {
            continue;
        }
        let run = bytes[at..].iter().take_while(|&&b| b == b'\n').count();
        skip_until = at + run;
        if run >= 2 {
            segments.push(&text[start..at]);
            start = at + run;
        }
    }
    segments.push(&text[start..]);
    segments
}

/// Group converted items into paragraphs.
pub fn build_tree(items: Vec<ContentItem>) -> Assembled {
    let mut tree = ParagraphTree::default();
    let mut placeholders = PlaceholderMap::new();
    let mut current = ParagraphBuilder::default();

    for item in items {
        match item {
            ContentItem::Math {
                word_notation,
                is_block: true,
            } => {
                current.flush(&mut tree);
                let token = placeholders.register(word_notation);
                tree.paragraphs.push(Paragraph {
                    alignment: Alignment::Centered,
                    entries: vec![ParagraphEntry::Placeholder(token)],
                });
            },
            ContentItem::Math {
                word_notation,
                is_block: false,
            } => {
                let token = placeholders.register(word_notation);
                current.push_placeholder(token);
            },
            ContentItem::Text(value) => {
                for (i, segment) in split_blank_lines(&value).into_iter().enumerate() {
                    if i > 0 {
                        current.flush(&mut tree);
                    }
                    if !segment.is_empty() {
                        current.push_text(&segment.replace('\n', " "));
                    }
                }
            },
        }
    }
    current.flush(&mut tree);

    Assembled { tree, placeholders }
}

/// Assemble raw input into a paragraph tree and its placeholder map.
///
/// # Examples
///
/// ```
/// use texdocx::export::{assemble, Alignment};
/// use texdocx::formula::{LatexRenderer, OmmlBridge};
///
/// let assembled = assemble("pre\n\n$$x$$\n\npost", &LatexRenderer, &OmmlBridge);
/// assert_eq!(assembled.tree.len(), 3);
/// assert_eq!(assembled.tree.paragraphs[1].alignment, Alignment::Centered);
/// assert_eq!(assembled.placeholders.len(), 1);
/// ```
pub fn assemble<R, B>(input: &str, renderer: &R, bridge: &B) -> Assembled
where
    R: FormulaRenderer + ?Sized,
    B: MathNotationBridge + ?Sized,
{
    let normalized = normalize_line_endings(input);
    let sanitized = sanitize(&normalized);
    let spans = segment(&sanitized);
    let items = convert(&spans, renderer, bridge);
    let assembled = build_tree(items);

    tracing::debug!(
        paragraphs = assembled.tree.len(),
        formulas = assembled.placeholders.len(),
        "assembled document"
    );
    assembled
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::export::placeholder::{TOKEN_END, TOKEN_START, token};
    use crate::formula::FormulaError;

    fn renderer(latex: &str, block: bool) -> Result<String, FormulaError> {
        if latex.contains("bad") {
            return Err(FormulaError::Parse("bad input".to_string()));
        }
        Ok(format!("{}:{}", if block { "B" } else { "I" }, latex))
    }

    fn bridge(markup: &str) -> Result<String, FormulaError> {
        if markup.contains("unsupported") {
            return Err(FormulaError::Conversion("no equivalent".to_string()));
        }
        Ok(format!("<omml>{}</omml>", markup))
    }

    fn run(input: &str) -> Assembled {
        assemble(input, &renderer, &bridge)
    }

    fn text(s: &str) -> ParagraphEntry {
        ParagraphEntry::Text(s.to_string())
    }

    #[test]
    fn test_blank_line_splits_paragraphs() {
        let out = run("line1\n\nline2");
        assert_eq!(out.tree.len(), 2);
        assert_eq!(out.tree.paragraphs[0].entries, vec![text("line1")]);
        assert_eq!(out.tree.paragraphs[1].entries, vec![text("line2")]);
        assert!(out.placeholders.is_empty());
    }

    #[test]
    fn test_single_newline_becomes_space() {
        let out = run("one\ntwo\n\n\n\nthree");
        assert_eq!(out.tree.len(), 2);
        assert_eq!(out.tree.paragraphs[0].entries, vec![text("one two")]);
        assert_eq!(out.tree.paragraphs[1].entries, vec![text("three")]);
    }

    #[test]
    fn test_crlf_normalized() {
        let out = run("a\r\n\r\nb\rc");
        assert_eq!(out.tree.len(), 2);
        assert_eq!(out.tree.paragraphs[1].entries, vec![text("b c")]);
    }

    #[test]
    fn test_block_math_isolated() {
        let out = run("pre\n\n$$x$$\n\npost");
        assert_eq!(out.tree.len(), 3);
        assert_eq!(out.tree.paragraphs[0].entries, vec![text("pre")]);
        assert_eq!(out.tree.paragraphs[1].alignment, Alignment::Centered);
        assert_eq!(
            out.tree.paragraphs[1].entries,
            vec![ParagraphEntry::Placeholder(token(0))]
        );
        assert_eq!(out.tree.paragraphs[2].entries, vec![text("post")]);
        assert_eq!(out.placeholders.get(&token(0)), Some("<omml>B:x</omml>"));
    }

    #[test]
    fn test_block_math_mid_line_flushes() {
        let out = run("before $$y$$ after");
        assert_eq!(out.tree.len(), 3);
        assert_eq!(out.tree.paragraphs[0].entries, vec![text("before ")]);
        assert_eq!(out.tree.paragraphs[2].entries, vec![text(" after")]);
        assert_eq!(out.tree.paragraphs[2].alignment, Alignment::Default);
    }

    #[test]
    fn test_inline_math_stays_in_paragraph() {
        let out = run("let $a$ and $b$ be");
        assert_eq!(out.tree.len(), 1);
        assert_eq!(
            out.tree.paragraphs[0].entries,
            vec![
                text("let "),
                ParagraphEntry::Placeholder(token(0)),
                text(" and "),
                ParagraphEntry::Placeholder(token(1)),
                text(" be"),
            ]
        );
        assert_eq!(out.placeholders.get(&token(1)), Some("<omml>I:b</omml>"));
    }

    #[test]
    fn test_failed_formulas_degrade_to_source() {
        let out = run("x $bad$ y $$unsupported$$ z");
        assert!(out.placeholders.is_empty());
        assert_eq!(out.tree.len(), 1);
        assert_eq!(
            out.tree.paragraphs[0].entries,
            vec![text("x $bad$ y $$unsupported$$ z")]
        );
    }

    #[test]
    fn test_degradation_is_deterministic() {
        assert_eq!(run("$bad$ and $$bad$$"), run("$bad$ and $$bad$$"));
    }

    #[test]
    fn test_no_empty_paragraphs() {
        assert!(run("").tree.is_empty());
        assert!(run("\n\n\n\n").tree.is_empty());
        let out = run("$$a$$\n\n$$b$$");
        assert_eq!(out.tree.len(), 2);
        assert!(out.tree.iter().all(|p| !p.entries.is_empty()));
    }

    #[test]
    fn test_whitespace_paragraph_kept() {
        let out = run("a\n\n  \n\nb");
        assert_eq!(out.tree.len(), 3);
        assert_eq!(out.tree.paragraphs[1].entries, vec![text("  ")]);
    }

    #[test]
    fn test_forged_token_is_neutralized() {
        let forged = format!("see {} here", token(0));
        let out = run(&forged);
        let ParagraphEntry::Text(value) = &out.tree.paragraphs[0].entries[0] else {
            panic!("expected text entry");
        };
        assert!(!value.contains(TOKEN_START) && !value.contains(TOKEN_END));
        assert_eq!(out.tree.placeholders().count(), 0);
    }

    #[test]
    fn test_each_token_appears_once() {
        let out = run("$a$ $b$\n\n$$c$$ $d$");
        let tokens: Vec<&str> = out.tree.placeholders().collect();
        assert_eq!(tokens.len(), out.placeholders.len());
        let expected: Vec<String> = (0..4).map(token).collect();
        assert_eq!(tokens, expected.iter().map(String::as_str).collect::<Vec<_>>());
    }

    #[test]
    fn test_split_blank_lines() {
        assert_eq!(split_blank_lines("a\nb"), vec!["a\nb"]);
        assert_eq!(split_blank_lines("a\n\nb\n\n\nc"), vec!["a", "b", "c"]);
        assert_eq!(split_blank_lines("\n\na"), vec!["", "a"]);
        assert_eq!(split_blank_lines("a\n\n"), vec!["a", ""]);
    }

    #[test]
    fn test_default_converters_keep_comparisons() {
        use crate::formula::{LatexRenderer, OmmlBridge};

        let assembled = assemble("Let $x < 1$ hold.", &LatexRenderer, &OmmlBridge);
        assert_eq!(assembled.placeholders.len(), 1);
        let (_, fragment) = assembled.placeholders.iter().next().unwrap();
        assert!(fragment.contains("&lt;"));
        assert_eq!(assembled.tree.paragraphs[0].entries.len(), 3);
    }
}
