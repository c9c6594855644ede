//! Word export: assemble, build, then splice math into the package.
//!
//! Export runs in two phases. The assembler converts every formula to OMML
//! and leaves a placeholder token in the paragraph tree; a math-unaware
//! [`DocumentBuilder`] serializes that tree; finally the post-processor
//! replaces each token's run with its fragment inside the finished archive.
//!
//! # Example
//!
//! ```
//! use texdocx::export::{ExportOptions, export_docx};
//!
//! let options = ExportOptions::new().with_title("Notes");
//! let docx = export_docx("Euler: $e^{i\\pi} + 1 = 0$", &options)?;
//! assert_eq!(&docx[..2], b"PK");
//! # Ok::<(), texdocx::Error>(())
//! ```

pub mod assemble;
pub mod placeholder;
pub mod postprocess;

pub use assemble::{
    Alignment, Assembled, ContentItem, Paragraph, ParagraphEntry, ParagraphTree, assemble,
};
pub use placeholder::PlaceholderMap;

use crate::common::error::Result;
use crate::formula::{FormulaRenderer, LatexRenderer, MathNotationBridge, OmmlBridge};
use crate::ooxml::docx::ParagraphAlignment;
use crate::ooxml::docx::writer::{DEFAULT_FONT, DEFAULT_FONT_SIZE, MutableDocument};
use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Configuration options for Word export.
///
/// # Examples
///
/// ```rust
/// use texdocx::export::ExportOptions;
/// use texdocx::ooxml::docx::ParagraphAlignment;
///
/// let options = ExportOptions::new()
///     .with_font("Cambria")
///     .with_font_size(12.0)
///     .with_block_alignment(ParagraphAlignment::Left);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportOptions {
    /// Document title (`dc:title`)
    pub title: Option<String>,
    /// Document author (`dc:creator`)
    pub creator: Option<String>,
    /// Creation timestamp (`dcterms:created`)
    pub created: Option<DateTime<Utc>>,
    /// Body font
    pub font: String,
    /// Body font size in points
    pub font_size: f64,
    /// Alignment of paragraphs holding a block formula
    pub block_alignment: ParagraphAlignment,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            title: None,
            creator: None,
            created: None,
            font: DEFAULT_FONT.to_string(),
            font_size: DEFAULT_FONT_SIZE,
            block_alignment: ParagraphAlignment::Center,
        }
    }
}

impl ExportOptions {
    /// Create a new `ExportOptions` with default values.
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the document title.
    #[inline]
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Set the document author.
    #[inline]
    pub fn with_creator(mut self, creator: impl Into<String>) -> Self {
        self.creator = Some(creator.into());
        self
    }

    /// Set the creation timestamp.
    ///
    /// Without one the package carries no timestamp at all, so identical
    /// input always yields identical documents.
    #[inline]
    pub fn with_created(mut self, created: DateTime<Utc>) -> Self {
        self.created = Some(created);
        self
    }

    /// Set the body font.
    #[inline]
    pub fn with_font(mut self, font: impl Into<String>) -> Self {
        self.font = font.into();
        self
    }

    /// Set the body font size in points.
    #[inline]
    pub fn with_font_size(mut self, points: f64) -> Self {
        self.font_size = points;
        self
    }

    /// Set how block-formula paragraphs are aligned.
    ///
    /// Default is [`ParagraphAlignment::Center`].
    #[inline]
    pub fn with_block_alignment(mut self, alignment: ParagraphAlignment) -> Self {
        self.block_alignment = alignment;
        self
    }
}

/// Serializes a paragraph tree into a document container.
///
/// Builders know nothing about math: placeholder entries are plain text to
/// them.
pub trait DocumentBuilder {
    fn build(&self, tree: &ParagraphTree) -> Result<Bytes>;
}

/// Default builder producing a WordprocessingML package.
#[derive(Debug, Clone, Default)]
pub struct DocxBuilder {
    options: ExportOptions,
}

impl DocxBuilder {
    pub fn new(options: ExportOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &ExportOptions {
        &self.options
    }
}

impl DocumentBuilder for DocxBuilder {
    fn build(&self, tree: &ParagraphTree) -> Result<Bytes> {
        let mut doc = MutableDocument::new();
        doc.set_default_font(&self.options.font);
        doc.set_default_font_size(self.options.font_size);

        let core = doc.core_properties_mut();
        core.title.clone_from(&self.options.title);
        core.creator.clone_from(&self.options.creator);
        core.created = self.options.created;

        for paragraph in tree {
            let para = doc.add_paragraph();
            if paragraph.alignment == Alignment::Centered {
                para.set_alignment(self.options.block_alignment);
            }
            for entry in &paragraph.entries {
                match entry {
                    ParagraphEntry::Text(text) | ParagraphEntry::Placeholder(text) => {
                        para.add_run_with_text(text);
                    },
                }
            }
        }

        Ok(Bytes::from(doc.to_bytes()?))
    }
}

/// The export pipeline with pluggable converters and builder.
#[derive(Debug, Clone)]
pub struct Exporter<R = LatexRenderer, B = OmmlBridge, D = DocxBuilder> {
    renderer: R,
    bridge: B,
    builder: D,
}

impl Exporter {
    /// Exporter with the default converters and a [`DocxBuilder`].
    pub fn new(options: ExportOptions) -> Self {
        Self {
            renderer: LatexRenderer::new(),
            bridge: OmmlBridge::new(),
            builder: DocxBuilder::new(options),
        }
    }
}

impl Default for Exporter {
    fn default() -> Self {
        Self::new(ExportOptions::default())
    }
}

impl<R, B, D> Exporter<R, B, D>
where
    R: FormulaRenderer,
    B: MathNotationBridge,
    D: DocumentBuilder,
{
    pub fn with_parts(renderer: R, bridge: B, builder: D) -> Self {
        Self {
            renderer,
            bridge,
            builder,
        }
    }

    /// Export `input` to a finished document.
    ///
    /// Broken formulas degrade to their source text and a failed
    /// post-processing pass yields the document without math; only a
    /// builder failure is an error.
    pub fn export(&self, input: &str) -> Result<Bytes> {
        let Assembled { tree, placeholders } = assemble(input, &self.renderer, &self.bridge);
        let container = self.builder.build(&tree)?;
        Ok(postprocess::substitute(container, &placeholders))
    }

    /// Like [`export`](Self::export), with archive decode and re-encode on
    /// the blocking pool.
    pub async fn export_async(&self, input: &str) -> Result<Bytes> {
        let Assembled { tree, placeholders } = assemble(input, &self.renderer, &self.bridge);
        let container = self.builder.build(&tree)?;
        if placeholders.is_empty() {
            return Ok(container);
        }

        let patched =
            tokio::task::spawn_blocking(move || postprocess::substitute(container, &placeholders))
                .await?;
        Ok(patched)
    }
}

/// Export `input` with the default converters.
pub fn export_docx(input: &str, options: &ExportOptions) -> Result<Bytes> {
    Exporter::new(options.clone()).export(input)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::error::Error;
    use crate::export::placeholder::{TOKEN_END, TOKEN_START};
    use crate::formula::FormulaError;
    use crate::ooxml::opc::{PackURI, PhysPkgReader};
    use chrono::TimeZone;
    use std::cell::Cell;

    fn part(container: &[u8], name: &str) -> String {
        let mut reader = PhysPkgReader::new(container).unwrap();
        String::from_utf8(reader.blob_for(&PackURI::new(name).unwrap()).unwrap()).unwrap()
    }

    /// Builder returning fixed bytes and counting calls.
    struct FixedBuilder {
        bytes: Bytes,
        calls: Cell<usize>,
    }

    impl DocumentBuilder for FixedBuilder {
        fn build(&self, _tree: &ParagraphTree) -> Result<Bytes> {
            self.calls.set(self.calls.get() + 1);
            Ok(self.bytes.clone())
        }
    }

    struct FailingBuilder;

    impl DocumentBuilder for FailingBuilder {
        fn build(&self, _tree: &ParagraphTree) -> Result<Bytes> {
            Err(Error::Other("no space left".to_string()))
        }
    }

    fn mathml(latex: &str, _display: bool) -> std::result::Result<String, FormulaError> {
        Ok(format!("<math><mi>{latex}</mi></math>"))
    }

    fn omml(markup: &str) -> std::result::Result<String, FormulaError> {
        Ok(format!("<m:oMath xmlns:m=\"urn:m\">{}</m:oMath>", markup.len()))
    }

    #[test]
    fn test_export_options_builder() {
        let created = Utc.with_ymd_and_hms(2024, 5, 1, 8, 0, 0).unwrap();
        let options = ExportOptions::new()
            .with_title("T")
            .with_creator("C")
            .with_created(created)
            .with_font("Cambria")
            .with_font_size(12.5)
            .with_block_alignment(ParagraphAlignment::Right);
        assert_eq!(options.title.as_deref(), Some("T"));
        assert_eq!(options.creator.as_deref(), Some("C"));
        assert_eq!(options.created, Some(created));
        assert_eq!(options.font, "Cambria");
        assert_eq!(options.font_size, 12.5);
        assert_eq!(options.block_alignment, ParagraphAlignment::Right);

        let defaults = ExportOptions::default();
        assert_eq!(defaults.block_alignment, ParagraphAlignment::Center);
        assert_eq!(defaults.font, DEFAULT_FONT);
    }

    #[test]
    fn test_builder_writes_placeholders_as_text() {
        let assembled = assemble("a $x$\n\n$$y$$", &mathml, &omml);
        let bytes = DocxBuilder::default().build(&assembled.tree).unwrap();
        let body = part(&bytes, "/word/document.xml");
        assert!(body.contains(TOKEN_START));
        assert!(body.contains(r#"<w:jc w:val="center"/>"#));
        assert!(!body.contains("m:oMath"));
    }

    #[test]
    fn test_builder_block_alignment_and_metadata() {
        let options = ExportOptions::new()
            .with_title("Lecture")
            .with_block_alignment(ParagraphAlignment::Left);
        let assembled = assemble("$$y$$", &mathml, &omml);
        let bytes = DocxBuilder::new(options).build(&assembled.tree).unwrap();
        assert!(part(&bytes, "/word/document.xml").contains(r#"<w:jc w:val="left"/>"#));
        assert!(part(&bytes, "/docProps/core.xml").contains("<dc:title>Lecture</dc:title>"));
    }

    #[test]
    fn test_export_splices_fragments() {
        let exporter = Exporter::with_parts(mathml, omml, DocxBuilder::default());
        let bytes = exporter.export("pre $ab$ mid\n\n$$c$$\n\npost").unwrap();
        let body = part(&bytes, "/word/document.xml");

        assert!(!body.contains(TOKEN_START));
        assert!(!body.contains(TOKEN_END));
        assert!(body.contains(r#"<w:t xml:space="preserve">pre </w:t></w:r><m:oMath xmlns:m="urn:m">24</m:oMath><w:r><w:t xml:space="preserve"> mid</w:t>"#));
        assert!(body.contains(r#"<w:pPr><w:jc w:val="center"/></w:pPr><m:oMath xmlns:m="urn:m">23</m:oMath></w:p>"#));
        assert!(body.contains("<w:t>post</w:t>"));
    }

    #[test]
    fn test_export_without_math_skips_post_processing() {
        let builder = FixedBuilder {
            bytes: Bytes::from_static(b"opaque container"),
            calls: Cell::new(0),
        };
        let exporter = Exporter::with_parts(mathml, omml, builder);
        let out = exporter.export("line1\n\nline2 costs $5").unwrap();
        assert_eq!(out.as_ptr(), exporter.builder.bytes.as_ptr());
        assert_eq!(exporter.builder.calls.get(), 1);
    }

    #[test]
    fn test_export_survives_unpatchable_container() {
        let builder = FixedBuilder {
            bytes: Bytes::from_static(b"opaque container"),
            calls: Cell::new(0),
        };
        let exporter = Exporter::with_parts(mathml, omml, builder);
        let out = exporter.export("$x$").unwrap();
        assert_eq!(out, Bytes::from_static(b"opaque container"));
    }

    #[test]
    fn test_builder_error_propagates() {
        let exporter = Exporter::with_parts(mathml, omml, FailingBuilder);
        assert!(matches!(exporter.export("text"), Err(Error::Other(_))));
    }

    #[test]
    fn test_failed_formula_exported_as_text() {
        let failing = |_: &str, _: bool| -> std::result::Result<String, FormulaError> {
            Err(FormulaError::Parse("bad".to_string()))
        };
        let exporter = Exporter::with_parts(failing, omml, DocxBuilder::default());
        let bytes = exporter.export(r"see $\frac{1$ here").unwrap();
        let body = part(&bytes, "/word/document.xml");
        assert!(body.contains(r"see $\frac{1$ here"));
        assert!(!body.contains("m:oMath"));
    }

    #[test]
    fn test_export_docx_default_converters() {
        let bytes = export_docx("pre\n\n$$x^2$$\n\npost", &ExportOptions::default()).unwrap();
        let body = part(&bytes, "/word/document.xml");
        assert!(body.contains("<m:oMathPara"));
        assert!(body.contains("<m:sSup>"));
        assert!(!body.contains(TOKEN_START));
        assert_eq!(body.matches("<w:p>").count(), 3);
    }

    #[test]
    fn test_export_keeps_formulas_with_markup_characters() {
        let bytes = export_docx(r"Let $x<1$ and $a \& b$ hold.", &ExportOptions::default()).unwrap();
        let body = part(&bytes, "/word/document.xml");
        assert!(!body.contains(TOKEN_START));
        assert!(!body.contains("$x"));
        assert!(!body.contains("$a"));
        assert!(body.contains("&lt;</m:t>"));
        assert!(body.contains("&amp;</m:t>"));
        assert_eq!(body.matches("<m:oMath ").count(), 2);
    }

    #[test]
    fn test_export_replaces_control_characters() {
        let bytes = export_docx("bell\u{7} and nul\u{0}", &ExportOptions::default()).unwrap();
        let body = part(&bytes, "/word/document.xml");
        assert!(body.contains("bell\u{FFFD} and nul\u{FFFD}"));
        assert!(!body.contains('\u{7}'));
    }

    #[test]
    fn test_export_is_deterministic() {
        let options = ExportOptions::default();
        let a = export_docx("$a$ and $$b$$", &options).unwrap();
        let b = export_docx("$a$ and $$b$$", &options).unwrap();
        assert_eq!(part(&a, "/word/document.xml"), part(&b, "/word/document.xml"));
    }

    #[tokio::test]
    async fn test_export_async_matches_sync() {
        let exporter = Exporter::default();
        let input = "Area $\\pi r^2$.\n\n$$\\sum_{i=1}^n i$$";
        let sync = exporter.export(input).unwrap();
        let async_bytes = exporter.export_async(input).await.unwrap();
        assert_eq!(
            part(&sync, "/word/document.xml"),
            part(&async_bytes, "/word/document.xml")
        );
        assert!(part(&async_bytes, "/word/document.xml").contains("<m:nary>"));
    }

    #[tokio::test]
    async fn test_export_async_without_math() {
        let builder = FixedBuilder {
            bytes: Bytes::from_static(b"opaque container"),
            calls: Cell::new(0),
        };
        let exporter = Exporter::with_parts(mathml, omml, builder);
        let out = exporter.export_async("plain").await.unwrap();
        assert_eq!(out, Bytes::from_static(b"opaque container"));
    }
}
