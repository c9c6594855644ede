use super::lookup::{ACCENTS, BARS, GROUP_CHARS, MATHML_TAGS, NARY_OPERATORS, Tag, variant_properties};
use super::mathml::{Element, Node};
use super::OMML_NAMESPACE;
use crate::common::xml::escape_xml;
use crate::formula::FormulaError;

/// Run style for a token element.
#[derive(Debug, Clone, Copy, Default)]
struct RunStyle {
    script: Option<&'static str>,
    style: Option<&'static str>,
    normal_text: bool,
}

/// The pieces of an n-ary construct (∑, ∫, …) found in a row.
struct Nary<'a> {
    chr: char,
    sub: Option<&'a Element>,
    sup: Option<&'a Element>,
    under_over: bool,
}

/// Serialize a parsed `math` element as a self-contained OMML fragment.
pub(super) fn write_math(root: &Element) -> Result<String, FormulaError> {
    let display = root.attr("display") == Some("block") || root.attr("mode") == Some("display");

    let mut writer = OmmlWriter::with_capacity(256);
    if display {
        writer.out.push_str(r#"<m:oMathPara xmlns:m=""#);
        writer.out.push_str(OMML_NAMESPACE);
        writer.out.push_str(r#""><m:oMath>"#);
    } else {
        writer.out.push_str(r#"<m:oMath xmlns:m=""#);
        writer.out.push_str(OMML_NAMESPACE);
        writer.out.push_str(r#"">"#);
    }

    writer.write_row(&root.children)?;

    writer.out.push_str("</m:oMath>");
    if display {
        writer.out.push_str("</m:oMathPara>");
    }
    Ok(writer.out)
}

struct OmmlWriter {
    out: String,
}

impl OmmlWriter {
    fn with_capacity(capacity: usize) -> Self {
        Self {
            out: String::with_capacity(capacity),
        }
    }

    /// Write a sequence of sibling nodes, folding large operators with their operand.
    fn write_row(&mut self, nodes: &[Node]) -> Result<(), FormulaError> {
        let mut i = 0;
        while i < nodes.len() {
            if let Node::Element(el) = &nodes[i]
                && let Some(nary) = nary_parts(el)?
            {
                // The next non-operator sibling becomes the n-ary operand
                let operand = nodes[i + 1..].iter().position(|n| matches!(n, Node::Element(_)));
                let operand = operand.and_then(|offset| match &nodes[i + 1 + offset] {
                    Node::Element(next) if next.name != "mo" => Some((offset, next)),
                    _ => None,
                });
                self.write_nary(&nary, operand.map(|(_, next)| next))?;
                i += 1 + operand.map_or(0, |(offset, _)| offset + 1);
                continue;
            }
            self.write_node(&nodes[i])?;
            i += 1;
        }
        Ok(())
    }

    fn write_node(&mut self, node: &Node) -> Result<(), FormulaError> {
        match node {
            Node::Text(text) => {
                let text = trim_token(text);
                if !text.is_empty() {
                    self.write_run(text, RunStyle::default());
                }
                Ok(())
            },
            Node::Element(el) => self.write_element(el),
        }
    }

    fn write_element(&mut self, el: &Element) -> Result<(), FormulaError> {
        let tag = MATHML_TAGS.get(el.name.as_str()).copied().ok_or_else(|| {
            FormulaError::Conversion(format!("unsupported MathML element <{}>", el.name))
        })?;

        match tag {
            Tag::Row | Tag::TableRow | Tag::TableCell => self.write_row(&el.children),
            Tag::Semantics | Tag::Action => match el.element_children().next() {
                Some(first) => self.write_element(first),
                None => Ok(()),
            },
            Tag::Ignored => Ok(()),
            Tag::Identifier => {
                let text = el.text();
                let text = trim_token(&text);
                let mut style = match el.attr("mathvariant") {
                    Some(variant) => {
                        let (script, style) = variant_properties(variant);
                        RunStyle { script, style, normal_text: false }
                    },
                    None => RunStyle::default(),
                };
                // Multi-letter identifiers (function names) are upright by default
                if el.attr("mathvariant").is_none() && text.chars().count() > 1 {
                    style.style = Some("p");
                }
                if !text.is_empty() {
                    self.write_run(text, style);
                }
                Ok(())
            },
            Tag::Number | Tag::Operator => {
                let text = el.text();
                let text = trim_token(&text);
                if !text.is_empty() {
                    self.write_run(text, RunStyle { style: Some("p"), ..Default::default() });
                }
                Ok(())
            },
            Tag::Text => {
                let text = el.text();
                let text = trim_token(&text);
                if !text.is_empty() {
                    self.write_run(text, RunStyle { normal_text: true, ..Default::default() });
                }
                Ok(())
            },
            Tag::StringLiteral => {
                let lquote = el.attr("lquote").unwrap_or("\"");
                let rquote = el.attr("rquote").unwrap_or("\"");
                let text = format!("{}{}{}", lquote, trim_token(&el.text()), rquote);
                self.write_run(&text, RunStyle { normal_text: true, ..Default::default() });
                Ok(())
            },
            Tag::Space => {
                self.write_run(" ", RunStyle { normal_text: true, ..Default::default() });
                Ok(())
            },
            Tag::Fraction => {
                let [num, den] = exact_children::<2>(el)?;
                let no_bar = el.attr("linethickness").is_some_and(is_zero_length);
                let skewed = el.attr("bevelled") == Some("true");
                self.out.push_str("<m:f>");
                if no_bar {
                    self.out.push_str(r#"<m:fPr><m:type m:val="noBar"/></m:fPr>"#);
                } else if skewed {
                    self.out.push_str(r#"<m:fPr><m:type m:val="skw"/></m:fPr>"#);
                }
                self.write_arg("num", Some(num))?;
                self.write_arg("den", Some(den))?;
                self.out.push_str("</m:f>");
                Ok(())
            },
            Tag::Sqrt => {
                self.out.push_str(r#"<m:rad><m:radPr><m:degHide m:val="1"/></m:radPr><m:deg/><m:e>"#);
                self.write_row(&el.children)?;
                self.out.push_str("</m:e></m:rad>");
                Ok(())
            },
            Tag::Root => {
                let [base, index] = exact_children::<2>(el)?;
                self.out.push_str("<m:rad>");
                self.write_arg("deg", Some(index))?;
                self.write_arg("e", Some(base))?;
                self.out.push_str("</m:rad>");
                Ok(())
            },
            Tag::Sup => {
                let [base, sup] = exact_children::<2>(el)?;
                self.out.push_str("<m:sSup>");
                self.write_arg("e", Some(base))?;
                self.write_arg("sup", Some(sup))?;
                self.out.push_str("</m:sSup>");
                Ok(())
            },
            Tag::Sub => {
                let [base, sub] = exact_children::<2>(el)?;
                self.out.push_str("<m:sSub>");
                self.write_arg("e", Some(base))?;
                self.write_arg("sub", Some(sub))?;
                self.out.push_str("</m:sSub>");
                Ok(())
            },
            Tag::SubSup => {
                let [base, sub, sup] = exact_children::<3>(el)?;
                self.out.push_str("<m:sSubSup>");
                self.write_arg("e", Some(base))?;
                self.write_arg("sub", Some(sub))?;
                self.write_arg("sup", Some(sup))?;
                self.out.push_str("</m:sSubSup>");
                Ok(())
            },
            Tag::Under => {
                let [base, under] = exact_children::<2>(el)?;
                self.write_under(base, under)
            },
            Tag::Over => {
                let [base, over] = exact_children::<2>(el)?;
                self.write_over(base, over)
            },
            Tag::UnderOver => {
                let [base, under, over] = exact_children::<3>(el)?;
                self.out.push_str("<m:limUpp><m:e>");
                self.write_under(base, under)?;
                self.out.push_str("</m:e>");
                self.write_arg("lim", Some(over))?;
                self.out.push_str("</m:limUpp>");
                Ok(())
            },
            Tag::Fenced => self.write_fenced(el),
            Tag::Table => self.write_table(el),
            Tag::LabeledRow => {
                // The first cell of a labeled row is the equation label
                for cell in el.element_children().skip(1) {
                    self.write_element(cell)?;
                }
                Ok(())
            },
        }
    }

    fn write_under(&mut self, base: &Element, under: &Element) -> Result<(), FormulaError> {
        if let Some(chr) = single_operator_char(under) {
            if BARS.contains(&chr) {
                self.out.push_str(r#"<m:bar><m:barPr><m:pos m:val="bot"/></m:barPr>"#);
                self.write_arg("e", Some(base))?;
                self.out.push_str("</m:bar>");
                return Ok(());
            }
            if GROUP_CHARS.contains(&chr) {
                return self.write_group_chr(base, chr, "bot");
            }
        }
        self.out.push_str("<m:limLow>");
        self.write_arg("e", Some(base))?;
        self.write_arg("lim", Some(under))?;
        self.out.push_str("</m:limLow>");
        Ok(())
    }

    fn write_over(&mut self, base: &Element, over: &Element) -> Result<(), FormulaError> {
        if let Some(chr) = single_operator_char(over) {
            if BARS.contains(&chr) {
                self.out.push_str(r#"<m:bar><m:barPr><m:pos m:val="top"/></m:barPr>"#);
                self.write_arg("e", Some(base))?;
                self.out.push_str("</m:bar>");
                return Ok(());
            }
            if GROUP_CHARS.contains(&chr) {
                return self.write_group_chr(base, chr, "top");
            }
            let accent = ACCENTS.get(&chr).copied().or_else(|| is_combining(chr).then_some(chr));
            if let Some(accent) = accent {
                self.out.push_str(r#"<m:acc><m:accPr><m:chr m:val=""#);
                self.out.push(accent);
                self.out.push_str(r#""/></m:accPr>"#);
                self.write_arg("e", Some(base))?;
                self.out.push_str("</m:acc>");
                return Ok(());
            }
        }
        self.out.push_str("<m:limUpp>");
        self.write_arg("e", Some(base))?;
        self.write_arg("lim", Some(over))?;
        self.out.push_str("</m:limUpp>");
        Ok(())
    }

    fn write_group_chr(&mut self, base: &Element, chr: char, pos: &str) -> Result<(), FormulaError> {
        let vert = if pos == "top" { "bot" } else { "top" };
        self.out.push_str(r#"<m:groupChr><m:groupChrPr><m:chr m:val=""#);
        self.out.push(chr);
        self.out.push_str(r#""/><m:pos m:val=""#);
        self.out.push_str(pos);
        self.out.push_str(r#""/><m:vertJc m:val=""#);
        self.out.push_str(vert);
        self.out.push_str(r#""/></m:groupChrPr>"#);
        self.write_arg("e", Some(base))?;
        self.out.push_str("</m:groupChr>");
        Ok(())
    }

    fn write_nary(&mut self, nary: &Nary<'_>, operand: Option<&Element>) -> Result<(), FormulaError> {
        self.out.push_str(r#"<m:nary><m:naryPr><m:chr m:val=""#);
        self.out.push(nary.chr);
        self.out.push_str(r#""/><m:limLoc m:val=""#);
        self.out.push_str(if nary.under_over { "undOvr" } else { "subSup" });
        self.out.push_str(r#""/>"#);
        if nary.sub.is_none() {
            self.out.push_str(r#"<m:subHide m:val="1"/>"#);
        }
        if nary.sup.is_none() {
            self.out.push_str(r#"<m:supHide m:val="1"/>"#);
        }
        self.out.push_str("</m:naryPr>");
        self.write_arg("sub", nary.sub)?;
        self.write_arg("sup", nary.sup)?;
        self.write_arg("e", operand)?;
        self.out.push_str("</m:nary>");
        Ok(())
    }

    fn write_fenced(&mut self, el: &Element) -> Result<(), FormulaError> {
        let open = el.attr("open").unwrap_or("(");
        let close = el.attr("close").unwrap_or(")");
        let separator = el
            .attr("separators")
            .map(|s| s.trim().chars().next().map(String::from).unwrap_or_default())
            .unwrap_or_else(|| ",".to_string());

        self.out.push_str(r#"<m:d><m:dPr><m:begChr m:val=""#);
        self.out.push_str(&escape_xml(open));
        self.out.push_str(r#""/><m:sepChr m:val=""#);
        self.out.push_str(&escape_xml(&separator));
        self.out.push_str(r#""/><m:endChr m:val=""#);
        self.out.push_str(&escape_xml(close));
        self.out.push_str(r#""/></m:dPr>"#);
        let mut any = false;
        for child in el.element_children() {
            self.write_arg("e", Some(child))?;
            any = true;
        }
        if !any {
            self.out.push_str("<m:e/>");
        }
        self.out.push_str("</m:d>");
        Ok(())
    }

    fn write_table(&mut self, el: &Element) -> Result<(), FormulaError> {
        let rows: Vec<Vec<&Element>> = el
            .element_children()
            .map(|row| match MATHML_TAGS.get(row.name.as_str()) {
                Some(Tag::TableRow) => row.element_children().collect(),
                Some(Tag::LabeledRow) => row.element_children().skip(1).collect(),
                // A bare cell or expression stands for a one-cell row
                _ => vec![row],
            })
            .collect();
        let columns = rows.iter().map(Vec::len).max().unwrap_or(0).max(1);

        self.out.push_str("<m:m><m:mPr><m:mcs><m:mc><m:mcPr>");
        self.out.push_str(&format!(r#"<m:count m:val="{}"/>"#, columns));
        self.out.push_str(r#"<m:mcJc m:val="center"/></m:mcPr></m:mc></m:mcs></m:mPr>"#);
        for row in &rows {
            self.out.push_str("<m:mr>");
            for cell in row {
                self.write_arg("e", Some(cell))?;
            }
            for _ in row.len()..columns {
                self.out.push_str("<m:e/>");
            }
            self.out.push_str("</m:mr>");
        }
        self.out.push_str("</m:m>");
        Ok(())
    }

    /// Write `<m:{name}>` around an optional argument.
    fn write_arg(&mut self, name: &str, arg: Option<&Element>) -> Result<(), FormulaError> {
        match arg {
            None => {
                self.out.push_str("<m:");
                self.out.push_str(name);
                self.out.push_str("/>");
            },
            Some(el) => {
                self.out.push_str("<m:");
                self.out.push_str(name);
                self.out.push('>');
                self.write_element(el)?;
                self.out.push_str("</m:");
                self.out.push_str(name);
                self.out.push('>');
            },
        }
        Ok(())
    }

    fn write_run(&mut self, text: &str, style: RunStyle) {
        self.out.push_str("<m:r>");
        if style.script.is_some() || style.style.is_some() || style.normal_text {
            self.out.push_str("<m:rPr>");
            if style.normal_text {
                self.out.push_str("<m:nor/>");
            }
            if let Some(script) = style.script {
                self.out.push_str(r#"<m:scr m:val=""#);
                self.out.push_str(script);
                self.out.push_str(r#""/>"#);
            }
            if let Some(sty) = style.style {
                self.out.push_str(r#"<m:sty m:val=""#);
                self.out.push_str(sty);
                self.out.push_str(r#""/>"#);
            }
            self.out.push_str("</m:rPr>");
        }
        if text.starts_with(' ') || text.ends_with(' ') {
            self.out.push_str(r#"<m:t xml:space="preserve">"#);
        } else {
            self.out.push_str("<m:t>");
        }
        self.out.push_str(&escape_xml(text));
        self.out.push_str("</m:t></m:r>");
    }
}

/// Token content without surrounding XML whitespace (non-breaking spaces stay).
fn trim_token(text: &str) -> &str {
    text.trim_matches(|c: char| c.is_ascii_whitespace())
}

/// Exactly `N` element children, as MathML script and fraction schemata require.
fn exact_children<const N: usize>(el: &Element) -> Result<[&Element; N], FormulaError> {
    let children: Vec<&Element> = el.element_children().collect();
    let count = children.len();
    children.try_into().map_err(|_| {
        FormulaError::Conversion(format!(
            "<{}> expects {} children, found {}",
            el.name, N, count
        ))
    })
}

/// The character of an `mo` holding exactly one character.
fn single_operator_char(el: &Element) -> Option<char> {
    if el.name != "mo" {
        return None;
    }
    let text = el.text();
    let mut chars = trim_token(&text).chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) => Some(c),
        _ => None,
    }
}

/// `0`, `0px`, `0.0em` and the like.
fn is_zero_length(value: &str) -> bool {
    let number: String = value
        .trim()
        .chars()
        .take_while(|c| c.is_ascii_digit() || *c == '.')
        .collect();
    !number.is_empty() && number.chars().all(|c| c == '0' || c == '.')
}

fn is_combining(chr: char) -> bool {
    matches!(chr, '\u{0300}'..='\u{036F}' | '\u{20D0}'..='\u{20FF}')
}

/// Recognize a large operator, bare or carrying limits.
fn nary_parts(el: &Element) -> Result<Option<Nary<'_>>, FormulaError> {
    let large = |e: &Element| single_operator_char(e).filter(|c| NARY_OPERATORS.contains(c));

    let nary = match el.name.as_str() {
        "mo" => large(el).map(|chr| Nary { chr, sub: None, sup: None, under_over: false }),
        "msub" | "munder" => {
            let [base, sub] = exact_children::<2>(el)?;
            large(base).map(|chr| Nary { chr, sub: Some(sub), sup: None, under_over: el.name == "munder" })
        },
        "msup" | "mover" => {
            let [base, sup] = exact_children::<2>(el)?;
            large(base).map(|chr| Nary { chr, sub: None, sup: Some(sup), under_over: el.name == "mover" })
        },
        "msubsup" | "munderover" => {
            let [base, sub, sup] = exact_children::<3>(el)?;
            large(base).map(|chr| Nary {
                chr,
                sub: Some(sub),
                sup: Some(sup),
                under_over: el.name == "munderover",
            })
        },
        _ => None,
    };
    Ok(nary)
}
