use phf::{phf_map, phf_set};

/// MathML element kinds the bridge distinguishes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum Tag {
    /// Containers whose children form an inline row
    Row,
    /// Only the first child is presentation markup
    Semantics,
    /// Dropped without output
    Ignored,
    Identifier,
    Number,
    Operator,
    Text,
    StringLiteral,
    Space,
    Fraction,
    Sqrt,
    Root,
    Sup,
    Sub,
    SubSup,
    Under,
    Over,
    UnderOver,
    Fenced,
    Table,
    TableRow,
    LabeledRow,
    TableCell,
    /// Only the selected (first) child is shown
    Action,
}

/// Fast MathML element name to kind lookup using PHF
pub(super) static MATHML_TAGS: phf::Map<&'static str, Tag> = phf_map! {
    "math" => Tag::Row,
    "mrow" => Tag::Row,
    "mstyle" => Tag::Row,
    "mpadded" => Tag::Row,
    "mphantom" => Tag::Row,
    "menclose" => Tag::Row,
    "semantics" => Tag::Semantics,
    "annotation" => Tag::Ignored,
    "annotation-xml" => Tag::Ignored,
    "none" => Tag::Ignored,
    "mi" => Tag::Identifier,
    "mn" => Tag::Number,
    "mo" => Tag::Operator,
    "mtext" => Tag::Text,
    "ms" => Tag::StringLiteral,
    "mspace" => Tag::Space,
    "mfrac" => Tag::Fraction,
    "msqrt" => Tag::Sqrt,
    "mroot" => Tag::Root,
    "msup" => Tag::Sup,
    "msub" => Tag::Sub,
    "msubsup" => Tag::SubSup,
    "munder" => Tag::Under,
    "mover" => Tag::Over,
    "munderover" => Tag::UnderOver,
    "mfenced" => Tag::Fenced,
    "mtable" => Tag::Table,
    "mtr" => Tag::TableRow,
    "mlabeledtr" => Tag::LabeledRow,
    "mtd" => Tag::TableCell,
    "maction" => Tag::Action,
};

/// Large operators rendered as OMML n-ary objects
pub(super) static NARY_OPERATORS: phf::Set<char> = phf_set! {
    '∑', '∏', '∐', '∫', '∬', '∭', '⨌', '∮', '∯', '∰',
    '⋀', '⋁', '⋂', '⋃', '⨀', '⨁', '⨂', '⨄', '⨆',
};

/// Operators placed over a base that map to `m:acc`, keyed by the spacing
/// form MathML uses and valued by the combining mark OMML expects.
pub(super) static ACCENTS: phf::Map<char, char> = phf_map! {
    '^' => '\u{0302}',
    'ˆ' => '\u{0302}',
    '~' => '\u{0303}',
    '˜' => '\u{0303}',
    '˙' => '\u{0307}',
    '¨' => '\u{0308}',
    'ˇ' => '\u{030C}',
    '˘' => '\u{0306}',
    '´' => '\u{0301}',
    '`' => '\u{0300}',
    '˚' => '\u{030A}',
    '→' => '\u{20D7}',
    '←' => '\u{20D6}',
    '↔' => '\u{20E1}',
};

/// Horizontal lines over or under a base, mapped to `m:bar`
pub(super) static BARS: phf::Set<char> = phf_set! {
    '¯', '‾', '_', '―', '−', '‐',
};

/// Stretchy braces and brackets mapped to `m:groupChr`
pub(super) static GROUP_CHARS: phf::Set<char> = phf_set! {
    '⏞', '⏟', '⏜', '⏝', '⎴', '⎵', '⏠', '⏡',
};

/// OMML `m:scr` / `m:sty` values for a MathML `mathvariant`.
pub(super) fn variant_properties(variant: &str) -> (Option<&'static str>, Option<&'static str>) {
    match variant {
        "normal" => (None, Some("p")),
        "bold" => (None, Some("b")),
        "italic" => (None, Some("i")),
        "bold-italic" => (None, Some("bi")),
        "double-struck" => (Some("double-struck"), Some("p")),
        "script" => (Some("script"), Some("p")),
        "bold-script" => (Some("script"), Some("b")),
        "fraktur" => (Some("fraktur"), Some("p")),
        "bold-fraktur" => (Some("fraktur"), Some("b")),
        "sans-serif" => (Some("sans-serif"), Some("p")),
        "bold-sans-serif" => (Some("sans-serif"), Some("b")),
        "monospace" => (Some("monospace"), Some("p")),
        _ => (None, None),
    }
}
