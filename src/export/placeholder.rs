//! Placeholder tokens standing in for math fragments inside the document body.
//!
//! A token is `U+E000 texdocx-math-<ordinal> U+E001`. The sentinels are
//! private-use code points, so [`sanitize`] can strip them from user text and
//! no literal token survives into the paragraph tree.

use std::borrow::Cow;

/// Opening sentinel of a token
pub const TOKEN_START: char = '\u{E000}';
/// Closing sentinel of a token
pub const TOKEN_END: char = '\u{E001}';

const TOKEN_PREFIX: &str = "texdocx-math-";

/// Token for the `ordinal`-th registered fragment.
///
/// ```
/// use texdocx::export::placeholder::token;
///
/// assert_eq!(token(3), "\u{E000}texdocx-math-3\u{E001}");
/// ```
pub fn token(ordinal: usize) -> String {
    format!("{}{}{}{}", TOKEN_START, TOKEN_PREFIX, ordinal, TOKEN_END)
}

/// Ordinal encoded in `text`, if `text` is exactly a token.
pub fn parse_token(text: &str) -> Option<usize> {
    let digits = text
        .strip_prefix(TOKEN_START)?
        .strip_suffix(TOKEN_END)?
        .strip_prefix(TOKEN_PREFIX)?;
    // Canonical form only: no sign, no leading zeros
    if digits.is_empty()
        || !digits.bytes().all(|b| b.is_ascii_digit())
        || (digits.len() > 1 && digits.starts_with('0'))
    {
        return None;
    }
    digits.parse().ok()
}

/// Replace token sentinels in user text with U+FFFD.
pub fn sanitize(text: &str) -> Cow<'_, str> {
    if text.contains([TOKEN_START, TOKEN_END]) {
        Cow::Owned(text.replace([TOKEN_START, TOKEN_END], "\u{FFFD}"))
    } else {
        Cow::Borrowed(text)
    }
}

/// Token → OMML fragment mapping built during assembly.
///
/// Ordinals are handed out sequentially from zero, so the fragment for a
/// token is found by index.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PlaceholderMap {
    fragments: Vec<String>,
}

impl PlaceholderMap {
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a fragment and return its fresh token.
    pub fn register(&mut self, fragment: String) -> String {
        let token = token(self.fragments.len());
        self.fragments.push(fragment);
        token
    }

    /// Fragment registered under `token`.
    pub fn get(&self, token: &str) -> Option<&str> {
        parse_token(token)
            .and_then(|ordinal| self.fragments.get(ordinal))
            .map(String::as_str)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.fragments.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.fragments.is_empty()
    }

    /// `(token, fragment)` pairs in registration order.
    pub fn iter(&self) -> impl Iterator<Item = (String, &str)> {
        self.fragments
            .iter()
            .enumerate()
            .map(|(ordinal, fragment)| (token(ordinal), fragment.as_str()))
    }
}
