//! Splitting a transcript into a leading keyword and the rest.

/// A transcript split at its first whitespace boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Decomposed<'a> {
    /// First whitespace-delimited token. Never empty.
    pub keyword: &'a str,
    /// Everything after the keyword, leading whitespace removed. May be empty.
    pub remainder: &'a str,
}

/// Split `text` into `(keyword, remainder)`.
///
/// Returns `None` for empty or whitespace-only text: there is nothing to
/// dispatch. No case folding or punctuation stripping is applied.
pub fn decompose(text: &str) -> Option<Decomposed<'_>> {
    let text = text.trim_start();
    if text.is_empty() {
        return None;
    }
    let (keyword, remainder) = match text.find(char::is_whitespace) {
        Some(idx) => (&text[..idx], text[idx..].trim_start()),
        None => (text, ""),
    };
    Some(Decomposed { keyword, remainder })
}
