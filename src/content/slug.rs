//! Slug generation for anchors and block ids

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref NON_SLUG_RUN: Regex = Regex::new(r"[^a-z0-9]+").unwrap();
}

/// Normalize `text` into an identifier made of `[a-z0-9-]`.
///
/// The text is lower-cased, every run of other characters becomes a single
/// hyphen and hyphens at either end are trimmed. Distinct inputs can map to
/// the same slug; callers get no deduplication.
///
/// # Examples
/// ```
/// use postmill::content::slugify;
///
/// assert_eq!(slugify("Hello, World!"), "hello-world");
/// assert_eq!(slugify("  --Plasma  Pyrolysis 101-- "), "plasma-pyrolysis-101");
/// ```
pub fn slugify(text: &str) -> String {
    let lowered = text.to_lowercase();
    NON_SLUG_RUN
        .replace_all(&lowered, "-")
        .trim_matches('-')
        .to_string()
}
