//! Text normalization shared by every text comparison in the pipeline.
//!
//! Header matching, sector categorization and keyword extraction all go
//! through [`normalize`] so that "Ubicación", "ubicacion" and "UBICACION "
//! compare equal.

use std::collections::HashSet;
use unicode_normalization::UnicodeNormalization;
use unicode_normalization::char::is_combining_mark;

/// Lowercases, trims and strips accents from a string.
///
/// Accented characters are NFD-decomposed and the combining marks dropped,
/// so "Calificación" becomes "calificacion".
pub fn normalize(value: &str) -> String {
    value
        .trim()
        .to_lowercase()
        .nfd()
        .filter(|c| !is_combining_mark(*c))
        .collect()
}

/// Splits normalized text into alphanumeric tokens.
pub fn tokenize(text: &str) -> Vec<String> {
    normalize(text)
        .split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect()
}

/// Extracts content keywords from a comment: tokenizes, drops stop-words
/// and drops tokens shorter than `min_token_len` characters.
pub fn extract_keywords(
    text: &str,
    stop_words: &HashSet<String>,
    min_token_len: usize,
) -> Vec<String> {
    tokenize(text)
        .into_iter()
        .filter(|t| t.chars().count() >= min_token_len && !stop_words.contains(t))
        .collect()
}
