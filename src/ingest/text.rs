use once_cell::sync::Lazy;
use regex::Regex;
use unicode_normalization::{char::is_combining_mark, UnicodeNormalization};

static SEPARATORS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[\s_\-./\\():]+").expect("separator pattern is valid"));

/// Lowercases and strips diacritics, so "Doğru" and "DOGRU" compare equal.
pub fn fold(raw: &str) -> String {
    raw.trim()
        .nfd()
        .filter(|c| !is_combining_mark(*c))
        .map(|c| if c == 'ı' { 'i' } else { c })
        .collect::<String>()
        .to_lowercase()
}

/// `fold` plus separator collapsing, for header labels.
pub fn normalize_label(raw: &str) -> String {
    SEPARATORS
        .replace_all(&fold(raw), " ")
        .trim()
        .to_string()
}
