//! Material reference allocation (`CAM-001`, `CAM-002`, ...)

use unicode_normalization::UnicodeNormalization;

const PREFIX_LEN: usize = 3;

/// First three ASCII letters of `name`, diacritics stripped, upper-cased
/// and padded with `X`.
pub fn reference_prefix(name: &str) -> String {
    let mut prefix: String = name
        .nfd()
        .filter(|c| c.is_ascii_alphabetic())
        .take(PREFIX_LEN)
        .map(|c| c.to_ascii_uppercase())
        .collect();
    while prefix.len() < PREFIX_LEN {
        prefix.push('X');
    }
    prefix
}

/// Next free reference for `prefix` given the references already using it
pub fn next_reference<'a, I>(prefix: &str, existing: I) -> String
where
    I: IntoIterator<Item = &'a str>,
{
    let max = existing
        .into_iter()
        .filter_map(|reference| reference.strip_prefix(prefix)?.strip_prefix('-'))
        .filter_map(|suffix| suffix.parse::<u32>().ok())
        .max()
        .unwrap_or(0);
    format!("{}-{:03}", prefix, max + 1)
}
