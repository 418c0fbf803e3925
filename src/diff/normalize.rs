//! Text normalization applied to both sides before diffing.
//!
//! STT output differs from ground truth in capitalization, whitespace, and
//! typographic punctuation long before it differs in words. Normalization
//! folds those differences away so the metrics measure recognition quality,
//! not formatting taste.

/// Punctuation stripped when `strip_punctuation` is on.
const STRIPPED: &[char] = &['.', ',', '!', '?', ';', ':', '"', '\'', '-'];

fn fold_typographic(c: char) -> char {
    match c {
        // Curly and low double quotes, guillemets
        '\u{201c}' | '\u{201d}' | '\u{201e}' | '\u{201f}' | '\u{00ab}' | '\u{00bb}' => '"',
        // Curly single quotes, single guillemets
        '\u{2018}' | '\u{2019}' | '\u{201a}' | '\u{201b}' | '\u{2039}' | '\u{203a}' => '\'',
        // Dashes and minus
        '\u{2013}' | '\u{2014}' | '\u{2010}' | '\u{2011}' | '\u{2212}' => '-',
        // Ellipsis
        '\u{2026}' => '.',
        other => other,
    }
}

/// Normalize text for comparison: fold typographic punctuation to ASCII,
/// optionally strip common punctuation entirely, collapse all whitespace
/// runs to single spaces, trim, and lowercase.
///
/// The function is idempotent: normalizing already-normalized text returns
/// it unchanged.
pub fn normalize_text(s: &str, strip_punctuation: bool) -> String {
    let mut folded = String::with_capacity(s.len());
    for c in s.chars() {
        let c = fold_typographic(c);
        if strip_punctuation && STRIPPED.contains(&c) {
            continue;
        }
        folded.push(c);
    }

    folded
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}
