//! Card name normalization and decklist text parsing
//!
//! Every card name that enters the engine (corpus, metadata keys, user
//! decklists, exclusion lists) goes through [`normalize_card_name`], so two
//! spellings that differ only in case, diacritics or punctuation resolve to
//! the same identifier.

use unicode_normalization::{char::is_combining_mark, UnicodeNormalization};

/// Characters removed outright instead of becoming word separators
const ELIDED: [char; 5] = ['\'', '\u{2019}', '`', '.', '"'];

/// Normalizes a raw card name into its identifier form.
///
/// - NFKD decomposition, lowercased, with combining marks removed
/// - apostrophes and periods dropped, other punctuation treated as a separator
/// - whitespace collapsed to single spaces
pub fn normalize_card_name(raw: &str) -> String {
    let folded: String = raw
        .nfkd()
        .flat_map(char::to_lowercase)
        .nfkd()
        .filter(|c| !is_combining_mark(*c))
        .filter(|c| !ELIDED.contains(c))
        .map(|c| if c.is_alphanumeric() { c } else { ' ' })
        .collect();

    folded.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Returns true for quantity tokens such as `1`, `4x` or `x2`
fn is_quantity(token: &str) -> bool {
    let digits = token
        .strip_suffix(['x', 'X'])
        .or_else(|| token.strip_prefix(['x', 'X']))
        .unwrap_or(token);
    !digits.is_empty() && digits.chars().all(|c| c.is_ascii_digit())
}

/// Splits decklist text into raw card names.
///
/// Each non-empty line is one entry; a leading quantity token is dropped.
pub fn parse_decklist_text(text: &str) -> Vec<String> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(|line| {
            let mut tokens = line.split_whitespace();
            match tokens.next() {
                Some(first) if is_quantity(first) => tokens.collect::<Vec<_>>().join(" "),
                _ => line.split_whitespace().collect::<Vec<_>>().join(" "),
            }
        })
        .filter(|name| !name.is_empty())
        .collect()
}
