// file: src/parser/naming.rs
// description: fallback broker names derived from review file names

use std::path::Path;

const TRAILING_TOKENS: [&str; 3] = ["review", "reviews", "broker"];

/// Derives a display name from a file's base name: trailing review/broker
/// tokens are stripped (case-insensitive) and the remaining words are
/// title-cased. `xm-broker-review.html` becomes `Xm`.
pub fn derive_broker_name(path: &Path) -> Option<String> {
    let stem = path.file_stem()?.to_str()?;

    let mut words: Vec<&str> = stem
        .split(['-', '_', ' ', '.'])
        .filter(|w| !w.is_empty())
        .collect();

    while words.len() > 1
        && words
            .last()
            .map(|w| TRAILING_TOKENS.contains(&w.to_ascii_lowercase().as_str()))
            .unwrap_or(false)
    {
        words.pop();
    }

    if words.len() == 1 && TRAILING_TOKENS.contains(&words[0].to_ascii_lowercase().as_str()) {
        return None;
    }

    let name = words
        .iter()
        .map(|w| title_case(w))
        .collect::<Vec<_>>()
        .join(" ");

    if name.is_empty() { None } else { Some(name) }
}

fn title_case(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first
            .to_uppercase()
            .chain(chars.flat_map(|c| c.to_lowercase()))
            .collect(),
        None => String::new(),
    }
}
