use regex::Regex;
use std::sync::OnceLock;

static WHITESPACE: OnceLock<Regex> = OnceLock::new();

fn whitespace() -> &'static Regex {
    WHITESPACE.get_or_init(|| Regex::new(r"\s+").expect("whitespace pattern is valid"))
}

/// Canonical form used to compare OCR output with question text.
///
/// Lower-cases, collapses every whitespace run (newlines included) into a
/// single space and trims both ends. Idempotent.
pub fn normalize(raw: &str) -> String {
    let lowered = raw.to_lowercase();
    whitespace().replace_all(lowered.trim(), " ").into_owned()
}
