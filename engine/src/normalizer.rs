use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref URL_RE: Regex = Regex::new(r"http\S+|www\S+").expect("valid regex");
    static ref NON_ALNUM_RE: Regex = Regex::new(r"[^a-zA-Z0-9\s]").expect("valid regex");
    static ref WHITESPACE_RE: Regex = Regex::new(r"\s+").expect("valid regex");
}

/// Normalize raw post text: lowercase, drop URL-like tokens, replace every
/// character outside ASCII letters/digits/whitespace with a space, then
/// collapse and trim whitespace. An empty result means "no content".
pub fn normalize(text: &str) -> String {
    let lowered = text.to_lowercase();
    let without_urls = URL_RE.replace_all(&lowered, "");
    let alnum = NON_ALNUM_RE.replace_all(&without_urls, " ");
    WHITESPACE_RE.replace_all(&alnum, " ").trim().to_string()
}

/// Absent text normalizes to the empty string.
pub fn normalize_opt(text: Option<&str>) -> String {
    text.map(normalize).unwrap_or_default()
}
