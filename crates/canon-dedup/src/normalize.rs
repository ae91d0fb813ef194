//! Normalizer — canonical text form shared by every later stage.

use regex::Regex;
use std::sync::LazyLock;

static HTML_TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)<!--.*?-->|</?[a-z!][^>]*>").unwrap());
static HTML_ENTITY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"&(?:[a-z][a-z0-9]*|#[0-9]+|#x[0-9a-f]+);").unwrap());
static URL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b(?:[a-z][a-z0-9+.\-]*://|www\.)\S*").unwrap());

fn is_apostrophe(c: char) -> bool {
    c == '\'' || c == '\u{2019}'
}

/// Lowercase, drop HTML and URLs, drop punctuation (apostrophes inside words
/// survive), collapse whitespace. Total and idempotent.
pub fn normalize(text: &str) -> String {
    if text.is_empty() {
        return String::new();
    }
    let lowered = text.to_lowercase();
    let no_tags = HTML_TAG.replace_all(&lowered, " ");
    let no_entities = HTML_ENTITY.replace_all(&no_tags, " ");
    let no_urls = URL.replace_all(&no_entities, " ");

    let chars: Vec<char> = no_urls.chars().collect();
    let mut out = String::with_capacity(chars.len());
    let mut space_pending = false;
    for (i, &c) in chars.iter().enumerate() {
        let keep = if c.is_alphanumeric() {
            Some(c)
        } else if is_apostrophe(c) {
            let before = i > 0 && chars[i - 1].is_alphanumeric();
            let after = chars.get(i + 1).is_some_and(|n| n.is_alphanumeric());
            (before && after).then_some('\'')
        } else {
            None
        };
        match keep {
            Some(k) => {
                if space_pending && !out.is_empty() {
                    out.push(' ');
                }
                space_pending = false;
                out.push(k);
            }
            None => space_pending = true,
        }
    }
    out
}
