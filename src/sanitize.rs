//! Cleanup of raw model output before it goes back on the clipboard.
//!
//! Small models like to wrap their answer in a preamble, in quotes, or in a
//! markdown fence. Each of those is handled by its own pass; [`sanitize`]
//! runs them in order.

use once_cell::sync::Lazy;
use regex::Regex;

static PREAMBLES: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        r"(?im)^Here is the translation.*?:",
        r"(?im)^Here's the translation.*?:",
        r"(?im)^Sure, here is the translation.*?:",
        r"(?im)^Translation:",
        r"(?im)^Translated text:",
    ]
    .iter()
    .map(|p| Regex::new(p).expect("static preamble pattern"))
    .collect()
});

static CODE_FENCE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)^```(?:\w+)?\s*(.*?)\s*```$").expect("static fence pattern"));

pub fn sanitize(raw: &str, original: &str) -> String {
    let text = strip_preambles(raw.trim());
    let text = strip_wrapping_quotes(&text, original);
    unwrap_code_fence(&text)
}

/// Removes "Translation:"-style lead-ins at the start of any line.
/// Runs until nothing matches, so stacked lead-ins go in one call.
pub fn strip_preambles(text: &str) -> String {
    let mut current = text.trim().to_string();
    loop {
        let mut next = current.clone();
        for re in PREAMBLES.iter() {
            next = re.replace_all(&next, "").trim().to_string();
        }
        if next == current {
            return current;
        }
        current = next;
    }
}

/// Drops one outer `"..."` or `'...'` pair, unless the original text was quoted itself.
pub fn strip_wrapping_quotes(text: &str, original: &str) -> String {
    let text = text.trim();
    if wrapped_in_quotes(original.trim()) {
        return text.to_string();
    }
    match quote_pair(text) {
        // a lone quote character is both the opening and the closing one
        Some(q) => text.get(q.len_utf8()..text.len() - q.len_utf8()).unwrap_or("").trim().to_string(),
        None => text.to_string(),
    }
}

/// Replaces a fenced block that spans the whole text with its contents.
pub fn unwrap_code_fence(text: &str) -> String {
    let text = text.trim();
    match CODE_FENCE.captures(text) {
        Some(caps) => caps.get(1).map_or("", |m| m.as_str()).trim().to_string(),
        None => text.to_string(),
    }
}

fn wrapped_in_quotes(s: &str) -> bool {
    quote_pair(s).is_some()
}

fn quote_pair(s: &str) -> Option<char> {
    ['"', '\'']
        .into_iter()
        .find(|&q| s.starts_with(q) && s.ends_with(q))
}
