use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashSet;

/// Common compound-word suffixes that should keep the hyphen.
pub(crate) static COMPOUND_SUFFIXES: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
        "centered",
        "based",
        "driven",
        "aware",
        "oriented",
        "specific",
        "related",
        "dependent",
        "independent",
        "like",
        "free",
        "friendly",
        "rich",
        "poor",
        "scale",
        "level",
        "order",
        "class",
        "type",
        "style",
        "wise",
        "fold",
        "term",
        "time",
        "world",
        "source",
        "domain",
        "intensive",
        "efficient",
        "sensitive",
        "grained",
    ]
    .into_iter()
    .collect()
});

static LINE_BREAK_HYPHEN: Lazy<Regex> = Lazy::new(|| Regex::new(r"-\r?\n").unwrap());

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

/// Repair hyphenation introduced by hard line breaks in OCR output.
///
/// Every hyphen directly followed by a line break, with word characters on
/// both sides, is removed together with the break:
///
/// - `"exam-\nple"` → `"example"`
/// - `"data-\ndriven"` → `"datadriven"`
///
/// Anything else, including a hyphen at the start or end of the text, is
/// left as is. See [`repair_line_hyphenation_keeping_compounds`] for a
/// variant that keeps genuine compound hyphens.
pub fn repair_line_hyphenation(text: &str) -> String {
    join_broken_words(text, |_, _| false)
}

/// Like [`repair_line_hyphenation`], but keeps the hyphen (dropping only the
/// break) when the next word is a common compound suffix or the hyphen
/// follows a digit:
///
/// - `"data-\ndriven"` → `"data-driven"`
/// - `"Qwen2-\nVL"` → `"Qwen2-VL"`
pub fn repair_line_hyphenation_keeping_compounds(text: &str) -> String {
    join_broken_words(text, |before, next_word| {
        before.is_ascii_digit() || COMPOUND_SUFFIXES.contains(next_word.to_lowercase().as_str())
    })
}

fn join_broken_words(text: &str, keep_hyphen: impl Fn(char, &str) -> bool) -> String {
    let mut out = String::with_capacity(text.len());
    let mut last = 0;

    for m in LINE_BREAK_HYPHEN.find_iter(text) {
        let Some(before) = text[..m.start()].chars().next_back() else {
            continue;
        };
        let rest = &text[m.end()..];
        let word_end = rest.find(|c: char| !is_word_char(c)).unwrap_or(rest.len());
        let next_word = &rest[..word_end];
        if !is_word_char(before) || next_word.is_empty() {
            continue;
        }

        out.push_str(&text[last..m.start()]);
        if keep_hyphen(before, next_word) {
            out.push('-');
        }
        last = m.end();
    }

    out.push_str(&text[last..]);
    out
}
