// Text Processing Service
// Shared helpers for scoring, rewriting and extracted-text cleanup

use regex::Regex;
use std::sync::OnceLock;

/// Input ceiling in characters; longer text is truncated, never rejected.
pub const MAX_INPUT_CHARS: usize = 50_000;

fn whitespace_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\s+").expect("whitespace regex"))
}

fn space_before_punct_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\s+([.,!?])").expect("punct spacing regex"))
}

fn orphan_comma_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(^|[.!?] ),\s*").expect("orphan comma regex"))
}

fn doubled_comma_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r",\s*,").expect("doubled comma regex"))
}

fn sentence_delim_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[.!?]+").expect("sentence delimiter regex"))
}

/// Normalize text coming out of a file extractor
pub fn normalize_punctuation(text: &str) -> String {
    if text.is_empty() {
        return String::new();
    }

    let mut s = text
        .replace(['\u{201c}', '\u{201d}'], "\"")
        .replace(['\u{2018}', '\u{2019}'], "'")
        .replace('\u{00A0}', " ")
        .replace("\r\n", "\n")
        .replace('\r', "\n");

    let horizontal_ws = {
        static RE: OnceLock<Regex> = OnceLock::new();
        RE.get_or_init(|| Regex::new(r"[ \t\x0C\x0B]+").expect("horizontal ws regex"))
    };
    s = horizontal_ws.replace_all(&s, " ").to_string();

    s = s.lines().map(str::trim).collect::<Vec<_>>().join("\n");
    s.trim().to_string()
}

/// Collapse every whitespace run to one space and trim.
pub fn collapse_whitespace(text: &str) -> String {
    whitespace_re().replace_all(text, " ").trim().to_string()
}

/// Remove whitespace in front of `.,!?`.
pub fn fix_punctuation_spacing(text: &str) -> String {
    space_before_punct_re().replace_all(text, "$1").to_string()
}

/// Whitespace collapse plus punctuation cleanup left behind by deleted phrases.
pub fn tidy(text: &str) -> String {
    let collapsed = collapse_whitespace(text);
    let cleaned = drop_orphan_commas(&collapsed);
    let cleaned = doubled_comma_re().replace_all(&cleaned, ",");
    fix_punctuation_spacing(&cleaned)
}

// A comma at a sentence start means the opener was deleted; recapitalize what follows.
fn drop_orphan_commas(text: &str) -> String {
    if !orphan_comma_re().is_match(text) {
        return text.to_string();
    }

    let mut out = String::with_capacity(text.len());
    let mut last = 0;
    for caps in orphan_comma_re().captures_iter(text) {
        let (Some(m), Some(lead)) = (caps.get(0), caps.get(1)) else {
            continue;
        };
        out.push_str(&text[last..m.start()]);
        out.push_str(lead.as_str());
        last = m.end();
        if let Some(first) = text[last..].chars().next() {
            out.extend(first.to_uppercase());
            last += first.len_utf8();
        }
    }
    out.push_str(&text[last..]);
    out
}

/// Truncate to at most `max_chars` characters on a char boundary.
pub fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

/// Whitespace-separated tokens.
pub fn words(text: &str) -> Vec<&str> {
    text.split_whitespace().collect()
}

pub fn word_count(text: &str) -> usize {
    text.split_whitespace().count()
}

/// Sentences for scoring: split on runs of `.!?`, trimmed, longer than 3 chars.
pub fn split_sentences(text: &str) -> Vec<&str> {
    sentence_delim_re()
        .split(text)
        .map(str::trim)
        .filter(|s| s.chars().count() > 3)
        .collect()
}

pub fn starts_uppercase(s: &str) -> bool {
    s.chars().next().map_or(false, char::is_uppercase)
}

/// Uppercase the first character.
pub fn capitalize_first(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Carry the leading capital of `original` over to `replacement`.
pub fn match_leading_case(original: &str, replacement: &str) -> String {
    if starts_uppercase(original) {
        capitalize_first(replacement)
    } else {
        replacement.to_string()
    }
}

/// Split trailing `.,!?;:` off a token.
pub fn split_trailing_punct(token: &str) -> (&str, &str) {
    let core = token.trim_end_matches(['.', ',', '!', '?', ';', ':']);
    (core, &token[core.len()..])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_punctuation() {
        let input = "Hello\u{201c}World\u{201d}\r\n  it\u{2019}s\u{00A0}fine  ";
        assert_eq!(normalize_punctuation(input), "Hello\"World\"\nit's fine");
    }

    #[test]
    fn test_tidy_collapses_and_fixes_spacing() {
        assert_eq!(tidy("  one   two \n three , four .  "), "one two three, four.");
    }

    #[test]
    fn test_tidy_drops_orphan_comma_and_recapitalizes() {
        assert_eq!(tidy(", the plan works. , it ships today."), "The plan works. It ships today.");
        assert_eq!(tidy("We , , go"), "We, go");
    }

    #[test]
    fn test_truncate_chars_respects_boundaries() {
        assert_eq!(truncate_chars("héllo", 2), "hé");
        assert_eq!(truncate_chars("abc", 10), "abc");
    }

    #[test]
    fn test_split_sentences_drops_fragments() {
        let s = split_sentences("First one here. Ok! Is this the third?");
        assert_eq!(s, vec!["First one here", "Is this the third"]);
    }

    #[test]
    fn test_split_trailing_punct() {
        assert_eq!(split_trailing_punct("growth."), ("growth", "."));
        assert_eq!(split_trailing_punct("wait?!"), ("wait", "?!"));
        assert_eq!(split_trailing_punct("plain"), ("plain", ""));
    }

    #[test]
    fn test_match_leading_case() {
        assert_eq!(match_leading_case("Robust", "strong"), "Strong");
        assert_eq!(match_leading_case("robust", "strong"), "strong");
        assert_eq!(capitalize_first(""), "");
    }
}
