// Marker removal
// Unconditional swap of AI-marker vocabulary for plain words.

use regex::Captures;

use crate::services::lexicon::{Lexicon, ReplacementRule};
use crate::services::text_processor::{match_leading_case, tidy};

fn apply_rule(text: &str, rule: &ReplacementRule, count: &mut usize) -> String {
    let mut hits = 0;
    let out = rule
        .pattern
        .replace_all(text, |caps: &Captures| {
            hits += 1;
            match_leading_case(&caps[0], rule.replacement)
        })
        .into_owned();
    *count += hits;
    out
}

/// Returns the cleaned text and the number of marker occurrences replaced.
pub fn remove_ai_markers(text: &str, lexicon: &Lexicon) -> (String, usize) {
    let mut count = 0;
    let mut result = text.to_string();

    for rule in lexicon.marker_words.iter().chain(lexicon.marker_phrases.iter()) {
        if rule.pattern.is_match(&result) {
            result = apply_rule(&result, rule, &mut count);
        }
    }

    (tidy(&result), count)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_replaces_words_and_keeps_capitals() {
        let lex = Lexicon::new();
        let (out, n) = remove_ai_markers("Robust tools help us delve into a robust market.", &lex);
        assert_eq!(out, "Strong tools help us explore into a strong market.");
        assert_eq!(n, 3);
    }

    #[test]
    fn test_deletes_phrases_and_tidies() {
        let lex = Lexicon::new();
        let (out, n) = remove_ai_markers("In essence, the plan works . At its core , it is simple.", &lex);
        assert_eq!(out, "The plan works. It is simple.");
        assert_eq!(n, 2);
    }

    #[test]
    fn test_hyphenated_markers() {
        let lex = Lexicon::new();
        let (out, _) = remove_ai_markers("A cutting-edge, world-class team.", &lex);
        assert_eq!(out, "A modern, excellent team.");
    }

    #[test]
    fn test_clean_text_is_untouched() {
        let lex = Lexicon::new();
        let (out, n) = remove_ai_markers("We fixed the bug on Tuesday.", &lex);
        assert_eq!(out, "We fixed the bug on Tuesday.");
        assert_eq!(n, 0);
    }
}
