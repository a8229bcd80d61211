// Phrase paraphrasing and synonym substitution.

use regex::Regex;
use std::sync::OnceLock;

use super::random::RandomSource;
use crate::services::lexicon::Lexicon;
use crate::services::text_processor::{capitalize_first, match_leading_case, split_trailing_punct, starts_uppercase};

fn token_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\S+").expect("token regex"))
}

/// Replace the first occurrence of each wordy phrase with a randomly chosen
/// shorter alternative. Returns the new text and the number of replacements.
pub fn paraphrase_phrases(text: &str, lexicon: &Lexicon, rng: &mut dyn RandomSource) -> (String, usize) {
    let mut result = text.to_string();
    let mut count = 0;

    for rule in &lexicon.phrases {
        let Some(found) = rule.pattern.find(&result) else {
            continue;
        };
        let (start, end) = (found.start(), found.end());
        let alternatives = rule.entry.alternatives;
        let alt = alternatives[rng.pick(alternatives.len())];
        let matched = &result[start..end];

        let (replacement, rest) = if alt.is_empty() {
            // Deleted phrase: the following word inherits the capital.
            let rest = result[end..].trim_start();
            let rest = if starts_uppercase(matched) {
                capitalize_first(rest)
            } else {
                rest.to_string()
            };
            (String::new(), rest)
        } else {
            (match_leading_case(matched, alt), result[end..].to_string())
        };

        result = format!("{}{}{}", &result[..start], replacement, rest);
        count += 1;
    }

    (result, count)
}

/// Swap individual words for synonyms, each with probability `intensity`.
/// Whitespace between tokens is preserved; trailing punctuation stays attached.
pub fn substitute_synonyms(
    text: &str,
    lexicon: &Lexicon,
    rng: &mut dyn RandomSource,
    intensity: f64,
) -> (String, usize) {
    let mut out = String::with_capacity(text.len());
    let mut last = 0;
    let mut count = 0;

    for token in token_re().find_iter(text) {
        out.push_str(&text[last..token.start()]);
        last = token.end();

        let (core, trailing) = split_trailing_punct(token.as_str());
        match lexicon.synonyms.get(core) {
            Some(alternatives) if rng.chance(intensity) => {
                let alt = alternatives[rng.pick(alternatives.len())];
                out.push_str(&match_leading_case(core, alt));
                out.push_str(trailing);
                count += 1;
            }
            _ => out.push_str(token.as_str()),
        }
    }
    out.push_str(&text[last..]);

    (out, count)
}
