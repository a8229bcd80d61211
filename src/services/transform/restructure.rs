// Sentence restructuring
// Opener variation, "and" expansion and connective softening, sentence by sentence.

use regex::Regex;
use std::sync::OnceLock;

use super::random::RandomSource;
use crate::services::lexicon::{Lexicon, CONNECTIVE_SWAPS};
use crate::services::text_processor::capitalize_first;

pub const OPENER_SWAP_CHANCE: f64 = 0.4;
pub const AND_EXPANSION_CHANCE: f64 = 0.15;
pub const CONNECTIVE_SWAP_CHANCE: f64 = 0.5;

// Terminal punctuation only counts when followed by whitespace or end of text,
// so "3.5" and "e.g." stay inside their sentence.
fn terminator_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"([.!?]+)(?:\s+|$)").expect("sentence terminator regex"))
}

/// `(body, terminal punctuation)` pairs. A trailing fragment gets no punctuation.
fn sentences(text: &str) -> Vec<(&str, &str)> {
    let mut out = Vec::new();
    let mut last = 0;
    for caps in terminator_re().captures_iter(text) {
        let (Some(whole), Some(punct)) = (caps.get(0), caps.get(1)) else {
            continue;
        };
        out.push((text[last..whole.start()].trim(), punct.as_str()));
        last = whole.end();
    }
    if last < text.len() {
        out.push((text[last..].trim(), ""));
    }
    out.retain(|(body, _)| !body.is_empty());
    out
}

fn starts_with_word(sentence: &str, word: &str) -> bool {
    sentence.starts_with(word)
        && sentence[word.len()..]
            .chars()
            .next()
            .map_or(true, |c| !c.is_alphanumeric())
}

fn swap_opener(sentence: &str, lexicon: &Lexicon, rng: &mut dyn RandomSource) -> Option<String> {
    let entry = lexicon
        .openers
        .entries()
        .iter()
        .find(|e| sentence.starts_with(&format!("{} ", e.term)))?;

    if !rng.chance(OPENER_SWAP_CHANCE) {
        return None;
    }

    let alt = entry.alternatives[rng.pick(entry.alternatives.len())];
    let rest = &sentence[entry.term.len()..];
    Some(if alt.is_empty() {
        capitalize_first(rest.trim_start())
    } else {
        format!("{alt}{rest}")
    })
}

fn soften_connective(sentence: &str, rng: &mut dyn RandomSource) -> Option<String> {
    let &(formal, plain) = CONNECTIVE_SWAPS
        .iter()
        .find(|(formal, _)| starts_with_word(sentence, formal))?;

    if !rng.chance(CONNECTIVE_SWAP_CHANCE) {
        return None;
    }
    Some(format!("{plain}{}", &sentence[formal.len()..]))
}

/// Returns the restructured text and the number of sentence edits.
pub fn restructure_sentences(text: &str, lexicon: &Lexicon, rng: &mut dyn RandomSource) -> (String, usize) {
    let mut count = 0;
    let mut rebuilt = Vec::new();

    for (body, punct) in sentences(text) {
        let mut sentence = body.to_string();

        if let Some(swapped) = swap_opener(&sentence, lexicon, rng) {
            sentence = swapped;
            count += 1;
        }

        if sentence.contains(" and ") && rng.chance(AND_EXPANSION_CHANCE) {
            sentence = sentence.replacen(" and ", " as well as ", 1);
            count += 1;
        }

        if let Some(softened) = soften_connective(&sentence, rng) {
            sentence = softened;
            count += 1;
        }

        if !sentence.is_empty() {
            rebuilt.push(format!("{sentence}{punct}"));
        }
    }

    (rebuilt.join(" "), count)
}
