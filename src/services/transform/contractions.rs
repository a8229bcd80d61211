// Contraction insertion

use regex::Captures;

use super::random::RandomSource;
use crate::services::lexicon::Lexicon;
use crate::services::text_processor::match_leading_case;

pub const CONTRACTION_CHANCE: f64 = 0.7;

/// Each contraction rule is rolled once; a successful roll contracts every
/// occurrence of that full form.
pub fn add_contractions(text: &str, lexicon: &Lexicon, rng: &mut dyn RandomSource) -> (String, usize) {
    let mut result = text.to_string();
    let mut count = 0;

    for rule in &lexicon.contractions {
        if !rng.chance(CONTRACTION_CHANCE) || !rule.pattern.is_match(&result) {
            continue;
        }
        let mut hits = 0;
        result = rule
            .pattern
            .replace_all(&result, |caps: &Captures| {
                hits += 1;
                match_leading_case(&caps[0], rule.replacement)
            })
            .into_owned();
        count += hits;
    }

    (result, count)
}
