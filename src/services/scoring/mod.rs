// Likelihood Scorer
// Composite 0-100 estimate of how machine-generated a passage reads.
//
// Order matters and is kept as calibrated: each signal is capped on its own,
// the capped parts are summed, the sum is capped at 100, and only then is
// short-text damping applied.

pub mod signals;

use std::collections::BTreeSet;

use crate::models::{ScoreBreakdown, ScoreResult, Signal};
use crate::services::text_processor::{split_sentences, words};

/// Below this many words the text is not scored at all.
pub const MIN_SCORABLE_WORDS: usize = 5;
pub const MAX_SCORE: f64 = 100.0;

/// Length damping: short snippets trip the heuristics too easily.
fn damping_factor(word_count: usize) -> f64 {
    if word_count < 50 {
        0.8
    } else if word_count < 100 {
        0.9
    } else {
        1.0
    }
}

fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}

/// Score a passage. Pure and deterministic; degenerate input yields 0.
pub fn score(text: &str) -> ScoreResult {
    let tokens = words(text);
    let word_count = tokens.len();

    if word_count < MIN_SCORABLE_WORDS {
        return ScoreResult {
            score: 0.0,
            signals: BTreeSet::from([Signal::TextTooShort]),
            breakdown: ScoreBreakdown::default(),
            word_count,
        };
    }

    let lowered = text.replace('\u{2019}', "'").to_lowercase();
    let sentences = split_sentences(text);
    let lengths: Vec<usize> = sentences.iter().map(|s| s.split_whitespace().count()).collect();

    let mut flags = BTreeSet::new();
    let breakdown = ScoreBreakdown {
        burstiness: signals::burstiness(&lengths, &mut flags),
        lexical: signals::lexical_diversity(&tokens, &mut flags),
        formality: signals::formality(&lowered, word_count, &mut flags),
        starters: signals::starter_repetition(&sentences, &mut flags),
        buzzwords: signals::buzzword_density(&lowered, &mut flags),
        phrases: signals::phrase_density(&lowered, &mut flags),
        damping: damping_factor(word_count),
    };

    let capped = breakdown.raw_total().min(MAX_SCORE);
    let final_score = round2(capped * breakdown.damping);

    ScoreResult {
        score: final_score,
        signals: flags,
        breakdown,
        word_count,
    }
}
