// Scoring signals
// Each heuristic returns its capped contribution and pushes the flags it raised.

use regex::Regex;
use std::collections::{BTreeSet, HashMap, HashSet};
use std::sync::OnceLock;

use crate::models::Signal;

pub const BURSTINESS_CAP: f64 = 35.0;
pub const LEXICAL_CAP: f64 = 25.0;
pub const FORMALITY_CAP: f64 = 40.0;
pub const STARTERS_CAP: f64 = 25.0;
pub const BUZZWORDS_CAP: f64 = 30.0;
pub const PHRASES_CAP: f64 = 35.0;

/// Words shorter than this are left out of the type-token numerator.
const MIN_DIVERSITY_WORD_CHARS: usize = 3;
const NO_CONTRACTION_MIN_WORDS: usize = 30;
const NO_CONTRACTION_PENALTY: f64 = 15.0;
/// Buzzword occurrences beyond this count add nothing.
const BUZZWORD_OCCURRENCE_LIMIT: usize = 2;

const FORMAL_TRANSITIONS: &[(&str, f64)] = &[
    (r"\bfurthermore\b", 8.0),
    (r"\bmoreover\b", 8.0),
    (r"\bnevertheless\b", 8.0),
    (r"\bnonetheless\b", 8.0),
    (r"\bconsequently\b", 7.0),
    (r"\bsubsequently\b", 7.0),
    (r"\badditionall?y\b", 5.0),
    (r"\bhowever\b", 3.0),
    (r"\btherefore\b", 4.0),
    (r"\bthus\b", 5.0),
    (r"\bhence\b", 6.0),
    (r"\bin particular\b", 4.0),
];

const AI_BUZZWORDS: &[(&str, f64)] = &[
    ("delve", 15.0),
    ("tapestry", 12.0),
    ("landscape", 5.0),
    ("journey", 4.0),
    ("unlock", 5.0),
    ("empower", 5.0),
    ("seamless", 6.0),
    ("robust", 5.0),
    ("innovative", 4.0),
    ("holistic", 8.0),
    ("synergy", 10.0),
    ("paradigm", 10.0),
    ("cutting-edge", 8.0),
    ("state-of-the-art", 8.0),
    ("groundbreaking", 6.0),
    ("unprecedented", 5.0),
    ("pivotal", 6.0),
    ("paramount", 7.0),
    ("multifaceted", 8.0),
];

const AI_PHRASES: &[(&str, f64)] = &[
    ("it is important to note", 15.0),
    ("it should be noted", 12.0),
    ("it is worth mentioning", 12.0),
    ("this highlights the", 6.0),
    ("this underscores", 8.0),
    ("in today's world", 8.0),
    ("in the modern era", 8.0),
    ("in conclusion", 6.0),
    ("plays a crucial role", 8.0),
    ("plays a vital role", 8.0),
    ("at its core", 6.0),
    ("at the heart of", 6.0),
];

struct WeightedPattern {
    pattern: Regex,
    weight: f64,
}

struct Patterns {
    contraction: Regex,
    transitions: Vec<WeightedPattern>,
    buzzwords: Vec<WeightedPattern>,
    phrases: Vec<WeightedPattern>,
}

fn patterns() -> &'static Patterns {
    static PATTERNS: OnceLock<Patterns> = OnceLock::new();
    PATTERNS.get_or_init(|| Patterns {
        contraction: Regex::new(
            r"(?i)\b(?:\w+n't|i'm|(?:it|that|what|who|there|here|let|he|she)'s|(?:they|we|you)'re|(?:i|you|we|they)'(?:ve|ll|d)|(?:it|that)'ll)\b",
        )
        .expect("contraction regex"),
        transitions: FORMAL_TRANSITIONS
            .iter()
            .map(|&(p, weight)| WeightedPattern {
                pattern: Regex::new(p).expect("transition regex"),
                weight,
            })
            .collect(),
        buzzwords: AI_BUZZWORDS
            .iter()
            .map(|&(w, weight)| WeightedPattern {
                pattern: Regex::new(&format!(r"\b{}\b", regex::escape(w))).expect("buzzword regex"),
                weight,
            })
            .collect(),
        phrases: AI_PHRASES
            .iter()
            .map(|&(p, weight)| WeightedPattern {
                pattern: Regex::new(&regex::escape(p)).expect("phrase regex"),
                weight,
            })
            .collect(),
    })
}

/// Sentence-length uniformity. `lengths` are per-sentence word counts.
pub fn burstiness(lengths: &[usize], signals: &mut BTreeSet<Signal>) -> f64 {
    if lengths.len() < 2 {
        return 0.0;
    }
    let n = lengths.len() as f64;
    let mean = lengths.iter().sum::<usize>() as f64 / n;
    if mean <= 0.0 {
        return 0.0;
    }
    let variance = lengths
        .iter()
        .map(|&l| (l as f64 - mean).powi(2))
        .sum::<f64>()
        / n;
    let cv = variance.sqrt() / mean;

    let score: f64 = if cv < 0.25 {
        signals.insert(Signal::VeryUniformSentences);
        35.0
    } else if cv < 0.40 {
        signals.insert(Signal::UniformSentences);
        20.0
    } else if cv < 0.55 {
        10.0
    } else {
        0.0
    };
    score.min(BURSTINESS_CAP)
}

/// Type-token ratio over words longer than two characters, against the full word count.
pub fn lexical_diversity(words: &[&str], signals: &mut BTreeSet<Signal>) -> f64 {
    if words.is_empty() {
        return 0.0;
    }
    let unique: HashSet<String> = words
        .iter()
        .filter(|w| w.chars().count() >= MIN_DIVERSITY_WORD_CHARS)
        .map(|w| {
            w.to_lowercase()
                .trim_matches(['.', ',', '!', '?', ';', ':', '"', '\'', '-'])
                .to_string()
        })
        .filter(|w| !w.is_empty())
        .collect();
    let ttr = unique.len() as f64 / words.len() as f64;

    let score: f64 = if ttr < 0.45 {
        signals.insert(Signal::LowVocabularyDiversity);
        25.0
    } else if ttr < 0.55 {
        15.0
    } else if ttr < 0.65 {
        8.0
    } else {
        0.0
    };
    score.min(LEXICAL_CAP)
}

/// Missing contractions plus formal connectives. `lowered` is the case-folded text.
pub fn formality(lowered: &str, word_count: usize, signals: &mut BTreeSet<Signal>) -> f64 {
    let p = patterns();
    let mut total: f64 = 0.0;

    if word_count >= NO_CONTRACTION_MIN_WORDS && !p.contraction.is_match(lowered) {
        signals.insert(Signal::NoContractions);
        total += NO_CONTRACTION_PENALTY;
    }

    let transitions: f64 = p
        .transitions
        .iter()
        .filter(|t| t.pattern.is_match(lowered))
        .map(|t| t.weight)
        .sum();
    if transitions > 0.0 {
        signals.insert(Signal::FormalTransitions);
    }

    (total + transitions).min(FORMALITY_CAP)
}

/// Repeated sentence openers; needs at least three sentences.
pub fn starter_repetition(sentences: &[&str], signals: &mut BTreeSet<Signal>) -> f64 {
    if sentences.len() < 3 {
        return 0.0;
    }
    let starters: Vec<String> = sentences
        .iter()
        .filter_map(|s| s.split_whitespace().next())
        .map(str::to_lowercase)
        .collect();
    if starters.is_empty() {
        return 0.0;
    }

    let mut counts: HashMap<&str, usize> = HashMap::new();
    for s in &starters {
        *counts.entry(s.as_str()).or_insert(0) += 1;
    }

    let total = starters.len() as f64;
    let mut score: f64 = 0.0;
    for &count in counts.values() {
        let ratio = count as f64 / total;
        if ratio >= 0.5 {
            score += 20.0;
        } else if ratio >= 0.33 && count >= 2 {
            score += 10.0;
        }
    }
    if score > 0.0 {
        signals.insert(Signal::RepetitiveStarters);
    }
    score.min(STARTERS_CAP)
}

/// Weighted AI vocabulary; each word counts at most twice.
pub fn buzzword_density(lowered: &str, signals: &mut BTreeSet<Signal>) -> f64 {
    let score: f64 = patterns()
        .buzzwords
        .iter()
        .map(|b| {
            let hits = b.pattern.find_iter(lowered).count().min(BUZZWORD_OCCURRENCE_LIMIT);
            b.weight * hits as f64
        })
        .sum();
    if score > 0.0 {
        signals.insert(Signal::AiBuzzwords);
    }
    score.min(BUZZWORDS_CAP)
}

/// Weighted stock phrases; each phrase counts once.
pub fn phrase_density(lowered: &str, signals: &mut BTreeSet<Signal>) -> f64 {
    let score: f64 = patterns()
        .phrases
        .iter()
        .filter(|p| p.pattern.is_match(lowered))
        .map(|p| p.weight)
        .sum();
    if score > 0.0 {
        signals.insert(Signal::AiPhrases);
    }
    score.min(PHRASES_CAP)
}
