// Humanly Data Models
// Request, score and outcome types shared by the services and the API surface

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use crate::services::text_processor::{truncate_chars, MAX_INPUT_CHARS};

pub const DEFAULT_THRESHOLD: f64 = 30.0;
pub const DEFAULT_MAX_ATTEMPTS: u32 = 10;
pub const MAX_ATTEMPTS_LIMIT: u32 = 20;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum RequestError {
    #[error("No content provided. Please upload a file or paste text.")]
    EmptyText,
    #[error("threshold must be between 0 and 100, got {0}")]
    ThresholdOutOfRange(f64),
    #[error("max_attempts must be between 1 and 20, got {0}")]
    AttemptsOutOfRange(u32),
    #[error("unknown style: {0} (expected professional, casual, formal, simple or academic)")]
    UnknownStyle(String),
    #[error("unknown mode: {0} (expected light, balanced, aggressive or creative)")]
    UnknownMode(String),
}

// ============ Style & Mode ============

#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Style {
    #[default]
    Professional,
    Casual,
    Formal,
    Simple,
    Academic,
}

impl Style {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Professional => "professional",
            Self::Casual => "casual",
            Self::Formal => "formal",
            Self::Simple => "simple",
            Self::Academic => "academic",
        }
    }

    /// Tone directive handed to the generation collaborator.
    pub fn instruction(&self) -> &'static str {
        match self {
            Self::Professional => "business-like but natural",
            Self::Casual => "friendly, like texting a colleague",
            Self::Formal => "proper but not robotic",
            Self::Simple => "simple words, short sentences",
            Self::Academic => "scholarly but readable",
        }
    }
}

impl FromStr for Style {
    type Err = RequestError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "professional" => Ok(Self::Professional),
            "casual" => Ok(Self::Casual),
            "formal" => Ok(Self::Formal),
            "simple" => Ok(Self::Simple),
            "academic" => Ok(Self::Academic),
            other => Err(RequestError::UnknownStyle(other.to_string())),
        }
    }
}

impl fmt::Display for Style {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    Light,
    #[default]
    Balanced,
    Aggressive,
    Creative,
}

impl Mode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Light => "light",
            Self::Balanced => "balanced",
            Self::Aggressive => "aggressive",
            Self::Creative => "creative",
        }
    }

    /// Probability that a synonym-table word gets swapped.
    pub fn intensity(&self) -> f64 {
        match self {
            Self::Light => 0.2,
            Self::Balanced => 0.35,
            Self::Aggressive => 0.5,
            Self::Creative => 0.45,
        }
    }

    /// Rewrite-aggressiveness directive handed to the generation collaborator.
    pub fn instruction(&self) -> &'static str {
        match self {
            Self::Light => "Make minimal changes. Only fix obvious AI patterns.",
            Self::Balanced => "Rewrite moderately while staying close to original length.",
            Self::Aggressive => "Completely rewrite while keeping it SHORT and simple.",
            Self::Creative => "Rewrite naturally like a real person would speak.",
        }
    }
}

impl FromStr for Mode {
    type Err = RequestError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "light" => Ok(Self::Light),
            "balanced" => Ok(Self::Balanced),
            "aggressive" => Ok(Self::Aggressive),
            "creative" => Ok(Self::Creative),
            other => Err(RequestError::UnknownMode(other.to_string())),
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============ Rewrite Request ============

/// A validated humanize request. Fields are fixed once constructed.
#[derive(Debug, Clone, Serialize)]
pub struct RewriteRequest {
    text: String,
    threshold: f64,
    max_attempts: u32,
    style: Style,
    mode: Mode,
}

impl RewriteRequest {
    /// Trims and truncates `text` to the input ceiling; rejects empty text and out-of-range knobs.
    pub fn new(
        text: &str,
        threshold: f64,
        max_attempts: u32,
        style: Style,
        mode: Mode,
    ) -> Result<Self, RequestError> {
        let trimmed = truncate_chars(text, MAX_INPUT_CHARS).trim();
        if trimmed.is_empty() {
            return Err(RequestError::EmptyText);
        }
        if !(0.0..=100.0).contains(&threshold) {
            return Err(RequestError::ThresholdOutOfRange(threshold));
        }
        if !(1..=MAX_ATTEMPTS_LIMIT).contains(&max_attempts) {
            return Err(RequestError::AttemptsOutOfRange(max_attempts));
        }
        Ok(Self {
            text: trimmed.to_string(),
            threshold,
            max_attempts,
            style,
            mode,
        })
    }

    /// Request with the default threshold, attempt budget, style and mode.
    pub fn with_defaults(text: &str) -> Result<Self, RequestError> {
        Self::new(
            text,
            DEFAULT_THRESHOLD,
            DEFAULT_MAX_ATTEMPTS,
            Style::default(),
            Mode::default(),
        )
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    pub fn style(&self) -> Style {
        self.style
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }
}

// ============ Score Result ============

/// Named heuristics that fired while scoring.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Signal {
    TextTooShort,
    VeryUniformSentences,
    UniformSentences,
    LowVocabularyDiversity,
    NoContractions,
    FormalTransitions,
    RepetitiveStarters,
    AiBuzzwords,
    AiPhrases,
}

/// Capped sub-scores that make up the composite.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ScoreBreakdown {
    pub burstiness: f64,
    pub lexical: f64,
    pub formality: f64,
    pub starters: f64,
    pub buzzwords: f64,
    pub phrases: f64,
    /// Length damping factor applied after the overall cap.
    pub damping: f64,
}

impl ScoreBreakdown {
    pub fn raw_total(&self) -> f64 {
        self.burstiness + self.lexical + self.formality + self.starters + self.buzzwords + self.phrases
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreResult {
    pub score: f64,
    pub signals: BTreeSet<Signal>,
    pub breakdown: ScoreBreakdown,
    pub word_count: usize,
}

impl ScoreResult {
    pub fn has(&self, signal: Signal) -> bool {
        self.signals.contains(&signal)
    }
}

// ============ Rewrite Outcome ============

#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Technique {
    AiMarkerRemoval,
    PhraseParaphrase,
    SynonymReplace,
    Restructure,
    Contractions,
    LlmParaphrase,
}

impl Technique {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::AiMarkerRemoval => "ai_marker_removal",
            Self::PhraseParaphrase => "phrase_paraphrase",
            Self::SynonymReplace => "synonym_replace",
            Self::Restructure => "restructure",
            Self::Contractions => "contractions",
            Self::LlmParaphrase => "llm_paraphrase",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TechniqueCount {
    pub technique: Technique,
    pub count: usize,
}

impl fmt::Display for TechniqueCount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.technique.as_str(), self.count)
    }
}

/// One pass through the assisted loop.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AttemptRecord {
    pub attempt: u32,
    pub candidate_score: f64,
    pub best_score: f64,
    pub used_fallback: bool,
    /// Candidate dropped too much of the text to be considered.
    #[serde(default)]
    pub rejected: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RewriteOutcome {
    pub original_text: String,
    pub transformed_text: String,
    pub original_score: f64,
    pub final_score: f64,
    pub attempts_used: u32,
    pub techniques_applied: Vec<TechniqueCount>,
    #[serde(default)]
    pub attempts: Vec<AttemptRecord>,
    #[serde(default)]
    pub final_signals: BTreeSet<Signal>,
}

impl RewriteOutcome {
    pub fn reduction(&self) -> f64 {
        self.original_score - self.final_score
    }

    pub fn met_threshold(&self, threshold: f64) -> bool {
        self.final_score <= threshold
    }
}

// ============ Wire Responses ============

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HumanizeResponse {
    pub success: bool,
    pub original_text: String,
    pub humanized_text: String,
    pub original_ai_percentage: f64,
    pub final_ai_percentage: f64,
    pub attempts_used: u32,
    pub techniques_applied: Vec<String>,
    pub message: String,
}

impl HumanizeResponse {
    pub fn from_outcome(outcome: &RewriteOutcome, threshold: f64) -> Self {
        let message = if outcome.attempts_used == 0 && outcome.techniques_applied.is_empty() {
            format!(
                "Text already scores {:.1}%, at or below the {:.1}% target. No changes made.",
                outcome.original_score, threshold
            )
        } else if outcome.met_threshold(threshold) {
            format!(
                "Reduced AI likelihood from {:.1}% to {:.1}%.",
                outcome.original_score, outcome.final_score
            )
        } else {
            format!(
                "Best result {:.1}% (from {:.1}%) after {} attempt(s); target {:.1}% not reached.",
                outcome.final_score, outcome.original_score, outcome.attempts_used, threshold
            )
        };

        Self {
            success: true,
            original_text: outcome.original_text.clone(),
            humanized_text: outcome.transformed_text.clone(),
            original_ai_percentage: outcome.original_score,
            final_ai_percentage: outcome.final_score,
            attempts_used: outcome.attempts_used,
            techniques_applied: outcome.techniques_applied.iter().map(|t| t.to_string()).collect(),
            message,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthStatus {
    pub status: String,
    pub service: String,
    pub version: String,
    pub llm_available: bool,
}
