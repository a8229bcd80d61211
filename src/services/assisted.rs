// Assisted Rewrite Stage
// One generator-backed rewrite per attempt, with a rule-based fallback on any failure

use async_trait::async_trait;
use regex::Regex;
use std::sync::OnceLock;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, warn};

use crate::models::{Mode, Style};
use crate::services::lexicon::Lexicon;
use crate::services::providers::{LlmSettings, ProviderClient, ProviderError};
use crate::services::text_processor::word_count;
use crate::services::transform::{light_cleanup, RandomSource};

const BASE_TEMPERATURE: f64 = 0.6;
const TEMPERATURE_STEP: f64 = 0.08;
const MIN_MAX_TOKENS: u32 = 1000;

// Checked case-insensitively, in this order.
const RESPONSE_PREAMBLES: &[&str] = &[
    "Here's the paraphrased",
    "Paraphrased:",
    "Here is",
    "Here's the rewritten",
    "Rewritten:",
    "REWRITTEN:",
    "Rewritten Document:",
];

#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("Generator not configured: {0}")]
    NotConfigured(String),
    #[error("Generation failed: {0}")]
    Provider(ProviderError),
    #[error("Generation timeout")]
    Timeout,
    #[error("Generator returned an empty response")]
    EmptyResponse,
}

impl From<ProviderError> for GenerationError {
    fn from(e: ProviderError) -> Self {
        match e {
            ProviderError::HttpError(ref inner) if inner.is_timeout() => Self::Timeout,
            other => Self::Provider(other),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct GenerationRequest {
    pub prompt: String,
    pub temperature: f64,
    pub max_tokens: u32,
}

/// Text generation collaborator.
#[async_trait]
pub trait Generator: Send + Sync {
    async fn generate(&self, request: &GenerationRequest) -> Result<String, GenerationError>;

    fn name(&self) -> &str;

    /// Unavailable generators are skipped without a call.
    fn is_available(&self) -> bool {
        true
    }
}

/// Chat-completions backed generator.
pub struct LlmGenerator {
    client: ProviderClient,
    model: String,
    api_key: String,
}

impl LlmGenerator {
    pub fn new(settings: &LlmSettings, api_key: String) -> Result<Self, ProviderError> {
        Ok(Self {
            client: ProviderClient::new(settings)?,
            model: settings.model.clone(),
            api_key,
        })
    }
}

#[async_trait]
impl Generator for LlmGenerator {
    async fn generate(&self, request: &GenerationRequest) -> Result<String, GenerationError> {
        let result = self
            .client
            .call_chat(
                &self.model,
                &self.api_key,
                "",
                &request.prompt,
                request.max_tokens,
                request.temperature,
            )
            .await?;

        debug!(
            "[ASSISTED] {} answered in {}ms ({} chars)",
            self.model,
            result.latency_ms,
            result.content.len()
        );

        if result.content.trim().is_empty() {
            return Err(GenerationError::EmptyResponse);
        }
        Ok(result.content)
    }

    fn name(&self) -> &str {
        &self.model
    }
}

/// Stand-in when no API key is configured; every attempt takes the fallback.
pub struct UnconfiguredGenerator;

#[async_trait]
impl Generator for UnconfiguredGenerator {
    async fn generate(&self, _request: &GenerationRequest) -> Result<String, GenerationError> {
        Err(GenerationError::NotConfigured("no LLM API key configured".to_string()))
    }

    fn name(&self) -> &str {
        "unconfigured"
    }

    fn is_available(&self) -> bool {
        false
    }
}

pub fn temperature_for(attempt: u32) -> f64 {
    BASE_TEMPERATURE + TEMPERATURE_STEP * attempt as f64
}

/// Room for a rewrite of similar length: `max(1000, 2.5 * words + 500)`.
pub fn max_tokens_for(words: usize) -> u32 {
    let budget = (words as f64 * 2.5) as u32 + 500;
    budget.max(MIN_MAX_TOKENS)
}

pub fn build_prompt(text: &str, style: Style, mode: Mode, lexicon: &Lexicon) -> String {
    let avoid = lexicon
        .avoid_list()
        .map(|(marker, plain)| format!("{} → {}", marker, plain))
        .collect::<Vec<_>>()
        .join(", ");

    let deleted_phrases = lexicon
        .phrases
        .iter()
        .filter(|rule| rule.entry.alternatives.contains(&""))
        .map(|rule| rule.entry.term)
        .chain(lexicon.phrases_to_remove())
        .map(|phrase| format!("- \"{}\"", phrase))
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        "Rewrite this COMPLETE text to sound human-written, not AI-generated.

STRICT RULES (MUST FOLLOW):
1. Keep EXACTLY the same meaning - do not omit or summarize any information.
2. Maintain the same depth and detail as the original.
3. Use contractions where natural: don't, can't, it's, they're, we're.
4. Mix sentence lengths for a natural rhythm - some short, some longer.
5. Every single point in the original must be present in your rewrite.

WORDS TO AVOID (replace with simpler alternatives):
- {avoid}
- furthermore/moreover → also/plus, additionally → also

PHRASES TO REMOVE COMPLETELY:
{deleted_phrases}

STYLE: {style}
MODE: {mode}

TEXT TO REWRITE:
{text}

REWRITTEN DOCUMENT (matching original length of approximately {words} words):",
        avoid = avoid,
        deleted_phrases = deleted_phrases,
        style = style.instruction(),
        mode = mode.instruction(),
        text = text,
        words = word_count(text),
    )
}

fn preamble_line_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)^\s*here(?:\s+is|'s)\s+(?:the\s+|your\s+)?(?:rewritten|paraphrased|revised|humanized)\b[^\n]*:\s*$")
            .expect("preamble regex")
    })
}

fn strip_prefix_ignore_case<'a>(s: &'a str, prefix: &str) -> Option<&'a str> {
    s.get(..prefix.len())
        .filter(|head| head.eq_ignore_ascii_case(prefix))
        .map(|_| &s[prefix.len()..])
}

/// Strip boilerplate the model likes to put around its answer.
pub fn clean_response(raw: &str) -> String {
    let mut s = raw.trim();

    // "Here is the rewritten text:" on its own line goes entirely.
    if let Some((first, rest)) = s.split_once('\n') {
        if preamble_line_re().is_match(first) {
            s = rest.trim();
        }
    }

    for prefix in RESPONSE_PREAMBLES {
        if let Some(rest) = strip_prefix_ignore_case(s, prefix) {
            s = rest.trim();
            if let Some(rest) = s.strip_prefix(':') {
                s = rest.trim();
            }
        }
    }

    if s.len() >= 2 && s.starts_with('"') && s.ends_with('"') {
        s = &s[1..s.len() - 1];
    }

    s.to_string()
}

#[derive(Debug, Clone, PartialEq)]
pub struct AssistedOutput {
    pub text: String,
    pub used_fallback: bool,
}

/// Rule-based substitute for a failed generation.
pub fn fallback_rewrite(text: &str, lexicon: &Lexicon, rng: &mut dyn RandomSource) -> AssistedOutput {
    AssistedOutput {
        text: light_cleanup(text, lexicon, rng),
        used_fallback: true,
    }
}

/// One assisted rewrite. Never fails: errors, empty answers, timeouts and
/// unavailable generators all yield the fallback rewrite.
pub async fn assisted_rewrite(
    generator: &dyn Generator,
    lexicon: &Lexicon,
    rng: &mut dyn RandomSource,
    text: &str,
    style: Style,
    mode: Mode,
    attempt: u32,
    timeout: Duration,
) -> AssistedOutput {
    if !generator.is_available() {
        debug!("[ASSISTED] {} unavailable, using fallback", generator.name());
        return fallback_rewrite(text, lexicon, rng);
    }

    let request = GenerationRequest {
        prompt: build_prompt(text, style, mode, lexicon),
        temperature: temperature_for(attempt),
        max_tokens: max_tokens_for(word_count(text)),
    };

    let result = match tokio::time::timeout(timeout, generator.generate(&request)).await {
        Ok(result) => result,
        Err(_) => Err(GenerationError::Timeout),
    };

    match result.map(|raw| clean_response(&raw)) {
        Ok(cleaned) if !cleaned.trim().is_empty() => AssistedOutput {
            text: cleaned,
            used_fallback: false,
        },
        Ok(_) => {
            warn!("[ASSISTED] {} attempt {}: {}", generator.name(), attempt, GenerationError::EmptyResponse);
            fallback_rewrite(text, lexicon, rng)
        }
        Err(e) => {
            warn!("[ASSISTED] {} attempt {} failed: {}", generator.name(), attempt, e);
            fallback_rewrite(text, lexicon, rng)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::transform::ConstantRandom;
    use std::sync::Mutex;

    struct EchoGenerator {
        reply: String,
        seen: Mutex<Vec<GenerationRequest>>,
    }

    #[async_trait]
    impl Generator for EchoGenerator {
        async fn generate(&self, request: &GenerationRequest) -> Result<String, GenerationError> {
            self.seen.lock().unwrap().push(request.clone());
            Ok(self.reply.clone())
        }

        fn name(&self) -> &str {
            "echo"
        }
    }

    struct SlowGenerator;

    #[async_trait]
    impl Generator for SlowGenerator {
        async fn generate(&self, _request: &GenerationRequest) -> Result<String, GenerationError> {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok("too late".to_string())
        }

        fn name(&self) -> &str {
            "slow"
        }
    }

    const INPUT: &str = "In essence, we do not leverage the tools.";

    #[test]
    fn test_generation_knobs() {
        assert!((temperature_for(0) - 0.6).abs() < 1e-9);
        assert!((temperature_for(3) - 0.84).abs() < 1e-9);
        assert_eq!(max_tokens_for(10), 1000);
        assert_eq!(max_tokens_for(400), 1500);
    }

    #[test]
    fn test_clean_response() {
        assert_eq!(clean_response("Rewritten: \"All good.\""), "All good.");
        assert_eq!(clean_response("REWRITTEN DOCUMENT: fine"), "fine");
        assert_eq!(
            clean_response("Here is the rewritten text:\nWe shipped it."),
            "We shipped it."
        );
        assert_eq!(
            clean_response("Here's your revised version:\nIt works."),
            "It works."
        );
        assert_eq!(clean_response("  plain answer  "), "plain answer");
        assert_eq!(clean_response("\""), "\"");
    }

    #[test]
    fn test_clean_response_keeps_content_headings() {
        let answer = "Here are the three priorities for 2025:\n1. Hire two engineers.\n2. Ship the beta.";
        assert_eq!(clean_response(answer), answer);

        let answer = "Hereby the board resolves:\nThe budget is approved.";
        assert_eq!(clean_response(answer), answer);
    }

    #[test]
    fn test_prompt_carries_directives() {
        let lex = Lexicon::new();
        let prompt = build_prompt("One two three.", Style::Casual, Mode::Light, &lex);
        assert!(prompt.contains("STYLE: friendly, like texting a colleague"));
        assert!(prompt.contains(Mode::Light.instruction()));
        assert!(prompt.contains("leverage → use"));
        assert!(prompt.contains("- \"in essence\""));
        assert!(prompt.contains("approximately 3 words"));
    }

    #[tokio::test]
    async fn test_generator_output_is_cleaned() {
        let lex = Lexicon::new();
        let generator = EchoGenerator {
            reply: "Rewritten: \"We skip the tools.\"".to_string(),
            seen: Mutex::new(Vec::new()),
        };
        let mut rng = ConstantRandom(0.0);
        let out = assisted_rewrite(&generator, &lex, &mut rng, INPUT, Style::Casual, Mode::Balanced, 2, Duration::from_secs(1)).await;
        assert_eq!(out.text, "We skip the tools.");
        assert!(!out.used_fallback);

        let seen = generator.seen.lock().unwrap();
        assert!((seen[0].temperature - 0.76).abs() < 1e-9);
        assert_eq!(seen[0].max_tokens, 1000);
    }

    #[tokio::test]
    async fn test_unconfigured_generator_falls_back() {
        let lex = Lexicon::new();
        let mut rng = ConstantRandom(0.0);
        let out = assisted_rewrite(&UnconfiguredGenerator, &lex, &mut rng, INPUT, Style::Casual, Mode::Balanced, 0, Duration::from_secs(1)).await;
        assert!(out.used_fallback);
        assert_eq!(out.text, "We don't use the tools.");
    }

    #[tokio::test]
    async fn test_empty_reply_falls_back() {
        let lex = Lexicon::new();
        let generator = EchoGenerator {
            reply: "Rewritten:   ".to_string(),
            seen: Mutex::new(Vec::new()),
        };
        let mut rng = ConstantRandom(0.0);
        let out = assisted_rewrite(&generator, &lex, &mut rng, INPUT, Style::Casual, Mode::Balanced, 0, Duration::from_secs(1)).await;
        assert!(out.used_fallback);
    }

    #[tokio::test]
    async fn test_timeout_falls_back() {
        let lex = Lexicon::new();
        let mut rng = ConstantRandom(0.0);
        let out = assisted_rewrite(&SlowGenerator, &lex, &mut rng, INPUT, Style::Casual, Mode::Balanced, 0, Duration::from_millis(50)).await;
        assert!(out.used_fallback);
    }
}
