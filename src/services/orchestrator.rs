// Refinement Orchestrator
// Baseline -> deterministic pass -> bounded assisted loop, keeping the lowest-scoring candidate

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

use crate::models::{AttemptRecord, RewriteOutcome, RewriteRequest, ScoreResult, Signal, Technique, TechniqueCount};
use crate::services::assisted::{assisted_rewrite, Generator, LlmGenerator, UnconfiguredGenerator};
use crate::services::lexicon::Lexicon;
use crate::services::providers::LlmSettings;
use crate::services::scoring::score;
use crate::services::transform::{light_cleanup, run_deterministic_pass, RandomSource, SplitMix64};

/// Candidates shorter than this share of the seed's words are never promoted.
const MIN_KEPT_WORD_RATIO: f64 = 0.25;

/// Too short to score, or too much of the seed text gone.
fn drops_content(candidate: &ScoreResult, seed_words: usize) -> bool {
    candidate.has(Signal::TextTooShort)
        || (candidate.word_count as f64) < seed_words as f64 * MIN_KEPT_WORD_RATIO
}

/// Cooperative cancellation, checked before each assisted attempt.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

pub struct Humanizer {
    lexicon: Arc<Lexicon>,
    generator: Arc<dyn Generator>,
    generation_timeout: Duration,
}

impl Humanizer {
    pub fn new(lexicon: Arc<Lexicon>, generator: Arc<dyn Generator>) -> Self {
        Self {
            lexicon,
            generator,
            generation_timeout: LlmSettings::default().timeout,
        }
    }

    /// LLM-backed when a key is present, fallback-only otherwise.
    pub fn from_settings(settings: &LlmSettings, api_key: Option<String>) -> Self {
        let generator: Arc<dyn Generator> = match api_key {
            Some(key) => match LlmGenerator::new(settings, key) {
                Ok(g) => Arc::new(g),
                Err(e) => {
                    warn!("[HUMANIZE] Failed to build LLM client, rule-based rewriting only: {}", e);
                    Arc::new(UnconfiguredGenerator)
                }
            },
            None => {
                warn!("[HUMANIZE] LLM API key not configured, rule-based rewriting only");
                Arc::new(UnconfiguredGenerator)
            }
        };

        Self::new(Arc::new(Lexicon::new()), generator).with_timeout(settings.timeout)
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.generation_timeout = timeout;
        self
    }

    pub fn generator_available(&self) -> bool {
        self.generator.is_available()
    }

    pub async fn humanize(&self, request: &RewriteRequest) -> RewriteOutcome {
        let mut rng = SplitMix64::from_entropy();
        self.humanize_with(request, &mut rng, None).await
    }

    pub async fn humanize_with(
        &self,
        request: &RewriteRequest,
        rng: &mut dyn RandomSource,
        cancel: Option<&CancelToken>,
    ) -> RewriteOutcome {
        let original_text = request.text().to_string();
        let threshold = request.threshold();

        let baseline = score(&original_text);
        info!("[HUMANIZE] Original AI score: {:.1}%", baseline.score);

        if baseline.score <= threshold {
            info!("[HUMANIZE] Already at or below {:.1}%, returning unchanged", threshold);
            return RewriteOutcome {
                transformed_text: original_text.clone(),
                original_text,
                original_score: baseline.score,
                final_score: baseline.score,
                attempts_used: 0,
                techniques_applied: Vec::new(),
                attempts: Vec::new(),
                final_signals: baseline.signals,
            };
        }

        let pass = run_deterministic_pass(&original_text, &self.lexicon, request.mode(), rng);
        let mut techniques = pass.techniques;
        let mut best_text = pass.text;
        let mut best: ScoreResult = score(&best_text);
        info!("[HUMANIZE] After rule-based pass: {:.1}%", best.score);

        let mut attempts = Vec::new();
        let mut attempts_used = 0;

        if best.score > threshold {
            for attempt in 1..=request.max_attempts() {
                if cancel.map_or(false, CancelToken::is_cancelled) {
                    info!("[HUMANIZE] Cancelled before attempt {}", attempt);
                    break;
                }
                attempts_used = attempt;

                let output = assisted_rewrite(
                    self.generator.as_ref(),
                    &self.lexicon,
                    rng,
                    &best_text,
                    request.style(),
                    request.mode(),
                    attempt - 1,
                    self.generation_timeout,
                )
                .await;

                let candidate = light_cleanup(&output.text, &self.lexicon, rng);
                let scored = score(&candidate);
                let candidate_score = scored.score;
                let rejected = drops_content(&scored, best.word_count);
                info!(
                    "[HUMANIZE] Attempt {}: {:.1}%{}",
                    attempt,
                    candidate_score,
                    if output.used_fallback { " (fallback)" } else { "" }
                );
                if rejected {
                    warn!(
                        "[HUMANIZE] Attempt {} kept {} of {} words, discarded",
                        attempt, scored.word_count, best.word_count
                    );
                }

                // Strictly lower only; ties keep the earlier candidate.
                if !rejected && candidate_score < best.score {
                    best_text = candidate;
                    best = scored;
                }

                attempts.push(AttemptRecord {
                    attempt,
                    candidate_score,
                    best_score: best.score,
                    used_fallback: output.used_fallback,
                    rejected,
                });

                if best.score <= threshold {
                    break;
                }
            }
        }

        if attempts_used > 0 {
            techniques.push(TechniqueCount {
                technique: Technique::LlmParaphrase,
                count: attempts_used as usize,
            });
        }

        RewriteOutcome {
            original_text,
            transformed_text: best_text,
            original_score: baseline.score,
            final_score: best.score,
            attempts_used,
            techniques_applied: techniques,
            attempts,
            final_signals: best.signals,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Mode, Style};
    use crate::services::assisted::{GenerationError, GenerationRequest};
    use crate::services::transform::ConstantRandom;
    use async_trait::async_trait;
    use std::sync::atomic::AtomicUsize;
    use std::sync::Mutex;

    // Eleven ten-word sentences: uniform lengths, stacked transitions, no contractions.
    const BUZZWORD_PARAGRAPH: &str = "Moreover, our robust platform delivers seamless value for every client. \
        Moreover, our innovative team builds holistic tools for modern markets. \
        Consequently, our pivotal strategy will unlock growth across all regions. \
        Moreover, our comprehensive approach helps empower staff in each office. \
        Nevertheless, our strategic vision remains dynamic throughout the fiscal year. \
        Moreover, our synergy with partners creates cutting-edge products every quarter. \
        Thus, our paradigm shift brings groundbreaking results to loyal customers. \
        Moreover, our multifaceted services support robust operations in several countries. \
        Hence, our seamless integration keeps innovative features running for users. \
        Moreover, our holistic model drives pivotal change within the industry. \
        Furthermore, our dynamic leaders guide comprehensive plans toward lasting success.";

    const CASUAL_REWRITE: &str = "Honestly, we shipped it late. The team didn't love the crunch, but everyone \
        pitched in when the servers fell over on Friday night and kept going until dawn. \
        Lesson learned? Plan buffers next time.";

    struct FixedReply {
        reply: String,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl Generator for FixedReply {
        async fn generate(&self, _request: &GenerationRequest) -> Result<String, GenerationError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.reply.clone())
        }

        fn name(&self) -> &str {
            "fixed"
        }
    }

    struct AlwaysFails;

    #[async_trait]
    impl Generator for AlwaysFails {
        async fn generate(&self, _request: &GenerationRequest) -> Result<String, GenerationError> {
            Err(GenerationError::EmptyResponse)
        }

        fn name(&self) -> &str {
            "failing"
        }
    }

    /// Replays canned answers in order, then fails.
    struct Scripted {
        replies: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl Generator for Scripted {
        async fn generate(&self, _request: &GenerationRequest) -> Result<String, GenerationError> {
            let mut replies = self.replies.lock().unwrap();
            if replies.is_empty() {
                return Err(GenerationError::EmptyResponse);
            }
            Ok(replies.remove(0))
        }

        fn name(&self) -> &str {
            "scripted"
        }
    }

    struct CancelsOnCall(CancelToken);

    #[async_trait]
    impl Generator for CancelsOnCall {
        async fn generate(&self, _request: &GenerationRequest) -> Result<String, GenerationError> {
            self.0.cancel();
            Err(GenerationError::Timeout)
        }

        fn name(&self) -> &str {
            "cancelling"
        }
    }

    fn humanizer(generator: Arc<dyn Generator>) -> Humanizer {
        Humanizer::new(Arc::new(Lexicon::new()), generator).with_timeout(Duration::from_secs(2))
    }

    fn request(text: &str, max_attempts: u32) -> RewriteRequest {
        RewriteRequest::new(text, 30.0, max_attempts, Style::Professional, Mode::Balanced).unwrap()
    }

    #[tokio::test]
    async fn test_low_scoring_text_passes_through_untouched() {
        let h = humanizer(Arc::new(AlwaysFails));
        let mut rng = ConstantRandom(0.0);
        let outcome = h.humanize_with(&request(CASUAL_REWRITE, 5), &mut rng, None).await;

        assert_eq!(outcome.transformed_text, outcome.original_text);
        assert_eq!(outcome.attempts_used, 0);
        assert_eq!(outcome.original_score, outcome.final_score);
        assert!(outcome.techniques_applied.is_empty());
    }

    #[tokio::test]
    async fn test_first_good_rewrite_stops_the_loop() {
        let generator = Arc::new(FixedReply {
            reply: CASUAL_REWRITE.to_string(),
            calls: AtomicUsize::new(0),
        });
        let h = humanizer(generator.clone());
        let mut rng = ConstantRandom(0.99);
        let outcome = h.humanize_with(&request(BUZZWORD_PARAGRAPH, 5), &mut rng, None).await;

        assert!(outcome.original_score > 30.0);
        assert_eq!(outcome.attempts_used, 1);
        assert_eq!(generator.calls.load(Ordering::SeqCst), 1);
        assert!(outcome.final_score <= 30.0);
        assert_eq!(outcome.transformed_text, CASUAL_REWRITE.split_whitespace().collect::<Vec<_>>().join(" "));
        assert!(!outcome.attempts[0].used_fallback);
        assert!(outcome
            .techniques_applied
            .iter()
            .any(|t| t.technique == Technique::LlmParaphrase));
    }

    #[tokio::test]
    async fn test_failing_generator_exhausts_attempts_and_keeps_rule_based_result() {
        let lexicon = Lexicon::new();
        let pass = run_deterministic_pass(BUZZWORD_PARAGRAPH, &lexicon, Mode::Balanced, &mut ConstantRandom(0.99));
        let rule_based_score = score(&pass.text).score;
        assert!(rule_based_score > 30.0);

        let h = humanizer(Arc::new(AlwaysFails));
        let mut rng = ConstantRandom(0.99);
        let outcome = h.humanize_with(&request(BUZZWORD_PARAGRAPH, 5), &mut rng, None).await;

        assert_eq!(outcome.attempts_used, 5);
        assert_eq!(outcome.attempts.len(), 5);
        assert!(outcome.attempts.iter().all(|a| a.used_fallback));
        assert!(outcome.final_score <= rule_based_score);
        assert!(!outcome.transformed_text.is_empty());
    }

    #[tokio::test]
    async fn test_best_score_never_increases() {
        let generator = Arc::new(Scripted {
            replies: Mutex::new(vec![
                BUZZWORD_PARAGRAPH.to_string(),
                "Moreover, our plan works. Moreover, our team works. Moreover, our tools work. \
                 Moreover, our staff works. Moreover, our model works. Moreover, our office works."
                    .to_string(),
                BUZZWORD_PARAGRAPH.to_string(),
            ]),
        });
        let h = humanizer(generator);
        let mut rng = SplitMix64::seeded(11);
        let outcome = h.humanize_with(&request(BUZZWORD_PARAGRAPH, 6), &mut rng, None).await;

        assert!(outcome.attempts_used <= 6);
        let mut previous = f64::MAX;
        for record in &outcome.attempts {
            assert!(record.best_score <= previous);
            if !record.rejected {
                assert!(record.best_score <= record.candidate_score);
            }
            previous = record.best_score;
        }
        let lowest = outcome
            .attempts
            .iter()
            .filter(|a| !a.rejected)
            .map(|a| a.candidate_score)
            .fold(f64::MAX, f64::min);
        assert!(outcome.final_score <= lowest);
        assert_eq!(score(&outcome.transformed_text).score, outcome.final_score);
    }

    #[tokio::test]
    async fn test_terse_reply_never_replaces_the_text() {
        let generator = Arc::new(FixedReply {
            reply: "Sure, done.".to_string(),
            calls: AtomicUsize::new(0),
        });
        let h = humanizer(generator.clone());
        let mut rng = ConstantRandom(0.99);
        let outcome = h.humanize_with(&request(BUZZWORD_PARAGRAPH, 3), &mut rng, None).await;

        assert_eq!(generator.calls.load(Ordering::SeqCst), 3);
        assert_eq!(outcome.attempts_used, 3);
        assert!(outcome.attempts.iter().all(|a| a.rejected && a.candidate_score == 0.0));
        assert_ne!(outcome.transformed_text, "Sure, done.");
        assert!(outcome.final_score > 30.0);
        assert!(score(&outcome.transformed_text).word_count > 100);
    }

    #[test]
    fn test_drops_content() {
        let short = score("Sure, done.");
        assert!(drops_content(&short, 4));
        let quarter = score(&"word ".repeat(40));
        assert!(drops_content(&quarter, 200));
        assert!(!drops_content(&quarter, 160));
    }

    #[tokio::test]
    async fn test_attempts_are_bounded() {
        let h = humanizer(Arc::new(AlwaysFails));
        let mut rng = SplitMix64::seeded(3);
        let outcome = h.humanize_with(&request(BUZZWORD_PARAGRAPH, 3), &mut rng, None).await;
        assert!(outcome.attempts_used <= 3);
        assert_eq!(outcome.attempts.len() as u32, outcome.attempts_used);
    }

    #[tokio::test]
    async fn test_cancellation_between_attempts() {
        let token = CancelToken::new();
        let h = humanizer(Arc::new(CancelsOnCall(token.clone())));
        let mut rng = ConstantRandom(0.99);
        let outcome = h.humanize_with(&request(BUZZWORD_PARAGRAPH, 5), &mut rng, Some(&token)).await;
        assert_eq!(outcome.attempts_used, 1);
        assert!(token.is_cancelled());

        let pre_cancelled = CancelToken::new();
        pre_cancelled.cancel();
        let h = humanizer(Arc::new(AlwaysFails));
        let outcome = h.humanize_with(&request(BUZZWORD_PARAGRAPH, 5), &mut rng, Some(&pre_cancelled)).await;
        assert_eq!(outcome.attempts_used, 0);
        assert!(outcome.final_score < outcome.original_score);
    }

    #[test]
    fn test_from_settings_without_key_is_fallback_only() {
        let h = Humanizer::from_settings(&LlmSettings::default(), None);
        assert!(!h.generator_available());
    }
}
