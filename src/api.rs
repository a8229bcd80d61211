// Humanly API
// Request-level entry points: humanize, score, extract and health

use std::time::Instant;
use thiserror::Error;
use tracing::{info, warn};

use crate::models::{HealthStatus, HumanizeResponse, Mode, RequestError, RewriteOutcome, RewriteRequest, ScoreResult, Style};
use crate::services::config_store::{AppConfig, ConfigError, ConfigStore, DefaultsConfig};
use crate::services::extractor::{self, ExtractionError, FileFormat, UnsupportedFormat};
use crate::services::orchestrator::{CancelToken, Humanizer};
use crate::services::providers::{get_api_key, LlmSettings};
use crate::services::scoring;
use crate::services::transform::{RandomSource, SplitMix64};

pub const SERVICE_NAME: &str = "humanly";

#[derive(Debug, Error)]
pub enum HumanizeError {
    /// Missing content, unsupported format or out-of-range knobs.
    #[error("{0}")]
    Input(String),
    #[error(transparent)]
    Extraction(#[from] ExtractionError),
    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl From<RequestError> for HumanizeError {
    fn from(e: RequestError) -> Self {
        Self::Input(e.to_string())
    }
}

impl From<UnsupportedFormat> for HumanizeError {
    fn from(e: UnsupportedFormat) -> Self {
        Self::Input(e.to_string())
    }
}

#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub name: String,
    pub bytes: Vec<u8>,
}

/// Raw caller input. Unset knobs take the configured defaults.
#[derive(Debug, Clone, Default)]
pub struct HumanizeInput {
    pub text: Option<String>,
    pub file: Option<UploadedFile>,
    pub threshold: Option<f64>,
    pub max_attempts: Option<u32>,
    pub style: Option<String>,
    pub mode: Option<String>,
}

impl HumanizeInput {
    pub fn from_text(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            ..Self::default()
        }
    }
}

pub struct HumanlyService {
    humanizer: Humanizer,
    defaults: DefaultsConfig,
}

impl HumanlyService {
    pub fn new(humanizer: Humanizer, defaults: DefaultsConfig) -> Self {
        Self { humanizer, defaults }
    }

    pub fn from_config(config: &AppConfig, api_key: Option<String>) -> Self {
        let settings = LlmSettings::resolve(Some(&config.llm));
        info!("[API] LLM endpoint {} model {}", settings.completions_url(), settings.model);
        Self::new(Humanizer::from_settings(&settings, api_key), config.defaults.clone())
    }

    /// Config file at the default location plus environment overrides.
    pub fn from_environment() -> Self {
        let config = match ConfigStore::open_default().map(|store| store.load()) {
            Some(Ok(config)) => config,
            Some(Err(e)) => {
                warn!("[API] Failed to load config, using defaults: {}", e);
                AppConfig::default()
            }
            None => AppConfig::default(),
        };
        Self::from_config(&config, get_api_key())
    }

    pub fn humanizer(&self) -> &Humanizer {
        &self.humanizer
    }

    /// Validate input into a request. Non-blank text wins over an uploaded file.
    pub async fn build_request(&self, input: &HumanizeInput) -> Result<RewriteRequest, HumanizeError> {
        let content = match (&input.text, &input.file) {
            (Some(text), _) if !text.trim().is_empty() => text.clone(),
            (_, Some(file)) => extract_text(&file.name, file.bytes.clone()).await?,
            _ => String::new(),
        };

        let style = match input.style.as_deref() {
            Some(s) => s.parse::<Style>()?,
            None => self.defaults.style,
        };
        let mode = match input.mode.as_deref() {
            Some(m) => m.parse::<Mode>()?,
            None => self.defaults.mode,
        };

        Ok(RewriteRequest::new(
            &content,
            input.threshold.unwrap_or(self.defaults.threshold),
            input.max_attempts.unwrap_or(self.defaults.max_attempts),
            style,
            mode,
        )?)
    }

    pub async fn humanize(&self, input: HumanizeInput) -> Result<HumanizeResponse, HumanizeError> {
        let mut rng = SplitMix64::from_entropy();
        self.humanize_with(input, &mut rng, None).await
    }

    pub async fn humanize_with(
        &self,
        input: HumanizeInput,
        rng: &mut dyn RandomSource,
        cancel: Option<&CancelToken>,
    ) -> Result<HumanizeResponse, HumanizeError> {
        let (request, outcome) = self.run(input, rng, cancel).await?;
        Ok(HumanizeResponse::from_outcome(&outcome, request.threshold()))
    }

    /// Full outcome with per-attempt records.
    pub async fn rewrite(
        &self,
        input: HumanizeInput,
        rng: &mut dyn RandomSource,
        cancel: Option<&CancelToken>,
    ) -> Result<RewriteOutcome, HumanizeError> {
        Ok(self.run(input, rng, cancel).await?.1)
    }

    async fn run(
        &self,
        input: HumanizeInput,
        rng: &mut dyn RandomSource,
        cancel: Option<&CancelToken>,
    ) -> Result<(RewriteRequest, RewriteOutcome), HumanizeError> {
        let request = self.build_request(&input).await?;
        let started = Instant::now();
        let outcome = self.humanizer.humanize_with(&request, rng, cancel).await;
        info!(
            "[API] Humanized {} chars: {:.1}% -> {:.1}% (reduced by {:.1}) in {} attempt(s), {}ms",
            request.text().chars().count(),
            outcome.original_score,
            outcome.final_score,
            outcome.reduction(),
            outcome.attempts_used,
            started.elapsed().as_millis()
        );
        Ok((request, outcome))
    }

    pub fn health(&self) -> HealthStatus {
        HealthStatus {
            status: "healthy".to_string(),
            service: SERVICE_NAME.to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            llm_available: self.humanizer.generator_available(),
        }
    }
}

/// Score text without rewriting it.
pub fn score_text(text: &str) -> ScoreResult {
    scoring::score(text)
}

/// Extract text from an uploaded file. Unsupported extensions are input errors;
/// parser failures are extraction errors.
pub async fn extract_text(file_name: &str, bytes: Vec<u8>) -> Result<String, HumanizeError> {
    let format = FileFormat::detect(file_name)?;
    Ok(extractor::extract(format, bytes).await?)
}

/// Store or clear the LLM API key. A blank key is an input error.
pub fn update_api_key(store: &ConfigStore, key: Option<&str>) -> Result<(), HumanizeError> {
    match key.map(str::trim) {
        Some("") => Err(HumanizeError::Input("API key must not be blank".to_string())),
        Some(key) => {
            store.set_api_key(key)?;
            info!("[API] Stored LLM API key in {}", store.config_file().display());
            Ok(())
        }
        None => {
            store.delete_api_key()?;
            info!("[API] Removed LLM API key from {}", store.config_file().display());
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Signal;
    use crate::services::assisted::UnconfiguredGenerator;
    use crate::services::lexicon::Lexicon;
    use crate::services::transform::ConstantRandom;
    use std::sync::Arc;

    fn service() -> HumanlyService {
        let humanizer = Humanizer::new(Arc::new(Lexicon::new()), Arc::new(UnconfiguredGenerator));
        HumanlyService::new(humanizer, DefaultsConfig::default())
    }

    #[tokio::test]
    async fn test_missing_content_is_an_input_error() {
        let err = service().humanize(HumanizeInput::default()).await.unwrap_err();
        assert!(matches!(err, HumanizeError::Input(ref m) if m.starts_with("No content provided")));

        let err = service().humanize(HumanizeInput::from_text("   ")).await.unwrap_err();
        assert!(matches!(err, HumanizeError::Input(_)));
    }

    #[tokio::test]
    async fn test_bad_knobs_are_input_errors() {
        let input = HumanizeInput {
            style: Some("poetic".to_string()),
            ..HumanizeInput::from_text("Some text here.")
        };
        assert!(matches!(service().humanize(input).await, Err(HumanizeError::Input(_))));

        let input = HumanizeInput {
            max_attempts: Some(0),
            ..HumanizeInput::from_text("Some text here.")
        };
        assert!(matches!(service().humanize(input).await, Err(HumanizeError::Input(_))));
    }

    #[tokio::test]
    async fn test_text_wins_over_file() {
        let input = HumanizeInput {
            text: Some("Typed text wins here.".to_string()),
            file: Some(UploadedFile {
                name: "ignored.pptx".to_string(),
                bytes: vec![1, 2, 3],
            }),
            ..HumanizeInput::default()
        };
        let request = service().build_request(&input).await.unwrap();
        assert_eq!(request.text(), "Typed text wins here.");
    }

    #[tokio::test]
    async fn test_file_used_when_text_blank() {
        let input = HumanizeInput {
            text: Some("  ".to_string()),
            file: Some(UploadedFile {
                name: "notes.txt".to_string(),
                bytes: b"  From the file.  ".to_vec(),
            }),
            ..HumanizeInput::default()
        };
        let request = service().build_request(&input).await.unwrap();
        assert_eq!(request.text(), "From the file.");
    }

    #[tokio::test]
    async fn test_legacy_doc_rejected() {
        let err = extract_text("old.DOC", vec![0; 8]).await.unwrap_err();
        assert_eq!(err.to_string(), "Legacy .doc files are not supported. Please save as .docx.");
    }

    #[tokio::test]
    async fn test_low_score_response_is_unchanged() {
        let text = "Honestly, we shipped it late. The team didn't love the crunch, but everyone \
            pitched in when the servers fell over on Friday night and kept going until dawn. \
            Lesson learned? Plan buffers next time.";
        let mut rng = ConstantRandom(0.5);
        let response = service()
            .humanize_with(HumanizeInput::from_text(text), &mut rng, None)
            .await
            .unwrap();
        assert!(response.success);
        assert_eq!(response.humanized_text, text);
        assert_eq!(response.attempts_used, 0);
        assert_eq!(response.original_ai_percentage, response.final_ai_percentage);
    }

    #[test]
    fn test_update_api_key() {
        let dir = tempfile::tempdir().unwrap();
        let store = ConfigStore::new(dir.path().to_path_buf());

        assert!(matches!(update_api_key(&store, Some("  ")), Err(HumanizeError::Input(_))));
        update_api_key(&store, Some(" sk-test ")).unwrap();
        assert_eq!(store.get_api_key().unwrap().as_deref(), Some("sk-test"));

        update_api_key(&store, None).unwrap();
        assert_eq!(store.get_api_key().unwrap(), None);
    }

    #[test]
    fn test_health_and_score() {
        let health = service().health();
        assert_eq!(health.status, "healthy");
        assert!(!health.llm_available);
        assert!(score_text("tiny").signals.contains(&Signal::TextTooShort));
    }
}
