// Humanly Core Services
// Scoring, rule-based and assisted rewriting, extraction and configuration

pub mod assisted;
pub mod config_store;
pub mod extractor;
pub mod lexicon;
pub mod orchestrator;
pub mod providers;
pub mod scoring;
pub mod text_processor;
pub mod transform;

pub use assisted::{
    assisted_rewrite, AssistedOutput, GenerationError, GenerationRequest, Generator, LlmGenerator,
    UnconfiguredGenerator,
};
pub use config_store::{AppConfig, ConfigError, ConfigStore, DefaultsConfig, LlmConfig};
pub use extractor::{ExtractionError, FileFormat, UnsupportedFormat};
pub use lexicon::{Lexicon, SubstitutionTable};
pub use orchestrator::{CancelToken, Humanizer};
pub use providers::{get_api_key, LlmSettings, ProviderClient, ProviderError};
pub use scoring::score;
pub use transform::{run_deterministic_pass, ConstantRandom, PassOutput, RandomSource, SplitMix64};
