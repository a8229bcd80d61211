// Deterministic Transform Stage
// Five rule-based rewrite steps run in a fixed order. "Deterministic" refers to
// the absence of a generator; the steps still draw from an injected RandomSource.

pub mod contractions;
pub mod markers;
pub mod paraphrase;
pub mod random;
pub mod restructure;

use tracing::debug;

use crate::models::{Mode, Technique, TechniqueCount};
use crate::services::lexicon::Lexicon;
use crate::services::text_processor::tidy;

pub use contractions::add_contractions;
pub use markers::remove_ai_markers;
pub use paraphrase::{paraphrase_phrases, substitute_synonyms};
pub use random::{ConstantRandom, RandomSource, SplitMix64};
pub use restructure::restructure_sentences;

/// Output of one pass: the rewritten text and the steps that changed something.
#[derive(Debug, Clone, PartialEq)]
pub struct PassOutput {
    pub text: String,
    pub techniques: Vec<TechniqueCount>,
}

fn record(techniques: &mut Vec<TechniqueCount>, technique: Technique, count: usize) {
    if count > 0 {
        techniques.push(TechniqueCount { technique, count });
    }
}

/// Marker removal, phrase paraphrase, synonyms at the mode's intensity,
/// restructuring and contractions, then a final tidy.
pub fn run_deterministic_pass(
    text: &str,
    lexicon: &Lexicon,
    mode: Mode,
    rng: &mut dyn RandomSource,
) -> PassOutput {
    let mut techniques = Vec::new();

    let (current, n) = remove_ai_markers(text, lexicon);
    record(&mut techniques, Technique::AiMarkerRemoval, n);

    let (current, n) = paraphrase_phrases(&current, lexicon, rng);
    record(&mut techniques, Technique::PhraseParaphrase, n);

    let (current, n) = substitute_synonyms(&current, lexicon, rng, mode.intensity());
    record(&mut techniques, Technique::SynonymReplace, n);

    let (current, n) = restructure_sentences(&current, lexicon, rng);
    record(&mut techniques, Technique::Restructure, n);

    let (current, n) = add_contractions(&current, lexicon, rng);
    record(&mut techniques, Technique::Contractions, n);

    debug!(
        "Deterministic pass ({}): {}",
        mode,
        techniques.iter().map(|t| t.to_string()).collect::<Vec<_>>().join(", ")
    );

    PassOutput {
        text: tidy(&current),
        techniques,
    }
}

/// Marker removal, phrase paraphrase and contractions. Applied to generator
/// output and used as the generator fallback.
pub fn light_cleanup(text: &str, lexicon: &Lexicon, rng: &mut dyn RandomSource) -> String {
    let (current, _) = remove_ai_markers(text, lexicon);
    let (current, _) = paraphrase_phrases(&current, lexicon, rng);
    let (current, _) = add_contractions(&current, lexicon, rng);
    tidy(&current)
}
