// Lexicon
// Substitution tables shared by the transform stage and the assisted rewriter.
// Built once and handed out by reference; nothing here is mutated after construction.

use regex::Regex;
use std::collections::HashMap;

/// One table row: a canonical term and its interchangeable alternatives.
#[derive(Debug, Clone, Copy)]
pub struct SubstitutionEntry {
    pub term: &'static str,
    pub alternatives: &'static [&'static str],
}

/// Ordered term -> alternatives mapping with case-insensitive lookup.
#[derive(Debug, Clone)]
pub struct SubstitutionTable {
    entries: Vec<SubstitutionEntry>,
    index: HashMap<String, usize>,
}

impl SubstitutionTable {
    /// Rows with an empty alternatives list are skipped.
    pub fn from_static(rows: &[(&'static str, &'static [&'static str])]) -> Self {
        let mut entries = Vec::with_capacity(rows.len());
        let mut index = HashMap::with_capacity(rows.len());
        for &(term, alternatives) in rows {
            if alternatives.is_empty() {
                continue;
            }
            index.insert(term.to_lowercase(), entries.len());
            entries.push(SubstitutionEntry { term, alternatives });
        }
        Self { entries, index }
    }

    pub fn get(&self, term: &str) -> Option<&'static [&'static str]> {
        self.index
            .get(&term.to_lowercase())
            .map(|&i| self.entries[i].alternatives)
    }

    pub fn entries(&self) -> &[SubstitutionEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// A compiled find/replace rule. `pattern` is case-insensitive.
#[derive(Debug, Clone)]
pub struct ReplacementRule {
    pub source: &'static str,
    pub pattern: Regex,
    pub replacement: &'static str,
}

/// A phrase-table row with its compiled matcher.
#[derive(Debug, Clone)]
pub struct PhraseRule {
    pub entry: SubstitutionEntry,
    pub pattern: Regex,
}

const SYNONYMS: &[(&str, &[&str])] = &[
    ("use", &["employ", "apply", "utilize", "adopt", "make use of"]),
    ("utilize", &["use", "employ", "apply", "harness"]),
    ("leverage", &["use", "employ", "capitalize on", "take advantage of"]),
    ("implement", &["execute", "carry out", "put into practice", "deploy", "roll out"]),
    ("facilitate", &["enable", "help", "assist", "support", "make possible"]),
    ("enhance", &["improve", "boost", "strengthen", "elevate", "upgrade"]),
    ("optimize", &["improve", "refine", "fine-tune", "streamline"]),
    ("achieve", &["accomplish", "attain", "reach", "realize"]),
    ("ensure", &["guarantee", "make sure", "confirm", "secure"]),
    ("provide", &["offer", "supply", "deliver", "give", "furnish"]),
    ("enable", &["allow", "permit", "let", "empower", "make possible"]),
    ("demonstrate", &["show", "display", "illustrate", "exhibit", "prove"]),
    ("establish", &["set up", "create", "found", "build", "form"]),
    ("maintain", &["keep", "preserve", "sustain", "uphold", "retain"]),
    ("require", &["need", "demand", "call for", "necessitate"]),
    ("develop", &["create", "build", "design", "craft", "form"]),
    ("consider", &["think about", "examine", "look at", "review", "weigh"]),
    ("evaluate", &["assess", "analyze", "examine", "review", "judge"]),
    ("indicate", &["show", "suggest", "point to", "reveal", "signal"]),
    ("address", &["tackle", "handle", "deal with", "take on", "resolve"]),
    ("comprehensive", &["complete", "thorough", "full", "extensive", "all-inclusive"]),
    ("robust", &["strong", "solid", "sturdy", "resilient", "reliable"]),
    ("innovative", &["new", "novel", "creative", "original", "groundbreaking"]),
    ("significant", &["major", "important", "notable", "considerable", "substantial"]),
    ("essential", &["vital", "crucial", "key", "necessary", "fundamental"]),
    ("effective", &["successful", "productive", "efficient", "powerful"]),
    ("efficient", &["effective", "productive", "streamlined", "optimized"]),
    ("various", &["different", "diverse", "several", "numerous", "multiple"]),
    ("complex", &["complicated", "intricate", "sophisticated", "elaborate"]),
    ("critical", &["crucial", "vital", "key", "essential", "important"]),
    ("substantial", &["significant", "considerable", "major", "large", "sizable"]),
    ("pivotal", &["key", "crucial", "central", "vital", "essential"]),
    ("paramount", &["supreme", "top", "chief", "primary", "foremost"]),
    ("seamless", &["smooth", "effortless", "fluid", "uninterrupted"]),
    ("strategic", &["planned", "calculated", "deliberate", "tactical"]),
    ("methodology", &["method", "approach", "technique", "process", "system"]),
    ("framework", &["structure", "system", "model", "foundation"]),
    ("paradigm", &["model", "pattern", "example", "standard"]),
    ("endeavor", &["effort", "attempt", "undertaking", "venture"]),
    ("landscape", &["environment", "scene", "field", "arena", "sphere"]),
    ("synergy", &["cooperation", "teamwork", "collaboration", "partnership"]),
    ("implementation", &["execution", "rollout", "deployment", "application"]),
    ("utilization", &["use", "usage", "application", "employment"]),
    ("significantly", &["greatly", "considerably", "substantially", "noticeably"]),
    ("effectively", &["successfully", "well", "efficiently", "properly"]),
    ("subsequently", &["later", "afterward", "then", "next"]),
    ("predominantly", &["mainly", "mostly", "primarily", "largely"]),
    ("consequently", &["as a result", "therefore", "thus", "hence"]),
    ("additionally", &["also", "moreover", "plus", "besides", "as well"]),
    ("furthermore", &["also", "in addition", "plus", "what's more"]),
    ("however", &["but", "yet", "still", "though", "nevertheless"]),
    ("therefore", &["so", "thus", "hence", "as a result"]),
    ("moreover", &["also", "besides", "in addition", "plus"]),
];

const PHRASE_PARAPHRASES: &[(&str, &[&str])] = &[
    ("it is important to note that", &["notably", "it's worth mentioning that", "keep in mind that", ""]),
    ("it should be noted that", &["note that", "importantly", "notably", ""]),
    ("in order to", &["to", "so as to", "for"]),
    ("due to the fact that", &["because", "since", "as"]),
    ("at this point in time", &["now", "currently", "at present"]),
    ("in the event that", &["if", "should", "in case"]),
    ("for the purpose of", &["to", "for", "in order to"]),
    ("with regard to", &["about", "regarding", "concerning", "on"]),
    ("in terms of", &["regarding", "concerning", "when it comes to", "for"]),
    ("a large number of", &["many", "numerous", "lots of", "plenty of"]),
    ("a significant amount of", &["much", "considerable", "substantial"]),
    ("on the other hand", &["however", "but", "conversely", "alternatively"]),
    ("as a result of", &["because of", "due to", "owing to", "from"]),
    ("in light of", &["given", "considering", "because of", "due to"]),
    ("with respect to", &["regarding", "about", "concerning", "for"]),
    ("in accordance with", &["following", "per", "as per", "according to"]),
    ("prior to", &["before", "ahead of", "preceding"]),
    ("subsequent to", &["after", "following", "post"]),
    ("in the process of", &["currently", "now", "busy with"]),
    ("take into consideration", &["consider", "think about", "account for"]),
    ("come to the conclusion", &["conclude", "decide", "determine"]),
    ("make a decision", &["decide", "choose", "determine"]),
    ("is able to", &["can", "is capable of"]),
    ("has the ability to", &["can", "is able to"]),
    ("there are many", &["many", "numerous", "several"]),
    ("it is possible that", &["possibly", "perhaps", "maybe"]),
    ("in spite of the fact that", &["although", "though", "despite"]),
    ("regardless of the fact that", &["although", "even though"]),
    ("the fact that", &["that", "how"]),
];

// Matched case-sensitively against the sentence start, in this order.
const SENTENCE_OPENERS: &[(&str, &[&str])] = &[
    ("This", &["The", "Such", "That", ""]),
    ("It is", &["", "There's", "We find that"]),
    ("There are", &["We have", "You'll find", ""]),
    ("The", &["This", "Our", "Their", ""]),
    ("We", &["Our team", "The company", ""]),
    ("They", &["The team", "These professionals", ""]),
];

const CONTRACTIONS: &[(&str, &str)] = &[
    ("do not", "don't"),
    ("does not", "doesn't"),
    ("cannot", "can't"),
    ("will not", "won't"),
    ("should not", "shouldn't"),
    ("would not", "wouldn't"),
    ("could not", "couldn't"),
    ("is not", "isn't"),
    ("are not", "aren't"),
    ("was not", "wasn't"),
    ("were not", "weren't"),
    ("has not", "hasn't"),
    ("have not", "haven't"),
    ("had not", "hadn't"),
    ("it is", "it's"),
    ("that is", "that's"),
    ("what is", "what's"),
    ("who is", "who's"),
    ("there is", "there's"),
    ("here is", "here's"),
    ("they are", "they're"),
    ("we are", "we're"),
    ("you are", "you're"),
    ("I am", "I'm"),
    ("I have", "I've"),
    ("I will", "I'll"),
    ("I would", "I'd"),
    ("let us", "let's"),
    ("it will", "it'll"),
    ("that will", "that'll"),
];

const MARKER_WORDS: &[(&str, &str)] = &[
    ("delve", "explore"),
    ("tapestry", "mix"),
    ("realm", "area"),
    ("landscape", "field"),
    ("journey", "process"),
    ("unlock", "discover"),
    ("empower", "enable"),
    ("seamless", "smooth"),
    ("robust", "strong"),
    ("holistic", "complete"),
    ("synergy", "cooperation"),
    ("paradigm", "approach"),
    ("innovative", "new"),
    ("cutting-edge", "modern"),
    ("state-of-the-art", "latest"),
    ("game-changer", "breakthrough"),
    ("groundbreaking", "major"),
    ("revolutionary", "significant"),
    ("unprecedented", "unique"),
    ("world-class", "excellent"),
    ("best-in-class", "top"),
    ("leverage", "use"),
    ("utilize", "use"),
    ("utilization", "use"),
    ("facilitate", "help"),
    ("comprehensive", "complete"),
    ("dynamic", "active"),
    ("evolving", "growing"),
    ("strategic", "planned"),
    ("pivotal", "key"),
    ("paramount", "vital"),
    ("endeavor", "effort"),
    ("noteworthy", "important"),
    ("fortify", "strengthen"),
    ("fostering", "encouraging"),
    ("bolster", "support"),
    ("underscore", "show"),
    ("multifaceted", "varied"),
    ("vibrant", "lively"),
    ("ongoing", "current"),
];

const MARKER_PHRASES: &[(&str, &str)] = &[
    ("in essence", ""),
    ("at its core", ""),
    ("plays a crucial role", "is important"),
    ("plays a vital role", "matters"),
    ("plays an important role", "helps"),
    ("it's worth noting", ""),
    ("what's more", "also"),
    ("in today's world", "today"),
    ("in the modern era", "now"),
    ("continues to grow", "keeps growing"),
    ("continues to evolve", "keeps changing"),
    ("further reinforced", "strengthened"),
    ("continually growing", "growing"),
    ("continually adapting", "adapting"),
];

/// Formal connectives swapped for plain ones at a sentence start.
pub const CONNECTIVE_SWAPS: &[(&str, &str)] = &[
    ("However", "But"),
    ("Therefore", "So"),
    ("Additionally", "Also"),
];

fn word_pattern(term: &str) -> Regex {
    Regex::new(&format!(r"(?i)\b{}\b", regex::escape(term))).expect("lexicon word regex")
}

fn phrase_pattern(phrase: &str) -> Regex {
    // Leading boundary only when the phrase starts with a word character.
    let escaped = regex::escape(phrase);
    let starts_word = phrase.chars().next().map_or(false, |c| c.is_alphanumeric());
    let ends_word = phrase.chars().last().map_or(false, |c| c.is_alphanumeric());
    let pattern = format!(
        "(?i){}{}{}",
        if starts_word { r"\b" } else { "" },
        escaped,
        if ends_word { r"\b" } else { "" }
    );
    Regex::new(&pattern).expect("lexicon phrase regex")
}

/// All substitution tables with their compiled matchers.
#[derive(Debug, Clone)]
pub struct Lexicon {
    pub synonyms: SubstitutionTable,
    pub phrases: Vec<PhraseRule>,
    pub openers: SubstitutionTable,
    pub contractions: Vec<ReplacementRule>,
    pub marker_words: Vec<ReplacementRule>,
    pub marker_phrases: Vec<ReplacementRule>,
}

impl Default for Lexicon {
    fn default() -> Self {
        Self::new()
    }
}

impl Lexicon {
    pub fn new() -> Self {
        let phrase_table = SubstitutionTable::from_static(PHRASE_PARAPHRASES);
        let phrases = phrase_table
            .entries()
            .iter()
            .map(|entry| PhraseRule {
                entry: *entry,
                pattern: phrase_pattern(entry.term),
            })
            .collect();

        Self {
            synonyms: SubstitutionTable::from_static(SYNONYMS),
            phrases,
            openers: SubstitutionTable::from_static(SENTENCE_OPENERS),
            contractions: compile_rules(CONTRACTIONS, word_pattern),
            marker_words: compile_rules(MARKER_WORDS, word_pattern),
            marker_phrases: compile_rules(MARKER_PHRASES, phrase_pattern),
        }
    }

    /// `(marker, plain replacement)` pairs from the marker word table.
    pub fn avoid_list(&self) -> impl Iterator<Item = (&'static str, &'static str)> + '_ {
        self.marker_words
            .iter()
            .map(|r| (r.source, r.replacement))
    }

    /// Marker phrases that are deleted outright.
    pub fn phrases_to_remove(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.marker_phrases
            .iter()
            .filter(|r| r.replacement.is_empty())
            .map(|r| r.source)
    }
}

fn compile_rules(rows: &[(&'static str, &'static str)], build: fn(&str) -> Regex) -> Vec<ReplacementRule> {
    rows.iter()
        .map(|&(source, replacement)| ReplacementRule {
            source,
            pattern: build(source),
            replacement,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tables_are_populated() {
        let lex = Lexicon::new();
        assert_eq!(lex.synonyms.len(), SYNONYMS.len());
        assert_eq!(lex.phrases.len(), PHRASE_PARAPHRASES.len());
        assert_eq!(lex.openers.len(), 6);
        assert_eq!(lex.contractions.len(), 30);
        assert!(lex.synonyms.entries().iter().all(|e| !e.alternatives.is_empty()));
    }

    #[test]
    fn test_lookup_is_case_insensitive() {
        let lex = Lexicon::new();
        assert_eq!(lex.synonyms.get("Robust").map(|a| a[0]), Some("strong"));
        assert!(lex.synonyms.get("banana").is_none());
    }

    #[test]
    fn test_empty_rows_are_skipped() {
        const ROWS: &[(&str, &[&str])] = &[("a", &[]), ("b", &["c"])];
        let table = SubstitutionTable::from_static(ROWS);
        assert_eq!(table.len(), 1);
        assert!(table.get("a").is_none());
    }

    #[test]
    fn test_phrase_pattern_respects_word_boundaries() {
        let re = phrase_pattern("prior to");
        assert!(re.is_match("Prior to launch"));
        assert!(!re.is_match("a prior tour"));
        let re = phrase_pattern("it's worth noting");
        assert!(re.is_match("It's worth noting, though"));
    }

    #[test]
    fn test_longer_phrases_come_before_their_sub_phrases() {
        for (i, &(later, _)) in PHRASE_PARAPHRASES.iter().enumerate() {
            for &(earlier, _) in &PHRASE_PARAPHRASES[..i] {
                assert!(
                    !later.contains(earlier),
                    "\"{}\" is shadowed by the earlier \"{}\"",
                    later,
                    earlier
                );
            }
        }
    }

    #[test]
    fn test_phrases_to_remove() {
        let lex = Lexicon::new();
        let removed: Vec<_> = lex.phrases_to_remove().collect();
        assert!(removed.contains(&"in essence"));
        assert!(!removed.contains(&"what's more"));
    }
}
