//! Lexical data tables.
//!
//! The tables ship as `data/lexicon.toml`, embedded at compile time. A
//! [`Lexicon`] is the compiled, read-only form: single words are stemmed and
//! phrases normalised once at load, so analyzers only do set lookups and
//! padded substring counts.

use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use std::fmt;
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ScoringError;
use crate::lexical::{count_phrases, stem};
use crate::text::normalize;

const BUILTIN_LEXICON: &str = include_str!("../data/lexicon.toml");

/// Subject-matter domain detected for a question.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Domain {
    Programming,
    Biology,
    Chemistry,
    Business,
    Technology,
    GeneralAcademic,
}

impl Domain {
    pub const ALL: [Domain; 6] = [
        Domain::Programming,
        Domain::Biology,
        Domain::Chemistry,
        Domain::Business,
        Domain::Technology,
        Domain::GeneralAcademic,
    ];

    pub fn key(&self) -> &'static str {
        match self {
            Domain::Programming => "programming",
            Domain::Biology => "biology",
            Domain::Chemistry => "chemistry",
            Domain::Business => "business",
            Domain::Technology => "technology",
            Domain::GeneralAcademic => "general_academic",
        }
    }
}

impl fmt::Display for Domain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for Domain {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Domain::ALL
            .into_iter()
            .find(|d| d.key() == s)
            .ok_or_else(|| format!("unknown domain: {s}"))
    }
}

/// Families of marker phrases counted by the analyzers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MarkerKind {
    Causal,
    Transition,
    Evidence,
    Counter,
    Evaluation,
    Synthesis,
    Metacognitive,
    Innovation,
    Academic,
    Example,
    Definition,
    Relationship,
    Logic,
    Modern,
    Methodology,
    Theory,
    Filler,
    Importance,
    Subordinate,
}

impl MarkerKind {
    pub const ALL: [MarkerKind; 19] = [
        MarkerKind::Causal,
        MarkerKind::Transition,
        MarkerKind::Evidence,
        MarkerKind::Counter,
        MarkerKind::Evaluation,
        MarkerKind::Synthesis,
        MarkerKind::Metacognitive,
        MarkerKind::Innovation,
        MarkerKind::Academic,
        MarkerKind::Example,
        MarkerKind::Definition,
        MarkerKind::Relationship,
        MarkerKind::Logic,
        MarkerKind::Modern,
        MarkerKind::Methodology,
        MarkerKind::Theory,
        MarkerKind::Filler,
        MarkerKind::Importance,
        MarkerKind::Subordinate,
    ];

    pub fn key(&self) -> &'static str {
        match self {
            MarkerKind::Causal => "causal",
            MarkerKind::Transition => "transition",
            MarkerKind::Evidence => "evidence",
            MarkerKind::Counter => "counter",
            MarkerKind::Evaluation => "evaluation",
            MarkerKind::Synthesis => "synthesis",
            MarkerKind::Metacognitive => "metacognitive",
            MarkerKind::Innovation => "innovation",
            MarkerKind::Academic => "academic",
            MarkerKind::Example => "example",
            MarkerKind::Definition => "definition",
            MarkerKind::Relationship => "relationship",
            MarkerKind::Logic => "logic",
            MarkerKind::Modern => "modern",
            MarkerKind::Methodology => "methodology",
            MarkerKind::Theory => "theory",
            MarkerKind::Filler => "filler",
            MarkerKind::Importance => "importance",
            MarkerKind::Subordinate => "subordinate",
        }
    }
}

impl FromStr for MarkerKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        MarkerKind::ALL
            .into_iter()
            .find(|k| k.key() == s)
            .ok_or_else(|| format!("unknown marker family: {s}"))
    }
}

/// Bloom's taxonomy level signalled by a verb.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BloomLevel {
    Remember = 1,
    Understand = 2,
    Apply = 3,
    Analyze = 4,
    Evaluate = 5,
    Create = 6,
}

impl BloomLevel {
    pub const ALL: [BloomLevel; 6] = [
        BloomLevel::Remember,
        BloomLevel::Understand,
        BloomLevel::Apply,
        BloomLevel::Analyze,
        BloomLevel::Evaluate,
        BloomLevel::Create,
    ];

    pub fn level(&self) -> u8 {
        *self as u8
    }

    pub fn key(&self) -> &'static str {
        match self {
            BloomLevel::Remember => "remember",
            BloomLevel::Understand => "understand",
            BloomLevel::Apply => "apply",
            BloomLevel::Analyze => "analyze",
            BloomLevel::Evaluate => "evaluate",
            BloomLevel::Create => "create",
        }
    }
}

impl FromStr for BloomLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        BloomLevel::ALL
            .into_iter()
            .find(|l| l.key() == s)
            .ok_or_else(|| format!("unknown bloom level: {s}"))
    }
}

#[derive(Debug, Deserialize)]
struct LexiconFile {
    version: u32,
    #[serde(default)]
    keyboard_rows: Vec<String>,
    stopwords: Vec<String>,
    #[serde(default)]
    common_words: Vec<String>,
    #[serde(default)]
    technical_terms: Vec<String>,
    #[serde(default)]
    synonyms: Vec<Vec<String>>,
    #[serde(default)]
    domains: BTreeMap<String, DomainFile>,
    #[serde(default)]
    markers: BTreeMap<String, Vec<String>>,
    #[serde(default)]
    bloom: BTreeMap<String, Vec<String>>,
    #[serde(default)]
    unrelated: BTreeMap<String, Vec<String>>,
    #[serde(default)]
    refusals: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct DomainFile {
    terms: Vec<String>,
}

/// Compiled lexical tables. Read-only after construction.
#[derive(Debug, Clone)]
pub struct Lexicon {
    pub version: u32,
    stopwords: HashSet<String>,
    common_words: HashSet<String>,
    technical: BTreeSet<String>,
    domains: BTreeMap<Domain, BTreeSet<String>>,
    synonym_groups: Vec<BTreeSet<String>>,
    synonym_index: HashMap<String, Vec<usize>>,
    markers: BTreeMap<MarkerKind, Vec<String>>,
    bloom: BTreeMap<BloomLevel, BTreeSet<String>>,
    unrelated: BTreeMap<String, BTreeSet<String>>,
    refusals: Vec<String>,
    keyboard_rows: Vec<String>,
}

impl Lexicon {
    /// The lexicon embedded in the crate.
    pub fn builtin() -> Result<Self, ScoringError> {
        Self::from_toml_str(BUILTIN_LEXICON)
    }

    pub fn from_path(path: &Path) -> Result<Self, ScoringError> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            ScoringError::InvalidConfiguration(format!(
                "failed to read lexicon {}: {e}",
                path.display()
            ))
        })?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self, ScoringError> {
        let file: LexiconFile = toml::from_str(content)
            .map_err(|e| ScoringError::InvalidConfiguration(format!("invalid lexicon: {e}")))?;

        if file.stopwords.is_empty() {
            return Err(ScoringError::InvalidConfiguration(
                "lexicon has no stop words".into(),
            ));
        }
        if let Some(row) = file.keyboard_rows.iter().find(|r| r.chars().count() < 4) {
            return Err(ScoringError::InvalidConfiguration(format!(
                "keyboard row '{row}' is shorter than four characters"
            )));
        }

        let stem_all = |words: &[String]| -> BTreeSet<String> {
            words
                .iter()
                .map(|w| normalize(w))
                .filter(|w| !w.is_empty())
                .map(|w| stem(&w))
                .collect()
        };
        let phrases = |words: &[String]| -> Vec<String> {
            let mut out: Vec<String> = words
                .iter()
                .map(|w| normalize(w))
                .filter(|w| !w.is_empty())
                .collect();
            out.sort();
            out.dedup();
            out
        };

        let synonym_groups: Vec<BTreeSet<String>> = file
            .synonyms
            .iter()
            .map(|group| stem_all(group))
            .filter(|group| group.len() > 1)
            .collect();
        let mut synonym_index: HashMap<String, Vec<usize>> = HashMap::new();
        for (idx, group) in synonym_groups.iter().enumerate() {
            for member in group {
                synonym_index.entry(member.clone()).or_default().push(idx);
            }
        }

        let invalid = |e: String| ScoringError::InvalidConfiguration(format!("invalid lexicon: {e}"));
        let mut domains = BTreeMap::new();
        for (key, entry) in &file.domains {
            domains.insert(key.parse::<Domain>().map_err(invalid)?, stem_all(&entry.terms));
        }
        let mut markers = BTreeMap::new();
        for (key, list) in &file.markers {
            markers.insert(key.parse::<MarkerKind>().map_err(invalid)?, phrases(list));
        }
        let mut bloom = BTreeMap::new();
        for (key, verbs) in &file.bloom {
            bloom.insert(key.parse::<BloomLevel>().map_err(invalid)?, stem_all(verbs));
        }

        Ok(Self {
            version: file.version,
            stopwords: file.stopwords.iter().map(|w| normalize(w)).collect(),
            common_words: file.common_words.iter().map(|w| normalize(w)).collect(),
            technical: stem_all(&file.technical_terms),
            domains,
            synonym_groups,
            synonym_index,
            markers,
            bloom,
            unrelated: file
                .unrelated
                .iter()
                .map(|(topic, words)| (topic.clone(), stem_all(words)))
                .collect(),
            refusals: phrases(&file.refusals),
            keyboard_rows: file.keyboard_rows.iter().map(|r| r.to_lowercase()).collect(),
        })
    }

    pub fn is_stopword(&self, word: &str) -> bool {
        self.stopwords.contains(word)
    }

    pub fn is_common(&self, word: &str) -> bool {
        self.common_words.contains(word) || self.stopwords.contains(word)
    }

    pub fn is_technical(&self, stem: &str) -> bool {
        self.technical.contains(stem)
    }

    /// Domain-dictionary membership across every domain.
    pub fn is_domain_term(&self, stem: &str) -> bool {
        self.domains.values().any(|terms| terms.contains(stem))
    }

    pub fn domain_terms(&self, domain: Domain) -> Option<&BTreeSet<String>> {
        self.domains.get(&domain)
    }

    /// Domains whose dictionary contains `stem`, in declaration order.
    pub fn domains_of<'a>(&'a self, stem: &'a str) -> impl Iterator<Item = Domain> + 'a {
        self.domains
            .iter()
            .filter(move |(_, terms)| terms.contains(stem))
            .map(|(domain, _)| *domain)
    }

    /// `true` if both stems belong to a common synonym group.
    pub fn are_synonyms(&self, a: &str, b: &str) -> bool {
        match (self.synonym_index.get(a), self.synonym_index.get(b)) {
            (Some(ga), Some(gb)) => ga.iter().any(|g| gb.contains(g)),
            _ => false,
        }
    }

    /// Every stem sharing a synonym group with `stem`, excluding itself.
    pub fn synonyms_of(&self, stem: &str) -> BTreeSet<&str> {
        self.synonym_index
            .get(stem)
            .into_iter()
            .flatten()
            .flat_map(|idx| self.synonym_groups[*idx].iter())
            .map(String::as_str)
            .filter(|s| *s != stem)
            .collect()
    }

    pub fn markers(&self, kind: MarkerKind) -> &[String] {
        self.markers.get(&kind).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Occurrences of `kind` markers in padded normalised text.
    pub fn count_markers(&self, padded: &str, kind: MarkerKind) -> usize {
        count_phrases(padded, self.markers(kind))
    }

    /// The Bloom level a stem signals, if it is a listed verb.
    pub fn bloom_level(&self, stem: &str) -> Option<BloomLevel> {
        self.bloom
            .iter()
            .rev()
            .find(|(_, verbs)| verbs.contains(stem))
            .map(|(level, _)| *level)
    }

    pub fn unrelated_topics(&self) -> impl Iterator<Item = (&str, &BTreeSet<String>)> {
        self.unrelated.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn count_refusals(&self, padded: &str) -> usize {
        count_phrases(padded, &self.refusals)
    }

    /// `true` if `word` contains `min_len` consecutive keys of a keyboard row,
    /// in either direction.
    pub fn has_keyboard_sequence(&self, word: &str, min_len: usize) -> bool {
        if word.len() < min_len {
            return false;
        }
        self.keyboard_rows.iter().any(|row| {
            let forward: Vec<char> = row.chars().collect();
            let backward: String = row.chars().rev().collect();
            let backward: Vec<char> = backward.chars().collect();
            [forward, backward].iter().any(|keys| {
                keys.windows(min_len).any(|window| {
                    let needle: String = window.iter().collect();
                    word.contains(&needle)
                })
            })
        })
    }
}
