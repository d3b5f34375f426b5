//! Weighted concept extraction and the student-to-reference matching cascade.

use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;

use crate::config::AnalysisConfig;
use crate::lexical::similarity;
use crate::lexicon::{Lexicon, MarkerKind};
use crate::text::TextProfile;

/// A weighted unit of meaning extracted from a text.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConceptTerm {
    /// Stem the concept is keyed on.
    pub term: String,
    pub weight: f64,
    /// Surface forms seen in the text.
    pub surface: BTreeSet<String>,
    /// Synonym stems accepted as a match.
    pub variants: BTreeSet<String>,
    pub technical: bool,
    pub domain: bool,
}

/// How a reference concept was found in the student answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchKind {
    Exact,
    Stem,
    Synonym,
    Fuzzy,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TermMatch {
    pub kind: MatchKind,
    /// Credit factor for the match kind.
    pub factor: f64,
    /// Student stem that satisfied the match.
    pub matched: String,
}

/// Reference concepts paired with their best student match.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ConceptMatch {
    /// Reference concepts, heaviest first.
    pub concepts: Vec<ConceptTerm>,
    /// Best match per concept, aligned with `concepts`.
    pub matches: Vec<Option<TermMatch>>,
    /// Weighted coverage of the top reference concepts, in `[0, 1]`.
    pub coverage: f64,
}

impl ConceptMatch {
    pub fn matched_count(&self) -> usize {
        self.matches.iter().filter(|m| m.is_some()).count()
    }

    pub fn total(&self) -> usize {
        self.concepts.len()
    }

    /// Reference stems credited with any match.
    pub fn matched_terms(&self) -> BTreeSet<&str> {
        self.concepts
            .iter()
            .zip(&self.matches)
            .filter(|(_, m)| m.is_some())
            .map(|(c, _)| c.term.as_str())
            .collect()
    }

    /// Credit earned by the reference concept keyed on `term`, or 0.
    pub fn credit(&self, term: &str) -> f64 {
        self.concepts
            .iter()
            .zip(&self.matches)
            .find(|(c, _)| c.term == term)
            .and_then(|(_, m)| m.as_ref())
            .map_or(0.0, |m| m.factor)
    }

    /// Number of matched concepts that are technical or domain terms.
    pub fn matched_specialist_count(&self) -> usize {
        self.concepts
            .iter()
            .zip(&self.matches)
            .filter(|(c, m)| m.is_some() && (c.technical || c.domain))
            .count()
    }

    /// Number of reference concepts that are technical or domain terms.
    pub fn specialist_count(&self) -> usize {
        self.concepts
            .iter()
            .filter(|c| c.technical || c.domain)
            .count()
    }
}

pub struct ConceptExtractor<'a> {
    lexicon: &'a Lexicon,
    config: &'a AnalysisConfig,
}

impl<'a> ConceptExtractor<'a> {
    pub fn new(lexicon: &'a Lexicon, config: &'a AnalysisConfig) -> Self {
        Self { lexicon, config }
    }

    /// Extract weighted concepts, heaviest first, ties broken by stem.
    ///
    /// Weight is `(1 + ln f)` scaled by sentence position (earlier is heavier),
    /// technical or domain membership, and co-occurrence with importance cues.
    pub fn extract(&self, profile: &TextProfile) -> Vec<ConceptTerm> {
        let sentence_count = profile.sentence_count().max(1);

        let cue_sentences: BTreeSet<usize> = profile
            .sentences
            .iter()
            .enumerate()
            .filter(|(_, s)| {
                let padded = format!(" {} ", s.normalized);
                self.lexicon.count_markers(&padded, MarkerKind::Importance) > 0
            })
            .map(|(i, _)| i)
            .collect();

        let mut first_sentence: BTreeMap<&str, usize> = BTreeMap::new();
        let mut cued: BTreeSet<&str> = BTreeSet::new();
        for (idx, sentence) in profile.sentences.iter().enumerate() {
            for stem in &sentence.stems {
                first_sentence.entry(stem.as_str()).or_insert(idx);
                if cue_sentences.contains(&idx) {
                    cued.insert(stem.as_str());
                }
            }
        }

        let mut surface: BTreeMap<&str, BTreeSet<String>> = BTreeMap::new();
        for (token, stem) in profile.content_tokens.iter().zip(&profile.stems) {
            surface.entry(stem.as_str()).or_default().insert(token.clone());
        }

        let mut concepts: Vec<ConceptTerm> = profile
            .stem_frequencies()
            .into_iter()
            .map(|(stem, freq)| {
                let position = first_sentence.get(stem).copied().unwrap_or(0);
                let position_boost =
                    1.0 + 0.5 * (1.0 - position as f64 / sentence_count as f64);
                let technical = self.lexicon.is_technical(stem);
                let domain = self.lexicon.is_domain_term(stem);
                let class_boost = if technical {
                    self.config.technical_boost
                } else if domain {
                    self.config.domain_boost
                } else {
                    1.0
                };
                let context_boost = if cued.contains(stem) {
                    self.config.context_boost
                } else {
                    1.0
                };

                ConceptTerm {
                    term: stem.to_string(),
                    weight: (1.0 + (freq as f64).ln()) * position_boost * class_boost * context_boost,
                    surface: surface.remove(stem).unwrap_or_default(),
                    variants: self
                        .lexicon
                        .synonyms_of(stem)
                        .into_iter()
                        .map(str::to_string)
                        .collect(),
                    technical,
                    domain,
                }
            })
            .collect();

        concepts.sort_by(|a, b| {
            b.weight
                .total_cmp(&a.weight)
                .then_with(|| a.term.cmp(&b.term))
        });
        concepts
    }

    /// Match every reference concept against the student answer.
    pub fn match_concepts(&self, concepts: Vec<ConceptTerm>, student: &TextProfile) -> ConceptMatch {
        let words: BTreeSet<&str> = student.content_tokens.iter().map(String::as_str).collect();
        let stems = student.stem_set();

        let matches: Vec<Option<TermMatch>> = concepts
            .iter()
            .map(|concept| self.best_match(concept, &words, &stems))
            .collect();

        let top = self.config.max_reference_concepts.min(concepts.len());
        let total_weight: f64 = concepts[..top].iter().map(|c| c.weight).sum();
        let earned: f64 = concepts[..top]
            .iter()
            .zip(&matches)
            .map(|(c, m)| c.weight * m.as_ref().map_or(0.0, |m| m.factor))
            .sum();
        let coverage = if total_weight > 0.0 {
            (earned / total_weight).clamp(0.0, 1.0)
        } else {
            0.0
        };

        ConceptMatch {
            concepts,
            matches,
            coverage,
        }
    }

    fn best_match(
        &self,
        concept: &ConceptTerm,
        words: &BTreeSet<&str>,
        stems: &BTreeSet<&str>,
    ) -> Option<TermMatch> {
        let config = self.config;
        if concept.surface.iter().any(|s| words.contains(s.as_str())) {
            return found(MatchKind::Exact, config.exact_factor, &concept.term);
        }
        if stems.contains(concept.term.as_str()) {
            return found(MatchKind::Stem, config.stem_factor, &concept.term);
        }
        if let Some(variant) = stems.iter().find(|s| is_affix_variant(&concept.term, s)) {
            return found(MatchKind::Stem, config.stem_factor, variant);
        }
        if let Some(synonym) = concept
            .variants
            .iter()
            .find(|v| stems.contains(v.as_str()))
        {
            return found(MatchKind::Synonym, config.synonym_factor, synonym);
        }

        let term_len = concept.term.chars().count();
        if term_len < 5 {
            return None;
        }
        stems
            .iter()
            .filter(|s| {
                let len = s.chars().count();
                len >= 5 && len.abs_diff(term_len) <= 3
            })
            .map(|s| (s, similarity(&concept.term, s)))
            .filter(|(_, sim)| *sim > config.fuzzy_threshold)
            .max_by(|a, b| a.1.total_cmp(&b.1).then_with(|| b.0.cmp(a.0)))
            .and_then(|(s, _)| found(MatchKind::Fuzzy, config.fuzzy_factor, s))
    }
}

fn found(kind: MatchKind, factor: f64, matched: &str) -> Option<TermMatch> {
    Some(TermMatch {
        kind,
        factor,
        matched: matched.to_string(),
    })
}

/// One stem extends the other by a short suffix (`encapsul` / `encapsulat`).
fn is_affix_variant(a: &str, b: &str) -> bool {
    let (short, long) = if a.len() <= b.len() { (a, b) } else { (b, a) };
    short.len() >= 5 && long.len() - short.len() <= 3 && long.starts_with(short)
}
