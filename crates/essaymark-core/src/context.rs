//! Per-request analysis shared read-only by every layer.
//!
//! Everything expensive (tokenising, concept extraction and matching,
//! similarity, domain detection, marker counts) happens once in
//! [`ScoringContext::build`]; layers only combine the results.

use std::collections::{BTreeMap, BTreeSet};

use crate::concepts::{ConceptExtractor, ConceptMatch};
use crate::config::ScoringConfig;
use crate::lexicon::{Domain, Lexicon, MarkerKind};
use crate::model::{QuestionMetadata, QuestionType};
use crate::similarity::SimilarityReport;
use crate::text::{truncate_chars, TextProfile};

/// Minimum word length for "advanced" vocabulary.
const ADVANCED_WORD_LEN: usize = 9;

/// Suffixes marking abstract nouns.
const ABSTRACT_SUFFIXES: [&str; 7] = ["ism", "ity", "tion", "ness", "ance", "ence", "ment"];

pub struct ScoringContext<'a> {
    pub lexicon: &'a Lexicon,
    pub config: &'a ScoringConfig,
    pub student: TextProfile,
    pub reference: TextProfile,
    pub concepts: ConceptMatch,
    pub similarity: SimilarityReport,
    pub domain: Domain,
    pub question_type: Option<QuestionType>,
    /// `coverage ^ coverage_exponent`; gates marker credit on actual relevance.
    pub grounding: f64,
    student_markers: BTreeMap<MarkerKind, usize>,
    reference_markers: BTreeMap<MarkerKind, usize>,
}

impl<'a> ScoringContext<'a> {
    pub fn build(
        student: &str,
        reference: &str,
        metadata: Option<&QuestionMetadata>,
        lexicon: &'a Lexicon,
        config: &'a ScoringConfig,
    ) -> Self {
        let cap = config.analysis.max_chars;
        let student = TextProfile::new(truncate_chars(student, cap), lexicon);
        let reference = TextProfile::new(truncate_chars(reference, cap), lexicon);

        let extractor = ConceptExtractor::new(lexicon, &config.analysis);
        let concepts = extractor.match_concepts(extractor.extract(&reference), &student);
        let similarity = SimilarityReport::compute(&student, &reference);

        let question = metadata
            .and_then(|m| m.text.as_deref())
            .map(|text| TextProfile::new(truncate_chars(text, cap), lexicon));
        // Student text is excluded so an answer cannot pick its own domain.
        let domain = detect_domain(lexicon, &[Some(&reference), question.as_ref()]);

        let count_all = |profile: &TextProfile| -> BTreeMap<MarkerKind, usize> {
            MarkerKind::ALL
                .iter()
                .map(|kind| (*kind, lexicon.count_markers(&profile.padded, *kind)))
                .collect()
        };
        let student_markers = count_all(&student);
        let reference_markers = count_all(&reference);

        let grounding = concepts.coverage.powf(config.analysis.coverage_exponent);

        Self {
            lexicon,
            config,
            concepts,
            similarity,
            domain,
            question_type: metadata.and_then(|m| m.question_type),
            grounding: if grounding.is_finite() { grounding } else { 0.0 },
            student_markers,
            reference_markers,
            student,
            reference,
        }
    }

    pub fn coverage(&self) -> f64 {
        self.concepts.coverage
    }

    /// `(student, reference)` occurrence counts for a marker family.
    pub fn markers(&self, kind: MarkerKind) -> (usize, usize) {
        (
            self.student_markers.get(&kind).copied().unwrap_or(0),
            self.reference_markers.get(&kind).copied().unwrap_or(0),
        )
    }

    /// Student marker usage relative to the reference, in `[0, 1]`.
    pub fn relative(&self, kind: MarkerKind) -> f64 {
        let (s, r) = self.markers(kind);
        relative_count(s, r)
    }

    /// [`relative`](Self::relative) scaled by grounding, so markers in
    /// off-topic text earn nothing.
    pub fn grounded(&self, kind: MarkerKind) -> f64 {
        self.grounding * self.relative(kind)
    }

    /// Grounded ratio over the sum of several marker families.
    pub fn grounded_sum(&self, kinds: &[MarkerKind]) -> f64 {
        let (s, r) = kinds.iter().fold((0, 0), |(s, r), kind| {
            let (ks, kr) = self.markers(*kind);
            (s + ks, r + kr)
        });
        self.grounding * relative_count(s, r)
    }

    pub fn advanced_word_count(&self, profile: &TextProfile) -> usize {
        profile
            .content_tokens
            .iter()
            .filter(|w| w.chars().count() >= ADVANCED_WORD_LEN && !self.lexicon.is_common(w))
            .count()
    }

    /// Advanced vocabulary plus academic markers, student relative to reference.
    pub fn sophistication(&self) -> f64 {
        let (sa, ra) = self.markers(MarkerKind::Academic);
        let s = self.advanced_word_count(&self.student) + sa;
        let r = self.advanced_word_count(&self.reference) + ra;
        self.grounding * relative_count(s, r)
    }

    /// Grounded advanced-vocabulary ratio.
    pub fn advanced_vocabulary(&self) -> f64 {
        let s = self.advanced_word_count(&self.student);
        let r = self.advanced_word_count(&self.reference);
        self.grounding * relative_count(s, r)
    }

    pub fn abstract_noun_count(&self, profile: &TextProfile) -> usize {
        profile
            .content_tokens
            .iter()
            .filter(|w| {
                w.chars().count() > 5 && ABSTRACT_SUFFIXES.iter().any(|suffix| w.ends_with(suffix))
            })
            .count()
    }

    pub fn abstraction(&self) -> f64 {
        let s = self.abstract_noun_count(&self.student);
        let r = self.abstract_noun_count(&self.reference);
        self.grounding * relative_count(s, r)
    }

    /// Distinct technical stems used by the student relative to the reference.
    pub fn technical_precision(&self) -> f64 {
        let count = |profile: &TextProfile| {
            profile
                .stem_set()
                .into_iter()
                .filter(|s| self.lexicon.is_technical(s))
                .count()
        };
        let s = count(&self.student);
        let r = count(&self.reference);
        if r == 0 {
            return if s > 0 { 1.0 } else { 0.0 };
        }
        (s as f64 / r as f64).min(1.0)
    }

    /// Share of the reference's technical and domain concepts the student matched.
    pub fn factual_presence(&self) -> f64 {
        let total = self.concepts.specialist_count();
        if total == 0 {
            return self.coverage();
        }
        self.concepts.matched_specialist_count() as f64 / total as f64
    }

    /// Student stems belonging only to domains other than the detected one and
    /// absent from the reference.
    pub fn wrong_domain_terms(&self) -> usize {
        if self.domain == Domain::GeneralAcademic {
            return 0;
        }
        let reference = self.reference.stem_set();
        self.student
            .stem_set()
            .into_iter()
            .filter(|stem| !reference.contains(stem))
            .filter(|stem| {
                let domains: Vec<Domain> = self.lexicon.domains_of(stem).collect();
                !domains.is_empty()
                    && !domains.contains(&self.domain)
                    && !domains.contains(&Domain::GeneralAcademic)
            })
            .count()
    }

    /// Match-count based credit on a graduated ladder, in `[0, 1]`.
    ///
    /// Takes the better of an absolute ladder on matched concepts and a ratio
    /// ladder on matched over total reference concepts.
    pub fn graduated(&self) -> f64 {
        let matched = self.concepts.matched_count();
        let by_count = match matched {
            12.. => 1.0,
            8..=11 => 0.8,
            5..=7 => 0.6,
            3..=4 => 0.4,
            1..=2 => 0.2,
            0 => 0.0,
        };
        let total = self.concepts.total();
        let share = if total == 0 { 0.0 } else { matched as f64 / total as f64 };
        let by_ratio = if share >= 0.8 {
            1.0
        } else if share >= 0.6 {
            0.8
        } else if share >= 0.4 {
            0.6
        } else if share >= 0.2 {
            0.4
        } else if share > 0.0 {
            0.2
        } else {
            0.0
        };
        f64::max(by_count, by_ratio)
    }

    /// Reference sentences whose content is substantially present in the
    /// student answer, as a share of all reference sentences.
    pub fn breadth(&self) -> f64 {
        let student = self.student.stem_set();
        let matched = self.concepts.matched_terms();
        let sentences: Vec<BTreeSet<&str>> = self
            .reference
            .sentences
            .iter()
            .map(|s| s.stems.iter().map(String::as_str).collect::<BTreeSet<_>>())
            .filter(|stems| !stems.is_empty())
            .collect();
        if sentences.is_empty() {
            return 0.0;
        }
        let covered = sentences
            .iter()
            .filter(|stems| {
                let hits = stems
                    .iter()
                    .filter(|s| student.contains(**s) || matched.contains(**s))
                    .count();
                let needed = ((stems.len() as f64) * 0.25).ceil().max(1.0) as usize;
                hits >= needed
            })
            .count();
        covered as f64 / sentences.len() as f64
    }

    /// Highest Bloom level signalled by any verb in the text, 0 if none.
    pub fn bloom_level(&self, profile: &TextProfile) -> u8 {
        profile
            .stems
            .iter()
            .filter_map(|s| self.lexicon.bloom_level(s))
            .map(|l| l.level())
            .max()
            .unwrap_or(0)
    }

    /// Sentence-to-sentence coherence of `profile`, in `[0, 1]`.
    ///
    /// Each consecutive pair earns half for a transition marker and half for
    /// concept continuity (a shared stem, or reference concepts on both sides).
    pub fn coherence(&self, profile: &TextProfile) -> f64 {
        let reference = self.reference.stem_set();
        match profile.sentences.len() {
            0 => 0.0,
            1 => 0.5,
            n => {
                let total: f64 = profile
                    .sentences
                    .windows(2)
                    .map(|pair| {
                        let padded = format!(" {} ", pair[1].normalized);
                        let transition =
                            if self.lexicon.count_markers(&padded, MarkerKind::Transition) > 0 {
                                0.5
                            } else {
                                0.0
                            };
                        let prev: BTreeSet<&str> =
                            pair[0].stems.iter().map(String::as_str).collect();
                        let shares = pair[1].stems.iter().any(|s| prev.contains(s.as_str()));
                        let on_topic = |stems: &[String]| {
                            stems.iter().any(|s| reference.contains(s.as_str()))
                        };
                        let continuity = if shares {
                            0.5
                        } else if on_topic(&pair[0].stems) && on_topic(&pair[1].stems) {
                            0.25
                        } else {
                            0.0
                        };
                        transition + continuity
                    })
                    .sum();
                total / (n - 1) as f64
            }
        }
    }

    /// Subordinating markers per sentence.
    pub fn subordination(&self, profile: &TextProfile) -> f64 {
        if profile.sentences.is_empty() {
            return 0.0;
        }
        let count = self
            .lexicon
            .count_markers(&profile.padded, MarkerKind::Subordinate);
        count as f64 / profile.sentences.len() as f64
    }
}

/// `min(1, (s + 1) / (r + 1))`: full credit once the student matches the
/// reference, partial credit below it.
pub fn relative_count(student: usize, reference: usize) -> f64 {
    ((student as f64 + 1.0) / (reference as f64 + 1.0)).min(1.0)
}

/// Continuous counterpart of [`relative_count`].
pub fn relative_value(student: f64, reference: f64) -> f64 {
    let student = student.max(0.0);
    let reference = reference.max(0.0);
    ((student + 0.1) / (reference + 0.1)).min(1.0)
}

/// Detect the question domain from stem hits across the given texts.
///
/// The domain with the most dictionary hits wins, provided it has at least two;
/// otherwise the question is treated as general academic.
pub fn detect_domain(lexicon: &Lexicon, profiles: &[Option<&TextProfile>]) -> Domain {
    let mut hits: BTreeMap<Domain, usize> = BTreeMap::new();
    for profile in profiles.iter().flatten() {
        for stem in &profile.stems {
            for domain in lexicon.domains_of(stem) {
                if domain != Domain::GeneralAcademic {
                    *hits.entry(domain).or_insert(0) += 1;
                }
            }
        }
    }

    let mut best = (Domain::GeneralAcademic, 1);
    for (domain, count) in hits {
        if count > best.1 {
            best = (domain, count);
        }
    }
    best.0
}

#[cfg(test)]
mod tests {
    use super::*;

    const REFERENCE: &str = "Encapsulation bundles data with the methods that operate on it. \
        Inheritance allows a class to derive methods from a parent class. \
        Polymorphism allows objects of different classes to share an interface.";

    fn context<'a>(
        student: &str,
        lexicon: &'a Lexicon,
        config: &'a ScoringConfig,
    ) -> ScoringContext<'a> {
        ScoringContext::build(student, REFERENCE, None, lexicon, config)
    }

    #[test]
    fn relative_helpers() {
        assert_eq!(relative_count(0, 0), 1.0);
        assert_eq!(relative_count(0, 3), 0.25);
        assert_eq!(relative_count(5, 1), 1.0);
        assert!((relative_value(0.0, 0.4) - 0.2).abs() < 1e-9);
        assert_eq!(relative_value(0.6, 0.4), 1.0);
    }

    #[test]
    fn detects_programming_domain() {
        let lexicon = Lexicon::builtin().unwrap();
        let config = ScoringConfig::default();
        let ctx = context("Objects and classes.", &lexicon, &config);
        assert_eq!(ctx.domain, Domain::Programming);

        let unrelated = TextProfile::new("The weather was nice.", &lexicon);
        assert_eq!(detect_domain(&lexicon, &[Some(&unrelated)]), Domain::GeneralAcademic);
    }

    #[test]
    fn grounding_tracks_coverage() {
        let lexicon = Lexicon::builtin().unwrap();
        let config = ScoringConfig::default();
        let full = context(REFERENCE, &lexicon, &config);
        assert!((full.grounding - 1.0).abs() < 1e-9);
        assert_eq!(full.breadth(), 1.0);
        assert_eq!(full.graduated(), 1.0);

        let none = context("apple, car, tree, house, river", &lexicon, &config);
        assert_eq!(none.grounding, 0.0);
        assert_eq!(none.breadth(), 0.0);
        assert_eq!(none.graduated(), 0.0);
        assert_eq!(none.grounded(MarkerKind::Causal), 0.0);
    }

    #[test]
    fn wrong_domain_terms_are_counted() {
        let lexicon = Lexicon::builtin().unwrap();
        let config = ScoringConfig::default();
        let ctx = context(
            "Encapsulation hides data, like chlorophyll in a chloroplast.",
            &lexicon,
            &config,
        );
        assert_eq!(ctx.domain, Domain::Programming);
        assert_eq!(ctx.wrong_domain_terms(), 2);
    }

    #[test]
    fn student_jargon_cannot_move_the_domain() {
        use crate::layers::{ContentAccuracy, LayerScorer};

        let lexicon = Lexicon::builtin().unwrap();
        let config = ScoringConfig::default();
        let few = format!("{REFERENCE} Chlorophyll and mitochondria.");
        let many = format!(
            "{REFERENCE} Chlorophyll, mitochondria, chloroplast, glucose, enzyme, protein, \
             membrane, nucleus, tissue, organism, respiration and photosynthesis."
        );
        let score = |student: &str| {
            let ctx = context(student, &lexicon, &config);
            assert_eq!(ctx.domain, Domain::Programming);
            let content = ContentAccuracy.score(&ctx, 2.0).unwrap().score;
            (ctx.wrong_domain_terms(), content)
        };

        let (_, clean) = score(REFERENCE);
        let (few_wrong, few_score) = score(&few);
        let (many_wrong, many_score) = score(&many);
        assert!(many_wrong > few_wrong, "few={few_wrong} many={many_wrong}");
        assert!(few_score < clean, "clean={clean} few={few_score}");
        assert!(many_score <= few_score, "few={few_score} many={many_score}");
    }

    #[test]
    fn coherence_rewards_linked_sentences() {
        let lexicon = Lexicon::builtin().unwrap();
        let config = ScoringConfig::default();
        let ctx = context("x", &lexicon, &config);
        let linked = TextProfile::new(
            "Classes define objects. Furthermore, classes group methods.",
            &lexicon,
        );
        let unlinked = TextProfile::new("Gardens grow. Rivers flow.", &lexicon);
        assert_eq!(ctx.coherence(&linked), 1.0);
        assert_eq!(ctx.coherence(&unlinked), 0.0);
        assert_eq!(ctx.coherence(&TextProfile::new("One sentence.", &lexicon)), 0.5);
    }
}
