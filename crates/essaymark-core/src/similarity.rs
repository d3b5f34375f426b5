//! Text-level similarity between a student answer and its reference.

use serde::Serialize;

use crate::text::TextProfile;

/// Similarity features shared by every content-facing analyzer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct SimilarityReport {
    /// Cosine similarity of stem frequency vectors.
    pub cosine: f64,
    /// Jaccard similarity of stem sets.
    pub jaccard: f64,
    /// Share of reference stem occurrences whose stem the student also uses.
    pub overlap_recall: f64,
    /// Share of reference stem bigrams the student reproduces.
    pub bigram_recall: f64,
}

impl SimilarityReport {
    pub fn compute(student: &TextProfile, reference: &TextProfile) -> Self {
        let student_freq = student.stem_frequencies();
        let reference_freq = reference.stem_frequencies();

        let dot: f64 = reference_freq
            .iter()
            .filter_map(|(stem, r)| student_freq.get(stem).map(|s| (*s * *r) as f64))
            .sum();
        let norm = |freq: &std::collections::BTreeMap<&str, usize>| {
            freq.values().map(|v| (*v * *v) as f64).sum::<f64>().sqrt()
        };
        let denominator = norm(&student_freq) * norm(&reference_freq);
        let cosine = if denominator > 0.0 { dot / denominator } else { 0.0 };

        let student_set = student.stem_set();
        let reference_set = reference.stem_set();
        let union = student_set.union(&reference_set).count();
        let jaccard = if union > 0 {
            student_set.intersection(&reference_set).count() as f64 / union as f64
        } else {
            0.0
        };

        let reference_mass: usize = reference_freq.values().sum();
        let shared_mass: usize = reference_freq
            .iter()
            .filter(|(stem, _)| student_set.contains(*stem))
            .map(|(_, count)| *count)
            .sum();
        let overlap_recall = ratio(shared_mass, reference_mass);

        let reference_bigrams = reference.stem_bigrams();
        let bigram_recall = if reference_bigrams.is_empty() {
            overlap_recall
        } else {
            let student_bigrams = student.stem_bigrams();
            ratio(
                reference_bigrams.intersection(&student_bigrams).count(),
                reference_bigrams.len(),
            )
        };

        Self {
            cosine: cosine.clamp(0.0, 1.0),
            jaccard,
            overlap_recall,
            bigram_recall,
        }
    }

    /// How much of the reference wording survives, in `[0, 1]`.
    pub fn meaning_preservation(&self) -> f64 {
        0.5 * self.cosine + 0.5 * self.bigram_recall
    }
}

fn ratio(part: usize, whole: usize) -> f64 {
    if whole == 0 {
        0.0
    } else {
        part as f64 / whole as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexicon::Lexicon;

    #[test]
    fn identical_texts_are_fully_similar() {
        let lexicon = Lexicon::builtin().unwrap();
        let text = "Encapsulation bundles data with methods. Inheritance reuses code.";
        let a = TextProfile::new(text, &lexicon);
        let b = TextProfile::new(text, &lexicon);
        let report = SimilarityReport::compute(&a, &b);
        assert!((report.cosine - 1.0).abs() < 1e-9);
        assert_eq!(report.jaccard, 1.0);
        assert_eq!(report.overlap_recall, 1.0);
        assert_eq!(report.bigram_recall, 1.0);
        assert!((report.meaning_preservation() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn disjoint_texts_share_nothing() {
        let lexicon = Lexicon::builtin().unwrap();
        let a = TextProfile::new("Preheat the oven and whisk eggs.", &lexicon);
        let b = TextProfile::new("Polymorphism enables dynamic dispatch.", &lexicon);
        let report = SimilarityReport::compute(&a, &b);
        assert_eq!(report, SimilarityReport::default());
    }

    #[test]
    fn partial_overlap() {
        let lexicon = Lexicon::builtin().unwrap();
        let student = TextProfile::new("Objects combine data.", &lexicon);
        let reference = TextProfile::new("Objects combine data and methods.", &lexicon);
        let report = SimilarityReport::compute(&student, &reference);
        assert!((report.overlap_recall - 0.75).abs() < 1e-9);
        assert!((report.jaccard - 0.75).abs() < 1e-9);
        assert!((report.bigram_recall - 2.0 / 3.0).abs() < 1e-9);
        assert!(report.cosine > 0.8 && report.cosine < 1.0);
    }

    #[test]
    fn empty_inputs() {
        let lexicon = Lexicon::builtin().unwrap();
        let empty = TextProfile::new("", &lexicon);
        let report = SimilarityReport::compute(&empty, &empty);
        assert_eq!(report, SimilarityReport::default());
    }
}
