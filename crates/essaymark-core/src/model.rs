//! Core data model types for essaymark.
//!
//! These are the request and result types exchanged with callers, plus the
//! per-layer score record every analyzer produces.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// A single answer to be scored against its reference answer.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoringRequest {
    /// Free-text answer written by the student.
    pub student_answer: String,
    /// Model answer written by the examiner.
    pub reference_answer: String,
    /// Maximum marks available for the question. Must be positive.
    pub max_marks: u32,
    /// Optional information about the question being answered.
    #[serde(default)]
    pub question_metadata: Option<QuestionMetadata>,
}

impl ScoringRequest {
    pub fn new(
        student_answer: impl Into<String>,
        reference_answer: impl Into<String>,
        max_marks: u32,
    ) -> Self {
        Self {
            student_answer: student_answer.into(),
            reference_answer: reference_answer.into(),
            max_marks,
            question_metadata: None,
        }
    }

    pub fn with_metadata(mut self, metadata: QuestionMetadata) -> Self {
        self.question_metadata = Some(metadata);
        self
    }
}

/// Descriptive information about a question.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionMetadata {
    #[serde(default)]
    pub id: Option<String>,
    /// Question prompt; contributes to subject-domain detection.
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default, rename = "type")]
    pub question_type: Option<QuestionType>,
    #[serde(default)]
    pub difficulty: Option<Difficulty>,
}

/// Kind of question being answered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuestionType {
    Essay,
    ShortAnswer,
    Explanation,
    Definition,
}

impl FromStr for QuestionType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().replace('-', "_").as_str() {
            "essay" => Ok(QuestionType::Essay),
            "short_answer" | "short" => Ok(QuestionType::ShortAnswer),
            "explanation" | "explain" => Ok(QuestionType::Explanation),
            "definition" | "define" => Ok(QuestionType::Definition),
            other => Err(format!("unknown question type: {other}")),
        }
    }
}

/// Examiner-assigned difficulty.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

impl FromStr for Difficulty {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "easy" => Ok(Difficulty::Easy),
            "medium" => Ok(Difficulty::Medium),
            "hard" => Ok(Difficulty::Hard),
            other => Err(format!("unknown difficulty: {other}")),
        }
    }
}

/// The content-facing scoring layers, in registry order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum LayerKind {
    ContentAccuracy,
    SemanticUnderstanding,
    QualityDifferentiation,
    WritingQuality,
    CriticalThinking,
    TechnicalPrecision,
    CognitiveComplexity,
    ConceptualDepth,
}

impl LayerKind {
    pub const ALL: [LayerKind; 8] = [
        LayerKind::ContentAccuracy,
        LayerKind::SemanticUnderstanding,
        LayerKind::QualityDifferentiation,
        LayerKind::WritingQuality,
        LayerKind::CriticalThinking,
        LayerKind::TechnicalPrecision,
        LayerKind::CognitiveComplexity,
        LayerKind::ConceptualDepth,
    ];

    /// Key used in the serialized breakdown.
    pub fn key(&self) -> &'static str {
        match self {
            LayerKind::ContentAccuracy => "contentAccuracy",
            LayerKind::SemanticUnderstanding => "semanticUnderstanding",
            LayerKind::QualityDifferentiation => "qualityDifferentiation",
            LayerKind::WritingQuality => "writingQuality",
            LayerKind::CriticalThinking => "criticalThinking",
            LayerKind::TechnicalPrecision => "technicalPrecision",
            LayerKind::CognitiveComplexity => "cognitiveComplexity",
            LayerKind::ConceptualDepth => "conceptualDepth",
        }
    }

    /// Human-readable label used in feedback.
    pub fn label(&self) -> &'static str {
        match self {
            LayerKind::ContentAccuracy => "content accuracy",
            LayerKind::SemanticUnderstanding => "semantic understanding",
            LayerKind::QualityDifferentiation => "answer quality",
            LayerKind::WritingQuality => "writing quality",
            LayerKind::CriticalThinking => "critical thinking",
            LayerKind::TechnicalPrecision => "technical precision",
            LayerKind::CognitiveComplexity => "cognitive complexity",
            LayerKind::ConceptualDepth => "conceptual depth",
        }
    }
}

impl fmt::Display for LayerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// Output of one scoring layer.
///
/// Invariant: `0 <= score <= max_score`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LayerScore {
    pub score: f64,
    pub max_score: f64,
    /// Internal breakdown, flattened next to `score` and `maxScore`.
    #[serde(flatten)]
    pub metrics: BTreeMap<String, f64>,
}

impl LayerScore {
    /// Build a layer score from a `[0, 1]` fraction of the layer's allotment.
    ///
    /// Non-finite fractions collapse to zero.
    pub fn from_fraction(fraction: f64, max_score: f64, metrics: BTreeMap<String, f64>) -> Self {
        let max_score = if max_score.is_finite() { max_score.max(0.0) } else { 0.0 };
        let fraction = if fraction.is_finite() { fraction.clamp(0.0, 1.0) } else { 0.0 };
        Self {
            score: fraction * max_score,
            max_score,
            metrics,
        }
    }

    /// A zero score, used when a layer fails.
    pub fn zero(max_score: f64) -> Self {
        Self::from_fraction(0.0, max_score, BTreeMap::new())
    }

    /// Share of the layer allotment earned, in `[0, 1]`.
    pub fn fraction(&self) -> f64 {
        if self.max_score <= 0.0 {
            0.0
        } else {
            (self.score / self.max_score).clamp(0.0, 1.0)
        }
    }

    pub fn percentage(&self) -> f64 {
        self.fraction() * 100.0
    }
}

/// Letter grade derived from the percentage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Grade {
    APlus,
    A,
    AMinus,
    BPlus,
    B,
    BMinus,
    CPlus,
    C,
    CMinus,
    DPlus,
    D,
    DMinus,
    F,
}

impl Grade {
    pub const ALL: [Grade; 13] = [
        Grade::APlus,
        Grade::A,
        Grade::AMinus,
        Grade::BPlus,
        Grade::B,
        Grade::BMinus,
        Grade::CPlus,
        Grade::C,
        Grade::CMinus,
        Grade::DPlus,
        Grade::D,
        Grade::DMinus,
        Grade::F,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Grade::APlus => "A+ (Exceptional)",
            Grade::A => "A (Excellent)",
            Grade::AMinus => "A- (Very Good)",
            Grade::BPlus => "B+ (Good)",
            Grade::B => "B (Above Average)",
            Grade::BMinus => "B- (Satisfactory)",
            Grade::CPlus => "C+ (Adequate)",
            Grade::C => "C (Acceptable)",
            Grade::CMinus => "C- (Below Average)",
            Grade::DPlus => "D+ (Marginal)",
            Grade::D => "D (Weak)",
            Grade::DMinus => "D- (Very Weak)",
            Grade::F => "F (Fail)",
        }
    }
}

impl fmt::Display for Grade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl From<Grade> for String {
    fn from(grade: Grade) -> Self {
        grade.label().to_string()
    }
}

impl TryFrom<String> for Grade {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Grade::ALL
            .into_iter()
            .find(|g| g.label() == value)
            .ok_or_else(|| format!("unknown grade: {value}"))
    }
}

/// Proficiency band on a 9.0 to 0.0 half-point ladder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Band {
    /// Band value in half points (18 = 9.0).
    half_points: u8,
}

impl Band {
    pub const MAX_HALF_POINTS: u8 = 18;

    pub fn from_half_points(half_points: u8) -> Self {
        Self {
            half_points: half_points.min(Self::MAX_HALF_POINTS),
        }
    }

    pub fn value(&self) -> f64 {
        f64::from(self.half_points) / 2.0
    }

    fn descriptor(&self) -> Option<&'static str> {
        match self.half_points / 2 {
            9 => Some("Expert User"),
            8 => Some("Very Good User"),
            7 => Some("Good User"),
            6 => Some("Competent User"),
            5 => Some("Modest User"),
            4 => Some("Limited User"),
            3 => Some("Extremely Limited User"),
            2 => Some("Intermittent User"),
            1 => Some("Non User"),
            _ if self.half_points == 1 => Some("Minimal"),
            _ => None,
        }
    }

    pub fn label(&self) -> String {
        match self.descriptor() {
            Some(desc) => format!("{:.1} ({desc})", self.value()),
            None => format!("{:.1}", self.value()),
        }
    }
}

impl fmt::Display for Band {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.label())
    }
}

impl From<Band> for String {
    fn from(band: Band) -> Self {
        band.label()
    }
}

impl TryFrom<String> for Band {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        let number = value.split_whitespace().next().unwrap_or_default();
        let parsed: f64 = number
            .parse()
            .map_err(|_| format!("unknown band: {value}"))?;
        if !(0.0..=9.0).contains(&parsed) || (parsed * 2.0).fract() != 0.0 {
            return Err(format!("band out of range: {value}"));
        }
        Ok(Band::from_half_points((parsed * 2.0) as u8))
    }
}

/// Per-layer scores plus the aggregate adjustments applied on top of them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DetailedBreakdown {
    #[serde(flatten)]
    pub layers: BTreeMap<LayerKind, LayerScore>,
    /// Exceptional-answer bonus plus creative/practical-example bonus, in marks.
    pub bonus_points: f64,
    /// Grammar, length and repetition penalty, in marks.
    pub penalties: f64,
    /// Damped gibberish score in `[0, 1]`.
    pub gibberish_penalty: f64,
    /// Off-topic penalty in `[0, 0.85]`.
    pub off_topic_penalty: f64,
    /// Intelligence multiplier applied to the weighted layer total.
    pub intelligence_multiplier: f64,
}

impl DetailedBreakdown {
    pub fn layer(&self, kind: LayerKind) -> Option<&LayerScore> {
        self.layers.get(&kind)
    }
}

/// Final, immutable outcome of scoring one answer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoringResult {
    pub total_score: u32,
    pub max_marks: u32,
    pub percentage: u32,
    pub is_passed: bool,
    pub grade: Grade,
    pub band: Band,
    pub assessment: String,
    pub detailed_breakdown: DetailedBreakdown,
    pub feedback: String,
}

/// A collection of questions and submissions scored together, typically for
/// calibration after weight tuning.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoringSet {
    pub id: String,
    pub name: String,
    pub description: String,
    pub questions: Vec<Question>,
    pub submissions: Vec<Submission>,
}

impl ScoringSet {
    pub fn question(&self, id: &str) -> Option<&Question> {
        self.questions.iter().find(|q| q.id == id)
    }

    /// Build the engine request for a submission, if its question exists.
    pub fn request_for(&self, submission: &Submission) -> Option<ScoringRequest> {
        let question = self.question(&submission.question_id)?;
        Some(
            ScoringRequest::new(
                submission.answer.clone(),
                question.reference_answer.clone(),
                question.max_marks,
            )
            .with_metadata(question.metadata()),
        )
    }
}

/// A question with its model answer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Question {
    pub id: String,
    pub text: Option<String>,
    pub question_type: Option<QuestionType>,
    pub difficulty: Option<Difficulty>,
    pub max_marks: u32,
    pub reference_answer: String,
}

impl Question {
    pub fn metadata(&self) -> QuestionMetadata {
        QuestionMetadata {
            id: Some(self.id.clone()),
            text: self.text.clone(),
            question_type: self.question_type,
            difficulty: self.difficulty,
        }
    }
}

/// A student answer to one question of a set.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Submission {
    pub id: String,
    pub question_id: String,
    pub answer: String,
    /// Inclusive calibration range for the total score, in marks.
    pub expected_min: Option<u32>,
    pub expected_max: Option<u32>,
}

impl Submission {
    pub fn has_expectation(&self) -> bool {
        self.expected_min.is_some() || self.expected_max.is_some()
    }

    /// Whether `total` falls inside the calibration range, or `None` when
    /// the submission has no expectation.
    pub fn meets_expectation(&self, total: u32) -> Option<bool> {
        within_range(total, self.expected_min, self.expected_max)
    }
}

/// Inclusive range check where either bound may be open; `None` when both are.
pub(crate) fn within_range(total: u32, min: Option<u32>, max: Option<u32>) -> Option<bool> {
    if min.is_none() && max.is_none() {
        return None;
    }
    Some(min.map_or(true, |m| total >= m) && max.map_or(true, |m| total <= m))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn submission_expectations() {
        let mut submission = Submission {
            id: "s1".into(),
            question_id: "q1".into(),
            answer: "text".into(),
            expected_min: None,
            expected_max: None,
        };
        assert_eq!(submission.meets_expectation(3), None);
        submission.expected_min = Some(2);
        submission.expected_max = Some(4);
        assert_eq!(submission.meets_expectation(2), Some(true));
        assert_eq!(submission.meets_expectation(4), Some(true));
        assert_eq!(submission.meets_expectation(5), Some(false));
        submission.expected_min = None;
        assert_eq!(submission.meets_expectation(0), Some(true));
    }

    #[test]
    fn layer_score_clamps_fraction() {
        let score = LayerScore::from_fraction(1.7, 2.0, BTreeMap::new());
        assert_eq!(score.score, 2.0);
        let score = LayerScore::from_fraction(f64::NAN, 2.0, BTreeMap::new());
        assert_eq!(score.score, 0.0);
        assert_eq!(LayerScore::zero(0.0).fraction(), 0.0);
    }

    #[test]
    fn layer_score_flattens_metrics() {
        let mut metrics = BTreeMap::new();
        metrics.insert("coverage".to_string(), 0.5);
        let score = LayerScore::from_fraction(0.5, 2.0, metrics);
        let json = serde_json::to_value(&score).unwrap();
        assert_eq!(json["score"], 1.0);
        assert_eq!(json["maxScore"], 2.0);
        assert_eq!(json["coverage"], 0.5);
    }

    #[test]
    fn grade_label_roundtrip() {
        for grade in Grade::ALL {
            let label: String = grade.into();
            assert_eq!(Grade::try_from(label).unwrap(), grade);
        }
        assert!(Grade::try_from("Z (Unknown)".to_string()).is_err());
    }

    #[test]
    fn band_labels() {
        assert_eq!(Band::from_half_points(18).label(), "9.0 (Expert User)");
        assert_eq!(Band::from_half_points(13).label(), "6.5 (Competent User)");
        assert_eq!(Band::from_half_points(0).label(), "0.0");
        assert_eq!(Band::from_half_points(40).value(), 9.0);
        assert_eq!(
            Band::try_from("7.5 (Good User)".to_string()).unwrap(),
            Band::from_half_points(15)
        );
        assert!(Band::try_from("9.5".to_string()).is_err());
    }

    #[test]
    fn question_type_parse() {
        assert_eq!(
            "short-answer".parse::<QuestionType>().unwrap(),
            QuestionType::ShortAnswer
        );
        assert_eq!("Essay".parse::<QuestionType>().unwrap(), QuestionType::Essay);
        assert!("poem".parse::<QuestionType>().is_err());
        assert_eq!("HARD".parse::<Difficulty>().unwrap(), Difficulty::Hard);
    }

    #[test]
    fn request_serde_uses_camel_case() {
        let json = r#"{"studentAnswer":"a","referenceAnswer":"b","maxMarks":5,
            "questionMetadata":{"id":"q1","type":"short_answer","difficulty":"easy"}}"#;
        let request: ScoringRequest = serde_json::from_str(json).unwrap();
        assert_eq!(request.max_marks, 5);
        let meta = request.question_metadata.unwrap();
        assert_eq!(meta.question_type, Some(QuestionType::ShortAnswer));
        assert_eq!(meta.difficulty, Some(Difficulty::Easy));
    }
}
