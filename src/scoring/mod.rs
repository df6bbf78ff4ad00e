//! Assessment scoring engines
//!
//! Pure functions turning raw answer sets into a result code and a
//! per-dimension breakdown. No storage, no caching: persistence is the
//! caller's job (see [`service::AssessmentService`]).

pub mod holland;
pub mod mbti;
pub mod service;

pub use holland::score_holland;
pub use mbti::score_mbti;
pub use service::{AnswerSet, AssessmentOutcome, AssessmentService};

use serde::Serialize;

/// Score detail for one Holland dimension or one MBTI dichotomy.
#[derive(Debug, Clone, Serialize)]
pub struct DimensionScore {
    /// Dimension letter ("R".."C") or dichotomy pair ("EI".."JP").
    pub code: String,
    /// Winning letter of the pair (MBTI only).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dominant: Option<char>,
    /// Summed score (Holland) or winning margin (MBTI).
    pub score: i32,
    pub max_score: i32,
    pub percentage: f32,
}

/// Result of scoring one assessment.
#[derive(Debug, Clone, Serialize)]
pub struct ScoreOutcome {
    pub result_code: String,
    /// Holland: dimensions in descending-score order. MBTI: dichotomies in
    /// fixed EI, SN, TF, JP order.
    pub breakdown: Vec<DimensionScore>,
    /// Sum of all answer scores (Holland) or count of tallied answers (MBTI).
    pub total: i32,
}

pub(crate) fn round1(value: f32) -> f32 {
    (value * 10.0).round() / 10.0
}
