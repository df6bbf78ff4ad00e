//! Holland (RIASEC) questionnaire scoring

use super::{round1, DimensionScore, ScoreOutcome};
use crate::catalog::{HollandDimension, QuestionSet, TestType, HOLLAND_QUESTION_COUNT};
use crate::error::{CareerAdvisorError, Result};
use std::collections::{HashMap, HashSet};

/// 6 questions per dimension at 4 points each.
pub const MAX_SCORE_PER_DIMENSION: i32 = 24;

const MIN_RATING: i32 = 0;
const MAX_RATING: i32 = 4;

/// Score a complete Holland answer set against its question catalog.
///
/// The answer set must cover every catalog question exactly once with a
/// rating in 0..=4. The result code is the three highest-scoring dimension
/// letters in descending order; ties resolve by the fixed R, I, A, S, E, C
/// order. Percentages are computed against the per-dimension maximum of 24.
pub fn score_holland(set: &QuestionSet, answers: &HashMap<String, i32>) -> Result<ScoreOutcome> {
    if set.test_type != TestType::Holland {
        return Err(CareerAdvisorError::Validation(format!(
            "Expected a HOLLAND question set, got {}",
            set.test_type
        )));
    }
    if set.questions.is_empty() {
        return Err(CareerAdvisorError::Validation(
            "Holland question set is empty".to_string(),
        ));
    }

    if answers.len() != HOLLAND_QUESTION_COUNT {
        return Err(CareerAdvisorError::Validation(format!(
            "Expected exactly {} answers, got {}",
            HOLLAND_QUESTION_COUNT,
            answers.len()
        )));
    }

    let valid_ids: HashSet<&str> = set.questions.iter().map(|q| q.id.as_str()).collect();

    let mut unknown: Vec<&str> = answers
        .keys()
        .map(String::as_str)
        .filter(|id| !valid_ids.contains(id))
        .collect();
    if !unknown.is_empty() {
        unknown.sort_unstable();
        return Err(CareerAdvisorError::Validation(format!(
            "Unknown question ids: {}",
            unknown.join(", ")
        )));
    }

    let mut missing: Vec<&str> = valid_ids
        .iter()
        .copied()
        .filter(|id| !answers.contains_key(*id))
        .collect();
    if !missing.is_empty() {
        missing.sort_unstable();
        return Err(CareerAdvisorError::Validation(format!(
            "Missing question ids: {}",
            missing.join(", ")
        )));
    }

    for (id, score) in answers {
        if !(MIN_RATING..=MAX_RATING).contains(score) {
            return Err(CareerAdvisorError::Validation(format!(
                "Invalid score for question {}: {}. Scores must be between {} and {}",
                id, score, MIN_RATING, MAX_RATING
            )));
        }
    }

    let mut sums = [0i32; 6];
    for question in &set.questions {
        let dimension = question.dimension.ok_or_else(|| {
            CareerAdvisorError::Validation(format!(
                "Question {} has no dimension tag",
                question.id
            ))
        })?;
        let index = HollandDimension::ALL
            .iter()
            .position(|d| *d == dimension)
            .expect("dimension covered by ALL");
        sums[index] += answers.get(&question.id).copied().unwrap_or(0);
    }

    let total: i32 = sums.iter().sum();
    if total == 0 {
        return Err(CareerAdvisorError::Validation(
            "Degenerate answer set: every rating is zero".to_string(),
        ));
    }

    // Descending score; ties keep the fixed R, I, A, S, E, C order.
    let mut order: Vec<usize> = (0..HollandDimension::ALL.len()).collect();
    order.sort_by_key(|&i| (-sums[i], i));

    let result_code: String = order
        .iter()
        .take(3)
        .map(|&i| HollandDimension::ALL[i].letter())
        .collect();

    let breakdown: Vec<DimensionScore> = order
        .iter()
        .map(|&i| DimensionScore {
            code: HollandDimension::ALL[i].letter().to_string(),
            dominant: None,
            score: sums[i],
            max_score: MAX_SCORE_PER_DIMENSION,
            percentage: round1(sums[i] as f32 / MAX_SCORE_PER_DIMENSION as f32 * 100.0),
        })
        .collect();

    Ok(ScoreOutcome {
        result_code,
        breakdown,
        total,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::test_support::holland_question_set;

    fn uniform_answers(set: &QuestionSet, score: i32) -> HashMap<String, i32> {
        set.questions
            .iter()
            .map(|q| (q.id.clone(), score))
            .collect()
    }

    #[test]
    fn test_dimension_sums_equal_total() {
        let set = holland_question_set();
        let mut answers = uniform_answers(&set, 1);
        answers.insert("r1".to_string(), 4);
        answers.insert("a3".to_string(), 3);

        let outcome = score_holland(&set, &answers).unwrap();
        let breakdown_total: i32 = outcome.breakdown.iter().map(|d| d.score).sum();
        assert_eq!(breakdown_total, outcome.total);
        assert_eq!(outcome.total, 36 - 2 + 4 + 3);
    }

    #[test]
    fn test_all_r_answers_rank_r_first() {
        let set = holland_question_set();
        let answers: HashMap<String, i32> = set
            .questions
            .iter()
            .map(|q| {
                let score = if q.id.starts_with('r') { 4 } else { 0 };
                (q.id.clone(), score)
            })
            .collect();

        let outcome = score_holland(&set, &answers).unwrap();
        assert!(outcome.result_code.starts_with('R'));
        let r_entry = outcome.breakdown.iter().find(|d| d.code == "R").unwrap();
        assert_eq!(r_entry.score, 24);
        assert_eq!(r_entry.percentage, 100.0);
        let max_pct = outcome
            .breakdown
            .iter()
            .map(|d| d.percentage)
            .fold(f32::MIN, f32::max);
        assert_eq!(r_entry.percentage, max_pct);
    }

    #[test]
    fn test_tie_break_follows_fixed_dimension_order() {
        let set = holland_question_set();
        // Every dimension scores the same; top-3 must be R, I, A.
        let answers = uniform_answers(&set, 2);
        let outcome = score_holland(&set, &answers).unwrap();
        assert_eq!(outcome.result_code, "RIA");
    }

    #[test]
    fn test_rejects_wrong_answer_count() {
        let set = holland_question_set();
        let mut answers = uniform_answers(&set, 1);
        answers.remove("c6");

        let err = score_holland(&set, &answers).unwrap_err();
        assert!(err.to_string().contains("35"));
    }

    #[test]
    fn test_rejects_unknown_question_id() {
        let set = holland_question_set();
        let mut answers = uniform_answers(&set, 1);
        answers.remove("c6");
        answers.insert("zz9".to_string(), 2);

        let err = score_holland(&set, &answers).unwrap_err();
        assert!(err.to_string().contains("zz9"));
    }

    #[test]
    fn test_rejects_out_of_range_score() {
        let set = holland_question_set();
        let mut answers = uniform_answers(&set, 1);
        answers.insert("r1".to_string(), 5);

        let err = score_holland(&set, &answers).unwrap_err();
        assert!(err.to_string().contains("r1"));
    }

    #[test]
    fn test_rejects_all_zero_answers() {
        let set = holland_question_set();
        let answers = uniform_answers(&set, 0);
        assert!(score_holland(&set, &answers).is_err());
    }

    #[test]
    fn test_percentage_uses_per_dimension_max() {
        let set = holland_question_set();
        let answers: HashMap<String, i32> = set
            .questions
            .iter()
            .map(|q| {
                let score = if q.id.starts_with('i') { 2 } else { 1 };
                (q.id.clone(), score)
            })
            .collect();

        let outcome = score_holland(&set, &answers).unwrap();
        let i_entry = outcome.breakdown.iter().find(|d| d.code == "I").unwrap();
        // 12 of 24 points.
        assert_eq!(i_entry.percentage, 50.0);
    }
}
