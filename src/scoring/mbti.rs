//! MBTI questionnaire scoring

use super::{round1, DimensionScore, ScoreOutcome};
use crate::catalog::{QuestionSet, TestType};
use crate::error::{CareerAdvisorError, Result};
use std::collections::{HashMap, HashSet};

/// Dichotomy pairs in their fixed result-code order. An exact tie resolves
/// to the second letter of the pair.
pub const DICHOTOMIES: [(char, char); 4] = [('E', 'I'), ('S', 'N'), ('T', 'F'), ('J', 'P')];

const VALID_LETTERS: [char; 8] = ['E', 'I', 'S', 'N', 'T', 'F', 'J', 'P'];

/// Score an MBTI answer set against its question catalog.
///
/// Demographic questions are excluded before validation; answers for unknown
/// question ids are ignored. Any answer outside the eight dichotomy letters
/// fails with a validation error naming the offending question.
pub fn score_mbti(set: &QuestionSet, answers: &HashMap<String, String>) -> Result<ScoreOutcome> {
    if set.test_type != TestType::Mbti {
        return Err(CareerAdvisorError::Validation(format!(
            "Expected an MBTI question set, got {}",
            set.test_type
        )));
    }

    let scorable_ids: HashSet<&str> = set.scorable_questions().map(|q| q.id.as_str()).collect();

    let mut tally: HashMap<char, i32> = VALID_LETTERS.iter().map(|&l| (l, 0)).collect();
    let mut counted = 0i32;

    for (question_id, raw_value) in answers {
        if !scorable_ids.contains(question_id.as_str()) {
            continue;
        }

        let normalized = raw_value.trim().to_uppercase();
        let letter = match normalized.chars().next() {
            Some(c) if normalized.chars().count() == 1 && VALID_LETTERS.contains(&c) => c,
            _ => {
                return Err(CareerAdvisorError::Validation(format!(
                    "Invalid answer '{}' for question {}; expected one of E, I, S, N, T, F, J, P",
                    raw_value, question_id
                )))
            }
        };

        *tally.entry(letter).or_insert(0) += 1;
        counted += 1;
    }

    let mut result_code = String::with_capacity(4);
    let mut breakdown = Vec::with_capacity(4);

    for (first, second) in DICHOTOMIES {
        let first_count = tally.get(&first).copied().unwrap_or(0);
        let second_count = tally.get(&second).copied().unwrap_or(0);

        // Strict majority wins; ties fall to the second letter (I, N, F, P).
        let dominant = if first_count > second_count {
            first
        } else {
            second
        };
        let dominant_count = first_count.max(second_count);
        let pair_total = first_count + second_count;

        result_code.push(dominant);
        breakdown.push(DimensionScore {
            code: format!("{}{}", first, second),
            dominant: Some(dominant),
            score: (first_count - second_count).abs(),
            max_score: pair_total,
            percentage: if pair_total > 0 {
                round1(dominant_count as f32 / pair_total as f32 * 100.0)
            } else {
                0.0
            },
        });
    }

    Ok(ScoreOutcome {
        result_code,
        breakdown,
        total: counted,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::test_support::mbti_question_set;

    /// Answer the first `first_n` questions of a dichotomy with the first
    /// letter and the rest with the second.
    fn split_answers(set: &QuestionSet, splits: [(usize, usize); 4]) -> HashMap<String, String> {
        let mut answers = HashMap::new();
        for (pair_index, (first, second)) in DICHOTOMIES.iter().enumerate() {
            let category = format!("{}{}", first, second);
            let (first_n, _) = splits[pair_index];
            let mut seen = 0;
            for q in set
                .questions
                .iter()
                .filter(|q| q.category.as_deref() == Some(category.as_str()))
            {
                let letter = if seen < first_n { *first } else { *second };
                answers.insert(q.id.clone(), letter.to_string());
                seen += 1;
            }
        }
        answers
    }

    #[test]
    fn test_majority_wins_each_dichotomy() {
        let set = mbti_question_set(6);
        // 4 E vs 2 I, 2 S vs 4 N, 5 T vs 1 F, 1 J vs 5 P
        let answers = split_answers(&set, [(4, 2), (2, 4), (5, 1), (1, 5)]);

        let outcome = score_mbti(&set, &answers).unwrap();
        assert_eq!(outcome.result_code, "ENTP");
        assert_eq!(outcome.total, 24);

        let ei = &outcome.breakdown[0];
        assert_eq!(ei.code, "EI");
        assert_eq!(ei.dominant, Some('E'));
        assert_eq!(ei.score, 2);
        assert_eq!(ei.max_score, 6);
    }

    #[test]
    fn test_exact_tie_defaults_to_second_letter() {
        let set = mbti_question_set(4);
        let answers = split_answers(&set, [(2, 2), (2, 2), (2, 2), (2, 2)]);

        let outcome = score_mbti(&set, &answers).unwrap();
        assert_eq!(outcome.result_code, "INFP");
        for entry in &outcome.breakdown {
            assert_eq!(entry.score, 0);
            assert_eq!(entry.percentage, 50.0);
        }
    }

    #[test]
    fn test_unknown_question_ids_ignored() {
        let set = mbti_question_set(2);
        let mut answers = split_answers(&set, [(2, 0), (0, 2), (2, 0), (0, 2)]);
        answers.insert("ghost_1".to_string(), "E".to_string());

        let outcome = score_mbti(&set, &answers).unwrap();
        assert_eq!(outcome.result_code, "ENTP");
        assert_eq!(outcome.total, 8);
    }

    #[test]
    fn test_demographic_answers_ignored() {
        let set = mbti_question_set(2);
        let mut answers = split_answers(&set, [(2, 0), (0, 2), (2, 0), (0, 2)]);
        // Demographic answers never reach validation, even with junk values.
        answers.insert("demo_1".to_string(), "25-34".to_string());

        let outcome = score_mbti(&set, &answers).unwrap();
        assert_eq!(outcome.result_code, "ENTP");
    }

    #[test]
    fn test_invalid_letter_names_question() {
        let set = mbti_question_set(2);
        let mut answers = split_answers(&set, [(2, 0), (0, 2), (2, 0), (0, 2)]);
        answers.insert("ei_1".to_string(), "X".to_string());

        let err = score_mbti(&set, &answers).unwrap_err();
        assert!(err.to_string().contains("ei_1"));
    }

    #[test]
    fn test_lowercase_letters_accepted() {
        let set = mbti_question_set(2);
        let mut answers = HashMap::new();
        for q in set.scorable_questions() {
            let letter = q.category.as_ref().unwrap().chars().next().unwrap();
            answers.insert(q.id.clone(), letter.to_lowercase().to_string());
        }

        let outcome = score_mbti(&set, &answers).unwrap();
        assert_eq!(outcome.result_code, "ESTJ");
    }

    #[test]
    fn test_empty_answers_tie_everywhere() {
        let set = mbti_question_set(2);
        let outcome = score_mbti(&set, &HashMap::new()).unwrap();
        assert_eq!(outcome.result_code, "INFP");
        assert_eq!(outcome.total, 0);
        assert!(outcome.breakdown.iter().all(|d| d.percentage == 0.0));
    }
}
