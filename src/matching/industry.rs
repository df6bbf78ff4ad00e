//! Industry selection from admin-configured MBTI/Holland score maps
//!
//! Score maps are admin data and cannot be trusted at read time: malformed
//! codes and out-of-range scores are dropped silently (logged at debug)
//! because this selector runs on every test submission and must never be
//! blocked by bad configuration.

use crate::storage::Industry;
use log::debug;
use std::collections::HashMap;

const MAX_SELECTED: usize = 4;
const MIN_MAP_SCORE: f32 = 0.0;
const MAX_MAP_SCORE: f32 = 100.0;

/// Industries scoring zero against absent or unmatched codes fall back to a
/// popularity order instead of an arbitrary/empty list.
#[derive(Debug, Clone, serde::Serialize)]
pub struct IndustryPick {
    pub id: i64,
    pub name: String,
    pub score: f32,
    pub career_count: usize,
}

pub fn is_valid_mbti_code(code: &str) -> bool {
    let code = code.trim().to_uppercase();
    let letters: Vec<char> = code.chars().collect();
    letters.len() == 4
        && ['E', 'I'].contains(&letters[0])
        && ['S', 'N'].contains(&letters[1])
        && ['T', 'F'].contains(&letters[2])
        && ['J', 'P'].contains(&letters[3])
}

pub fn is_valid_holland_letter(letter: char) -> bool {
    matches!(
        letter.to_ascii_uppercase(),
        'R' | 'I' | 'A' | 'S' | 'E' | 'C'
    )
}

fn numeric_score(value: &serde_json::Value) -> Option<f32> {
    match value {
        serde_json::Value::Number(n) => n.as_f64().map(|f| f as f32),
        serde_json::Value::String(s) => s.trim().parse::<f32>().ok(),
        _ => None,
    }
}

/// Sanitize one industry's score maps: well-formed MBTI codes and Holland
/// letters with scores in 0..=100 survive, everything else is dropped.
pub fn sanitize_score_maps(industry: &Industry) -> (HashMap<String, f32>, HashMap<char, f32>) {
    let mut mbti = HashMap::new();
    for (raw_key, raw_value) in &industry.mbti_map {
        let key = raw_key.trim().to_uppercase();
        if !is_valid_mbti_code(&key) {
            debug!(
                "Dropping malformed MBTI key '{}' on industry '{}'",
                raw_key, industry.name
            );
            continue;
        }
        match numeric_score(raw_value) {
            Some(score) if (MIN_MAP_SCORE..=MAX_MAP_SCORE).contains(&score) => {
                mbti.insert(key, score);
            }
            _ => {
                debug!(
                    "Dropping out-of-range MBTI score for '{}' on industry '{}'",
                    raw_key, industry.name
                );
            }
        }
    }

    let mut holland = HashMap::new();
    for (raw_key, raw_value) in &industry.holland_map {
        let trimmed = raw_key.trim();
        let letter = match trimmed.chars().next() {
            Some(c) if trimmed.chars().count() == 1 && is_valid_holland_letter(c) => {
                c.to_ascii_uppercase()
            }
            _ => {
                debug!(
                    "Dropping malformed Holland key '{}' on industry '{}'",
                    raw_key, industry.name
                );
                continue;
            }
        };
        match numeric_score(raw_value) {
            Some(score) if (MIN_MAP_SCORE..=MAX_MAP_SCORE).contains(&score) => {
                holland.insert(letter, score);
            }
            _ => {
                debug!(
                    "Dropping out-of-range Holland score for '{}' on industry '{}'",
                    raw_key, industry.name
                );
            }
        }
    }

    (mbti, holland)
}

/// Select the best-matching industries for a pair of result codes.
///
/// Score per industry = mbti_map\[code\] + Σ holland_map\[letter\] over the
/// first three Holland letters. If no industry scores above zero, the order
/// falls back to (career_count desc, name) so unconfigured mapping data
/// still yields a useful list. `limit` is capped at 4.
pub fn select_industries(
    mbti_code: Option<&str>,
    holland_code: Option<&str>,
    industries: &[Industry],
    limit: usize,
) -> Vec<IndustryPick> {
    let mbti = mbti_code
        .map(|c| c.trim().to_uppercase())
        .filter(|c| !c.is_empty());
    let holland_primary: Vec<char> = holland_code
        .map(|c| c.trim().to_uppercase().chars().take(3).collect())
        .unwrap_or_default();

    let mut scored: Vec<IndustryPick> = industries
        .iter()
        .map(|industry| {
            let (mbti_map, holland_map) = sanitize_score_maps(industry);

            let mut score = 0.0;
            if let Some(code) = &mbti {
                score += mbti_map.get(code).copied().unwrap_or(0.0);
            }
            for letter in &holland_primary {
                score += holland_map.get(letter).copied().unwrap_or(0.0);
            }

            IndustryPick {
                id: industry.id,
                name: industry.name.clone(),
                score,
                career_count: industry.career_count,
            }
        })
        .collect();

    if scored.is_empty() {
        return Vec::new();
    }

    let has_any_match = scored.iter().any(|p| p.score > 0.0);
    if has_any_match {
        scored.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then(b.career_count.cmp(&a.career_count))
                .then(a.name.cmp(&b.name))
        });
    } else {
        scored.sort_by(|a, b| {
            b.career_count
                .cmp(&a.career_count)
                .then(a.name.cmp(&b.name))
        });
    }

    scored.truncate(limit.min(MAX_SELECTED));
    scored
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn industry(
        id: i64,
        name: &str,
        mbti: &[(&str, serde_json::Value)],
        holland: &[(&str, serde_json::Value)],
        career_count: usize,
    ) -> Industry {
        Industry {
            id,
            name: name.to_string(),
            mbti_map: mbti
                .iter()
                .map(|(k, v)| (k.to_string(), v.clone()))
                .collect(),
            holland_map: holland
                .iter()
                .map(|(k, v)| (k.to_string(), v.clone()))
                .collect(),
            career_count,
        }
    }

    #[test]
    fn test_mbti_code_validation() {
        assert!(is_valid_mbti_code("INTJ"));
        assert!(is_valid_mbti_code(" enfp "));
        assert!(!is_valid_mbti_code("INTX"));
        assert!(!is_valid_mbti_code("INT"));
        assert!(!is_valid_mbti_code("TJIN"));
    }

    #[test]
    fn test_sanitize_drops_malformed_entries() {
        let row = industry(
            1,
            "Tech",
            &[
                ("INTJ", json!(90)),
                ("XXXX", json!(50)),
                ("ENFP", json!(150)),
                ("ISTP", json!("80")),
            ],
            &[("R", json!(40)), ("Z", json!(10)), ("I", json!(-5))],
            3,
        );

        let (mbti, holland) = sanitize_score_maps(&row);
        assert_eq!(mbti.len(), 2);
        assert_eq!(mbti.get("INTJ"), Some(&90.0));
        assert_eq!(mbti.get("ISTP"), Some(&80.0));
        assert_eq!(holland.len(), 1);
        assert_eq!(holland.get(&'R'), Some(&40.0));
    }

    #[test]
    fn test_scored_selection_order() {
        let rows = vec![
            industry(1, "Finance", &[("INTJ", json!(30))], &[], 10),
            industry(2, "Tech", &[("INTJ", json!(90))], &[("R", json!(20))], 5),
            industry(3, "Arts", &[], &[("A", json!(80))], 2),
        ];

        let picks = select_industries(Some("INTJ"), Some("RIA"), &rows, 4);
        assert_eq!(picks[0].name, "Tech");
        assert_eq!(picks[0].score, 110.0);
        assert_eq!(picks[1].name, "Arts");
        assert_eq!(picks[2].name, "Finance");
    }

    #[test]
    fn test_popularity_fallback_when_no_mapping_matches() {
        let rows = vec![
            industry(1, "Beta", &[], &[], 3),
            industry(2, "Alpha", &[], &[], 3),
            industry(3, "Gamma", &[], &[], 9),
        ];

        // Order depends only on career count then name, not on the codes.
        let with_codes = select_industries(Some("INTJ"), Some("RIA"), &rows, 4);
        let without_codes = select_industries(None, None, &rows, 4);

        let names: Vec<_> = with_codes.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["Gamma", "Alpha", "Beta"]);
        let names2: Vec<_> = without_codes.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, names2);
    }

    #[test]
    fn test_holland_primary_letters_capped_at_three() {
        let rows = vec![industry(
            1,
            "Everything",
            &[],
            &[
                ("R", json!(10)),
                ("I", json!(10)),
                ("A", json!(10)),
                ("S", json!(10)),
            ],
            1,
        )];

        let picks = select_industries(None, Some("RIAS"), &rows, 4);
        // Only R, I, A count as primary letters.
        assert_eq!(picks[0].score, 30.0);
    }

    #[test]
    fn test_limit_capped_at_four() {
        let rows: Vec<Industry> = (1..=6)
            .map(|i| industry(i, &format!("Industry {}", i), &[], &[], i as usize))
            .collect();
        let picks = select_industries(None, None, &rows, 10);
        assert_eq!(picks.len(), 4);
    }

    #[test]
    fn test_empty_industry_set() {
        let picks = select_industries(Some("INTJ"), None, &[], 4);
        assert!(picks.is_empty());
    }
}
