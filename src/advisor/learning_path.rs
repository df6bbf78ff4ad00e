//! Generated learning-path extraction and repair
//!
//! Generative output is untrusted: the structured payload may be wrapped in
//! code fences or prose, phase titles arrive in arbitrary shapes, and the
//! model cites whatever courses it likes. This module extracts the payload
//! permissively, then repairs the result against the ranked course list.
//! When nothing salvageable comes back, the failure is reported as such —
//! fabricated phases are never substituted.

use crate::error::{CareerAdvisorError, Result};
use crate::storage::Course;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::OnceLock;

/// One phase as produced by the generative model.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneratedPhase {
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub estimated_hours: Option<u32>,
}

#[derive(Deserialize)]
struct PhaseWrapper {
    phases: Vec<GeneratedPhase>,
}

fn fence_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"```json\s*|```").expect("valid fence regex"))
}

fn phase_prefix_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)^phase\s*\d+\s*[:.\-]\s*").expect("valid prefix regex"))
}

/// Strip markdown code fences around a generated payload.
pub fn strip_code_fences(raw: &str) -> String {
    fence_regex().replace_all(raw, "").trim().to_string()
}

/// Permissive bracket scan: the slice from the first opening bracket to the
/// last matching closing bracket, array form preferred.
pub fn extract_json_payload(raw: &str) -> Option<&str> {
    if let (Some(start), Some(end)) = (raw.find('['), raw.rfind(']')) {
        if start < end {
            return Some(&raw[start..=end]);
        }
    }
    if let (Some(start), Some(end)) = (raw.find('{'), raw.rfind('}')) {
        if start < end {
            return Some(&raw[start..=end]);
        }
    }
    None
}

fn parse_phase_list(text: &str) -> Option<Vec<GeneratedPhase>> {
    serde_json::from_str::<Vec<GeneratedPhase>>(text)
        .ok()
        .or_else(|| {
            serde_json::from_str::<PhaseWrapper>(text)
                .ok()
                .map(|w| w.phases)
        })
}

/// Extract the generated phase list from raw model output.
///
/// Tries a direct parse after fence stripping, then retries on the
/// bracket-scanned slice. Fewer than `min_phases` phases (or no parseable
/// payload at all) is a generation failure.
pub fn parse_generated_phases(raw: &str, min_phases: usize) -> Result<Vec<GeneratedPhase>> {
    let cleaned = strip_code_fences(raw);

    let phases = parse_phase_list(&cleaned).or_else(|| {
        extract_json_payload(&cleaned).and_then(parse_phase_list)
    });

    match phases {
        Some(phases) if phases.len() >= min_phases => Ok(phases),
        Some(phases) => Err(CareerAdvisorError::Generation(format!(
            "Generated path has {} phases, expected at least {}",
            phases.len(),
            min_phases
        ))),
        None => Err(CareerAdvisorError::Generation(
            "No structured learning path found in generated output".to_string(),
        )),
    }
}

/// Normalize a generated phase title to `Phase {n}: {text}` with a length
/// cap. Any numbering the model added itself is stripped first.
pub fn normalize_phase_title(index: usize, raw: &str, max_chars: usize) -> String {
    let stripped = phase_prefix_regex().replace(raw.trim(), "");
    let body = stripped.trim();
    let body = if body.is_empty() { "Learning goals" } else { body };

    let title = format!("Phase {}: {}", index + 1, body);
    if title.chars().count() > max_chars {
        title.chars().take(max_chars).collect()
    } else {
        title
    }
}

/// Split ranked courses across `phase_count` phases by even division.
///
/// The remainder goes to earlier phases, and a course whose trimmed title
/// repeats one already placed in this path is skipped so a path never cites
/// the same course twice.
pub fn distribute_courses(courses: &[Course], phase_count: usize) -> Vec<Vec<Course>> {
    if phase_count == 0 {
        return Vec::new();
    }

    let mut seen: HashSet<String> = HashSet::new();
    let unique: Vec<&Course> = courses
        .iter()
        .filter(|c| seen.insert(c.title.trim().to_lowercase()))
        .collect();

    let base = unique.len() / phase_count;
    let remainder = unique.len() % phase_count;

    let mut phases = Vec::with_capacity(phase_count);
    let mut cursor = 0;
    for phase_index in 0..phase_count {
        let take = base + usize::from(phase_index < remainder);
        phases.push(
            unique[cursor..cursor + take]
                .iter()
                .map(|c| (*c).clone())
                .collect(),
        );
        cursor += take;
    }
    phases
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn course(id: i64, title: &str) -> Course {
        Course {
            id,
            title: title.to_string(),
            provider: None,
            level: None,
            duration_hours: None,
            price: None,
            url: None,
            description: String::new(),
            vector: None,
            created_at: Utc::now(),
        }
    }

    const VALID_PAYLOAD: &str = r#"[
        {"title": "Foundations", "description": "Core concepts", "estimated_hours": 20},
        {"title": "Applied work", "description": "Projects"},
        {"title": "Mastery", "description": "Advanced topics", "estimated_hours": 60}
    ]"#;

    #[test]
    fn test_parse_plain_json() {
        let phases = parse_generated_phases(VALID_PAYLOAD, 3).unwrap();
        assert_eq!(phases.len(), 3);
        assert_eq!(phases[0].title, "Foundations");
        assert_eq!(phases[0].estimated_hours, Some(20));
        assert_eq!(phases[1].estimated_hours, None);
    }

    #[test]
    fn test_parse_fenced_json() {
        let raw = format!("```json\n{}\n```", VALID_PAYLOAD);
        let phases = parse_generated_phases(&raw, 3).unwrap();
        assert_eq!(phases.len(), 3);
    }

    #[test]
    fn test_parse_json_wrapped_in_prose() {
        let raw = format!(
            "Sure! Here is the learning path you asked for:\n\n{}\n\nGood luck with your studies.",
            VALID_PAYLOAD
        );
        let phases = parse_generated_phases(&raw, 3).unwrap();
        assert_eq!(phases.len(), 3);
    }

    #[test]
    fn test_parse_object_with_phases_key() {
        let raw = format!("{{\"phases\": {}}}", VALID_PAYLOAD);
        let phases = parse_generated_phases(&raw, 3).unwrap();
        assert_eq!(phases.len(), 3);
    }

    #[test]
    fn test_too_few_phases_is_generation_failure() {
        let raw = r#"[{"title": "Only one", "description": ""}]"#;
        let err = parse_generated_phases(raw, 3).unwrap_err();
        assert!(matches!(err, CareerAdvisorError::Generation(_)));
    }

    #[test]
    fn test_unparseable_output_is_generation_failure() {
        let err = parse_generated_phases("I cannot help with that.", 3).unwrap_err();
        assert!(matches!(err, CareerAdvisorError::Generation(_)));
    }

    #[test]
    fn test_title_normalization() {
        assert_eq!(
            normalize_phase_title(0, "  Foundations ", 80),
            "Phase 1: Foundations"
        );
        // Model-added numbering is stripped before renumbering.
        assert_eq!(
            normalize_phase_title(1, "Phase 4: Applied work", 80),
            "Phase 2: Applied work"
        );
        assert_eq!(normalize_phase_title(2, "", 80), "Phase 3: Learning goals");
    }

    #[test]
    fn test_title_length_cap() {
        let long = "a very long generated phase title that keeps going and going".repeat(3);
        let title = normalize_phase_title(0, &long, 40);
        assert_eq!(title.chars().count(), 40);
        assert!(title.starts_with("Phase 1: "));
    }

    #[test]
    fn test_course_distribution_even_with_remainder() {
        let courses: Vec<Course> = (1..=7)
            .map(|i| course(i, &format!("Course {}", i)))
            .collect();
        let phases = distribute_courses(&courses, 3);

        let sizes: Vec<usize> = phases.iter().map(|p| p.len()).collect();
        assert_eq!(sizes, vec![3, 2, 2]);
        assert_eq!(phases[0][0].title, "Course 1");
        assert_eq!(phases[2][1].title, "Course 7");
    }

    #[test]
    fn test_course_distribution_skips_duplicate_titles() {
        let courses = vec![
            course(1, "Rust Fundamentals"),
            course(2, "rust fundamentals "),
            course(3, "Async Rust"),
            course(4, "Systems Design"),
        ];
        let phases = distribute_courses(&courses, 3);

        let total: usize = phases.iter().map(|p| p.len()).sum();
        assert_eq!(total, 3);
        assert!(phases
            .iter()
            .flatten()
            .all(|c| c.id != 2));
    }

    #[test]
    fn test_more_phases_than_courses() {
        let courses = vec![course(1, "Solo Course")];
        let phases = distribute_courses(&courses, 3);
        assert_eq!(phases.len(), 3);
        assert_eq!(phases[0].len(), 1);
        assert!(phases[1].is_empty());
        assert!(phases[2].is_empty());
    }
}
