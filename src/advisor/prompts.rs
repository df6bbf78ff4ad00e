//! Prompt configuration for learning-path drafting
//!
//! The active prompt configuration is resolved once per request and passed
//! into the orchestrator explicitly. `Stored` carries an admin-edited row;
//! `Default` is the built-in template.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PromptConfig {
    pub learning_path_template: String,
    pub temperature: f32,
}

impl Default for PromptConfig {
    fn default() -> Self {
        Self {
            learning_path_template: LEARNING_PATH_TEMPLATE.to_string(),
            temperature: 0.7,
        }
    }
}

/// The prompt configuration in effect for one request.
#[derive(Debug, Clone)]
pub enum ActivePrompts {
    Stored(PromptConfig),
    Default,
}

impl ActivePrompts {
    pub fn resolve(&self) -> PromptConfig {
        match self {
            ActivePrompts::Stored(config) => config.clone(),
            ActivePrompts::Default => PromptConfig::default(),
        }
    }
}

/// Parameters substituted into the learning-path template.
#[derive(Debug, Clone)]
pub struct PathPromptParams {
    pub career_title: String,
    pub profile_summary: String,
    pub course_titles: Vec<String>,
    pub min_phases: usize,
}

pub fn render_learning_path(config: &PromptConfig, params: &PathPromptParams) -> String {
    let course_list = params
        .course_titles
        .iter()
        .map(|t| format!("- {}", t))
        .collect::<Vec<_>>()
        .join("\n");

    config
        .learning_path_template
        .replace("{career}", &params.career_title)
        .replace("{profile}", &params.profile_summary)
        .replace("{courses}", &course_list)
        .replace("{min_phases}", &params.min_phases.to_string())
}

const LEARNING_PATH_TEMPLATE: &str = r#"TASK: Draft a structured learning path toward the target career below.

<TARGET CAREER>
{career}
</TARGET CAREER>

<USER PROFILE>
{profile}
</USER PROFILE>

<AVAILABLE COURSES>
{courses}
</AVAILABLE COURSES>

Respond with a JSON array of at least {min_phases} phases, ordered from
foundation to mastery. Each phase is an object:

[{"title": "short phase name", "description": "what this phase builds and why it comes at this point", "estimated_hours": 40}]

Rules:
- At least {min_phases} phases.
- Phase titles under 10 words, no numbering (numbering is added later).
- Descriptions reference the user's current role and skills where relevant.
- Output the JSON array only, no surrounding commentary."#;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_template_substitution() {
        let config = PromptConfig::default();
        let params = PathPromptParams {
            career_title: "Data Engineer".to_string(),
            profile_summary: "Job Title: Analyst".to_string(),
            course_titles: vec!["SQL Basics".to_string(), "Airflow in Depth".to_string()],
            min_phases: 3,
        };

        let prompt = render_learning_path(&config, &params);
        assert!(prompt.contains("Data Engineer"));
        assert!(prompt.contains("Job Title: Analyst"));
        assert!(prompt.contains("- SQL Basics"));
        assert!(prompt.contains("- Airflow in Depth"));
        assert!(prompt.contains("at least 3 phases"));
    }

    #[test]
    fn test_active_prompts_resolution() {
        let stored = ActivePrompts::Stored(PromptConfig {
            learning_path_template: "custom {career}".to_string(),
            temperature: 0.2,
        });
        assert_eq!(stored.resolve().temperature, 0.2);

        let fallback = ActivePrompts::Default.resolve();
        assert_eq!(fallback.temperature, 0.7);
        assert!(fallback.learning_path_template.contains("{min_phases}"));
    }
}
