//! CLI interface for the career advisor

use crate::catalog::TestType;
use crate::error::{CareerAdvisorError, Result};
use crate::scoring::AnswerSet;
use clap::{Parser, Subcommand};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::str::FromStr;

#[derive(Parser)]
#[command(name = "career-advisor")]
#[command(about = "Career, industry and learning-path recommendations from assessments and profile embeddings")]
#[command(long_about = "Score Holland/MBTI assessments, rank careers and courses against a profile embedding, and draft learning paths. Runs against a JSON data directory; provider-backed steps degrade gracefully when no provider is configured.")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Data directory with question sets and catalog JSON files
    #[arg(short, long, global = true)]
    pub data_dir: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Print the question set for a test type (demographics excluded)
    Questions {
        /// Test type: holland or mbti
        test_type: String,
    },

    /// Score an answer file and store the result
    Score {
        /// Test type: holland or mbti
        test_type: String,

        /// JSON file mapping question id to answer
        #[arg(short, long)]
        answers: PathBuf,

        /// User the result belongs to
        #[arg(short, long, default_value = "local")]
        user: String,
    },

    /// Generate career advice and learning-path drafts
    Recommend {
        /// User to advise
        #[arg(short, long, default_value = "local")]
        user: String,

        /// Learning paths to produce (clamped to 2-3)
        #[arg(long, default_value_t = 3)]
        paths: usize,

        /// Courses per path (clamped to 3-10)
        #[arg(long, default_value_t = 6)]
        courses_per_path: usize,
    },

    /// Build the retrieval context block for a chat query
    Rag {
        /// Free-text query
        query: String,
    },

    /// Backfill missing catalog embeddings in batches
    Backfill {
        /// Re-embed rows that already have vectors
        #[arg(long)]
        re_embed: bool,
    },

    /// Show configuration
    Config {
        #[command(subcommand)]
        action: Option<ConfigAction>,
    },
}

#[derive(Subcommand)]
pub enum ConfigAction {
    /// Show current configuration
    Show,

    /// Reset configuration to defaults
    Reset,
}

/// Parse a test type argument.
pub fn parse_test_type(raw: &str) -> Result<TestType> {
    TestType::from_str(raw)
        .map_err(|_| CareerAdvisorError::InvalidInput(format!("Unknown test type: {}", raw)))
}

/// Read an answers file into the matching answer-set shape.
///
/// Holland files map question id to an integer rating; MBTI files map
/// question id to a dichotomy letter.
pub fn parse_answers_file(test_type: TestType, path: &Path) -> Result<AnswerSet> {
    let content = std::fs::read_to_string(path)?;
    match test_type {
        TestType::Holland => {
            let answers: HashMap<String, i32> = serde_json::from_str(&content).map_err(|e| {
                CareerAdvisorError::InvalidInput(format!(
                    "Holland answers must map question ids to integers: {}",
                    e
                ))
            })?;
            Ok(AnswerSet::Holland(answers))
        }
        TestType::Mbti => {
            let answers: HashMap<String, String> =
                serde_json::from_str(&content).map_err(|e| {
                    CareerAdvisorError::InvalidInput(format!(
                        "MBTI answers must map question ids to letters: {}",
                        e
                    ))
                })?;
            Ok(AnswerSet::Mbti(answers))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_parse_test_type() {
        assert_eq!(parse_test_type("holland").unwrap(), TestType::Holland);
        assert_eq!(parse_test_type("MBTI").unwrap(), TestType::Mbti);
        assert!(parse_test_type("disc").is_err());
    }

    #[test]
    fn test_parse_holland_answers() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"r1": 4, "i2": 0}}"#).unwrap();

        let parsed = parse_answers_file(TestType::Holland, file.path()).unwrap();
        match parsed {
            AnswerSet::Holland(answers) => {
                assert_eq!(answers.get("r1"), Some(&4));
                assert_eq!(answers.len(), 2);
            }
            _ => panic!("expected Holland answers"),
        }
    }

    #[test]
    fn test_parse_mbti_answers_rejects_numbers() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"q1": 3}}"#).unwrap();
        assert!(parse_answers_file(TestType::Mbti, file.path()).is_err());
    }
}
