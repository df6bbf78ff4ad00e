//! Questionnaire catalog: fixed question sets with a process-wide cache
//!
//! Question sets are immutable once loaded. They come from an authoritative
//! source (JSON files by default) and are cached with a time-based expiry so
//! every scoring request does not re-read the source.

use crate::error::{CareerAdvisorError, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::{Arc, RwLock};
use std::time::{Duration, Instant};

/// Holland answer sets must cover exactly this many questions.
pub const HOLLAND_QUESTION_COUNT: usize = 36;

/// MBTI questions in this category collect demographics and are excluded
/// from scoring.
pub const DEMOGRAPHIC_CATEGORY: &str = "Demographic";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TestType {
    #[serde(rename = "HOLLAND")]
    Holland,
    #[serde(rename = "MBTI")]
    Mbti,
}

impl fmt::Display for TestType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TestType::Holland => write!(f, "HOLLAND"),
            TestType::Mbti => write!(f, "MBTI"),
        }
    }
}

impl FromStr for TestType {
    type Err = CareerAdvisorError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_uppercase().as_str() {
            "HOLLAND" => Ok(TestType::Holland),
            "MBTI" => Ok(TestType::Mbti),
            other => Err(CareerAdvisorError::Validation(format!(
                "Unknown test type: {}",
                other
            ))),
        }
    }
}

/// The six RIASEC dimensions, in their fixed tie-break order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HollandDimension {
    R,
    I,
    A,
    S,
    E,
    C,
}

impl HollandDimension {
    pub const ALL: [HollandDimension; 6] = [
        HollandDimension::R,
        HollandDimension::I,
        HollandDimension::A,
        HollandDimension::S,
        HollandDimension::E,
        HollandDimension::C,
    ];

    pub fn letter(&self) -> char {
        match self {
            HollandDimension::R => 'R',
            HollandDimension::I => 'I',
            HollandDimension::A => 'A',
            HollandDimension::S => 'S',
            HollandDimension::E => 'E',
            HollandDimension::C => 'C',
        }
    }
}

/// One point on the Holland rating scale (0..=4).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RatingOption {
    pub value: i32,
    pub text: String,
}

/// A binary choice on an MBTI question; `value` is one dichotomy letter.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChoiceOption {
    pub text: String,
    pub value: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Question {
    pub id: String,
    #[serde(rename = "question")]
    pub text: String,
    /// Holland questions carry the dimension their score feeds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dimension: Option<HollandDimension>,
    /// MBTI questions carry a category; demographic categories are skipped.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<ChoiceOption>,
}

impl Question {
    pub fn is_demographic(&self) -> bool {
        self.category.as_deref() == Some(DEMOGRAPHIC_CATEGORY)
    }
}

/// An ordered, immutable question set for one test type.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuestionSet {
    pub test_type: TestType,
    /// Shared rating scale (Holland only; empty for MBTI).
    #[serde(default)]
    pub rating_options: Vec<RatingOption>,
    pub questions: Vec<Question>,
}

impl QuestionSet {
    /// Questions that participate in scoring.
    pub fn scorable_questions(&self) -> impl Iterator<Item = &Question> {
        self.questions.iter().filter(|q| !q.is_demographic())
    }

    /// The set as presented to a respondent: demographic items removed.
    pub fn for_frontend(&self) -> QuestionSet {
        QuestionSet {
            test_type: self.test_type,
            rating_options: self.rating_options.clone(),
            questions: self
                .questions
                .iter()
                .filter(|q| !q.is_demographic())
                .cloned()
                .collect(),
        }
    }
}

/// Authoritative source of question sets.
#[async_trait]
pub trait QuestionSource: Send + Sync {
    async fn load(&self, test_type: TestType) -> Result<QuestionSet>;
}

/// Loads question sets from JSON files in a data directory
/// (`holland.json`, `mbti.json`).
pub struct FileQuestionSource {
    data_dir: PathBuf,
}

#[derive(Deserialize)]
struct HollandFile {
    #[serde(default)]
    options: Vec<RatingOption>,
    questions: Vec<Question>,
}

impl FileQuestionSource {
    pub fn new(data_dir: PathBuf) -> Self {
        Self { data_dir }
    }

    fn file_path(&self, test_type: TestType) -> PathBuf {
        match test_type {
            TestType::Holland => self.data_dir.join("holland.json"),
            TestType::Mbti => self.data_dir.join("mbti.json"),
        }
    }
}

#[async_trait]
impl QuestionSource for FileQuestionSource {
    async fn load(&self, test_type: TestType) -> Result<QuestionSet> {
        let path = self.file_path(test_type);
        let content = tokio::fs::read_to_string(&path).await.map_err(|e| {
            CareerAdvisorError::NotFound(format!(
                "Question file {} could not be read: {}",
                path.display(),
                e
            ))
        })?;

        match test_type {
            TestType::Holland => {
                let file: HollandFile = serde_json::from_str(&content)?;
                Ok(QuestionSet {
                    test_type,
                    rating_options: file.options,
                    questions: file.questions,
                })
            }
            TestType::Mbti => {
                let questions: Vec<Question> = serde_json::from_str(&content)?;
                Ok(QuestionSet {
                    test_type,
                    rating_options: Vec::new(),
                    questions,
                })
            }
        }
    }
}

struct CacheEntry {
    set: Arc<QuestionSet>,
    loaded_at: Instant,
}

/// Process-wide question cache with time-based expiry.
pub struct QuestionCatalog {
    source: Box<dyn QuestionSource>,
    ttl: Duration,
    cache: RwLock<HashMap<TestType, CacheEntry>>,
}

impl QuestionCatalog {
    pub fn new(source: Box<dyn QuestionSource>, ttl: Duration) -> Self {
        Self {
            source,
            ttl,
            cache: RwLock::new(HashMap::new()),
        }
    }

    /// Get a question set, reloading from the source on cache miss or expiry.
    pub async fn get(&self, test_type: TestType) -> Result<Arc<QuestionSet>> {
        {
            let cache = self.cache.read().expect("catalog cache poisoned");
            if let Some(entry) = cache.get(&test_type) {
                if entry.loaded_at.elapsed() < self.ttl {
                    return Ok(Arc::clone(&entry.set));
                }
            }
        }

        let set = Arc::new(self.source.load(test_type).await?);

        let mut cache = self.cache.write().expect("catalog cache poisoned");
        cache.insert(
            test_type,
            CacheEntry {
                set: Arc::clone(&set),
                loaded_at: Instant::now(),
            },
        );
        Ok(set)
    }

    /// Drop a cached set so the next `get` reloads it.
    pub fn invalidate(&self, test_type: TestType) {
        let mut cache = self.cache.write().expect("catalog cache poisoned");
        cache.remove(&test_type);
    }

    pub fn cache_size(&self) -> usize {
        self.cache.read().expect("catalog cache poisoned").len()
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;

    /// Builds the 36-question Holland set: 6 questions per dimension.
    pub fn holland_question_set() -> QuestionSet {
        let mut questions = Vec::new();
        for dim in HollandDimension::ALL {
            for n in 1..=6 {
                questions.push(Question {
                    id: format!("{}{}", dim.letter().to_lowercase(), n),
                    text: format!("Sample activity {} for {}", n, dim.letter()),
                    dimension: Some(dim),
                    category: None,
                    options: Vec::new(),
                });
            }
        }
        QuestionSet {
            test_type: TestType::Holland,
            rating_options: (0..=4)
                .map(|v| RatingOption {
                    value: v,
                    text: format!("Level {}", v),
                })
                .collect(),
            questions,
        }
    }

    /// A small MBTI set: `per_dichotomy` questions per pair plus one
    /// demographic item.
    pub fn mbti_question_set(per_dichotomy: usize) -> QuestionSet {
        let pairs = [("E", "I"), ("S", "N"), ("T", "F"), ("J", "P")];
        let mut questions = Vec::new();
        for (first, second) in pairs {
            for n in 1..=per_dichotomy {
                questions.push(Question {
                    id: format!("{}{}_{}", first.to_lowercase(), second.to_lowercase(), n),
                    text: format!("Choice {} on {}/{}", n, first, second),
                    dimension: None,
                    category: Some(format!("{}{}", first, second)),
                    options: vec![
                        ChoiceOption {
                            text: format!("Prefer {}", first),
                            value: first.to_string(),
                        },
                        ChoiceOption {
                            text: format!("Prefer {}", second),
                            value: second.to_string(),
                        },
                    ],
                });
            }
        }
        questions.push(Question {
            id: "demo_1".to_string(),
            text: "Your age range".to_string(),
            dimension: None,
            category: Some(DEMOGRAPHIC_CATEGORY.to_string()),
            options: Vec::new(),
        });
        QuestionSet {
            test_type: TestType::Mbti,
            rating_options: Vec::new(),
            questions,
        }
    }
}
