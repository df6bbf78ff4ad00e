//! Domain entities and storage seams
//!
//! The engine never talks to a database directly: everything it reads or
//! writes goes through the async store traits below. An in-memory
//! implementation backs the CLI and the test suite; a real deployment plugs
//! its persistence layer into the same traits. Upserts rely on the store's
//! atomic insert-or-update-by-key primitive, never on engine-side locking.

pub mod memory;

use crate::catalog::TestType;
use crate::error::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

pub use memory::InMemoryStore;

/// One completed assessment, append-only. The latest row per (user, type)
/// is the effective current state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssessmentRecord {
    pub user_id: String,
    pub test_type: TestType,
    pub result_code: String,
    /// Raw summed score per dimension letter or dichotomy pair.
    pub raw_scores: HashMap<String, i32>,
    /// Percentage breakdown matching `raw_scores` keys.
    pub percentages: HashMap<String, f32>,
    pub taken_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SkillEntry {
    pub name: String,
    /// Self-assessed proficiency, 0..=5.
    pub proficiency: u8,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UserProfile {
    pub user_id: String,
    #[serde(default)]
    pub job_title: Option<String>,
    #[serde(default)]
    pub education_level: Option<String>,
    #[serde(default)]
    pub bio: Option<String>,
    #[serde(default)]
    pub skills: Vec<SkillEntry>,
    #[serde(default)]
    pub interests: Vec<String>,
    #[serde(default)]
    pub mbti_code: Option<String>,
    #[serde(default)]
    pub holland_code: Option<String>,
    /// Best-effort embedding of the profile facts; regenerated, not versioned.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profile_vector: Option<Vec<f32>>,
    #[serde(default)]
    pub vector_updated_at: Option<DateTime<Utc>>,
}

/// Industry row with its admin-configured score maps. The maps arrive as raw
/// JSON and are sanitized on read, never trusted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Industry {
    pub id: i64,
    pub name: String,
    /// MBTI 4-letter code -> score 0..=100 (unsanitized admin data).
    #[serde(default)]
    pub mbti_map: HashMap<String, serde_json::Value>,
    /// Holland letter -> score 0..=100 (unsanitized admin data).
    #[serde(default)]
    pub holland_map: HashMap<String, serde_json::Value>,
    /// Filled by the store when listing; drives the popularity fallback.
    #[serde(default)]
    pub career_count: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Career {
    pub id: i64,
    pub title: String,
    #[serde(default)]
    pub level: Option<String>,
    #[serde(default)]
    pub description: String,
    pub industry_id: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vector: Option<Vec<f32>>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Course {
    pub id: i64,
    pub title: String,
    #[serde(default)]
    pub provider: Option<String>,
    #[serde(default)]
    pub level: Option<String>,
    #[serde(default)]
    pub duration_hours: Option<u32>,
    #[serde(default)]
    pub price: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vector: Option<Vec<f32>>,
    pub created_at: DateTime<Utc>,
}

/// RAG knowledge row, unique per (content_type, reference_id).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KnowledgeSnippet {
    pub content_type: String,
    pub reference_id: String,
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vector: Option<Vec<f32>>,
    #[serde(default)]
    pub metadata: HashMap<String, String>,
    pub created_at: DateTime<Utc>,
}

/// A saved career recommendation, unique per (user, career). Re-saving
/// updates score and reasoning in place.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Recommendation {
    pub user_id: String,
    pub career_id: i64,
    /// Blended match score in [0, 1].
    pub match_score: f32,
    pub reasoning: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PathStatus {
    Suggested,
    InProgress,
    Completed,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LearningPathItem {
    pub order_index: usize,
    /// Phase title this item belongs to.
    pub phase: String,
    /// Either a catalog course or a free-text custom task.
    #[serde(default)]
    pub course_id: Option<i64>,
    #[serde(default)]
    pub custom_task: Option<String>,
    #[serde(default)]
    pub estimated_hours: Option<u32>,
    #[serde(default)]
    pub is_completed: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LearningPath {
    pub id: u64,
    pub user_id: String,
    pub career_id: i64,
    pub title: String,
    pub summary: String,
    pub status: PathStatus,
    pub items: Vec<LearningPathItem>,
    pub created_at: DateTime<Utc>,
}

impl LearningPath {
    /// Share of completed items, 0..=100. Recomputed from item state, never
    /// stored.
    pub fn progress_percentage(&self) -> f32 {
        if self.items.is_empty() {
            return 0.0;
        }
        let done = self.items.iter().filter(|i| i.is_completed).count();
        (done as f32 / self.items.len() as f32) * 100.0
    }
}

#[async_trait]
pub trait AssessmentStore: Send + Sync {
    async fn save_result(&self, record: AssessmentRecord) -> Result<()>;
    async fn latest_by_type(
        &self,
        user_id: &str,
        test_type: TestType,
    ) -> Result<Option<AssessmentRecord>>;
}

#[async_trait]
pub trait ProfileStore: Send + Sync {
    async fn get_profile(&self, user_id: &str) -> Result<Option<UserProfile>>;
    async fn upsert_profile(&self, profile: UserProfile) -> Result<()>;
    /// Overwrite just the cached vector; last writer wins.
    async fn set_profile_vector(&self, user_id: &str, vector: Option<Vec<f32>>) -> Result<()>;
}

#[async_trait]
pub trait IndustryStore: Send + Sync {
    /// All industries with `career_count` populated.
    async fn all_industries(&self) -> Result<Vec<Industry>>;
}

#[async_trait]
pub trait CareerStore: Send + Sync {
    async fn careers_in_industries(&self, industry_ids: &[i64]) -> Result<Vec<Career>>;
    async fn get_career(&self, id: i64) -> Result<Option<Career>>;
    async fn all_careers(&self) -> Result<Vec<Career>>;
    async fn careers_missing_vectors(&self) -> Result<Vec<Career>>;
    async fn set_career_vector(&self, id: i64, vector: Vec<f32>) -> Result<()>;
}

#[async_trait]
pub trait CourseStore: Send + Sync {
    async fn all_courses(&self) -> Result<Vec<Course>>;
    async fn courses_missing_vectors(&self) -> Result<Vec<Course>>;
    async fn set_course_vector(&self, id: i64, vector: Vec<f32>) -> Result<()>;
}

#[async_trait]
pub trait KnowledgeStore: Send + Sync {
    async fn all_snippets(&self) -> Result<Vec<KnowledgeSnippet>>;
    async fn has_snippet(&self, content_type: &str, reference_id: &str) -> Result<bool>;
    /// Insert or replace by (content_type, reference_id); never duplicates.
    async fn upsert_snippet(&self, snippet: KnowledgeSnippet) -> Result<()>;
}

#[async_trait]
pub trait RecommendationStore: Send + Sync {
    /// Insert or update by (user, career).
    async fn upsert_recommendation(&self, rec: Recommendation) -> Result<()>;
    async fn recommendations_for_user(&self, user_id: &str) -> Result<Vec<Recommendation>>;
}

#[async_trait]
pub trait LearningPathStore: Send + Sync {
    /// Persist a new path; the store assigns the id.
    async fn insert_path(&self, path: LearningPath) -> Result<LearningPath>;
    async fn find_in_progress(&self, user_id: &str, career_id: i64)
        -> Result<Option<LearningPath>>;
    async fn get_path(&self, id: u64) -> Result<Option<LearningPath>>;
    /// Flip one item's completion flag and return the recomputed path
    /// progress percentage.
    async fn set_item_completed(
        &self,
        path_id: u64,
        order_index: usize,
        is_completed: bool,
    ) -> Result<f32>;
}
