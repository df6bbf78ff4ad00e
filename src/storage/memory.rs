//! In-memory store backing the CLI and the test suite
//!
//! Each table is a map behind its own `RwLock`; upserts are atomic per
//! table. Catalog tables can be seeded from JSON files in a data directory.

use super::{
    AssessmentRecord, AssessmentStore, Career, CareerStore, Course, CourseStore, Industry,
    IndustryStore, KnowledgeSnippet, KnowledgeStore, LearningPath, LearningPathStore, ProfileStore,
    Recommendation, RecommendationStore, UserProfile,
};
use crate::catalog::TestType;
use crate::error::{CareerAdvisorError, Result};
use async_trait::async_trait;
use std::collections::HashMap;
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::RwLock;

#[derive(Default)]
pub struct InMemoryStore {
    assessments: RwLock<Vec<AssessmentRecord>>,
    profiles: RwLock<HashMap<String, UserProfile>>,
    industries: RwLock<HashMap<i64, Industry>>,
    careers: RwLock<HashMap<i64, Career>>,
    courses: RwLock<HashMap<i64, Course>>,
    snippets: RwLock<HashMap<(String, String), KnowledgeSnippet>>,
    recommendations: RwLock<HashMap<(String, i64), Recommendation>>,
    paths: RwLock<HashMap<u64, LearningPath>>,
    next_path_id: AtomicU64,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self {
            next_path_id: AtomicU64::new(1),
            ..Default::default()
        }
    }

    /// Seed catalog tables from JSON files in `dir`. Every file is optional:
    /// `industries.json`, `careers.json`, `courses.json`, `knowledge.json`,
    /// `profiles.json`.
    pub fn load_from_dir(dir: &Path) -> Result<Self> {
        let store = Self::new();

        if let Some(industries) = read_json_vec::<Industry>(&dir.join("industries.json"))? {
            let mut table = store.industries.write().expect("industries poisoned");
            for row in industries {
                table.insert(row.id, row);
            }
        }
        if let Some(careers) = read_json_vec::<Career>(&dir.join("careers.json"))? {
            let mut table = store.careers.write().expect("careers poisoned");
            for row in careers {
                table.insert(row.id, row);
            }
        }
        if let Some(courses) = read_json_vec::<Course>(&dir.join("courses.json"))? {
            let mut table = store.courses.write().expect("courses poisoned");
            for row in courses {
                table.insert(row.id, row);
            }
        }
        if let Some(snippets) = read_json_vec::<KnowledgeSnippet>(&dir.join("knowledge.json"))? {
            let mut table = store.snippets.write().expect("snippets poisoned");
            for row in snippets {
                table.insert((row.content_type.clone(), row.reference_id.clone()), row);
            }
        }
        if let Some(profiles) = read_json_vec::<UserProfile>(&dir.join("profiles.json"))? {
            let mut table = store.profiles.write().expect("profiles poisoned");
            for row in profiles {
                table.insert(row.user_id.clone(), row);
            }
        }

        Ok(store)
    }

    pub fn insert_industry(&self, industry: Industry) {
        let mut table = self.industries.write().expect("industries poisoned");
        table.insert(industry.id, industry);
    }

    pub fn insert_career(&self, career: Career) {
        let mut table = self.careers.write().expect("careers poisoned");
        table.insert(career.id, career);
    }

    pub fn insert_course(&self, course: Course) {
        let mut table = self.courses.write().expect("courses poisoned");
        table.insert(course.id, course);
    }

    pub fn recommendation_count(&self) -> usize {
        self.recommendations
            .read()
            .expect("recommendations poisoned")
            .len()
    }

    pub fn path_count(&self) -> usize {
        self.paths.read().expect("paths poisoned").len()
    }
}

fn read_json_vec<T: serde::de::DeserializeOwned>(path: &Path) -> Result<Option<Vec<T>>> {
    if !path.exists() {
        return Ok(None);
    }
    let content = std::fs::read_to_string(path)?;
    let rows: Vec<T> = serde_json::from_str(&content)?;
    Ok(Some(rows))
}

#[async_trait]
impl AssessmentStore for InMemoryStore {
    async fn save_result(&self, record: AssessmentRecord) -> Result<()> {
        let mut table = self.assessments.write().expect("assessments poisoned");
        table.push(record);
        Ok(())
    }

    async fn latest_by_type(
        &self,
        user_id: &str,
        test_type: TestType,
    ) -> Result<Option<AssessmentRecord>> {
        let table = self.assessments.read().expect("assessments poisoned");
        Ok(table
            .iter()
            .filter(|r| r.user_id == user_id && r.test_type == test_type)
            .max_by_key(|r| r.taken_at)
            .cloned())
    }
}

#[async_trait]
impl ProfileStore for InMemoryStore {
    async fn get_profile(&self, user_id: &str) -> Result<Option<UserProfile>> {
        let table = self.profiles.read().expect("profiles poisoned");
        Ok(table.get(user_id).cloned())
    }

    async fn upsert_profile(&self, profile: UserProfile) -> Result<()> {
        let mut table = self.profiles.write().expect("profiles poisoned");
        table.insert(profile.user_id.clone(), profile);
        Ok(())
    }

    async fn set_profile_vector(&self, user_id: &str, vector: Option<Vec<f32>>) -> Result<()> {
        let mut table = self.profiles.write().expect("profiles poisoned");
        let profile = table.get_mut(user_id).ok_or_else(|| {
            CareerAdvisorError::NotFound(format!("Profile not found: {}", user_id))
        })?;
        profile.vector_updated_at = Some(chrono::Utc::now());
        profile.profile_vector = vector;
        Ok(())
    }
}

#[async_trait]
impl IndustryStore for InMemoryStore {
    async fn all_industries(&self) -> Result<Vec<Industry>> {
        let careers = self.careers.read().expect("careers poisoned");
        let mut counts: HashMap<i64, usize> = HashMap::new();
        for career in careers.values() {
            *counts.entry(career.industry_id).or_insert(0) += 1;
        }
        drop(careers);

        let table = self.industries.read().expect("industries poisoned");
        let mut rows: Vec<Industry> = table
            .values()
            .map(|row| {
                let mut row = row.clone();
                row.career_count = counts.get(&row.id).copied().unwrap_or(0);
                row
            })
            .collect();
        rows.sort_by_key(|r| r.id);
        Ok(rows)
    }
}

#[async_trait]
impl CareerStore for InMemoryStore {
    async fn careers_in_industries(&self, industry_ids: &[i64]) -> Result<Vec<Career>> {
        let table = self.careers.read().expect("careers poisoned");
        let mut rows: Vec<Career> = table
            .values()
            .filter(|c| industry_ids.contains(&c.industry_id))
            .cloned()
            .collect();
        rows.sort_by_key(|c| c.id);
        Ok(rows)
    }

    async fn get_career(&self, id: i64) -> Result<Option<Career>> {
        let table = self.careers.read().expect("careers poisoned");
        Ok(table.get(&id).cloned())
    }

    async fn all_careers(&self) -> Result<Vec<Career>> {
        let table = self.careers.read().expect("careers poisoned");
        let mut rows: Vec<Career> = table.values().cloned().collect();
        rows.sort_by_key(|c| c.id);
        Ok(rows)
    }

    async fn careers_missing_vectors(&self) -> Result<Vec<Career>> {
        let table = self.careers.read().expect("careers poisoned");
        let mut rows: Vec<Career> = table
            .values()
            .filter(|c| c.vector.is_none())
            .cloned()
            .collect();
        rows.sort_by_key(|c| c.id);
        Ok(rows)
    }

    async fn set_career_vector(&self, id: i64, vector: Vec<f32>) -> Result<()> {
        let mut table = self.careers.write().expect("careers poisoned");
        let career = table
            .get_mut(&id)
            .ok_or_else(|| CareerAdvisorError::NotFound(format!("Career not found: {}", id)))?;
        career.vector = Some(vector);
        Ok(())
    }
}

#[async_trait]
impl CourseStore for InMemoryStore {
    async fn all_courses(&self) -> Result<Vec<Course>> {
        let table = self.courses.read().expect("courses poisoned");
        let mut rows: Vec<Course> = table.values().cloned().collect();
        rows.sort_by_key(|c| c.id);
        Ok(rows)
    }

    async fn courses_missing_vectors(&self) -> Result<Vec<Course>> {
        let table = self.courses.read().expect("courses poisoned");
        let mut rows: Vec<Course> = table
            .values()
            .filter(|c| c.vector.is_none())
            .cloned()
            .collect();
        rows.sort_by_key(|c| c.id);
        Ok(rows)
    }

    async fn set_course_vector(&self, id: i64, vector: Vec<f32>) -> Result<()> {
        let mut table = self.courses.write().expect("courses poisoned");
        let course = table
            .get_mut(&id)
            .ok_or_else(|| CareerAdvisorError::NotFound(format!("Course not found: {}", id)))?;
        course.vector = Some(vector);
        Ok(())
    }
}

#[async_trait]
impl KnowledgeStore for InMemoryStore {
    async fn all_snippets(&self) -> Result<Vec<KnowledgeSnippet>> {
        let table = self.snippets.read().expect("snippets poisoned");
        let mut rows: Vec<KnowledgeSnippet> = table.values().cloned().collect();
        rows.sort_by(|a, b| {
            (a.content_type.as_str(), a.reference_id.as_str())
                .cmp(&(b.content_type.as_str(), b.reference_id.as_str()))
        });
        Ok(rows)
    }

    async fn has_snippet(&self, content_type: &str, reference_id: &str) -> Result<bool> {
        let table = self.snippets.read().expect("snippets poisoned");
        Ok(table.contains_key(&(content_type.to_string(), reference_id.to_string())))
    }

    async fn upsert_snippet(&self, snippet: KnowledgeSnippet) -> Result<()> {
        let mut table = self.snippets.write().expect("snippets poisoned");
        table.insert(
            (snippet.content_type.clone(), snippet.reference_id.clone()),
            snippet,
        );
        Ok(())
    }
}

#[async_trait]
impl RecommendationStore for InMemoryStore {
    async fn upsert_recommendation(&self, rec: Recommendation) -> Result<()> {
        let mut table = self
            .recommendations
            .write()
            .expect("recommendations poisoned");
        table.insert((rec.user_id.clone(), rec.career_id), rec);
        Ok(())
    }

    async fn recommendations_for_user(&self, user_id: &str) -> Result<Vec<Recommendation>> {
        let table = self
            .recommendations
            .read()
            .expect("recommendations poisoned");
        let mut rows: Vec<Recommendation> = table
            .values()
            .filter(|r| r.user_id == user_id)
            .cloned()
            .collect();
        rows.sort_by_key(|r| r.career_id);
        Ok(rows)
    }
}

#[async_trait]
impl LearningPathStore for InMemoryStore {
    async fn insert_path(&self, mut path: LearningPath) -> Result<LearningPath> {
        path.id = self.next_path_id.fetch_add(1, Ordering::SeqCst);
        let mut table = self.paths.write().expect("paths poisoned");
        table.insert(path.id, path.clone());
        Ok(path)
    }

    async fn find_in_progress(
        &self,
        user_id: &str,
        career_id: i64,
    ) -> Result<Option<LearningPath>> {
        let table = self.paths.read().expect("paths poisoned");
        Ok(table
            .values()
            .find(|p| {
                p.user_id == user_id
                    && p.career_id == career_id
                    && p.status == super::PathStatus::InProgress
            })
            .cloned())
    }

    async fn get_path(&self, id: u64) -> Result<Option<LearningPath>> {
        let table = self.paths.read().expect("paths poisoned");
        Ok(table.get(&id).cloned())
    }

    async fn set_item_completed(
        &self,
        path_id: u64,
        order_index: usize,
        is_completed: bool,
    ) -> Result<f32> {
        let mut table = self.paths.write().expect("paths poisoned");
        let path = table.get_mut(&path_id).ok_or_else(|| {
            CareerAdvisorError::NotFound(format!("Learning path not found: {}", path_id))
        })?;
        let item = path
            .items
            .iter_mut()
            .find(|i| i.order_index == order_index)
            .ok_or_else(|| {
                CareerAdvisorError::NotFound(format!(
                    "Learning path item not found: path {} item {}",
                    path_id, order_index
                ))
            })?;
        item.is_completed = is_completed;
        Ok(path.progress_percentage())
    }
}
