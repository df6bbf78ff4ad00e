//! Assessment submission flow: score, persist, stamp the profile,
//! and suggest industries

use super::{score_holland, score_mbti, ScoreOutcome};
use crate::catalog::{QuestionCatalog, TestType};
use crate::error::Result;
use crate::matching::{select_industries, IndustryPick};
use crate::storage::{
    AssessmentRecord, AssessmentStore, IndustryStore, ProfileStore, UserProfile,
};
use chrono::Utc;
use log::info;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;

/// Raw answers for one submission, keyed by question id.
#[derive(Debug, Clone)]
pub enum AnswerSet {
    /// Rating 0..=4 per question.
    Holland(HashMap<String, i32>),
    /// One dichotomy letter per question.
    Mbti(HashMap<String, String>),
}

impl AnswerSet {
    pub fn test_type(&self) -> TestType {
        match self {
            AnswerSet::Holland(_) => TestType::Holland,
            AnswerSet::Mbti(_) => TestType::Mbti,
        }
    }
}

/// What a submission returns: the scored result plus the industry
/// short-list derived from the user's (possibly updated) result codes.
#[derive(Debug, Clone, Serialize)]
pub struct AssessmentOutcome {
    pub result: ScoreOutcome,
    pub recommended_industries: Vec<IndustryPick>,
}

/// Latest stored result per test type.
#[derive(Debug, Clone, Serialize)]
pub struct TestProfile {
    pub mbti: Option<AssessmentRecord>,
    pub holland: Option<AssessmentRecord>,
}

pub struct AssessmentService {
    catalog: Arc<QuestionCatalog>,
    assessments: Arc<dyn AssessmentStore>,
    profiles: Arc<dyn ProfileStore>,
    industries: Arc<dyn IndustryStore>,
}

impl AssessmentService {
    pub fn new(
        catalog: Arc<QuestionCatalog>,
        assessments: Arc<dyn AssessmentStore>,
        profiles: Arc<dyn ProfileStore>,
        industries: Arc<dyn IndustryStore>,
    ) -> Self {
        Self {
            catalog,
            assessments,
            profiles,
            industries,
        }
    }

    /// Score a submission, persist the result row, stamp the result code on
    /// the user profile, and return the outcome with suggested industries.
    pub async fn score_assessment(
        &self,
        user_id: &str,
        answers: AnswerSet,
    ) -> Result<AssessmentOutcome> {
        let test_type = answers.test_type();
        let set = self.catalog.get(test_type).await?;

        let result = match &answers {
            AnswerSet::Holland(ratings) => score_holland(&set, ratings)?,
            AnswerSet::Mbti(letters) => score_mbti(&set, letters)?,
        };

        let record = AssessmentRecord {
            user_id: user_id.to_string(),
            test_type,
            result_code: result.result_code.clone(),
            raw_scores: result
                .breakdown
                .iter()
                .map(|d| (d.code.clone(), d.score))
                .collect(),
            percentages: result
                .breakdown
                .iter()
                .map(|d| (d.code.clone(), d.percentage))
                .collect(),
            taken_at: Utc::now(),
        };
        self.assessments.save_result(record).await?;

        let mut profile = self
            .profiles
            .get_profile(user_id)
            .await?
            .unwrap_or_else(|| UserProfile {
                user_id: user_id.to_string(),
                ..Default::default()
            });
        match test_type {
            TestType::Holland => profile.holland_code = Some(result.result_code.clone()),
            TestType::Mbti => profile.mbti_code = Some(result.result_code.clone()),
        }
        self.profiles.upsert_profile(profile.clone()).await?;
        info!(
            "Stored {} result {} for user {}",
            test_type, result.result_code, user_id
        );

        let industries = self.industries.all_industries().await?;
        let recommended_industries = select_industries(
            profile.mbti_code.as_deref(),
            profile.holland_code.as_deref(),
            &industries,
            4,
        );

        Ok(AssessmentOutcome {
            result,
            recommended_industries,
        })
    }

    /// Latest stored results for both test types.
    pub async fn test_profile(&self, user_id: &str) -> Result<TestProfile> {
        Ok(TestProfile {
            mbti: self
                .assessments
                .latest_by_type(user_id, TestType::Mbti)
                .await?,
            holland: self
                .assessments
                .latest_by_type(user_id, TestType::Holland)
                .await?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::test_support::{holland_question_set, mbti_question_set};
    use crate::catalog::{QuestionSet, QuestionSource};
    use crate::storage::InMemoryStore;
    use async_trait::async_trait;
    use std::time::Duration;

    struct FixtureSource;

    #[async_trait]
    impl QuestionSource for FixtureSource {
        async fn load(&self, test_type: TestType) -> Result<QuestionSet> {
            Ok(match test_type {
                TestType::Holland => holland_question_set(),
                TestType::Mbti => mbti_question_set(2),
            })
        }
    }

    fn service(store: Arc<InMemoryStore>) -> AssessmentService {
        let catalog = Arc::new(QuestionCatalog::new(
            Box::new(FixtureSource),
            Duration::from_secs(3600),
        ));
        AssessmentService::new(catalog, store.clone(), store.clone(), store)
    }

    #[tokio::test]
    async fn test_submission_persists_and_stamps_profile() {
        let store = Arc::new(InMemoryStore::new());
        let service = service(store.clone());

        let set = holland_question_set();
        let answers: HashMap<String, i32> = set
            .questions
            .iter()
            .map(|q| {
                let score = if q.id.starts_with('r') { 4 } else { 1 };
                (q.id.clone(), score)
            })
            .collect();

        let outcome = service
            .score_assessment("u1", AnswerSet::Holland(answers))
            .await
            .unwrap();
        assert!(outcome.result.result_code.starts_with('R'));

        let stored = store
            .latest_by_type("u1", TestType::Holland)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.result_code, outcome.result.result_code);

        let profile = store.get_profile("u1").await.unwrap().unwrap();
        assert_eq!(profile.holland_code, Some(outcome.result.result_code));
        assert!(profile.mbti_code.is_none());
    }

    #[tokio::test]
    async fn test_second_submission_supersedes_not_mutates() {
        let store = Arc::new(InMemoryStore::new());
        let service = service(store.clone());

        let set = mbti_question_set(2);
        let all_first: HashMap<String, String> = set
            .scorable_questions()
            .map(|q| {
                let letter = q.category.as_ref().unwrap().chars().next().unwrap();
                (q.id.clone(), letter.to_string())
            })
            .collect();
        let all_second: HashMap<String, String> = set
            .scorable_questions()
            .map(|q| {
                let letter = q.category.as_ref().unwrap().chars().nth(1).unwrap();
                (q.id.clone(), letter.to_string())
            })
            .collect();

        service
            .score_assessment("u1", AnswerSet::Mbti(all_first))
            .await
            .unwrap();
        service
            .score_assessment("u1", AnswerSet::Mbti(all_second))
            .await
            .unwrap();

        let latest = store.latest_by_type("u1", TestType::Mbti).await.unwrap();
        assert_eq!(latest.unwrap().result_code, "INFP");
        let profile = store.get_profile("u1").await.unwrap().unwrap();
        assert_eq!(profile.mbti_code.as_deref(), Some("INFP"));
    }

    #[tokio::test]
    async fn test_test_profile_reports_latest_per_type() {
        let store = Arc::new(InMemoryStore::new());
        let service = service(store.clone());

        let profile = service.test_profile("nobody").await.unwrap();
        assert!(profile.mbti.is_none());
        assert!(profile.holland.is_none());
    }
}
