//! Recommendation orchestrator
//!
//! Sequences industry selection, career ranking, course ranking, generative
//! drafting, and persistence for one "generate advice" request. The
//! prerequisite gate is the only hard stop; every later step degrades to an
//! empty or best-effort result so one failing dependency never takes down
//! the whole request.

use super::learning_path::{
    distribute_courses, normalize_phase_title, parse_generated_phases, GeneratedPhase,
};
use super::prompts::{render_learning_path, ActivePrompts, PathPromptParams};
use crate::config::Config;
use crate::error::{CareerAdvisorError, Result};
use crate::matching::{rank_candidates, select_industries, IndustryPick, RankOptions};
use crate::profile::{build_course_query_text, build_profile_text};
use crate::providers::{
    embed_with_timeout, generate_with_timeout, EmbeddingMode, EmbeddingProvider, GenerativeProvider,
};
use crate::storage::{
    Career, CareerStore, Course, CourseStore, IndustryStore, LearningPath, LearningPathItem,
    LearningPathStore, PathStatus, ProfileStore, Recommendation, RecommendationStore, SkillEntry,
    UserProfile,
};
use chrono::Utc;
use log::{info, warn};
use serde::Serialize;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

const MIN_PATHS: usize = 2;
const MAX_PATHS: usize = 3;
const MIN_COURSES_PER_PATH: usize = 3;
const MAX_COURSES_PER_PATH: usize = 10;
const MAX_INDUSTRIES: usize = 4;
/// Careers from industries outside the short-list sink to this rank.
const UNRANKED_INDUSTRY_RANK: usize = 3;

#[derive(Debug, Clone, Copy)]
pub struct AdviceParams {
    /// Learning paths to produce, clamped to 2..=3.
    pub paths: usize,
    /// Courses per path, clamped to 3..=10.
    pub courses_per_path: usize,
}

impl Default for AdviceParams {
    fn default() -> Self {
        Self {
            paths: 3,
            courses_per_path: 6,
        }
    }
}

/// What blocked a request at the prerequisite gate.
#[derive(Debug, Clone, Serialize)]
pub struct MissingInfo {
    pub profile_fields: Vec<String>,
    pub needs_test: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct ProfileSummary {
    pub job_title: Option<String>,
    pub education_level: Option<String>,
    pub mbti_code: Option<String>,
    pub holland_code: Option<String>,
    pub skills: Vec<SkillEntry>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CareerPick {
    pub id: i64,
    pub title: String,
    pub level: Option<String>,
    pub industry_id: i64,
    pub industry_name: Option<String>,
    /// Blended score in [0, 1].
    pub score: f32,
    /// Vector similarity component in [0, 1].
    pub similarity: f32,
}

#[derive(Debug, Clone, Serialize)]
pub struct CourseRef {
    pub id: i64,
    pub title: String,
    pub provider: Option<String>,
    pub level: Option<String>,
    pub duration_hours: Option<u32>,
    pub url: Option<String>,
}

impl From<&Course> for CourseRef {
    fn from(course: &Course) -> Self {
        Self {
            id: course.id,
            title: course.title.clone(),
            provider: course.provider.clone(),
            level: course.level.clone(),
            duration_hours: course.duration_hours,
            url: course.url.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct DraftStep {
    pub order: usize,
    pub course: CourseRef,
}

#[derive(Debug, Clone, Serialize)]
pub struct DraftPhase {
    pub title: String,
    pub description: String,
    pub estimated_hours: Option<u32>,
    pub steps: Vec<DraftStep>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum GenerationStatus {
    Generated,
    Failed { reason: String },
}

/// A suggested (not yet adopted) learning path for one career.
#[derive(Debug, Clone, Serialize)]
pub struct LearningPathDraft {
    pub key: String,
    pub career_id: i64,
    pub career_title: String,
    pub title: String,
    pub summary: String,
    /// Ranked course selection for this path, before phase assignment.
    pub courses: Vec<CourseRef>,
    /// Generated phase structure with courses redistributed; empty when
    /// generation failed.
    pub phases: Vec<DraftPhase>,
    pub generation: GenerationStatus,
}

#[derive(Debug, Clone, Serialize)]
pub struct AdvicePayload {
    pub profile: ProfileSummary,
    pub industries: Vec<IndustryPick>,
    pub careers: Vec<CareerPick>,
    pub learning_paths: Vec<LearningPathDraft>,
}

/// Structured response: either advice, or what is missing. Never a bare
/// error for user-state problems.
#[derive(Debug, Clone, Serialize)]
pub struct AdviceResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub missing: Option<MissingInfo>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub advice: Option<AdvicePayload>,
}

/// Storage seams the orchestrator needs.
pub struct AdvisorStores {
    pub profiles: Arc<dyn ProfileStore>,
    pub industries: Arc<dyn IndustryStore>,
    pub careers: Arc<dyn CareerStore>,
    pub courses: Arc<dyn CourseStore>,
    pub recommendations: Arc<dyn RecommendationStore>,
    pub learning_paths: Arc<dyn LearningPathStore>,
}

pub struct CareerAdvisor {
    config: Config,
    embedder: Arc<dyn EmbeddingProvider>,
    generator: Arc<dyn GenerativeProvider>,
    stores: AdvisorStores,
}

impl CareerAdvisor {
    pub fn new(
        config: Config,
        embedder: Arc<dyn EmbeddingProvider>,
        generator: Arc<dyn GenerativeProvider>,
        stores: AdvisorStores,
    ) -> Self {
        Self {
            config,
            embedder,
            generator,
            stores,
        }
    }

    fn embed_timeout(&self) -> Duration {
        Duration::from_secs(self.config.embedding.request_timeout_secs)
    }

    /// Generate advice for one user: industries, careers, and learning-path
    /// drafts. `prompts` is the configuration resolved for this request.
    pub async fn recommend(
        &self,
        user_id: &str,
        params: AdviceParams,
        prompts: &ActivePrompts,
    ) -> Result<AdviceResponse> {
        let profile = self.stores.profiles.get_profile(user_id).await?;

        // Step 1: hard gate. No provider call happens before this passes.
        if let Some(missing) = Self::missing_prerequisites(profile.as_ref()) {
            return Ok(AdviceResponse {
                success: false,
                message: Some(
                    "Profile is incomplete. Update your profile and finish at least one assessment."
                        .to_string(),
                ),
                missing: Some(missing),
                advice: None,
            });
        }
        let profile = profile.expect("gate checked presence");

        // Step 2: industry short-list.
        let industries = self.stores.industries.all_industries().await?;
        let industry_picks = select_industries(
            profile.mbti_code.as_deref(),
            profile.holland_code.as_deref(),
            &industries,
            MAX_INDUSTRIES,
        );

        // Step 3: careers within selected industries.
        let path_count = params.paths.clamp(MIN_PATHS, MAX_PATHS);
        let career_picks = self
            .rank_careers(&profile, &industry_picks, path_count)
            .await?;

        // Steps 4-6: course ranking and generative drafting per career.
        let courses_per_path = params
            .courses_per_path
            .clamp(MIN_COURSES_PER_PATH, MAX_COURSES_PER_PATH);
        let prompt_config = prompts.resolve();
        let mut learning_paths = Vec::with_capacity(career_picks.len());
        for (index, career) in career_picks.iter().enumerate() {
            let ranked_courses = self
                .rank_courses_for_career(&profile, &career.title, courses_per_path)
                .await?;
            let draft = self
                .draft_learning_path(index, &profile, career, ranked_courses, &prompt_config)
                .await;
            learning_paths.push(draft);
        }

        // Step 7: persist the chosen careers; paths wait for adoption.
        for career in &career_picks {
            let reasoning = match &career.industry_name {
                Some(name) => format!(
                    "Matched via the {} industry with {:.0}% profile similarity.",
                    name,
                    career.similarity * 100.0
                ),
                None => format!(
                    "Matched with {:.0}% profile similarity.",
                    career.similarity * 100.0
                ),
            };
            self.stores
                .recommendations
                .upsert_recommendation(Recommendation {
                    user_id: user_id.to_string(),
                    career_id: career.id,
                    match_score: career.score,
                    reasoning,
                    created_at: Utc::now(),
                })
                .await?;
        }

        info!(
            "Generated advice for {}: {} industries, {} careers, {} paths",
            user_id,
            industry_picks.len(),
            career_picks.len(),
            learning_paths.len()
        );

        Ok(AdviceResponse {
            success: true,
            message: None,
            missing: None,
            advice: Some(AdvicePayload {
                profile: ProfileSummary {
                    job_title: profile.job_title.clone(),
                    education_level: profile.education_level.clone(),
                    mbti_code: profile.mbti_code.clone(),
                    holland_code: profile.holland_code.clone(),
                    skills: profile.skills.clone(),
                },
                industries: industry_picks,
                careers: career_picks,
                learning_paths,
            }),
        })
    }

    fn missing_prerequisites(profile: Option<&UserProfile>) -> Option<MissingInfo> {
        let mut profile_fields = Vec::new();
        let mut needs_test = true;

        match profile {
            Some(profile) => {
                if profile
                    .job_title
                    .as_deref()
                    .map_or(true, |t| t.trim().is_empty())
                {
                    profile_fields.push("job_title".to_string());
                }
                if profile
                    .education_level
                    .as_deref()
                    .map_or(true, |e| e.trim().is_empty())
                {
                    profile_fields.push("education_level".to_string());
                }
                needs_test = profile.mbti_code.is_none() && profile.holland_code.is_none();
            }
            None => {
                profile_fields.push("job_title".to_string());
                profile_fields.push("education_level".to_string());
            }
        }

        if profile_fields.is_empty() && !needs_test {
            None
        } else {
            Some(MissingInfo {
                profile_fields,
                needs_test,
            })
        }
    }

    /// Blend industry rank and vector similarity:
    /// `score = 0.6 * rank_weight + 0.4 * similarity`, rank weight decaying
    /// 0.2 per industry position.
    async fn rank_careers(
        &self,
        profile: &UserProfile,
        industry_picks: &[IndustryPick],
        limit: usize,
    ) -> Result<Vec<CareerPick>> {
        let industry_ids: Vec<i64> = industry_picks.iter().map(|p| p.id).collect();
        if industry_ids.is_empty() {
            return Ok(Vec::new());
        }

        let candidates = self
            .stores
            .careers
            .careers_in_industries(&industry_ids)
            .await?;
        let advice = &self.config.advice;

        let mut picks: Vec<CareerPick> = candidates
            .iter()
            .map(|career| {
                let industry_rank = industry_ids
                    .iter()
                    .position(|id| *id == career.industry_id)
                    .unwrap_or(UNRANKED_INDUSTRY_RANK);
                let rank_weight =
                    (1.0 - advice.industry_rank_decay * industry_rank as f32).max(0.0);

                let similarity = career_similarity(profile, career);
                let score =
                    advice.industry_weight * rank_weight + advice.similarity_weight * similarity;

                CareerPick {
                    id: career.id,
                    title: career.title.clone(),
                    level: career.level.clone(),
                    industry_id: career.industry_id,
                    industry_name: industry_picks
                        .iter()
                        .find(|p| p.id == career.industry_id)
                        .map(|p| p.name.clone()),
                    score,
                    similarity,
                }
            })
            .collect();

        picks.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.title.cmp(&b.title))
        });

        // First-seen-by-score wins on duplicate titles.
        let mut seen: HashSet<String> = HashSet::new();
        picks.retain(|p| seen.insert(p.title.trim().to_lowercase()));

        picks.truncate(limit);
        Ok(picks)
    }

    /// Rank the course catalog for one career. Prefers the stored profile
    /// vector; falls back to embedding the career-specific query text, and
    /// from there to recency ordering when no vector can be obtained.
    async fn rank_courses_for_career(
        &self,
        profile: &UserProfile,
        career_title: &str,
        limit: usize,
    ) -> Result<Vec<Course>> {
        let query_vector = match &profile.profile_vector {
            Some(vector) => Some(vector.clone()),
            None => {
                let query_text = build_course_query_text(profile, Some(career_title));
                embed_with_timeout(
                    &*self.embedder,
                    &query_text,
                    EmbeddingMode::Query,
                    self.embed_timeout(),
                )
                .await
            }
        };

        let candidates = self.stores.courses.all_courses().await?;
        let options = RankOptions {
            distance_threshold: query_vector
                .as_ref()
                .map(|_| self.config.matching.course_distance_threshold),
            limit: Some(limit),
            dedupe_titles: false,
        };
        let ranked = rank_candidates(query_vector.as_deref(), candidates, &options);
        Ok(ranked.into_iter().map(|m| m.item).collect())
    }

    /// Steps 5 and 6: generative drafting plus content repair. A failed
    /// generation produces a draft with empty phases and an explicit failure
    /// status; the ranked courses are always preserved.
    async fn draft_learning_path(
        &self,
        index: usize,
        profile: &UserProfile,
        career: &CareerPick,
        ranked_courses: Vec<Course>,
        prompt_config: &super::prompts::PromptConfig,
    ) -> LearningPathDraft {
        let params = PathPromptParams {
            career_title: career.title.clone(),
            profile_summary: build_profile_text(profile),
            course_titles: ranked_courses.iter().map(|c| c.title.clone()).collect(),
            min_phases: self.config.advice.min_phases,
        };
        let prompt = render_learning_path(prompt_config, &params);

        let generation = match generate_with_timeout(
            &*self.generator,
            &prompt,
            prompt_config.temperature,
            self.embed_timeout(),
        )
        .await
        {
            Some(raw) => parse_generated_phases(&raw, self.config.advice.min_phases),
            None => Err(CareerAdvisorError::DependencyUnavailable(
                "Generative provider returned no output".to_string(),
            )),
        };

        let (phases, status) = match generation {
            Ok(generated) => (
                self.repair_phases(generated, &ranked_courses),
                GenerationStatus::Generated,
            ),
            Err(e) => {
                warn!(
                    "Learning-path generation failed for career '{}': {}",
                    career.title, e
                );
                (
                    Vec::new(),
                    GenerationStatus::Failed {
                        reason: e.to_string(),
                    },
                )
            }
        };

        LearningPathDraft {
            key: format!("path_{}", index + 1),
            career_id: career.id,
            career_title: career.title.clone(),
            title: format!("Learning path for {}", career.title),
            summary: "Suggested from your profile, skills and assessment results.".to_string(),
            courses: ranked_courses.iter().map(CourseRef::from).collect(),
            phases,
            generation: status,
        }
    }

    /// Normalize generated titles and spread the ranked courses across the
    /// phases, remainder first.
    fn repair_phases(
        &self,
        generated: Vec<GeneratedPhase>,
        ranked_courses: &[Course],
    ) -> Vec<DraftPhase> {
        let max_chars = self.config.advice.phase_title_max_chars;
        let buckets = distribute_courses(ranked_courses, generated.len());

        let mut order = 0;
        generated
            .into_iter()
            .zip(buckets)
            .enumerate()
            .map(|(index, (phase, courses))| DraftPhase {
                title: normalize_phase_title(index, &phase.title, max_chars),
                description: phase.description,
                estimated_hours: phase.estimated_hours,
                steps: courses
                    .iter()
                    .map(|course| {
                        order += 1;
                        DraftStep {
                            order,
                            course: CourseRef::from(course),
                        }
                    })
                    .collect(),
            })
            .collect()
    }

    /// Flip one item's completion flag; returns the recomputed path
    /// progress percentage.
    pub async fn toggle_path_item(
        &self,
        path_id: u64,
        order_index: usize,
        is_completed: bool,
    ) -> Result<f32> {
        self.stores
            .learning_paths
            .set_item_completed(path_id, order_index, is_completed)
            .await
    }

    /// Persist a draft the user confirmed. Idempotent per (user, career):
    /// an existing in-progress path for the same career is returned instead
    /// of a duplicate.
    pub async fn adopt_path(&self, user_id: &str, draft: &LearningPathDraft) -> Result<LearningPath> {
        if let Some(existing) = self
            .stores
            .learning_paths
            .find_in_progress(user_id, draft.career_id)
            .await?
        {
            info!(
                "User {} already has an in-progress path for career {}",
                user_id, draft.career_id
            );
            return Ok(existing);
        }

        let mut items = Vec::new();
        if draft.phases.is_empty() {
            for (index, course) in draft.courses.iter().enumerate() {
                items.push(LearningPathItem {
                    order_index: index,
                    phase: "Suggested courses".to_string(),
                    course_id: Some(course.id),
                    custom_task: None,
                    estimated_hours: course.duration_hours,
                    is_completed: false,
                });
            }
        } else {
            let mut index = 0;
            for phase in &draft.phases {
                if phase.steps.is_empty() {
                    items.push(LearningPathItem {
                        order_index: index,
                        phase: phase.title.clone(),
                        course_id: None,
                        custom_task: Some(phase.description.clone()),
                        estimated_hours: phase.estimated_hours,
                        is_completed: false,
                    });
                    index += 1;
                    continue;
                }
                for step in &phase.steps {
                    items.push(LearningPathItem {
                        order_index: index,
                        phase: phase.title.clone(),
                        course_id: Some(step.course.id),
                        custom_task: None,
                        estimated_hours: step.course.duration_hours,
                        is_completed: false,
                    });
                    index += 1;
                }
            }
        }

        self.stores
            .learning_paths
            .insert_path(LearningPath {
                id: 0,
                user_id: user_id.to_string(),
                career_id: draft.career_id,
                title: draft.title.clone(),
                summary: draft.summary.clone(),
                status: PathStatus::InProgress,
                items,
                created_at: Utc::now(),
            })
            .await
    }
}

fn career_similarity(profile: &UserProfile, career: &Career) -> f32 {
    match (&profile.profile_vector, &career.vector) {
        (Some(profile_vector), Some(career_vector)) => {
            match crate::matching::cosine_distance(profile_vector, career_vector) {
                Some(distance) => (1.0 - distance).clamp(0.0, 1.0),
                None => 0.0,
            }
        }
        _ => 0.0,
    }
}
