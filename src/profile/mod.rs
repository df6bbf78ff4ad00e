//! Profile vector building
//!
//! A profile vector is a best-effort cache of one embedding over the user's
//! structured facts. It is regenerated, never versioned; staleness between
//! regenerations is acceptable and last-writer-wins on concurrent refresh.

pub mod backfill;

pub use backfill::{BackfillReport, CatalogEmbedder, KnowledgeSeed};

use crate::config::EmbeddingConfig;
use crate::error::{CareerAdvisorError, Result};
use crate::providers::{embed_with_timeout, EmbeddingMode, EmbeddingProvider};
use crate::storage::{ProfileStore, UserProfile};
use log::{debug, info};
use std::sync::Arc;
use std::time::Duration;

fn push_fact(parts: &mut Vec<String>, label: &str, value: Option<&str>) {
    if let Some(value) = value {
        let value = value.trim();
        if !value.is_empty() {
            parts.push(format!("{}: {}", label, value));
        }
    }
}

fn skills_line(profile: &UserProfile) -> Option<String> {
    if profile.skills.is_empty() {
        return None;
    }
    Some(
        profile
            .skills
            .iter()
            .map(|s| format!("{} (Level {}/5)", s.name, s.proficiency))
            .collect::<Vec<_>>()
            .join(", "),
    )
}

/// Canonical text the profile vector is computed from. Empty facts are
/// skipped so sparse profiles stay short.
pub fn build_profile_text(profile: &UserProfile) -> String {
    let mut parts = Vec::new();
    push_fact(&mut parts, "Job Title", profile.job_title.as_deref());
    push_fact(&mut parts, "Education", profile.education_level.as_deref());
    push_fact(&mut parts, "Bio", profile.bio.as_deref());
    push_fact(&mut parts, "MBTI", profile.mbti_code.as_deref());
    push_fact(&mut parts, "Holland Code", profile.holland_code.as_deref());
    if let Some(skills) = skills_line(profile) {
        parts.push(format!("Skills: {}", skills));
    }
    if !profile.interests.is_empty() {
        parts.push(format!("Interests: {}", profile.interests.join(", ")));
    }
    parts.join("\n")
}

/// Query text for course ranking: the profile facts with an optional target
/// career prepended.
pub fn build_course_query_text(profile: &UserProfile, career_title: Option<&str>) -> String {
    let mut parts = Vec::new();
    if let Some(title) = career_title {
        let title = title.trim();
        if !title.is_empty() {
            parts.push(format!("Career Target: {}", title));
        }
    }
    push_fact(&mut parts, "Job Title", profile.job_title.as_deref());
    push_fact(&mut parts, "Education", profile.education_level.as_deref());
    if let Some(skills) = skills_line(profile) {
        parts.push(format!("Skills: {}", skills));
    }
    if !profile.interests.is_empty() {
        parts.push(format!("Interests: {}", profile.interests.join(", ")));
    }
    push_fact(&mut parts, "MBTI", profile.mbti_code.as_deref());
    push_fact(&mut parts, "Holland", profile.holland_code.as_deref());
    parts.join("\n")
}

/// Recomputes profile vectors on demand. Callers invoke [`refresh`] after
/// any profile fact changes; there is no event machinery behind it.
///
/// [`refresh`]: ProfileEmbedder::refresh
pub struct ProfileEmbedder {
    provider: Arc<dyn EmbeddingProvider>,
    profiles: Arc<dyn ProfileStore>,
    config: EmbeddingConfig,
}

impl ProfileEmbedder {
    pub fn new(
        provider: Arc<dyn EmbeddingProvider>,
        profiles: Arc<dyn ProfileStore>,
        config: EmbeddingConfig,
    ) -> Self {
        Self {
            provider,
            profiles,
            config,
        }
    }

    /// Recompute and store the vector for one profile. Returns `false` when
    /// the profile text is too sparse to embed or the provider yields
    /// nothing; an existing vector is left in place in both cases.
    pub async fn refresh(&self, user_id: &str) -> Result<bool> {
        let profile = self.profiles.get_profile(user_id).await?.ok_or_else(|| {
            CareerAdvisorError::NotFound(format!("Profile not found: {}", user_id))
        })?;

        let text = build_profile_text(&profile);
        if text.len() < self.config.min_profile_chars {
            debug!(
                "Skipping vector refresh for {}: profile text too sparse",
                user_id
            );
            return Ok(false);
        }

        let timeout = Duration::from_secs(self.config.request_timeout_secs);
        match embed_with_timeout(&*self.provider, &text, EmbeddingMode::Document, timeout).await {
            Some(vector) => {
                self.profiles
                    .set_profile_vector(user_id, Some(vector))
                    .await?;
                info!("Refreshed profile vector for {}", user_id);
                Ok(true)
            }
            None => Ok(false),
        }
    }
}
