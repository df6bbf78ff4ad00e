//! Batched embedding backfill for catalog entities
//!
//! External providers rate-limit aggressively, so backfill jobs run in
//! bounded batches with an inter-batch pause. One failing item never aborts
//! the rest of the job; the report tallies what happened.

use crate::config::EmbeddingConfig;
use crate::error::Result;
use crate::providers::{embed_with_timeout, EmbeddingMode, EmbeddingProvider};
use crate::storage::{Career, CareerStore, Course, CourseStore, KnowledgeSnippet, KnowledgeStore};
use chrono::Utc;
use log::{info, warn};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize)]
pub struct BackfillReport {
    pub total: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub skipped: usize,
}

/// Raw knowledge content to embed and upsert, keyed by
/// (content_type, reference_id).
#[derive(Debug, Clone)]
pub struct KnowledgeSeed {
    pub content_type: String,
    pub reference_id: String,
    pub text: String,
    pub metadata: HashMap<String, String>,
}

/// Embedding text for a course: labeled fields joined with " | ".
pub fn course_embedding_text(course: &Course) -> String {
    let mut parts = vec![format!("Title: {}", course.title)];
    if let Some(provider) = &course.provider {
        parts.push(format!("Provider: {}", provider));
    }
    if !course.description.is_empty() {
        parts.push(format!("Description: {}", course.description));
    }
    if let Some(url) = &course.url {
        parts.push(format!("URL: {}", url));
    }
    if let Some(price) = &course.price {
        parts.push(format!("Price: {}", price));
    }
    if let Some(hours) = course.duration_hours {
        parts.push(format!("Duration: {} hours", hours));
    }
    if let Some(level) = &course.level {
        parts.push(format!("Level: {}", level));
    }
    parts.join(" | ")
}

/// Embedding text for a career.
pub fn career_embedding_text(career: &Career) -> String {
    let mut parts = vec![format!("Title: {}", career.title)];
    if let Some(level) = &career.level {
        parts.push(format!("Level: {}", level));
    }
    if !career.description.is_empty() {
        parts.push(format!("Description: {}", career.description));
    }
    parts.join(" | ")
}

fn normalize_text(text: &str) -> String {
    text.replace('\n', " ").trim().to_string()
}

pub struct CatalogEmbedder {
    provider: Arc<dyn EmbeddingProvider>,
    careers: Arc<dyn CareerStore>,
    courses: Arc<dyn CourseStore>,
    knowledge: Arc<dyn KnowledgeStore>,
    config: EmbeddingConfig,
}

impl CatalogEmbedder {
    pub fn new(
        provider: Arc<dyn EmbeddingProvider>,
        careers: Arc<dyn CareerStore>,
        courses: Arc<dyn CourseStore>,
        knowledge: Arc<dyn KnowledgeStore>,
        config: EmbeddingConfig,
    ) -> Self {
        Self {
            provider,
            careers,
            courses,
            knowledge,
            config,
        }
    }

    fn timeout(&self) -> Duration {
        Duration::from_secs(self.config.request_timeout_secs)
    }

    async fn pause_between_batches(&self, batch_index: usize, batch_count: usize) {
        if batch_index + 1 < batch_count && self.config.batch_delay_secs > 0 {
            tokio::time::sleep(Duration::from_secs(self.config.batch_delay_secs)).await;
        }
    }

    /// Embed courses that have no vector yet (all of them with `re_embed`).
    pub async fn backfill_courses(&self, re_embed: bool) -> Result<BackfillReport> {
        let rows = if re_embed {
            self.courses.all_courses().await?
        } else {
            self.courses.courses_missing_vectors().await?
        };

        let mut report = BackfillReport {
            total: rows.len(),
            ..Default::default()
        };
        if rows.is_empty() {
            return Ok(report);
        }

        let batches: Vec<&[Course]> = rows.chunks(self.config.batch_size).collect();
        let batch_count = batches.len();
        info!(
            "Backfilling {} courses in {} batches",
            report.total, batch_count
        );

        for (batch_index, batch) in batches.into_iter().enumerate() {
            for course in batch {
                let text = normalize_text(&course_embedding_text(course));
                match embed_with_timeout(
                    &*self.provider,
                    &text,
                    EmbeddingMode::Document,
                    self.timeout(),
                )
                .await
                {
                    Some(vector) => match self.courses.set_course_vector(course.id, vector).await {
                        Ok(()) => report.succeeded += 1,
                        Err(e) => {
                            warn!("Failed to store vector for course {}: {}", course.id, e);
                            report.failed += 1;
                        }
                    },
                    None => report.failed += 1,
                }
            }
            self.pause_between_batches(batch_index, batch_count).await;
        }

        info!(
            "Course backfill done: {}/{} succeeded, {} failed",
            report.succeeded, report.total, report.failed
        );
        Ok(report)
    }

    /// Embed careers that have no vector yet (all of them with `re_embed`).
    pub async fn backfill_careers(&self, re_embed: bool) -> Result<BackfillReport> {
        let rows = if re_embed {
            self.careers.all_careers().await?
        } else {
            self.careers.careers_missing_vectors().await?
        };

        let mut report = BackfillReport {
            total: rows.len(),
            ..Default::default()
        };
        if rows.is_empty() {
            return Ok(report);
        }

        let batches: Vec<&[Career]> = rows.chunks(self.config.batch_size).collect();
        let batch_count = batches.len();

        for (batch_index, batch) in batches.into_iter().enumerate() {
            for career in batch {
                let text = normalize_text(&career_embedding_text(career));
                match embed_with_timeout(
                    &*self.provider,
                    &text,
                    EmbeddingMode::Document,
                    self.timeout(),
                )
                .await
                {
                    Some(vector) => match self.careers.set_career_vector(career.id, vector).await {
                        Ok(()) => report.succeeded += 1,
                        Err(e) => {
                            warn!("Failed to store vector for career {}: {}", career.id, e);
                            report.failed += 1;
                        }
                    },
                    None => report.failed += 1,
                }
            }
            self.pause_between_batches(batch_index, batch_count).await;
        }

        Ok(report)
    }

    /// Embed and upsert knowledge seeds. Existing (content_type,
    /// reference_id) rows are skipped unless `re_embed` is set; blank seeds
    /// are skipped outright.
    pub async fn upsert_knowledge(
        &self,
        seeds: Vec<KnowledgeSeed>,
        re_embed: bool,
    ) -> Result<BackfillReport> {
        let mut report = BackfillReport {
            total: seeds.len(),
            ..Default::default()
        };
        if seeds.is_empty() {
            return Ok(report);
        }

        let batches: Vec<&[KnowledgeSeed]> = seeds.chunks(self.config.batch_size).collect();
        let batch_count = batches.len();

        for (batch_index, batch) in batches.into_iter().enumerate() {
            for seed in batch {
                let text = normalize_text(&seed.text);
                if text.is_empty() {
                    report.skipped += 1;
                    continue;
                }
                if !re_embed
                    && self
                        .knowledge
                        .has_snippet(&seed.content_type, &seed.reference_id)
                        .await?
                {
                    report.skipped += 1;
                    continue;
                }

                match embed_with_timeout(
                    &*self.provider,
                    &text,
                    EmbeddingMode::Document,
                    self.timeout(),
                )
                .await
                {
                    Some(vector) => {
                        self.knowledge
                            .upsert_snippet(KnowledgeSnippet {
                                content_type: seed.content_type.clone(),
                                reference_id: seed.reference_id.clone(),
                                text,
                                vector: Some(vector),
                                metadata: seed.metadata.clone(),
                                created_at: Utc::now(),
                            })
                            .await?;
                        report.succeeded += 1;
                    }
                    None => report.failed += 1,
                }
            }
            self.pause_between_batches(batch_index, batch_count).await;
        }

        Ok(report)
    }
}
