//! Configuration management for the career advisor

use crate::error::{CareerAdvisorError, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub catalog: CatalogConfig,
    pub matching: MatchingConfig,
    pub advice: AdviceConfig,
    pub embedding: EmbeddingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogConfig {
    /// Directory holding the question-set JSON files (holland.json, mbti.json)
    pub data_dir: PathBuf,
    /// Seconds a loaded question set stays cached before reload
    pub cache_ttl_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchingConfig {
    /// Cosine-distance cutoff for knowledge retrieval (entries at or above are dropped)
    pub knowledge_distance_threshold: f32,
    /// Cosine-distance cutoff for course matching
    pub course_distance_threshold: f32,
    /// Snippets retrieved per RAG query
    pub rag_top_k: usize,
    /// Queries shorter than this (trimmed) skip retrieval entirely
    pub rag_min_query_chars: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdviceConfig {
    /// Weight of the industry rank in the career blend
    pub industry_weight: f32,
    /// Weight of vector similarity in the career blend
    pub similarity_weight: f32,
    /// Rank-weight decay per industry position (1.0, 0.8, 0.6, ...)
    pub industry_rank_decay: f32,
    pub default_paths: usize,
    pub default_courses_per_path: usize,
    /// Generated learning paths with fewer phases are rejected
    pub min_phases: usize,
    /// Normalized phase titles are cut at this many characters
    pub phase_title_max_chars: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingConfig {
    pub dimensions: usize,
    /// Items per backfill batch
    pub batch_size: usize,
    /// Pause between backfill batches, respecting provider rate limits
    pub batch_delay_secs: u64,
    pub request_timeout_secs: u64,
    /// Profile texts shorter than this are too sparse to embed
    pub min_profile_chars: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            catalog: CatalogConfig {
                data_dir: PathBuf::from("data"),
                cache_ttl_secs: 3600,
            },
            matching: MatchingConfig {
                knowledge_distance_threshold: 0.6,
                course_distance_threshold: 0.45,
                rag_top_k: 5,
                rag_min_query_chars: 2,
            },
            advice: AdviceConfig {
                industry_weight: 0.6,
                similarity_weight: 0.4,
                industry_rank_decay: 0.2,
                default_paths: 3,
                default_courses_per_path: 6,
                min_phases: 3,
                phase_title_max_chars: 80,
            },
            embedding: EmbeddingConfig {
                dimensions: 768,
                batch_size: 50,
                batch_delay_secs: 5,
                request_timeout_secs: 30,
                min_profile_chars: 20,
            },
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path();

        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            let config: Config = toml::from_str(&content).map_err(|e| {
                CareerAdvisorError::Configuration(format!("Failed to parse config: {}", e))
            })?;
            Ok(config)
        } else {
            let config = Self::default();
            config.save()?;
            Ok(config)
        }
    }

    pub fn save(&self) -> Result<()> {
        let config_path = Self::config_path();

        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self).map_err(|e| {
            CareerAdvisorError::Configuration(format!("Failed to serialize config: {}", e))
        })?;

        std::fs::write(&config_path, content)?;
        Ok(())
    }

    fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| dirs::home_dir().unwrap_or_else(|| PathBuf::from(".")))
            .join("career-advisor")
            .join("config.toml")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_thresholds() {
        let config = Config::default();
        assert_eq!(config.matching.knowledge_distance_threshold, 0.6);
        assert_eq!(config.matching.course_distance_threshold, 0.45);
        assert_eq!(config.embedding.dimensions, 768);
    }

    #[test]
    fn test_config_round_trip() {
        let config = Config::default();
        let serialized = toml::to_string_pretty(&config).unwrap();
        let parsed: Config = toml::from_str(&serialized).unwrap();
        assert_eq!(parsed.advice.default_paths, config.advice.default_paths);
        assert_eq!(parsed.catalog.cache_ttl_secs, 3600);
    }

    #[test]
    fn test_blend_weights_sum_to_one() {
        let config = Config::default();
        let sum = config.advice.industry_weight + config.advice.similarity_weight;
        assert!((sum - 1.0).abs() < f32::EPSILON);
    }
}
