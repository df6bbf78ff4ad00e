//! RAG context assembly for chat turns
//!
//! Embeds the inbound message, retrieves the closest knowledge snippets
//! under a distance threshold, and renders them as a bullet block. The
//! downstream prompt always receives a well-formed string: every failure
//! mode substitutes the explicit no-data marker instead.

use crate::config::{EmbeddingConfig, MatchingConfig};
use crate::matching::{rank_candidates, RankOptions};
use crate::providers::{embed_with_timeout, EmbeddingMode, EmbeddingProvider};
use crate::storage::KnowledgeStore;
use log::{debug, warn};
use std::sync::Arc;
use std::time::Duration;

/// Marker handed to the generative prompt when retrieval yields nothing.
pub const NO_CONTEXT_MARKER: &str = "No specific data available.";

pub struct RagContextAssembler {
    embedder: Arc<dyn EmbeddingProvider>,
    knowledge: Arc<dyn KnowledgeStore>,
    matching: MatchingConfig,
    embedding: EmbeddingConfig,
}

impl RagContextAssembler {
    pub fn new(
        embedder: Arc<dyn EmbeddingProvider>,
        knowledge: Arc<dyn KnowledgeStore>,
        matching: MatchingConfig,
        embedding: EmbeddingConfig,
    ) -> Self {
        Self {
            embedder,
            knowledge,
            matching,
            embedding,
        }
    }

    /// Build the context block for one chat message. Never fails and never
    /// returns an empty string.
    pub async fn build_context(&self, query: &str) -> String {
        let query = query.trim();
        if query.chars().count() < self.matching.rag_min_query_chars {
            debug!("Query below minimum length, skipping retrieval");
            return NO_CONTEXT_MARKER.to_string();
        }

        let timeout = Duration::from_secs(self.embedding.request_timeout_secs);
        let query_vector =
            match embed_with_timeout(&*self.embedder, query, EmbeddingMode::Query, timeout).await {
                Some(vector) => vector,
                None => return NO_CONTEXT_MARKER.to_string(),
            };

        let snippets = match self.knowledge.all_snippets().await {
            Ok(snippets) => snippets,
            Err(e) => {
                warn!("Knowledge retrieval failed: {}", e);
                return NO_CONTEXT_MARKER.to_string();
            }
        };

        let options = RankOptions {
            distance_threshold: Some(self.matching.knowledge_distance_threshold),
            limit: Some(self.matching.rag_top_k),
            dedupe_titles: false,
        };
        let ranked = rank_candidates(Some(&query_vector), snippets, &options);

        if ranked.is_empty() {
            return NO_CONTEXT_MARKER.to_string();
        }

        ranked
            .iter()
            .map(|m| format!("- {}", m.item.text))
            .collect::<Vec<_>>()
            .join("\n")
    }
}
