//! Similarity ranking over embedded candidates
//!
//! Cosine distance lives in [0, 2]; the normalized score maps it into
//! [0, 100]. A null query vector is not an error: the ranker falls back to
//! recency ordering with a neutral score of 0 for every entry.

use chrono::{DateTime, Utc};
use log::debug;
use std::collections::HashSet;

/// A candidate the ranker can order. Entities may arrive without a vector
/// (not yet embedded) or with a distance already computed by the storage
/// layer.
pub trait RankCandidate {
    fn title(&self) -> &str;
    fn vector(&self) -> Option<&[f32]>;
    fn precomputed_distance(&self) -> Option<f32> {
        None
    }
    fn created_at(&self) -> DateTime<Utc>;
}

impl RankCandidate for crate::storage::Career {
    fn title(&self) -> &str {
        &self.title
    }
    fn vector(&self) -> Option<&[f32]> {
        self.vector.as_deref()
    }
    fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}

impl RankCandidate for crate::storage::Course {
    fn title(&self) -> &str {
        &self.title
    }
    fn vector(&self) -> Option<&[f32]> {
        self.vector.as_deref()
    }
    fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}

impl RankCandidate for crate::storage::KnowledgeSnippet {
    // Snippets have no title; the text stands in (they are never deduped).
    fn title(&self) -> &str {
        &self.text
    }
    fn vector(&self) -> Option<&[f32]> {
        self.vector.as_deref()
    }
    fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}

#[derive(Debug, Clone, Default)]
pub struct RankOptions {
    /// Entries at or above this cosine distance are excluded, not merely
    /// deprioritized.
    pub distance_threshold: Option<f32>,
    /// Applied after filtering and de-duplication.
    pub limit: Option<usize>,
    /// Drop entries whose trimmed title repeats an earlier one.
    pub dedupe_titles: bool,
}

#[derive(Debug, Clone)]
pub struct RankedMatch<T> {
    pub item: T,
    pub distance: Option<f32>,
    /// clamp(0, 100, (1 - distance) * 100); 0 for unranked entries.
    pub score: f32,
}

/// Cosine distance (1 - cosine similarity) between two vectors. `None` on
/// dimension mismatch; a zero-norm vector yields similarity 0.
pub fn cosine_distance(a: &[f32], b: &[f32]) -> Option<f32> {
    if a.len() != b.len() || a.is_empty() {
        return None;
    }

    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return Some(1.0);
    }

    Some(1.0 - dot / (norm_a * norm_b))
}

/// Normalized similarity score for a cosine distance.
pub fn score_from_distance(distance: f32) -> f32 {
    ((1.0 - distance) * 100.0).clamp(0.0, 100.0)
}

/// Rank candidates against a query vector.
///
/// With a query: distance-ranked entries sort ascending by distance and are
/// filtered by the threshold. Entries without any vector cannot demonstrate
/// closeness — they are excluded when a threshold is set, otherwise appended
/// after the ranked entries in recency order with score 0.
///
/// Without a query: recency order, score 0 for all entries, never an error.
pub fn rank_candidates<T: RankCandidate>(
    query: Option<&[f32]>,
    candidates: Vec<T>,
    options: &RankOptions,
) -> Vec<RankedMatch<T>> {
    let mut ranked: Vec<RankedMatch<T>> = Vec::with_capacity(candidates.len());

    match query {
        Some(query_vector) => {
            let mut scored = Vec::new();
            let mut unscored = Vec::new();

            for candidate in candidates {
                let distance = candidate.precomputed_distance().or_else(|| {
                    candidate
                        .vector()
                        .and_then(|v| cosine_distance(query_vector, v))
                });

                match distance {
                    Some(d) => scored.push((d, candidate)),
                    None => {
                        debug!(
                            "Candidate '{}' has no usable vector; ranking by recency",
                            candidate.title()
                        );
                        unscored.push(candidate);
                    }
                }
            }

            if let Some(threshold) = options.distance_threshold {
                scored.retain(|(d, _)| *d < threshold);
                unscored.clear();
            }

            scored.sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap_or(std::cmp::Ordering::Equal));
            unscored.sort_by_key(|c| std::cmp::Reverse(c.created_at()));

            for (distance, item) in scored {
                ranked.push(RankedMatch {
                    score: score_from_distance(distance),
                    distance: Some(distance),
                    item,
                });
            }
            for item in unscored {
                ranked.push(RankedMatch {
                    item,
                    distance: None,
                    score: 0.0,
                });
            }
        }
        None => {
            let mut by_recency = candidates;
            by_recency.sort_by_key(|c| std::cmp::Reverse(c.created_at()));
            for item in by_recency {
                ranked.push(RankedMatch {
                    item,
                    distance: None,
                    score: 0.0,
                });
            }
        }
    }

    if options.dedupe_titles {
        let mut seen: HashSet<String> = HashSet::new();
        ranked.retain(|m| seen.insert(m.item.title().trim().to_lowercase()));
    }

    if let Some(limit) = options.limit {
        ranked.truncate(limit);
    }

    ranked
}
