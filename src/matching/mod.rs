//! Vector similarity ranking and score-map industry selection

pub mod industry;
pub mod ranker;

pub use industry::{sanitize_score_maps, select_industries, IndustryPick};
pub use ranker::{cosine_distance, rank_candidates, RankCandidate, RankOptions, RankedMatch};
