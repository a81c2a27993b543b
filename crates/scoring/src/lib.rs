//! # Scoring Crate
//!
//! Ranks episodes by semantic relevance to the season a viewer is about to
//! start.
//!
//! ## Components
//!
//! - **text**: canonical episode text and query text construction
//! - **similarity**: cosine similarity that does not assume unit vectors
//! - **scorer**: `SimilarityScorer`, which embeds, scores and sorts
//!
//! ## Example Usage
//!
//! ```ignore
//! use embeddings::HashEmbedder;
//! use scoring::{SimilarityScorer, build_query_text};
//! use std::sync::Arc;
//!
//! let scorer = SimilarityScorer::new(Arc::new(HashEmbedder::default()));
//! let query = build_query_text(6, Some("got"), &["White Walkers"]);
//! let ranked = scorer.score(prior_episodes, &query)?;
//! ```

pub mod scorer;
pub mod similarity;
pub mod text;
pub mod types;

pub use scorer::{ScoringError, SimilarityScorer};
pub use similarity::cosine_similarity;
pub use text::{build_query_text, episode_text};
pub use types::{ScoredEpisode, ScoringConfig};
