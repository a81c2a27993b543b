//! Similarity Scorer - query relevance for episodes
//!
//! ## Algorithm
//! 1. Embed the query text (one `embed` call)
//! 2. Collect canonical texts for episodes without a usable precomputed
//!    vector and embed them together (one `embed_batch` call). A precomputed
//!    vector whose dimension differs from the query's counts as missing.
//! 3. Cosine similarity between the query vector and every episode vector
//! 4. Stable sort by score, descending: ties keep input order

use crate::similarity::cosine_similarity;
use crate::text::episode_text;
use crate::types::{ScoredEpisode, ScoringConfig};
use data_loader::Episode;
use embeddings::{EmbeddingError, EmbeddingProvider};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, instrument, warn};

/// Errors that can occur while scoring
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ScoringError {
    /// The embedding backend failed; scores cannot be trusted
    #[error("Embedding failed: {0}")]
    Embedding(#[from] EmbeddingError),

    /// The backend produced an episode vector that does not match the query's dimension
    #[error("Episode {episode_id} has a {found}-dimensional vector, query has {expected}")]
    DimensionMismatch {
        episode_id: String,
        expected: usize,
        found: usize,
    },
}

/// Ranks episodes by cosine similarity to a query
#[derive(Clone)]
pub struct SimilarityScorer {
    /// Shared embedding backend
    embedder: Arc<dyn EmbeddingProvider>,

    config: ScoringConfig,
}

impl SimilarityScorer {
    /// Create a scorer with the default section weights
    pub fn new(embedder: Arc<dyn EmbeddingProvider>) -> Self {
        Self {
            embedder,
            config: ScoringConfig::default(),
        }
    }

    /// Configure section weights (default: summary 1.0, title 0.3, arcs 0.4)
    pub fn with_config(mut self, config: ScoringConfig) -> Self {
        self.config = config;
        self
    }

    pub fn config(&self) -> &ScoringConfig {
        &self.config
    }

    /// Score episodes against the query text.
    ///
    /// Returns every input episode exactly once, ordered by score descending.
    /// An empty input returns immediately without touching the embedder.
    #[instrument(skip(self, episodes, query_text), fields(episodes = episodes.len()))]
    pub fn score(
        &self,
        episodes: Vec<Episode>,
        query_text: &str,
    ) -> Result<Vec<ScoredEpisode>, ScoringError> {
        if episodes.is_empty() {
            return Ok(Vec::new());
        }

        let query = self.embedder.embed(query_text)?;
        let vectors = self.episode_vectors(&episodes, query.len())?;

        let mut scored = Vec::with_capacity(episodes.len());
        for (episode, vector) in episodes.into_iter().zip(vectors) {
            let score = cosine_similarity(&query, &vector).ok_or_else(|| {
                ScoringError::DimensionMismatch {
                    episode_id: episode.id.clone(),
                    expected: query.len(),
                    found: vector.len(),
                }
            })?;
            scored.push(ScoredEpisode::new(episode, score));
        }

        // sort_by is stable, and total_cmp never reports inconsistent ordering
        scored.sort_by(|a, b| b.score.total_cmp(&a.score));

        debug!(
            "Scored {} episodes (top score {:.3})",
            scored.len(),
            scored.first().map(|s| s.score).unwrap_or_default()
        );
        Ok(scored)
    }

    /// One vector per episode, in input order.
    ///
    /// Precomputed vectors of the expected dimension are reused; the rest are
    /// embedded in one batch.
    fn episode_vectors(
        &self,
        episodes: &[Episode],
        dimension: usize,
    ) -> Result<Vec<Vec<f32>>, ScoringError> {
        let reusable: Vec<Option<&Vec<f32>>> = episodes
            .iter()
            .map(|episode| match &episode.embedding {
                Some(vector) if vector.len() == dimension => Some(vector),
                Some(vector) => {
                    warn!(
                        "Episode {} vector has dimension {}, expected {}; re-embedding",
                        episode.id,
                        vector.len(),
                        dimension
                    );
                    None
                }
                None => None,
            })
            .collect();

        let missing: Vec<String> = episodes
            .iter()
            .zip(&reusable)
            .filter(|(_, vector)| vector.is_none())
            .map(|(episode, _)| episode_text(episode, &self.config))
            .collect();

        let computed = if missing.is_empty() {
            Vec::new()
        } else {
            let texts: Vec<&str> = missing.iter().map(String::as_str).collect();
            debug!("Embedding {} episodes without usable vectors", texts.len());
            let computed = self.embedder.embed_batch(&texts)?;
            if computed.len() != texts.len() {
                return Err(EmbeddingError::InvalidResponse(format!(
                    "expected {} vectors, got {}",
                    texts.len(),
                    computed.len()
                ))
                .into());
            }
            computed
        };
        let mut computed = computed.into_iter();

        let mut vectors = Vec::with_capacity(episodes.len());
        for vector in reusable {
            let vector = match vector {
                Some(vector) => vector.clone(),
                None => computed.next().ok_or_else(|| {
                    EmbeddingError::InvalidResponse("batch ended early".to_string())
                })?,
            };
            vectors.push(vector);
        }
        Ok(vectors)
    }
}
