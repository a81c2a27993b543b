//! Types shared by the scorer and its callers.

use data_loader::Episode;
use serde::{Deserialize, Serialize};

/// An episode paired with its relevance to the current query
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredEpisode {
    pub episode: Episode,
    /// Cosine similarity, in [-1, 1]
    pub score: f32,
}

impl ScoredEpisode {
    pub fn new(episode: Episode, score: f32) -> Self {
        Self { episode, score }
    }
}

/// Weights for the sections of an episode's canonical text.
///
/// Only zero versus non-zero matters today: a zero weight drops the section
/// from the text that gets embedded.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringConfig {
    pub title_weight: f32,
    pub summary_weight: f32,
    pub arcs_weight: f32,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            title_weight: 0.3,
            summary_weight: 1.0,
            arcs_weight: 0.4,
        }
    }
}
