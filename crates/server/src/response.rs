//! Flat, serializable view of a recommendation result.

use data_loader::{EpisodeNumber, SeasonNumber};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecommendationItem {
    pub season: SeasonNumber,
    pub episode: EpisodeNumber,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default)]
    pub arcs: Vec<String>,
    pub reason: String,
}

/// Items ordered by season, then episode number
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecommendationResponse {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub show_id: Option<String>,
    pub target_season: SeasonNumber,
    pub immersion: u8,
    pub items: Vec<RecommendationItem>,
}
