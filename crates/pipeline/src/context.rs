//! Viewer context for one recommendation call
//!
//! Gathers everything a request knows about the viewer up front, so filters
//! and the planner read from one place instead of threading arguments.

use crate::budget::ImmersionLevel;
use data_loader::{ArcTag, RequiredArcs, SeasonNumber};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// What the viewer is about to watch and how much catching up they want
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ViewerContext {
    /// Season the viewer is about to start; only earlier seasons are eligible
    pub target_season: SeasonNumber,

    #[serde(default)]
    pub immersion: ImmersionLevel,

    #[serde(default)]
    pub required_arcs: RequiredArcs,

    /// Optional show identifier, folded into the query text
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub show_id: Option<String>,
}

impl ViewerContext {
    pub fn new(target_season: SeasonNumber) -> Self {
        Self {
            target_season,
            immersion: ImmersionLevel::default(),
            required_arcs: RequiredArcs::new(),
            show_id: None,
        }
    }

    /// Any integer is accepted; it is clamped into [1, 5]
    pub fn with_immersion(mut self, level: i64) -> Self {
        self.immersion = ImmersionLevel::clamped(level);
        self
    }

    pub fn with_required_arcs(mut self, required_arcs: RequiredArcs) -> Self {
        self.required_arcs = required_arcs;
        self
    }

    pub fn with_show(mut self, show_id: impl Into<String>) -> Self {
        self.show_id = Some(show_id.into());
        self
    }

    /// Required arcs for one season (empty when none were given)
    pub fn required_for(&self, season: SeasonNumber) -> BTreeSet<ArcTag> {
        self.required_arcs.for_season(season)
    }

    /// True if episodes from this season may be recommended
    pub fn is_prior_season(&self, season: SeasonNumber) -> bool {
        season < self.target_season
    }
}
