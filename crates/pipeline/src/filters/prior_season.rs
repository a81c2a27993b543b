//! Filter to keep only seasons the viewer has not reached yet.
//!
//! Episodes from the target season or later are never recommended.

use crate::context::ViewerContext;
use crate::traits::Filter;
use anyhow::Result;
use data_loader::Episode;

/// Keeps episodes whose season is strictly before the target season.
pub struct PriorSeasonFilter;

impl Filter for PriorSeasonFilter {
    fn name(&self) -> &str {
        "PriorSeasonFilter"
    }

    fn apply(&self, episodes: Vec<Episode>, context: &ViewerContext) -> Result<Vec<Episode>> {
        let filtered: Vec<Episode> = episodes
            .into_iter()
            .filter(|episode| context.is_prior_season(episode.season))
            .collect();
        Ok(filtered)
    }
}
