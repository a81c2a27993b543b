//! Filter to collapse repeated (season, number) slots.
//!
//! The first record for a slot wins; later ones are dropped so an episode can
//! never be selected twice.

use crate::context::ViewerContext;
use crate::traits::Filter;
use anyhow::Result;
use data_loader::Episode;
use std::collections::HashSet;
use tracing::debug;

/// Keeps the first episode for each (season, number) pair.
///
/// ## Algorithm
/// Walks the input once, remembering seen slots in a HashSet for O(1) lookups.
pub struct DuplicateEpisodeFilter;

impl Filter for DuplicateEpisodeFilter {
    fn name(&self) -> &str {
        "DuplicateEpisodeFilter"
    }

    fn apply(&self, episodes: Vec<Episode>, _context: &ViewerContext) -> Result<Vec<Episode>> {
        let mut seen = HashSet::with_capacity(episodes.len());
        let filtered: Vec<Episode> = episodes
            .into_iter()
            .filter(|episode| {
                let first = seen.insert((episode.season, episode.number));
                if !first {
                    debug!("Dropping duplicate of S{}E{}", episode.season, episode.number);
                }
                first
            })
            .collect();
        Ok(filtered)
    }
}
