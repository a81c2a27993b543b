//! Filter to drop records that cannot be placed in a season.
//!
//! The catalog loader already skips these, but episodes can also be built in
//! code, so the pipeline checks again before anything is scored.

use crate::context::ViewerContext;
use crate::traits::Filter;
use anyhow::Result;
use data_loader::Episode;
use tracing::warn;

/// Removes episodes whose season or number is 0.
pub struct ValidNumberingFilter;

impl Filter for ValidNumberingFilter {
    fn name(&self) -> &str {
        "ValidNumberingFilter"
    }

    fn apply(&self, episodes: Vec<Episode>, _context: &ViewerContext) -> Result<Vec<Episode>> {
        let filtered: Vec<Episode> = episodes
            .into_iter()
            .filter(|episode| {
                let valid = episode.season >= 1 && episode.number >= 1;
                if !valid {
                    warn!(
                        "Skipping episode {} with season {} number {}",
                        episode.id, episode.season, episode.number
                    );
                }
                valid
            })
            .collect();
        Ok(filtered)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_numbering_filter() {
        let episodes = vec![
            Episode::new(1, 1),
            Episode::new(0, 2),
            Episode::new(2, 0),
            Episode::new(2, 3),
        ];

        let filtered = ValidNumberingFilter
            .apply(episodes, &ViewerContext::new(5))
            .unwrap();

        let slots: Vec<_> = filtered.iter().map(|e| (e.season, e.number)).collect();
        assert_eq!(slots, vec![(1, 1), (2, 3)]);
    }
}
