//! Required arcs derived from a show's core arcs.
//!
//! Catalogs in the multi-show layout can list `core_arcs` for a show. Every
//! prior season is then required to cover the core arcs it actually contains;
//! a core arc that never appears in a season is not required there.

use data_loader::{ArcTag, EpisodeCatalog, RequiredArcs, SeasonNumber};
use std::collections::BTreeSet;

/// Core arcs present in each season before `target_season`
pub fn derive_required_arcs(
    catalog: &EpisodeCatalog,
    core_arcs: &BTreeSet<ArcTag>,
    target_season: SeasonNumber,
) -> RequiredArcs {
    let mut required = RequiredArcs::new();
    if core_arcs.is_empty() {
        return required;
    }

    for season in catalog.seasons().filter(|s| *s < target_season) {
        for episode in catalog.season_episodes(season) {
            for arc in episode.arcs.intersection(core_arcs) {
                required.insert(season, arc.clone());
            }
        }
    }
    required
}
