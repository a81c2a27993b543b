//! Core traits for the filtering pipeline.
//!
//! This module defines the Filter trait that allows composable,
//! extensible filters to be applied to episode sets.

use crate::context::ViewerContext;
use anyhow::Result;
use data_loader::Episode;

/// Core trait for filtering episodes.
///
/// All filters must implement this trait to be used in the FilterPipeline.
/// Filters take ownership of the episodes and return the ones they keep, in
/// their original relative order.
pub trait Filter: Send + Sync {
    /// Returns the name of this filter (for logging/debugging)
    fn name(&self) -> &str;

    /// Apply this filter to a set of episodes.
    ///
    /// # Arguments
    /// * `episodes` - The episodes to filter (takes ownership)
    /// * `context` - Target season, immersion and required arcs
    fn apply(&self, episodes: Vec<Episode>, context: &ViewerContext) -> Result<Vec<Episode>>;
}
