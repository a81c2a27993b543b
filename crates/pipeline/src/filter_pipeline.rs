//! The FilterPipeline orchestrates multiple filters.
//!
//! This module provides the main FilterPipeline struct that chains
//! multiple filters together using the builder pattern.

use crate::context::ViewerContext;
use crate::filters::{DuplicateEpisodeFilter, PriorSeasonFilter, ValidNumberingFilter};
use crate::traits::Filter;
use anyhow::Result;
use data_loader::Episode;
use tracing;

/// Chains multiple filters together into a processing pipeline.
///
/// ## Usage
/// ```ignore
/// let pipeline = FilterPipeline::new()
///     .add_filter(ValidNumberingFilter)
///     .add_filter(PriorSeasonFilter)
///     .add_filter(DuplicateEpisodeFilter);
///
/// let eligible = pipeline.apply(episodes, &context)?;
/// ```
pub struct FilterPipeline {
    filters: Vec<Box<dyn Filter>>,
}

impl FilterPipeline {
    /// Create a new empty FilterPipeline.
    pub fn new() -> Self {
        Self {
            filters: Vec::new(),
        }
    }

    /// The eligibility pipeline every recommendation runs:
    /// valid numbering, then prior seasons only, then first record per slot.
    pub fn standard() -> Self {
        Self::new()
            .add_filter(ValidNumberingFilter)
            .add_filter(PriorSeasonFilter)
            .add_filter(DuplicateEpisodeFilter)
    }

    /// Add a filter to the pipeline (builder pattern).
    pub fn add_filter(mut self, filter: impl Filter + 'static) -> Self {
        self.filters.push(Box::new(filter));
        self
    }

    /// Names of the filters, in application order
    pub fn filter_names(&self) -> Vec<&str> {
        self.filters.iter().map(|f| f.name()).collect()
    }

    /// Apply all filters in sequence to the episodes.
    ///
    /// ## Algorithm
    /// 1. Start with the input episodes
    /// 2. For each filter in order:
    ///    a. Log filter name and input count
    ///    b. Apply the filter
    ///    c. Log output count
    /// 3. Return final filtered set
    pub fn apply(&self, episodes: Vec<Episode>, context: &ViewerContext) -> Result<Vec<Episode>> {
        let mut current = episodes;
        for filter in &self.filters {
            tracing::debug!(
                "Applying filter: {} (input count: {})",
                filter.name(),
                current.len()
            );
            current = filter.apply(current, context)?;
            tracing::debug!(
                "Filter applied: {} (output count: {})",
                filter.name(),
                current.len()
            );
        }
        Ok(current)
    }
}

impl Default for FilterPipeline {
    fn default() -> Self {
        Self::new()
    }
}
