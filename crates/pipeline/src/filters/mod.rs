//! Filter implementations for the eligibility pipeline.
//!
//! This module contains all the concrete filter implementations
//! that can be composed into a FilterPipeline.

pub mod duplicate_episode;
pub mod prior_season;
pub mod valid_numbering;

// Re-export for convenience
pub use duplicate_episode::DuplicateEpisodeFilter;
pub use prior_season::PriorSeasonFilter;
pub use valid_numbering::ValidNumberingFilter;
