//! Eligibility filtering and arc-coverage planning for catch-up episodes.
//!
//! This crate provides:
//! - Filter trait and implementations for episode eligibility
//! - FilterPipeline for composing filters
//! - Immersion levels and per-season budgets
//! - CoveragePlanner, the greedy per-season selector
//!
//! ## Architecture
//! Episodes pass through the pipeline in stages:
//! 1. Filters drop malformed records, later seasons and duplicate slots
//! 2. The scorer (in the `scoring` crate) ranks what is left
//! 3. CoveragePlanner picks each season's episodes under its budget
//!
//! ## Example Usage
//! ```ignore
//! use pipeline::{CoveragePlanner, FilterPipeline, ViewerContext};
//!
//! let context = ViewerContext::new(6).with_immersion(2);
//! let eligible = FilterPipeline::standard().apply(episodes, &context)?;
//!
//! let planner = CoveragePlanner::new();
//! let required = context.required_for(1);
//! let plan = planner.select_for_season(&ranked_season_one, &required, context.immersion);
//! ```

pub mod budget;
pub mod context;
pub mod coverage;
pub mod filter_pipeline;
pub mod filters;
pub mod traits;

// Re-export main types
pub use budget::{BudgetError, BudgetPolicy, BudgetTable, ImmersionLevel};
pub use context::ViewerContext;
pub use coverage::{CoveragePlanner, CoverageReport, FillPolicy, PlannedEpisode};
pub use filter_pipeline::FilterPipeline;
pub use traits::Filter;
