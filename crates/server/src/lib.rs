//! Server crate for the catch-up episode recommender.
//!
//! This crate contains the orchestrator that coordinates all components
//! of the recommendation pipeline, plus the configuration and output shapes
//! a front end needs.

pub mod config;
pub mod orchestrator;
pub mod reason;
pub mod required;
pub mod response;

pub use config::{ConfigError, EmbeddingConfig, RecommenderConfig};
pub use orchestrator::{Recommendation, RecommendationOrchestrator, Recommendations};
pub use reason::{CONTEXT_REASON, ReasonThresholds, reason_for};
pub use required::derive_required_arcs;
pub use response::{RecommendationItem, RecommendationResponse};
