//! # Data Loader Crate
//!
//! This crate loads episode catalogs and normalizes them into `Episode` records.
//!
//! ## Main Components
//!
//! - **types**: Core domain types (Episode, RequiredArcs, EpisodeCatalog)
//! - **parser**: Flatten the supported JSON layouts into episode records
//! - **index**: Build the catalog indices and validate the result
//! - **error**: Error types for data loading
//!
//! ## Example Usage
//!
//! ```ignore
//! use data_loader::EpisodeCatalog;
//! use std::path::Path;
//!
//! let catalog = EpisodeCatalog::load_from_file(Path::new("data/got.json"), Some("got"))?;
//!
//! for episode in catalog.season_episodes(1) {
//!     println!("S{}E{} {}", episode.season, episode.number, episode.title);
//! }
//! ```

pub mod error;
pub mod types;
pub mod parser;
pub mod index;

pub use error::{DataLoadError, Result};
pub use parser::{ParsedCatalog, parse_catalog, parse_catalog_str};
pub use types::{
    // Type aliases
    ArcTag,
    EpisodeId,
    EpisodeNumber,
    SeasonNumber,
    // Core types
    Episode,
    EpisodeCatalog,
    RequiredArcs,
    SkippedRecord,
    default_episode_id,
};
