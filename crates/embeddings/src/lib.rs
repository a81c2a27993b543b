//! Text embedding capability for the recommender.
//!
//! This crate defines what the scorer needs from an embedding backend and
//! ships two implementations:
//! - `HashEmbedder`: deterministic, offline vectors derived from a SHA-256
//!   digest of the text. Reproducible across runs, no model required.
//! - `CachedEmbedder`: wraps any provider and memoizes results by exact text.
//!
//! A model-backed provider only has to implement `EmbeddingProvider`; the
//! scorer and planner never see the difference.

pub mod cache;
pub mod hashed;

use thiserror::Error;

pub use cache::{CacheStats, CachedEmbedder};
pub use hashed::HashEmbedder;

/// Errors that can occur when producing embeddings
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EmbeddingError {
    #[error("Embedding backend failed: {0}")]
    Backend(String),

    #[error("Invalid response from embedding backend: {0}")]
    InvalidResponse(String),

    #[error("Invalid embedding configuration: {0}")]
    InvalidConfig(String),
}

/// Result type for embedding operations.
pub type EmbeddingResult<T> = Result<T, EmbeddingError>;

/// Capability to turn text into fixed-length vectors.
///
/// ## Contract
/// - Pure: the same text always yields the same vector for the lifetime of
///   the provider
/// - Every returned vector has `dimension()` components
/// - Empty text is valid input and must produce a valid vector
/// - `embed_batch` returns one vector per input, in input order
///
/// `Send + Sync` lets one provider be shared by concurrent requests.
pub trait EmbeddingProvider: Send + Sync {
    /// Embed a single text
    fn embed(&self, text: &str) -> EmbeddingResult<Vec<f32>>;

    /// Embed many texts in one call.
    ///
    /// Backends with per-call overhead should override this; the default
    /// simply embeds each text in turn.
    fn embed_batch(&self, texts: &[&str]) -> EmbeddingResult<Vec<Vec<f32>>> {
        texts.iter().map(|text| self.embed(text)).collect()
    }

    /// Number of components in every vector this provider returns
    fn dimension(&self) -> usize;

    /// Identifier of the underlying model
    fn model_name(&self) -> &str;
}

/// Scale a vector to unit length in place.
///
/// A small epsilon keeps all-zero input finite (it stays all-zero).
pub fn l2_normalize(vector: &mut [f32]) {
    let norm = vector
        .iter()
        .map(|x| f64::from(*x) * f64::from(*x))
        .sum::<f64>()
        .sqrt()
        + 1e-12;
    for x in vector.iter_mut() {
        *x = (f64::from(*x) / norm) as f32;
    }
}

/// Check that a batch response matches the request
pub(crate) fn check_batch_len(expected: usize, vectors: &[Vec<f32>]) -> EmbeddingResult<()> {
    if vectors.len() != expected {
        return Err(EmbeddingError::InvalidResponse(format!(
            "expected {} vectors, got {}",
            expected,
            vectors.len()
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_l2_normalize() {
        let mut v = vec![3.0, 4.0];
        l2_normalize(&mut v);
        assert!((v[0] - 0.6).abs() < 1e-6);
        assert!((v[1] - 0.8).abs() < 1e-6);
    }

    #[test]
    fn test_l2_normalize_zero_vector_stays_finite() {
        let mut v = vec![0.0; 4];
        l2_normalize(&mut v);
        assert!(v.iter().all(|x| *x == 0.0));
    }

    #[test]
    fn test_check_batch_len() {
        assert!(check_batch_len(1, &[vec![1.0]]).is_ok());
        assert!(matches!(
            check_batch_len(2, &[vec![1.0]]),
            Err(EmbeddingError::InvalidResponse(_))
        ));
    }
}
