//! Deterministic hash-based embedder.
//!
//! ## Algorithm
//! 1. SHA-256 digest of the UTF-8 text
//! 2. First 8 digest bytes (little-endian) seed a `StdRng`
//! 3. Draw `dim` floats uniformly from [-1, 1)
//! 4. L2-normalize to unit length
//!
//! The vectors carry no meaning, but they are stable, which is all tests and
//! offline runs need.

use crate::{EmbeddingError, EmbeddingProvider, EmbeddingResult, l2_normalize};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;
use sha2::{Digest, Sha256};
use tracing::debug;

/// Default number of dimensions
pub const DEFAULT_DIMENSION: usize = 128;

/// Offline embedder that derives vectors from a digest of the text
#[derive(Debug, Clone)]
pub struct HashEmbedder {
    dim: usize,
}

impl HashEmbedder {
    /// Create an embedder producing `dim`-dimensional vectors.
    ///
    /// A zero dimension is rejected here so no call can return an empty vector.
    pub fn new(dim: usize) -> EmbeddingResult<Self> {
        if dim == 0 {
            return Err(EmbeddingError::InvalidConfig(
                "embedding dimension must be at least 1".to_string(),
            ));
        }
        Ok(Self { dim })
    }

    fn seed_from_text(text: &str) -> u64 {
        let digest = Sha256::digest(text.as_bytes());
        let mut seed = [0u8; 8];
        seed.copy_from_slice(&digest[..8]);
        u64::from_le_bytes(seed)
    }

    fn vector_for(&self, text: &str) -> Vec<f32> {
        let mut rng = StdRng::seed_from_u64(Self::seed_from_text(text));
        let mut vector: Vec<f32> = (0..self.dim)
            .map(|_| rng.random_range(-1.0f32..1.0))
            .collect();
        l2_normalize(&mut vector);
        vector
    }
}

impl Default for HashEmbedder {
    fn default() -> Self {
        Self {
            dim: DEFAULT_DIMENSION,
        }
    }
}

impl EmbeddingProvider for HashEmbedder {
    fn embed(&self, text: &str) -> EmbeddingResult<Vec<f32>> {
        Ok(self.vector_for(text))
    }

    /// Texts are independent, so the batch is spread across the rayon pool.
    fn embed_batch(&self, texts: &[&str]) -> EmbeddingResult<Vec<Vec<f32>>> {
        debug!("Hash-embedding batch of {} texts", texts.len());
        Ok(texts.par_iter().map(|text| self.vector_for(text)).collect())
    }

    fn dimension(&self) -> usize {
        self.dim
    }

    fn model_name(&self) -> &str {
        "sha256-hash"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn norm(v: &[f32]) -> f32 {
        v.iter().map(|x| x * x).sum::<f32>().sqrt()
    }

    #[test]
    fn test_embed_is_deterministic() {
        let embedder = HashEmbedder::new(32).unwrap();
        let a = embedder.embed("Winter is coming").unwrap();
        let b = embedder.embed("Winter is coming").unwrap();

        assert_eq!(a, b);
        let bits_a: Vec<u32> = a.iter().map(|x| x.to_bits()).collect();
        let bits_b: Vec<u32> = b.iter().map(|x| x.to_bits()).collect();
        assert_eq!(bits_a, bits_b);
    }

    #[test]
    fn test_separate_instances_agree() {
        let a = HashEmbedder::new(16).unwrap().embed("same text").unwrap();
        let b = HashEmbedder::new(16).unwrap().embed("same text").unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_different_texts_differ() {
        let embedder = HashEmbedder::default();
        let a = embedder.embed("alpha").unwrap();
        let b = embedder.embed("beta").unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_vectors_have_fixed_dimension_and_unit_length() {
        let embedder = HashEmbedder::new(64).unwrap();
        for text in ["", "a", "a much longer piece of text about dragons"] {
            let v = embedder.embed(text).unwrap();
            assert_eq!(v.len(), 64);
            assert!((norm(&v) - 1.0).abs() < 1e-4, "text {:?} not unit length", text);
        }
    }

    #[test]
    fn test_empty_text_is_valid() {
        let embedder = HashEmbedder::default();
        let v = embedder.embed("").unwrap();
        assert_eq!(v.len(), DEFAULT_DIMENSION);
        assert!(v.iter().all(|x| x.is_finite()));
    }

    #[test]
    fn test_batch_matches_single_calls_in_order() {
        let embedder = HashEmbedder::new(8).unwrap();
        let texts = ["one", "two", "three", "two"];
        let batch = embedder.embed_batch(&texts).unwrap();

        assert_eq!(batch.len(), texts.len());
        for (text, vector) in texts.iter().zip(&batch) {
            assert_eq!(&embedder.embed(text).unwrap(), vector);
        }
    }

    #[test]
    fn test_zero_dimension_is_rejected() {
        assert!(matches!(
            HashEmbedder::new(0),
            Err(EmbeddingError::InvalidConfig(_))
        ));
    }
}
