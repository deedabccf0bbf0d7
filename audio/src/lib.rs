//! Audio conditioning and feature extraction for the MoodLink classifier.
//!
//! This crate provides:
//!
//! - `pcm`: signal statistics and peak normalization over PCM16 buffers
//! - `mfcc`: spectral basis construction and MFCC feature extraction
//! - `pool`: memory-pool placement policy for long-lived buffers
//!
//! # Example
//!
//! ```rust
//! use moodlink_audio::mfcc::{FeatureExtractor, FeatureMatrix, MfccConfig, SpectralBasis};
//! use moodlink_audio::pool::PoolAllocator;
//!
//! let cfg = MfccConfig::default();
//! let mut alloc = PoolAllocator::default();
//!
//! let basis = SpectralBasis::new(&cfg, &mut alloc).unwrap();
//! let mut extractor = FeatureExtractor::new(basis, &mut alloc).unwrap();
//! let mut features = FeatureMatrix::new(&cfg, &mut alloc).unwrap();
//!
//! let audio = vec![0i16; cfg.num_samples];
//! extractor.extract_into(&audio, &mut features).unwrap();
//! assert!(features.as_slice().iter().all(|v| v.is_finite()));
//! ```

mod error;
pub mod mfcc;
pub mod pcm;
pub mod pool;

pub use error::AudioError;
pub use pcm::{normalize, Normalization, SignalStats};
