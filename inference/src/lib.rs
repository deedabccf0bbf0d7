//! Quantized inference adapter for the MoodLink emotion classifier.
//!
//! # Architecture
//!
//! Features leave the float domain and come back in three steps:
//!
//! 1. [`quantize`]: f32 features -> int8 input tensor (`round(v/scale) + zp`)
//! 2. [`Engine::invoke`]: opaque int8 model execution
//! 3. [`dequantize`]: int8 outputs -> per-class scores, arg-max -> [`Label`]
//!
//! [`QuantizationAdapter`] drives these steps against any [`Engine`]. It never
//! fails a cycle with an error: problems during classification produce a
//! [`ClassificationResult`] labelled `error` with zero confidence.
//!
//! # Backends
//!
//! [`DenseEngine`] is a pure-Rust int8 fully-connected backend loaded from a
//! JSON model document. It is enough to run the pipeline end to end on a host
//! and serves as the reference implementation of the [`Engine`] contract.

mod adapter;
mod dense;
mod emotion;
mod engine;
mod error;
mod quant;

pub use adapter::{ModelInfo, QuantizationAdapter};
pub use dense::{DenseEngine, DenseModel};
pub use emotion::{
    ClassificationResult, Emotion, InferenceFailure, Label, EMOTION_LABELS, NUM_EMOTIONS,
};
pub use engine::Engine;
pub use error::{EngineError, InferenceError};
pub use quant::{dequantize, quantize, QuantParams};
