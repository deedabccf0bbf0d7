//! Capture-to-classification cycle for the MoodLink emotion classifier.
//!
//! One cycle: capture 4 s of PCM16 -> signal statistics -> peak normalization
//! -> MFCC features -> int8 inference -> [`ClassificationResult`].
//!
//! [`PipelineContext`] owns every long-lived buffer (sample buffer, feature
//! matrix, spectral basis, FFT scratch) and the inference adapter. Nothing is
//! allocated per cycle on the serial path.
//!
//! # Errors
//!
//! - Acquisition failures are recoverable ([`PipelineError::is_fatal`] is
//!   false); the caller retries the next cycle.
//! - Silence is not an error: [`CycleReport::silent`] is set and the cycle
//!   runs to the end.
//! - Initialization failures are fatal.
//! - Inference failures never surface as errors; the report carries a result
//!   labelled `error` with zero confidence.
//!
//! [`ClassificationResult`]: moodlink_inference::ClassificationResult

mod capture;
mod config;
mod context;
mod error;
mod metrics;

pub use capture::{Capture, CaptureFunc, ReaderCapture};
pub use config::{PipelineConfig, DEFAULT_MIN_CAPTURE_RATIO, DEFAULT_TARGET_DB};
pub use context::{FeatureStage, PipelineContext};
pub use error::{CaptureError, ConfigError, InitError, PipelineError};
pub use metrics::{CycleReport, StageTimings};
