use std::io;

use moodlink_audio::AudioError;
use moodlink_inference::InferenceError;
use thiserror::Error;

/// Errors reported by a [`Capture`](crate::Capture) source.
#[derive(Debug, Error)]
pub enum CaptureError {
    #[error("capture: no samples captured")]
    NoSamples,

    #[error("capture: device error: {0}")]
    Device(String),

    #[error("capture: {0}")]
    Io(#[from] io::Error),
}

/// Errors loading a [`PipelineConfig`](crate::PipelineConfig).
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config: read {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: io::Error,
    },

    #[error("config: unsupported extension {0:?} (want json, yaml or yml)")]
    UnsupportedFormat(String),

    #[error("config: json: {0}")]
    Json(#[from] serde_json::Error),

    #[error("config: yaml: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("config: {0}")]
    Invalid(String),
}

/// Why the pipeline context could not be built.
#[derive(Debug, Error)]
pub enum InitError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Audio(#[from] AudioError),

    #[error(transparent)]
    Inference(#[from] InferenceError),

    #[error("model expects {got} input values, feature matrix has {expected}")]
    InputMismatch { expected: usize, got: usize },
}

/// Errors returned by pipeline operations.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Setup failed; nothing can run.
    #[error("pipeline init: {0}")]
    Init(#[from] InitError),

    /// One cycle could not obtain audio; the next may succeed.
    #[error("audio acquisition: {0}")]
    Acquisition(#[from] CaptureError),

    /// Feature extraction rejected the owned buffers.
    #[error("feature extraction: {0}")]
    Extraction(#[source] AudioError),
}

impl PipelineError {
    /// True when the pipeline must stop rather than retry the cycle.
    pub fn is_fatal(&self) -> bool {
        !matches!(self, Self::Acquisition(_))
    }
}

impl From<AudioError> for PipelineError {
    fn from(err: AudioError) -> Self {
        Self::Init(InitError::Audio(err))
    }
}

impl From<InferenceError> for PipelineError {
    fn from(err: InferenceError) -> Self {
        Self::Init(InitError::Inference(err))
    }
}

impl From<ConfigError> for PipelineError {
    fn from(err: ConfigError) -> Self {
        Self::Init(InitError::Config(err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_acquisition_is_recoverable() {
        assert!(!PipelineError::Acquisition(CaptureError::NoSamples).is_fatal());
        assert!(PipelineError::from(AudioError::InvalidConfig("x".into())).is_fatal());
        assert!(PipelineError::from(InferenceError::NotReady("model not loaded")).is_fatal());
        assert!(PipelineError::Extraction(AudioError::ShapeMismatch {
            what: "sample buffer",
            expected: 1,
            got: 2,
        })
        .is_fatal());
    }

    #[test]
    fn messages() {
        let err = PipelineError::Acquisition(CaptureError::NoSamples);
        assert_eq!(err.to_string(), "audio acquisition: capture: no samples captured");

        let err = PipelineError::Init(InitError::InputMismatch {
            expected: 4000,
            got: 10,
        });
        assert_eq!(
            err.to_string(),
            "pipeline init: model expects 10 input values, feature matrix has 4000"
        );
    }
}
