use thiserror::Error;

/// Errors reported by an inference backend.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("engine: model not loaded")]
    NotReady,

    #[error("engine: empty model data")]
    EmptyModel,

    #[error("engine: invalid model: {0}")]
    InvalidModel(String),

    #[error("engine: tensor index {index} out of range (len {len})")]
    IndexOutOfRange { index: usize, len: usize },

    #[error("engine: invoke failed: {0}")]
    Invoke(String),
}

/// Errors raised while bringing the adapter up. All of them are fatal: the
/// pipeline cannot classify without a ready model.
#[derive(Debug, Error)]
pub enum InferenceError {
    #[error("load model: {0}")]
    Load(#[from] EngineError),

    #[error("engine not ready: {0}")]
    NotReady(&'static str),

    #[error("invalid quantization params for {tensor} tensor: scale={scale} zero_point={zero_point}")]
    InvalidQuantParams {
        tensor: &'static str,
        scale: f32,
        zero_point: i32,
    },

    #[error("output tensor has {got} elements, need at least {need}")]
    OutputTooSmall { need: usize, got: usize },
}
