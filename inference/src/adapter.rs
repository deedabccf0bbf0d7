use std::time::Instant;

use serde::Serialize;
use tracing::{info, warn};

use crate::emotion::{ClassificationResult, InferenceFailure, NUM_EMOTIONS};
use crate::engine::Engine;
use crate::error::InferenceError;
use crate::quant::{dequantize, quantize, QuantParams};

/// Tensor geometry and quantization of a loaded model.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ModelInfo {
    pub input_shape: Vec<usize>,
    pub output_shape: Vec<usize>,
    pub input: QuantParams,
    pub output: QuantParams,
}

impl ModelInfo {
    pub fn input_len(&self) -> usize {
        self.input_shape.iter().product()
    }

    pub fn output_len(&self) -> usize {
        self.output_shape.iter().product()
    }
}

/// Bridges f32 features to an int8 [`Engine`] and back.
///
/// ```ignore
/// let mut adapter = QuantizationAdapter::new(DenseEngine::new());
/// adapter.load(&model_bytes)?;
/// let result = adapter.classify(features.as_slice());
/// ```
#[derive(Debug)]
pub struct QuantizationAdapter<E> {
    engine: E,
}

impl<E: Engine> QuantizationAdapter<E> {
    pub fn new(engine: E) -> Self {
        Self { engine }
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    pub fn into_engine(self) -> E {
        self.engine
    }

    /// Loads `model` into the engine and checks it can serve classifications.
    pub fn load(&mut self, model: &[u8]) -> Result<ModelInfo, InferenceError> {
        self.engine.load(model)?;
        let info = self.model_info()?;
        info!(
            input_shape = ?info.input_shape,
            output_shape = ?info.output_shape,
            input_scale = info.input.scale,
            input_zero_point = info.input.zero_point,
            output_scale = info.output.scale,
            output_zero_point = info.output.zero_point,
            "inference: model loaded"
        );
        Ok(info)
    }

    /// Describes the loaded model, or explains why it cannot be used.
    pub fn model_info(&self) -> Result<ModelInfo, InferenceError> {
        let e = &self.engine;
        if !e.is_ready() {
            return Err(InferenceError::NotReady("model not loaded"));
        }
        let input_shape = e
            .input_shape()
            .ok_or(InferenceError::NotReady("input tensor missing"))?
            .to_vec();
        let output_shape = e
            .output_shape()
            .ok_or(InferenceError::NotReady("output tensor missing"))?
            .to_vec();
        let input = checked_params("input", e.input_quant_params())?;
        let output = checked_params("output", e.output_quant_params())?;

        let info = ModelInfo {
            input_shape,
            output_shape,
            input,
            output,
        };
        if info.output_len() < NUM_EMOTIONS {
            return Err(InferenceError::OutputTooSmall {
                need: NUM_EMOTIONS,
                got: info.output_len(),
            });
        }
        Ok(info)
    }

    /// Classifies one feature matrix.
    ///
    /// Never fails: any problem yields [`ClassificationResult::failure`].
    pub fn classify(&mut self, features: &[f32]) -> ClassificationResult {
        match self.run(features) {
            Ok(result) => result,
            Err(reason) => {
                warn!(%reason, "inference: classification failed");
                ClassificationResult::failure(reason)
            }
        }
    }

    fn run(&mut self, features: &[f32]) -> Result<ClassificationResult, InferenceFailure> {
        let (input, output) = self.ready_params()?;

        match self.engine.input_len() {
            Some(n) if n == features.len() => {}
            Some(n) => {
                warn!(expected = n, got = features.len(), "inference: feature length mismatch");
                return Err(InferenceFailure::InputShape);
            }
            None => return Err(InferenceFailure::NotReady),
        }

        for (i, &v) in features.iter().enumerate() {
            self.engine
                .write_input(i, quantize(v, input))
                .map_err(|_| InferenceFailure::WriteInput)?;
        }

        let start = Instant::now();
        if let Err(err) = self.engine.invoke() {
            warn!(%err, "inference: invoke failed");
            return Err(InferenceFailure::Invoke);
        }
        let elapsed_ms = start.elapsed().as_secs_f64() * 1000.0;
        info!(elapsed_ms, "inference: invoke complete");

        let mut scores = [0.0f32; NUM_EMOTIONS];
        for (i, score) in scores.iter_mut().enumerate() {
            let q = self
                .engine
                .read_output(i)
                .map_err(|_| InferenceFailure::ReadOutput)?;
            *score = dequantize(q, output);
        }

        Ok(ClassificationResult::from_scores(scores))
    }

    /// Light per-cycle readiness check; no allocation.
    fn ready_params(&self) -> Result<(QuantParams, QuantParams), InferenceFailure> {
        let e = &self.engine;
        if !e.is_ready() {
            return Err(InferenceFailure::NotReady);
        }
        let input = e.input_quant_params().filter(QuantParams::is_valid);
        let output = e.output_quant_params().filter(QuantParams::is_valid);
        match (input, output, e.output_len()) {
            (Some(i), Some(o), Some(n)) if n >= NUM_EMOTIONS => Ok((i, o)),
            _ => Err(InferenceFailure::NotReady),
        }
    }
}

fn checked_params(
    tensor: &'static str,
    params: Option<QuantParams>,
) -> Result<QuantParams, InferenceError> {
    let p = params.ok_or(InferenceError::NotReady("quantization params missing"))?;
    if !p.is_valid() {
        return Err(InferenceError::InvalidQuantParams {
            tensor,
            scale: p.scale,
            zero_point: p.zero_point,
        });
    }
    Ok(p)
}
