//! Pure-Rust int8 fully-connected backend.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::engine::Engine;
use crate::error::EngineError;
use crate::quant::{quantize, QuantParams};

/// JSON model document for [`DenseEngine`].
///
/// ```json
/// {
///   "input_shape": [1, 40, 100, 1],
///   "input": { "scale": 0.05, "zero_point": 0 },
///   "output": { "scale": 0.00390625, "zero_point": -128 },
///   "weight_scale": 0.01,
///   "weights": [[...], ...],
///   "bias": [0, 0, 0, 0, 0, 0, 0],
///   "softmax": true
/// }
/// ```
///
/// `weights` has one row per output, each as long as the flattened input.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DenseModel {
    pub input_shape: Vec<usize>,
    pub input: QuantParams,
    pub output: QuantParams,
    pub weight_scale: f32,
    pub weights: Vec<Vec<i8>>,
    #[serde(default)]
    pub bias: Vec<i32>,
    #[serde(default)]
    pub softmax: bool,
}

impl DenseModel {
    pub fn input_len(&self) -> usize {
        self.input_shape.iter().product()
    }

    pub fn to_json(&self) -> Result<Vec<u8>, EngineError> {
        serde_json::to_vec(self).map_err(|e| EngineError::InvalidModel(e.to_string()))
    }

    pub fn from_json(data: &[u8]) -> Result<Self, EngineError> {
        if data.is_empty() {
            return Err(EngineError::EmptyModel);
        }
        let model: Self =
            serde_json::from_slice(data).map_err(|e| EngineError::InvalidModel(e.to_string()))?;
        model.validate()?;
        Ok(model)
    }

    fn validate(&self) -> Result<(), EngineError> {
        let invalid = |msg: String| -> Result<(), EngineError> { Err(EngineError::InvalidModel(msg)) };

        let n_in = self.input_len();
        if n_in == 0 {
            return invalid("input tensor is empty".into());
        }
        if self.weights.is_empty() {
            return invalid("no output rows".into());
        }
        if let Some((j, row)) = self.weights.iter().enumerate().find(|(_, r)| r.len() != n_in) {
            return invalid(format!("weight row {j} has {} entries, want {n_in}", row.len()));
        }
        if !self.bias.is_empty() && self.bias.len() != self.weights.len() {
            return invalid(format!(
                "bias has {} entries, want {}",
                self.bias.len(),
                self.weights.len()
            ));
        }
        if !(self.weight_scale.is_finite() && self.weight_scale > 0.0) {
            return invalid(format!("weight_scale {} must be positive", self.weight_scale));
        }
        for (name, p) in [("input", self.input), ("output", self.output)] {
            if !p.is_valid() {
                return invalid(format!(
                    "{name} params scale={} zero_point={}",
                    p.scale, p.zero_point
                ));
            }
        }
        Ok(())
    }
}

#[derive(Debug)]
struct Loaded {
    model: DenseModel,
    output_shape: [usize; 2],
    input: Vec<i8>,
    logits: Vec<f32>,
    output: Vec<i8>,
}

/// Reference [`Engine`]: one int8 dense layer with an optional softmax head.
#[derive(Debug, Default)]
pub struct DenseEngine {
    loaded: Option<Loaded>,
}

impl DenseEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn model(&self) -> Option<&DenseModel> {
        self.loaded.as_ref().map(|l| &l.model)
    }
}

impl Engine for DenseEngine {
    fn load(&mut self, model: &[u8]) -> Result<(), EngineError> {
        self.loaded = None;
        let model = DenseModel::from_json(model)?;
        let n_out = model.weights.len();
        debug!(inputs = model.input_len(), outputs = n_out, "dense: model parsed");

        self.loaded = Some(Loaded {
            output_shape: [1, n_out],
            input: vec![0; model.input_len()],
            logits: vec![0.0; n_out],
            output: vec![0; n_out],
            model,
        });
        Ok(())
    }

    fn is_ready(&self) -> bool {
        self.loaded.is_some()
    }

    fn input_shape(&self) -> Option<&[usize]> {
        self.loaded.as_ref().map(|l| l.model.input_shape.as_slice())
    }

    fn output_shape(&self) -> Option<&[usize]> {
        self.loaded.as_ref().map(|l| l.output_shape.as_slice())
    }

    fn input_quant_params(&self) -> Option<QuantParams> {
        self.loaded.as_ref().map(|l| l.model.input)
    }

    fn output_quant_params(&self) -> Option<QuantParams> {
        self.loaded.as_ref().map(|l| l.model.output)
    }

    fn write_input(&mut self, index: usize, value: i8) -> Result<(), EngineError> {
        let l = self.loaded.as_mut().ok_or(EngineError::NotReady)?;
        let len = l.input.len();
        let slot = l
            .input
            .get_mut(index)
            .ok_or(EngineError::IndexOutOfRange { index, len })?;
        *slot = value;
        Ok(())
    }

    fn invoke(&mut self) -> Result<(), EngineError> {
        let l = self.loaded.as_mut().ok_or(EngineError::NotReady)?;
        let m = &l.model;
        let zp_in = i64::from(m.input.zero_point);
        let rescale = m.input.scale * m.weight_scale;

        for (j, (row, logit)) in m.weights.iter().zip(l.logits.iter_mut()).enumerate() {
            let bias = m.bias.get(j).copied().map_or(0, i64::from);
            let acc = row
                .iter()
                .zip(&l.input)
                .fold(bias, |acc, (&w, &x)| acc + (i64::from(x) - zp_in) * i64::from(w));
            *logit = acc as f32 * rescale;
        }

        if m.softmax {
            softmax(&mut l.logits);
        }
        if let Some(bad) = l.logits.iter().position(|v| !v.is_finite()) {
            return Err(EngineError::Invoke(format!("output {bad} is not finite")));
        }

        for (q, &v) in l.output.iter_mut().zip(&l.logits) {
            *q = quantize(v, m.output);
        }
        Ok(())
    }

    fn read_output(&self, index: usize) -> Result<i8, EngineError> {
        let l = self.loaded.as_ref().ok_or(EngineError::NotReady)?;
        l.output.get(index).copied().ok_or(EngineError::IndexOutOfRange {
            index,
            len: l.output.len(),
        })
    }
}

fn softmax(values: &mut [f32]) {
    let max = values.iter().copied().fold(f32::NEG_INFINITY, f32::max);
    let mut sum = 0.0;
    for v in values.iter_mut() {
        *v = (*v - max).exp();
        sum += *v;
    }
    for v in values.iter_mut() {
        *v /= sum;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn identity_model(softmax: bool) -> DenseModel {
        // 7 inputs, 7 outputs, w = identity * 100.
        let weights = (0..7)
            .map(|j| (0..7).map(|i| if i == j { 100 } else { 0 }).collect())
            .collect();
        DenseModel {
            input_shape: vec![1, 7],
            input: QuantParams::new(0.1, 0),
            output: QuantParams::new(1.0 / 256.0, -128),
            weight_scale: 0.01,
            weights,
            bias: vec![],
            softmax,
        }
    }

    fn loaded(model: &DenseModel) -> DenseEngine {
        let mut engine = DenseEngine::new();
        engine.load(&model.to_json().unwrap()).unwrap();
        engine
    }

    #[test]
    fn load_exposes_tensors() {
        let engine = loaded(&identity_model(true));
        assert!(engine.is_ready());
        assert_eq!(engine.input_len(), Some(7));
        assert_eq!(engine.output_shape(), Some(&[1usize, 7][..]));
        assert_eq!(engine.output_quant_params(), Some(QuantParams::new(1.0 / 256.0, -128)));
    }

    #[test]
    fn unloaded_engine_refuses_work() {
        let mut engine = DenseEngine::new();
        assert!(!engine.is_ready());
        assert_eq!(engine.input_shape(), None);
        assert!(matches!(engine.write_input(0, 1), Err(EngineError::NotReady)));
        assert!(matches!(engine.invoke(), Err(EngineError::NotReady)));
        assert!(matches!(engine.read_output(0), Err(EngineError::NotReady)));
    }

    #[test]
    fn load_rejects_malformed_documents() {
        let mut engine = DenseEngine::new();
        assert!(matches!(engine.load(b""), Err(EngineError::EmptyModel)));
        assert!(matches!(engine.load(b"{"), Err(EngineError::InvalidModel(_))));

        let mut m = identity_model(false);
        m.weights[3].pop();
        assert!(matches!(engine.load(&m.to_json().unwrap()), Err(EngineError::InvalidModel(_))));

        let mut m = identity_model(false);
        m.bias = vec![0; 3];
        assert!(matches!(engine.load(&m.to_json().unwrap()), Err(EngineError::InvalidModel(_))));

        let mut m = identity_model(false);
        m.output.zero_point = 300;
        assert!(matches!(engine.load(&m.to_json().unwrap()), Err(EngineError::InvalidModel(_))));
        assert!(!engine.is_ready());
    }

    #[test]
    fn linear_layer_with_bias() {
        let mut m = identity_model(false);
        m.output = QuantParams::new(0.1, 0);
        m.bias = vec![0, 0, 80, 0, 0, 0, 0];
        let mut engine = loaded(&m);

        // x = 10 -> (10 - 0) * 100 = 1000 -> * 0.1 * 0.01 = 1.0 -> q 10
        engine.write_inputs(&[10, 0, 0, 0, 0, 0, -5]).unwrap();
        engine.invoke().unwrap();
        assert_eq!(engine.read_output(0).unwrap(), 10);
        assert_eq!(engine.read_output(1).unwrap(), 0);
        // bias 80 -> 0.08 -> round(0.8) = 1
        assert_eq!(engine.read_output(2).unwrap(), 1);
        assert_eq!(engine.read_output(6).unwrap(), -5);
        assert!(matches!(
            engine.read_output(7),
            Err(EngineError::IndexOutOfRange { index: 7, len: 7 })
        ));
    }

    #[test]
    fn softmax_head_sums_to_one() {
        let mut engine = loaded(&identity_model(true));
        engine.write_inputs(&[0, 0, 0, 30, 0, 0, 0]).unwrap();
        engine.invoke().unwrap();

        let out = engine.output_quant_params().unwrap();
        let probs: Vec<f32> = (0..7)
            .map(|i| out.dequantize(engine.read_output(i).unwrap()))
            .collect();
        let sum: f32 = probs.iter().sum();
        assert!((sum - 1.0).abs() < 0.05, "sum {sum}");
        let best = probs
            .iter()
            .enumerate()
            .fold(0, |b, (i, &p)| if p > probs[b] { i } else { b });
        assert_eq!(best, 3);
    }

    #[test]
    fn input_write_out_of_range() {
        let mut engine = loaded(&identity_model(false));
        assert!(matches!(
            engine.write_inputs(&[0; 8]),
            Err(EngineError::IndexOutOfRange { index: 7, len: 7 })
        ));
    }
}
