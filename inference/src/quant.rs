use serde::{Deserialize, Serialize};

/// Affine int8 quantization parameters of one tensor.
///
/// A real value `v` is stored as `round(v / scale) + zero_point`, clamped to
/// `[-128, 127]`. Supplied by the engine once its model is loaded.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct QuantParams {
    pub scale: f32,
    pub zero_point: i32,
}

impl QuantParams {
    pub fn new(scale: f32, zero_point: i32) -> Self {
        Self { scale, zero_point }
    }

    /// Scale is finite and positive, zero point fits in int8.
    pub fn is_valid(&self) -> bool {
        self.scale.is_finite()
            && self.scale > 0.0
            && (i32::from(i8::MIN)..=i32::from(i8::MAX)).contains(&self.zero_point)
    }

    /// Smallest and largest real values representable without clamping.
    pub fn range(&self) -> (f32, f32) {
        (self.dequantize(i8::MIN), self.dequantize(i8::MAX))
    }

    pub fn quantize(&self, value: f32) -> i8 {
        quantize(value, *self)
    }

    pub fn dequantize(&self, q: i8) -> f32 {
        dequantize(q, *self)
    }
}

/// `clamp(round(value / scale) + zero_point, -128, 127)`
pub fn quantize(value: f32, params: QuantParams) -> i8 {
    let q = ((value / params.scale).round() as i32).saturating_add(params.zero_point);
    q.clamp(i32::from(i8::MIN), i32::from(i8::MAX)) as i8
}

/// `(q - zero_point) * scale`
pub fn dequantize(q: i8, params: QuantParams) -> f32 {
    (i32::from(q) - params.zero_point) as f32 * params.scale
}
