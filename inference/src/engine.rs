use crate::error::EngineError;
use crate::quant::QuantParams;

/// Capability interface of an int8 inference backend.
///
/// The adapter only needs to load a model, read the tensors' quantization
/// parameters, write the input tensor, invoke, and read the output tensor.
/// Operator kernels and tensor allocation stay inside the backend.
///
/// # Lifecycle
///
/// Tensor accessors return `None` until [`Engine::load`] succeeds. A failed
/// load leaves the engine not ready. Reloading replaces the tensors, so
/// callers must not keep tensor data across loads.
pub trait Engine {
    /// Loads a serialized model and allocates its tensors.
    fn load(&mut self, model: &[u8]) -> Result<(), EngineError>;

    /// True once a model is loaded and its tensors are allocated.
    fn is_ready(&self) -> bool;

    fn input_shape(&self) -> Option<&[usize]>;

    fn output_shape(&self) -> Option<&[usize]>;

    fn input_quant_params(&self) -> Option<QuantParams>;

    fn output_quant_params(&self) -> Option<QuantParams>;

    /// Writes one element of the input tensor.
    fn write_input(&mut self, index: usize, value: i8) -> Result<(), EngineError>;

    /// Runs the model on the current input tensor.
    fn invoke(&mut self) -> Result<(), EngineError>;

    /// Reads one element of the output tensor.
    fn read_output(&self, index: usize) -> Result<i8, EngineError>;

    fn input_len(&self) -> Option<usize> {
        self.input_shape().map(|s| s.iter().product())
    }

    fn output_len(&self) -> Option<usize> {
        self.output_shape().map(|s| s.iter().product())
    }

    /// Writes `values` to the input tensor starting at index 0.
    fn write_inputs(&mut self, values: &[i8]) -> Result<(), EngineError> {
        for (i, &v) in values.iter().enumerate() {
            self.write_input(i, v)?;
        }
        Ok(())
    }
}
