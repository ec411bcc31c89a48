use std::path::PathBuf;

use thiserror::Error;

use crate::shared::frame::Frame;

#[derive(Error, Debug)]
pub enum EngineError {
    #[error("failed to load model {path}: {source}")]
    ModelLoad {
        path: PathBuf,
        #[source]
        source: ort::Error,
    },
    #[error("inference execution failed: {0}")]
    Execution(#[from] ort::Error),
    #[error("input slot {0} was not loaded before inference")]
    InputNotLoaded(usize),
    #[error("unsupported pixel format with {0} channels")]
    UnsupportedPixelFormat(u8),
    #[error("input image is empty")]
    EmptyInput,
}

/// Minimal contract for executing one trained model.
///
/// Implementations own their tensor buffers exclusively; a slice returned
/// by [`output`](Self::output) is valid only until the next
/// [`run`](Self::run) on the same instance, so callers that need results
/// across runs must copy them out. Instances are not safe for concurrent
/// use; callers serialize load/run per instance.
pub trait InferenceEngine: Send {
    /// Preprocess `frame` into the input tensor at `slot`. An
    /// out-of-range slot is reported and ignored.
    fn load_input(&mut self, frame: &Frame, slot: usize) -> Result<(), EngineError>;

    /// Execute the model. Fails with [`EngineError::InputNotLoaded`] if
    /// any input slot has not been loaded since the previous run.
    fn run(&mut self) -> Result<(), EngineError>;

    /// Flat float view of the output tensor at `slot`; empty for an
    /// out-of-range slot or before the first run.
    fn output(&self, slot: usize) -> &[f32];

    /// Input tensor dimensions at `slot` (NHWC); empty when out of range.
    fn input_shape(&self, slot: usize) -> &[usize];
}
