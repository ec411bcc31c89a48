//! Staged inference pipeline: face detection → face landmarks → iris
//! landmarks, composed by ownership so each stage can be tested alone.

pub mod detection_stage;
pub mod face_mesh;
pub mod iris_stage;
pub mod landmark_stage;

use thiserror::Error;

use crate::inference::engine::{EngineError, InferenceEngine};

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error(transparent)]
    Engine(#[from] EngineError),
    #[error("no frame has been loaded")]
    NoFrameLoaded,
    #[error("eye inference task panicked")]
    EyeTaskPanicked,
}

/// Which eye a query refers to. Left/right are from the subject's
/// perspective, matching the landmark model's index convention.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Eye {
    Left,
    Right,
}

/// Raw landmark buffers hold 3 floats (x, y, z-depth) per point; only
/// x and y are remapped into image space.
pub(crate) fn raw_point(raw: &[f32], index: usize) -> Option<(f32, f32)> {
    Some((*raw.get(index * 3)?, *raw.get(index * 3 + 1)?))
}

/// Input tensor (width, height) from an engine's NHWC shape.
pub(crate) fn input_dims(engine: &dyn InferenceEngine) -> Option<(usize, usize)> {
    let shape = engine.input_shape(0);
    if shape.len() >= 3 {
        Some((shape[2], shape[1]))
    } else {
        None
    }
}
