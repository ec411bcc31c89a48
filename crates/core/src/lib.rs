//! Face detection, face landmark and iris landmark post-processing.
//!
//! Decodes anchor-relative detector output into image-space geometry and
//! chains three inference stages (face detection → face landmarks → iris
//! landmarks), where each stage's output determines the next stage's crop
//! region. Model execution is abstracted behind
//! [`inference::engine::InferenceEngine`]; an ONNX Runtime implementation
//! lives in [`inference::ort_engine`].

pub mod detection;
pub mod inference;
pub mod pipeline;
pub mod shared;
