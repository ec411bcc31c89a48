//! Second pipeline stage: dense face landmarks on the cropped face ROI.

use crate::detection::roi::remap_landmark;
use crate::inference::engine::InferenceEngine;
use crate::pipeline::{input_dims, raw_point, PipelineError};
use crate::shared::frame::Frame;
use crate::shared::rect::{Point, Rect};

/// Points produced by the face landmark model.
pub const FACE_LANDMARK_COUNT: usize = 468;

pub struct FaceLandmarkStage {
    engine: Box<dyn InferenceEngine>,
    /// Raw model output, 3 floats per landmark. Copied out of the engine
    /// after each run; empty until the first run or after a no-face run.
    raw: Vec<f32>,
}

impl FaceLandmarkStage {
    pub fn new(engine: Box<dyn InferenceEngine>) -> Self {
        Self {
            engine,
            raw: Vec::new(),
        }
    }

    /// Run the landmark model on the cropped face patch.
    pub fn run(&mut self, face: &Frame) -> Result<(), PipelineError> {
        self.engine.load_input(face, 0)?;
        self.engine.run()?;
        self.raw = self.engine.output(0).to_vec();
        Ok(())
    }

    /// Drop cached output after a no-detection run.
    pub fn clear(&mut self) {
        self.raw.clear();
    }

    /// Landmark `index` remapped into original-image pixels through the
    /// face ROI. Out-of-range indices are reported and yield the zero
    /// point.
    pub fn landmark_at(&self, index: usize, face_roi: Rect) -> Point {
        if index >= FACE_LANDMARK_COUNT {
            log::warn!("face landmark index {index} is out of range ({FACE_LANDMARK_COUNT})");
            return Point::default();
        }
        let Some((raw_x, raw_y)) = raw_point(&self.raw, index) else {
            return Point::default();
        };
        let Some((input_w, input_h)) = input_dims(self.engine.as_ref()) else {
            return Point::default();
        };
        remap_landmark(raw_x, raw_y, face_roi, input_w, input_h)
    }
}
