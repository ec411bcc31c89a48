//! First pipeline stage: run the face detector and derive the face ROI.

use crate::detection::decoder::{Detection, DetectionPostProcess};
use crate::detection::roi::face_roi_from_detection;
use crate::inference::engine::InferenceEngine;
use crate::pipeline::PipelineError;
use crate::shared::frame::Frame;
use crate::shared::rect::Rect;

/// Regressor output slot of the detection model.
const REGRESSOR_SLOT: usize = 0;
/// Classificator (score) output slot of the detection model.
const CLASSIFICATOR_SLOT: usize = 1;

pub struct FaceDetectionStage {
    engine: Box<dyn InferenceEngine>,
    post: DetectionPostProcess,
    detection: Detection,
    roi: Rect,
}

impl FaceDetectionStage {
    pub fn new(engine: Box<dyn InferenceEngine>, post: DetectionPostProcess) -> Self {
        Self {
            engine,
            post,
            detection: Detection::none(),
            roi: Rect::default(),
        }
    }

    /// Run detection on the full frame. An empty resulting ROI means no
    /// face cleared the confidence threshold; downstream stages skip.
    pub fn run(&mut self, frame: &Frame) -> Result<(), PipelineError> {
        self.engine.load_input(frame, 0)?;
        self.engine.run()?;

        self.detection = self.post.highest_score_detection(
            self.engine.output(REGRESSOR_SLOT),
            self.engine.output(CLASSIFICATOR_SLOT),
        );

        self.roi = if self.detection.is_none() {
            log::debug!("no face above threshold");
            Rect::default()
        } else {
            face_roi_from_detection(&self.detection, frame.width(), frame.height())
        };
        Ok(())
    }

    /// Face ROI in original-image pixels; empty when no face was found.
    pub fn roi(&self) -> Rect {
        self.roi
    }

    pub fn detection(&self) -> Detection {
        self.detection
    }
}
