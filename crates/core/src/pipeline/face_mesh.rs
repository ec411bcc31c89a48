//! Pipeline orchestrator: owns the stages, runs them in order, and
//! answers all landmark/ROI queries in original-image coordinates.

use crate::detection::decoder::{Detection, DetectionPostProcess};
use crate::detection::roi::crop_frame;
use crate::inference::engine::InferenceEngine;
use crate::pipeline::detection_stage::FaceDetectionStage;
use crate::pipeline::iris_stage::{
    IrisLandmarkStage, EYE_LANDMARK_COUNT, IRIS_LANDMARK_COUNT, LEFT_EYE_CORNERS,
    RIGHT_EYE_CORNERS,
};
use crate::pipeline::landmark_stage::{FaceLandmarkStage, FACE_LANDMARK_COUNT};
use crate::pipeline::{Eye, PipelineError};
use crate::shared::frame::Frame;
use crate::shared::rect::{Point, Rect};

/// Full face-mesh pipeline.
///
/// One `run_inference` pass walks Detection → Landmark → Iris; when
/// detection finds nothing the later stages are skipped and every query
/// returns its empty value until the next successful run. A single
/// instance is single-caller: queries are read-only, but `run_inference`
/// must not be invoked concurrently on the same pipeline.
pub struct FaceMeshPipeline {
    detection: FaceDetectionStage,
    landmark: FaceLandmarkStage,
    iris: Option<IrisLandmarkStage>,
    frame: Option<Frame>,
}

impl FaceMeshPipeline {
    pub fn new(
        detection_engine: Box<dyn InferenceEngine>,
        detection_post: DetectionPostProcess,
        landmark_engine: Box<dyn InferenceEngine>,
    ) -> Self {
        Self {
            detection: FaceDetectionStage::new(detection_engine, detection_post),
            landmark: FaceLandmarkStage::new(landmark_engine),
            iris: None,
            frame: None,
        }
    }

    /// Enable the iris stage with one model instance per eye. The two
    /// instances must be independent because they run concurrently.
    pub fn with_iris(
        mut self,
        left_engine: Box<dyn InferenceEngine>,
        right_engine: Box<dyn InferenceEngine>,
    ) -> Self {
        self.iris = Some(IrisLandmarkStage::new(left_engine, right_engine));
        self
    }

    /// Load the next frame to analyze. Re-arms the pipeline; results from
    /// the previous frame stay queryable until the next `run_inference`.
    pub fn load_frame(&mut self, frame: Frame) {
        self.frame = Some(frame);
    }

    /// Execute all stages on the loaded frame. Re-running without a new
    /// `load_frame` re-executes inference on the same cached frame.
    pub fn run_inference(&mut self) -> Result<(), PipelineError> {
        let frame = self.frame.as_ref().ok_or(PipelineError::NoFrameLoaded)?;

        self.detection.run(frame)?;
        let face_roi = self.detection.roi();
        if face_roi.is_empty() {
            // First-class "no face" outcome: skip the dependent stages.
            self.landmark.clear();
            if let Some(iris) = &mut self.iris {
                iris.clear();
            }
            return Ok(());
        }

        let face = crop_frame(frame, face_roi);
        self.landmark.run(&face)?;

        if let Some(iris) = &mut self.iris {
            let left = (
                self.landmark.landmark_at(LEFT_EYE_CORNERS.0, face_roi),
                self.landmark.landmark_at(LEFT_EYE_CORNERS.1, face_roi),
            );
            let right = (
                self.landmark.landmark_at(RIGHT_EYE_CORNERS.0, face_roi),
                self.landmark.landmark_at(RIGHT_EYE_CORNERS.1, face_roi),
            );
            iris.run(frame, left, right)?;
        }
        Ok(())
    }

    /// Face ROI in original-image pixels; empty when the last run found
    /// no face.
    pub fn face_roi(&self) -> Rect {
        self.detection.roi()
    }

    /// The selected detection from the last run (`class_id == -1` when
    /// nothing cleared the threshold).
    pub fn detection(&self) -> Detection {
        self.detection.detection()
    }

    /// One face landmark in original-image pixels. Out-of-range indices
    /// are reported and yield the zero point.
    pub fn face_landmark_at(&self, index: usize) -> Point {
        self.landmark.landmark_at(index, self.detection.roi())
    }

    /// All face landmarks, or an empty vec when the last run found no
    /// face.
    pub fn all_face_landmarks(&self) -> Vec<Point> {
        if self.detection.roi().is_empty() {
            return Vec::new();
        }
        (0..FACE_LANDMARK_COUNT)
            .map(|i| self.face_landmark_at(i))
            .collect()
    }

    /// One eye's ROI; empty without the iris stage or after a no-face
    /// run.
    pub fn eye_roi(&self, eye: Eye) -> Rect {
        match &self.iris {
            Some(iris) => iris.eye_roi(eye),
            None => Rect::default(),
        }
    }

    pub fn eye_landmark_at(&self, eye: Eye, index: usize) -> Point {
        match &self.iris {
            Some(iris) => iris.eye_landmark_at(eye, index),
            None => Point::default(),
        }
    }

    pub fn iris_landmark_at(&self, eye: Eye, index: usize) -> Point {
        match &self.iris {
            Some(iris) => iris.iris_landmark_at(eye, index),
            None => Point::default(),
        }
    }

    /// All eye-contour landmarks for one eye; empty without the iris
    /// stage or after a no-face run.
    pub fn all_eye_landmarks(&self, eye: Eye) -> Vec<Point> {
        if self.detection.roi().is_empty() || self.iris.is_none() {
            return Vec::new();
        }
        (0..EYE_LANDMARK_COUNT)
            .map(|i| self.eye_landmark_at(eye, i))
            .collect()
    }

    /// All iris landmarks for one eye; empty without the iris stage or
    /// after a no-face run.
    pub fn all_iris_landmarks(&self, eye: Eye) -> Vec<Point> {
        if self.detection.roi().is_empty() || self.iris.is_none() {
            return Vec::new();
        }
        (0..IRIS_LANDMARK_COUNT)
            .map(|i| self.iris_landmark_at(eye, i))
            .collect()
    }
}
