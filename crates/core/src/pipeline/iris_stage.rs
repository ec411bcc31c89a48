//! Third pipeline stage: per-eye iris landmarking, both eyes concurrent.

use crate::detection::roi::{crop_frame, eye_roi, remap_landmark};
use crate::inference::engine::InferenceEngine;
use crate::pipeline::{input_dims, raw_point, Eye, PipelineError};
use crate::shared::frame::Frame;
use crate::shared::rect::{Point, Rect};

/// Eye-contour points per eye in the iris model's first output.
pub const EYE_LANDMARK_COUNT: usize = 71;
/// Iris points per eye in the iris model's second output.
pub const IRIS_LANDMARK_COUNT: usize = 5;

/// Face-landmark index pairs approximating the outer/inner eye corners,
/// used to place each eye's square ROI.
pub(crate) const LEFT_EYE_CORNERS: (usize, usize) = (446, 464);
pub(crate) const RIGHT_EYE_CORNERS: (usize, usize) = (244, 226);

const EYE_OUTPUT_SLOT: usize = 0;
const IRIS_OUTPUT_SLOT: usize = 1;

/// State owned by one eye's inference branch. The two branches share
/// nothing mutable, which is what makes the parallel run safe.
struct EyeBranch {
    engine: Box<dyn InferenceEngine>,
    roi: Rect,
    eye_raw: Vec<f32>,
    iris_raw: Vec<f32>,
}

impl EyeBranch {
    fn new(engine: Box<dyn InferenceEngine>) -> Self {
        Self {
            engine,
            roi: Rect::default(),
            eye_raw: Vec::new(),
            iris_raw: Vec::new(),
        }
    }

    fn run(&mut self, frame: &Frame, corners: (Point, Point)) -> Result<(), PipelineError> {
        self.roi = eye_roi(corners.0, corners.1);
        let patch = crop_frame(frame, self.roi);
        self.engine.load_input(&patch, 0)?;
        self.engine.run()?;
        self.eye_raw = self.engine.output(EYE_OUTPUT_SLOT).to_vec();
        self.iris_raw = self.engine.output(IRIS_OUTPUT_SLOT).to_vec();
        Ok(())
    }

    fn clear(&mut self) {
        self.roi = Rect::default();
        self.eye_raw.clear();
        self.iris_raw.clear();
    }

    fn landmark_at(&self, raw: &[f32], index: usize) -> Point {
        let Some((raw_x, raw_y)) = raw_point(raw, index) else {
            return Point::default();
        };
        let Some((input_w, input_h)) = input_dims(self.engine.as_ref()) else {
            return Point::default();
        };
        remap_landmark(raw_x, raw_y, self.roi, input_w, input_h)
    }
}

/// Runs two independent iris-model instances, one per eye.
///
/// Each branch owns its engine, ROI and output buffers, so the two runs
/// execute on separate threads with no locking; queries are only valid
/// after both have joined.
pub struct IrisLandmarkStage {
    left: EyeBranch,
    right: EyeBranch,
}

impl IrisLandmarkStage {
    pub fn new(
        left_engine: Box<dyn InferenceEngine>,
        right_engine: Box<dyn InferenceEngine>,
    ) -> Self {
        Self {
            left: EyeBranch::new(left_engine),
            right: EyeBranch::new(right_engine),
        }
    }

    /// Fork both eye inferences and join before returning. Results land
    /// in each branch's own slots, so completion order does not matter.
    pub fn run(
        &mut self,
        frame: &Frame,
        left_corners: (Point, Point),
        right_corners: (Point, Point),
    ) -> Result<(), PipelineError> {
        let (left, right) = (&mut self.left, &mut self.right);

        let (left_result, right_result) = std::thread::scope(|scope| {
            let handle = scope.spawn(move || left.run(frame, left_corners));
            let right_result = right.run(frame, right_corners);
            (handle.join(), right_result)
        });

        match left_result {
            Ok(result) => result?,
            Err(_) => return Err(PipelineError::EyeTaskPanicked),
        }
        right_result
    }

    pub fn clear(&mut self) {
        self.left.clear();
        self.right.clear();
    }

    /// Eye ROI in original-image pixels.
    pub fn eye_roi(&self, eye: Eye) -> Rect {
        self.branch(eye).roi
    }

    /// Eye-contour landmark remapped into original-image pixels.
    /// Out-of-range indices are reported and yield the zero point.
    pub fn eye_landmark_at(&self, eye: Eye, index: usize) -> Point {
        if index >= EYE_LANDMARK_COUNT {
            log::warn!("eye landmark index {index} is out of range ({EYE_LANDMARK_COUNT})");
            return Point::default();
        }
        let branch = self.branch(eye);
        branch.landmark_at(&branch.eye_raw, index)
    }

    /// Iris landmark remapped into original-image pixels.
    pub fn iris_landmark_at(&self, eye: Eye, index: usize) -> Point {
        if index >= IRIS_LANDMARK_COUNT {
            log::warn!("iris landmark index {index} is out of range ({IRIS_LANDMARK_COUNT})");
            return Point::default();
        }
        let branch = self.branch(eye);
        branch.landmark_at(&branch.iris_raw, index)
    }

    fn branch(&self, eye: Eye) -> &EyeBranch {
        match eye {
            Eye::Left => &self.left,
            Eye::Right => &self.right,
        }
    }
}
