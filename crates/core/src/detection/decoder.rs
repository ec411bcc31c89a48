//! Anchor-relative box decoding and highest-confidence detection selection.

use crate::shared::rect::RectF;

/// Default confidence threshold below which a box is never selected.
pub const DEFAULT_MIN_SCORE: f32 = 0.75;

/// Output-head geometry of a supported detector variant.
///
/// `coords_per_box` counts every regressor slot per box; only the first
/// four (center x/y, width, height) are decoded; the remainder are
/// auxiliary keypoints this pipeline does not use.
#[derive(Clone, Copy, Debug)]
pub struct DetectorConfig {
    /// Model input resolution the regressor deltas are scaled by.
    pub input_size: u32,
    pub num_boxes: usize,
    pub coords_per_box: usize,
    pub min_score: f32,
    pub class_id: i32,
}

impl DetectorConfig {
    /// BlazeFace short-range: 128×128 input, 896 boxes, 16 coords each.
    pub fn short_range() -> Self {
        Self {
            input_size: 128,
            num_boxes: 896,
            coords_per_box: 16,
            min_score: DEFAULT_MIN_SCORE,
            class_id: 0,
        }
    }

    /// Full-range variant: 192×192 input, 2944 boxes, 18 coords each.
    /// Anchors come from a precomputed table, not a grid.
    pub fn full_range() -> Self {
        Self {
            input_size: 192,
            num_boxes: 2944,
            coords_per_box: 18,
            min_score: DEFAULT_MIN_SCORE,
            class_id: 0,
        }
    }
}

/// A single selected detection in normalized image coordinates.
///
/// `class_id == -1` is the "no detection" sentinel: nothing cleared the
/// confidence threshold. That is a first-class outcome, not an error.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Detection {
    pub score: f32,
    pub class_id: i32,
    pub region: RectF,
}

impl Detection {
    pub fn none() -> Self {
        Self {
            score: 0.0,
            class_id: -1,
            region: RectF::default(),
        }
    }

    pub fn is_none(&self) -> bool {
        self.class_id == -1
    }
}

/// Decodes a detector's raw regressor/classificator output against a
/// fixed anchor sequence and selects the best box.
pub struct DetectionPostProcess {
    config: DetectorConfig,
    anchors: Vec<RectF>,
}

impl DetectionPostProcess {
    /// Anchor order must match the detector's output head; count equal to
    /// `config.num_boxes` is a caller contract.
    pub fn new(config: DetectorConfig, anchors: Vec<RectF>) -> Self {
        Self { config, anchors }
    }

    pub fn config(&self) -> &DetectorConfig {
        &self.config
    }

    /// Single linear pass over all boxes, tracking the running maximum
    /// score that exceeds `max(min_score, best_so_far)`. Strict `>`
    /// keeps the first occurrence on ties. No non-max suppression: the
    /// pipeline consumes exactly one face.
    pub fn highest_score_detection(&self, raw_boxes: &[f32], scores: &[f32]) -> Detection {
        let mut best = Detection::none();
        let count = self
            .config
            .num_boxes
            .min(scores.len())
            .min(self.anchors.len());

        for (i, &score) in scores.iter().enumerate().take(count) {
            if score > self.config.min_score.max(best.score) {
                if let Some(region) = self.decode_box(raw_boxes, i) {
                    best = Detection {
                        score,
                        class_id: self.config.class_id,
                        region,
                    };
                }
            }
        }
        best
    }

    /// Undo the anchor-relative, input-size-normalized box encoding:
    /// deltas are in model-input pixels, scaled by the anchor size and
    /// offset from the anchor center.
    fn decode_box(&self, raw_boxes: &[f32], index: usize) -> Option<RectF> {
        let offset = index * self.config.coords_per_box;
        let coords = raw_boxes.get(offset..offset + 4)?;

        let anchor = self.anchors[index];
        let (acx, acy) = anchor.center();
        let scale = self.config.input_size as f32;

        let cx = coords[0] / scale * anchor.width + acx;
        let cy = coords[1] / scale * anchor.height + acy;
        let w = coords[2] / scale * anchor.width;
        let h = coords[3] / scale * anchor.height;

        Some(RectF::from_center(cx, cy, w, h))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detection::anchors::GridAnchorLayout;
    use approx::assert_relative_eq;

    fn config(num_boxes: usize) -> DetectorConfig {
        DetectorConfig {
            input_size: 128,
            num_boxes,
            coords_per_box: 16,
            min_score: DEFAULT_MIN_SCORE,
            class_id: 0,
        }
    }

    /// Boxes where box `i` decodes to a distinct width of `i + 1` input
    /// pixels, so tests can tell which index was selected.
    fn tagged_boxes(n: usize) -> Vec<f32> {
        let mut boxes = vec![0.0f32; n * 16];
        for i in 0..n {
            boxes[i * 16 + 2] = (i + 1) as f32;
            boxes[i * 16 + 3] = (i + 1) as f32;
        }
        boxes
    }

    fn unit_anchors(n: usize) -> Vec<RectF> {
        vec![RectF::from_center(0.5, 0.5, 1.0, 1.0); n]
    }

    #[test]
    fn test_decode_identity_scale() {
        // Anchor centered at (0,0) with unit size: a raw box
        // (0, 0, 128, 128) at input size 128 decodes to (-0.5, -0.5, 1, 1).
        let anchors = vec![RectF::from_center(0.0, 0.0, 1.0, 1.0)];
        let post = DetectionPostProcess::new(config(1), anchors);
        let region = post
            .decode_box(&[0.0, 0.0, 128.0, 128.0], 0)
            .expect("in range");
        assert_relative_eq!(region.x, -0.5);
        assert_relative_eq!(region.y, -0.5);
        assert_relative_eq!(region.width, 1.0);
        assert_relative_eq!(region.height, 1.0);
    }

    #[test]
    fn test_decode_offsets_from_anchor_center() {
        // Delta of (64, 32) input pixels on a unit anchor at (0.5, 0.5)
        // moves the center by (0.5, 0.25).
        let post = DetectionPostProcess::new(config(1), unit_anchors(1));
        let region = post
            .decode_box(&[64.0, 32.0, 12.8, 12.8], 0)
            .expect("in range");
        let (cx, cy) = region.center();
        assert_relative_eq!(cx, 1.0);
        assert_relative_eq!(cy, 0.75);
        assert_relative_eq!(region.width, 0.1);
    }

    #[test]
    fn test_decode_uses_only_first_four_coords() {
        let mut boxes = vec![0.0f32; 16];
        boxes[2] = 128.0;
        boxes[3] = 128.0;
        for slot in boxes.iter_mut().skip(4) {
            *slot = 9999.0; // auxiliary keypoints, must be ignored
        }
        let post = DetectionPostProcess::new(config(1), unit_anchors(1));
        let region = post.decode_box(&boxes, 0).expect("in range");
        assert_relative_eq!(region.width, 1.0);
        assert_relative_eq!(region.height, 1.0);
    }

    #[test]
    fn test_selector_picks_unique_maximum() {
        let scores = [0.6, 0.9, 0.9, 0.95];
        let post = DetectionPostProcess::new(config(4), unit_anchors(4));
        let det = post.highest_score_detection(&tagged_boxes(4), &scores);
        assert!(!det.is_none());
        assert_relative_eq!(det.score, 0.95);
        // Width tag of index 3 is 4 input pixels = 4/128 normalized.
        assert_relative_eq!(det.region.width, 4.0 / 128.0);
    }

    #[test]
    fn test_selector_all_below_threshold_returns_none() {
        let scores = [0.1, 0.5, 0.74, 0.2];
        let post = DetectionPostProcess::new(config(4), unit_anchors(4));
        let det = post.highest_score_detection(&tagged_boxes(4), &scores);
        assert!(det.is_none());
        assert_relative_eq!(det.score, 0.0);
    }

    #[test]
    fn test_selector_tie_break_keeps_first_seen() {
        // Two equal maxima above threshold: strict > keeps the lower index.
        let scores = [0.5, 0.9, 0.9, 0.8];
        let post = DetectionPostProcess::new(config(4), unit_anchors(4));
        let det = post.highest_score_detection(&tagged_boxes(4), &scores);
        assert_relative_eq!(det.score, 0.9);
        assert_relative_eq!(det.region.width, 2.0 / 128.0);
    }

    #[test]
    fn test_selector_threshold_is_exclusive() {
        let scores = [DEFAULT_MIN_SCORE];
        let post = DetectionPostProcess::new(config(1), unit_anchors(1));
        let det = post.highest_score_detection(&tagged_boxes(1), &scores);
        assert!(det.is_none());
    }

    #[test]
    fn test_selector_assigns_configured_class_id() {
        let scores = [0.9];
        let post = DetectionPostProcess::new(config(1), unit_anchors(1));
        let det = post.highest_score_detection(&tagged_boxes(1), &scores);
        assert_eq!(det.class_id, 0);
    }

    #[test]
    fn test_selector_tolerates_short_buffers() {
        // Fewer scores/boxes than the declared box count must not panic.
        let post = DetectionPostProcess::new(config(896), unit_anchors(896));
        let det = post.highest_score_detection(&tagged_boxes(2), &[0.9, 0.8]);
        assert_relative_eq!(det.score, 0.9);
    }

    #[test]
    fn test_short_range_layout_matches_config() {
        let anchors = GridAnchorLayout::short_range().generate();
        assert_eq!(anchors.len(), DetectorConfig::short_range().num_boxes);
    }
}
