//! Region-of-interest geometry: detection → face ROI, landmark → eye ROI,
//! padding-safe cropping, and model-space → image-space landmark remapping.

use crate::detection::decoder::Detection;
use crate::shared::frame::Frame;
use crate::shared::rect::{Point, Rect};

/// Horizontal expansion of the detection box when deriving the face ROI.
const FACE_ROI_WIDTH_SCALE: f32 = 1.5;
/// Vertical expansion; taller than wide so the crop keeps forehead and chin.
const FACE_ROI_HEIGHT_SCALE: f32 = 2.0;

/// Map a normalized detection onto the original image and expand it into
/// the looser crop the landmark model expects. Coordinates are truncated
/// to whole pixels.
pub fn face_roi_from_detection(detection: &Detection, width: u32, height: u32) -> Rect {
    let (ncx, ncy) = detection.region.center();
    let cx = ncx * width as f32;
    let cy = ncy * height as f32;

    let w = detection.region.width * width as f32 * FACE_ROI_WIDTH_SCALE;
    let h = detection.region.height * height as f32 * FACE_ROI_HEIGHT_SCALE;

    Rect {
        x: (cx.trunc() - w / 2.0) as i32,
        y: (cy.trunc() - h / 2.0) as i32,
        width: w as i32,
        height: h as i32,
    }
}

/// Square ROI for one eye, centered between its two corner landmarks and
/// sized to the larger of the horizontal/vertical span between them.
pub fn eye_roi(a: Point, b: Point) -> Rect {
    let cx = (a.x + b.x) / 2;
    let cy = (a.y + b.y) / 2;
    let size = (a.x - b.x).abs().max((a.y - b.y).abs());

    Rect {
        x: cx - size / 2,
        y: cy - size / 2,
        width: size,
        height: size,
    }
}

/// Project a raw model-space landmark back into original-image pixels via
/// the ROI the model input was cropped from. Truncates to integers.
pub fn remap_landmark(raw_x: f32, raw_y: f32, roi: Rect, input_w: usize, input_h: usize) -> Point {
    Point {
        x: (raw_x / input_w as f32 * roi.width as f32) as i32 + roi.x,
        y: (raw_y / input_h as f32 * roi.height as f32) as i32 + roi.y,
    }
}

/// Crop `roi` out of `frame`, zero-padding wherever the rectangle leaves
/// the source bounds. The output is always exactly the requested size
/// (floored at zero); a fully out-of-bounds ROI yields an all-black crop.
pub fn crop_frame(frame: &Frame, roi: Rect) -> Frame {
    let out_w = roi.width.max(0) as u32;
    let out_h = roi.height.max(0) as u32;
    let channels = frame.channels();
    let mut out = Frame::zeros(out_w, out_h, channels);

    let fw = frame.width() as i32;
    let fh = frame.height() as i32;

    // Source span clipped to valid bounds.
    let sx0 = roi.x.clamp(0, fw);
    let sx1 = (roi.x + roi.width).clamp(0, fw);
    let sy0 = roi.y.clamp(0, fh);
    let sy1 = (roi.y + roi.height).clamp(0, fh);

    if sx0 >= sx1 || sy0 >= sy1 {
        return out;
    }

    // Destination offset of the copied sub-region.
    let dx = (sx0 - roi.x) as usize;
    let dy = (sy0 - roi.y) as usize;

    let ch = channels as usize;
    let src_stride = frame.stride();
    let dst_stride = out.stride();
    let row_bytes = (sx1 - sx0) as usize * ch;

    let src = frame.data();
    let dst = out.data_mut();
    for (row, sy) in (sy0..sy1).enumerate() {
        let s = sy as usize * src_stride + sx0 as usize * ch;
        let d = (dy + row) * dst_stride + dx * ch;
        dst[d..d + row_bytes].copy_from_slice(&src[s..s + row_bytes]);
    }
    out
}
