//! ONNX Runtime implementation of the inference-engine contract.

use std::path::Path;

use ndarray::Array4;

use crate::inference::engine::{EngineError, InferenceEngine};
use crate::shared::frame::Frame;

const INPUT_NORM_MEAN: f32 = 127.5;
const INPUT_NORM_STD: f32 = 127.5;

/// Single-input model executor backed by an `ort` session.
///
/// The input resolution is declared at construction; the session is fed
/// one NHWC float tensor and every output tensor is copied into an owned
/// buffer after each run.
pub struct OrtEngine {
    session: ort::session::Session,
    input_shapes: Vec<Vec<usize>>,
    pending: Vec<Option<Array4<f32>>>,
    outputs: Vec<Vec<f32>>,
}

impl OrtEngine {
    /// Load a model and declare its square input resolution.
    pub fn from_file(path: &Path, input_size: u32) -> Result<Self, EngineError> {
        let session = ort::session::Session::builder()
            .and_then(|mut builder| builder.commit_from_file(path))
            .map_err(|source| EngineError::ModelLoad {
                path: path.to_path_buf(),
                source,
            })?;

        let size = input_size as usize;
        Ok(Self {
            session,
            input_shapes: vec![vec![1, size, size, 3]],
            pending: vec![None],
            outputs: Vec::new(),
        })
    }
}

impl InferenceEngine for OrtEngine {
    fn load_input(&mut self, frame: &Frame, slot: usize) -> Result<(), EngineError> {
        if slot >= self.pending.len() {
            log::warn!("input slot {slot} is out of range ({})", self.pending.len());
            return Ok(());
        }
        let shape = &self.input_shapes[slot];
        let tensor = preprocess(frame, shape[2], shape[1])?;
        self.pending[slot] = Some(tensor);
        Ok(())
    }

    fn run(&mut self) -> Result<(), EngineError> {
        // A run consumes its inputs; each must be re-loaded before the next.
        let input = self.pending[0].take().ok_or(EngineError::InputNotLoaded(0))?;

        let value = ort::value::Tensor::from_array(input)?;
        let results = self.session.run(ort::inputs![value])?;

        let mut outputs = Vec::with_capacity(results.len());
        for i in 0..results.len() {
            let array = results[i].try_extract_array::<f32>()?;
            outputs.push(array.iter().copied().collect());
        }
        drop(results);
        self.outputs = outputs;
        Ok(())
    }

    fn output(&self, slot: usize) -> &[f32] {
        match self.outputs.get(slot) {
            Some(buffer) => buffer,
            None => {
                log::warn!("output slot {slot} is out of range ({})", self.outputs.len());
                &[]
            }
        }
    }

    fn input_shape(&self, slot: usize) -> &[usize] {
        match self.input_shapes.get(slot) {
            Some(shape) => shape,
            None => {
                log::warn!(
                    "input slot {slot} is out of range ({})",
                    self.input_shapes.len()
                );
                &[]
            }
        }
    }
}

/// Resize to `width × height` with center-sample nearest neighbour,
/// convert BGR(A) to RGB, and normalize to `(v − 127.5) / 127.5`.
fn preprocess(frame: &Frame, width: usize, height: usize) -> Result<Array4<f32>, EngineError> {
    let channels = frame.channels() as usize;
    if channels != 3 && channels != 4 {
        return Err(EngineError::UnsupportedPixelFormat(frame.channels()));
    }
    let src_w = frame.width() as usize;
    let src_h = frame.height() as usize;
    if src_w == 0 || src_h == 0 {
        return Err(EngineError::EmptyInput);
    }

    let data = frame.data();
    let mut tensor = Array4::<f32>::zeros((1, height, width, 3));

    for y in 0..height {
        let sy = (((y as f32 + 0.5) * src_h as f32 / height as f32) as usize).min(src_h - 1);
        for x in 0..width {
            let sx = (((x as f32 + 0.5) * src_w as f32 / width as f32) as usize).min(src_w - 1);
            let p = (sy * src_w + sx) * channels;
            // Stored as BGR(A); the models expect RGB.
            tensor[[0, y, x, 0]] = (data[p + 2] as f32 - INPUT_NORM_MEAN) / INPUT_NORM_STD;
            tensor[[0, y, x, 1]] = (data[p + 1] as f32 - INPUT_NORM_MEAN) / INPUT_NORM_STD;
            tensor[[0, y, x, 2]] = (data[p] as f32 - INPUT_NORM_MEAN) / INPUT_NORM_STD;
        }
    }
    Ok(tensor)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_preprocess_shape() {
        let frame = Frame::new(vec![128u8; 200 * 100 * 3], 200, 100, 3);
        let tensor = preprocess(&frame, 128, 128).unwrap();
        assert_eq!(tensor.shape(), &[1, 128, 128, 3]);
    }

    #[test]
    fn test_preprocess_normalizes_to_unit_range() {
        let frame = Frame::new(vec![255u8; 50 * 50 * 3], 50, 50, 3);
        let tensor = preprocess(&frame, 64, 64).unwrap();
        assert_relative_eq!(tensor[[0, 0, 0, 0]], 1.0);

        let frame = Frame::zeros(50, 50, 3);
        let tensor = preprocess(&frame, 64, 64).unwrap();
        assert_relative_eq!(tensor[[0, 0, 0, 0]], -1.0);
    }

    #[test]
    fn test_preprocess_swaps_bgr_to_rgb() {
        // Solid blue in BGR: (255, 0, 0) per pixel.
        let mut data = vec![0u8; 4 * 4 * 3];
        for px in data.chunks_mut(3) {
            px[0] = 255;
        }
        let frame = Frame::new(data, 4, 4, 3);
        let tensor = preprocess(&frame, 4, 4).unwrap();
        assert_relative_eq!(tensor[[0, 0, 0, 0]], -1.0); // R
        assert_relative_eq!(tensor[[0, 0, 0, 2]], 1.0); // B
    }

    #[test]
    fn test_preprocess_accepts_bgra() {
        let frame = Frame::new(vec![100u8; 8 * 8 * 4], 8, 8, 4);
        assert!(preprocess(&frame, 4, 4).is_ok());
    }

    #[test]
    fn test_preprocess_rejects_single_channel() {
        let frame = Frame::new(vec![0u8; 8 * 8], 8, 8, 1);
        assert!(matches!(
            preprocess(&frame, 4, 4),
            Err(EngineError::UnsupportedPixelFormat(1))
        ));
    }

    #[test]
    fn test_preprocess_rejects_empty_frame() {
        let frame = Frame::zeros(0, 0, 3);
        assert!(matches!(
            preprocess(&frame, 4, 4),
            Err(EngineError::EmptyInput)
        ));
    }
}
