use ndarray::ArrayView3;

/// A single image frame: contiguous BGR or BGRA bytes in row-major order.
///
/// Pixel-format conversion happens at the inference-engine boundary; the
/// geometry layer treats pixel data as opaque.
#[derive(Clone, Debug)]
pub struct Frame {
    data: Vec<u8>,
    width: u32,
    height: u32,
    channels: u8,
}

impl Frame {
    pub fn new(data: Vec<u8>, width: u32, height: u32, channels: u8) -> Self {
        debug_assert_eq!(
            data.len(),
            (width as usize) * (height as usize) * (channels as usize),
            "data length must equal width * height * channels"
        );
        Self {
            data,
            width,
            height,
            channels,
        }
    }

    /// All-black frame of the given dimensions.
    pub fn zeros(width: u32, height: u32, channels: u8) -> Self {
        let len = (width as usize) * (height as usize) * (channels as usize);
        Self {
            data: vec![0; len],
            width,
            height,
            channels,
        }
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn data_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn channels(&self) -> u8 {
        self.channels
    }

    /// Bytes per pixel row.
    pub fn stride(&self) -> usize {
        self.width as usize * self.channels as usize
    }

    pub fn as_ndarray(&self) -> ArrayView3<'_, u8> {
        ArrayView3::from_shape(
            (
                self.height as usize,
                self.width as usize,
                self.channels as usize,
            ),
            &self.data,
        )
        .expect("Frame data length must match dimensions")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_construction_and_accessors() {
        let data = vec![0u8; 12]; // 2x2x3
        let frame = Frame::new(data.clone(), 2, 2, 3);
        assert_eq!(frame.width(), 2);
        assert_eq!(frame.height(), 2);
        assert_eq!(frame.channels(), 3);
        assert_eq!(frame.data(), &data[..]);
    }

    #[test]
    fn test_zeros_is_black() {
        let frame = Frame::zeros(3, 2, 4);
        assert_eq!(frame.data().len(), 24);
        assert!(frame.data().iter().all(|&b| b == 0));
    }

    #[test]
    fn test_stride() {
        let frame = Frame::zeros(5, 2, 3);
        assert_eq!(frame.stride(), 15);
    }

    #[test]
    #[should_panic(expected = "data length must equal width * height * channels")]
    fn test_mismatched_data_length_panics_in_debug() {
        let data = vec![0u8; 10]; // wrong size for 2x2x3
        Frame::new(data, 2, 2, 3);
    }

    #[test]
    fn test_as_ndarray_pixel_access() {
        // 2x2 BGR: set pixel (row=1, col=0) blue channel
        let mut data = vec![0u8; 12];
        data[6] = 255; // row=1, col=0, B
        let frame = Frame::new(data, 2, 2, 3);
        let arr = frame.as_ndarray();
        assert_eq!(arr[[1, 0, 0]], 255);
        assert_eq!(arr[[1, 0, 1]], 0);
    }
}
