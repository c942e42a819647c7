//! Video frame type and snapshot encoding

use image::codecs::jpeg::JpegEncoder;
use image::{ExtendedColorType, ImageEncoder};

use crate::CaptureError;

/// Decoded RGB video frame
#[derive(Debug, Clone)]
pub struct VideoFrame {
    /// RGB pixel data (width * height * 3)
    pub data: Vec<u8>,
    /// Frame width
    pub width: u32,
    /// Frame height
    pub height: u32,
    /// Capture timestamp (milliseconds since session start)
    pub timestamp_ms: u64,
    /// Frame sequence number
    pub sequence: u32,
}

impl VideoFrame {
    pub fn new(data: Vec<u8>, width: u32, height: u32, timestamp_ms: u64, sequence: u32) -> Self {
        Self {
            data,
            width,
            height,
            timestamp_ms,
            sequence,
        }
    }

    /// A frame filled with one gray level, for stub sources and tests
    pub fn solid(luma: u8, width: u32, height: u32) -> Self {
        Self::new(vec![luma; (width * height * 3) as usize], width, height, 0, 0)
    }

    /// Mean scene luminance (0-255), used as the lighting metric
    pub fn mean_luma(&self) -> f32 {
        if self.data.is_empty() {
            return 0.0;
        }
        let mut sum = 0.0f64;
        for pixel in self.data.chunks_exact(3) {
            // Luminance formula: 0.299*R + 0.587*G + 0.114*B
            sum += pixel[0] as f64 * 0.299 + pixel[1] as f64 * 0.587 + pixel[2] as f64 * 0.114;
        }
        (sum / (self.data.len() / 3) as f64) as f32
    }

    /// Encode the frame as a JPEG still, used as violation evidence
    pub fn to_jpeg(&self, quality: u8) -> Result<Vec<u8>, CaptureError> {
        let expected = (self.width * self.height * 3) as usize;
        if self.data.len() != expected {
            return Err(CaptureError::Encode(format!(
                "frame buffer is {} bytes, expected {}",
                self.data.len(),
                expected
            )));
        }

        let mut out = Vec::new();
        JpegEncoder::new_with_quality(&mut out, quality)
            .write_image(&self.data, self.width, self.height, ExtendedColorType::Rgb8)
            .map_err(|e| CaptureError::Encode(e.to_string()))?;
        Ok(out)
    }
}
