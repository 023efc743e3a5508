use crate::foundation::core::FrameSize;
use crate::foundation::error::{TtyAppleError, TtyAppleResult};

/// One grayscale frame moving through the pipeline.
///
/// Buffers are created by the [`FrameSlot`](crate::FrameSlot) that owns them and are only ever
/// moved between its roles, so the pixel storage is allocated once and reused.
pub struct Frame {
    size: FrameSize,
    pixels: Vec<u8>,
    timestamp_us: i64,
}

impl Frame {
    pub(crate) fn blank(size: FrameSize) -> Self {
        Self {
            size,
            pixels: vec![0u8; size.pixel_len()],
            timestamp_us: 0,
        }
    }

    pub fn size(&self) -> FrameSize {
        self.size
    }

    /// Row-major gray samples, one byte per pixel.
    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    pub fn pixels_mut(&mut self) -> &mut [u8] {
        &mut self.pixels
    }

    /// Presentation timestamp in microseconds.
    pub fn timestamp_us(&self) -> i64 {
        self.timestamp_us
    }

    pub fn set_timestamp_us(&mut self, ts: i64) {
        self.timestamp_us = ts;
    }

    /// Gray samples of row `y`.
    pub fn row(&self, y: usize) -> &[u8] {
        let w = self.size.width as usize;
        &self.pixels[y * w..(y + 1) * w]
    }

    /// Copy a full frame of samples into this buffer and stamp it.
    pub fn fill(&mut self, samples: &[u8], timestamp_us: i64) -> TtyAppleResult<()> {
        if samples.len() != self.pixels.len() {
            return Err(TtyAppleError::validation(format!(
                "frame sample count mismatch: got {}, expected {} ({}x{})",
                samples.len(),
                self.pixels.len(),
                self.size.width,
                self.size.height
            )));
        }
        self.pixels.copy_from_slice(samples);
        self.timestamp_us = timestamp_us;
        Ok(())
    }
}

impl std::fmt::Debug for Frame {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Frame")
            .field("size", &self.size)
            .field("timestamp_us", &self.timestamp_us)
            .finish_non_exhaustive()
    }
}
