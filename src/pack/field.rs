use crate::foundation::core::{FrameIndex, FrameSize};
use crate::frame::buffer::Frame;
use crate::pack::mono::pack_monochrome;

/// Which source rows of a frame a single `run()` consumes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Field {
    /// Every row, used when interlacing is off.
    Full,
    /// Rows 0, 2, 4, ...
    Even,
    /// Rows 1, 3, 5, ...
    Odd,
}

impl Field {
    /// Field for frame `idx`. Interlaced outputs alternate parity with the frame index.
    pub fn for_frame(interlaced: bool, idx: FrameIndex) -> Self {
        match (interlaced, idx.is_odd()) {
            (false, _) => Self::Full,
            (true, false) => Self::Even,
            (true, true) => Self::Odd,
        }
    }

    /// Source row indices in output order.
    pub fn rows(self, height: u32) -> impl Iterator<Item = usize> {
        let (start, step) = match self {
            Self::Full => (0, 1),
            Self::Even => (0, 2),
            Self::Odd => (1, 2),
        };
        (start..height as usize).step_by(step)
    }

    /// Number of rows [`Field::rows`] yields for `height`.
    pub fn row_count(self, height: u32) -> usize {
        let h = height as usize;
        match self {
            Self::Full => h,
            Self::Even => h.div_ceil(2),
            Self::Odd => h / 2,
        }
    }
}

/// Reusable packed monochrome buffer for one output.
///
/// Sized once for the full frame; a field only fills the leading part.
#[derive(Debug)]
pub struct PackedFrame {
    size: FrameSize,
    stride: usize,
    buf: Vec<u8>,
    len: usize,
}

impl PackedFrame {
    pub fn new(size: FrameSize) -> Self {
        let stride = size.stride();
        Self {
            size,
            stride,
            buf: vec![0u8; stride * size.height as usize],
            len: 0,
        }
    }

    pub fn stride(&self) -> usize {
        self.stride
    }

    /// Pack the rows of `field` from `frame`, returning the packed bytes.
    pub fn pack(&mut self, frame: &Frame, field: Field) -> &[u8] {
        assert_eq!(
            frame.size(),
            self.size,
            "frame size does not match the packed buffer"
        );

        let width = self.size.width as usize;
        let mut rows = 0usize;
        for src_row in field.rows(self.size.height) {
            let src = &frame.pixels()[src_row * width..(src_row + 1) * width];
            let dst = &mut self.buf[rows * self.stride..(rows + 1) * self.stride];
            pack_monochrome(src, dst);
            rows += 1;
        }

        self.len = rows * self.stride;
        &self.buf[..self.len]
    }

    /// Bytes produced by the last [`PackedFrame::pack`].
    pub fn as_bytes(&self) -> &[u8] {
        &self.buf[..self.len]
    }

    /// Packed row `row` of the last pack.
    pub fn row(&self, row: usize) -> &[u8] {
        &self.buf[row * self.stride..(row + 1) * self.stride]
    }

    /// Rows produced by the last pack.
    pub fn rows(&self) -> usize {
        self.len / self.stride
    }
}

#[cfg(test)]
#[path = "../../tests/unit/pack/field.rs"]
mod tests;
