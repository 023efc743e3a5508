use crate::foundation::error::{TtyAppleError, TtyAppleResult};

/// Microseconds per second, the unit of frame timestamps.
pub const MICROS_PER_SEC: i64 = 1_000_000;

/// Zero-based index of a frame within one output run.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize,
    serde::Deserialize,
)]
pub struct FrameIndex(pub u64);

impl FrameIndex {
    /// True for frames that carry the odd source rows when interlacing.
    pub fn is_odd(self) -> bool {
        self.0 % 2 == 1
    }

    /// The index following this one.
    pub fn next(self) -> Self {
        Self(self.0 + 1)
    }
}

/// Frame dimensions in pixels. Both sides are non-zero once validated.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct FrameSize {
    pub width: u32,
    pub height: u32,
}

impl FrameSize {
    pub fn new(width: u32, height: u32) -> TtyAppleResult<Self> {
        let size = Self { width, height };
        size.validate()?;
        Ok(size)
    }

    pub fn validate(&self) -> TtyAppleResult<()> {
        if self.width == 0 || self.height == 0 {
            return Err(TtyAppleError::validation(format!(
                "frame width/height must be non-zero, got {}x{}",
                self.width, self.height
            )));
        }
        Ok(())
    }

    /// Bytes in one grayscale frame (one byte per pixel).
    pub fn pixel_len(self) -> usize {
        (self.width as usize).saturating_mul(self.height as usize)
    }

    /// Bytes in one packed monochrome row, padded to a whole byte.
    pub fn stride(self) -> usize {
        (self.width as usize).div_ceil(8)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Fps {
    pub num: u32,
    pub den: u32, // must be > 0
}

impl Fps {
    pub fn new(num: u32, den: u32) -> TtyAppleResult<Self> {
        let fps = Self { num, den };
        fps.validate()?;
        Ok(fps)
    }

    pub fn validate(&self) -> TtyAppleResult<()> {
        if self.den == 0 {
            return Err(TtyAppleError::validation("Fps den must be > 0"));
        }
        if self.num == 0 {
            return Err(TtyAppleError::validation("Fps num must be > 0"));
        }
        Ok(())
    }

    /// Parse an ffprobe-style rational such as `24000/1001` or a bare integer.
    pub fn parse_rational(s: &str) -> TtyAppleResult<Self> {
        let s = s.trim();
        let (num, den) = match s.split_once('/') {
            Some((n, d)) => (n.trim(), d.trim()),
            None => (s, "1"),
        };
        let num = num
            .parse::<u32>()
            .map_err(|e| TtyAppleError::validation(format!("invalid fps numerator '{num}': {e}")))?;
        let den = den.parse::<u32>().map_err(|e| {
            TtyAppleError::validation(format!("invalid fps denominator '{den}': {e}"))
        })?;
        Self::new(num, den)
    }

    pub fn as_f64(self) -> f64 {
        f64::from(self.num) / f64::from(self.den)
    }

    /// Whole microseconds between two frames, rounded down.
    pub fn frame_interval_us(self) -> i64 {
        MICROS_PER_SEC * i64::from(self.den) / i64::from(self.num)
    }

    /// Presentation timestamp of frame `idx` in microseconds.
    pub fn timestamp_us(self, idx: FrameIndex) -> i64 {
        let us = u128::from(idx.0) * MICROS_PER_SEC as u128 * u128::from(self.den)
            / u128::from(self.num);
        i64::try_from(us).unwrap_or(i64::MAX)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/core.rs"]
mod tests;
