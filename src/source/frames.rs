use std::path::{Path, PathBuf};

use image::imageops::FilterType;

use crate::foundation::core::{FrameIndex, Fps};
use crate::foundation::error::{TtyAppleError, TtyAppleResult};
use crate::frame::slot::FrameSink;
use crate::source::{FrameLimit, FrameSource};

/// Rate assumed for image sequences, which carry no timing of their own.
pub const SEQUENCE_FPS: Fps = Fps { num: 24, den: 1 };

/// `frame001.png`, `frame002.png`, ... (`number` is 1-based).
pub fn frame_path(dir: &Path, number: u64) -> PathBuf {
    dir.join(format!("frame{number:03}.png"))
}

/// Numbered PNG frames read from a directory until the first gap.
#[derive(Clone, Debug)]
pub struct PngSequence {
    dir: PathBuf,
    fps: Fps,
    limit: FrameLimit,
}

impl PngSequence {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            fps: SEQUENCE_FPS,
            limit: FrameLimit::default(),
        }
    }

    pub fn with_frame_limit(mut self, limit: Option<u64>) -> Self {
        self.limit = FrameLimit(limit);
        self
    }

    pub fn with_fps(mut self, fps: Fps) -> Self {
        self.fps = fps;
        self
    }
}

impl FrameSource for PngSequence {
    fn stream(&mut self, sink: &dyn FrameSink) -> TtyAppleResult<u64> {
        if !self.dir.is_dir() {
            return Err(TtyAppleError::config(format!(
                "frame directory '{}' does not exist",
                self.dir.display()
            )));
        }
        self.fps.validate()?;

        let size = sink.frame_size();
        let mut produced = 0u64;
        while !self.limit.reached(produced) {
            let path = frame_path(&self.dir, produced + 1);
            if !path.is_file() {
                break;
            }

            let img = image::open(&path).map_err(|e| {
                TtyAppleError::decode(format!("failed to load '{}': {e}", path.display()))
            })?;
            let mut luma = img.to_luma8();
            if luma.dimensions() != (size.width, size.height) {
                luma = image::imageops::resize(&luma, size.width, size.height, FilterType::Nearest);
            }

            let ts_us = self.fps.timestamp_us(FrameIndex(produced));
            let mut frame = sink.acquire_recycled()?;
            frame.fill(luma.as_raw(), ts_us)?;
            sink.submit(frame)?;

            tracing::trace!(path = %path.display(), ts_us, "loaded frame");
            produced += 1;
        }

        if produced == 0 {
            tracing::warn!(dir = %self.dir.display(), "no frame001.png found");
        }
        tracing::debug!(frames = produced, "image sequence done");
        Ok(produced)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/source/frames.rs"]
mod tests;
