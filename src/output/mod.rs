//! Frame consumers.
//!
//! An [`Output`] owns the [`FrameSlot`] a decoder feeds and turns every frame it takes from it
//! into one of three artifacts: half-block terminal playback, an embeddable C translation unit,
//! or a freestanding UEFI image built from that translation unit.

pub mod image;
pub mod source;
pub mod terminal;
pub mod toolchain;

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::foundation::core::{FrameIndex, FrameSize};
use crate::foundation::error::{TtyAppleError, TtyAppleResult};
use crate::frame::slot::FrameSlot;
use crate::output::image::{ImageBackend, ImageConfig};
use crate::output::source::SourceWriter;
use crate::output::terminal::TerminalBackend;
use crate::pack::field::{Field, PackedFrame};

/// Create the parent directory of `path` if needed.
pub fn ensure_parent_dir(path: &Path) -> TtyAppleResult<()> {
    if let Some(parent) = path.parent() {
        use anyhow::Context as _;
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create output directory '{}'", parent.display()))?;
    }
    Ok(())
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutputFormat {
    Terminal,
    EmbeddableSource,
    FreestandingImage,
}

/// Settings shared by every output format, fixed for the output's lifetime.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct OutputConfig {
    pub size: FrameSize,
    /// Emit alternating half-height fields instead of full frames.
    pub interlaced: bool,
}

impl OutputConfig {
    pub fn new(width: u32, height: u32, interlaced: bool) -> TtyAppleResult<Self> {
        let cfg = Self {
            size: FrameSize::new(width, height)?,
            interlaced,
        };
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> TtyAppleResult<()> {
        self.size.validate()?;
        if self.interlaced && self.size.height % 2 != 0 {
            return Err(TtyAppleError::validation(format!(
                "interlacing needs an even height, got {}",
                self.size.height
            )));
        }
        Ok(())
    }
}

/// Outcome of one [`Output::run`] call.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Tick {
    /// No frame was pending.
    Idle,
    /// The frame (or field) with this index was emitted.
    Frame(FrameIndex),
}

/// What a finished output produced.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OutputSummary {
    pub frames: u64,
    /// The written file, for file-backed formats.
    pub artifact: Option<PathBuf>,
}

enum Backend {
    Terminal(TerminalBackend),
    Source {
        writer: SourceWriter<BufWriter<File>>,
        path: PathBuf,
    },
    Image(ImageBackend),
}

impl Backend {
    fn format(&self) -> OutputFormat {
        match self {
            Self::Terminal(_) => OutputFormat::Terminal,
            Self::Source { .. } => OutputFormat::EmbeddableSource,
            Self::Image(_) => OutputFormat::FreestandingImage,
        }
    }

    fn emit(&mut self, packed: &PackedFrame, field: Field, ts_us: i64) -> TtyAppleResult<()> {
        match self {
            Self::Terminal(t) => t.draw(packed, field, ts_us),
            Self::Source { writer, .. } => writer.write_frame(packed.as_bytes()).map(|_| ()),
            Self::Image(i) => i.write_frame(packed.as_bytes()),
        }
    }

    fn finish(self) -> TtyAppleResult<Option<PathBuf>> {
        match self {
            Self::Terminal(t) => t.finish().map(|()| None),
            Self::Source { writer, path } => writer.finish().map(|_| Some(path)),
            Self::Image(i) => i.finish().map(Some),
        }
    }
}

/// Consumer side of the pipeline.
///
/// Lifecycle: construct, call [`Output::run`] until the producer is done and the slot is
/// drained, then call [`Output::finish`] exactly once. Running or finishing a finished output
/// panics.
pub struct Output {
    cfg: OutputConfig,
    slot: Arc<FrameSlot>,
    packed: PackedFrame,
    index: FrameIndex,
    backend: Option<Backend>,
}

impl Output {
    fn with_backend(cfg: OutputConfig, backend: Backend) -> TtyAppleResult<Self> {
        tracing::debug!(
            format = ?backend.format(),
            width = cfg.size.width,
            height = cfg.size.height,
            interlaced = cfg.interlaced,
            "opened output"
        );
        Ok(Self {
            cfg,
            slot: Arc::new(FrameSlot::new(cfg.size)?),
            packed: PackedFrame::new(cfg.size),
            index: FrameIndex::default(),
            backend: Some(backend),
        })
    }

    /// Half-block playback on standard output.
    pub fn terminal(cfg: OutputConfig) -> TtyAppleResult<Self> {
        Self::terminal_to(cfg, std::io::stdout())
    }

    /// Half-block playback into an arbitrary writer.
    pub fn terminal_to(cfg: OutputConfig, out: impl Write + Send + 'static) -> TtyAppleResult<Self> {
        cfg.validate()?;
        Self::with_backend(cfg, Backend::Terminal(TerminalBackend::new(Box::new(out), cfg.size)))
    }

    /// C source written to `path`.
    pub fn embeddable_source(cfg: OutputConfig, path: impl Into<PathBuf>) -> TtyAppleResult<Self> {
        cfg.validate()?;
        let path = path.into();
        ensure_parent_dir(&path)?;
        let file = File::create(&path).map_err(|e| {
            TtyAppleError::config(format!("failed to create '{}': {e}", path.display()))
        })?;
        let writer = SourceWriter::new(BufWriter::new(file), cfg.size, cfg.interlaced)?;
        Self::with_backend(cfg, Backend::Source { writer, path })
    }

    /// UEFI image compiled and linked by the external toolchain.
    pub fn freestanding_image(cfg: OutputConfig, image: ImageConfig) -> TtyAppleResult<Self> {
        cfg.validate()?;
        let backend = ImageBackend::spawn(image, cfg.size, cfg.interlaced)?;
        Self::with_backend(cfg, Backend::Image(backend))
    }

    pub fn config(&self) -> OutputConfig {
        self.cfg
    }

    /// The slot this output consumes from; hand it to the producer as its sink.
    pub fn slot(&self) -> &Arc<FrameSlot> {
        &self.slot
    }

    /// Frames (or fields) emitted so far.
    pub fn frames_emitted(&self) -> u64 {
        self.index.0
    }

    pub fn is_finished(&self) -> bool {
        self.backend.is_none()
    }

    /// Consume the pending frame, if any.
    ///
    /// The frame is handed back to the producer once packed, before the backend writes it.
    pub fn run(&mut self) -> TtyAppleResult<Tick> {
        let Some(backend) = self.backend.as_mut() else {
            panic!("Output::run called after finish");
        };
        let Some(current) = self.slot.take_next() else {
            return Ok(Tick::Idle);
        };

        let idx = self.index;
        let field = Field::for_frame(self.cfg.interlaced, idx);
        let ts_us = current.timestamp_us();
        self.packed.pack(&current, field);
        current.release();

        backend.emit(&self.packed, field, ts_us)?;
        self.index = idx.next();
        Ok(Tick::Frame(idx))
    }

    /// Flush and close the backend's sink and report what was produced.
    pub fn finish(&mut self) -> TtyAppleResult<OutputSummary> {
        let Some(backend) = self.backend.take() else {
            panic!("Output::finish called twice");
        };
        if !self.slot.is_drained() {
            tracing::warn!("finishing output with a frame still pending");
        }

        let format = backend.format();
        let artifact = backend.finish()?;
        let summary = OutputSummary {
            frames: self.index.0,
            artifact,
        };
        tracing::info!(?format, frames = summary.frames, "output finished");
        Ok(summary)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/output/mod.rs"]
mod tests;
