//! ttyapple turns grayscale video into 1-bit frames.
//!
//! A decoder thread fills frames into a [`FrameSlot`]; an [`Output`] drains it and either
//! plays the frames as half-block terminal art, serializes them into a C translation unit,
//! or compiles that translation unit into a freestanding UEFI image.
//!
//! - Pick a [`FrameSource`] ([`VideoSource`] or [`PngSequence`])
//! - Open an [`Output`] for an [`OutputConfig`]
//! - Call [`play`] to run both ends until the stream is exhausted
#![forbid(unsafe_code)]

mod foundation;

pub mod frame;
pub mod output;
pub mod pack;
/// Runs a source and an output against each other.
pub mod pipeline;
pub mod source;

pub use crate::foundation::core::{Fps, FrameIndex, FrameSize, MICROS_PER_SEC};
pub use crate::foundation::error::{TtyAppleError, TtyAppleResult};

pub use crate::frame::buffer::Frame;
pub use crate::frame::slot::{CurrentFrame, FrameSink, FrameSlot};
pub use crate::output::image::ImageConfig;
pub use crate::output::{Output, OutputConfig, OutputFormat, OutputSummary, Tick};
pub use crate::pipeline::play;
pub use crate::source::FrameSource;
pub use crate::source::frames::PngSequence;
pub use crate::source::video::VideoSource;
