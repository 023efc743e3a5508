//! Frame producers.
//!
//! A source decodes into buffers borrowed from a [`FrameSink`] and hands them back in
//! presentation order. It runs on its own thread, so every call into the sink may block.

pub mod frames;
pub mod video;

use crate::foundation::error::TtyAppleResult;
use crate::frame::slot::FrameSink;

/// Something that can decode a stream of grayscale frames.
pub trait FrameSource: Send {
    /// Decode every frame into `sink`, returning how many were submitted.
    ///
    /// The caller signals end-of-stream once this returns, whether or not it succeeded.
    fn stream(&mut self, sink: &dyn FrameSink) -> TtyAppleResult<u64>;
}

/// Stop condition shared by the sources.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FrameLimit(pub Option<u64>);

impl FrameLimit {
    pub fn reached(self, produced: u64) -> bool {
        self.0.is_some_and(|limit| produced >= limit)
    }
}
