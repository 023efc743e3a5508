//! Frame buffers and the producer/consumer hand-off.

/// Grayscale frame buffer.
pub mod buffer;
/// The `next`/`current`/`recycled` frame slot.
pub mod slot;
