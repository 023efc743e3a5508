//! Grayscale to monochrome packing.

/// Interlaced field selection and the per-output packed buffer.
pub mod field;
/// The 1-bit-per-pixel packer.
pub mod mono;
