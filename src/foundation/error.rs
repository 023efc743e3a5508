/// Convenience result type used across ttyapple.
pub type TtyAppleResult<T> = Result<T, TtyAppleError>;

/// Top-level error taxonomy for the frame pipeline and its outputs.
///
/// Contract violations between producer and consumer are not represented here; those panic.
#[derive(thiserror::Error, Debug)]
pub enum TtyAppleError {
    /// Invalid user-provided configuration values.
    #[error("validation error: {0}")]
    Validation(String),

    /// Missing tools, templates or sinks. Not transient, never retried.
    #[error("configuration error: {0}")]
    Config(String),

    /// A write or flush to an output sink failed.
    #[error("i/o error: {0}")]
    Io(String),

    /// The compiler or linker could not be spawned or did not exit cleanly.
    #[error("toolchain error: {0}")]
    Toolchain(String),

    /// The frame producer failed to decode or load a frame.
    #[error("decode error: {0}")]
    Decode(String),

    /// The frame slot was shut down while a producer was waiting on it.
    #[error("pipeline closed: {0}")]
    Closed(String),

    /// Wrapped lower-level error from dependencies or IO.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl TtyAppleError {
    /// Build a [`TtyAppleError::Validation`] value.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Build a [`TtyAppleError::Config`] value.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Build a [`TtyAppleError::Io`] value.
    pub fn io(msg: impl Into<String>) -> Self {
        Self::Io(msg.into())
    }

    /// Build a [`TtyAppleError::Toolchain`] value.
    pub fn toolchain(msg: impl Into<String>) -> Self {
        Self::Toolchain(msg.into())
    }

    /// Build a [`TtyAppleError::Decode`] value.
    pub fn decode(msg: impl Into<String>) -> Self {
        Self::Decode(msg.into())
    }

    /// Build a [`TtyAppleError::Closed`] value.
    pub fn closed(msg: impl Into<String>) -> Self {
        Self::Closed(msg.into())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;
