use std::ops::Deref;
use std::sync::{Condvar, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use crate::foundation::core::FrameSize;
use crate::foundation::error::{TtyAppleError, TtyAppleResult};
use crate::frame::buffer::Frame;

/// Producer-facing capability handed to decoders.
///
/// Contract: call [`FrameSink::acquire_recycled`] before decoding each frame, fill the returned
/// buffer, then hand it back through [`FrameSink::submit`]. Both calls may block.
pub trait FrameSink: Send + Sync {
    /// Dimensions every submitted frame must have.
    fn frame_size(&self) -> FrameSize;
    /// Wait for a consumed buffer to decode the next frame into.
    fn acquire_recycled(&self) -> TtyAppleResult<Frame>;
    /// Hand a decoded, timestamped frame to the consumer.
    fn submit(&self, frame: Frame) -> TtyAppleResult<()>;
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Lifecycle {
    Open,
    /// The producer has signalled end-of-stream.
    Closed,
    /// The consumer gave up; blocked producers are released with an error.
    Shutdown,
}

#[derive(Debug)]
struct Roles {
    next: Option<Frame>,
    // The `current` frame itself lives in the consumer's `CurrentFrame` guard.
    current_out: bool,
    recycled: Option<Frame>,
    // Frames handed out by `acquire_recycled` and not yet submitted.
    producer_holds: usize,
    lifecycle: Lifecycle,
    submitted: u64,
}

/// Triple-role hand-off between one frame producer and one frame consumer.
///
/// Roles: `next` (produced, not yet consumed), `current` (being consumed) and `recycled`
/// (consumed, ready to be refilled). A single buffer circulates through the roles, which
/// keeps the producer at most one frame ahead of the consumer. With one buffer the
/// "recycled already occupied" assertion in `release_current` is unreachable through the
/// public API; it only guards against a second buffer being introduced.
#[derive(Debug)]
pub struct FrameSlot {
    size: FrameSize,
    roles: Mutex<Roles>,
    cond: Condvar,
}

impl FrameSlot {
    pub fn new(size: FrameSize) -> TtyAppleResult<Self> {
        size.validate()?;
        Ok(Self {
            size,
            roles: Mutex::new(Roles {
                next: None,
                current_out: false,
                recycled: Some(Frame::blank(size)),
                producer_holds: 0,
                lifecycle: Lifecycle::Open,
                submitted: 0,
            }),
            cond: Condvar::new(),
        })
    }

    pub fn size(&self) -> FrameSize {
        self.size
    }

    fn roles(&self) -> MutexGuard<'_, Roles> {
        // A poisoned lock only means the other side already faulted; shutdown must still work.
        self.roles.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn wait<'a>(&self, guard: MutexGuard<'a, Roles>) -> MutexGuard<'a, Roles> {
        self.cond
            .wait(guard)
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Producer: block until the recycled buffer is available and take it.
    pub fn acquire_recycled(&self) -> TtyAppleResult<Frame> {
        let mut roles = self.roles();
        assert!(
            roles.lifecycle != Lifecycle::Closed,
            "acquire_recycled called after end-of-stream"
        );

        while roles.recycled.is_none() && roles.lifecycle == Lifecycle::Open {
            roles = self.wait(roles);
        }
        if roles.lifecycle == Lifecycle::Shutdown {
            return Err(TtyAppleError::closed(
                "consumer stopped while waiting for a recycled frame",
            ));
        }

        let frame = roles
            .recycled
            .take()
            .ok_or_else(|| TtyAppleError::closed("recycled frame vanished"))?;
        roles.producer_holds += 1;
        drop(roles);
        self.cond.notify_all();

        Ok(frame)
    }

    /// Producer: block until `next` is free, then publish `frame` there.
    ///
    /// Panics if the producer does not hold a frame from [`FrameSlot::acquire_recycled`]; a
    /// second submit without an intervening acquire is a broken producer.
    pub fn submit(&self, frame: Frame) -> TtyAppleResult<()> {
        assert_eq!(frame.size(), self.size, "submitted frame has the wrong size");

        let mut roles = self.roles();
        assert!(
            roles.producer_holds > 0,
            "submit without a matching acquire_recycled"
        );
        assert!(
            roles.lifecycle != Lifecycle::Closed,
            "submit called after end-of-stream"
        );

        while roles.next.is_some() && roles.lifecycle == Lifecycle::Open {
            roles = self.wait(roles);
        }
        if roles.lifecycle == Lifecycle::Shutdown {
            return Err(TtyAppleError::closed(
                "consumer stopped while a frame was being submitted",
            ));
        }

        assert!(roles.next.is_none(), "next frame role is already occupied");
        roles.next = Some(frame);
        roles.producer_holds -= 1;
        roles.submitted += 1;
        drop(roles);
        self.cond.notify_all();

        Ok(())
    }

    /// Producer: signal end-of-stream. Frames already submitted are still delivered.
    pub fn close(&self) {
        let mut roles = self.roles();
        if roles.lifecycle == Lifecycle::Open {
            roles.lifecycle = Lifecycle::Closed;
        }
        drop(roles);
        self.cond.notify_all();
    }

    /// Consumer: abandon the stream and wake any blocked producer with an error.
    pub fn shutdown(&self) {
        let mut roles = self.roles();
        roles.lifecycle = Lifecycle::Shutdown;
        drop(roles);
        self.cond.notify_all();
    }

    /// Consumer: take the pending frame, if any, without blocking.
    pub fn take_next(&self) -> Option<CurrentFrame<'_>> {
        let mut roles = self.roles();
        assert!(
            !roles.current_out,
            "take_next called while the current frame is still being consumed"
        );

        let frame = roles.next.take()?;
        roles.current_out = true;
        drop(roles);
        self.cond.notify_all();

        Some(CurrentFrame {
            slot: self,
            frame: Some(frame),
        })
    }

    /// Consumer: move the consumed frame into `recycled`.
    fn release_current(&self, frame: Frame) {
        let mut roles = self.roles();
        assert!(roles.current_out, "release_current without a current frame");
        assert!(
            roles.recycled.is_none(),
            "recycled frame role is already occupied; producer got more than one frame ahead"
        );

        roles.recycled = Some(frame);
        roles.current_out = false;
        drop(roles);
        self.cond.notify_all();
    }

    /// Consumer: wait up to `timeout` for a frame to become available or the stream to end.
    ///
    /// Returns true when a frame is pending.
    pub fn wait_for_frame(&self, timeout: Duration) -> bool {
        let roles = self.roles();
        let (roles, _) = self
            .cond
            .wait_timeout_while(roles, timeout, |r| {
                r.next.is_none() && r.lifecycle == Lifecycle::Open
            })
            .unwrap_or_else(PoisonError::into_inner);
        roles.next.is_some()
    }

    /// True once the producer is done and every submitted frame has been taken.
    pub fn is_drained(&self) -> bool {
        let roles = self.roles();
        roles.lifecycle != Lifecycle::Open && roles.next.is_none()
    }

    /// Frames submitted so far.
    pub fn submitted(&self) -> u64 {
        self.roles().submitted
    }
}

impl FrameSink for FrameSlot {
    fn frame_size(&self) -> FrameSize {
        self.size
    }

    fn acquire_recycled(&self) -> TtyAppleResult<Frame> {
        FrameSlot::acquire_recycled(self)
    }

    fn submit(&self, frame: Frame) -> TtyAppleResult<()> {
        FrameSlot::submit(self, frame)
    }
}

/// The frame in the `current` role, borrowed by the consumer.
///
/// Dropping the guard (or calling [`CurrentFrame::release`]) moves the frame to `recycled`.
pub struct CurrentFrame<'a> {
    slot: &'a FrameSlot,
    frame: Option<Frame>,
}

impl CurrentFrame<'_> {
    /// Finish reading the frame and hand its buffer back for reuse.
    pub fn release(mut self) {
        if let Some(frame) = self.frame.take() {
            self.slot.release_current(frame);
        }
    }
}

impl Deref for CurrentFrame<'_> {
    type Target = Frame;

    fn deref(&self) -> &Frame {
        match self.frame.as_ref() {
            Some(frame) => frame,
            None => unreachable!("current frame accessed after release"),
        }
    }
}

impl Drop for CurrentFrame<'_> {
    fn drop(&mut self) {
        if std::thread::panicking() {
            return;
        }
        if let Some(frame) = self.frame.take() {
            self.slot.release_current(frame);
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/frame/slot.rs"]
mod tests;
