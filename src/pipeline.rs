use std::thread;
use std::time::Duration;

use crate::foundation::error::{TtyAppleError, TtyAppleResult};
use crate::frame::slot::FrameSlot;
use crate::output::{Output, OutputSummary, Tick};
use crate::source::FrameSource;

/// Upper bound on one idle wait; the slot's condition normally wakes the consumer sooner.
const IDLE_WAIT: Duration = Duration::from_millis(50);

/// Closes the slot when the producer returns or unwinds.
struct CloseOnDrop<'a>(&'a FrameSlot);

impl Drop for CloseOnDrop<'_> {
    fn drop(&mut self) {
        self.0.close();
    }
}

/// Shuts the slot down unless the consumer loop completes.
struct ShutdownOnDrop<'a> {
    slot: &'a FrameSlot,
    armed: bool,
}

impl Drop for ShutdownOnDrop<'_> {
    fn drop(&mut self) {
        if self.armed {
            self.slot.shutdown();
        }
    }
}

/// Decode `source` into `output` until the stream ends, then finish the output.
///
/// The source runs on a `decoder` thread while the calling thread drives [`Output::run`].
/// The first error wins: a consumer failure shuts the slot down so the producer unblocks, and
/// a producer failure is reported once everything it submitted has been consumed.
pub fn play(source: &mut dyn FrameSource, output: &mut Output) -> TtyAppleResult<OutputSummary> {
    let slot = output.slot().clone();

    let (consumed, produced) = thread::scope(|scope| {
        let producer = thread::Builder::new()
            .name("decoder".to_owned())
            .spawn_scoped(scope, || {
                let _close = CloseOnDrop(&slot);
                source.stream(slot.as_ref())
            })
            .map_err(|e| TtyAppleError::config(format!("failed to spawn decoder thread: {e}")));
        let producer = match producer {
            Ok(handle) => handle,
            Err(e) => return (Err(e), Ok(0)),
        };

        let mut guard = ShutdownOnDrop {
            slot: &slot,
            armed: true,
        };
        let consumed = consume(output, &slot);
        guard.armed = consumed.is_err();
        drop(guard);

        let produced = match producer.join() {
            Ok(res) => res,
            Err(panic) => std::panic::resume_unwind(panic),
        };
        (consumed, produced)
    });

    let emitted = consumed?;
    let decoded = match produced {
        Ok(n) => n,
        Err(e) => {
            // The output is left unfinished; a partial artifact is not a result.
            tracing::error!("decoder failed after {emitted} frames: {e}");
            return Err(e);
        }
    };
    tracing::debug!(decoded, emitted, "stream complete");

    output.finish()
}

fn consume(output: &mut Output, slot: &FrameSlot) -> TtyAppleResult<u64> {
    loop {
        match output.run()? {
            Tick::Frame(_) => {}
            Tick::Idle if slot.is_drained() => return Ok(output.frames_emitted()),
            Tick::Idle => {
                slot.wait_for_frame(IDLE_WAIT);
            }
        }
    }
}

#[cfg(test)]
#[path = "../tests/unit/pipeline.rs"]
mod tests;
