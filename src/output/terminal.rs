use std::io::Write;
use std::time::{Duration, Instant};

use crate::foundation::core::{FrameSize, MICROS_PER_SEC};
use crate::foundation::error::{TtyAppleError, TtyAppleResult};
use crate::pack::field::{Field, PackedFrame};
use crate::pack::mono::packed_bit;

/// Clear the screen, then move the cursor to the top-left corner.
pub const CLEAR_AND_HOME: &str = "\x1b[2J\x1b[H";

pub const FULL_BLOCK: char = '\u{2588}';
pub const UPPER_HALF_BLOCK: char = '\u{2580}';
pub const LOWER_HALF_BLOCK: char = '\u{2584}';

/// Glyph for a 1x2 pixel column.
pub fn glyph(top: bool, bottom: bool) -> char {
    match (top, bottom) {
        (true, true) => FULL_BLOCK,
        (true, false) => UPPER_HALF_BLOCK,
        (false, true) => LOWER_HALF_BLOCK,
        (false, false) => ' ',
    }
}

/// Append the glyph lines for the packed rows in `packed` to `text`.
///
/// Rows are consumed in pairs; a trailing unpaired row renders against a blank bottom row.
pub fn render_glyphs(packed: &[u8], stride: usize, width: usize, text: &mut String) {
    for pair in packed.chunks(stride * 2) {
        let (top, bottom) = pair.split_at(stride.min(pair.len()));
        let bottom = (!bottom.is_empty()).then_some(bottom);
        for x in 0..width {
            let b = bottom.is_some_and(|row| packed_bit(row, x));
            text.push(glyph(packed_bit(top, x), b));
        }
        text.push('\n');
    }
}

/// How long to wait before drawing a frame stamped `ts_us`.
///
/// `None` means draw now: the target time has passed, or the gap is a second or more.
pub fn pacing_delay(prev_ts_us: i64, ts_us: i64, elapsed: Duration) -> Option<Duration> {
    let elapsed_us = i64::try_from(elapsed.as_micros()).unwrap_or(i64::MAX);
    let sleep_us = ts_us.saturating_sub(prev_ts_us).saturating_sub(elapsed_us);
    if sleep_us > 0 && sleep_us < MICROS_PER_SEC {
        Some(Duration::from_micros(sleep_us as u64))
    } else {
        None
    }
}

/// Wall-clock pacing state: timestamp and instant of the last draw.
#[derive(Debug, Default)]
pub(crate) struct Pacer {
    last: Option<(i64, Instant)>,
}

impl Pacer {
    pub(crate) fn delay(&self, ts_us: i64, now: Instant) -> Option<Duration> {
        let (prev_ts, drawn_at) = self.last?;
        pacing_delay(prev_ts, ts_us, now.saturating_duration_since(drawn_at))
    }

    pub(crate) fn mark(&mut self, ts_us: i64, now: Instant) {
        self.last = Some((ts_us, now));
    }
}

/// Half-block ANSI renderer paced by frame timestamps.
///
/// Keeps the last full image so an interlaced field only replaces its own rows.
pub(crate) struct TerminalBackend {
    out: Box<dyn Write + Send>,
    width: usize,
    stride: usize,
    screen: Vec<u8>,
    text: String,
    pacer: Pacer,
}

impl TerminalBackend {
    pub(crate) fn new(out: Box<dyn Write + Send>, size: FrameSize) -> Self {
        let stride = size.stride();
        Self {
            out,
            width: size.width as usize,
            stride,
            screen: vec![0u8; stride * size.height as usize],
            text: String::new(),
            pacer: Pacer::default(),
        }
    }

    fn blit(&mut self, packed: &PackedFrame, field: Field) {
        let height = (self.screen.len() / self.stride) as u32;
        for (i, row) in field.rows(height).enumerate().take(packed.rows()) {
            self.screen[row * self.stride..(row + 1) * self.stride].copy_from_slice(packed.row(i));
        }
    }

    pub(crate) fn draw(&mut self, packed: &PackedFrame, field: Field, ts_us: i64) -> TtyAppleResult<()> {
        self.blit(packed, field);

        self.text.clear();
        self.text.push_str(CLEAR_AND_HOME);
        render_glyphs(&self.screen, self.stride, self.width, &mut self.text);

        if let Some(delay) = self.pacer.delay(ts_us, Instant::now()) {
            std::thread::sleep(delay);
        }

        self.out
            .write_all(self.text.as_bytes())
            .and_then(|()| self.out.flush())
            .map_err(|e| TtyAppleError::io(format!("failed to write frame to terminal: {e}")))?;

        self.pacer.mark(ts_us, Instant::now());
        tracing::trace!(ts_us, "drew frame");
        Ok(())
    }

    pub(crate) fn finish(mut self) -> TtyAppleResult<()> {
        self.out
            .flush()
            .map_err(|e| TtyAppleError::io(format!("failed to flush terminal: {e}")))
    }
}

#[cfg(test)]
#[path = "../../tests/unit/output/terminal.rs"]
mod tests;
