use std::fmt::Write as _;
use std::io::Write;

use crate::foundation::core::{FrameIndex, FrameSize, Fps};
use crate::foundation::error::{TtyAppleError, TtyAppleResult};

/// Maximum characters per emitted line.
pub const LINE_MAX: usize = 80;
/// Byte literals per full array line.
pub const BYTES_PER_LINE: usize = 16;
/// Playback rate baked into `FRAME_INTERVAL`.
pub const TARGET_FPS: Fps = Fps { num: 24, den: 1 };

const INDENT: &str = "    ";
const PRELUDE: &str = "#include <stdint.h>\n\n";

/// Name of the array holding frame `idx`.
pub fn frame_name(idx: FrameIndex) -> String {
    format!("frame{}", idx.0)
}

/// `uint8_t name[len] = { ... };` with decimal literals, 16 per line.
pub fn byte_array(name: &str, values: &[u8]) -> String {
    let mut out = String::with_capacity(32 + values.len() * 4);
    let _ = writeln!(out, "uint8_t {name}[{}] = {{", values.len());
    for group in values.chunks(BYTES_PER_LINE) {
        out.push_str(INDENT);
        for v in group {
            // Decimal is never longer than `0xNN` for a byte.
            let _ = write!(out, "{v},");
        }
        out.push('\n');
    }
    out.push_str("};\n");
    out
}

/// `ty name[len] = { ... };` over pre-formatted values, wrapped at [`LINE_MAX`].
pub fn wrapped_array(ty: &str, name: &str, values: &[String]) -> String {
    let mut out = String::new();
    let _ = write!(out, "{ty} {name}[{}] = {{\n{INDENT}", values.len().max(1));

    if values.is_empty() {
        // ISO C has no zero-length arrays; a null entry keeps the unit compiling.
        out.push('0');
    }

    let mut line_len = INDENT.len();
    let mut line_has_values = false;
    for v in values {
        let needed = v.len() + 1;
        if line_has_values && line_len + needed > LINE_MAX {
            out.push('\n');
            out.push_str(INDENT);
            line_len = INDENT.len();
        }
        out.push_str(v);
        out.push(',');
        line_len += needed;
        line_has_values = true;
    }

    out.push_str("\n};\n");
    out
}

/// Constants describing the emitted frames, shared with the playback driver.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Manifest {
    pub frame_count: u64,
    pub size: FrameSize,
    pub interval_us: i64,
    pub interlaced: bool,
}

impl Manifest {
    pub fn render(&self, names: &[String]) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "#define FRAME_COUNT ({})", self.frame_count);
        let _ = writeln!(out, "#define FRAME_WIDTH ({})", self.size.width);
        let _ = writeln!(out, "#define FRAME_HEIGHT ({})", self.size.height);
        let _ = writeln!(out, "#define FRAME_INTERVAL ({})", self.interval_us);
        if self.interlaced {
            out.push_str("#define FRAME_INTERLACED (1)\n");
        }
        out.push('\n');
        out.push_str(&wrapped_array("uint8_t*", "frames", names));
        out
    }
}

/// Serializes packed frames as a self-contained C translation unit.
///
/// Each frame becomes one `frameN` array as it arrives; [`SourceWriter::finish`] appends the
/// manifest and the `frames` table in submission order.
pub struct SourceWriter<W: Write> {
    out: W,
    size: FrameSize,
    interlaced: bool,
    names: Vec<String>,
    next: FrameIndex,
}

impl<W: Write> SourceWriter<W> {
    pub fn new(mut out: W, size: FrameSize, interlaced: bool) -> TtyAppleResult<Self> {
        size.validate()?;
        out.write_all(PRELUDE.as_bytes())
            .map_err(|e| TtyAppleError::io(format!("failed to write source prelude: {e}")))?;
        Ok(Self {
            out,
            size,
            interlaced,
            names: Vec::new(),
            next: FrameIndex(0),
        })
    }

    /// Frames written so far.
    pub fn frame_count(&self) -> u64 {
        self.next.0
    }

    /// Emit one packed frame (or field) as the next `frameN` array.
    pub fn write_frame(&mut self, packed: &[u8]) -> TtyAppleResult<FrameIndex> {
        let idx = self.next;
        let name = frame_name(idx);
        let text = byte_array(&name, packed);
        self.out.write_all(text.as_bytes()).map_err(|e| {
            TtyAppleError::io(format!("failed to write '{name}' ({} bytes): {e}", packed.len()))
        })?;

        self.names.push(name);
        self.next = idx.next();
        Ok(idx)
    }

    pub fn manifest(&self) -> Manifest {
        Manifest {
            frame_count: self.next.0,
            size: self.size,
            interval_us: TARGET_FPS.frame_interval_us(),
            interlaced: self.interlaced,
        }
    }

    /// Append the manifest and frame table, flush, and hand the sink back.
    pub fn finish(mut self) -> TtyAppleResult<W> {
        let text = self.manifest().render(&self.names);
        self.out
            .write_all(text.as_bytes())
            .and_then(|()| self.out.flush())
            .map_err(|e| TtyAppleError::io(format!("failed to write source manifest: {e}")))?;
        Ok(self.out)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/output/source.rs"]
mod tests;
