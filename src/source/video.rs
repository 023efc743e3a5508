use std::ffi::OsString;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use crate::foundation::core::{FrameIndex, FrameSize, Fps};
use crate::foundation::error::{TtyAppleError, TtyAppleResult};
use crate::frame::slot::FrameSink;
use crate::output::toolchain::locate_executable;
use crate::source::{FrameLimit, FrameSource};

pub const FFMPEG: &str = "ffmpeg";
pub const FFPROBE: &str = "ffprobe";

#[derive(serde::Deserialize)]
struct ProbeStream {
    codec_type: Option<String>,
    avg_frame_rate: Option<String>,
    r_frame_rate: Option<String>,
}

#[derive(serde::Deserialize)]
struct ProbeOut {
    streams: Vec<ProbeStream>,
}

/// Frame rate of the first video stream in `ffprobe -print_format json` output.
///
/// Uses `avg_frame_rate`, falling back to `r_frame_rate` when ffprobe reports `0/0`.
pub fn parse_probe(json: &[u8]) -> TtyAppleResult<Fps> {
    let parsed: ProbeOut = serde_json::from_slice(json)
        .map_err(|e| TtyAppleError::decode(format!("ffprobe json parse failed: {e}")))?;
    let stream = parsed
        .streams
        .iter()
        .find(|s| s.codec_type.as_deref() == Some("video"))
        .ok_or_else(|| TtyAppleError::decode("no video stream found"))?;

    [stream.avg_frame_rate.as_deref(), stream.r_frame_rate.as_deref()]
        .into_iter()
        .flatten()
        .find_map(|rate| Fps::parse_rational(rate).ok())
        .ok_or_else(|| TtyAppleError::decode("video stream has no usable frame rate"))
}

/// ffmpeg arguments: decode `input` to gray rawvideo at `size` on stdout.
pub fn decode_args(input: &Path, size: FrameSize) -> Vec<OsString> {
    let mut args: Vec<OsString> = ["-v", "error", "-nostdin", "-i"]
        .into_iter()
        .map(OsString::from)
        .collect();
    args.push(input.as_os_str().to_owned());
    args.extend(
        [
            "-an".to_owned(),
            "-vf".to_owned(),
            format!("scale={}:{}", size.width, size.height),
            "-f".to_owned(),
            "rawvideo".to_owned(),
            "-pix_fmt".to_owned(),
            "gray".to_owned(),
            "pipe:1".to_owned(),
        ]
        .into_iter()
        .map(OsString::from),
    );
    args
}

/// Fill `buf` completely. `Ok(false)` on a clean end of input before the first byte.
fn read_frame(reader: &mut impl Read, buf: &mut [u8]) -> TtyAppleResult<bool> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == std::io::ErrorKind::Interrupted => {}
            Err(e) => {
                return Err(TtyAppleError::decode(format!("failed to read from ffmpeg: {e}")));
            }
        }
    }
    match filled {
        0 => Ok(false),
        n if n == buf.len() => Ok(true),
        n => Err(TtyAppleError::decode(format!(
            "ffmpeg output ended mid-frame ({n} of {} bytes)",
            buf.len()
        ))),
    }
}

/// Push raw gray frames from `reader` into `sink`. Returns the count and whether input ran out.
fn pump(
    reader: &mut impl Read,
    sink: &dyn FrameSink,
    fps: Fps,
    limit: FrameLimit,
) -> TtyAppleResult<(u64, bool)> {
    let mut produced = 0u64;
    loop {
        if limit.reached(produced) {
            return Ok((produced, false));
        }
        let mut frame = sink.acquire_recycled()?;
        if !read_frame(reader, frame.pixels_mut())? {
            return Ok((produced, true));
        }
        let ts_us = fps.timestamp_us(FrameIndex(produced));
        frame.set_timestamp_us(ts_us);
        sink.submit(frame)?;
        tracing::trace!(ts_us, "decoded frame");
        produced += 1;
    }
}

/// Video file decoded by the system `ffmpeg`.
#[derive(Clone, Debug)]
pub struct VideoSource {
    path: PathBuf,
    limit: FrameLimit,
    search_path: Option<OsString>,
}

impl VideoSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            limit: FrameLimit::default(),
            search_path: None,
        }
    }

    pub fn with_frame_limit(mut self, limit: Option<u64>) -> Self {
        self.limit = FrameLimit(limit);
        self
    }

    /// Look for `ffmpeg`/`ffprobe` here instead of on `PATH`.
    pub fn with_search_path(mut self, search_path: impl Into<OsString>) -> Self {
        self.search_path = Some(search_path.into());
        self
    }

    fn probe_fps(&self, ffprobe: &Path) -> TtyAppleResult<Fps> {
        let out = Command::new(ffprobe)
            .args(["-v", "error", "-select_streams", "v:0", "-show_streams"])
            .args(["-print_format", "json"])
            .arg(&self.path)
            .output()
            .map_err(|e| TtyAppleError::decode(format!("failed to run ffprobe: {e}")))?;
        if !out.status.success() {
            return Err(TtyAppleError::decode(format!(
                "ffprobe failed for '{}': {}",
                self.path.display(),
                String::from_utf8_lossy(&out.stderr).trim()
            )));
        }
        parse_probe(&out.stdout)
    }
}

impl FrameSource for VideoSource {
    fn stream(&mut self, sink: &dyn FrameSink) -> TtyAppleResult<u64> {
        if !self.path.is_file() {
            return Err(TtyAppleError::config(format!(
                "video file '{}' does not exist",
                self.path.display()
            )));
        }
        let search_path = self.search_path.as_deref();
        let ffprobe = locate_executable(FFPROBE, search_path)?;
        let ffmpeg = locate_executable(FFMPEG, search_path)?;

        let fps = self.probe_fps(&ffprobe)?;
        tracing::debug!(path = %self.path.display(), fps = fps.as_f64(), "probed video");

        let mut child = Command::new(&ffmpeg)
            .args(decode_args(&self.path, sink.frame_size()))
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| TtyAppleError::decode(format!("failed to spawn ffmpeg: {e}")))?;

        let mut stdout = child
            .stdout
            .take()
            .ok_or_else(|| TtyAppleError::decode("failed to open ffmpeg stdout (unexpected)"))?;
        let mut stderr = child
            .stderr
            .take()
            .ok_or_else(|| TtyAppleError::decode("failed to open ffmpeg stderr (unexpected)"))?;
        let stderr_drain = std::thread::spawn(move || {
            let mut stderr_bytes = Vec::new();
            stderr.read_to_end(&mut stderr_bytes)?;
            Ok::<_, std::io::Error>(stderr_bytes)
        });

        let pumped = pump(&mut stdout, sink, fps, self.limit);
        drop(stdout);

        let input_done = matches!(pumped, Ok((_, true)));
        if !input_done {
            // Stopped early; ffmpeg may still be writing.
            if let Err(e) = child.kill() {
                tracing::debug!("failed to stop ffmpeg: {e}");
            }
        }
        let status = child
            .wait()
            .map_err(|e| TtyAppleError::decode(format!("failed to wait for ffmpeg: {e}")));
        let stderr_bytes = match stderr_drain.join() {
            Ok(Ok(bytes)) => bytes,
            _ => Vec::new(),
        };

        let (produced, _) = pumped?;
        let status = status?;
        if input_done && !status.success() {
            return Err(TtyAppleError::decode(format!(
                "ffmpeg exited with status {status}: {}",
                String::from_utf8_lossy(&stderr_bytes).trim()
            )));
        }

        tracing::debug!(frames = produced, "video decode done");
        Ok(produced)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/source/video.rs"]
mod tests;
