use std::ffi::OsString;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::process::{Child, ChildStdin, Stdio};

use crate::foundation::core::FrameSize;
use crate::foundation::error::{TtyAppleError, TtyAppleResult};
use crate::output::ensure_parent_dir;
use crate::output::source::SourceWriter;
use crate::output::toolchain::{Toolchain, check_exit, run_dir};

/// Intermediate object file name, placed next to the image.
pub const OBJECT_FILE: &str = "frames.o";
/// Generic playback loop over the `frames` table.
pub const PLAYER_TEMPLATE: &str = "frame_player.c";
/// UEFI entry point and console shims.
pub const ENTRY_TEMPLATE: &str = "uefi_entry.c";

/// Options for the freestanding image output.
#[derive(Clone, Debug)]
pub struct ImageConfig {
    /// Path of the linked image.
    pub out_path: PathBuf,
    /// Directories handed to the compiler with `-I`, in order (UEFI headers).
    pub include_dirs: Vec<PathBuf>,
    /// Directory holding [`PLAYER_TEMPLATE`] and [`ENTRY_TEMPLATE`].
    pub template_dir: PathBuf,
    /// Search path for the toolchain. `None` uses `PATH`.
    pub search_path: Option<OsString>,
}

impl ImageConfig {
    /// Defaults resolved relative to the running executable.
    pub fn new(out_path: impl Into<PathBuf>) -> TtyAppleResult<Self> {
        let data = resolve_data_dir(&run_dir()?);
        Ok(Self {
            out_path: out_path.into(),
            include_dirs: vec![data.join("uefi")],
            template_dir: data,
            search_path: None,
        })
    }

    /// Append a header directory after the bundled processor bindings.
    pub fn with_include_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.include_dirs.push(dir.into());
        self
    }

    pub fn with_template_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.template_dir = dir.into();
        self
    }

    pub fn validate(&self) -> TtyAppleResult<()> {
        if self.out_path.as_os_str().is_empty() {
            return Err(TtyAppleError::validation("image output path must not be empty"));
        }
        if !self.template_dir.is_dir() {
            return Err(TtyAppleError::config(format!(
                "template directory '{}' does not exist",
                self.template_dir.display()
            )));
        }
        Ok(())
    }

    /// The compiler's fixed output path, which is also the linker's only input.
    pub fn object_path(&self) -> PathBuf {
        match self.out_path.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => dir.join(OBJECT_FILE),
            _ => PathBuf::from(OBJECT_FILE),
        }
    }
}

/// `data/` next to the executable, falling back to the source tree for `target/<profile>`.
pub fn resolve_data_dir(run_dir: &Path) -> PathBuf {
    let beside = run_dir.join("data");
    if beside.is_dir() {
        return beside;
    }
    let from_target = run_dir.join("..").join("..").join("data");
    if from_target.is_dir() {
        return from_target;
    }
    beside
}

struct Template {
    name: &'static str,
    text: Vec<u8>,
}

fn load_templates(dir: &Path) -> TtyAppleResult<[Template; 2]> {
    let load = |name: &'static str| -> TtyAppleResult<Template> {
        let path = dir.join(name);
        let text = std::fs::read(&path).map_err(|e| {
            TtyAppleError::config(format!("failed to read template '{}': {e}", path.display()))
        })?;
        Ok(Template { name, text })
    };
    Ok([load(PLAYER_TEMPLATE)?, load(ENTRY_TEMPLATE)?])
}

/// Streams the generated source into a compiler, then links the result.
///
/// Dropping an unfinished backend kills the compiler and removes the object file.
pub(crate) struct ImageBackend {
    // Both are `Some` until `finish` or `drop` takes them.
    source: Option<SourceWriter<BufWriter<ChildStdin>>>,
    compiler: Option<Child>,
    toolchain: Toolchain,
    templates: [Template; 2],
    cfg: ImageConfig,
}

impl ImageBackend {
    pub(crate) fn spawn(cfg: ImageConfig, size: FrameSize, interlaced: bool) -> TtyAppleResult<Self> {
        cfg.validate()?;
        let toolchain = Toolchain::locate(cfg.search_path.as_deref())?;
        let templates = load_templates(&cfg.template_dir)?;
        ensure_parent_dir(&cfg.out_path)?;

        let object = cfg.object_path();
        let mut compiler = toolchain
            .compile_command(&cfg.include_dirs, &object)
            .stdin(Stdio::piped())
            .spawn()
            .map_err(|e| {
                TtyAppleError::toolchain(format!(
                    "failed to spawn '{}': {e}",
                    toolchain.compiler.display()
                ))
            })?;
        tracing::debug!(pid = compiler.id(), object = %object.display(), "spawned compiler");

        let stdin = compiler.stdin.take();
        let mut backend = Self {
            source: None,
            compiler: Some(compiler),
            toolchain,
            templates,
            cfg,
        };
        let stdin = stdin
            .ok_or_else(|| TtyAppleError::toolchain("failed to open compiler stdin (unexpected)"))?;
        backend.source = Some(SourceWriter::new(BufWriter::new(stdin), size, interlaced)?);
        Ok(backend)
    }

    fn source(&mut self) -> TtyAppleResult<&mut SourceWriter<BufWriter<ChildStdin>>> {
        self.source
            .as_mut()
            .ok_or_else(|| TtyAppleError::toolchain("compiler input already closed (unexpected)"))
    }

    pub(crate) fn write_frame(&mut self, packed: &[u8]) -> TtyAppleResult<()> {
        self.source()?.write_frame(packed).map(|_| ())
    }

    #[cfg(test)]
    pub(crate) fn frame_count(&self) -> u64 {
        self.source.as_ref().map_or(0, |s| s.frame_count())
    }

    /// Close the compiler's input, wait for it, link, and clean up the object file.
    pub(crate) fn finish(mut self) -> TtyAppleResult<PathBuf> {
        let object = self.cfg.object_path();
        let (Some(source), Some(mut compiler)) = (self.source.take(), self.compiler.take()) else {
            return Err(TtyAppleError::toolchain("image build already finished (unexpected)"));
        };
        let toolchain = &self.toolchain;

        let streamed = stream_tail(source, &self.templates);

        let status = compiler.wait().map_err(|e| {
            TtyAppleError::toolchain(format!(
                "error waiting for '{}': {e}",
                toolchain.compiler.display()
            ))
        });
        let compiled = status.and_then(|s| check_exit(&toolchain.compiler, s));
        if let Err(e) = compiled.and(streamed) {
            remove_object(&object);
            return Err(e);
        }
        tracing::info!(object = %object.display(), "compiled frames");

        let linked = toolchain
            .link_command(&object, &self.cfg.out_path)
            .status()
            .map_err(|e| {
                TtyAppleError::toolchain(format!(
                    "failed to run '{}': {e}",
                    toolchain.linker.display()
                ))
            })
            .and_then(|s| check_exit(&toolchain.linker, s));
        remove_object(&object);
        linked?;

        tracing::info!(image = %self.cfg.out_path.display(), "linked image");
        Ok(self.cfg.out_path.clone())
    }
}

impl Drop for ImageBackend {
    fn drop(&mut self) {
        let Some(mut compiler) = self.compiler.take() else {
            return;
        };
        // Kill before closing stdin so a partial unit is never compiled.
        if let Err(e) = compiler.kill() {
            tracing::debug!("failed to stop compiler: {e}");
        }
        drop(self.source.take());
        if let Err(e) = compiler.wait() {
            tracing::warn!("failed to wait for abandoned compiler: {e}");
        }
        let object = self.cfg.object_path();
        if object.exists() {
            remove_object(&object);
        }
        tracing::debug!(object = %object.display(), "abandoned image build");
    }
}

/// Manifest, then the driver and entry templates verbatim; dropping the writer closes the pipe.
fn stream_tail(
    source: SourceWriter<BufWriter<ChildStdin>>,
    templates: &[Template],
) -> TtyAppleResult<()> {
    let mut pipe = source.finish()?;
    for t in templates {
        pipe.write_all(&t.text).map_err(|e| {
            TtyAppleError::io(format!("failed to write template '{}' to compiler: {e}", t.name))
        })?;
    }
    pipe.flush()
        .map_err(|e| TtyAppleError::io(format!("failed to flush compiler input: {e}")))
}

fn remove_object(object: &Path) {
    if let Err(e) = std::fs::remove_file(object) {
        tracing::warn!(object = %object.display(), "failed to remove object file: {e}");
    }
}

#[cfg(test)]
#[path = "../../tests/unit/output/image.rs"]
mod tests;
