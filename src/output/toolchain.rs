use std::ffi::{OsStr, OsString};
use std::path::{Path, PathBuf};
use std::process::{Command, ExitStatus};

use crate::foundation::error::{TtyAppleError, TtyAppleResult};

/// C compiler used to build the freestanding image.
pub const COMPILER: &str = "clang";
/// PE/COFF linker (the Windows flavour of LLD).
pub const LINKER: &str = "lld-link";
/// Freestanding target the frames are compiled for.
pub const TARGET_TRIPLE: &str = "x86_64-unknown-windows";

/// Find `name` on `search_path`, or on `PATH` when `None`.
pub fn locate_executable(name: &str, search_path: Option<&OsStr>) -> TtyAppleResult<PathBuf> {
    let cwd = std::env::current_dir()
        .map_err(|e| TtyAppleError::config(format!("failed to read working directory: {e}")))?;
    let path = match search_path {
        Some(paths) => which::which_in(name, Some(paths), &cwd),
        None => which::which_in(name, std::env::var_os("PATH"), &cwd),
    };
    path.map_err(|e| TtyAppleError::config(format!("failed to find '{name}' on PATH: {e}")))
}

/// Directory containing the running executable, with symlinks resolved.
pub fn run_dir() -> TtyAppleResult<PathBuf> {
    let exe = std::env::current_exe()
        .and_then(|p| p.canonicalize())
        .map_err(|e| TtyAppleError::config(format!("failed to resolve executable path: {e}")))?;
    exe.parent()
        .map(Path::to_path_buf)
        .ok_or_else(|| TtyAppleError::config(format!("'{}' has no parent", exe.display())))
}

/// Map a finished process status to the run's failure policy.
pub fn check_exit(process: &Path, status: ExitStatus) -> TtyAppleResult<()> {
    if status.success() {
        return Ok(());
    }
    match status.code() {
        Some(code) => Err(TtyAppleError::toolchain(format!(
            "process '{}' exited with status {code}",
            process.display()
        ))),
        None => Err(TtyAppleError::toolchain(format!(
            "process '{}' was terminated abnormally ({})",
            process.display(),
            describe_abnormal(status)
        ))),
    }
}

#[cfg(unix)]
fn describe_abnormal(status: ExitStatus) -> String {
    use std::os::unix::process::ExitStatusExt as _;
    match status.signal() {
        Some(sig) => format!("signal {sig}"),
        None => status.to_string(),
    }
}

#[cfg(not(unix))]
fn describe_abnormal(status: ExitStatus) -> String {
    status.to_string()
}

/// Resolved compiler and linker executables.
#[derive(Clone, Debug)]
pub struct Toolchain {
    pub compiler: PathBuf,
    pub linker: PathBuf,
}

impl Toolchain {
    /// Locate both tools; either one missing is a configuration error.
    pub fn locate(search_path: Option<&OsStr>) -> TtyAppleResult<Self> {
        let compiler = locate_executable(COMPILER, search_path)?;
        let linker = locate_executable(LINKER, search_path)?;
        tracing::debug!(compiler = %compiler.display(), linker = %linker.display(), "located toolchain");
        Ok(Self { compiler, linker })
    }

    pub fn compile_command(&self, include_dirs: &[PathBuf], object: &Path) -> Command {
        let mut cmd = Command::new(&self.compiler);
        cmd.args(compile_args(include_dirs, object));
        cmd
    }

    pub fn link_command(&self, object: &Path, image: &Path) -> Command {
        let mut cmd = Command::new(&self.linker);
        cmd.args(link_args(object, image));
        cmd
    }
}

/// Compiler flags: C from stdin to a freestanding, red-zone-free object file.
pub fn compile_args(include_dirs: &[PathBuf], object: &Path) -> Vec<OsString> {
    let mut args: Vec<OsString> = [
        "-target",
        TARGET_TRIPLE,
        "-c",
        "-x",
        "c",
        "-",
        "-DMDE_CPU_X64",
        "-DUEFI",
        "-Wno-microsoft-static-assert",
        "-ffreestanding",
        "-mno-red-zone",
    ]
    .into_iter()
    .map(OsString::from)
    .collect();
    for dir in include_dirs {
        let mut include = OsString::from("-I");
        include.push(dir);
        args.push(include);
    }
    args.push("-o".into());
    args.push(object.as_os_str().to_owned());
    args
}

/// Linker flags: a UEFI application entered at `efi_main`, built from one object.
pub fn link_args(object: &Path, image: &Path) -> Vec<OsString> {
    let mut out = OsString::from("-out:");
    out.push(image);
    vec![
        "-subsystem:efi_application".into(),
        "-entry:efi_main".into(),
        out,
        object.as_os_str().to_owned(),
    ]
}

#[cfg(test)]
#[path = "../../tests/unit/output/toolchain.rs"]
mod tests;
