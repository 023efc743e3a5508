use super::*;

fn scratch(name: &str) -> PathBuf {
    let dir = PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("target")
        .join("ttyapple-unit")
        .join(name);
    let _ = std::fs::remove_dir_all(&dir);
    std::fs::create_dir_all(&dir).unwrap();
    dir
}

fn data_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("data")
}

fn config(out_path: PathBuf, search_path: &Path) -> ImageConfig {
    ImageConfig {
        out_path,
        include_dirs: vec![data_dir().join("uefi")],
        template_dir: data_dir(),
        search_path: Some(search_path.as_os_str().to_owned()),
    }
}

#[test]
fn object_file_sits_next_to_the_image() {
    let cfg = ImageConfig::new("boot/output.efi").unwrap();
    assert_eq!(cfg.object_path(), PathBuf::from("boot").join(OBJECT_FILE));

    let cfg = ImageConfig::new("output.efi").unwrap();
    assert_eq!(cfg.object_path(), PathBuf::from(OBJECT_FILE));
}

#[test]
fn extra_include_dirs_follow_the_bundled_one() {
    let cfg = ImageConfig::new("output.efi")
        .unwrap()
        .with_include_dir("/opt/edk2/MdePkg/Include");
    assert_eq!(cfg.include_dirs.len(), 2);
    assert!(cfg.include_dirs[0].ends_with("uefi"));
    assert_eq!(cfg.include_dirs[1], PathBuf::from("/opt/edk2/MdePkg/Include"));
}

#[test]
fn data_dir_prefers_the_executable_directory() {
    let root = scratch("data-dir-beside");
    std::fs::create_dir_all(root.join("data")).unwrap();
    assert_eq!(resolve_data_dir(&root), root.join("data"));
}

#[test]
fn data_dir_falls_back_to_the_source_tree() {
    let root = scratch("data-dir-fallback");
    let run = root.join("target").join("debug");
    std::fs::create_dir_all(&run).unwrap();
    std::fs::create_dir_all(root.join("data")).unwrap();

    let resolved = resolve_data_dir(&run);
    assert_eq!(resolved.canonicalize().unwrap(), root.join("data").canonicalize().unwrap());
}

#[test]
fn bundled_templates_load() {
    let [player, entry] = load_templates(&data_dir()).unwrap();
    assert_eq!(player.name, PLAYER_TEMPLATE);
    assert!(String::from_utf8_lossy(&player.text).contains("play_frames"));
    assert_eq!(entry.name, ENTRY_TEMPLATE);
    assert!(String::from_utf8_lossy(&entry.text).contains("efi_main"));
}

#[test]
fn missing_template_dir_is_a_configuration_error() {
    let root = scratch("no-templates");
    let cfg = config(root.join("output.efi"), &root).with_template_dir(root.join("absent"));
    let err = cfg.validate().unwrap_err();
    assert!(matches!(err, TtyAppleError::Config(_)));
}

#[test]
fn missing_toolchain_fails_before_anything_is_written() {
    let root = scratch("no-toolchain");
    let empty = root.join("bin");
    std::fs::create_dir_all(&empty).unwrap();

    let cfg = config(root.join("out").join("output.efi"), &empty);
    let size = FrameSize::new(8, 2).unwrap();
    let err = ImageBackend::spawn(cfg, size, false).err().unwrap();
    assert!(matches!(err, TtyAppleError::Config(_)));
    assert!(err.to_string().contains(crate::output::toolchain::COMPILER));
    assert!(!root.join("out").exists());
}

#[cfg(unix)]
fn install_script(dir: &Path, name: &str, body: &str) {
    use std::os::unix::fs::PermissionsExt as _;

    let path = dir.join(name);
    std::fs::write(&path, format!("#!/bin/sh\n{body}")).unwrap();
    std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
}

/// A compiler that copies its stdin to `-o`, and a linker that copies its object to `-out:`.
#[cfg(unix)]
fn fake_toolchain(dir: &Path, compiler_exit: i32, linker_exit: i32) {
    // `exec` keeps `cat` in the compiler's own process so a kill stops it too.
    let compile = if compiler_exit == 0 {
        r#"exec cat > "$out""#.to_owned()
    } else {
        format!("cat > \"$out\"\nexit {compiler_exit}")
    };
    install_script(
        dir,
        crate::output::toolchain::COMPILER,
        &format!(
            r#"out=""
while [ $# -gt 0 ]; do
  if [ "$1" = "-o" ]; then out="$2"; shift; fi
  shift
done
{compile}
"#
        ),
    );
    install_script(
        dir,
        crate::output::toolchain::LINKER,
        &format!(
            r#"for a in "$@"; do
  case "$a" in
    -out:*) out="${{a#-out:}}" ;;
    -*) ;;
    *) obj="$a" ;;
  esac
done
[ {linker_exit} -eq 0 ] || exit {linker_exit}
cp "$obj" "$out"
"#
        ),
    );
}

#[cfg(unix)]
#[test]
fn streams_source_and_templates_through_the_toolchain() {
    let root = scratch("fake-toolchain-ok");
    let bin = root.join("bin");
    std::fs::create_dir_all(&bin).unwrap();
    fake_toolchain(&bin, 0, 0);

    let out = root.join("boot").join("output.efi");
    let cfg = config(out.clone(), &bin);
    let object = cfg.object_path();
    let mut backend = ImageBackend::spawn(cfg, FrameSize::new(8, 2).unwrap(), true).unwrap();
    backend.write_frame(&[0xFF]).unwrap();
    backend.write_frame(&[0x0F]).unwrap();
    assert_eq!(backend.frame_count(), 2);

    let image = backend.finish().unwrap();
    assert_eq!(image, out);
    assert!(!object.exists(), "object file should be removed");

    let text = std::fs::read_to_string(&image).unwrap();
    assert!(text.starts_with("#include <stdint.h>\n"));
    assert!(text.contains("uint8_t frame1[1] = {\n    15,\n};\n"));
    assert!(text.contains("#define FRAME_COUNT (2)\n"));
    assert!(text.contains("#define FRAME_INTERLACED (1)\n"));

    let manifest = text.find("FRAME_COUNT").unwrap();
    let driver = text.find("void play_frames(void)").unwrap();
    let entry = text.find("efi_main").unwrap();
    assert!(manifest < driver && driver < entry);
}

#[cfg(unix)]
#[test]
fn failing_compiler_aborts_and_cleans_up() {
    let root = scratch("fake-toolchain-fail");
    let bin = root.join("bin");
    std::fs::create_dir_all(&bin).unwrap();
    fake_toolchain(&bin, 3, 0);

    let out = root.join("output.efi");
    let cfg = config(out.clone(), &bin);
    let object = cfg.object_path();
    let mut backend = ImageBackend::spawn(cfg, FrameSize::new(8, 1).unwrap(), false).unwrap();
    backend.write_frame(&[0xAA]).unwrap();

    let err = backend.finish().unwrap_err();
    assert!(matches!(err, TtyAppleError::Toolchain(_)));
    assert!(err.to_string().contains("exited with status 3"));
    assert!(!object.exists());
    assert!(!out.exists());
}

#[cfg(unix)]
#[test]
fn failing_linker_is_reported_and_the_object_is_removed() {
    let root = scratch("fake-linker-fail");
    let bin = root.join("bin");
    std::fs::create_dir_all(&bin).unwrap();
    fake_toolchain(&bin, 0, 4);

    let out = root.join("output.efi");
    let cfg = config(out.clone(), &bin);
    let object = cfg.object_path();
    let mut backend = ImageBackend::spawn(cfg, FrameSize::new(8, 1).unwrap(), false).unwrap();
    backend.write_frame(&[0x81]).unwrap();

    let err = backend.finish().unwrap_err();
    assert!(matches!(err, TtyAppleError::Toolchain(_)));
    let msg = err.to_string();
    assert!(msg.contains(crate::output::toolchain::LINKER), "{msg}");
    assert!(msg.contains("exited with status 4"), "{msg}");
    assert!(!object.exists());
    assert!(!out.exists());
}

#[cfg(unix)]
#[test]
fn dropping_an_unfinished_build_kills_the_compiler_and_removes_the_object() {
    let root = scratch("fake-toolchain-abandon");
    let bin = root.join("bin");
    std::fs::create_dir_all(&bin).unwrap();
    fake_toolchain(&bin, 0, 0);

    let out = root.join("output.efi");
    let cfg = config(out.clone(), &bin);
    let object = cfg.object_path();
    let mut backend = ImageBackend::spawn(cfg, FrameSize::new(8, 1).unwrap(), false).unwrap();
    backend.write_frame(&[0xAA]).unwrap();
    drop(backend);

    // Give a surviving compiler the chance to write after the drop.
    std::thread::sleep(std::time::Duration::from_millis(300));
    assert!(!object.exists(), "abandoned build left {}", object.display());
    assert!(!out.exists());
}
