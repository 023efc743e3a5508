use super::*;
use crate::frame::buffer::Frame;
use crate::pack::field::{Field, PackedFrame};

fn assert_lines_fit(text: &str) {
    for line in text.lines() {
        assert!(line.len() <= LINE_MAX, "line too long ({}): {line}", line.len());
    }
}

#[test]
fn all_white_8x8_frame_serializes_to_one_byte_per_row() {
    let size = FrameSize::new(8, 8).unwrap();
    let mut frame = Frame::blank(size);
    frame.fill(&[255u8; 64], 0).unwrap();
    let mut packed = PackedFrame::new(size);
    let bytes = packed.pack(&frame, Field::Full).to_vec();
    assert_eq!(bytes, vec![0xFFu8; 8]);

    let mut writer = SourceWriter::new(Vec::new(), size, false).unwrap();
    writer.write_frame(&bytes).unwrap();
    let text = String::from_utf8(writer.finish().unwrap()).unwrap();

    assert!(text.starts_with("#include <stdint.h>\n"));
    assert!(text.contains(
        "uint8_t frame0[8] = {\n    255,255,255,255,255,255,255,255,\n};\n"
    ));
    assert!(text.contains("#define FRAME_COUNT (1)\n"));
    assert!(text.contains("#define FRAME_WIDTH (8)\n"));
    assert!(text.contains("#define FRAME_HEIGHT (8)\n"));
    assert!(text.contains("#define FRAME_INTERVAL (41666)\n"));
    assert!(!text.contains("FRAME_INTERLACED"));
    assert!(text.contains("uint8_t* frames[1] = {\n    frame0,\n};\n"));
    assert_lines_fit(&text);
}

#[test]
fn byte_arrays_batch_sixteen_per_line() {
    let values: Vec<u8> = (0..40u8).map(|v| v.wrapping_mul(7)).collect();
    let text = byte_array("frame3", &values);
    let lines: Vec<&str> = text.lines().collect();

    assert_eq!(lines[0], "uint8_t frame3[40] = {");
    assert_eq!(lines.len(), 1 + 3 + 1);
    assert_eq!(lines[1].matches(',').count(), 16);
    assert_eq!(lines[2].matches(',').count(), 16);
    assert_eq!(lines[3].matches(',').count(), 8);
    assert_eq!(lines[4], "};");
    assert!(lines[1].starts_with("    0,7,14,"));
}

#[test]
fn worst_case_byte_line_fits() {
    let text = byte_array("frame123456", &[255u8; 64]);
    assert_lines_fit(&text);
}

#[test]
fn frame_table_wraps_at_eighty_columns() {
    let names: Vec<String> = (0..500u64).map(|i| frame_name(FrameIndex(i))).collect();
    let text = wrapped_array("uint8_t*", "frames", &names);

    assert!(text.starts_with("uint8_t* frames[500] = {\n"));
    assert!(text.ends_with(",\n};\n"));
    assert_lines_fit(&text);

    let listed: Vec<&str> = text
        .lines()
        .skip(1)
        .filter(|l| *l != "};")
        .flat_map(|l| l.trim().split(','))
        .filter(|s| !s.is_empty())
        .collect();
    assert_eq!(listed.len(), 500);
    assert_eq!(listed[0], "frame0");
    assert_eq!(listed[499], "frame499");
}

#[test]
fn empty_table_still_compiles() {
    let text = wrapped_array("uint8_t*", "frames", &[]);
    assert_eq!(text, "uint8_t* frames[1] = {\n    0\n};\n");
}

#[test]
fn interlaced_manifest_carries_marker() {
    let size = FrameSize::new(16, 4).unwrap();
    let mut writer = SourceWriter::new(Vec::new(), size, true).unwrap();
    writer.write_frame(&[1, 2, 3, 4]).unwrap();
    writer.write_frame(&[5, 6, 7, 8]).unwrap();
    assert_eq!(writer.frame_count(), 2);

    let text = String::from_utf8(writer.finish().unwrap()).unwrap();
    assert!(text.contains("#define FRAME_INTERLACED (1)\n"));
    assert!(text.contains("#define FRAME_COUNT (2)\n"));
    assert!(text.contains("frame0,frame1,"));
    assert!(text.contains("uint8_t frame1[4] = {\n    5,6,7,8,\n};\n"));
}

#[test]
fn write_errors_surface_as_io_errors() {
    struct Broken;
    impl Write for Broken {
        fn write(&mut self, _: &[u8]) -> std::io::Result<usize> {
            Err(std::io::Error::other("disk full"))
        }
        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    let size = FrameSize::new(8, 1).unwrap();
    let err = SourceWriter::new(Broken, size, false).err().unwrap();
    assert!(matches!(err, TtyAppleError::Io(_)));
    assert!(err.to_string().contains("disk full"));
}
