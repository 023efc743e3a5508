use super::*;

#[test]
fn frame_size_rejects_zero_sides() {
    assert!(FrameSize::new(0, 10).is_err());
    assert!(FrameSize::new(10, 0).is_err());
    assert!(FrameSize::new(96, 72).is_ok());
}

#[test]
fn stride_pads_to_whole_bytes() {
    assert_eq!(FrameSize::new(8, 1).unwrap().stride(), 1);
    assert_eq!(FrameSize::new(9, 1).unwrap().stride(), 2);
    assert_eq!(FrameSize::new(96, 72).unwrap().stride(), 12);
    assert_eq!(FrameSize::new(4, 2).unwrap().pixel_len(), 8);
}

#[test]
fn fps_parses_ffprobe_rationals() {
    assert_eq!(Fps::parse_rational("24000/1001").unwrap(), Fps::new(24000, 1001).unwrap());
    assert_eq!(Fps::parse_rational("30").unwrap(), Fps::new(30, 1).unwrap());
    assert!(Fps::parse_rational("0/0").is_err());
    assert!(Fps::parse_rational("abc").is_err());
}

#[test]
fn timestamps_follow_frame_rate() {
    let fps = Fps::new(24, 1).unwrap();
    assert_eq!(fps.frame_interval_us(), 41_666);
    assert_eq!(fps.timestamp_us(FrameIndex(0)), 0);
    assert_eq!(fps.timestamp_us(FrameIndex(24)), 1_000_000);
    assert_eq!(fps.timestamp_us(FrameIndex(1)), 41_666);
}

#[test]
fn frame_index_parity() {
    assert!(!FrameIndex(0).is_odd());
    assert!(FrameIndex(0).next().is_odd());
}
