#![no_main]

//! Fuzz target for the reassembly engine.
//!
//! Drives the engine with arbitrary cadences, phase offsets, frame sizes and
//! pixel formats, checking the per-input output bound and timestamp order.

use arbitrary::Arbitrary;
use detelecine::{Detelecine, DetelecineConfig, FirstField, StreamInfo};
use detelecine_core::{Frame, PixelFormat, Rational, TimeBase, Timestamp};
use libfuzzer_sys::fuzz_target;

#[derive(Arbitrary, Debug)]
struct EngineInput {
    /// Cadence digits, reduced modulo 10
    digits: Vec<u8>,
    start_frame: u8,
    bottom_first: bool,
    width: u8,
    height: u8,
    format: Format,
    rate_num: u16,
    rate_den: u16,
    /// Per-frame fill values; one input frame each
    frames: Vec<u8>,
    /// Frames with missing timestamps
    drop_pts_mask: u64,
}

#[derive(Arbitrary, Debug, Clone, Copy)]
enum Format {
    Yuv420p,
    Yuv422p,
    Yuv440p,
    Nv12,
    Gray8,
    Rgb24,
}

impl From<Format> for PixelFormat {
    fn from(format: Format) -> Self {
        match format {
            Format::Yuv420p => PixelFormat::Yuv420p,
            Format::Yuv422p => PixelFormat::Yuv422p,
            Format::Yuv440p => PixelFormat::Yuv440p,
            Format::Nv12 => PixelFormat::Nv12,
            Format::Gray8 => PixelFormat::Gray8,
            Format::Rgb24 => PixelFormat::Rgb24,
        }
    }
}

fuzz_target!(|input: EngineInput| {
    // Limit sizes to keep iterations fast
    if input.digits.len() > 16 || input.frames.len() > 64 {
        return;
    }

    let pattern: String = input
        .digits
        .iter()
        .map(|d| char::from(b'0' + d % 10))
        .collect();
    let config = DetelecineConfig::new()
        .with_pattern(pattern)
        .with_start_frame(input.start_frame as u32 % 16)
        .with_first_field(if input.bottom_first {
            FirstField::Bottom
        } else {
            FirstField::Top
        });

    let width = (input.width % 33) as u32 + 1;
    let height = (input.height % 33) as u32 + 1;
    let format = PixelFormat::from(input.format);
    let rate = Rational::new(input.rate_num as i64, input.rate_den.max(1) as i64);
    let time_base = TimeBase::MPEG;
    let stream = StreamInfo::new(width, height, format, rate, time_base);

    // Bad options and rates must be rejected, not panic.
    let Ok(mut filter) = Detelecine::with_frame_pool(config, stream) else {
        return;
    };

    let mut last_pts = i64::MIN;
    for (index, &value) in input.frames.iter().enumerate() {
        let mut frame = Frame::new(width, height, format, time_base);
        frame.buffer_mut().fill(value);
        if input.drop_pts_mask & (1 << (index % 64)) == 0 {
            frame.pts = Timestamp::new(index as i64 * 3003, time_base);
        }

        let output = filter.process_to_vec(&frame).expect("valid input frame");
        assert!(output.len() <= 2);
        for out in &output {
            assert_eq!(out.width(), width);
            assert_eq!(out.height(), height);
            assert!(out.pts.value >= last_pts);
            last_pts = out.pts.value;
        }
    }
});
