//! Detelecine benchmarks

use criterion::{black_box, criterion_group, criterion_main, BatchSize, Criterion, Throughput};
use detelecine::{weave_fields, Detelecine, DetelecineConfig, FirstField, StreamInfo};
use detelecine_core::{Frame, FrameBuffer, PixelFormat, Rational, TimeBase};

fn generate_test_frame(width: u32, height: u32, seed: usize) -> Frame {
    let mut frame = Frame::new(width, height, PixelFormat::Yuv420p, TimeBase::MPEG);

    for plane in 0..3 {
        if let Some(data) = frame.plane_mut(plane) {
            for (i, pixel) in data.iter_mut().enumerate() {
                *pixel = ((i * 7 + seed * 13) % 256) as u8;
            }
        }
    }

    frame
}

fn bench_weave(c: &mut Criterion) {
    let mut group = c.benchmark_group("weave_fields");

    for (width, height, name) in &[(1920u32, 1080u32, "1080p"), (720, 480, "480p")] {
        let pixels = (*width as u64) * (*height as u64);
        group.throughput(Throughput::Elements(pixels));

        let new = generate_test_frame(*width, *height, 1);
        let held = generate_test_frame(*width, *height, 2);
        let mut dst = FrameBuffer::new(*width, *height, PixelFormat::Yuv420p);

        group.bench_function(*name, |b| {
            b.iter(|| {
                weave_fields(&mut dst, new.buffer(), held.buffer(), FirstField::Top).unwrap();
                black_box(&dst);
            })
        });
    }

    group.finish();
}

fn bench_pulldown_cycle(c: &mut Criterion) {
    let mut group = c.benchmark_group("detelecine_cycle");

    for (width, height, name) in &[(1920u32, 1080u32, "1080p"), (720, 480, "480p")] {
        // One 3:2 cycle: five input frames.
        group.throughput(Throughput::Elements(5));

        let frames: Vec<Frame> = (0..5)
            .map(|i| generate_test_frame(*width, *height, i))
            .collect();
        let stream = StreamInfo::new(
            *width,
            *height,
            PixelFormat::Yuv420p,
            Rational::new(30000, 1001),
            TimeBase::MPEG,
        );

        group.bench_function(*name, |b| {
            b.iter_batched(
                || Detelecine::with_frame_pool(DetelecineConfig::default(), stream).unwrap(),
                |mut filter| {
                    let mut output: Vec<Frame> = Vec::with_capacity(4);
                    for frame in &frames {
                        filter.process(frame, &mut output).unwrap();
                    }
                    black_box(output)
                },
                BatchSize::LargeInput,
            );
        });
    }

    group.finish();
}

criterion_group!(benches, bench_weave, bench_pulldown_cycle);
criterion_main!(benches);
