//! # Detelecine
//!
//! Inverse telecine for raw video frames.
//!
//! Telecined video carries progressive frames spread over interlaced fields
//! following a repeating cadence, such as 3:2 pulldown turning 24 fps film
//! into 30 fps video. This crate undoes that:
//!
//! - **Cadence model**: digit patterns (`"23"`, `"2332"`, ...) with phase offset
//! - **Field reassembly**: skips duplicate fields and weaves split frames
//!   back together from two inputs
//! - **Retiming**: output frame rate, time base and timestamps derived
//!   exactly from the cadence ratio
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use detelecine::{Detelecine, DetelecineConfig, StreamInfo};
//! use detelecine_core::{PixelFormat, Rational, TimeBase};
//!
//! let config: DetelecineConfig = "first_field=top:pattern=23".parse()?;
//! let stream = StreamInfo::new(
//!     720,
//!     480,
//!     PixelFormat::Yuv420p,
//!     Rational::new(30000, 1001),
//!     TimeBase::MPEG,
//! );
//! let mut filter = Detelecine::with_frame_pool(config, stream)?;
//!
//! let mut output = Vec::new();
//! for frame in input_frames {
//!     filter.process(&frame, &mut output)?;
//! }
//! // 24000/1001 fps
//! println!("{}", filter.output_stream().frame_rate);
//! ```
//!
//! ## Custom allocation
//!
//! Emitted frames are drawn from a
//! [`FrameAllocator`](detelecine_core::FrameAllocator). Pass a
//! [`SharedFramePool`](detelecine_core::SharedFramePool) to let the consumer
//! recycle buffers:
//!
//! ```rust,ignore
//! use detelecine::{Detelecine, DetelecineConfig, FnSink};
//! use detelecine_core::SharedFramePool;
//!
//! let pool = SharedFramePool::new(720, 480, PixelFormat::Yuv420p, 8);
//! let recycle = pool.clone();
//! let mut filter = Detelecine::new(DetelecineConfig::default(), stream, pool)?;
//! let mut sink = FnSink(move |frame: Frame| {
//!     encoder.encode(&frame)?;
//!     recycle.release(frame.into_buffer());
//!     Ok(())
//! });
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod cadence;
pub mod config;
pub mod emit;
pub mod engine;
pub mod error;
pub mod field;
pub mod interleave;
pub mod sink;
pub mod timing;

// Re-export main types
pub use cadence::Cadence;
pub use config::{DetelecineConfig, FirstField, DEFAULT_PATTERN, MAX_START_FRAME};
pub use emit::OutputClock;
pub use engine::{Detelecine, DetelecineStats, StreamInfo};
pub use error::{DetelecineError, Result};
pub use field::FieldBuffer;
pub use interleave::{copy_frame, field_rows, weave_fields};
pub use sink::{FnSink, FrameSink};
pub use timing::{OutputStream, StreamTiming};

use detelecine_core::Frame;

/// Run a whole sequence of frames through a fresh engine.
pub fn detelecine_frames<'a, I>(
    config: DetelecineConfig,
    stream: StreamInfo,
    frames: I,
) -> Result<Vec<Frame>>
where
    I: IntoIterator<Item = &'a Frame>,
{
    let mut filter = Detelecine::with_frame_pool(config, stream)?;
    let mut output = Vec::new();
    for frame in frames {
        filter.process(frame, &mut output)?;
    }
    Ok(output)
}

/// Derive the output frame rate for an input rate and cadence pattern.
pub fn output_frame_rate(
    input_rate: detelecine_core::Rational,
    pattern: &str,
) -> Result<detelecine_core::Rational> {
    let cadence = Cadence::parse(pattern, 0)?;
    Ok(input_rate * cadence.ratio().recip())
}
