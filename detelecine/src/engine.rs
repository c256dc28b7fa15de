//! Field reassembly engine.
//!
//! The engine walks the cadence one input frame at a time. Each input frame
//! carries two fields; the cadence says how many consecutive fields belong
//! to the same original frame. Frames made entirely of duplicate fields are
//! skipped, frames whose fields straddle two original frames are held as a
//! donor and woven with the next input.

use crate::cadence::Cadence;
use crate::config::{DetelecineConfig, FirstField};
use crate::emit::{emit_frame, OutputClock};
use crate::error::{DetelecineError, Result};
use crate::field::FieldBuffer;
use crate::interleave::{copy_frame, weave_fields};
use crate::sink::FrameSink;
use crate::timing::{OutputStream, StreamTiming};
use detelecine_core::{
    Frame, FrameAllocator, FrameBuffer, FramePool, PixelFormat, Rational, TimeBase,
};
use serde::{Deserialize, Serialize};
use tracing::{info, trace, warn};

/// Idle buffers kept by the pool [`Detelecine::with_frame_pool`] creates.
const DEFAULT_POOL_SIZE: usize = 4;

/// Description of the input stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StreamInfo {
    /// Frame width in pixels.
    pub width: u32,
    /// Frame height in pixels.
    pub height: u32,
    /// Pixel format of every frame.
    pub format: PixelFormat,
    /// Constant input frame rate.
    pub frame_rate: Rational,
    /// Time base of input timestamps.
    pub time_base: TimeBase,
}

impl StreamInfo {
    /// Create a stream description.
    pub fn new(
        width: u32,
        height: u32,
        format: PixelFormat,
        frame_rate: Rational,
        time_base: TimeBase,
    ) -> Self {
        Self {
            width,
            height,
            format,
            frame_rate,
            time_base,
        }
    }
}

/// Processing counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DetelecineStats {
    /// Input frames accepted.
    pub frames_in: u64,
    /// Frames handed to the sink.
    pub frames_out: u64,
    /// Input frames skipped because both fields were duplicates.
    pub frames_skipped: u64,
    /// Input frames kept only as a field donor.
    pub frames_buffered: u64,
    /// Input frames discarded because the cadence slot had no fields.
    pub cadence_drops: u64,
    /// Held fields discarded without being paired.
    pub unpaired_fields: u64,
}

/// Inverse telecine filter state for one stream.
pub struct Detelecine<A: FrameAllocator = FramePool> {
    config: DetelecineConfig,
    stream: StreamInfo,
    cadence: Cadence,
    timing: StreamTiming,
    held: FieldBuffer,
    slots: [FrameBuffer; 2],
    skip_fields: u32,
    clock: OutputClock,
    allocator: A,
    stats: DetelecineStats,
}

impl Detelecine<FramePool> {
    /// Create an engine drawing output buffers from a private frame pool.
    pub fn with_frame_pool(config: DetelecineConfig, stream: StreamInfo) -> Result<Self> {
        let pool = FramePool::new(stream.width, stream.height, stream.format, DEFAULT_POOL_SIZE);
        Self::new(config, stream, pool)
    }
}

impl<A: FrameAllocator> Detelecine<A> {
    /// Configure an engine for `stream`.
    ///
    /// The donor buffer and both output slots are taken from `allocator`
    /// here and reused for the life of the engine.
    pub fn new(config: DetelecineConfig, stream: StreamInfo, mut allocator: A) -> Result<Self> {
        let cadence = config.cadence()?;

        if allocator.format() != stream.format {
            return Err(DetelecineError::FormatMismatch {
                expected: stream.format,
                actual: allocator.format(),
            });
        }
        if allocator.width() != stream.width || allocator.height() != stream.height {
            return Err(DetelecineError::DimensionMismatch {
                expected_width: stream.width,
                expected_height: stream.height,
                actual_width: allocator.width(),
                actual_height: allocator.height(),
            });
        }

        let ratio = cadence.ratio();
        info!(
            "Detelecine pattern {} removes up to {} frames per frame, pts advance factor: {}/{}",
            cadence,
            cadence.max_frames_removed(),
            ratio.num,
            ratio.den
        );

        let timing = StreamTiming::derive(stream.frame_rate, stream.time_base, ratio)?;

        let held = FieldBuffer::new(allocate(&mut allocator)?);
        let slots = [allocate(&mut allocator)?, allocate(&mut allocator)?];

        Ok(Self {
            config,
            stream,
            cadence,
            timing,
            held,
            slots,
            skip_fields: 0,
            clock: OutputClock::new(timing),
            allocator,
            stats: DetelecineStats::default(),
        })
    }

    /// Process one input frame, handing every completed output frame to
    /// `sink`. Returns the number of frames produced (0, 1 or 2).
    pub fn process<S>(&mut self, input: &Frame, sink: &mut S) -> Result<usize>
    where
        S: FrameSink + ?Sized,
    {
        self.check_input(input)?;
        self.stats.frames_in += 1;
        self.clock.observe(input.pts);

        let produced = self.reassemble(input.buffer())?;

        for slot in &self.slots[..produced] {
            let result = emit_frame(slot, input, &mut self.allocator, &mut self.clock, sink);
            self.stats.frames_out = self.clock.emitted();
            result?;
        }
        Ok(produced)
    }

    /// Process a frame and collect its outputs.
    pub fn process_to_vec(&mut self, input: &Frame) -> Result<Vec<Frame>> {
        let mut frames = Vec::with_capacity(2);
        self.process(input, &mut frames)?;
        Ok(frames)
    }

    /// Return to the freshly configured state. Buffers are kept.
    pub fn reset(&mut self) {
        self.cadence.reset();
        self.held.release();
        self.skip_fields = 0;
        self.clock.reset();
        self.stats = DetelecineStats::default();
    }

    /// Output frame rate and time base.
    pub fn output_stream(&self) -> OutputStream {
        self.timing.output
    }

    /// Derived stream timing.
    pub fn timing(&self) -> &StreamTiming {
        &self.timing
    }

    /// Processing counters.
    pub fn stats(&self) -> DetelecineStats {
        self.stats
    }

    /// Active configuration.
    pub fn config(&self) -> &DetelecineConfig {
        &self.config
    }

    /// Input stream description.
    pub fn stream(&self) -> &StreamInfo {
        &self.stream
    }

    /// Current cadence state.
    pub fn cadence(&self) -> &Cadence {
        &self.cadence
    }

    /// Whether a donor frame is waiting to be paired.
    pub fn has_held_field(&self) -> bool {
        self.held.is_occupied()
    }

    /// Duplicate fields still to be skipped.
    pub fn skip_fields(&self) -> u32 {
        self.skip_fields
    }

    /// The allocator output buffers are drawn from.
    pub fn allocator(&self) -> &A {
        &self.allocator
    }

    fn check_input(&self, input: &Frame) -> Result<()> {
        if input.format() != self.stream.format {
            return Err(DetelecineError::FormatMismatch {
                expected: self.stream.format,
                actual: input.format(),
            });
        }
        if input.width() != self.stream.width || input.height() != self.stream.height {
            return Err(DetelecineError::DimensionMismatch {
                expected_width: self.stream.width,
                expected_height: self.stream.height,
                actual_width: input.width(),
                actual_height: input.height(),
            });
        }
        Ok(())
    }

    /// Run the cadence step for one input frame, filling output slots.
    fn reassemble(&mut self, input: &FrameBuffer) -> Result<usize> {
        if self.skip_fields >= 2 {
            self.skip_fields -= 2;
            self.stats.frames_skipped += 1;
            trace!(skip = self.skip_fields, "skipping duplicate frame");
            return Ok(0);
        }
        if self.skip_fields == 1 {
            // Only the second field is new.
            self.held.hold(input)?;
            self.skip_fields = 0;
            self.stats.frames_buffered += 1;
            trace!("buffering frame as field donor");
            return Ok(0);
        }

        let mut len = match self.cadence.take_init_len() {
            0 => self.cadence.next_len(),
            carry => carry,
        };
        if len == 0 {
            self.stats.cadence_drops += 1;
            warn!(
                "pattern {} has an empty slot, dropping input frame",
                self.cadence
            );
            return Ok(0);
        }

        let first_field = self.config.first_field;
        let mut out = 0;

        if len == 1 && self.held.is_occupied() {
            // One field left in the donor; show it whole.
            copy_frame(&mut self.slots[out], self.held.buffer())?;
            self.held.release();
            len = self.cadence.next_len();
            out += 1;
        }

        if self.held.is_occupied() {
            self.weave(out, input, first_field)?;
            self.held.release();
            if len <= 2 {
                self.held.hold(input)?;
            }
            out += 1;
            len = len.saturating_sub(3);
        } else if len >= 2 {
            copy_frame(&mut self.slots[out], input)?;
            len -= 2;
            out += 1;
        } else if len == 1 {
            copy_frame(&mut self.slots[out], input)?;
            self.held.hold(input)?;
            len = 0;
            out += 1;
        }

        if len == 1 && self.held.is_occupied() {
            len = 0;
            self.held.release();
            self.stats.unpaired_fields += 1;
            warn!("dropping unpaired held field");
        }

        self.skip_fields = len;
        trace!(
            produced = out,
            skip = self.skip_fields,
            held = self.held.is_occupied(),
            position = self.cadence.position(),
            "cadence step"
        );
        Ok(out)
    }

    fn weave(&mut self, slot: usize, input: &FrameBuffer, first_field: FirstField) -> Result<()> {
        let Self { slots, held, .. } = self;
        weave_fields(&mut slots[slot], input, held.buffer(), first_field)
    }
}

fn allocate<A: FrameAllocator + ?Sized>(allocator: &mut A) -> Result<FrameBuffer> {
    allocator
        .allocate()
        .map_err(|e| DetelecineError::AllocationFailed(e.to_string()))
}

impl<A: FrameAllocator> std::fmt::Debug for Detelecine<A> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Detelecine")
            .field("config", &self.config)
            .field("cadence", &self.cadence)
            .field("skip_fields", &self.skip_fields)
            .field("held", &self.held.is_occupied())
            .field("stats", &self.stats)
            .finish()
    }
}
