//! Output frame emission and timestamping.

use crate::error::{DetelecineError, Result};
use crate::sink::FrameSink;
use crate::timing::StreamTiming;
use detelecine_core::{Frame, FrameAllocator, FrameBuffer, TimeBase, Timestamp};
use tracing::trace;

/// Presentation clock for emitted frames.
///
/// Output timestamps are `start + round(n × ts_unit)`, where `start` is the
/// first valid input timestamp (or 0) and `n` counts frames already handed
/// downstream.
#[derive(Debug, Clone)]
pub struct OutputClock {
    timing: StreamTiming,
    start_time: Option<i64>,
    emitted: u64,
}

impl OutputClock {
    /// Create a clock for the given stream timing.
    pub fn new(timing: StreamTiming) -> Self {
        Self {
            timing,
            start_time: None,
            emitted: 0,
        }
    }

    /// Record the first valid input timestamp. Later calls have no effect.
    pub fn observe(&mut self, pts: Timestamp) {
        if self.start_time.is_none() {
            self.start_time = pts.get();
        }
    }

    /// Timestamp the next emitted frame will carry.
    pub fn next_pts(&self) -> Timestamp {
        let base = self.start_time.unwrap_or(0);
        Timestamp::new(
            base.saturating_add(self.timing.pts_offset(self.emitted)),
            self.time_base(),
        )
    }

    /// Count one frame as handed downstream.
    pub fn advance(&mut self) {
        self.emitted += 1;
    }

    /// First valid input timestamp, once seen.
    pub fn start_time(&self) -> Option<i64> {
        self.start_time
    }

    /// Number of frames handed downstream.
    pub fn emitted(&self) -> u64 {
        self.emitted
    }

    /// Time base of output timestamps.
    pub fn time_base(&self) -> TimeBase {
        self.timing.output.time_base
    }

    /// Forget the start time and emitted count.
    pub fn reset(&mut self) {
        self.start_time = None;
        self.emitted = 0;
    }
}

/// Duplicate `slot` into a fresh buffer, stamp it and hand it to `sink`.
///
/// Frame properties come from `input`; the timestamp comes from `clock`.
pub fn emit_frame<A, S>(
    slot: &FrameBuffer,
    input: &Frame,
    allocator: &mut A,
    clock: &mut OutputClock,
    sink: &mut S,
) -> Result<()>
where
    A: FrameAllocator + ?Sized,
    S: FrameSink + ?Sized,
{
    let mut buffer = allocator
        .allocate()
        .map_err(|e| DetelecineError::AllocationFailed(e.to_string()))?;
    buffer.copy_from(slot)?;

    let mut frame = Frame::from_buffer(buffer);
    frame.copy_props_from(input);
    frame.pts = clock.next_pts();
    frame.duration.time_base = clock.time_base();

    trace!(pts = frame.pts.value, index = clock.emitted(), "emitting frame");

    clock.advance();
    sink.push_frame(frame)
}
