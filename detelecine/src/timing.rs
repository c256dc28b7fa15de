//! Output rate and time base derivation.
//!
//! Removing duplicate fields lowers the frame rate by the cadence ratio.
//! The output time base is stretched by the same ratio, and output frames are
//! then spaced `ts_unit` ticks apart in that time base.

use crate::error::{DetelecineError, Result};
use detelecine_core::{Rational, TimeBase};
use tracing::debug;

/// Frame rate and time base of the detelecined stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OutputStream {
    /// Output frame rate.
    pub frame_rate: Rational,
    /// Time base of output presentation timestamps.
    pub time_base: TimeBase,
}

/// Timing parameters for one configured stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StreamTiming {
    /// Input frame rate.
    pub input_rate: Rational,
    /// Input time base.
    pub input_time_base: TimeBase,
    /// Output frame rate and time base.
    pub output: OutputStream,
    /// Output timestamp ticks per emitted frame.
    pub ts_unit: Rational,
}

impl StreamTiming {
    /// Derive output timing from a constant input rate and the cadence ratio.
    ///
    /// `ratio` is telecined frames per detelecined frame.
    pub fn derive(input_rate: Rational, input_time_base: TimeBase, ratio: Rational) -> Result<Self> {
        if !input_rate.is_positive() {
            return Err(DetelecineError::invalid_frame_rate(format!(
                "the input needs a constant frame rate; current rate of {}/{} is invalid",
                input_rate.num, input_rate.den
            )));
        }
        let tb = input_time_base.as_rational();
        if !tb.is_positive() {
            return Err(DetelecineError::invalid_frame_rate(format!(
                "invalid input time base {}",
                input_time_base
            )));
        }
        if !ratio.is_positive() {
            return Err(DetelecineError::invalid_option(format!(
                "cadence ratio {} must be positive",
                ratio
            )));
        }

        let frame_rate = input_rate * ratio.recip();
        debug!(
            "FPS: {}/{} -> {}/{}",
            input_rate.num, input_rate.den, frame_rate.num, frame_rate.den
        );

        let time_base = TimeBase(tb * ratio);
        debug!("TB: {} -> {}", input_time_base, time_base);

        let ts_unit = (frame_rate * time_base.as_rational()).recip();

        Ok(Self {
            input_rate,
            input_time_base,
            output: OutputStream {
                frame_rate,
                time_base,
            },
            ts_unit,
        })
    }

    /// Offset in output ticks of the `index`-th emitted frame.
    pub fn pts_offset(&self, index: u64) -> i64 {
        self.ts_unit.scale_round(index as i64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ratio(num: i64, den: i64) -> Rational {
        Rational::new(num, den)
    }

    #[test]
    fn test_frame_indexed_time_base() {
        let timing = StreamTiming::derive(ratio(30, 1), TimeBase::new(1, 30), ratio(5, 4)).unwrap();
        assert_eq!(timing.output.frame_rate, ratio(24, 1));
        assert_eq!(timing.output.time_base, TimeBase::new(1, 24));
        assert_eq!(timing.ts_unit, ratio(1, 1));
        assert_eq!(timing.pts_offset(7), 7);
    }

    #[test]
    fn test_mpeg_time_base() {
        let timing = StreamTiming::derive(ratio(30, 1), TimeBase::MPEG, ratio(5, 4)).unwrap();
        assert_eq!(timing.output.time_base, TimeBase::new(1, 72000));
        assert_eq!(timing.ts_unit, ratio(3000, 1));

        let timing =
            StreamTiming::derive(ratio(30000, 1001), TimeBase::MPEG, ratio(5, 4)).unwrap();
        assert_eq!(timing.output.frame_rate, ratio(24000, 1001));
        assert_eq!(timing.ts_unit, ratio(3003, 1));
        assert_eq!(timing.pts_offset(2), 6006);
    }

    #[test]
    fn test_fractional_ts_unit_rounds() {
        let timing =
            StreamTiming::derive(ratio(30, 1), TimeBase::MILLISECONDS, ratio(10, 8)).unwrap();
        assert_eq!(timing.ts_unit, ratio(100, 3));
        let offsets: Vec<i64> = (0..4).map(|n| timing.pts_offset(n)).collect();
        assert_eq!(offsets, vec![0, 33, 67, 100]);
    }

    #[test]
    fn test_output_duration_matches_input() {
        // Five 1/30 s input frames span the same time as four output frames.
        let timing = StreamTiming::derive(ratio(30, 1), TimeBase::MPEG, ratio(5, 4)).unwrap();
        let out_seconds = timing.output.time_base.to_seconds(timing.pts_offset(4));
        assert!((out_seconds - 5.0 / 30.0).abs() < 1e-9);
    }

    #[test]
    fn test_invalid_rate() {
        let err = StreamTiming::derive(Rational::new(0, 1), TimeBase::MPEG, ratio(5, 4)).unwrap_err();
        assert!(matches!(err, DetelecineError::InvalidFrameRate(_)));
        assert!(err.is_config_error());

        assert!(StreamTiming::derive(ratio(-30, 1), TimeBase::MPEG, ratio(5, 4)).is_err());
        assert!(StreamTiming::derive(ratio(30, 1), TimeBase::new(0, 1), ratio(5, 4)).is_err());
    }
}
