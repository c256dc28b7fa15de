//! Cadence model.
//!
//! A telecine cadence is written as a string of digits, each digit giving the
//! number of fields one original progressive frame occupies in the
//! transmitted stream. `"23"` is classic 3:2 pulldown: frame A is shown for
//! two fields, frame B for three, and the pattern repeats.
//!
//! The cadence also yields the timing ratio `sum / (2 × digits)`: the number
//! of transmitted frames per reconstructed frame.

use crate::error::{DetelecineError, Result};
use detelecine_core::Rational;
use std::fmt;

/// A parsed telecine cadence with its read position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cadence {
    /// Field count per original frame.
    fields: Vec<u8>,
    /// Index of the next digit to read.
    position: usize,
    /// Stray fields left over from a mid-pattern cut, consumed once.
    init_len: u32,
    /// Position and carry right after parsing, restored by `reset`.
    initial_position: usize,
    initial_init_len: u32,
    /// Telecined frames per detelecined frame, never reduced.
    ratio: Rational,
    start_frame: u32,
}

impl Cadence {
    /// Parse a cadence pattern, positioning it `start_frame` input frames in.
    pub fn parse(pattern: &str, start_frame: u32) -> Result<Self> {
        if pattern.is_empty() {
            return Err(DetelecineError::EmptyPattern);
        }

        let fields = pattern
            .chars()
            .enumerate()
            .map(|(position, character)| match character {
                '0'..='9' => Ok(character as u8 - b'0'),
                _ => Err(DetelecineError::InvalidPatternCharacter {
                    character,
                    position,
                }),
            })
            .collect::<Result<Vec<u8>>>()?;

        let field_sum: u32 = fields.iter().map(|&f| f as u32).sum();
        if start_frame >= field_sum {
            return Err(DetelecineError::StartFrameTooLarge {
                start_frame,
                field_sum,
            });
        }

        let ratio = Rational::new(field_sum as i64, 2 * fields.len() as i64);
        let (position, init_len) = Self::seek(&fields, start_frame);

        Ok(Self {
            fields,
            position,
            init_len,
            initial_position: position,
            initial_init_len: init_len,
            ratio,
            start_frame,
        })
    }

    /// Find the read position and stray field count for a stream whose first
    /// frame is `start_frame` frames into the pattern.
    fn seek(fields: &[u8], start_frame: u32) -> (usize, u32) {
        if start_frame == 0 {
            return (0, 0);
        }

        let target = 2 * start_frame;
        let mut nfields = 0u32;
        let mut position = 0usize;
        loop {
            nfields += fields[position] as u32;
            position += 1;
            if nfields >= target {
                break;
            }
            if position == fields.len() {
                position = 0;
            }
        }

        if position == fields.len() {
            position = 0;
        }
        (position, nfields - target)
    }

    /// Read the field count of the next cadence slot.
    ///
    /// Zero digits are skipped. The scan stops at the end of the pattern and
    /// rewinds to the first digit, so a pattern that ends in zeros yields 0
    /// once per cycle.
    pub fn next_len(&mut self) -> u32 {
        let mut len = 0;
        while len == 0 && self.position < self.fields.len() {
            len = self.fields[self.position] as u32;
            self.position += 1;
        }
        if self.position >= self.fields.len() {
            self.position = 0;
        }
        len
    }

    /// Take the stray field count from a mid-pattern start. Returns 0 after
    /// the first call.
    pub fn take_init_len(&mut self) -> u32 {
        std::mem::take(&mut self.init_len)
    }

    /// Restore the position and stray field count the cadence was parsed with.
    pub fn reset(&mut self) {
        self.position = self.initial_position;
        self.init_len = self.initial_init_len;
    }

    /// The field count of every slot, in order.
    pub fn fields(&self) -> &[u8] {
        &self.fields
    }

    /// Number of slots in one cycle.
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Always false; parsing rejects empty patterns.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Index of the next slot to be read.
    pub fn position(&self) -> usize {
        self.position
    }

    /// Stray fields still pending from a mid-pattern start.
    pub fn init_len(&self) -> u32 {
        self.init_len
    }

    /// The configured start frame.
    pub fn start_frame(&self) -> u32 {
        self.start_frame
    }

    /// Total fields in one cycle.
    pub fn field_sum(&self) -> u32 {
        self.ratio.num as u32
    }

    /// Telecined frames per detelecined frame: `field_sum / (2 × len)`.
    pub fn ratio(&self) -> Rational {
        self.ratio
    }

    /// Upper bound on input frames folded into one output frame.
    pub fn max_frames_removed(&self) -> u32 {
        let max = self.fields.iter().copied().max().unwrap_or(0) as u32;
        (max + 1) / 2
    }
}

impl fmt::Display for Cadence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for &digit in &self.fields {
            write!(f, "{}", digit)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_default_pattern() {
        let cadence = Cadence::parse("23", 0).unwrap();
        assert_eq!(cadence.fields(), &[2, 3]);
        assert_eq!(cadence.position(), 0);
        assert_eq!(cadence.init_len(), 0);
        assert_eq!(cadence.field_sum(), 5);
        assert_eq!(cadence.max_frames_removed(), 2);
        assert_eq!(cadence.to_string(), "23");
    }

    #[test]
    fn test_ratio_is_not_reduced() {
        let cadence = Cadence::parse("2332", 0).unwrap();
        let ratio = cadence.ratio();
        assert_eq!((ratio.num, ratio.den), (10, 8));

        let ratio = Cadence::parse("22", 0).unwrap().ratio();
        assert_eq!((ratio.num, ratio.den), (4, 4));
    }

    #[test]
    fn test_parse_errors() {
        assert!(matches!(
            Cadence::parse("", 0),
            Err(DetelecineError::EmptyPattern)
        ));
        assert!(matches!(
            Cadence::parse("2a3", 0),
            Err(DetelecineError::InvalidPatternCharacter {
                character: 'a',
                position: 1
            })
        ));
        assert!(matches!(
            Cadence::parse("2 3", 0),
            Err(DetelecineError::InvalidPatternCharacter { character: ' ', .. })
        ));
        assert!(matches!(
            Cadence::parse("23", 5),
            Err(DetelecineError::StartFrameTooLarge {
                start_frame: 5,
                field_sum: 5
            })
        ));
        // An all-zero pattern has no fields, so no start frame fits.
        assert!(matches!(
            Cadence::parse("00", 0),
            Err(DetelecineError::StartFrameTooLarge { .. })
        ));
    }

    #[test]
    fn test_next_len_cycles() {
        let mut cadence = Cadence::parse("23", 0).unwrap();
        let lens: Vec<u32> = (0..6).map(|_| cadence.next_len()).collect();
        assert_eq!(lens, vec![2, 3, 2, 3, 2, 3]);
        assert_eq!(cadence.position(), 0);
    }

    #[test]
    fn test_next_len_skips_inner_zeros() {
        let mut cadence = Cadence::parse("2032", 0).unwrap();
        let lens: Vec<u32> = (0..6).map(|_| cadence.next_len()).collect();
        assert_eq!(lens, vec![2, 3, 2, 2, 3, 2]);
    }

    #[test]
    fn test_next_len_trailing_zeros_yield_nothing() {
        let mut cadence = Cadence::parse("300", 0).unwrap();
        let lens: Vec<u32> = (0..4).map(|_| cadence.next_len()).collect();
        assert_eq!(lens, vec![3, 0, 3, 0]);
    }

    #[test]
    fn test_start_frame_on_digit_boundary() {
        let cadence = Cadence::parse("23", 1).unwrap();
        assert_eq!(cadence.position(), 1);
        assert_eq!(cadence.init_len(), 0);
    }

    #[test]
    fn test_start_frame_mid_digit() {
        // Fields: A A B B B; two frames in, one B field remains.
        let mut cadence = Cadence::parse("23", 2).unwrap();
        assert_eq!(cadence.position(), 0);
        assert_eq!(cadence.init_len(), 1);
        assert_eq!(cadence.take_init_len(), 1);
        assert_eq!(cadence.take_init_len(), 0);
        assert_eq!(cadence.next_len(), 2);
    }

    #[test]
    fn test_start_frame_wraps_pattern() {
        // 2 * 4 = 8 fields into "23" (5 fields per cycle): A A B B B | A A B.
        let cadence = Cadence::parse("23", 4).unwrap();
        assert_eq!(cadence.position(), 0);
        assert_eq!(cadence.init_len(), 2);
    }

    #[test]
    fn test_reset_restores_phase() {
        let mut cadence = Cadence::parse("2332", 3).unwrap();
        let fresh = cadence.clone();
        cadence.take_init_len();
        cadence.next_len();
        cadence.next_len();
        assert_ne!(cadence, fresh);

        cadence.reset();
        assert_eq!(cadence, fresh);
    }

    #[test]
    fn test_parse_is_deterministic() {
        for start in 0..5 {
            assert_eq!(
                Cadence::parse("2332", start).unwrap(),
                Cadence::parse("2332", start).unwrap()
            );
        }
    }
}
