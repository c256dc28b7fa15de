//! Property-based tests for cadence handling and field reassembly.
//!
//! Inputs are numbered frames filled with their number, so each output row
//! tells which input it came from.

use detelecine::{Cadence, Detelecine, DetelecineConfig, FirstField, StreamInfo};
use detelecine_core::{Frame, PixelFormat, Rational, TimeBase, Timestamp};
use proptest::prelude::*;

const WIDTH: u32 = 4;
const HEIGHT: u32 = 6;

fn stream() -> StreamInfo {
    StreamInfo::new(
        WIDTH,
        HEIGHT,
        PixelFormat::Gray8,
        Rational::new(30, 1),
        TimeBase::new(1, 30),
    )
}

/// Byte value identifying 0-based input `index`.
fn tag(index: usize) -> u8 {
    (index % 251) as u8 + 1
}

fn input_frame(index: usize) -> Frame {
    let mut frame = Frame::new(WIDTH, HEIGHT, PixelFormat::Gray8, TimeBase::new(1, 30));
    frame.buffer_mut().fill(tag(index));
    frame.pts = Timestamp::new(index as i64, TimeBase::new(1, 30));
    frame
}

fn rows(frame: &Frame) -> Vec<u8> {
    (0..HEIGHT as usize)
        .map(|r| frame.buffer().row(0, r).unwrap()[0])
        .collect()
}

fn pattern_string(digits: &[u8]) -> String {
    digits.iter().map(|d| char::from(b'0' + d)).collect()
}

/// Expected outputs for a cadence of digits >= 2 after `inputs` frames,
/// top field first, start frame 0.
///
/// Slot `j` starts at field `S_j`. It is complete once the frame holding its
/// second field has arrived. An even start is a whole input frame; an odd
/// start weaves the even rows of the later frame with the odd rows of the
/// earlier one.
fn expected_outputs(digits: &[u8], inputs: usize) -> Vec<Vec<u8>> {
    let last_field = 2 * inputs - 2;
    let mut expected = Vec::new();
    let mut start = 0usize;
    for slot in 0.. {
        if start > last_field {
            break;
        }
        let frame = if start % 2 == 0 {
            vec![tag(start / 2); HEIGHT as usize]
        } else {
            let (new, held) = (tag((start + 1) / 2), tag((start - 1) / 2));
            (0..HEIGHT as usize)
                .map(|r| if r % 2 == 0 { new } else { held })
                .collect()
        };
        expected.push(frame);
        start += digits[slot % digits.len()] as usize;
    }
    expected
}

/// Straight-line model of the reassembly procedure over row tags.
///
/// The start walk is a single pass, so callers keep `2 × start < sum`.
struct Reference {
    digits: Vec<u32>,
    position: usize,
    init_len: u32,
    skip: u32,
    held: Option<Vec<u8>>,
    parity: usize,
}

impl Reference {
    fn new(digits: &[u8], start: u32, parity: usize) -> Self {
        let digits: Vec<u32> = digits.iter().map(|&d| d as u32).collect();
        let mut position = 0;
        let mut init_len = 0;
        if start > 0 {
            let mut nfields = 0;
            for &d in &digits {
                nfields += d;
                position += 1;
                if nfields >= 2 * start {
                    init_len = nfields - 2 * start;
                    break;
                }
            }
        }
        Self {
            digits,
            position,
            init_len,
            skip: 0,
            held: None,
            parity,
        }
    }

    fn scan(&mut self, mut len: u32) -> u32 {
        while len == 0 && self.position < self.digits.len() {
            len = self.digits[self.position];
            self.position += 1;
        }
        if self.position >= self.digits.len() {
            self.position = 0;
        }
        len
    }

    fn step(&mut self, input: Vec<u8>) -> Vec<Vec<u8>> {
        if self.skip >= 2 {
            self.skip -= 2;
            return Vec::new();
        }
        if self.skip == 1 {
            self.held = Some(input);
            self.skip = 0;
            return Vec::new();
        }

        let carry = std::mem::take(&mut self.init_len);
        let mut len = self.scan(carry);
        if len == 0 {
            return Vec::new();
        }

        let mut out = Vec::new();
        if len == 1 {
            if let Some(held) = self.held.take() {
                out.push(held);
                len = self.scan(0);
            }
        }

        if let Some(held) = self.held.take() {
            let woven: Vec<u8> = (0..input.len())
                .map(|r| if r % 2 == self.parity { input[r] } else { held[r] })
                .collect();
            out.push(woven);
            if len <= 2 {
                self.held = Some(input);
            }
            len = len.saturating_sub(3);
        } else if len >= 2 {
            out.push(input);
            len -= 2;
        } else if len == 1 {
            out.push(input.clone());
            self.held = Some(input);
            len = 0;
        }

        if len == 1 && self.held.is_some() {
            len = 0;
            self.held = None;
        }
        self.skip = len;
        out
    }
}

fn cadence_digits() -> impl Strategy<Value = Vec<u8>> {
    prop::collection::vec(2u8..=9, 1..6)
}

fn any_pattern() -> impl Strategy<Value = Vec<u8>> {
    prop::collection::vec(0u8..=9, 1..8).prop_filter("needs at least one field", |d| {
        d.iter().any(|&x| x > 0)
    })
}

// =============================================================================
// Cadence parsing
// =============================================================================

proptest! {
    /// Parsing is a pure function of its inputs.
    #[test]
    fn parse_is_deterministic(digits in any_pattern(), start in 0u32..14) {
        let pattern = pattern_string(&digits);
        let sum: u32 = digits.iter().map(|&d| d as u32).sum();
        prop_assume!(start < sum);

        let a = Cadence::parse(&pattern, start).unwrap();
        let b = Cadence::parse(&pattern, start).unwrap();
        prop_assert_eq!(&a, &b);
        prop_assert_eq!(a.ratio().num, sum as i64);
        prop_assert_eq!(a.ratio().den, 2 * digits.len() as i64);
        prop_assert!(a.position() < digits.len());
    }

    /// Any non-digit character is rejected with its position.
    #[test]
    fn parse_rejects_non_digits(prefix in "[0-9]{0,5}", bad in "[^0-9]", suffix in "[0-9]{0,5}") {
        let pattern = format!("{}{}{}", prefix, bad, suffix);
        let is_invalid_char = matches!(
            Cadence::parse(&pattern, 0),
            Err(detelecine::DetelecineError::InvalidPatternCharacter { position, .. })
                if position == prefix.len()
        );
        prop_assert!(is_invalid_char);
    }

    /// One cycle of `next_len` returns each nonzero digit once, in order.
    #[test]
    fn next_len_visits_every_slot(digits in cadence_digits()) {
        let mut cadence = Cadence::parse(&pattern_string(&digits), 0).unwrap();
        let lens: Vec<u32> = (0..digits.len() * 2).map(|_| cadence.next_len()).collect();
        let expected: Vec<u32> = digits.iter().chain(digits.iter()).map(|&d| d as u32).collect();
        prop_assert_eq!(lens, expected);
    }
}

// =============================================================================
// Reassembly
// =============================================================================

proptest! {
    /// Output count and row provenance follow the cadence's field layout.
    #[test]
    fn outputs_follow_field_layout(digits in cadence_digits(), inputs in 1usize..40) {
        let config = DetelecineConfig::new().with_pattern(pattern_string(&digits));
        let mut filter = Detelecine::with_frame_pool(config, stream()).unwrap();

        let mut output: Vec<Frame> = Vec::new();
        for index in 0..inputs {
            filter.process(&input_frame(index), &mut output).unwrap();
        }

        let actual: Vec<Vec<u8>> = output.iter().map(rows).collect();
        prop_assert_eq!(actual, expected_outputs(&digits, inputs));
    }

    /// Patterns with zero and one digits route rows like the model.
    #[test]
    fn matches_reference_model(
        digits in any_pattern(),
        start_seed in 0u32..14,
        bottom in any::<bool>(),
        inputs in 1usize..60,
    ) {
        let sum: u32 = digits.iter().map(|&d| d as u32).sum();
        let start = start_seed % ((sum + 1) / 2).min(14);
        let first_field = if bottom { FirstField::Bottom } else { FirstField::Top };
        let config = DetelecineConfig::new()
            .with_pattern(pattern_string(&digits))
            .with_start_frame(start)
            .with_first_field(first_field);
        let mut filter = Detelecine::with_frame_pool(config, stream()).unwrap();
        let mut model = Reference::new(&digits, start, first_field.row_offset());

        for index in 0..inputs {
            let frame = input_frame(index);
            let actual: Vec<Vec<u8>> = filter
                .process_to_vec(&frame)
                .unwrap()
                .iter()
                .map(rows)
                .collect();
            let expected = model.step(rows(&frame));
            prop_assert_eq!(actual, expected, "input {}", index);
        }
    }

    /// No input produces more than two outputs, whatever the cadence.
    #[test]
    fn at_most_two_outputs_per_input(
        digits in any_pattern(),
        start in 0u32..14,
        bottom in any::<bool>(),
        inputs in 1usize..60,
    ) {
        let sum: u32 = digits.iter().map(|&d| d as u32).sum();
        let first_field = if bottom { FirstField::Bottom } else { FirstField::Top };
        let config = DetelecineConfig::new()
            .with_pattern(pattern_string(&digits))
            .with_start_frame(start % sum.min(14))
            .with_first_field(first_field);
        let mut filter = Detelecine::with_frame_pool(config, stream()).unwrap();

        for index in 0..inputs {
            let produced = filter.process_to_vec(&input_frame(index)).unwrap();
            prop_assert!(produced.len() <= 2);
        }
        let stats = filter.stats();
        prop_assert_eq!(stats.frames_in, inputs as u64);
        prop_assert!(stats.frames_out <= 2 * inputs as u64);
    }

    /// Output timestamps never go backwards for constant-rate input.
    #[test]
    fn timestamps_are_monotonic(digits in any_pattern(), inputs in 1usize..60, base in 0i64..100_000) {
        let config = DetelecineConfig::new().with_pattern(pattern_string(&digits));
        let info = StreamInfo::new(
            WIDTH,
            HEIGHT,
            PixelFormat::Gray8,
            Rational::new(30000, 1001),
            TimeBase::MPEG,
        );
        let mut filter = Detelecine::with_frame_pool(config, info).unwrap();

        let mut output: Vec<Frame> = Vec::new();
        for index in 0..inputs {
            let mut frame = input_frame(index);
            frame.pts = Timestamp::new(base + index as i64 * 3003, TimeBase::MPEG);
            filter.process(&frame, &mut output).unwrap();
        }

        for pair in output.windows(2) {
            prop_assert!(pair[0].pts.value <= pair[1].pts.value);
        }
        if let Some(first) = output.first() {
            prop_assert_eq!(first.pts.value, base);
        }
    }

    /// Resetting replays the same outputs.
    #[test]
    fn reset_replays(digits in any_pattern(), inputs in 1usize..30) {
        let config = DetelecineConfig::new().with_pattern(pattern_string(&digits));
        let mut filter = Detelecine::with_frame_pool(config, stream()).unwrap();

        let run = |filter: &mut Detelecine| -> Vec<Vec<u8>> {
            (0..inputs)
                .flat_map(|i| filter.process_to_vec(&input_frame(i)).unwrap())
                .map(|f| rows(&f))
                .collect()
        };
        let first = run(&mut filter);
        filter.reset();
        let second = run(&mut filter);
        prop_assert_eq!(first, second);
    }
}
