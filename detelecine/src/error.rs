//! Error types for the detelecine filter.

use detelecine_core::PixelFormat;
use thiserror::Error;

/// Detelecine error types.
#[derive(Error, Debug)]
pub enum DetelecineError {
    /// The cadence pattern is empty.
    #[error("No pattern provided")]
    EmptyPattern,

    /// The cadence pattern contains something other than decimal digits.
    #[error("Pattern includes non-numeric character '{character}' at position {position}")]
    InvalidPatternCharacter {
        /// The offending character.
        character: char,
        /// Character index within the pattern.
        position: usize,
    },

    /// The start frame lies beyond one full cadence cycle.
    #[error("start_frame {start_frame} is too big for a pattern of {field_sum} fields")]
    StartFrameTooLarge {
        /// Requested start frame.
        start_frame: u32,
        /// Sum of the pattern's field counts.
        field_sum: u32,
    },

    /// The start frame is outside the accepted option range.
    #[error("start_frame {start_frame} out of range [0, {max}]")]
    StartFrameOutOfRange {
        /// Requested start frame.
        start_frame: u32,
        /// Largest accepted value.
        max: u32,
    },

    /// Unknown option or unparseable option value.
    #[error("Invalid option: {0}")]
    InvalidOption(String),

    /// The input frame rate is missing, zero or negative.
    #[error("Invalid frame rate: {0}")]
    InvalidFrameRate(String),

    /// Input frame dimensions differ from the configured stream.
    #[error("Frame dimensions mismatch: expected {expected_width}x{expected_height}, got {actual_width}x{actual_height}")]
    DimensionMismatch {
        /// Expected width in pixels.
        expected_width: u32,
        /// Expected height in pixels.
        expected_height: u32,
        /// Actual width in pixels.
        actual_width: u32,
        /// Actual height in pixels.
        actual_height: u32,
    },

    /// Input pixel format differs from the configured stream.
    #[error("Pixel format mismatch: expected {expected}, got {actual}")]
    FormatMismatch {
        /// Configured pixel format.
        expected: PixelFormat,
        /// Pixel format of the offending frame.
        actual: PixelFormat,
    },

    /// Buffer allocation failed.
    #[error("Buffer allocation failed: {0}")]
    AllocationFailed(String),

    /// The downstream consumer rejected a frame.
    #[error("Downstream sink error: {0}")]
    Sink(String),

    /// Core library error.
    #[error("Core error: {0}")]
    Core(#[from] detelecine_core::Error),
}

/// Result type for detelecine operations.
pub type Result<T> = std::result::Result<T, DetelecineError>;

impl DetelecineError {
    /// Create an invalid option error.
    pub fn invalid_option(msg: impl Into<String>) -> Self {
        Self::InvalidOption(msg.into())
    }

    /// Create an invalid frame rate error.
    pub fn invalid_frame_rate(msg: impl Into<String>) -> Self {
        Self::InvalidFrameRate(msg.into())
    }

    /// Create a downstream sink error.
    pub fn sink(msg: impl Into<String>) -> Self {
        Self::Sink(msg.into())
    }

    /// Check if this error is a stream setup problem.
    pub fn is_config_error(&self) -> bool {
        matches!(
            self,
            Self::EmptyPattern
                | Self::InvalidPatternCharacter { .. }
                | Self::StartFrameTooLarge { .. }
                | Self::StartFrameOutOfRange { .. }
                | Self::InvalidOption(_)
                | Self::InvalidFrameRate(_)
        )
    }

    /// Check if this error reports an exhausted buffer resource.
    pub fn is_resource_error(&self) -> bool {
        match self {
            Self::AllocationFailed(_) => true,
            Self::Core(err) => err.is_resource_error(),
            _ => false,
        }
    }
}
