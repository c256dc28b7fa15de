//! Filter configuration.
//!
//! Options can be built in code, deserialized with `serde`, or parsed from a
//! filter option string in the usual `key=value:key=value` form:
//!
//! ```text
//! detelecine=first_field=bottom:pattern=2332:start_frame=1
//! detelecine=t:23
//! ```

use crate::cadence::Cadence;
use crate::error::{DetelecineError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Largest accepted `start_frame` option value.
pub const MAX_START_FRAME: u32 = 13;

/// Default cadence pattern (3:2 pulldown).
pub const DEFAULT_PATTERN: &str = "23";

/// Filter name accepted as a prefix of option strings.
const FILTER_NAME: &str = "detelecine";

/// Option names in positional order.
const OPTION_NAMES: [&str; 3] = ["first_field", "pattern", "start_frame"];

/// Which field of an input frame is temporally first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FirstField {
    /// Even rows (0, 2, 4, ...) are the first field.
    #[default]
    Top,
    /// Odd rows (1, 3, 5, ...) are the first field.
    Bottom,
}

impl FirstField {
    /// Index of the first row belonging to this field.
    pub fn row_offset(self) -> usize {
        match self {
            Self::Top => 0,
            Self::Bottom => 1,
        }
    }

    /// The other field.
    pub fn opposite(self) -> Self {
        match self {
            Self::Top => Self::Bottom,
            Self::Bottom => Self::Top,
        }
    }
}

impl fmt::Display for FirstField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Top => write!(f, "top"),
            Self::Bottom => write!(f, "bottom"),
        }
    }
}

impl FromStr for FirstField {
    type Err = DetelecineError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "top" | "t" | "0" => Ok(Self::Top),
            "bottom" | "b" | "1" => Ok(Self::Bottom),
            other => Err(DetelecineError::invalid_option(format!(
                "unknown first_field '{}', expected top or bottom",
                other
            ))),
        }
    }
}

/// Detelecine filter options.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetelecineConfig {
    /// Field parity taken from the newest frame when two frames are woven.
    pub first_field: FirstField,
    /// Cadence pattern: one digit per original frame giving its field count.
    pub pattern: String,
    /// Number of input frames the stream is cut into the pattern.
    pub start_frame: u32,
}

impl Default for DetelecineConfig {
    fn default() -> Self {
        Self {
            first_field: FirstField::Top,
            pattern: DEFAULT_PATTERN.to_string(),
            start_frame: 0,
        }
    }
}

impl DetelecineConfig {
    /// Create a configuration with the default 3:2 cadence.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the first field.
    pub fn with_first_field(mut self, first_field: FirstField) -> Self {
        self.first_field = first_field;
        self
    }

    /// Set the cadence pattern.
    pub fn with_pattern(mut self, pattern: impl Into<String>) -> Self {
        self.pattern = pattern.into();
        self
    }

    /// Set the start frame.
    pub fn with_start_frame(mut self, start_frame: u32) -> Self {
        self.start_frame = start_frame;
        self
    }

    /// Validate the options and build the cadence they describe.
    pub fn cadence(&self) -> Result<Cadence> {
        if self.start_frame > MAX_START_FRAME {
            return Err(DetelecineError::StartFrameOutOfRange {
                start_frame: self.start_frame,
                max: MAX_START_FRAME,
            });
        }
        Cadence::parse(&self.pattern, self.start_frame)
    }

    /// Validate the options.
    pub fn validate(&self) -> Result<()> {
        self.cadence().map(|_| ())
    }

    fn set_option(&mut self, key: &str, value: &str) -> Result<()> {
        match key {
            "first_field" => self.first_field = value.parse()?,
            "pattern" => self.pattern = value.to_string(),
            "start_frame" => {
                let start_frame: i64 = value.trim().parse().map_err(|_| {
                    DetelecineError::invalid_option(format!(
                        "start_frame '{}' is not an integer",
                        value
                    ))
                })?;
                self.start_frame = u32::try_from(start_frame)
                    .ok()
                    .filter(|&v| v <= MAX_START_FRAME)
                    .ok_or(DetelecineError::StartFrameOutOfRange {
                        start_frame: start_frame.clamp(0, u32::MAX as i64) as u32,
                        max: MAX_START_FRAME,
                    })?;
            }
            other => {
                return Err(DetelecineError::invalid_option(format!(
                    "unknown option '{}'",
                    other
                )))
            }
        }
        Ok(())
    }
}

impl FromStr for DetelecineConfig {
    type Err = DetelecineError;

    /// Parse a filter option string.
    ///
    /// Positional values are assigned in the order `first_field`, `pattern`,
    /// `start_frame` and are only accepted before the first named option.
    /// The string is validated after parsing.
    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        let s = match s.split_once('=') {
            Some((name, rest)) if name.trim() == FILTER_NAME => rest,
            _ if s == FILTER_NAME => "",
            _ => s,
        };

        let mut config = Self::default();
        let mut positional = OPTION_NAMES.iter();
        let mut named_seen = false;

        for part in s.split(':').filter(|p| !p.trim().is_empty()) {
            match part.split_once('=') {
                Some((key, value)) => {
                    named_seen = true;
                    config.set_option(key.trim(), value)?;
                }
                None if named_seen => {
                    return Err(DetelecineError::invalid_option(format!(
                        "positional value '{}' after named option",
                        part
                    )))
                }
                None => {
                    let key = positional.next().ok_or_else(|| {
                        DetelecineError::invalid_option(format!(
                            "too many positional values at '{}'",
                            part
                        ))
                    })?;
                    config.set_option(key, part)?;
                }
            }
        }

        config.validate()?;
        Ok(config)
    }
}

impl fmt::Display for DetelecineConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "first_field={}:pattern={}:start_frame={}",
            self.first_field, self.pattern, self.start_frame
        )
    }
}
