//! CMX-style timecode implementation.
//!
//! This module provides the [`Timecode`] value type with:
//! - Standard frame rates (24, 25, 30 fps and fractional variants)
//! - Drop-frame aware frame number conversion
//! - Timecode arithmetic (add, subtract, compare)
//! - String parsing and formatting

use crate::dropframe::{frames_to_add, frames_to_drop, DropFrameConfig};
use crate::error::{Result, TimecodeError};
use crate::rational::Rational;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::ops::{Add, Sub};
use std::str::FromStr;

/// The delimiter rendered before the frames field of a drop-frame timecode.
pub const DROP_FRAME_DELIMITER: char = ';';

/// The delimiter rendered before the frames field of a non-drop timecode.
pub const NON_DROP_FRAME_DELIMITER: char = ':';

/// Delimiters accepted on input as drop-frame notation.
pub const VALID_DROP_FRAME_DELIMITERS: [char; 3] = [';', ',', '.'];

/// Common frame rates used in video production.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FrameRate {
    /// 24 fps (film)
    Fps24,
    /// 23.976 fps (24000/1001, NTSC film)
    Fps23_976,
    /// 25 fps (PAL)
    Fps25,
    /// 29.97 fps (30000/1001, NTSC)
    Fps29_97,
    /// 30 fps
    Fps30,
    /// 48 fps (HFR film)
    Fps48,
    /// 50 fps (PAL)
    Fps50,
    /// 59.94 fps (60000/1001, NTSC)
    Fps59_94,
    /// 60 fps
    Fps60,
    /// Custom frame rate (numerator, denominator)
    Custom {
        /// Frame rate numerator.
        numerator: u32,
        /// Frame rate denominator.
        denominator: u32,
    },
}

impl FrameRate {
    /// Get the frame rate as a rational number (numerator, denominator).
    #[must_use]
    pub fn as_rational(&self) -> (u32, u32) {
        match self {
            Self::Fps24 => (24, 1),
            Self::Fps23_976 => (24000, 1001),
            Self::Fps25 => (25, 1),
            Self::Fps29_97 => (30000, 1001),
            Self::Fps30 => (30, 1),
            Self::Fps48 => (48, 1),
            Self::Fps50 => (50, 1),
            Self::Fps59_94 => (60000, 1001),
            Self::Fps60 => (60, 1),
            Self::Custom {
                numerator,
                denominator,
            } => (*numerator, *denominator),
        }
    }

    /// Get the nominal frame rate: the fps rounded to the nearest integer,
    /// used for all timecode field math.
    #[must_use]
    pub fn nominal_fps(&self) -> u32 {
        match self {
            Self::Fps24 | Self::Fps23_976 => 24,
            Self::Fps25 => 25,
            Self::Fps29_97 | Self::Fps30 => 30,
            Self::Fps48 => 48,
            Self::Fps50 => 50,
            Self::Fps59_94 | Self::Fps60 => 60,
            Self::Custom {
                numerator,
                denominator,
            } => ((*numerator as f64) / (*denominator as f64)).round() as u32,
        }
    }

    /// Get the frame rate as a floating point value.
    #[must_use]
    pub fn as_f64(&self) -> f64 {
        let (num, den) = self.as_rational();
        num as f64 / den as f64
    }

    /// Check if this frame rate has defined drop-frame constants.
    #[must_use]
    pub fn is_drop_frame_rate(&self) -> bool {
        matches!(self, Self::Fps29_97 | Self::Fps59_94)
    }

    /// Create a custom frame rate.
    pub fn custom(numerator: u32, denominator: u32) -> Result<Self> {
        if denominator == 0 {
            return Err(TimecodeError::InvalidFrameRate {
                numerator,
                denominator,
            });
        }
        Ok(Self::Custom {
            numerator,
            denominator,
        })
    }

    /// Try to match a rational frame rate to a standard one.
    #[must_use]
    pub fn from_rational(numerator: u32, denominator: u32) -> Self {
        match (numerator, denominator) {
            (24, 1) => Self::Fps24,
            (24000, 1001) => Self::Fps23_976,
            (25, 1) => Self::Fps25,
            (30000, 1001) => Self::Fps29_97,
            (30, 1) => Self::Fps30,
            (48, 1) => Self::Fps48,
            (50, 1) => Self::Fps50,
            (60000, 1001) => Self::Fps59_94,
            (60, 1) => Self::Fps60,
            _ => Self::Custom {
                numerator,
                denominator,
            },
        }
    }
}

impl Default for FrameRate {
    fn default() -> Self {
        Self::Fps24
    }
}

impl fmt::Display for FrameRate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Fps24 => write!(f, "24"),
            Self::Fps23_976 => write!(f, "23.976"),
            Self::Fps25 => write!(f, "25"),
            Self::Fps29_97 => write!(f, "29.97"),
            Self::Fps30 => write!(f, "30"),
            Self::Fps48 => write!(f, "48"),
            Self::Fps50 => write!(f, "50"),
            Self::Fps59_94 => write!(f, "59.94"),
            Self::Fps60 => write!(f, "60"),
            Self::Custom {
                numerator,
                denominator,
            } => {
                write!(f, "{}/{}", numerator, denominator)
            }
        }
    }
}

/// Return the frame number for the given (hours, minutes, seconds, frames)
/// fields.
///
/// All math uses the nominal (integer) frame rate. With `drop_frame` set,
/// the dropped frame numbers are subtracted: `drop_per_minute *
/// (total_minutes - total_minutes / 10)`.
///
/// # Errors
///
/// Returns an unsupported-rate error if `drop_frame` is requested at a
/// frame rate without drop-frame constants.
pub fn frame_from_timecode(
    fields: (u16, u8, u8, u8),
    frame_rate: FrameRate,
    drop_frame: bool,
) -> Result<i64> {
    let (hours, minutes, seconds, frames) = fields;
    let fps_int = frame_rate.nominal_fps() as i64;
    let (h, m) = (hours as i64, minutes as i64);

    let mut frame_number = fps_int * 3600 * h + fps_int * 60 * m + fps_int * seconds as i64
        + frames as i64;

    if drop_frame {
        let config = DropFrameConfig::for_frame_rate(frame_rate).ok_or_else(|| {
            TimecodeError::unsupported_drop_frame_rate(frame_rate.to_string())
        })?;
        frame_number -= frames_to_drop(60 * h + m, &config);
    }

    Ok(frame_number)
}

/// Return the timecode string corresponding to the given frame number.
///
/// The inverse of [`frame_from_timecode`]. Drop-frame output re-inserts the
/// skipped frame numbers before splitting into fields and renders `;` before
/// the frames field; non-drop output renders `:`.
///
/// # Errors
///
/// Returns an unsupported-rate error if `drop_frame` is requested at a
/// frame rate without drop-frame constants, and an underflow error for
/// negative frame numbers.
pub fn timecode_from_frame(
    frame_number: i64,
    frame_rate: FrameRate,
    drop_frame: bool,
) -> Result<String> {
    let (hours, minutes, seconds, frames) = split_frame(frame_number, frame_rate, drop_frame)?;
    let delimiter = if drop_frame {
        DROP_FRAME_DELIMITER
    } else {
        NON_DROP_FRAME_DELIMITER
    };
    Ok(format!(
        "{hours:02}:{minutes:02}:{seconds:02}{delimiter}{frames:02}"
    ))
}

/// Split a frame number into display fields at the given rate.
fn split_frame(
    frame_number: i64,
    frame_rate: FrameRate,
    drop_frame: bool,
) -> Result<(u16, u8, u8, u8)> {
    if frame_number < 0 {
        return Err(TimecodeError::Underflow);
    }

    let mut frame_number = frame_number;
    let fps_int = if drop_frame {
        let config = DropFrameConfig::for_frame_rate(frame_rate).ok_or_else(|| {
            TimecodeError::unsupported_drop_frame_rate(frame_rate.to_string())
        })?;
        frame_number += frames_to_add(frame_number, &config);
        config.nominal_fps
    } else {
        frame_rate.nominal_fps() as i64
    };

    let hours = frame_number / (3600 * fps_int);
    if hours > 999 {
        return Err(TimecodeError::invalid_component(
            "hours",
            u32::try_from(hours).unwrap_or(u32::MAX),
            999,
        ));
    }
    let minutes = frame_number / (60 * fps_int) % 60;
    let seconds = frame_number / fps_int % 60;
    let frames = frame_number % fps_int;

    Ok((hours as u16, minutes as u8, seconds as u8, frames as u8))
}

/// A timecode point at a given frame rate and drop-frame mode.
///
/// Timecodes are immutable: arithmetic and conversions always produce a new
/// instance. Out-points in edit lists are exclusive by convention, so a one
/// frame long record is `00:00:00:01 00:00:00:02`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Timecode {
    /// Hours (0-999)
    pub hours: u16,
    /// Minutes (0-59)
    pub minutes: u8,
    /// Seconds (0-59)
    pub seconds: u8,
    /// Frames (0 to fps-1, unless source-flagged)
    pub frames: u8,
    /// Frame rate
    pub frame_rate: FrameRate,
    /// Whether this is drop-frame timecode
    pub drop_frame: bool,
    /// Source timecode flag. Source timecodes tolerate a frames field at or
    /// above the nominal rate, because transition fix-ups can temporarily
    /// overflow it before re-normalizing through [`Timecode::from_frame`].
    pub source: bool,
}

impl Timecode {
    /// Create a new non-drop timecode from field values.
    pub fn new(
        hours: u16,
        minutes: u8,
        seconds: u8,
        frames: u8,
        frame_rate: FrameRate,
    ) -> Result<Self> {
        let tc = Self {
            hours,
            minutes,
            seconds,
            frames,
            frame_rate,
            drop_frame: false,
            source: false,
        };
        tc.validate()?;
        Ok(tc)
    }

    /// Create a new drop-frame timecode from field values.
    pub fn new_drop_frame(
        hours: u16,
        minutes: u8,
        seconds: u8,
        frames: u8,
        frame_rate: FrameRate,
    ) -> Result<Self> {
        let tc = Self {
            hours,
            minutes,
            seconds,
            frames,
            frame_rate,
            drop_frame: true,
            source: false,
        };
        tc.validate()?;
        Ok(tc)
    }

    /// Parse a timecode string at the given frame rate.
    ///
    /// With `drop_frame` unset, drop-frame mode is detected from the
    /// delimiter before the frames field. See
    /// [`Timecode::reconcile_drop_frame`] for how an explicit setting
    /// interacts with the notation.
    pub fn parse(text: &str, frame_rate: FrameRate, drop_frame: Option<bool>) -> Result<Self> {
        Self::parse_inner(text, frame_rate, drop_frame, false)
    }

    /// Parse a source timecode string at the given frame rate.
    ///
    /// Identical to [`Timecode::parse`] except that the frames field may
    /// equal or exceed the nominal rate.
    pub fn parse_source(
        text: &str,
        frame_rate: FrameRate,
        drop_frame: Option<bool>,
    ) -> Result<Self> {
        Self::parse_inner(text, frame_rate, drop_frame, true)
    }

    fn parse_inner(
        text: &str,
        frame_rate: FrameRate,
        drop_frame: Option<bool>,
        source: bool,
    ) -> Result<Self> {
        let (hours, minutes, seconds, frames) = Self::parse_components(text)?;
        let drop_frame = Self::reconcile_drop_frame(text, drop_frame)?;
        let tc = Self {
            hours,
            minutes,
            seconds,
            frames,
            frame_rate,
            drop_frame,
            source,
        };
        tc.validate()?;
        Ok(tc)
    }

    /// Parse a timecode string into (hours, minutes, seconds, frames).
    ///
    /// The four numeric groups are 2-3/2/2/2 digits wide and may be
    /// separated by any single non-alphanumeric delimiter, so all of these
    /// parse:
    ///
    /// ```text
    /// 00:12:34:21   non-drop
    /// 00:12:34.21   drop
    /// 00:12:34;21   drop
    /// 00;12;34;21   drop
    /// ```
    pub fn parse_components(text: &str) -> Result<(u16, u8, u8, u8)> {
        let invalid = || {
            TimecodeError::invalid_format(format!(
                "timecode \"{text}\" is not in a valid format (eg. hh:mm:ss:ff or hh:mm:ss;ff)"
            ))
        };

        let mut groups: Vec<&str> = Vec::with_capacity(4);
        let mut start = 0;
        for (i, c) in text.char_indices() {
            if !c.is_alphanumeric() {
                groups.push(&text[start..i]);
                start = i + c.len_utf8();
            }
        }
        groups.push(&text[start..]);

        let digits = |group: &str, min: usize, max: usize| {
            group.len() >= min && group.len() <= max && group.bytes().all(|b| b.is_ascii_digit())
        };
        if groups.len() != 4
            || !digits(groups[0], 2, 3)
            || !digits(groups[1], 2, 2)
            || !digits(groups[2], 2, 2)
            || !digits(groups[3], 2, 2)
        {
            return Err(invalid());
        }

        Ok((
            groups[0].parse().map_err(|_| invalid())?,
            groups[1].parse().map_err(|_| invalid())?,
            groups[2].parse().map_err(|_| invalid())?,
            groups[3].parse().map_err(|_| invalid())?,
        ))
    }

    /// Determine whether a timecode string uses drop-frame notation.
    ///
    /// Only the delimiter immediately before the trailing two-digit frames
    /// field is inspected: `;`, `,` and `.` mean drop-frame, `:` means
    /// non-drop.
    pub fn detect_drop_frame(text: &str) -> Result<bool> {
        let chars: Vec<char> = text.chars().collect();
        if chars.len() >= 3
            && chars[chars.len() - 1].is_ascii_digit()
            && chars[chars.len() - 2].is_ascii_digit()
        {
            let delimiter = chars[chars.len() - 3];
            if VALID_DROP_FRAME_DELIMITERS.contains(&delimiter) {
                return Ok(true);
            }
            if delimiter == NON_DROP_FRAME_DELIMITER {
                return Ok(false);
            }
        }
        Err(TimecodeError::invalid_format(format!(
            "timecode \"{text}\" has no valid frame delimiter; the frames field must be \
             preceded by one of \":\", \";\", \",\" or \".\""
        )))
    }

    /// Reconcile a caller's explicit drop-frame setting with the notation
    /// found in the timecode string.
    ///
    /// With `requested` unset the detected value wins. An explicit `false`
    /// against drop notation is a conflict and fails; an explicit `true`
    /// against non-drop notation is accepted (the caller may know better
    /// than the delimiter).
    pub fn reconcile_drop_frame(text: &str, requested: Option<bool>) -> Result<bool> {
        let detected = Self::detect_drop_frame(text)?;
        match requested {
            None => Ok(detected),
            Some(false) if detected => Err(TimecodeError::conflicting_drop_frame(text)),
            Some(requested) => Ok(requested),
        }
    }

    /// Create a timecode from a frame number.
    pub fn from_frame(frame: i64, frame_rate: FrameRate, drop_frame: bool) -> Result<Self> {
        let (hours, minutes, seconds, frames) = split_frame(frame, frame_rate, drop_frame)?;
        Ok(Self {
            hours,
            minutes,
            seconds,
            frames,
            frame_rate,
            drop_frame,
            source: false,
        })
    }

    /// Convert this timecode to a frame number.
    #[must_use]
    pub fn to_frame(&self) -> i64 {
        let fps_int = self.frame_rate.nominal_fps() as i64;
        let (h, m) = (self.hours as i64, self.minutes as i64);
        let mut frame = fps_int * 3600 * h + fps_int * 60 * m + fps_int * self.seconds as i64
            + self.frames as i64;
        if self.drop_frame {
            // Construction guarantees the rate has drop-frame constants.
            if let Some(config) = DropFrameConfig::for_frame_rate(self.frame_rate) {
                frame -= frames_to_drop(60 * h + m, &config);
            }
        }
        frame
    }

    /// Convert this timecode to seconds as an exact rational.
    ///
    /// Frame/timecode math is integer math, but seconds at a fractional
    /// rate are not: chaining float conversions would eventually drift
    /// across a frame boundary, so the division stays exact.
    #[must_use]
    pub fn to_seconds(&self) -> Rational {
        let (num, den) = self.frame_rate.as_rational();
        Rational::new(self.to_frame() * den as i64, num as i64)
    }

    /// Validate the timecode field values.
    pub fn validate(&self) -> Result<()> {
        if self.hours > 999 {
            return Err(TimecodeError::invalid_component(
                "hours",
                self.hours as u32,
                999,
            ));
        }
        if self.minutes > 59 {
            return Err(TimecodeError::invalid_component(
                "minutes",
                self.minutes as u32,
                59,
            ));
        }
        if self.seconds > 59 {
            return Err(TimecodeError::invalid_component(
                "seconds",
                self.seconds as u32,
                59,
            ));
        }
        if self.drop_frame && !self.frame_rate.is_drop_frame_rate() {
            return Err(TimecodeError::unsupported_drop_frame_rate(
                self.frame_rate.to_string(),
            ));
        }
        if !self.source && self.frames as u32 >= self.frame_rate.nominal_fps() {
            return Err(TimecodeError::frame_out_of_range(
                self.frames as u32,
                self.frame_rate.nominal_fps(),
            ));
        }
        Ok(())
    }

    /// Get the delimiter rendered before the frames field.
    #[must_use]
    pub fn delimiter(&self) -> char {
        if self.drop_frame {
            DROP_FRAME_DELIMITER
        } else {
            NON_DROP_FRAME_DELIMITER
        }
    }
}

impl Default for Timecode {
    fn default() -> Self {
        Self {
            hours: 0,
            minutes: 0,
            seconds: 0,
            frames: 0,
            frame_rate: FrameRate::Fps24,
            drop_frame: false,
            source: false,
        }
    }
}

impl fmt::Display for Timecode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:02}:{:02}:{:02}{}{:02}",
            self.hours,
            self.minutes,
            self.seconds,
            self.delimiter(),
            self.frames
        )
    }
}

impl FromStr for Timecode {
    type Err = TimecodeError;

    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        // Without an explicit rate, drop notation implies NTSC 29.97 and
        // anything else defaults to 24 fps.
        let frame_rate = if Self::detect_drop_frame(s)? {
            FrameRate::Fps29_97
        } else {
            FrameRate::Fps24
        };
        Self::parse(s, frame_rate, None)
    }
}

impl PartialEq for Timecode {
    fn eq(&self, other: &Self) -> bool {
        if self.frame_rate == other.frame_rate && self.drop_frame == other.drop_frame {
            self.hours == other.hours
                && self.minutes == other.minutes
                && self.seconds == other.seconds
                && self.frames == other.frames
        } else {
            // Compare by exact time value for different rates.
            self.to_seconds() == other.to_seconds()
        }
    }
}

impl Eq for Timecode {}

impl PartialOrd for Timecode {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Timecode {
    fn cmp(&self, other: &Self) -> Ordering {
        if self.frame_rate == other.frame_rate && self.drop_frame == other.drop_frame {
            self.to_frame().cmp(&other.to_frame())
        } else {
            self.to_seconds().cmp(&other.to_seconds())
        }
    }
}

impl Add for Timecode {
    type Output = Result<Self>;

    fn add(self, right: Self) -> Result<Self> {
        Self::from_frame(
            self.to_frame() + right.to_frame(),
            self.frame_rate,
            self.drop_frame,
        )
    }
}

impl Add<i64> for Timecode {
    type Output = Result<Self>;

    fn add(self, frames: i64) -> Result<Self> {
        Self::from_frame(self.to_frame() + frames, self.frame_rate, self.drop_frame)
    }
}

impl Sub for Timecode {
    type Output = Result<Self>;

    fn sub(self, right: Self) -> Result<Self> {
        Self::from_frame(
            self.to_frame() - right.to_frame(),
            self.frame_rate,
            self.drop_frame,
        )
    }
}

impl Sub<i64> for Timecode {
    type Output = Result<Self>;

    fn sub(self, frames: i64) -> Result<Self> {
        Self::from_frame(self.to_frame() - frames, self.frame_rate, self.drop_frame)
    }
}
