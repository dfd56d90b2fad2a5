//! Timecode engine for edlkit.
//!
//! This crate provides the frame-accurate timecode arithmetic that EDL
//! interpretation depends on:
//!
//! - **Timecode**: HH:MM:SS:FF points at any common production frame rate
//! - **Drop-Frame Timecode**: exact compensation math for 29.97/59.94 fps
//! - **Frame conversion**: timecode strings to absolute frame numbers and back
//! - **Exact seconds**: rational (not floating point) seconds conversion
//!
//! # Quick Start
//!
//! ```rust
//! use edlkit_timecode::{FrameRate, Timecode};
//!
//! // Parse a timecode at a given rate
//! let tc = Timecode::parse("01:30:45:12", FrameRate::Fps24, None).unwrap();
//! assert_eq!(tc.to_string(), "01:30:45:12");
//!
//! // Convert to a frame number and back
//! let frame = tc.to_frame();
//! let back = Timecode::from_frame(frame, FrameRate::Fps24, false).unwrap();
//! assert_eq!(tc, back);
//!
//! // Timecode arithmetic
//! let later = (tc + 100).unwrap();
//! assert_eq!(later.to_frame(), frame + 100);
//! ```
//!
//! # Drop-Frame Timecode
//!
//! For 29.97 fps content, drop-frame timecode keeps displayed time close to
//! wall-clock time by skipping frame numbers at minute boundaries (note the
//! semicolon delimiter):
//!
//! ```rust
//! use edlkit_timecode::{timecode_from_frame, FrameRate, Timecode};
//!
//! let tc = Timecode::parse("00:01:00;02", FrameRate::Fps29_97, None).unwrap();
//! assert!(tc.drop_frame);
//! assert_eq!(tc.to_frame(), 1800);
//!
//! assert_eq!(
//!     timecode_from_frame(1800, FrameRate::Fps29_97, true).unwrap(),
//!     "00:01:00;02"
//! );
//! ```

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![warn(clippy::all)]

pub mod dropframe;
pub mod error;
pub mod rational;
pub mod timecode;

// Re-export main types
pub use dropframe::DropFrameConfig;
pub use error::{Result, TimecodeError};
pub use rational::Rational;
pub use timecode::{
    frame_from_timecode, timecode_from_frame, FrameRate, Timecode, DROP_FRAME_DELIMITER,
    NON_DROP_FRAME_DELIMITER, VALID_DROP_FRAME_DELIMITERS,
};

/// Maximum hours value in timecode (999).
pub const MAX_HOURS: u16 = 999;

/// Maximum minutes value in timecode (59).
pub const MAX_MINUTES: u8 = 59;

/// Maximum seconds value in timecode (59).
pub const MAX_SECONDS: u8 = 59;

/// Create a non-drop timecode from hours, minutes, seconds, and frames.
///
/// # Example
/// ```rust
/// use edlkit_timecode::{timecode, FrameRate};
///
/// let tc = timecode(1, 30, 45, 12, FrameRate::Fps24).unwrap();
/// assert_eq!(tc.to_string(), "01:30:45:12");
/// ```
pub fn timecode(
    hours: u16,
    minutes: u8,
    seconds: u8,
    frames: u8,
    frame_rate: FrameRate,
) -> Result<Timecode> {
    Timecode::new(hours, minutes, seconds, frames, frame_rate)
}

/// Create a drop-frame timecode from hours, minutes, seconds, and frames.
///
/// The frame rate must be 29.97 or 59.94.
///
/// # Example
/// ```rust
/// use edlkit_timecode::{timecode_df, FrameRate};
///
/// let tc = timecode_df(1, 0, 0, 2, FrameRate::Fps29_97).unwrap();
/// assert_eq!(tc.to_string(), "01:00:00;02");
/// ```
pub fn timecode_df(
    hours: u16,
    minutes: u8,
    seconds: u8,
    frames: u8,
    frame_rate: FrameRate,
) -> Result<Timecode> {
    Timecode::new_drop_frame(hours, minutes, seconds, frames, frame_rate)
}

/// Calculate the duration between two timecodes in frames.
///
/// Negative when `end` is before `start`. Only meaningful when both
/// timecodes share a frame rate.
#[must_use]
pub fn duration_frames(start: &Timecode, end: &Timecode) -> i64 {
    end.to_frame() - start.to_frame()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_timecode_convenience() {
        let tc = timecode(1, 30, 45, 12, FrameRate::Fps24).unwrap();
        assert_eq!(tc.to_string(), "01:30:45:12");
    }

    #[test]
    fn test_timecode_df_convenience() {
        let tc = timecode_df(1, 0, 0, 2, FrameRate::Fps29_97).unwrap();
        assert_eq!(tc.to_string(), "01:00:00;02");
        assert!(tc.drop_frame);

        assert!(timecode_df(1, 0, 0, 2, FrameRate::Fps25).is_err());
    }

    #[test]
    fn test_duration_frames() {
        let start = timecode(0, 0, 0, 0, FrameRate::Fps24).unwrap();
        let end = timecode(0, 0, 1, 0, FrameRate::Fps24).unwrap();
        assert_eq!(duration_frames(&start, &end), 24);
        assert_eq!(duration_frames(&end, &start), -24);
    }

    #[test]
    fn test_exhaustive_round_trip_per_rate() {
        // frame -> timecode -> frame over a dense range crossing several
        // minute and 10-minute boundaries for every supported mode.
        for (rate, drop) in [
            (FrameRate::Fps24, false),
            (FrameRate::Fps23_976, false),
            (FrameRate::Fps25, false),
            (FrameRate::Fps29_97, false),
            (FrameRate::Fps29_97, true),
            (FrameRate::Fps30, false),
            (FrameRate::Fps59_94, true),
            (FrameRate::Fps60, false),
        ] {
            for frame in (0i64..1_100_000)
                .step_by(997)
                .chain([1799, 1800, 17981, 17982, 35963, 35964, 107892])
            {
                let text = timecode_from_frame(frame, rate, drop).unwrap();
                let fields = Timecode::parse_components(&text).unwrap();
                let back = frame_from_timecode(fields, rate, drop).unwrap();
                assert_eq!(frame, back, "frame {frame} at {rate} drop={drop}");
            }
        }
    }

    #[test]
    fn test_constants() {
        assert_eq!(MAX_HOURS, 999);
        assert_eq!(MAX_MINUTES, 59);
        assert_eq!(MAX_SECONDS, 59);
    }
}
