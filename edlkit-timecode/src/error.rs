//! Error types for timecode operations.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type for timecode operations.
pub type Result<T> = std::result::Result<T, TimecodeError>;

/// Errors that can occur during timecode operations.
#[derive(Debug, Clone, Error, Serialize, Deserialize, PartialEq, Eq)]
pub enum TimecodeError {
    /// Invalid timecode format in string.
    #[error("Invalid timecode format: {message}")]
    InvalidFormat {
        /// Description of the format error.
        message: String,
    },

    /// Invalid timecode component value.
    #[error("Invalid timecode component: {component} = {value} (max {max})")]
    InvalidComponent {
        /// Name of the invalid component (hours, minutes, seconds).
        component: String,
        /// The invalid value that was provided.
        value: u32,
        /// The maximum allowed value for this component.
        max: u32,
    },

    /// Frame value at or above the frame rate.
    #[error("Invalid frame value {frames}, it must be smaller than the frame rate {fps}")]
    FrameOutOfRange {
        /// The offending frame value.
        frames: u32,
        /// The nominal (integer) frame rate the value was checked against.
        fps: u32,
    },

    /// Invalid frame rate.
    #[error("Invalid frame rate: {numerator}/{denominator}")]
    InvalidFrameRate {
        /// Frame rate numerator.
        numerator: u32,
        /// Frame rate denominator.
        denominator: u32,
    },

    /// Drop-frame requested at a frame rate without drop-frame constants.
    #[error(
        "Invalid fps setting \"{frame_rate}\". Drop frame calculations are only supported \
         for 29.97 and 59.94 fps"
    )]
    UnsupportedDropFrameRate {
        /// String representation of the unsupported frame rate.
        frame_rate: String,
    },

    /// Timecode string asserts drop-frame but the caller requested non-drop.
    #[error(
        "Timecode \"{timecode}\" uses drop frame notation which conflicts with the explicit \
         non-drop frame request. Drop frame timecodes are delimited with a ; , or . between \
         the seconds and frames"
    )]
    ConflictingDropFrame {
        /// The timecode string carrying the drop-frame delimiter.
        timecode: String,
    },

    /// Underflow during timecode arithmetic.
    #[error("Timecode underflow")]
    Underflow,
}

impl TimecodeError {
    /// Create an invalid format error.
    pub fn invalid_format(message: impl Into<String>) -> Self {
        Self::InvalidFormat {
            message: message.into(),
        }
    }

    /// Create an invalid component error.
    pub fn invalid_component(component: impl Into<String>, value: u32, max: u32) -> Self {
        Self::InvalidComponent {
            component: component.into(),
            value,
            max,
        }
    }

    /// Create a frame out-of-range error.
    pub fn frame_out_of_range(frames: u32, fps: u32) -> Self {
        Self::FrameOutOfRange { frames, fps }
    }

    /// Create an unsupported drop-frame rate error.
    pub fn unsupported_drop_frame_rate(frame_rate: impl Into<String>) -> Self {
        Self::UnsupportedDropFrameRate {
            frame_rate: frame_rate.into(),
        }
    }

    /// Create a conflicting drop-frame error.
    pub fn conflicting_drop_frame(timecode: impl Into<String>) -> Self {
        Self::ConflictingDropFrame {
            timecode: timecode.into(),
        }
    }
}
