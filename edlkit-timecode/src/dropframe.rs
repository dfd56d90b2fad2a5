//! Drop-frame timecode support for 29.97 and 59.94 fps.
//!
//! Drop-frame timecode compensates for the difference between the nominal
//! integer rate (30 or 60 fps) and the actual NTSC rate (29.97 or 59.94 fps)
//! by skipping frame numbers at specific intervals.
//!
//! The rules are:
//! - Skip frames 0 and 1 (or 0-3 for 59.94) at the start of each minute
//! - Except for minutes 0, 10, 20, 30, 40, 50

use crate::timecode::FrameRate;
use serde::{Deserialize, Serialize};

/// Drop-frame constants for a frame rate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DropFrameConfig {
    /// Number of frames dropped per minute (except every 10th minute)
    pub frames_dropped_per_minute: i64,
    /// Nominal (integer) frame rate
    pub nominal_fps: i64,
    /// Frames per 10 minutes, accounting for drops
    pub frames_per_10_minutes: i64,
    /// Frames per minute, accounting for drops (for non-10th minutes)
    pub frames_per_minute: i64,
}

impl DropFrameConfig {
    /// Get the drop-frame constants for 29.97 fps.
    #[must_use]
    pub const fn for_29_97() -> Self {
        Self {
            frames_dropped_per_minute: 2,
            nominal_fps: 30,
            // 30 * 60 * 10 - 9 * 2 = 18000 - 18 = 17982
            frames_per_10_minutes: 17982,
            // 30 * 60 - 2 = 1798
            frames_per_minute: 1798,
        }
    }

    /// Get the drop-frame constants for 59.94 fps.
    #[must_use]
    pub const fn for_59_94() -> Self {
        Self {
            frames_dropped_per_minute: 4,
            nominal_fps: 60,
            // 60 * 60 * 10 - 9 * 4 = 36000 - 36 = 35964
            frames_per_10_minutes: 35964,
            // 60 * 60 - 4 = 3596
            frames_per_minute: 3596,
        }
    }

    /// Get the constants for a frame rate, if it supports drop-frame.
    #[must_use]
    pub fn for_frame_rate(frame_rate: FrameRate) -> Option<Self> {
        match frame_rate {
            FrameRate::Fps29_97 => Some(Self::for_29_97()),
            FrameRate::Fps59_94 => Some(Self::for_59_94()),
            _ => None,
        }
    }
}

/// Number of frames to subtract from a raw (nominal-rate) frame count for
/// the given total minutes of timecode.
///
/// Drops apply to every minute except each 10th minute, so the count is
/// `frames_dropped_per_minute * (total_minutes - total_minutes / 10)`.
#[must_use]
pub fn frames_to_drop(total_minutes: i64, config: &DropFrameConfig) -> i64 {
    config.frames_dropped_per_minute * (total_minutes - total_minutes / 10)
}

/// Number of frames to add back to a frame count before splitting it into
/// display fields.
///
/// The frame count is split into complete 10-minute chunks and a remainder;
/// each chunk re-inserts nine minutes worth of drops, and each complete
/// drop-eligible minute within the remainder re-inserts one minute's worth
/// (only once the remainder has cleared the dropped region itself).
#[must_use]
pub fn frames_to_add(frame_number: i64, config: &DropFrameConfig) -> i64 {
    let drop = config.frames_dropped_per_minute;
    let ten_minute_chunks = frame_number / config.frames_per_10_minutes;
    let remaining_frames = frame_number % config.frames_per_10_minutes;

    let mut add_frames = drop * 9 * ten_minute_chunks;
    if remaining_frames > drop {
        add_frames += drop * ((remaining_frames - drop) / config.frames_per_minute);
    }
    add_frames
}
