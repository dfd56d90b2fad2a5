//! CMX3600 Edit Decision List parsing.
//!
//! Reads a CMX3600 EDL line by line into an [`EditList`] of [`EditEvent`]s,
//! with frame-accurate timecodes from [`edlkit_timecode`], dissolve/wipe
//! transition fix-ups, M2 retime handling, and comment-carried metadata
//! extraction.
//!
//! # Example
//!
//! ```
//! use edlkit_cmx::{process_edit, EdlParser};
//! use edlkit_timecode::FrameRate;
//!
//! let text = "\
//! TITLE: Final Cut
//! FCM: NON-DROP FRAME
//! 001  TAPE01  V  C  00:00:00:00 00:00:02:00 01:00:00:00 01:00:02:00
//! * LOC: 01:00:00:12 YELLOW  MR0200
//! 002  TAPE02  V  C  00:00:10:00 00:00:11:00 01:00:02:00 01:00:03:00
//! ";
//!
//! // A visitor runs once per completed event, in file order; process_edit
//! // lifts keyword comments into the event's metadata map.
//! let list = EdlParser::new(FrameRate::Fps24)
//!     .with_visitor(|edit| process_edit(edit, None))
//!     .parse_str(text, "final_cut.edl")
//!     .unwrap();
//!
//! assert_eq!(list.title(), Some("Final Cut"));
//! assert_eq!(list.len(), 2);
//! assert_eq!(list.edits()[0].meta("shot_name"), Some("MR0200"));
//! assert_eq!(list.edits()[1].record_duration(), 24);
//! ```

#![deny(unsafe_code)]
#![warn(clippy::all)]

mod error;
mod event;
mod parser;
mod process;

pub use error::{EdlError, Result};
pub use event::{EditEvent, Retime, RESERVED_ATTRIBUTES};
pub use parser::{EditList, EdlParser, Visitor};
pub use process::{process_edit, EditProcessor, COMMENT_KEYWORDS};

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
