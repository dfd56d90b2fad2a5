//! Edit event model.

use crate::error::{EdlError, Result};
use crate::process;
use edlkit_timecode::{FrameRate, Timecode};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Field names that can never be shadowed by ad hoc metadata.
pub const RESERVED_ATTRIBUTES: [&str; 11] = [
    "id",
    "reel",
    "channels",
    "source_in",
    "source_out",
    "record_in",
    "record_out",
    "effects",
    "comments",
    "metadata",
    "retime",
];

/// A retime (M2) record attached to an edit event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Retime {
    /// The raw tokens of the M2 line.
    pub tokens: Vec<String>,
    /// Playback speed as a signed fraction of normal (e.g. -50.0 for half
    /// speed reverse).
    pub speed: f64,
    /// The source in point stated on the M2 line.
    pub source_in: Timecode,
    /// Human-readable classification of the retime, including the record
    /// duration in frames.
    pub comment: String,
}

/// A single edit from an edit decision list.
///
/// Out timecodes are exclusive: a one frame long record is
/// `00:00:00:01 00:00:00:02`, not `00:00:00:01 00:00:00:01`.
///
/// Beyond its fixed fields, an event carries an open-ended metadata map for
/// annotations added after parsing (typically by a visitor). Metadata names
/// never collide with the fixed fields: setting a reserved name fails
/// instead of shadowing it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EditEvent {
    id: i64,
    reel: String,
    channels: String,
    source_in: Timecode,
    source_out: Timecode,
    record_in: Timecode,
    record_out: Timecode,
    fps: FrameRate,
    drop_frame: Option<bool>,
    effects: Vec<String>,
    comments: Vec<String>,
    retime: Option<Retime>,
    metadata: BTreeMap<String, String>,
}

impl EditEvent {
    /// Create a new edit event from its id, reel, channels and the four
    /// timecode strings `[source_in, source_out, record_in, record_out]`.
    ///
    /// Source timecodes are parsed source-tolerant (their frames field may
    /// overflow the rate); record timecodes are strict. With `drop_frame`
    /// unset, each timecode's delimiter decides.
    pub fn new(
        id: i64,
        reel: impl Into<String>,
        channels: impl Into<String>,
        timecodes: [&str; 4],
        fps: FrameRate,
        drop_frame: Option<bool>,
    ) -> Result<Self> {
        Ok(Self {
            id,
            reel: reel.into(),
            channels: channels.into(),
            source_in: Timecode::parse_source(timecodes[0], fps, drop_frame)?,
            source_out: Timecode::parse_source(timecodes[1], fps, drop_frame)?,
            record_in: Timecode::parse(timecodes[2], fps, drop_frame)?,
            record_out: Timecode::parse(timecodes[3], fps, drop_frame)?,
            fps,
            drop_frame,
            effects: Vec::new(),
            comments: Vec::new(),
            retime: None,
            metadata: BTreeMap::new(),
        })
    }

    /// The edit id within its list, adjusted for skipped audio rows.
    pub fn id(&self) -> i64 {
        self.id
    }

    /// The source reel for this edit.
    pub fn reel(&self) -> &str {
        &self.reel
    }

    /// The channel code for this edit ("V", "A", "AV", ...).
    pub fn channels(&self) -> &str {
        &self.channels
    }

    /// The frame rate this edit's timecodes are interpreted at.
    pub fn fps(&self) -> FrameRate {
        self.fps
    }

    /// The drop-frame setting this edit inherited from its list, if any.
    pub fn drop_frame(&self) -> Option<bool> {
        self.drop_frame
    }

    /// The source in timecode.
    pub fn source_in(&self) -> Timecode {
        self.source_in
    }

    /// The source out timecode (exclusive).
    pub fn source_out(&self) -> Timecode {
        self.source_out
    }

    /// The record in timecode.
    pub fn record_in(&self) -> Timecode {
        self.record_in
    }

    /// The record out timecode (exclusive).
    pub fn record_out(&self) -> Timecode {
        self.record_out
    }

    /// All four timecodes as `(source_in, source_out, record_in, record_out)`.
    pub fn timecodes(&self) -> (Timecode, Timecode, Timecode, Timecode) {
        (
            self.source_in,
            self.source_out,
            self.record_in,
            self.record_out,
        )
    }

    /// Source duration in frames. Out timecodes are exclusive.
    pub fn source_duration(&self) -> i64 {
        self.source_out.to_frame() - self.source_in.to_frame()
    }

    /// Record duration in frames. Out timecodes are exclusive.
    pub fn record_duration(&self) -> i64 {
        self.record_out.to_frame() - self.record_in.to_frame()
    }

    /// The raw effect lines attached to this edit, in file order.
    pub fn effects(&self) -> &[String] {
        &self.effects
    }

    /// Whether this edit carries any effect lines.
    pub fn has_effects(&self) -> bool {
        !self.effects.is_empty()
    }

    /// The comment lines attached to this edit, in file order.
    pub fn comments(&self) -> &[String] {
        &self.comments
    }

    /// Comments that do not carry a known metadata keyword.
    pub fn pure_comments(&self) -> impl Iterator<Item = &str> {
        self.comments
            .iter()
            .map(String::as_str)
            .filter(|comment| !process::comment_regex().is_match(comment))
    }

    /// Whether this edit has a retime.
    pub fn has_retime(&self) -> bool {
        self.retime.is_some()
    }

    /// The retime record, if any.
    pub fn retime(&self) -> Option<&Retime> {
        self.retime.as_ref()
    }

    /// The human-readable retime comment, if a retime is present.
    pub fn retime_comment(&self) -> Option<&str> {
        self.retime.as_ref().map(|r| r.comment.as_str())
    }

    /// Attach a named metadata value to this edit.
    ///
    /// Fails with a reserved-attribute error when `name` is one of the
    /// fixed field names, so ad hoc enrichment never collides with them.
    pub fn set_meta(&mut self, name: impl Into<String>, value: impl Into<String>) -> Result<()> {
        let name = name.into();
        if RESERVED_ATTRIBUTES.contains(&name.as_str()) {
            return Err(EdlError::ReservedAttribute { name });
        }
        self.metadata.insert(name, value.into());
        Ok(())
    }

    /// Look up a metadata value by name.
    pub fn meta(&self, name: &str) -> Option<&str> {
        self.metadata.get(name).map(String::as_str)
    }

    /// The full metadata map.
    pub fn metadata(&self) -> &BTreeMap<String, String> {
        &self.metadata
    }

    /// Register an effect line on this edit, re-joined from its tokens.
    pub fn add_effect(&mut self, tokens: &[&str]) {
        self.effects.push(tokens.join(" "));
    }

    /// Associate a comment line with this edit.
    pub fn add_comment(&mut self, comment: impl Into<String>) {
        self.comments.push(comment.into());
    }

    /// Register an M2 retime line on this edit and re-derive the source in
    /// point from the retime speed.
    ///
    /// Token layout is `M2 <reel> <speed> <source_in> ...`.
    pub(crate) fn add_retime(&mut self, tokens: &[&str]) -> Result<()> {
        if tokens.len() < 4 {
            return Err(EdlError::malformed(format!(
                "M2 retime row has {} tokens, expected at least 4",
                tokens.len()
            )));
        }
        let speed: f64 = tokens[2].parse().map_err(|_| {
            EdlError::malformed(format!("invalid M2 speed token \"{}\"", tokens[2]))
        })?;
        let retime_source_in = Timecode::parse_source(tokens[3], self.fps, self.drop_frame)?;

        let record_duration = self.record_duration();
        let mut comment = if speed.abs() < 0.0001 {
            format!("Freeze Frame (duration {record_duration})")
        } else if speed < 0.0 {
            format!(
                "Reverse motion ({} fps , record dur {})",
                tokens[2], record_duration
            )
        } else {
            format!(
                "Slow motion ({} fps , record dur {})",
                tokens[2], record_duration
            )
        };

        // Re-derive the true source in from the speed. A negative speed
        // plays backwards from the stated retime source in, so pull the in
        // point back by the covered source duration; the +1 compensates for
        // the exclusive out convention against an inclusive reference point.
        let source_duration = speed / self.fps.as_f64() * record_duration as f64;
        if source_duration < 0.0 {
            let mut frames = retime_source_in.to_frame() as f64 + source_duration;
            if frames < 0.0 {
                comment.push_str(&format!(
                    " Warn: source is {} frames short!",
                    frames.abs() as i64
                ));
                frames = 0.0;
            }
            self.source_in = Timecode::from_frame(
                (frames + 1.0) as i64,
                self.fps,
                self.drop_frame.unwrap_or(false),
            )?;
        }

        self.retime = Some(Retime {
            tokens: tokens.iter().map(|t| t.to_string()).collect(),
            speed,
            source_in: retime_source_in,
            comment,
        });
        Ok(())
    }

    // Transition fix-up hooks. The second parse pass is the only caller.

    pub(crate) fn set_source_in(&mut self, timecode: Timecode) {
        self.source_in = timecode;
    }

    pub(crate) fn set_source_out(&mut self, timecode: Timecode) {
        self.source_out = timecode;
    }

    pub(crate) fn set_record_in(&mut self, timecode: Timecode) {
        self.record_in = timecode;
    }

    pub(crate) fn set_record_out(&mut self, timecode: Timecode) {
        self.record_out = timecode;
    }
}

impl fmt::Display for EditEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:03} {} {} C {} {} {} {}",
            self.id,
            self.reel,
            self.channels,
            self.source_in,
            self.source_out,
            self.record_in,
            self.record_out
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn event() -> EditEvent {
        EditEvent::new(
            1,
            "TAPE01",
            "V",
            [
                "00:00:10:00",
                "00:00:12:00",
                "01:00:00:00",
                "01:00:02:00",
            ],
            FrameRate::Fps24,
            None,
        )
        .unwrap()
    }

    #[test]
    fn test_durations_are_exclusive() {
        let edit = EditEvent::new(
            1,
            "TAPE01",
            "V",
            [
                "00:00:00:01",
                "00:00:00:02",
                "01:00:00:00",
                "01:00:00:01",
            ],
            FrameRate::Fps24,
            None,
        )
        .unwrap();
        assert_eq!(edit.source_duration(), 1);
        assert_eq!(edit.record_duration(), 1);
    }

    #[test]
    fn test_accessors() {
        let edit = event();
        assert_eq!(edit.id(), 1);
        assert_eq!(edit.reel(), "TAPE01");
        assert_eq!(edit.channels(), "V");
        assert_eq!(edit.fps(), FrameRate::Fps24);
        assert_eq!(edit.source_in().to_string(), "00:00:10:00");
        assert_eq!(edit.record_out().to_string(), "01:00:02:00");
        assert_eq!(edit.source_duration(), 48);
        assert!(!edit.has_effects());
        assert!(!edit.has_retime());
        assert_eq!(edit.to_string(), "001 TAPE01 V C 00:00:10:00 00:00:12:00 01:00:00:00 01:00:02:00");
    }

    #[test]
    fn test_metadata_reserved_names() {
        let mut edit = event();
        let err = edit.set_meta("comments", "nope").unwrap_err();
        assert!(matches!(err, EdlError::ReservedAttribute { name } if name == "comments"));
        let err = edit.set_meta("source_in", "nope").unwrap_err();
        assert!(matches!(err, EdlError::ReservedAttribute { .. }));

        edit.set_meta("shot_status", "approved").unwrap();
        assert_eq!(edit.meta("shot_status"), Some("approved"));
        assert_eq!(edit.meta("missing"), None);
        assert_eq!(edit.metadata().len(), 1);
    }

    #[test]
    fn test_pure_comments() {
        let mut edit = event();
        edit.add_comment("* FROM CLIP NAME:  246AA-6");
        edit.add_comment("* just a note");
        edit.add_comment("* LOC: 01:00:00:12 YELLOW  MR0200");
        let pure: Vec<&str> = edit.pure_comments().collect();
        assert_eq!(pure, vec!["* just a note"]);
    }

    #[test]
    fn test_retime_freeze_frame() {
        let mut edit = event();
        edit.add_retime(&["M2", "TAPE01", "000.0", "00:00:10:00"])
            .unwrap();
        assert!(edit.has_retime());
        assert_eq!(
            edit.retime_comment(),
            Some("Freeze Frame (duration 48)")
        );
        // A non-negative speed leaves the source in untouched.
        assert_eq!(edit.source_in().to_string(), "00:00:10:00");
    }

    #[test]
    fn test_retime_slow_motion() {
        let mut edit = event();
        edit.add_retime(&["M2", "TAPE01", "12.000", "00:00:10:00"])
            .unwrap();
        assert_eq!(
            edit.retime_comment(),
            Some("Slow motion (12.000 fps , record dur 48)")
        );
    }

    #[test]
    fn test_retime_reverse_motion_recomputes_source_in() {
        let mut edit = event();
        // -24 fps at 24 fps over 48 record frames covers -48 source frames.
        // The recomputed in point is 240 - 48 + 1 = frame 193, one frame
        // past the naive inclusive value (preserved historical behavior).
        edit.add_retime(&["M2", "TAPE01", "-24.000", "00:00:10:00"])
            .unwrap();
        assert_eq!(
            edit.retime_comment(),
            Some("Reverse motion (-24.000 fps , record dur 48)")
        );
        assert_eq!(edit.source_in().to_frame(), 193);
        // The stated retime source in is kept on the record.
        assert_eq!(
            edit.retime().unwrap().source_in.to_string(),
            "00:00:10:00"
        );
        // Record in/out are never touched by a retime.
        assert_eq!(edit.record_in().to_string(), "01:00:00:00");
        assert_eq!(edit.record_out().to_string(), "01:00:02:00");
    }

    #[test]
    fn test_retime_reverse_motion_clamps_at_zero() {
        let mut edit = EditEvent::new(
            1,
            "TAPE01",
            "V",
            [
                "00:00:00:00",
                "00:00:02:00",
                "01:00:00:00",
                "01:00:02:00",
            ],
            FrameRate::Fps24,
            None,
        )
        .unwrap();
        // Covering -48 source frames from frame 24 runs 24 frames short.
        edit.add_retime(&["M2", "TAPE01", "-24.000", "00:00:01:00"])
            .unwrap();
        let comment = edit.retime_comment().unwrap();
        assert!(comment.ends_with("Warn: source is 24 frames short!"), "{comment}");
        // Clamped to frame 0, then the +1 fix-up applies.
        assert_eq!(edit.source_in().to_frame(), 1);
    }

    #[test]
    fn test_retime_requires_tokens() {
        let mut edit = event();
        assert!(edit.add_retime(&["M2", "TAPE01"]).is_err());
        assert!(edit
            .add_retime(&["M2", "TAPE01", "abc", "00:00:10:00"])
            .is_err());
    }

    #[test]
    fn test_serialization() {
        let mut edit = event();
        edit.add_comment("* note");
        edit.set_meta("shot_name", "MR0200").unwrap();
        let json = serde_json::to_string(&edit).unwrap();
        let decoded: EditEvent = serde_json::from_str(&json).unwrap();
        assert_eq!(decoded.id(), 1);
        assert_eq!(decoded.meta("shot_name"), Some("MR0200"));
        assert_eq!(decoded.comments(), edit.comments());
    }
}
