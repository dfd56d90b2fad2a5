//! CMX3600 EDL parsing.
//!
//! A line-oriented state machine: one forward pass builds the event
//! sequence, a second pass adjusts timecodes for transitions.
//!
//! Format references: <http://xmil.biz/EDL-X/CMX3600.pdf>,
//! <http://www.edlmax.com/maxguide.html>

use crate::error::{EdlError, Result};
use crate::event::EditEvent;
use edlkit_timecode::{FrameRate, Timecode};
use serde::Serialize;
use std::fs;
use std::path::Path;
use tracing::{debug, info, warn};

/// Per-event visitor, invoked exactly once per completed event in file
/// order. Visitors typically attach metadata extracted from comments; see
/// [`crate::process::process_edit`].
pub type Visitor<'v> = Box<dyn FnMut(&mut EditEvent) -> Result<()> + 'v>;

/// An Edit Decision List: the read-only result of parsing one CMX3600 file.
#[derive(Debug, Clone, Serialize)]
pub struct EditList {
    title: Option<String>,
    fps: FrameRate,
    drop_frame: Option<bool>,
    edits: Vec<EditEvent>,
    has_transitions: bool,
}

impl EditList {
    /// Parse the given `.edl` file at the default 24 fps.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        EdlParser::new(FrameRate::Fps24).parse_file(path)
    }

    /// This list's title, if the file carried a `TITLE:` line.
    pub fn title(&self) -> Option<&str> {
        self.title.as_deref()
    }

    /// The frame rate this list was parsed at.
    pub fn fps(&self) -> FrameRate {
        self.fps
    }

    /// The drop-frame mode declared by the file's first FCM notice (or the
    /// caller's override); `None` when neither was given.
    pub fn drop_frame(&self) -> Option<bool> {
        self.drop_frame
    }

    /// Whether any event carries a dissolve or wipe.
    pub fn has_transitions(&self) -> bool {
        self.has_transitions
    }

    /// The edit events, in file order.
    pub fn edits(&self) -> &[EditEvent] {
        &self.edits
    }

    /// Number of edit events.
    pub fn len(&self) -> usize {
        self.edits.len()
    }

    /// Whether the list holds no events.
    pub fn is_empty(&self) -> bool {
        self.edits.is_empty()
    }
}

/// Configurable CMX3600 parser.
///
/// ```
/// use edlkit_cmx::EdlParser;
/// use edlkit_timecode::FrameRate;
///
/// let text = "\
/// TITLE: Demo
/// FCM: NON-DROP FRAME
/// 001  TAPE01  V  C  00:00:00:00 00:00:01:00 01:00:00:00 01:00:01:00
/// ";
/// let list = EdlParser::new(FrameRate::Fps24)
///     .parse_str(text, "demo.edl")
///     .unwrap();
/// assert_eq!(list.title(), Some("Demo"));
/// assert_eq!(list.len(), 1);
/// ```
pub struct EdlParser<'v> {
    fps: FrameRate,
    drop_frame: Option<bool>,
    visitor: Option<Visitor<'v>>,
}

impl<'v> EdlParser<'v> {
    /// Create a parser for the given frame rate.
    pub fn new(fps: FrameRate) -> Self {
        Self {
            fps,
            drop_frame: None,
            visitor: None,
        }
    }

    /// Explicitly set the drop-frame mode instead of deriving it from the
    /// file's first FCM notice. Conflicting notices then warn and are
    /// ignored, exactly as conflicts between FCM notices are.
    pub fn with_drop_frame(mut self, drop_frame: bool) -> Self {
        self.drop_frame = Some(drop_frame);
        self
    }

    /// Install a per-event visitor.
    pub fn with_visitor(mut self, visitor: impl FnMut(&mut EditEvent) -> Result<()> + 'v) -> Self {
        self.visitor = Some(Box::new(visitor));
        self
    }

    /// Parse the given file. Only the `.edl` extension is supported.
    pub fn parse_file(self, path: impl AsRef<Path>) -> Result<EditList> {
        let path = path.as_ref();
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("")
            .to_ascii_lowercase();
        if extension != "edl" {
            return Err(EdlError::UnsupportedExtension {
                path: path.display().to_string(),
                extension,
            });
        }
        let text = fs::read_to_string(path)?;
        let edl_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or_default()
            .to_string();
        self.parse_lines(&text, &path.display().to_string(), &edl_name)
    }

    /// Parse in-memory EDL text. `name` is used in diagnostics the way a
    /// file name would be.
    pub fn parse_str(self, text: &str, name: &str) -> Result<EditList> {
        self.parse_lines(text, name, name)
    }

    fn parse_lines(mut self, text: &str, path: &str, edl_name: &str) -> Result<EditList> {
        info!(path, "parsing EDL");
        let mut list = EditList {
            title: None,
            fps: self.fps,
            drop_frame: self.drop_frame,
            edits: Vec::new(),
            has_transitions: false,
        };
        let mut state = ParserState {
            current: None,
            visited: false,
            id_offset: 0,
        };

        for raw_line in text.lines() {
            // Strip the DOS EOF control byte some legacy tools leave behind.
            let cleaned = raw_line.replace('\u{1a}', "");
            let line = cleaned.trim();
            if line.is_empty() {
                continue;
            }
            debug!(line, "treating");
            process_line(&mut list, &mut state, &mut self.visitor, line, edl_name)
                .map_err(|error| error.at_line(path, line))?;
        }

        // Hand off the last open event exactly as a mid-stream handoff.
        if let Some(index) = state.current {
            if !state.visited {
                visit(&mut self.visitor, &mut list.edits[index])?;
            }
        }

        apply_transitions(&mut list)?;
        Ok(list)
    }
}

struct ParserState {
    /// Index of the currently open event in the list.
    current: Option<usize>,
    /// Whether the open event has already been handed to the visitor.
    visited: bool,
    /// Running count of skipped audio-only rows.
    id_offset: i64,
}

fn visit(visitor: &mut Option<Visitor<'_>>, edit: &mut EditEvent) -> Result<()> {
    if let Some(visitor) = visitor {
        debug!(edit = %edit, "visiting");
        visitor(edit)?;
    }
    Ok(())
}

fn process_line(
    list: &mut EditList,
    state: &mut ParserState,
    visitor: &mut Option<Visitor<'_>>,
    line: &str,
    edl_name: &str,
) -> Result<()> {
    let tokens: Vec<&str> = line.split_whitespace().collect();

    if let Some(rest) = line.strip_prefix("TITLE:") {
        let title = rest.split_whitespace().collect::<Vec<_>>().join(" ");
        if !title.is_empty() {
            list.title = Some(title);
        }
        return Ok(());
    }

    if line.starts_with("FCM:") {
        let drop_frame = match (tokens.get(1).copied(), tokens.get(2).copied()) {
            (Some("DROP"), Some("FRAME")) => true,
            (Some("NON-DROP"), Some("FRAME")) => false,
            _ => {
                return Err(EdlError::UnknownFcm {
                    edl_name: edl_name.to_string(),
                })
            }
        };
        // Only the first FCM note sets the drop frame mode for the entire
        // EDL. Some EDLs carry additional FCM notes around transitions.
        match list.drop_frame {
            None => list.drop_frame = Some(drop_frame),
            Some(current) if current != drop_frame => {
                warn!(
                    line,
                    "conflicting FCM note ignored; the first FCM note sets the drop frame \
                     mode for the entire EDL"
                );
            }
            Some(_) => {}
        }
        return Ok(());
    }

    if tokens.len() > 1 && tokens[1] == "BL" {
        return Err(EdlError::BlackSlug {
            edl_name: edl_name.to_string(),
        });
    }

    if tokens[0] == "M2" {
        let Some(index) = state.current else {
            return Err(EdlError::UnexpectedRetime);
        };
        return list.edits[index].add_retime(&tokens);
    }

    if tokens[0].bytes().all(|b| b.is_ascii_digit()) {
        return process_event_row(list, state, visitor, &tokens);
    }

    // Anything else is a comment for the open event; with none open the
    // line is ignored.
    if let Some(index) = state.current {
        list.edits[index].add_comment(line);
    }
    Ok(())
}

fn process_event_row(
    list: &mut EditList,
    state: &mut ParserState,
    visitor: &mut Option<Visitor<'_>>,
    tokens: &[&str],
) -> Result<()> {
    if tokens.len() < 4 {
        return Err(EdlError::malformed(format!(
            "event row has {} tokens, expected at least 4",
            tokens.len()
        )));
    }
    let media_type = tokens[2];
    let event_type = tokens[3];

    // Audio-only rows contribute no event but shift the numbering of every
    // row after them.
    if media_type == "AA" {
        state.id_offset += 1;
        return Ok(());
    }

    let raw_id: i64 = tokens[0]
        .parse()
        .map_err(|_| EdlError::malformed(format!("invalid event id \"{}\"", tokens[0])))?;
    let id = raw_id - state.id_offset;

    if let Some(index) = state.current {
        if list.edits[index].id() == id {
            // A duplicated id is a continuation: this row is an effect on
            // the same event.
            list.edits[index].add_effect(tokens);
            return Ok(());
        }
        if !state.visited {
            visit(visitor, &mut list.edits[index])?;
            state.visited = true;
        }
    }

    if event_type == "C" {
        if tokens.len() < 8 {
            return Err(EdlError::malformed(format!(
                "cut row has {} tokens, expected at least 8",
                tokens.len()
            )));
        }
        // Optional fields can appear in the middle of the row, so the four
        // timecodes are read from the end.
        let n = tokens.len();
        let edit = EditEvent::new(
            id,
            tokens[1],
            media_type,
            [tokens[n - 4], tokens[n - 3], tokens[n - 2], tokens[n - 1]],
            list.fps,
            list.drop_frame,
        )?;
        list.edits.push(edit);
        state.current = Some(list.edits.len() - 1);
        state.visited = false;
    } else {
        // Wipes, dissolves and other non-cut rows attach to the open event.
        let Some(index) = state.current else {
            return Err(EdlError::UnexpectedEffect);
        };
        list.edits[index].add_effect(tokens);
    }
    Ok(())
}

/// The second pass: adjust timecodes for transitions.
///
/// A dissolve's true in/out points are carried on its effect line rather
/// than the primary event fields, and the preceding clip must be extended
/// to cover the overlap.
fn apply_transitions(list: &mut EditList) -> Result<()> {
    let drop_frame = list.drop_frame;
    for index in 0..list.edits.len() {
        let effects = list.edits[index].effects().to_vec();
        for effect in &effects {
            let tokens: Vec<&str> = effect.split_whitespace().collect();
            let Some(marker) = tokens.get(3).copied() else {
                continue;
            };
            if !marker.starts_with(['D', 'd', 'W', 'w']) {
                continue;
            }
            list.has_transitions = true;
            if marker != "D" || index == 0 {
                continue;
            }
            if tokens.len() < 9 {
                return Err(EdlError::malformed(format!(
                    "dissolve effect row has {} tokens, expected at least 9",
                    tokens.len()
                )));
            }

            let fps = list.edits[index].fps();
            let duration = transition_duration(tokens[4], fps, drop_frame)?;

            // Extend the previous edit's out points by the transition
            // duration, at its own rate.
            let previous = &list.edits[index - 1];
            let previous_fps = previous.fps();
            let previous_drop = previous.drop_frame().unwrap_or(false);
            let source_out = Timecode::from_frame(
                previous.source_out().to_frame() + duration,
                previous_fps,
                previous_drop,
            )?;
            let record_out = Timecode::from_frame(
                previous.record_out().to_frame() + duration,
                previous_fps,
                previous_drop,
            )?;
            let previous = &mut list.edits[index - 1];
            previous.set_source_out(source_out);
            previous.set_record_out(record_out);

            // Take the current edit's timecodes from the dissolve effect.
            let source_in = Timecode::parse(tokens[5], fps, drop_frame)?;
            let source_out = Timecode::parse(tokens[6], fps, drop_frame)?;
            let record_in = Timecode::parse(tokens[7], fps, drop_frame)?;
            let record_out = Timecode::parse(tokens[8], fps, drop_frame)?;
            let edit = &mut list.edits[index];
            edit.set_source_in(source_in);
            edit.set_source_out(source_out);
            edit.set_record_in(record_in);
            edit.set_record_out(record_out);
        }
    }
    Ok(())
}

/// Read a transition duration token as a frame count. The duration is
/// normally a bare frame count (`030`) but a full timecode is tolerated.
fn transition_duration(token: &str, fps: FrameRate, drop_frame: Option<bool>) -> Result<i64> {
    if token.bytes().all(|b| b.is_ascii_digit()) {
        return token
            .parse()
            .map_err(|_| EdlError::malformed(format!("invalid transition duration \"{token}\"")));
    }
    Ok(Timecode::parse(token, fps, drop_frame)?.to_frame())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn parse(text: &str) -> Result<EditList> {
        EdlParser::new(FrameRate::Fps24).parse_str(text, "test.edl")
    }

    #[test]
    fn test_two_event_cut_list() {
        let list = parse(
            "\
TITLE: Two cuts
FCM: NON-DROP FRAME
001  TAPE01  V  C  00:00:00:00 00:00:01:00 01:00:00:00 01:00:01:00
002  TAPE02  V  C  00:00:05:00 00:00:06:00 01:00:01:00 01:00:02:00
",
        )
        .unwrap();
        assert_eq!(list.title(), Some("Two cuts"));
        assert_eq!(list.drop_frame(), Some(false));
        assert_eq!(list.len(), 2);
        assert_eq!(list.edits()[0].id(), 1);
        assert_eq!(list.edits()[1].id(), 2);
        assert_eq!(list.edits()[1].reel(), "TAPE02");
        assert!(!list.has_transitions());
    }

    #[test]
    fn test_audio_rows_are_skipped_and_offset_ids() {
        let list = parse(
            "\
TITLE: Audio skip
001  TAPE01  AA  C  00:00:00:00 00:00:01:00 01:00:00:00 01:00:01:00
002  TAPE02  V   C  00:00:00:00 00:00:01:00 01:00:00:00 01:00:01:00
",
        )
        .unwrap();
        assert_eq!(list.len(), 1);
        assert_eq!(list.edits()[0].id(), 1);
        assert_eq!(list.edits()[0].channels(), "V");
    }

    #[test]
    fn test_comments_attach_to_open_event() {
        let list = parse(
            "\
001  TAPE01  V  C  00:00:00:00 00:00:01:00 01:00:00:00 01:00:01:00
* FROM CLIP NAME: 246AA-6
* a free comment
",
        )
        .unwrap();
        assert_eq!(
            list.edits()[0].comments(),
            ["* FROM CLIP NAME: 246AA-6", "* a free comment"]
        );
        let pure: Vec<&str> = list.edits()[0].pure_comments().collect();
        assert_eq!(pure, vec!["* a free comment"]);
    }

    #[test]
    fn test_leading_comments_are_ignored() {
        let list = parse(
            "\
some preamble the machine does not understand
001  TAPE01  V  C  00:00:00:00 00:00:01:00 01:00:00:00 01:00:01:00
",
        )
        .unwrap();
        assert_eq!(list.len(), 1);
        assert!(list.edits()[0].comments().is_empty());
    }

    #[test]
    fn test_duplicate_id_rows_become_effects() {
        let list = parse(
            "\
001  TAPE01  V  C  00:00:00:00 00:00:01:00 01:00:00:00 01:00:01:00
001  TAPE01  V  W001  024  00:00:01:00 00:00:02:00 01:00:01:00 01:00:02:00
",
        )
        .unwrap();
        assert_eq!(list.len(), 1);
        assert!(list.edits()[0].has_effects());
        assert!(list.has_transitions());
    }

    #[test]
    fn test_dissolve_fixup() {
        // Event 2 opens with placeholder fields; its dissolve effect row
        // carries the true timecodes and a 24 frame duration.
        let list = parse(
            "\
FCM: NON-DROP FRAME
001  TAPE01  V  C  00:00:00:00 00:00:02:00 01:00:00:00 01:00:02:00
002  TAPE02  V  C  00:00:10:00 00:00:10:00 01:00:02:00 01:00:02:00
002  TAPE02  V  D  024  00:00:10:00 00:00:12:00 01:00:02:00 01:00:04:00
",
        )
        .unwrap();
        assert!(list.has_transitions());
        assert_eq!(list.len(), 2);

        // The previous event's out points grow by the transition duration.
        let first = &list.edits()[0];
        assert_eq!(first.source_out().to_string(), "00:00:03:00");
        assert_eq!(first.record_out().to_string(), "01:00:03:00");

        // The dissolve's own fields replace the current event's timecodes.
        let second = &list.edits()[1];
        assert_eq!(second.source_in().to_string(), "00:00:10:00");
        assert_eq!(second.source_out().to_string(), "00:00:12:00");
        assert_eq!(second.record_in().to_string(), "01:00:02:00");
        assert_eq!(second.record_out().to_string(), "01:00:04:00");
    }

    #[test]
    fn test_wipe_marks_transitions_without_fixup() {
        let list = parse(
            "\
001  TAPE01  V  C  00:00:00:00 00:00:02:00 01:00:00:00 01:00:02:00
002  TAPE02  V  C  00:00:10:00 00:00:11:00 01:00:02:00 01:00:03:00
002  TAPE02  V  W001  024  00:00:10:00 00:00:12:00 01:00:02:00 01:00:04:00
",
        )
        .unwrap();
        assert!(list.has_transitions());
        // A wipe only marks the list; the cut fields stay as parsed.
        assert_eq!(list.edits()[0].source_out().to_string(), "00:00:02:00");
        assert_eq!(list.edits()[1].record_out().to_string(), "01:00:03:00");
    }

    #[test]
    fn test_black_slug_fails_naming_the_file() {
        let err = parse(
            "\
001  BL  V  C  00:00:00:00 00:00:01:00 01:00:00:00 01:00:01:00
",
        )
        .unwrap_err();
        let message = err.to_string();
        assert!(message.contains("black slug"));
        assert!(message.contains("test.edl"));
    }

    #[test]
    fn test_unknown_fcm_fails_naming_the_file() {
        let err = parse("FCM: SOMETHING ELSE\n").unwrap_err();
        let message = err.to_string();
        assert!(message.contains("Unknown FCM setting"));
        assert!(message.contains("test.edl"));
    }

    #[test]
    fn test_conflicting_fcm_warns_and_keeps_first() {
        let list = parse(
            "\
FCM: DROP FRAME
001  TAPE01  V  C  00:00:00;00 00:00:01;00 01:00:00;00 01:00:01;00
FCM: NON-DROP FRAME
002  TAPE02  V  C  00:00:00;00 00:00:01;00 01:00:01;00 01:00:02;00
",
        );
        // 24 fps cannot do drop frame; parse at 29.97 instead.
        assert!(list.is_err());

        let list = EdlParser::new(FrameRate::Fps29_97)
            .parse_str(
                "\
FCM: DROP FRAME
001  TAPE01  V  C  00:00:00;00 00:00:01;00 01:00:00;00 01:00:01;00
FCM: NON-DROP FRAME
002  TAPE02  V  C  00:00:00;00 00:00:01;00 01:00:01;00 01:00:02;00
",
                "test.edl",
            )
            .unwrap();
        assert_eq!(list.drop_frame(), Some(true));
        assert_eq!(list.len(), 2);
    }

    #[test]
    fn test_retime_row_requires_open_event() {
        let err = parse("M2 TAPE01 -50.000 00:00:10:00\n").unwrap_err();
        match err {
            EdlError::Line { source, .. } => {
                assert!(matches!(*source, EdlError::UnexpectedRetime))
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_effect_row_requires_open_event() {
        let err = parse(
            "001  TAPE01  V  D  024  00:00:00:00 00:00:01:00 01:00:00:00 01:00:01:00\n",
        )
        .unwrap_err();
        match err {
            EdlError::Line { source, .. } => {
                assert!(matches!(*source, EdlError::UnexpectedEffect))
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_m2_retime_applies_to_open_event() {
        let list = parse(
            "\
001  TAPE01  V  C  00:00:10:00 00:00:12:00 01:00:00:00 01:00:02:00
M2   TAPE01       -24.000                  00:00:10:00
",
        )
        .unwrap();
        let edit = &list.edits()[0];
        assert!(edit.has_retime());
        assert_eq!(
            edit.retime_comment(),
            Some("Reverse motion (-24.000 fps , record dur 48)")
        );
        assert_eq!(edit.source_in().to_frame(), 193);
    }

    #[test]
    fn test_errors_carry_line_and_path() {
        let err = parse(
            "\
TITLE: Broken
001  TAPE01  V  C  00:00:00:00 00:00:99:00 01:00:00:00 01:00:01:00
",
        )
        .unwrap_err();
        let message = err.to_string();
        assert!(message.contains("Error reported while parsing test.edl at line:"));
        assert!(message.contains("00:00:99:00"));
    }

    #[test]
    fn test_visitor_called_once_per_event_in_order() {
        let mut seen: Vec<i64> = Vec::new();
        let list = EdlParser::new(FrameRate::Fps24)
            .with_visitor(|edit| {
                seen.push(edit.id());
                edit.set_meta("seen", "yes")?;
                Ok(())
            })
            .parse_str(
                "\
001  TAPE01  V  C  00:00:00:00 00:00:01:00 01:00:00:00 01:00:01:00
002  TAPE02  V  C  00:00:00:00 00:00:01:00 01:00:01:00 01:00:02:00
002  TAPE02  V  D  024  00:00:00:00 00:00:01:00 01:00:01:00 01:00:02:00
003  TAPE03  V  C  00:00:00:00 00:00:01:00 01:00:02:00 01:00:03:00
",
                "test.edl",
            )
            .unwrap();
        assert_eq!(seen, vec![1, 2, 3]);
        for edit in list.edits() {
            assert_eq!(edit.meta("seen"), Some("yes"));
        }
    }

    #[test]
    fn test_explicit_drop_frame_override() {
        let list = EdlParser::new(FrameRate::Fps29_97)
            .with_drop_frame(true)
            .parse_str(
                "001  TAPE01  V  C  00:00:00:00 00:00:01:00 01:00:00:00 01:00:01:00\n",
                "test.edl",
            )
            .unwrap();
        assert_eq!(list.drop_frame(), Some(true));
        assert!(list.edits()[0].source_in().drop_frame);
    }

    #[test]
    fn test_title_with_inner_whitespace_collapses() {
        let list = parse("TITLE:   My   Cut   v2\n").unwrap();
        assert_eq!(list.title(), Some("My Cut v2"));
    }
}
