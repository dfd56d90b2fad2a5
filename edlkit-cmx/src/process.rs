//! Comment metadata extraction.
//!
//! CMX3600 comments double as metadata carriers by production convention:
//! bracketed keyword lines name locators, source files, clip names, and ASC
//! color decisions. This module is a visitor built on the public event
//! surface, not part of the parser state machine; any convention with
//! different keywords can replace it.

use crate::error::{EdlError, Result};
use crate::event::EditEvent;
use regex::Regex;
use std::sync::OnceLock;
use tracing::{debug, info};

/// The comment keywords recognized by [`process_edit`], in match order.
///
/// `TO CLIP NAME` and `FROM CLIP NAME` precede `CLIP NAME` so the longer
/// keywords win in the alternation.
pub const COMMENT_KEYWORDS: [&str; 7] = [
    "LOC",
    "SOURCE FILE",
    "TO CLIP NAME",
    "FROM CLIP NAME",
    "CLIP NAME",
    "ASC_SOP",
    "ASC_SAT",
];

/// The keyword alternation, compiled once. Matches lines of the form
/// `* KEYWORD: value` (the leading `*` and surrounding spacing optional).
pub(crate) fn comment_regex() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        let keywords = COMMENT_KEYWORDS
            .map(|keyword| format!("(?:{keyword})"))
            .join("|");
        Regex::new(&format!(r"^\*?\s*(?P<type>{keywords})\s*:\s+(?P<value>.*)")).unwrap()
    })
}

/// Extract standard metadata from an edit's comments:
///
/// - `name` from `* LOC: 01:00:00:12 YELLOW  MR0200`
/// - `clip_name` from `* FROM CLIP NAME:  246AA-6` (or `CLIP NAME` /
///   `TO CLIP NAME`; the last matching comment wins, so a transition's
///   `TO CLIP NAME` overrides its `FROM CLIP NAME`)
/// - `tape` from `* SOURCE FILE: LR9907610`
/// - `asc_sop` and `asc_sat` from ASC CDL comments
///
/// If a shot regular expression is given it runs against the extracted
/// name: a single capture group extracts `shot_name` (e.g. `^(\w+)_.+$`),
/// while named groups extract `shot_name` (required) plus optional `type`,
/// `format` and `version`, e.g.
/// `(?P<shot_name>\w+)_(?P<type>\w\w\d\d)_(?P<version>[Vv]\d+)$`.
///
/// All extracted values attach to the event's metadata map.
pub fn process_edit(edit: &mut EditEvent, shot_regexp: Option<&Regex>) -> Result<()> {
    let mut name: Option<String> = None;
    let mut tape: Option<String> = None;
    let mut clip_name: Option<String> = None;
    let mut asc_sop: Option<String> = None;
    let mut asc_sat: Option<String> = None;

    for comment in edit.comments() {
        let Some(caps) = comment_regex().captures(comment) else {
            continue;
        };
        let kind = caps.name("type").map_or("", |m| m.as_str());
        let value = caps.name("value").map_or("", |m| m.as_str());
        debug!(kind, value, "found keyword in comments");
        match kind {
            "LOC" => {
                let tokens: Vec<&str> = value.split_whitespace().collect();
                if tokens.len() > 2 {
                    name = Some(tokens[2].to_string());
                }
            }
            "SOURCE FILE" => {
                tape = value.split_whitespace().last().map(str::to_string);
            }
            "CLIP NAME" | "TO CLIP NAME" | "FROM CLIP NAME" => {
                clip_name = Some(value.to_string());
            }
            "ASC_SOP" => asc_sop = Some(value.to_string()),
            "ASC_SAT" => asc_sat = Some(value.to_string()),
            _ => {}
        }
    }

    // The shot name defaults to the locator name.
    let mut shot_name = name.clone();
    let mut shot_type: Option<String> = None;
    let mut shot_format: Option<String> = None;
    let mut shot_version: Option<String> = None;
    if let (Some(edit_name), Some(regexp)) = (name.as_deref(), shot_regexp) {
        debug!(name = edit_name, pattern = regexp.as_str(), "extracting shot name");
        if let Some(caps) = regexp.captures(edit_name) {
            if regexp.captures_len() == 2 {
                // Only one capturing group: use it for the shot name.
                shot_name = caps.get(1).map(|m| m.as_str().to_string());
            } else {
                if !regexp.capture_names().flatten().any(|n| n == "shot_name") {
                    return Err(EdlError::ShotPattern {
                        pattern: regexp.as_str().to_string(),
                    });
                }
                shot_name = caps.name("shot_name").map(|m| m.as_str().to_string());
                shot_type = caps.name("type").map(|m| m.as_str().to_string());
                shot_format = caps.name("format").map(|m| m.as_str().to_string());
                shot_version = caps.name("version").map(|m| m.as_str().to_string());
            }
        }
    }

    if let Some(value) = name {
        edit.set_meta("name", value)?;
    }
    if let Some(value) = shot_name {
        edit.set_meta("shot_name", value)?;
    }
    if let Some(value) = tape {
        edit.set_meta("tape", value)?;
    }
    if let Some(value) = clip_name {
        edit.set_meta("clip_name", value)?;
    }
    if let Some(value) = asc_sop {
        edit.set_meta("asc_sop", value)?;
    }
    if let Some(value) = asc_sat {
        edit.set_meta("asc_sat", value)?;
    }
    if let Some(value) = shot_type {
        edit.set_meta("type", value)?;
    }
    if let Some(value) = shot_format {
        edit.set_meta("format", value)?;
    }
    if let Some(value) = shot_version {
        edit.set_meta("version", value)?;
    }
    Ok(())
}

/// A stateful visitor that runs [`process_edit`] and remembers the previous
/// edit it treated.
#[derive(Debug, Default)]
pub struct EditProcessor {
    previous: Option<String>,
    shot_regexp: Option<Regex>,
}

impl EditProcessor {
    /// Create a new processor with an optional shot name pattern.
    pub fn new(shot_regexp: Option<Regex>) -> Self {
        Self {
            previous: None,
            shot_regexp,
        }
    }

    /// Create a new processor from a shot name pattern string, compiling it.
    pub fn with_pattern(pattern: &str) -> Result<Self> {
        let compiled = Regex::new(pattern).map_err(|error| EdlError::PatternSyntax {
            pattern: pattern.to_string(),
            message: error.to_string(),
        })?;
        Ok(Self::new(Some(compiled)))
    }

    /// Process the given edit and log it against the previous one.
    pub fn process(&mut self, edit: &mut EditEvent) -> Result<()> {
        process_edit(edit, self.shot_regexp.as_ref())?;
        info!("treated edit {}, previous was {:?}", edit, self.previous);
        self.previous = Some(edit.to_string());
        Ok(())
    }
}
