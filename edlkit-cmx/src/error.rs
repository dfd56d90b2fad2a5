use edlkit_timecode::TimecodeError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum EdlError {
    #[error("Can't read {path}: don't know how to read files with the \"{extension}\" extension")]
    UnsupportedExtension { path: String, extension: String },

    #[error("{edl_name} has a black slug (BL) event, which is not supported")]
    BlackSlug { edl_name: String },

    #[error("Unknown FCM setting found in {edl_name}. Unable to determine drop frame setting")]
    UnknownFcm { edl_name: String },

    #[error("Found an M2 retime with no edit event open")]
    UnexpectedRetime,

    #[error("Found an effect with no edit event open")]
    UnexpectedEffect,

    #[error("Malformed event row: {message}")]
    MalformedEvent { message: String },

    #[error("EditEvent {name} attribute can't be redefined")]
    ReservedAttribute { name: String },

    #[error("No \"shot_name\" named group in regular expression {pattern}")]
    ShotPattern { pattern: String },

    #[error("Invalid shot name pattern \"{pattern}\": {message}")]
    PatternSyntax { pattern: String, message: String },

    #[error(transparent)]
    Timecode(#[from] TimecodeError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Rewrap carrying the exact failing line and file, so the final error
    /// message is self-contained for diagnosis.
    #[error("{source}.\n\nError reported while parsing {path} at line:\n\n{line}")]
    Line {
        path: String,
        line: String,
        #[source]
        source: Box<EdlError>,
    },
}

impl EdlError {
    pub(crate) fn malformed(message: impl Into<String>) -> Self {
        Self::MalformedEvent {
            message: message.into(),
        }
    }

    pub(crate) fn at_line(self, path: &str, line: &str) -> Self {
        Self::Line {
            path: path.to_string(),
            line: line.to_string(),
            source: Box::new(self),
        }
    }
}

pub type Result<T> = std::result::Result<T, EdlError>;
