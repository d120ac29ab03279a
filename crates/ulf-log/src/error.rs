use std::io;

use crate::level::ParseLevelError;

/// A malformed log line, or a read failure while parsing one.
///
/// Carries the line the parser was on and an [`ErrorKind`] describing what
/// went wrong there. End of input between records is not an error;
/// [`StreamParser::parse_next`](crate::StreamParser::parse_next) reports it
/// as `Ok(None)`.
#[derive(Debug, thiserror::Error)]
#[error("invalid log format at line {line}: {kind}")]
pub struct ParseError {
    line: usize,
    kind: ErrorKind,
}

impl ParseError {
    pub(crate) fn new(line: usize, kind: ErrorKind) -> Self {
        Self { line, kind }
    }

    /// 1-based line number the parser was on when the error occurred.
    pub fn line(&self) -> usize {
        self.line
    }

    pub fn kind(&self) -> &ErrorKind {
        &self.kind
    }

    pub fn into_kind(self) -> ErrorKind {
        self.kind
    }
}

/// The cause of a [`ParseError`].
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum ErrorKind {
    /// A specific structural character was required.
    #[error("expected {expected:?} but found {found:?}")]
    UnexpectedChar { expected: char, found: char },

    /// A character outside the alphabet of the current segment.
    #[error("unexpected character {0:?}")]
    UnexpectedCharacter(char),

    /// The input ended in the middle of a record.
    #[error("unexpected end of input")]
    UnexpectedEof,

    #[error("datetime too long")]
    DatetimeTooLong,

    #[error("log level too long")]
    LevelTooLong,

    /// The timestamp does not follow `YYYY/MM/DD hh:mm:ss.mmm ±hh:mm`.
    #[error("datetime '{0}' does not match layout 'YYYY/MM/DD hh:mm:ss.mmm ±hh:mm'")]
    DatetimeLayout(String),

    /// The timestamp has the right shape but names an impossible instant.
    #[error("invalid datetime '{text}': {source}")]
    InvalidDatetime {
        text: String,
        source: chrono::ParseError,
    },

    #[error(transparent)]
    InvalidLevel(#[from] ParseLevelError),

    /// A `file:line` location with nothing on one side of the colon.
    #[error("empty {0} in source location")]
    EmptyToken(&'static str),

    #[error("line number '{0}' out of range")]
    InvalidLineNumber(String),

    /// A quoted literal that is not a valid JSON string.
    #[error("malformed quoted string: {0}")]
    InvalidString(#[from] serde_json::Error),

    #[error("read failure: {0}")]
    Io(#[from] io::Error),
}
