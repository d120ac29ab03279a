//! # ULF Log Parser
//!
//! Streaming parser for the Unified Log Format, the bracketed structured log
//! layout written by TiKV, PD, and other TiDB components.
//!
//! ## Overview
//!
//! Every log line has a fixed header followed by a message and any number of
//! key/value fields:
//!
//! ```text
//! [2021/08/04 12:00:43.128 +08:00] [INFO] [lib.rs:81] ["Welcome to TiKV"] [pid=1024]
//!  └──────── timestamp ────────┘  level  └ location ┘ └──── message ────┘ └ field ┘
//! ```
//!
//! Message, field names, and field values are either bare tokens
//! (`test_message`, `127.0.0.1:2379`) or JSON-quoted strings
//! (`"A \"hacker\""`). The location is `file:line` or `<unknown>`.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────┐   parse_next()    ┌──────────────┐
//! │   BufRead    │ ────────────────► │ StreamParser │ ──► Option<Record>
//! │ (streaming)  │ ◄──────────────── │  line, bufs  │
//! └──────────────┘  one char at a    └──────────────┘
//!                   time, 1 pushback        │ records()
//!                                           ▼
//!                                 parse_from_{reader,bytes,str}
//! ```
//!
//! [`StreamParser`] holds a character cursor over the reader, the current
//! line number, and two small fixed-size scratch buffers for the timestamp
//! and level tokens. Memory use per call is bounded by the length of the
//! record being parsed.
//!
//! ## Examples
//!
//! ### Streaming
//!
//! ```
//! use ulf_log::{Level, StreamParser};
//!
//! let input = "[2021/08/04 12:00:43.128 +08:00] [INFO] [lib.rs:81] [\"Welcome to TiKV\"]\n";
//! let mut parser = StreamParser::new(input.as_bytes());
//!
//! let record = parser.parse_next()?.expect("one record");
//! assert_eq!(record.header.level, Level::Info);
//! assert_eq!(record.header.file, "lib.rs");
//! assert_eq!(record.message, "Welcome to TiKV");
//!
//! // End of input between records is not an error.
//! assert!(parser.parse_next()?.is_none());
//! # Ok::<(), ulf_log::ParseError>(())
//! ```
//!
//! ### Whole input at once
//!
//! ```
//! let records = ulf_log::parse_from_str(
//!     "[2021/08/04 12:00:43.129 +08:00] [DEBUG] [<unknown>] [test_message] [k1=v1] [\"k 2\"=\"v 2\"]",
//! )?;
//! assert_eq!(records[0].field("k 2"), Some("v 2"));
//! assert!(!records[0].header.has_location());
//! # Ok::<(), ulf_log::ParseError>(())
//! ```
//!
//! ### Reading a file
//!
//! ```no_run
//! use std::fs::File;
//! use ulf_log::StreamParser;
//!
//! let mut parser = StreamParser::from_read(File::open("tikv.log")?);
//! for record in parser.records() {
//!     let record = record?;
//!     println!("{} {}", record.header.level, record.message);
//! }
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! ## Errors
//!
//! A malformed line yields a [`ParseError`] with the line number and an
//! [`ErrorKind`]. The parser does not try to recover; callers that need to
//! skip bad lines must split the input themselves.

mod cursor;
/// Error types for the stream parser.
pub mod error;
/// Severity levels.
pub mod level;
/// Character classes for each segment of a log line. The parser stops, or
/// fails, on the first character a predicate rejects.
pub mod lexer;
/// Streaming parser implementation.
pub mod parser;
/// Parsed record model.
pub mod record;


use std::io::{BufReader, Read};

pub use error::{ErrorKind, ParseError};
pub use level::{Level, ParseLevelError};
pub use parser::{Records, StreamParser};
pub use record::{Field, Header, Record};

/// Parses every record from `reader`.
///
/// Stops at end of input. The first malformed record aborts the whole parse
/// and nothing parsed before it is returned.
pub fn parse_from_reader<R: Read>(reader: R) -> Result<Vec<Record>, ParseError> {
    collect(StreamParser::new(BufReader::new(reader)))
}

/// Parses every record in a byte slice. See [`parse_from_reader`].
pub fn parse_from_bytes(input: &[u8]) -> Result<Vec<Record>, ParseError> {
    collect(StreamParser::new(input))
}

/// Parses every record in a string. See [`parse_from_reader`].
pub fn parse_from_str(input: &str) -> Result<Vec<Record>, ParseError> {
    parse_from_bytes(input.as_bytes())
}

fn collect<R: std::io::BufRead>(mut parser: StreamParser<R>) -> Result<Vec<Record>, ParseError> {
    let records = parser.records().collect::<Result<Vec<_>, _>>()?;
    log::debug!(
        "parsed {} records over {} lines",
        records.len(),
        parser.line()
    );
    Ok(records)
}
