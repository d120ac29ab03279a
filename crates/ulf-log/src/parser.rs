use std::borrow::Cow;
use std::io::{BufRead, BufReader, Read};
use std::iter::FusedIterator;

use chrono::{DateTime, FixedOffset};

use crate::cursor::Cursor;
use crate::error::{ErrorKind, ParseError};
use crate::level::Level;
use crate::lexer::{
    is_bare_literal_char, is_datetime_char, is_filename_char, is_level_char, is_line_number_char,
    is_unknown_location_char,
};
use crate::record::{Field, Header, Record, TIMESTAMP_FORMAT, TIMESTAMP_LEN};

/// Longest level name, `DEBUG`/`ERROR`/`FATAL`.
const LEVEL_MAX_LEN: usize = 5;

/// Shape of a timestamp: `0` is any digit, `+` is either sign.
const TIMESTAMP_LAYOUT: &[u8; TIMESTAMP_LEN] = b"0000/00/00 00:00:00.000 +00:00";

type PResult<T> = Result<T, ErrorKind>;

/// A streaming parser for Unified Log Format lines.
///
/// `StreamParser` reads from any [`BufRead`] one character at a time and
/// materializes one [`Record`] per call to [`parse_next`](Self::parse_next),
/// so arbitrarily large logs can be processed without loading them into
/// memory. It tracks the current line number for error reporting.
///
/// A line looks like
///
/// ```text
/// [2021/08/04 12:00:43.128 +08:00] [INFO] [lib.rs:81] ["Welcome to TiKV"] [key=value]
/// ```
///
/// The parser does not resynchronize: once an error has been returned, the
/// position of the underlying reader is unspecified.
pub struct StreamParser<R> {
    cursor: Cursor<R>,
    line: usize,
    datetime_buf: [u8; TIMESTAMP_LEN],
    level_buf: [u8; LEVEL_MAX_LEN],
}

impl<R: Read> StreamParser<BufReader<R>> {
    /// Creates a parser over an unbuffered reader such as a [`File`](std::fs::File)
    /// or [`Stdin`](std::io::Stdin).
    pub fn from_read(reader: R) -> Self {
        Self::new(BufReader::new(reader))
    }
}

impl<R: BufRead> StreamParser<R> {
    /// Creates a new parser positioned at line 1 of `reader`.
    pub fn new(reader: R) -> Self {
        Self {
            cursor: Cursor::new(reader),
            line: 1,
            datetime_buf: [0; TIMESTAMP_LEN],
            level_buf: [0; LEVEL_MAX_LEN],
        }
    }

    /// The 1-based line the parser is currently on.
    pub fn line(&self) -> usize {
        self.line
    }

    /// Consumes the parser and returns the underlying reader.
    pub fn into_inner(self) -> R {
        self.cursor.into_inner()
    }

    /// Returns an iterator over the remaining records.
    ///
    /// The iterator ends at end of input, or right after yielding the first
    /// error.
    pub fn records(&mut self) -> Records<'_, R> {
        Records {
            parser: self,
            done: false,
        }
    }

    /// Reads and parses the next record.
    ///
    /// # Returns
    ///
    /// * `Ok(Some(record))` when a record was parsed. The reader is left at
    ///   the end of that record's line.
    /// * `Ok(None)` when the input ended at a record boundary, possibly after
    ///   some blank lines.
    /// * `Err(_)` when the line is malformed or the input ended inside a
    ///   record.
    pub fn parse_next(&mut self) -> Result<Option<Record>, ParseError> {
        self.parse_record()
            .map_err(|kind| ParseError::new(self.line, kind))
    }

    fn parse_record(&mut self) -> PResult<Option<Record>> {
        if !self.trim_newlines()? {
            return Ok(None);
        }
        self.trim_char(' ')?;

        let timestamp = self.parse_datetime()?;
        self.skip_char(' ')?;
        let level = self.parse_level()?;
        self.skip_char(' ')?;
        let (file, line) = self.parse_location()?;
        self.skip_char(' ')?;
        let message = self.parse_message()?;
        let fields = self.parse_fields()?;

        // Running out of input here just means there was no final newline.
        self.trim_char(' ')?;

        log::trace!("parsed {} record at line {}", level, self.line);
        Ok(Some(Record {
            header: Header {
                timestamp,
                level,
                file,
                line,
            },
            message,
            fields,
        }))
    }

    /// Consumes the next character, treating end of input as an error.
    fn next(&mut self) -> PResult<char> {
        self.cursor.next_char()?.ok_or(ErrorKind::UnexpectedEof)
    }

    fn skip_char(&mut self, expected: char) -> PResult<()> {
        let found = self.next()?;
        if found != expected {
            return Err(ErrorKind::UnexpectedChar { expected, found });
        }
        Ok(())
    }

    /// Skips a run of `skip`. Returns `false` if the input ended during the run.
    fn trim_char(&mut self, skip: char) -> PResult<bool> {
        loop {
            match self.cursor.next_char()? {
                None => return Ok(false),
                Some(c) if c == skip => {}
                Some(c) => {
                    self.cursor.unread(c);
                    return Ok(true);
                }
            }
        }
    }

    /// Skips `\n` and `\r\n` sequences, counting lines. Returns `false` if the
    /// input ended during the run, including right after a trailing `\r`.
    fn trim_newlines(&mut self) -> PResult<bool> {
        loop {
            match self.cursor.next_char()? {
                None => return Ok(false),
                Some('\n') => self.line += 1,
                Some('\r') => match self.cursor.next_char()? {
                    None => return Ok(false),
                    Some('\n') => self.line += 1,
                    Some(found) => {
                        return Err(ErrorKind::UnexpectedChar {
                            expected: '\n',
                            found,
                        });
                    }
                },
                Some(c) => {
                    self.cursor.unread(c);
                    return Ok(true);
                }
            }
        }
    }

    fn parse_datetime(&mut self) -> PResult<DateTime<FixedOffset>> {
        self.skip_char('[')?;
        let mut n = 0;
        loop {
            let c = self.next()?;
            if c == ']' {
                break;
            }
            if !is_datetime_char(c) {
                return Err(ErrorKind::UnexpectedCharacter(c));
            }
            if n >= self.datetime_buf.len() {
                return Err(ErrorKind::DatetimeTooLong);
            }
            // datetime characters are all ASCII
            self.datetime_buf[n] = c as u8;
            n += 1;
        }
        parse_timestamp(ascii_str(&self.datetime_buf[..n]))
    }

    fn parse_level(&mut self) -> PResult<Level> {
        self.skip_char('[')?;
        let mut n = 0;
        loop {
            let c = self.next()?;
            if c == ']' {
                break;
            }
            if !is_level_char(c) {
                return Err(ErrorKind::UnexpectedCharacter(c));
            }
            if n >= self.level_buf.len() {
                return Err(ErrorKind::LevelTooLong);
            }
            self.level_buf[n] = c as u8;
            n += 1;
        }
        Ok(ascii_str(&self.level_buf[..n]).parse::<Level>()?)
    }

    /// Parses `[file:line]` or `[<unknown>]`. The unknown form yields an
    /// empty file name and line 0.
    fn parse_location(&mut self) -> PResult<(String, u32)> {
        self.skip_char('[')?;

        if self.cursor.peek()? == Some('<') {
            loop {
                let c = self.next()?;
                if c == ']' {
                    return Ok((String::new(), 0));
                }
                if !is_unknown_location_char(c) {
                    return Err(ErrorKind::UnexpectedCharacter(c));
                }
            }
        }

        let mut file = String::new();
        loop {
            let c = self.next()?;
            if c == ':' {
                break;
            }
            if !is_filename_char(c) {
                return Err(ErrorKind::UnexpectedCharacter(c));
            }
            file.push(c);
        }
        if file.is_empty() {
            return Err(ErrorKind::EmptyToken("file name"));
        }

        let mut digits = String::new();
        loop {
            let c = self.next()?;
            if c == ']' {
                break;
            }
            if !is_line_number_char(c) {
                return Err(ErrorKind::UnexpectedCharacter(c));
            }
            digits.push(c);
        }
        if digits.is_empty() {
            return Err(ErrorKind::EmptyToken("line number"));
        }
        // All digits, so the only possible failure is overflow.
        let line = digits
            .parse::<u32>()
            .map_err(|_| ErrorKind::InvalidLineNumber(digits.clone()))?;
        Ok((file, line))
    }

    fn parse_message(&mut self) -> PResult<String> {
        self.skip_char('[')?;
        let message = self.parse_string_literal()?;
        self.skip_char(']')?;
        Ok(message)
    }

    /// Parses zero or more ` [name=value]` fields.
    ///
    /// Stops in front of the first character that does not open a field, or
    /// at end of input.
    fn parse_fields(&mut self) -> PResult<Vec<Field>> {
        let mut fields = Vec::new();
        loop {
            if !self.trim_char(' ')? {
                return Ok(fields);
            }
            let c = self.next()?;
            if c != '[' {
                self.cursor.unread(c);
                return Ok(fields);
            }
            let name = self.parse_string_literal()?;
            self.skip_char('=')?;
            let value = self.parse_string_literal()?;
            self.skip_char(']')?;
            fields.push(Field { name, value });
        }
    }

    fn parse_string_literal(&mut self) -> PResult<String> {
        match self.cursor.peek()? {
            None => Err(ErrorKind::UnexpectedEof),
            Some('"') => self.parse_quoted_literal(),
            Some(_) => self.parse_bare_literal(),
        }
    }

    /// Reads characters up to the first one that cannot appear in a bare
    /// literal, leaving that character unread.
    fn parse_bare_literal(&mut self) -> PResult<String> {
        let mut literal = String::new();
        loop {
            let c = self.next()?;
            if !is_bare_literal_char(c) {
                self.cursor.unread(c);
                return Ok(literal);
            }
            literal.push(c);
        }
    }

    /// Reads a `"`-delimited literal and decodes it as a JSON string.
    ///
    /// The escaped character after a backslash is copied without looking at
    /// it, so `\"` does not end the literal. serde_json does the actual
    /// unescaping, after escapes of unpaired surrogates are swapped for
    /// `\ufffd`.
    fn parse_quoted_literal(&mut self) -> PResult<String> {
        let mut literal = String::new();
        let mut quotes = 0;
        loop {
            let c = self.next()?;
            literal.push(c);
            match c {
                '\\' => literal.push(self.next()?),
                '"' => {
                    quotes += 1;
                    if quotes == 2 {
                        break;
                    }
                }
                _ => {}
            }
        }
        let literal = mask_lone_surrogates(&literal);
        Ok(serde_json::from_str::<String>(&literal)?)
    }
}

/// Iterator returned by [`StreamParser::records`].
pub struct Records<'a, R> {
    parser: &'a mut StreamParser<R>,
    done: bool,
}

impl<R: BufRead> Iterator for Records<'_, R> {
    type Item = Result<Record, ParseError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        match self.parser.parse_next() {
            Ok(Some(record)) => Some(Ok(record)),
            Ok(None) => {
                self.done = true;
                None
            }
            Err(e) => {
                log::debug!("stopping record iteration: {}", e);
                self.done = true;
                Some(Err(e))
            }
        }
    }
}

impl<R: BufRead> FusedIterator for Records<'_, R> {}

/// Parses a timestamp token such as `2021/08/04 12:00:43.128 +08:00`.
///
/// The shape is checked byte by byte first because chrono's parser is
/// lenient about field widths and whitespace.
fn parse_timestamp(text: &str) -> PResult<DateTime<FixedOffset>> {
    let matches_layout = text.len() == TIMESTAMP_LEN
        && text
            .bytes()
            .zip(TIMESTAMP_LAYOUT.iter())
            .all(|(b, &l)| match l {
                b'0' => b.is_ascii_digit(),
                b'+' => b == b'+' || b == b'-',
                _ => b == l,
            });
    if !matches_layout {
        return Err(ErrorKind::DatetimeLayout(text.to_string()));
    }
    DateTime::parse_from_str(text, TIMESTAMP_FORMAT).map_err(|source| {
        ErrorKind::InvalidDatetime {
            text: text.to_string(),
            source,
        }
    })
}

/// Replaces `\uXXXX` escapes of unpaired UTF-16 surrogates with `\ufffd`.
///
/// serde_json rejects such escapes outright. A high surrogate escape directly
/// followed by a low surrogate escape is a pair and is kept.
fn mask_lone_surrogates(literal: &str) -> Cow<'_, str> {
    if !literal.contains("\\u") {
        return Cow::Borrowed(literal);
    }
    let mut out = String::with_capacity(literal.len());
    let mut rest = literal;
    while let Some(pos) = rest.find('\\') {
        out.push_str(&rest[..pos]);
        let escape = &rest[pos..];
        match surrogate_escape(escape) {
            Some(0xD800..=0xDBFF)
                if matches!(surrogate_escape(&escape[6..]), Some(0xDC00..=0xDFFF)) =>
            {
                out.push_str(&escape[..12]);
                rest = &escape[12..];
            }
            Some(_) => {
                out.push_str("\\ufffd");
                rest = &escape[6..];
            }
            None => {
                // The backslash and whatever it escapes, as is.
                let len = escape[1..].chars().next().map_or(1, |c| 1 + c.len_utf8());
                out.push_str(&escape[..len]);
                rest = &escape[len..];
            }
        }
    }
    out.push_str(rest);
    Cow::Owned(out)
}

/// The code unit of a `\uXXXX` escape at the start of `s`, if it is a
/// surrogate.
fn surrogate_escape(s: &str) -> Option<u16> {
    let hex = s.strip_prefix("\\u")?.get(..4)?;
    let unit = u16::from_str_radix(hex, 16).ok()?;
    (0xD800..=0xDFFF).contains(&unit).then_some(unit)
}

/// Views a scratch buffer as text. Scratch buffers only ever hold ASCII.
fn ascii_str(buf: &[u8]) -> &str {
    std::str::from_utf8(buf).unwrap_or_default()
}
