use std::io::{self, BufRead};

/// A character cursor over buffered bytes.
///
/// Decodes UTF-8 one `char` at a time out of the reader's buffer, so nothing
/// beyond the reader's own buffer and a few bytes of lookahead is held in
/// memory. A byte that does not start a valid encoding decodes to `U+FFFD`
/// and only that byte is consumed, so a broken sequence of `n` bytes yields
/// `n` replacement characters.
///
/// One character of push-back is supported, either by [`peek`](Self::peek)
/// or by handing a consumed character back through [`unread`](Self::unread).
pub(crate) struct Cursor<R> {
    inner: R,
    pending: Option<char>,
    /// Bytes taken from `inner` but not decoded yet.
    window: [u8; 4],
    filled: usize,
}

impl<R: BufRead> Cursor<R> {
    pub(crate) fn new(inner: R) -> Self {
        Self {
            inner,
            pending: None,
            window: [0; 4],
            filled: 0,
        }
    }

    /// Consumes and returns the next character, `None` at end of input.
    pub(crate) fn next_char(&mut self) -> io::Result<Option<char>> {
        match self.pending.take() {
            Some(c) => Ok(Some(c)),
            None => self.decode(),
        }
    }

    /// Returns the next character without consuming it.
    pub(crate) fn peek(&mut self) -> io::Result<Option<char>> {
        if self.pending.is_none() {
            self.pending = self.decode()?;
        }
        Ok(self.pending)
    }

    /// Pushes `c` back so the next read returns it again.
    ///
    /// Only one character can be pending at a time.
    pub(crate) fn unread(&mut self, c: char) {
        debug_assert!(self.pending.is_none(), "push-back slot already in use");
        self.pending = Some(c);
    }

    /// Returns the underlying reader. A pushed-back character and any
    /// undecoded lookahead bytes are lost.
    pub(crate) fn into_inner(self) -> R {
        self.inner
    }

    fn decode(&mut self) -> io::Result<Option<char>> {
        self.fill_window(1)?;
        if self.filled == 0 {
            return Ok(None);
        }
        let width = utf8_width(self.window[0]);
        if width > 1 {
            self.fill_window(width)?;
        }

        // Overlong forms and surrogates pass the width check but not this.
        let decoded = if width == 0 || self.filled < width {
            None
        } else {
            std::str::from_utf8(&self.window[..width])
                .ok()
                .and_then(|s| s.chars().next())
        };
        let (c, used) = match decoded {
            Some(c) => (c, width),
            None => (char::REPLACEMENT_CHARACTER, 1),
        };
        self.window.copy_within(used..self.filled, 0);
        self.filled -= used;
        Ok(Some(c))
    }

    /// Moves bytes from the reader into the window until it holds `n` bytes
    /// or the input ends.
    fn fill_window(&mut self, n: usize) -> io::Result<()> {
        while self.filled < n {
            let Some(b) = self.next_byte()? else {
                break;
            };
            self.window[self.filled] = b;
            self.filled += 1;
        }
        Ok(())
    }

    fn next_byte(&mut self) -> io::Result<Option<u8>> {
        loop {
            match self.inner.fill_buf() {
                Ok(buf) => {
                    let b = buf.first().copied();
                    if b.is_some() {
                        self.inner.consume(1);
                    }
                    return Ok(b);
                }
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            }
        }
    }
}

/// Encoded length of a UTF-8 sequence given its leading byte, 0 if the byte
/// cannot start a sequence.
fn utf8_width(b: u8) -> usize {
    match b {
        0x00..=0x7F => 1,
        0xC2..=0xDF => 2,
        0xE0..=0xEF => 3,
        0xF0..=0xF4 => 4,
        _ => 0,
    }
}
