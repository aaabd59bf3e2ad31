use crate::MAX_LINE_LEN;
use std::collections::VecDeque;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ReaderError {
    #[error("Request too long")]
    TooLong,
}

/// Accumulates bytes from a connection and yields complete `\n`-terminated
/// lines (with any trailing `\r` stripped). One `LineReader` per connection.
#[derive(Default)]
pub struct LineReader {
    buf: VecDeque<u8>,
    /// Set while discarding the remainder of an over-long physical line.
    discarding: bool,
}

impl LineReader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append freshly read bytes.
    pub fn feed(&mut self, bytes: &[u8]) {
        self.buf.extend(bytes.iter().copied());
    }

    /// Pull the next complete line, if any. Returns `Err(ReaderError::TooLong)`
    /// at most once per over-long line; the line's bytes (up to and including
    /// the terminating `\n`) are always consumed from the buffer first.
    pub fn next_line(&mut self) -> Result<Option<String>, ReaderError> {
        loop {
            let Some(nl_pos) = self.buf.iter().position(|&b| b == b'\n') else {
                if self.buf.len() > MAX_LINE_LEN && !self.discarding {
                    self.discarding = true;
                    self.buf.clear();
                    return Err(ReaderError::TooLong);
                }
                return Ok(None);
            };

            let mut line_bytes: Vec<u8> = self.buf.drain(..=nl_pos).collect();
            line_bytes.pop(); // trailing \n
            if line_bytes.last() == Some(&b'\r') {
                line_bytes.pop();
            }

            if self.discarding {
                self.discarding = false;
                continue;
            }

            if line_bytes.len() > MAX_LINE_LEN {
                return Err(ReaderError::TooLong);
            }

            return Ok(Some(String::from_utf8_lossy(&line_bytes).into_owned()));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn yields_one_line_at_a_time() {
        let mut r = LineReader::new();
        r.feed(b"hello\nworld\n");
        assert_eq!(r.next_line().unwrap(), Some("hello".to_string()));
        assert_eq!(r.next_line().unwrap(), Some("world".to_string()));
        assert_eq!(r.next_line().unwrap(), None);
    }

    #[test]
    fn partial_line_waits_for_more_bytes() {
        let mut r = LineReader::new();
        r.feed(b"partial");
        assert_eq!(r.next_line().unwrap(), None);
        r.feed(b" line\n");
        assert_eq!(r.next_line().unwrap(), Some("partial line".to_string()));
    }

    #[test]
    fn strips_trailing_cr() {
        let mut r = LineReader::new();
        r.feed(b"hello\r\n");
        assert_eq!(r.next_line().unwrap(), Some("hello".to_string()));
    }

    #[test]
    fn over_long_line_reports_error_and_resumes() {
        let mut r = LineReader::new();
        let long = vec![b'a'; MAX_LINE_LEN + 10];
        r.feed(&long);
        r.feed(b"\n");
        r.feed(b"next\n");
        assert_eq!(r.next_line(), Err(ReaderError::TooLong));
        assert_eq!(r.next_line().unwrap(), Some("next".to_string()));
    }

    #[test]
    fn over_long_line_accumulated_incrementally_still_detected() {
        let mut r = LineReader::new();
        for _ in 0..(MAX_LINE_LEN / 4 + 10) {
            r.feed(b"abcd");
        }
        // still no newline: should report too-long even before the line ends
        assert_eq!(r.next_line(), Err(ReaderError::TooLong));
        r.feed(b"\nok\n");
        assert_eq!(r.next_line().unwrap(), Some("ok".to_string()));
    }
}
