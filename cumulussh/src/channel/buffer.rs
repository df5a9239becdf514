//! Accumulating output buffer with tail-bounded prompt search.
//!
//! Only the last N bytes are searched for the prompt pattern. Long
//! command output (a full `net show interface all json` dump can be
//! hundreds of kilobytes) would otherwise be re-scanned on every
//! received chunk.

use regex::bytes::Regex;

/// Buffer for accumulating device output.
///
/// ANSI escape sequences are stripped as data arrives, so prompt
/// matching and everything downstream sees plain text.
#[derive(Debug)]
pub struct OutputBuffer {
    buffer: Vec<u8>,

    /// How many bytes from the end to search for the prompt.
    search_depth: usize,
}

impl OutputBuffer {
    pub fn new(search_depth: usize) -> Self {
        Self {
            buffer: Vec::with_capacity(4096),
            search_depth,
        }
    }

    /// Append received data, stripping ANSI escape codes.
    pub fn extend(&mut self, data: &[u8]) {
        let cleaned = strip_ansi_escapes::strip(data);
        self.buffer.extend_from_slice(&cleaned);
    }

    /// Search only the buffer tail for the prompt pattern.
    pub fn prompt_in_tail(&self, pattern: &Regex) -> bool {
        let start = self.buffer.len().saturating_sub(self.search_depth);
        pattern.is_match(&self.buffer[start..])
    }

    /// Take the accumulated output as a string and reset the buffer.
    pub fn take_string(&mut self) -> String {
        String::from_utf8_lossy(&std::mem::take(&mut self.buffer)).into_owned()
    }

    pub fn clear(&mut self) {
        self.buffer.clear();
    }

    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ansi_codes_are_stripped_on_extend() {
        let mut buffer = OutputBuffer::new(100);
        buffer.extend(b"\x1b[32m+ interface swp1\x1b[0m");
        assert_eq!(buffer.take_string(), "+ interface swp1");
    }

    #[test]
    fn prompt_found_in_tail() {
        let mut buffer = OutputBuffer::new(20);
        buffer.extend(&[b'x'; 100]);
        buffer.extend(b"\ncumulus@switch:~$ ");

        let pattern = Regex::new(r"[$#][ \t]*$").unwrap();
        assert!(buffer.prompt_in_tail(&pattern));
    }

    #[test]
    fn prompt_outside_search_depth_is_missed() {
        let mut buffer = OutputBuffer::new(10);
        buffer.extend(b"cumulus@switch:~$ ");
        buffer.extend(&[b'x'; 100]);

        let pattern = Regex::new(r"[$#][ \t]*$").unwrap();
        assert!(!buffer.prompt_in_tail(&pattern));
    }

    #[test]
    fn take_resets_buffer() {
        let mut buffer = OutputBuffer::new(100);
        buffer.extend(b"some output");
        assert_eq!(buffer.take_string(), "some output");
        assert!(buffer.is_empty());
    }
}
