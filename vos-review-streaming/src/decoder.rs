//! Frame decoder.
//!
//! Turns byte chunks cut at arbitrary points into complete text lines.
//! Multi-byte UTF-8 sequences split across chunks are held back until the
//! rest of the sequence arrives; invalid sequences decode to U+FFFD.

use crate::error::{StreamError, StreamResult};

/// Default limit for a single unterminated line.
pub const MAX_LINE_BYTES: usize = 10 * 1024 * 1024;

/// Incremental UTF-8 line decoder.
#[derive(Debug)]
pub struct LineDecoder {
    /// Leading bytes of a UTF-8 sequence cut off by a chunk boundary.
    partial_char: Vec<u8>,
    /// Decoded text after the last newline.
    residual: String,
    max_line_bytes: usize,
}

impl Default for LineDecoder {
    fn default() -> Self {
        Self::new()
    }
}

impl LineDecoder {
    /// Create a decoder with the default line limit.
    #[must_use]
    pub fn new() -> Self {
        Self::with_max_line_bytes(MAX_LINE_BYTES)
    }

    /// Create a decoder with a custom line limit.
    #[must_use]
    pub fn with_max_line_bytes(max_line_bytes: usize) -> Self {
        Self {
            partial_char: Vec::new(),
            residual: String::new(),
            max_line_bytes,
        }
    }

    /// Feed a chunk and return every line it completed, in order.
    ///
    /// Lines are split on `\n`; a `\r` right before it is dropped. The text
    /// after the last newline is kept for the next chunk.
    pub fn feed(&mut self, chunk: &[u8]) -> StreamResult<Vec<String>> {
        self.decode(chunk);

        let mut lines = Vec::new();
        let mut start = 0;
        while let Some(offset) = self.residual[start..].find('\n') {
            let end = start + offset;
            let line = &self.residual[start..end];
            lines.push(line.strip_suffix('\r').unwrap_or(line).to_string());
            start = end + 1;
        }
        self.residual.drain(..start);

        if self.residual.len() > self.max_line_bytes {
            return Err(StreamError::BufferOverflow {
                limit: self.max_line_bytes,
            });
        }

        Ok(lines)
    }

    /// End of input: drop whatever is left.
    ///
    /// An unterminated trailing line is not a complete event. Returns the
    /// dropped fragment, if there was one.
    pub fn finish(&mut self) -> Option<String> {
        let had_partial_char = !self.partial_char.is_empty();
        self.partial_char.clear();

        let mut fragment = std::mem::take(&mut self.residual);
        if had_partial_char {
            fragment.push(char::REPLACEMENT_CHARACTER);
        }
        (!fragment.is_empty()).then_some(fragment)
    }

    /// Text received after the last newline.
    #[must_use]
    pub fn residual(&self) -> &str {
        &self.residual
    }

    /// Check if any undelivered input is buffered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.residual.is_empty() && self.partial_char.is_empty()
    }

    fn decode(&mut self, chunk: &[u8]) {
        let joined;
        let mut input: &[u8] = if self.partial_char.is_empty() {
            chunk
        } else {
            let mut bytes = std::mem::take(&mut self.partial_char);
            bytes.extend_from_slice(chunk);
            joined = bytes;
            &joined
        };

        loop {
            match std::str::from_utf8(input) {
                Ok(text) => {
                    self.residual.push_str(text);
                    return;
                }
                Err(err) => {
                    let (valid, rest) = input.split_at(err.valid_up_to());
                    if let Ok(text) = std::str::from_utf8(valid) {
                        self.residual.push_str(text);
                    }
                    match err.error_len() {
                        Some(len) => {
                            self.residual.push(char::REPLACEMENT_CHARACTER);
                            input = &rest[len..];
                        }
                        None => {
                            // Incomplete sequence at the end of the chunk.
                            self.partial_char.extend_from_slice(rest);
                            return;
                        }
                    }
                }
            }
        }
    }
}
