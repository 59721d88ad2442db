//! Byte-to-text decoding for the lexer's input side.
//!
//! Input may arrive as raw bytes cut at arbitrary points, so a decoder has to
//! carry an incomplete multi-byte sequence from one call to the next. The
//! decoder is owned by the lexer that uses it; nothing here is global.

/// Turns a stream of byte chunks into scan-ready text.
pub trait Decode {
    /// Decodes as much of `bytes` (after any carried-over remainder) as
    /// forms complete characters, keeping the rest for the next call.
    fn decode(&mut self, bytes: &[u8]) -> String;

    /// Flushes whatever remainder is still held. Called once the input ends.
    fn finish(&mut self) -> String;
}

/// UTF-8 decoder that replaces invalid sequences with U+FFFD.
#[derive(Debug, Default, Clone)]
pub struct Utf8Decoder {
    pending: Vec<u8>,
}

impl Utf8Decoder {
    /// Creates a decoder with no carried-over bytes.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of bytes held back waiting for the rest of a character.
    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }
}

impl Decode for Utf8Decoder {
    fn decode(&mut self, bytes: &[u8]) -> String {
        self.pending.extend_from_slice(bytes);

        let mut out = String::with_capacity(self.pending.len());
        let mut rest: &[u8] = &self.pending;
        loop {
            match std::str::from_utf8(rest) {
                Ok(valid) => {
                    out.push_str(valid);
                    rest = &[];
                    break;
                }
                Err(err) => {
                    let (valid, after) = rest.split_at(err.valid_up_to());
                    out.push_str(&String::from_utf8_lossy(valid));
                    match err.error_len() {
                        Some(len) => {
                            out.push(char::REPLACEMENT_CHARACTER);
                            rest = &after[len..];
                        }
                        // Truncated sequence at the end: wait for more bytes.
                        None => {
                            rest = after;
                            break;
                        }
                    }
                }
            }
        }

        let decoded = self.pending.len() - rest.len();
        self.pending.drain(..decoded);
        out
    }

    fn finish(&mut self) -> String {
        let tail = String::from_utf8_lossy(&self.pending).into_owned();
        self.pending.clear();
        tail
    }
}
