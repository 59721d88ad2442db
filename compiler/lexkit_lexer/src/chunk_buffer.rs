//! Reassembly of incoming text fragments.
//!
//! Fragments are appended whole, but only complete lines are exposed to the
//! matcher: text after the last line separator is held back until a later
//! fragment completes the line or the input is finalized. Consumed text is
//! dropped from the front of the buffer on the next append, so only the
//! unmatched suffix of the input is retained.

use log::trace;

use crate::line_tracker::LineTracker;
use crate::token::Location;

/// How much of a peek request the buffer could satisfy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Availability {
    /// Every requested character was available.
    Full,
    /// The request ran past buffered text; more input may still arrive.
    Starved,
    /// The request ran past the end of the input.
    EndOfInput,
}

/// Result of [`ChunkBuffer::peek`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Peek<'a> {
    /// The characters that were available
    pub text: &'a str,
    /// Whether the request was cut short, and why
    pub availability: Availability,
}

/// Result of [`ChunkBuffer::consume`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Consumed {
    /// The characters removed from the buffer
    pub text: String,
    /// Set when fewer characters than requested were available
    pub exhausted: bool,
}

/// Buffered input with a movable read cursor.
#[derive(Debug, Clone)]
pub struct ChunkBuffer {
    text: String,
    cursor: usize,
    partial_line: String,
    input_complete: bool,
    tracker: LineTracker,
}

impl ChunkBuffer {
    /// Creates an empty buffer for lines ending in `separator`.
    pub fn new<S: Into<String>>(separator: S) -> Self {
        Self {
            text: String::new(),
            cursor: 0,
            partial_line: String::new(),
            input_complete: false,
            tracker: LineTracker::new(separator),
        }
    }

    /// Appends a fragment of input.
    ///
    /// Everything up to and including the last separator becomes visible to
    /// the matcher; the rest is held back. Fragments appended after
    /// [`finalize`](Self::finalize) are ignored.
    pub fn append(&mut self, fragment: &str) {
        if self.input_complete {
            trace!("ignoring {} bytes appended after finalize", fragment.len());
            return;
        }
        self.compact();

        // Held-back text holds no whole separator, so only its last few
        // bytes can start one that the new fragment completes.
        let separator = self.tracker.separator();
        let mut search_from = self
            .partial_line
            .len()
            .saturating_sub(separator.len().saturating_sub(1));
        while !self.partial_line.is_char_boundary(search_from) {
            search_from -= 1;
        }
        self.partial_line.push_str(fragment);

        let found = self.partial_line[search_from..]
            .rfind(separator)
            .map(|index| search_from + index);
        if let Some(index) = found {
            let end = index + separator.len();
            self.text.push_str(&self.partial_line[..end]);
            self.partial_line.drain(..end);
        }
    }

    /// Marks the input complete, flushing any held-back partial line.
    /// Calling it again has no effect.
    pub fn finalize(&mut self) {
        if self.input_complete {
            return;
        }
        self.compact();
        self.text.push_str(&self.partial_line);
        self.partial_line.clear();
        self.input_complete = true;
    }

    /// Whether [`finalize`](Self::finalize) has been called.
    pub fn is_input_complete(&self) -> bool {
        self.input_complete
    }

    /// Whether the input is complete and every character has been consumed.
    pub fn is_drained(&self) -> bool {
        self.input_complete && self.window().is_empty()
    }

    /// Unconsumed text visible to the matcher.
    pub fn window(&self) -> &str {
        &self.text[self.cursor..]
    }

    /// Text held back because its line is not yet complete.
    pub fn partial_line(&self) -> &str {
        &self.partial_line
    }

    /// Position of the next unconsumed character.
    pub fn location(&self) -> Location {
        self.tracker.location()
    }

    /// Full text of the current line, as far as it has been received.
    pub fn line_text(&self) -> String {
        let window = self.window();
        if window.contains(self.tracker.separator()) {
            self.tracker.line_text(window)
        } else {
            let mut rest = String::with_capacity(window.len() + self.partial_line.len());
            rest.push_str(window);
            rest.push_str(&self.partial_line);
            self.tracker.line_text(&rest)
        }
    }

    /// Returns up to `count` characters starting `offset` characters past
    /// the cursor, without consuming them.
    pub fn peek(&self, count: usize, offset: usize) -> Peek<'_> {
        let window = self.window();
        let start = byte_index(window, offset);
        let rest = &window[start..];
        let len = byte_index(rest, count);
        let text = &rest[..len];

        let availability = if text.chars().count() == count {
            Availability::Full
        } else if self.input_complete {
            Availability::EndOfInput
        } else {
            Availability::Starved
        };
        Peek { text, availability }
    }

    /// Removes up to `count` characters from the front of the window,
    /// updating the line and column.
    pub fn consume(&mut self, count: usize) -> Consumed {
        let len = byte_index(self.window(), count);
        let text = self.take(len);
        let exhausted = text.chars().count() < count;
        Consumed { text, exhausted }
    }

    /// Removes exactly `len` bytes from the front of the window.
    /// `len` must fall on a character boundary within the window.
    pub(crate) fn take(&mut self, len: usize) -> String {
        let end = self.cursor + len;
        let taken = self.text[self.cursor..end].to_string();
        self.tracker.advance(&taken);
        self.cursor = end;
        taken
    }

    fn compact(&mut self) {
        if self.cursor > 0 {
            self.text.drain(..self.cursor);
            self.cursor = 0;
        }
    }
}

/// Byte index just past the first `chars` characters of `text`, clipped to
/// its length.
fn byte_index(text: &str, chars: usize) -> usize {
    text.char_indices()
        .nth(chars)
        .map_or(text.len(), |(index, _)| index)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_line_is_held_back() {
        let mut buffer = ChunkBuffer::new("\n");
        buffer.append("let x");
        assert_eq!(buffer.window(), "");
        assert_eq!(buffer.partial_line(), "let x");

        buffer.append(" = 1;\nlet");
        assert_eq!(buffer.window(), "let x = 1;\n");
        assert_eq!(buffer.partial_line(), "let");

        buffer.finalize();
        assert_eq!(buffer.window(), "let x = 1;\nlet");
        assert_eq!(buffer.partial_line(), "");
    }

    #[test]
    fn test_split_two_character_separator() {
        let mut buffer = ChunkBuffer::new("\r\n");
        buffer.append("a\r");
        assert_eq!(buffer.window(), "");
        buffer.append("\nb");
        assert_eq!(buffer.window(), "a\r\n");
        assert_eq!(buffer.partial_line(), "b");
    }

    #[test]
    fn test_long_line_in_single_character_fragments() {
        let mut buffer = ChunkBuffer::new("\r\n");
        for _ in 0..20_000 {
            buffer.append("é");
        }
        buffer.append("\r");
        assert_eq!(buffer.window(), "");
        assert_eq!(buffer.partial_line().chars().count(), 20_001);

        buffer.append("\nx");
        assert_eq!(buffer.window().chars().count(), 20_002);
        assert!(buffer.window().ends_with("é\r\n"));
        assert_eq!(buffer.partial_line(), "x");
    }

    #[test]
    fn test_finalize_is_idempotent() {
        let mut buffer = ChunkBuffer::new("\n");
        buffer.append("abc");
        buffer.finalize();
        buffer.finalize();
        buffer.append("ignored");
        assert_eq!(buffer.window(), "abc");
    }

    #[test]
    fn test_consume_updates_position() {
        let mut buffer = ChunkBuffer::new("\n");
        buffer.append("ab\ncd\n");
        let consumed = buffer.consume(4);
        assert_eq!(consumed.text, "ab\nc");
        assert!(!consumed.exhausted);
        let location = buffer.location();
        assert_eq!((location.line, location.column, location.offset), (2, 2, 4));
    }

    #[test]
    fn test_consume_past_end_sets_exhausted() {
        let mut buffer = ChunkBuffer::new("\n");
        buffer.append("ab\n");
        let consumed = buffer.consume(10);
        assert_eq!(consumed.text, "ab\n");
        assert!(consumed.exhausted);
        assert_eq!(buffer.window(), "");
    }

    #[test]
    fn test_peek_distinguishes_starvation_from_end_of_input() {
        let mut buffer = ChunkBuffer::new("\n");
        buffer.append("ab\ncd");

        let peek = buffer.peek(2, 1);
        assert_eq!(peek.text, "b\n");
        assert_eq!(peek.availability, Availability::Full);

        let peek = buffer.peek(5, 0);
        assert_eq!(peek.text, "ab\n");
        assert_eq!(peek.availability, Availability::Starved);

        buffer.finalize();
        let peek = buffer.peek(10, 3);
        assert_eq!(peek.text, "cd");
        assert_eq!(peek.availability, Availability::EndOfInput);
    }

    #[test]
    fn test_peek_does_not_move_cursor() {
        let mut buffer = ChunkBuffer::new("\n");
        buffer.append("xyz\n");
        let first = buffer.peek(2, 0).text.to_string();
        let second = buffer.peek(2, 0).text.to_string();
        assert_eq!(first, second);
        assert_eq!(buffer.location().column, 1);
    }

    #[test]
    fn test_line_text_includes_held_back_text() {
        let mut buffer = ChunkBuffer::new("\n");
        buffer.append("first\n(1 @");
        buffer.consume(6);
        buffer.append(" 2)");
        assert_eq!(buffer.line_text(), "(1 @ 2)");
    }

    #[test]
    fn test_consumed_text_is_compacted_on_append() {
        let mut buffer = ChunkBuffer::new("\n");
        buffer.append("aaaa\n");
        buffer.consume(5);
        buffer.append("bb\n");
        assert_eq!(buffer.text, "bb\n");
        assert_eq!(buffer.cursor, 0);
    }
}
