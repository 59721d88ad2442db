//! Line and column bookkeeping for consumed text.

use crate::token::Location;

/// Tracks line and column numbers as text is consumed.
///
/// Also keeps the part of the current line that has already been consumed,
/// so an error can still show the whole line after its start has left the
/// buffer.
#[derive(Debug, Clone)]
pub struct LineTracker {
    separator: String,
    location: Location,
    current_line_start: String,
}

impl LineTracker {
    /// Creates a tracker at 1:1 for lines ending in `separator`.
    /// An empty separator never ends a line.
    pub fn new<S: Into<String>>(separator: S) -> Self {
        let separator = separator.into();
        Self {
            separator,
            location: Location::default(),
            current_line_start: String::new(),
        }
    }

    /// The line separator.
    pub fn separator(&self) -> &str {
        &self.separator
    }

    /// Position of the next unconsumed character.
    pub fn location(&self) -> Location {
        self.location
    }

    /// The already-consumed prefix of the current line.
    pub fn current_line_start(&self) -> &str {
        &self.current_line_start
    }

    /// Advances past `span`.
    ///
    /// A separator split across two consecutive spans (e.g. `"\r"` then
    /// `"\n"` for a `"\r\n"` separator) is counted once the second half
    /// arrives.
    pub fn advance(&mut self, span: &str) {
        if span.is_empty() {
            return;
        }
        self.location.offset += span.len();
        if self.separator.is_empty() {
            self.location.column += span.chars().count();
            self.current_line_start.push_str(span);
            return;
        }

        // Bytes of the line so far that could start a separator finishing in `span`.
        let mut carry = self
            .current_line_start
            .len()
            .saturating_sub(self.separator.len().saturating_sub(1));
        while !self.current_line_start.is_char_boundary(carry) {
            carry -= 1;
        }
        let carried = &self.current_line_start[carry..];

        let mut joined = String::with_capacity(carried.len() + span.len());
        joined.push_str(carried);
        joined.push_str(span);

        let lines = joined.matches(self.separator.as_str()).count();
        if lines == 0 {
            self.location.column += span.chars().count();
            self.current_line_start.push_str(span);
        } else {
            let tail = joined
                .rsplit(self.separator.as_str())
                .next()
                .unwrap_or_default();
            self.location.line += lines;
            self.location.column = 1 + tail.chars().count();
            self.current_line_start = tail.to_string();
        }
    }

    /// Text of the current line: the consumed prefix followed by `rest` up
    /// to, but not including, the next separator.
    pub fn line_text(&self, rest: &str) -> String {
        let upcoming = rest
            .split(self.separator.as_str())
            .next()
            .unwrap_or_default();
        let mut line = String::with_capacity(self.current_line_start.len() + upcoming.len());
        line.push_str(&self.current_line_start);
        line.push_str(upcoming);
        line
    }
}
