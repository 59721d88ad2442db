use std::fmt;

#[cfg(feature = "serde")]
use serde::Serialize;

/// Represents a token's location in the source text.
///
/// Line and column are 1-based; the column counts characters, not bytes.
/// The offset is the 0-based byte offset from the start of the input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct Location {
    /// The 1-based line number
    pub line: usize,
    /// The 1-based column number, in characters
    pub column: usize,
    /// The 0-based byte offset from the start of the input
    pub offset: usize,
}

impl Default for Location {
    fn default() -> Self {
        Self {
            line: 1,
            column: 1,
            offset: 0,
        }
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// A classified, positioned slice of source text.
///
/// `K` is the token-type tag supplied by the rule table. A token owns its
/// text and keeps no reference back into the lexer that produced it.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct Token<K> {
    /// The exact matched text; never empty
    pub text: String,
    /// The type tag of the rule that matched
    #[cfg_attr(feature = "serde", serde(rename = "type"))]
    pub kind: K,
    /// Where the match started
    #[cfg_attr(feature = "serde", serde(flatten))]
    pub location: Location,
}

impl<K> Token<K> {
    /// Creates a new token.
    pub fn new<S: Into<String>>(kind: K, text: S, location: Location) -> Self {
        Self {
            text: text.into(),
            kind,
            location,
        }
    }

    /// The 1-based line on which the token starts.
    pub fn line(&self) -> usize {
        self.location.line
    }

    /// The 1-based column at which the token starts.
    pub fn column(&self) -> usize {
        self.location.column
    }

    /// Location immediately after this token, derived from its text.
    pub fn end_location(&self, separator: &str) -> Location {
        let mut end = self.location;
        let lines = self.text.matches(separator).count();
        if lines > 0 {
            let tail = self.text.rsplit(separator).next().unwrap_or("");
            end.line += lines;
            end.column = 1 + tail.chars().count();
        } else {
            end.column += self.text.chars().count();
        }
        end.offset += self.text.len();
        end
    }
}

impl<K: fmt::Debug> fmt::Display for Token<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}({:?})@{}", self.kind, self.text, self.location)
    }
}
