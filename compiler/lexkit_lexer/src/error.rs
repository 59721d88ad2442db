//! Error types.
//!
//! [`LexError`] records one recovery event: a character no rule could match.
//! It is a value handed to the caller, never a reason to stop lexing.
//! [`RuleError`] is returned when a rule table cannot be built, and
//! [`ConfigError`] when a lexer is given an unusable configuration.

use std::fmt::Write as _;

#[cfg(feature = "serde")]
use serde::Serialize;

use crate::token::Location;

/// One unmatched character, reported with the line it appeared on.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[cfg_attr(feature = "serde", derive(Serialize))]
#[error("unexpected character {offending:?} at {line}:{column}")]
pub struct LexError {
    /// Text of the offending line, as far as it was buffered
    pub line_text: String,
    /// The character that could not be matched
    pub offending: char,
    /// 1-based line of the character
    pub line: usize,
    /// 1-based column of the character
    pub column: usize,
}

impl LexError {
    /// Creates a new error at `location`.
    pub fn new<S: Into<String>>(line_text: S, offending: char, location: Location) -> Self {
        Self {
            line_text: line_text.into(),
            offending,
            line: location.line,
            column: location.column,
        }
    }

    /// Renders the error with the offending line and a caret under the
    /// offending column.
    ///
    /// ```text
    /// error: unexpected character '@' at 1:4
    ///   |
    /// 1 | (1 @ 2)
    ///   |    ^
    /// ```
    pub fn render(&self) -> String {
        let gutter = self.line.to_string().len();
        let mut out = String::new();
        let _ = writeln!(out, "error: {self}");
        let _ = writeln!(out, "{:gutter$} |", "");
        let _ = writeln!(out, "{} | {}", self.line, self.line_text);
        let _ = write!(
            out,
            "{:gutter$} | {:pad$}^",
            "",
            "",
            pad = self.column.saturating_sub(1)
        );
        out
    }
}

/// Errors raised while building a rule table.
#[derive(Debug, thiserror::Error)]
pub enum RuleError {
    /// A literal rule with no text would match everywhere.
    #[error("literal rule for {kind} is empty")]
    EmptyLiteral {
        /// Debug rendering of the rule's type tag
        kind: String,
    },

    /// A pattern rule could not be compiled.
    #[error("invalid pattern {pattern:?} for {kind}: {source}")]
    InvalidPattern {
        /// The pattern as written
        pattern: String,
        /// Debug rendering of the rule's type tag
        kind: String,
        /// The underlying regex error
        #[source]
        source: regex::Error,
    },
}

/// Errors raised when a lexer configuration is rejected.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    /// Lines cannot be told apart without a separator.
    #[error("line separator must not be empty")]
    EmptySeparator,
}

impl From<ConfigError> for std::io::Error {
    fn from(err: ConfigError) -> Self {
        std::io::Error::new(std::io::ErrorKind::InvalidInput, err)
    }
}
