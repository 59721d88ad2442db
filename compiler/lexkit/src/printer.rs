//! Writes lexer events as text or JSON lines.

use std::fmt::Display;
use std::io::{self, Write};

use clap::ValueEnum;
use lexkit_lexer::{EventSink, Flow, LexEvent, Token};
use serde::Serialize;

/// How tokens are written.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputMode {
    /// `line:column KIND "text"`
    Text,
    /// One JSON object per line
    Json,
}

/// Totals for a finished run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Summary {
    /// Tokens written
    pub tokens: usize,
    /// Errors reported
    pub errors: usize,
}

/// An [`EventSink`] that prints tokens to `out` and rendered errors to `err`.
///
/// A failed write pauses the lexer; the failure is returned by
/// [`finish`](Self::finish).
pub struct TokenPrinter<W, E> {
    out: W,
    err: E,
    mode: OutputMode,
    summary: Summary,
    failure: Option<io::Error>,
}

impl<W: Write, E: Write> TokenPrinter<W, E> {
    /// Creates a printer writing in `mode`.
    pub fn new(out: W, err: E, mode: OutputMode) -> Self {
        Self {
            out,
            err,
            mode,
            summary: Summary::default(),
            failure: None,
        }
    }

    /// Counts so far.
    pub fn summary(&self) -> Summary {
        self.summary
    }

    /// Whether a write has failed.
    pub fn has_failed(&self) -> bool {
        self.failure.is_some()
    }

    /// Flushes both writers and returns the writers, or the first write
    /// error.
    pub fn finish(mut self) -> io::Result<(W, E)> {
        if let Some(e) = self.failure.take() {
            return Err(e);
        }
        self.out.flush()?;
        self.err.flush()?;
        Ok((self.out, self.err))
    }

    fn write_token<K: Display + Serialize>(&mut self, token: &Token<K>) -> io::Result<()> {
        match self.mode {
            OutputMode::Text => writeln!(
                self.out,
                "{} {} {:?}",
                token.location, token.kind, token.text
            ),
            OutputMode::Json => {
                serde_json::to_writer(&mut self.out, token)?;
                self.out.write_all(b"\n")
            }
        }
    }
}

impl<K, W, E> EventSink<K> for TokenPrinter<W, E>
where
    K: Display + Serialize,
    W: Write,
    E: Write,
{
    fn accept(&mut self, event: LexEvent<K>) -> Flow {
        let written = match &event {
            LexEvent::Token(token) => {
                self.summary.tokens += 1;
                self.write_token(token)
            }
            LexEvent::Error(error) => {
                self.summary.errors += 1;
                writeln!(self.err, "{}", error.render())
            }
            LexEvent::End => self.out.flush(),
        };
        match written {
            Ok(()) => Flow::Continue,
            Err(e) => {
                log::error!("cannot write output: {e}");
                self.failure = Some(e);
                Flow::Pause
            }
        }
    }
}
