//! A pull-based lexer that reads its input on demand.
//!
//! The `ChunkedLexer` wraps a [`StreamingLexer`] around any
//! [`Read`](std::io::Read) source. Tokens are produced only when a caller
//! asks for them, and the source is read one chunk at a time only when the
//! buffered text cannot satisfy the request, so large files are never
//! loaded whole.
//!
//! # Examples
//!
//! ```no_run
//! use lexkit_lexer::{ChunkedLexer, LexerConfig, RuleTable};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let rules = RuleTable::new()
//!     .pattern("[A-Za-z_][A-Za-z0-9_]*", "IDENT")?
//!     .pattern(r"\s+", "WS")?
//!     .trivia("WS");
//! let config = LexerConfig {
//!     include_trivia: false,
//!     ..LexerConfig::default()
//! };
//!
//! let mut lexer = ChunkedLexer::from_file(&rules, "large_file.txt", config)?;
//! while let Some(token) = lexer.consume(1).pop() {
//!     println!("{token}");
//! }
//! for error in lexer.errors() {
//!     eprintln!("{}", error.render());
//! }
//! # Ok(())
//! # }
//! ```

use std::fs::File;
use std::io::{self, BufReader, ErrorKind, Read};
use std::path::Path;

use log::{debug, error};

use crate::decoder::Utf8Decoder;
use crate::error::{ConfigError, LexError};
use crate::rules::RuleTable;
use crate::streaming_lexer::{LexState, LexerConfig, StreamingLexer};
use crate::token::{Location, Token};

/// Smallest and largest read sizes accepted from the configuration.
const MIN_CHUNK_SIZE: usize = 1;
const MAX_CHUNK_SIZE: usize = 1_048_576;

/// A lexer that pulls input from a reader as tokens are requested.
pub struct ChunkedLexer<'r, K, R> {
    lexer: StreamingLexer<'r, K, Utf8Decoder>,
    source: R,
    chunk: Vec<u8>,
    io_error: Option<io::Error>,
}

impl<'r, K, R> ChunkedLexer<'r, K, R>
where
    K: Clone + PartialEq,
    R: Read,
{
    /// Create a new chunked lexer from any reader
    pub fn from_reader(
        rules: &'r RuleTable<K>,
        reader: R,
        config: LexerConfig,
    ) -> Result<Self, ConfigError> {
        let chunk_size = config.chunk_size.clamp(MIN_CHUNK_SIZE, MAX_CHUNK_SIZE);
        Ok(Self {
            lexer: StreamingLexer::with_config(rules, config)?,
            source: reader,
            chunk: vec![0; chunk_size],
            io_error: None,
        })
    }

    /// Returns up to `count` tokens starting `offset` tokens ahead without
    /// consuming them. Reads from the source as needed; returns fewer
    /// tokens only at the end of the input.
    pub fn peek(&mut self, count: usize, offset: usize) -> &[Token<K>] {
        let wanted = offset.saturating_add(count);
        loop {
            let available = self.lexer.peek(count, offset).len();
            let satisfied = available == count || wanted == 0;
            if satisfied || self.lexer.state() == LexState::Complete {
                break;
            }
            self.read_chunk();
        }
        self.lexer.peek(count, offset)
    }

    /// Removes and returns up to `count` tokens.
    pub fn consume(&mut self, count: usize) -> Vec<Token<K>> {
        let available = self.peek(count, 0).len();
        self.lexer.consume(available)
    }

    /// Whether every token has been produced and consumed.
    pub fn is_exhausted(&self) -> bool {
        self.lexer.is_exhausted()
    }

    /// Errors recorded so far, in the order they were encountered.
    pub fn errors(&self) -> &[LexError] {
        self.lexer.errors()
    }

    /// Removes and returns the recorded errors.
    pub fn take_errors(&mut self) -> Vec<LexError> {
        self.lexer.take_errors()
    }

    /// Position of the next character to be scanned.
    pub fn location(&self) -> Location {
        self.lexer.location()
    }

    /// Takes the read error that ended the input early, if any.
    pub fn take_io_error(&mut self) -> Option<io::Error> {
        self.io_error.take()
    }

    /// Process the entire input and return all tokens as a vector
    ///
    /// This is a convenience method that consumes the lexer and returns all
    /// tokens. For very large inputs, consider using the iterator interface
    /// instead to avoid holding all tokens in memory at once.
    pub fn into_tokens(self) -> Vec<Token<K>> {
        self.collect()
    }

    /// Reads one chunk into the lexer, finishing the input at end of file
    /// or on a read failure.
    fn read_chunk(&mut self) {
        loop {
            match self.source.read(&mut self.chunk) {
                Ok(0) => {
                    debug!("reached end of input at {}", self.lexer.location());
                    self.lexer.finish();
                }
                Ok(n) => self.lexer.write_bytes(&self.chunk[..n]),
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => {
                    error!("Error reading from source: {e}");
                    self.io_error = Some(e);
                    self.lexer.finish();
                }
            }
            return;
        }
    }
}

impl<'r, K> ChunkedLexer<'r, K, BufReader<File>>
where
    K: Clone + PartialEq,
{
    /// Create a new chunked lexer from a file path. An invalid
    /// configuration is reported as [`ErrorKind::InvalidInput`].
    pub fn from_file<P: AsRef<Path>>(
        rules: &'r RuleTable<K>,
        path: P,
        config: LexerConfig,
    ) -> io::Result<Self> {
        config.validate()?;
        let file = File::open(path)?;
        Self::from_reader(rules, BufReader::new(file), config).map_err(io::Error::from)
    }
}

impl<K, R> Iterator for ChunkedLexer<'_, K, R>
where
    K: Clone + PartialEq,
    R: Read,
{
    type Item = Token<K>;

    fn next(&mut self) -> Option<Self::Item> {
        self.consume(1).pop()
    }
}
