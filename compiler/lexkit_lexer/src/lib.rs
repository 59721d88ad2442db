//! Streaming lexical analysis driven by rule tables
//!
//! This crate turns text that arrives in arbitrary fragments into a stream
//! of located tokens. Token kinds and the way to recognize them come from an
//! ordered [`RuleTable`]; the first rule that matches at the current
//! position wins. Text that no rule matches is reported as a [`LexError`]
//! and skipped one character at a time.
//!
//! Tokens can be pushed to an [`EventSink`] as input arrives, or pulled on
//! demand through [`StreamingLexer::peek`] and [`ChunkedLexer`].

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

pub mod chunk_buffer;
pub mod chunked_lexer;
pub mod decoder;
pub mod error;
pub mod line_tracker;
pub mod matcher;
pub mod rules;
pub mod streaming_lexer;
pub mod token;

// Re-export the main types for convenience
pub use chunk_buffer::{Availability, ChunkBuffer, Consumed, Peek};
pub use chunked_lexer::ChunkedLexer;
pub use decoder::{Decode, Utf8Decoder};
pub use error::{ConfigError, LexError, RuleError};
pub use line_tracker::LineTracker;
pub use rules::{Matcher, Pattern, Rule, RuleTable};
pub use streaming_lexer::{
    tokenize, tokenize_with_config, Callback, EventSink, Flow, LexEvent, LexState, Lexed,
    LexerConfig, StreamingLexer,
};
pub use token::{Location, Token};
