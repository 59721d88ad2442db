//! The lexing state machine.
//!
//! [`StreamingLexer`] owns the buffered input and its position and turns it
//! into [`Token`]s and [`LexError`]s one step at a time. The same state
//! serves two ways of consuming tokens:
//!
//! - **push**: write fragments as they arrive and drain every event that can
//!   be produced so far into an [`EventSink`], which may pause the drain;
//! - **pull**: ask for `count` tokens with [`peek`](StreamingLexer::peek) and
//!   [`consume`](StreamingLexer::consume); tokens produced by a peek are kept
//!   in a backlog so repeated peeks do not rescan text.
//!
//! Switching from pull to push mode loses nothing: errors met while a peek
//! filled the backlog are reported as events in their place among the
//! backlog tokens. Errors that lie between tokens already taken with
//! `consume` are only available from [`errors`](StreamingLexer::errors).
//!
//! ```
//! use lexkit_lexer::{LexEvent, RuleTable, StreamingLexer};
//!
//! let rules = RuleTable::new()
//!     .literal("(", "LPAREN")?
//!     .literal(")", "RPAREN")?
//!     .pattern("[0-9]+", "NUM")?
//!     .pattern(r"\s+", "WS")?;
//!
//! let mut lexer = StreamingLexer::new(&rules);
//! let mut events: Vec<LexEvent<&str>> = Vec::new();
//! lexer.feed("(1 ", &mut events);
//! lexer.feed("2)", &mut events);
//! lexer.close(&mut events);
//!
//! let kinds: Vec<_> = events
//!     .iter()
//!     .filter_map(|event| match event {
//!         LexEvent::Token(token) => Some(token.kind),
//!         _ => None,
//!     })
//!     .collect();
//! assert_eq!(kinds, ["LPAREN", "NUM", "WS", "NUM", "RPAREN"]);
//! assert!(matches!(events.last(), Some(LexEvent::End)));
//! # Ok::<(), lexkit_lexer::RuleError>(())
//! ```

use std::collections::VecDeque;
use std::fmt;

use log::{debug, trace};

use crate::chunk_buffer::ChunkBuffer;
use crate::decoder::{Decode, Utf8Decoder};
use crate::error::{ConfigError, LexError};
use crate::matcher::{self, Selection};
use crate::rules::RuleTable;
use crate::token::{Location, Token};

/// Configuration for the lexer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LexerConfig {
    /// Sequence that ends a line
    pub line_separator: String,
    /// Whether tokens of trivia kinds are emitted
    pub include_trivia: bool,
    /// Size of each upstream read in bytes, for readers that pull input
    pub chunk_size: usize,
}

impl LexerConfig {
    /// Checks that a lexer can run with this configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.line_separator.is_empty() {
            return Err(ConfigError::EmptySeparator);
        }
        Ok(())
    }
}

impl Default for LexerConfig {
    fn default() -> Self {
        Self {
            line_separator: "\n".to_string(),
            include_trivia: true,
            chunk_size: 8 * 1024, // 8KB chunks by default
        }
    }
}

/// Where the lexer is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LexState {
    /// Producing tokens from buffered text.
    Scanning,
    /// Buffered text cannot resolve the next token; more input is needed.
    AwaitingInput,
    /// Input is finalized and every character has been consumed.
    Complete,
}

/// Something the lexer reports in push mode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LexEvent<K> {
    /// A matched token.
    Token(Token<K>),
    /// A character no rule matched. It has been skipped.
    Error(LexError),
    /// End of the token stream. Reported exactly once.
    End,
}

/// Whether a sink wants more events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    /// Keep sending.
    Continue,
    /// Stop after this event; the lexer resumes where it left off on the
    /// next drain.
    Pause,
}

/// Receives events in push mode.
pub trait EventSink<K> {
    /// Takes one event and says whether to keep going.
    fn accept(&mut self, event: LexEvent<K>) -> Flow;
}

impl<K> EventSink<K> for Vec<LexEvent<K>> {
    fn accept(&mut self, event: LexEvent<K>) -> Flow {
        self.push(event);
        Flow::Continue
    }
}

/// Adapts a closure into an [`EventSink`].
pub struct Callback<F>(pub F);

impl<K, F> EventSink<K> for Callback<F>
where
    F: FnMut(LexEvent<K>) -> Flow,
{
    fn accept(&mut self, event: LexEvent<K>) -> Flow {
        (self.0)(event)
    }
}

enum Step<K> {
    Token(Token<K>),
    Error(LexError),
    Starved,
    Finished,
}

/// A lexer fed with input fragments.
pub struct StreamingLexer<'r, K, D = Utf8Decoder> {
    rules: &'r RuleTable<K>,
    config: LexerConfig,
    buffer: ChunkBuffer,
    decoder: D,
    state: LexState,
    end_reported: bool,
    /// Tokens produced for `peek` but not yet consumed
    backlog: VecDeque<Token<K>>,
    /// Errors met while filling the backlog, each with the number of
    /// backlog tokens ahead of it
    deferred_errors: VecDeque<(usize, LexError)>,
    errors: Vec<LexError>,
}

impl<'r, K> StreamingLexer<'r, K, Utf8Decoder>
where
    K: Clone + PartialEq,
{
    /// Create a new lexer with default configuration
    pub fn new(rules: &'r RuleTable<K>) -> Self {
        Self::build(rules, LexerConfig::default(), Utf8Decoder::new())
    }

    /// Create a new lexer with custom configuration
    pub fn with_config(
        rules: &'r RuleTable<K>,
        config: LexerConfig,
    ) -> Result<Self, ConfigError> {
        Self::with_decoder(rules, config, Utf8Decoder::new())
    }
}

impl<'r, K, D> StreamingLexer<'r, K, D>
where
    K: Clone + PartialEq,
    D: Decode,
{
    /// Create a new lexer that decodes bytes with `decoder`
    pub fn with_decoder(
        rules: &'r RuleTable<K>,
        config: LexerConfig,
        decoder: D,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self::build(rules, config, decoder))
    }

    fn build(rules: &'r RuleTable<K>, config: LexerConfig, decoder: D) -> Self {
        let buffer = ChunkBuffer::new(config.line_separator.clone());
        Self {
            rules,
            config,
            buffer,
            decoder,
            state: LexState::Scanning,
            end_reported: false,
            backlog: VecDeque::new(),
            deferred_errors: VecDeque::new(),
            errors: Vec::new(),
        }
    }

    /// The configuration this lexer was built with.
    pub fn config(&self) -> &LexerConfig {
        &self.config
    }

    /// Current lifecycle state.
    pub fn state(&self) -> LexState {
        self.state
    }

    /// Position of the next character to be scanned.
    pub fn location(&self) -> Location {
        self.buffer.location()
    }

    /// Appends a fragment of decoded text. Ignored after [`finish`](Self::finish).
    pub fn write(&mut self, fragment: &str) {
        if self.buffer.is_input_complete() {
            return;
        }
        self.buffer.append(fragment);
        self.state = LexState::Scanning;
    }

    /// Decodes `bytes` and appends the result.
    pub fn write_bytes(&mut self, bytes: &[u8]) {
        if self.buffer.is_input_complete() {
            return;
        }
        let text = self.decoder.decode(bytes);
        self.write(&text);
    }

    /// Signals end of input. Held-back text is flushed into the buffer so
    /// it can still be scanned. Calling it again has no effect.
    pub fn finish(&mut self) {
        if self.buffer.is_input_complete() {
            return;
        }
        let tail = self.decoder.finish();
        self.buffer.append(&tail);
        self.buffer.finalize();
        if self.state == LexState::AwaitingInput {
            self.state = LexState::Scanning;
        }
        debug!(
            "input finished with {} unscanned bytes at {}",
            self.buffer.window().len(),
            self.buffer.location()
        );
    }

    /// Produces the next event, or `None` when more input is needed or the
    /// stream has ended.
    pub fn next_event(&mut self) -> Option<LexEvent<K>> {
        if self.deferred_errors.front().is_some_and(|(ahead, _)| *ahead == 0) {
            if let Some((_, error)) = self.deferred_errors.pop_front() {
                return Some(LexEvent::Error(error));
            }
        }
        if let Some(token) = self.backlog.pop_front() {
            self.pass_deferred_errors(1);
            return Some(LexEvent::Token(token));
        }
        match self.scan() {
            Step::Token(token) => Some(LexEvent::Token(token)),
            Step::Error(error) => Some(LexEvent::Error(error)),
            Step::Starved => None,
            Step::Finished if self.end_reported => None,
            Step::Finished => {
                self.end_reported = true;
                Some(LexEvent::End)
            }
        }
    }

    /// Sends every event that can be produced now to `sink`, stopping early
    /// if the sink pauses.
    pub fn drain_into<S>(&mut self, sink: &mut S) -> Flow
    where
        S: EventSink<K> + ?Sized,
    {
        while let Some(event) = self.next_event() {
            if sink.accept(event) == Flow::Pause {
                trace!("sink paused at {}", self.buffer.location());
                return Flow::Pause;
            }
        }
        Flow::Continue
    }

    /// Writes `fragment`, then drains into `sink`.
    pub fn feed<S>(&mut self, fragment: &str, sink: &mut S) -> Flow
    where
        S: EventSink<K> + ?Sized,
    {
        self.write(fragment);
        self.drain_into(sink)
    }

    /// Finishes the input, then drains into `sink`.
    pub fn close<S>(&mut self, sink: &mut S) -> Flow
    where
        S: EventSink<K> + ?Sized,
    {
        self.finish();
        self.drain_into(sink)
    }

    /// Returns up to `count` tokens starting `offset` tokens ahead, without
    /// consuming them.
    ///
    /// Fewer tokens are returned when the input ends or when more input is
    /// needed; [`state`](Self::state) tells the two apart.
    pub fn peek(&mut self, count: usize, offset: usize) -> &[Token<K>] {
        let wanted = offset.saturating_add(count);
        while self.backlog.len() < wanted {
            match self.scan() {
                Step::Token(token) => self.backlog.push_back(token),
                Step::Error(error) => self.deferred_errors.push_back((self.backlog.len(), error)),
                Step::Starved | Step::Finished => break,
            }
        }
        let tokens = self.backlog.make_contiguous();
        let start = offset.min(tokens.len());
        let end = wanted.min(tokens.len());
        &tokens[start..end]
    }

    /// Removes and returns up to `count` tokens.
    pub fn consume(&mut self, count: usize) -> Vec<Token<K>> {
        let available = self.peek(count, 0).len();
        self.pass_deferred_errors(available);
        self.backlog.drain(..available).collect()
    }

    /// Whether every token has been produced and consumed.
    pub fn is_exhausted(&self) -> bool {
        self.buffer.is_drained() && self.backlog.is_empty()
    }

    /// Errors recorded so far, in the order they were encountered.
    pub fn errors(&self) -> &[LexError] {
        &self.errors
    }

    /// Removes and returns the recorded errors.
    pub fn take_errors(&mut self) -> Vec<LexError> {
        std::mem::take(&mut self.errors)
    }

    /// Accounts for `taken` tokens leaving the front of the backlog. Errors
    /// that sat between them are dropped.
    fn pass_deferred_errors(&mut self, taken: usize) {
        self.deferred_errors.retain_mut(|(ahead, _)| {
            let kept = *ahead >= taken;
            *ahead = ahead.saturating_sub(taken);
            kept
        });
    }

    fn scan(&mut self) -> Step<K> {
        let rules = self.rules;
        loop {
            if self.state == LexState::Complete {
                return Step::Finished;
            }

            let window = self.buffer.window();
            let complete = self.buffer.is_input_complete();
            if window.is_empty() {
                if complete {
                    debug!("lexing complete at {}", self.buffer.location());
                    self.state = LexState::Complete;
                    return Step::Finished;
                }
                self.state = LexState::AwaitingInput;
                return Step::Starved;
            }

            let location = self.buffer.location();
            match matcher::select(rules, window, complete) {
                Selection::Found { rule, len } => {
                    let kind = rules.rules()[rule].kind.clone();
                    let text = self.buffer.take(len);
                    self.state = LexState::Scanning;
                    if !self.config.include_trivia && rules.is_trivia(&kind) {
                        continue;
                    }
                    trace!("token {:?} at {}", text, location);
                    return Step::Token(Token::new(kind, text, location));
                }
                Selection::NeedInput => {
                    debug!("awaiting input at {location}");
                    self.state = LexState::AwaitingInput;
                    return Step::Starved;
                }
                Selection::NoMatch => {
                    let offending = window.chars().next().unwrap_or(char::REPLACEMENT_CHARACTER);
                    let error = LexError::new(self.buffer.line_text(), offending, location);
                    debug!("no rule matches {offending:?} at {location}, skipping it");
                    self.buffer.take(offending.len_utf8());
                    self.state = LexState::Scanning;
                    self.errors.push(error.clone());
                    return Step::Error(error);
                }
            }
        }
    }
}

impl<K, D> Iterator for StreamingLexer<'_, K, D>
where
    K: Clone + PartialEq,
    D: Decode,
{
    type Item = LexEvent<K>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_event()
    }
}

impl<K: fmt::Debug, D> fmt::Debug for StreamingLexer<'_, K, D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StreamingLexer")
            .field("state", &self.state)
            .field("location", &self.buffer.location())
            .field("backlog", &self.backlog.len())
            .field("errors", &self.errors.len())
            .finish()
    }
}

/// Tokens and errors from lexing a complete input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Lexed<K> {
    /// Every token, in order
    pub tokens: Vec<Token<K>>,
    /// Every error, in order
    pub errors: Vec<LexError>,
}

/// Lexes `input` as one complete fragment.
pub fn tokenize<K>(rules: &RuleTable<K>, input: &str) -> Lexed<K>
where
    K: Clone + PartialEq,
{
    lex_all(StreamingLexer::new(rules), input)
}

/// Lexes `input` as one complete fragment with a custom configuration.
pub fn tokenize_with_config<K>(
    rules: &RuleTable<K>,
    input: &str,
    config: LexerConfig,
) -> Result<Lexed<K>, ConfigError>
where
    K: Clone + PartialEq,
{
    Ok(lex_all(StreamingLexer::with_config(rules, config)?, input))
}

fn lex_all<K>(mut lexer: StreamingLexer<'_, K>, input: &str) -> Lexed<K>
where
    K: Clone + PartialEq,
{
    lexer.write(input);
    lexer.finish();
    let tokens = lexer.consume(usize::MAX);
    Lexed {
        tokens,
        errors: lexer.take_errors(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    enum Kind {
        LParen,
        RParen,
        Num,
        Ws,
    }

    fn rules() -> RuleTable<Kind> {
        RuleTable::new()
            .literal("(", Kind::LParen)
            .and_then(|t| t.literal(")", Kind::RParen))
            .and_then(|t| t.pattern("[0-9]+", Kind::Num))
            .and_then(|t| t.pattern(r"\s+", Kind::Ws))
            .unwrap()
            .trivia(Kind::Ws)
    }

    fn kinds(tokens: &[Token<Kind>]) -> Vec<Kind> {
        tokens.iter().map(|t| t.kind).collect()
    }

    #[test]
    fn test_streaming_lexer() {
        let rules = rules();
        let lexed = tokenize(&rules, "(1 2)");
        assert_eq!(
            kinds(&lexed.tokens),
            [Kind::LParen, Kind::Num, Kind::Ws, Kind::Num, Kind::RParen]
        );
        assert!(lexed.errors.is_empty());
        assert_eq!(lexed.tokens[3].text, "2");
        assert_eq!(lexed.tokens[3].column(), 4);
    }

    #[test]
    fn test_awaits_input_without_separator() {
        let rules = rules();
        let mut lexer = StreamingLexer::new(&rules);
        lexer.write("(12");
        assert_eq!(lexer.next_event(), None);
        assert_eq!(lexer.state(), LexState::AwaitingInput);

        lexer.write("3)\n");
        let event = lexer.next_event();
        assert!(matches!(event, Some(LexEvent::Token(ref t)) if t.kind == Kind::LParen));
        let event = lexer.next_event();
        assert!(matches!(event, Some(LexEvent::Token(ref t)) if t.text == "123"));
    }

    #[test]
    fn test_end_reported_once() {
        let rules = rules();
        let mut lexer = StreamingLexer::new(&rules);
        let mut events: Vec<LexEvent<Kind>> = Vec::new();
        lexer.feed("()", &mut events);
        lexer.close(&mut events);
        lexer.close(&mut events);
        lexer.finish();
        assert_eq!(lexer.drain_into(&mut events), Flow::Continue);

        let ends = events.iter().filter(|e| matches!(e, LexEvent::End)).count();
        assert_eq!(ends, 1);
        assert_eq!(events.len(), 3);
        assert_eq!(lexer.state(), LexState::Complete);
    }

    #[test]
    fn test_sink_pause_resumes_in_place() {
        let rules = rules();
        let mut lexer = StreamingLexer::new(&rules);
        lexer.write("(1)(2)\n");

        let mut seen = Vec::new();
        let flow = lexer.drain_into(&mut Callback(|event: LexEvent<Kind>| {
            seen.push(event);
            Flow::Pause
        }));
        assert_eq!(flow, Flow::Pause);
        assert_eq!(seen.len(), 1);

        let mut rest: Vec<LexEvent<Kind>> = Vec::new();
        lexer.close(&mut rest);
        let texts: Vec<_> = rest
            .iter()
            .filter_map(|e| match e {
                LexEvent::Token(t) => Some(t.text.as_str()),
                _ => None,
            })
            .collect();
        assert_eq!(texts, ["1", ")", "(", "2", ")", "\n"]);
    }

    #[test]
    fn test_skip_trivia() {
        let rules = rules();
        let config = LexerConfig {
            include_trivia: false,
            ..LexerConfig::default()
        };
        let lexed = tokenize_with_config(&rules, "( 1\n 2 )", config).unwrap();
        assert_eq!(
            kinds(&lexed.tokens),
            [Kind::LParen, Kind::Num, Kind::Num, Kind::RParen]
        );
        assert_eq!(lexed.tokens[2].line(), 2);
        assert_eq!(lexed.tokens[2].column(), 2);
    }

    #[test]
    fn test_peek_then_consume() {
        let rules = rules();
        let mut lexer = StreamingLexer::new(&rules);
        lexer.write("(1 2)");
        lexer.finish();

        assert_eq!(kinds(lexer.peek(2, 1)), [Kind::Num, Kind::Ws]);
        assert_eq!(kinds(lexer.peek(1, 0)), [Kind::LParen]);
        assert_eq!(kinds(&lexer.consume(2)), [Kind::LParen, Kind::Num]);
        assert_eq!(kinds(&lexer.consume(10)), [Kind::Ws, Kind::Num, Kind::RParen]);
        assert!(lexer.is_exhausted());
        assert!(lexer.consume(1).is_empty());
        assert!(lexer.peek(3, 0).is_empty());
    }

    #[test]
    fn test_bytes_split_inside_character() {
        let rules = RuleTable::new().pattern(r"\w+", "WORD").unwrap();
        let mut lexer = StreamingLexer::new(&rules);
        let input = "caf\u{00e9}".as_bytes();
        lexer.write_bytes(&input[..4]);
        lexer.write_bytes(&input[4..]);
        lexer.finish();
        let tokens = lexer.consume(usize::MAX);
        assert_eq!(tokens.len(), 1);
        assert_eq!(tokens[0].text, "caf\u{00e9}");
    }

    #[test]
    fn test_empty_separator_is_rejected() {
        let rules = rules();
        let config = LexerConfig {
            line_separator: String::new(),
            ..LexerConfig::default()
        };
        assert_eq!(config.validate(), Err(ConfigError::EmptySeparator));
        assert!(StreamingLexer::with_config(&rules, config.clone()).is_err());
        assert_eq!(
            tokenize_with_config(&rules, "ab", config).unwrap_err(),
            ConfigError::EmptySeparator
        );
        assert_eq!(LexerConfig::default().validate(), Ok(()));
    }

    #[test]
    fn test_errors_found_while_peeking_reach_the_event_stream() {
        let rules = rules();
        let mut lexer = StreamingLexer::new(&rules);
        lexer.write("(1 @ 2)");
        lexer.finish();
        assert_eq!(lexer.peek(10, 0).len(), 6);

        let events: Vec<_> = lexer.by_ref().collect();
        let shape: Vec<String> = events
            .iter()
            .map(|event| match event {
                LexEvent::Token(t) => t.text.clone(),
                LexEvent::Error(e) => format!("error {}", e.offending),
                LexEvent::End => "end".to_string(),
            })
            .collect();
        assert_eq!(shape, ["(", "1", " ", "error @", " ", "2", ")", "end"]);
        assert_eq!(lexer.errors().len(), 1);
    }

    #[test]
    fn test_consumed_errors_are_not_replayed_as_events() {
        let rules = rules();
        let mut lexer = StreamingLexer::new(&rules);
        lexer.write("(1 @ 2) # 3");
        lexer.finish();
        lexer.peek(10, 0);
        assert_eq!(lexer.consume(4).len(), 4);

        let mut events: Vec<LexEvent<Kind>> = Vec::new();
        lexer.drain_into(&mut events);
        let errors: Vec<char> = events
            .iter()
            .filter_map(|event| match event {
                LexEvent::Error(e) => Some(e.offending),
                _ => None,
            })
            .collect();
        assert_eq!(errors, ['#']);
        assert!(matches!(events[0], LexEvent::Token(ref t) if t.text == "2"));
        assert_eq!(lexer.errors().len(), 2);
    }
}
