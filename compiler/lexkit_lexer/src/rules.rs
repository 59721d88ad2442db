//! Rule tables.
//!
//! A [`RuleTable`] is an ordered list of rules, each pairing a literal or a
//! regular expression with a token-type tag. Order is priority: the first
//! rule that matches at the current position wins even when a later rule
//! would match more text.
//!
//! ```
//! use lexkit_lexer::RuleTable;
//!
//! #[derive(Debug, Clone, Copy, PartialEq, Eq)]
//! enum Kind { LParen, RParen, Num, Ws }
//!
//! let rules = RuleTable::new()
//!     .literal("(", Kind::LParen)?
//!     .literal(")", Kind::RParen)?
//!     .pattern("[0-9]+", Kind::Num)?
//!     .pattern(r"\s+", Kind::Ws)?
//!     .trivia(Kind::Ws);
//! assert_eq!(rules.len(), 4);
//! # Ok::<(), lexkit_lexer::RuleError>(())
//! ```

use std::fmt;

use log::debug;
use regex::{Regex, RegexBuilder};
use regex_automata::dfa::{dense, StartKind};

use crate::error::RuleError;

/// A compiled regular expression, anchored at the scan position.
pub struct Pattern {
    source: String,
    /// Matches only at the start of the haystack.
    pub(crate) regex: Regex,
    /// Same language as `regex`, used to tell whether more input could
    /// still change the outcome. `None` when the pattern uses features the
    /// DFA builder rejects; such a pattern waits for the end of input.
    pub(crate) prefix_dfa: Option<dense::DFA<Vec<u32>>>,
}

impl Pattern {
    /// Compiles `source` as a pattern anchored at the scan position.
    pub fn new(source: &str) -> Result<Self, regex::Error> {
        let anchored = format!("^(?:{source})");
        let regex = RegexBuilder::new(&anchored).build()?;
        let prefix_dfa = match dense::Builder::new()
            .configure(
                dense::Config::new()
                    .start_kind(StartKind::Anchored)
                    .unicode_word_boundary(true),
            )
            .build(&anchored)
        {
            Ok(dfa) => Some(dfa),
            Err(err) => {
                debug!("pattern {source:?} has no prefix DFA, it will wait for the end of input: {err}");
                None
            }
        };
        Ok(Self {
            source: source.to_string(),
            regex,
            prefix_dfa,
        })
    }

    /// The pattern as written by the caller.
    pub fn as_str(&self) -> &str {
        &self.source
    }
}

impl fmt::Debug for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Pattern").field(&self.source).finish()
    }
}

/// What a rule matches.
#[derive(Debug)]
pub enum Matcher {
    /// Exact text.
    Literal(String),
    /// A regular expression anchored at the scan position.
    Pattern(Pattern),
}

/// One entry of a rule table.
#[derive(Debug)]
pub struct Rule<K> {
    /// What the rule matches
    pub matcher: Matcher,
    /// The tag given to tokens produced by this rule
    pub kind: K,
    /// The match is rejected when this pattern matches right after it
    pub not_followed_by: Option<Pattern>,
}

/// An ordered, read-only list of rules.
#[derive(Debug)]
pub struct RuleTable<K> {
    rules: Vec<Rule<K>>,
    trivia: Vec<K>,
}

impl<K> Default for RuleTable<K> {
    fn default() -> Self {
        Self {
            rules: Vec::new(),
            trivia: Vec::new(),
        }
    }
}

impl<K: fmt::Debug> RuleTable<K> {
    /// Creates an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a rule matching `text` exactly.
    pub fn literal(mut self, text: &str, kind: K) -> Result<Self, RuleError> {
        if text.is_empty() {
            return Err(RuleError::EmptyLiteral {
                kind: format!("{kind:?}"),
            });
        }
        self.rules.push(Rule {
            matcher: Matcher::Literal(text.to_string()),
            kind,
            not_followed_by: None,
        });
        Ok(self)
    }

    /// Appends a literal rule that is rejected when `forbidden` matches
    /// right after it, e.g. a keyword that must not be an identifier prefix.
    pub fn literal_not_followed_by(
        self,
        text: &str,
        forbidden: &str,
        kind: K,
    ) -> Result<Self, RuleError> {
        let lookahead = compile(forbidden, &kind)?;
        let mut table = self.literal(text, kind)?;
        if let Some(rule) = table.rules.last_mut() {
            rule.not_followed_by = Some(lookahead);
        }
        Ok(table)
    }

    /// Appends a rule matching the regular expression `pattern`.
    pub fn pattern(mut self, pattern: &str, kind: K) -> Result<Self, RuleError> {
        let compiled = compile(pattern, &kind)?;
        self.rules.push(Rule {
            matcher: Matcher::Pattern(compiled),
            kind,
            not_followed_by: None,
        });
        Ok(self)
    }

    /// Appends a pattern rule whose match is discarded when `forbidden`
    /// matches immediately after it, e.g. a number that must not run into an
    /// identifier.
    pub fn pattern_not_followed_by(
        mut self,
        pattern: &str,
        forbidden: &str,
        kind: K,
    ) -> Result<Self, RuleError> {
        let compiled = compile(pattern, &kind)?;
        let lookahead = compile(forbidden, &kind)?;
        self.rules.push(Rule {
            matcher: Matcher::Pattern(compiled),
            kind,
            not_followed_by: Some(lookahead),
        });
        Ok(self)
    }
}

impl<K> RuleTable<K> {
    /// Marks `kind` as ignorable, e.g. whitespace or comments.
    pub fn trivia(mut self, kind: K) -> Self {
        self.trivia.push(kind);
        self
    }

    /// Appends an already-built rule.
    pub fn push(&mut self, rule: Rule<K>) {
        self.rules.push(rule);
    }

    /// Rules in priority order.
    pub fn rules(&self) -> &[Rule<K>] {
        &self.rules
    }

    /// Number of rules.
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    /// Whether the table has no rules.
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

impl<K: PartialEq> RuleTable<K> {
    /// Whether tokens of `kind` are ignorable.
    pub fn is_trivia(&self, kind: &K) -> bool {
        self.trivia.contains(kind)
    }
}

fn compile<K: fmt::Debug>(pattern: &str, kind: &K) -> Result<Pattern, RuleError> {
    Pattern::new(pattern).map_err(|source| RuleError::InvalidPattern {
        pattern: pattern.to_string(),
        kind: format!("{kind:?}"),
        source,
    })
}
