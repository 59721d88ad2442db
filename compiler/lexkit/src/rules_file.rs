//! Rule tables loaded from JSON.
//!
//! ```json
//! {
//!   "separator": "\n",
//!   "trivia": ["WS"],
//!   "rules": [
//!     {"literal": "(", "type": "LPAREN"},
//!     {"pattern": "[0-9]+", "type": "NUM", "not_followed_by": "[a-z]"},
//!     {"pattern": "\\s+", "type": "WS"}
//!   ]
//! }
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use lexkit_lexer::{RuleError, RuleTable};
use log::debug;
use serde::Deserialize;
use thiserror::Error;

/// Errors raised while loading a rules file.
#[derive(Debug, Error)]
pub enum RulesFileError {
    /// The file could not be read.
    #[error("cannot read rules file '{}': {source}", .path.display())]
    Io {
        /// Path that failed
        path: PathBuf,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },
    /// The file is not a valid rules document.
    #[error("malformed rules file: {0}")]
    Parse(#[from] serde_json::Error),
    /// A rule could not be compiled.
    #[error(transparent)]
    Rule(#[from] RuleError),
    /// The line separator is empty.
    #[error("line separator must not be empty")]
    EmptySeparator,
    /// A trivia kind names no rule.
    #[error("trivia kind {0:?} is not produced by any rule")]
    UnknownTrivia(String),
}

#[derive(Debug, Deserialize)]
struct RulesDocument {
    #[serde(default = "default_separator")]
    separator: String,
    #[serde(default)]
    trivia: Vec<String>,
    rules: Vec<RuleSpec>,
}

#[derive(Debug, Deserialize)]
struct RuleSpec {
    #[serde(flatten)]
    matcher: MatcherSpec,
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    not_followed_by: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "lowercase")]
enum MatcherSpec {
    Literal(String),
    Pattern(String),
}

fn default_separator() -> String {
    "\n".to_string()
}

/// A rule table together with the line separator it was written for.
#[derive(Debug)]
pub struct LoadedRules {
    /// Sequence that ends a line
    pub separator: String,
    /// The rules, in file order
    pub table: RuleTable<String>,
}

/// Reads and compiles the rules file at `path`.
pub fn load<P: AsRef<Path>>(path: P) -> Result<LoadedRules, RulesFileError> {
    let path = path.as_ref();
    let text = fs::read_to_string(path).map_err(|source| RulesFileError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let loaded = parse(&text)?;
    debug!(
        "loaded {} rules from {}",
        loaded.table.len(),
        path.display()
    );
    Ok(loaded)
}

/// Compiles a rules document.
pub fn parse(text: &str) -> Result<LoadedRules, RulesFileError> {
    let document: RulesDocument = serde_json::from_str(text)?;
    if document.separator.is_empty() {
        return Err(RulesFileError::EmptySeparator);
    }

    let mut table = RuleTable::new();
    for spec in document.rules {
        table = match (spec.matcher, spec.not_followed_by) {
            (MatcherSpec::Literal(text), None) => table.literal(&text, spec.kind)?,
            (MatcherSpec::Literal(text), Some(forbidden)) => {
                table.literal_not_followed_by(&text, &forbidden, spec.kind)?
            }
            (MatcherSpec::Pattern(pattern), None) => table.pattern(&pattern, spec.kind)?,
            (MatcherSpec::Pattern(pattern), Some(forbidden)) => {
                table.pattern_not_followed_by(&pattern, &forbidden, spec.kind)?
            }
        };
    }

    for kind in document.trivia {
        if !table.rules().iter().any(|rule| rule.kind == kind) {
            return Err(RulesFileError::UnknownTrivia(kind));
        }
        table = table.trivia(kind);
    }

    Ok(LoadedRules {
        separator: document.separator,
        table,
    })
}
