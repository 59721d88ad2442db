//! Bundled rule tables.

pub mod javascript;

use clap::ValueEnum;

/// Languages with a bundled rule table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Language {
    /// JavaScript (ECMAScript)
    Javascript,
}

impl Language {
    /// Line separator used by the language's sources.
    pub fn line_separator(self) -> &'static str {
        match self {
            Language::Javascript => javascript::LINE_SEPARATOR,
        }
    }
}
