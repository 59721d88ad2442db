//! Command-line support for the lexkit lexer
//!
//! Bundled language tables, JSON rule files, and the printer that turns
//! lexer events into text or JSON lines.

pub mod driver;
pub mod languages;
pub mod printer;
pub mod rules_file;

pub use driver::run;
pub use languages::Language;
pub use printer::{OutputMode, Summary, TokenPrinter};
pub use rules_file::{LoadedRules, RulesFileError};
