use std::fmt::Display;
use std::fs::File;
use std::io::{self, Read};
use std::path::PathBuf;

use clap::Parser;
use lexkit::languages::javascript;
use lexkit::{rules_file, Language, OutputMode, Summary, TokenPrinter};
use lexkit_lexer::{LexerConfig, RuleTable};
use log::LevelFilter;
use serde::Serialize;

#[derive(Debug, Parser)]
#[command(
    name = "lexkit",
    version,
    about = "Split a source file into tokens",
    long_about = "lexkit reads a source file in chunks and prints its tokens as soon as\n\
        they are recognized. Characters no rule matches are reported with the\n\
        offending line and skipped.\n\n\
        EXAMPLES:\n\
        \n  lexkit app.js                          Tokenize JavaScript\n\
        \n  lexkit --format json app.js            One JSON object per token\n\
        \n  lexkit --rules parens.json input.txt   Use a custom rule table\n\
        \n  cat app.js | lexkit --skip-trivia      Read from stdin"
)]
struct Cli {
    /// Increase verbosity level (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Input source file (reads from stdin if not provided)
    #[arg(value_name = "FILE")]
    input: Option<PathBuf>,

    /// Bundled language to lex
    #[arg(long, value_enum, default_value_t = Language::Javascript)]
    language: Language,

    /// JSON rule table to use instead of a bundled language
    #[arg(long, value_name = "RULES.json", conflicts_with = "language")]
    rules: Option<PathBuf>,

    /// Output format
    #[arg(long, value_enum, default_value_t = OutputMode::Text)]
    format: OutputMode,

    /// Bytes read from the input at a time
    #[arg(long, value_name = "BYTES", default_value_t = 8 * 1024)]
    chunk_size: usize,

    /// Do not print whitespace and comments
    #[arg(long)]
    skip_trivia: bool,
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        2 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    };
    let _ = env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .try_init();
}

fn open_input(input: &Option<PathBuf>) -> io::Result<Box<dyn Read>> {
    match input {
        Some(path) => Ok(Box::new(File::open(path)?)),
        None => Ok(Box::new(io::stdin().lock())),
    }
}

fn lex_with<K>(rules: &RuleTable<K>, config: LexerConfig, cli: &Cli) -> i32
where
    K: Clone + PartialEq + Display + Serialize,
{
    let source = match open_input(&cli.input) {
        Ok(source) => source,
        Err(e) => {
            eprintln!("error: {e}");
            return 2;
        }
    };

    let stdout = io::stdout().lock();
    let stderr = io::stderr();
    let mut printer = TokenPrinter::new(stdout, stderr, cli.format);
    let summary = match lexkit::run(rules, config, source, &mut printer) {
        Ok(summary) => summary,
        Err(e) => {
            eprintln!("error: cannot read input: {e}");
            return 2;
        }
    };
    if let Err(e) = printer.finish() {
        eprintln!("error: cannot write output: {e}");
        return 2;
    }

    report(summary)
}

fn report(summary: Summary) -> i32 {
    eprintln!("Complete with {} tokens.", summary.tokens);
    eprintln!("Complete with {} errors.", summary.errors);
    if summary.errors > 0 {
        1
    } else {
        0
    }
}

fn run_cli() -> i32 {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let mut config = LexerConfig {
        include_trivia: !cli.skip_trivia,
        chunk_size: cli.chunk_size,
        ..LexerConfig::default()
    };

    match &cli.rules {
        Some(path) => match rules_file::load(path) {
            Ok(loaded) => {
                config.line_separator = loaded.separator;
                lex_with(&loaded.table, config, &cli)
            }
            Err(e) => {
                eprintln!("error: {e}");
                2
            }
        },
        None => match cli.language {
            Language::Javascript => match javascript::rules() {
                Ok(rules) => {
                    config.line_separator = cli.language.line_separator().to_string();
                    lex_with(rules, config, &cli)
                }
                Err(e) => {
                    eprintln!("error: bundled JavaScript rules are invalid: {e}");
                    2
                }
            },
        },
    }
}

fn main() {
    std::process::exit(run_cli());
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_parses_verbose_flag() {
        let cli = Cli::try_parse_from(["lexkit", "-vvv"]).unwrap();
        assert_eq!(cli.verbose, 3, "verbose count should be 3 for -vvv");
    }

    #[test]
    fn cli_defaults() {
        let cli = Cli::try_parse_from(["lexkit", "app.js"]).unwrap();
        assert_eq!(cli.input, Some(PathBuf::from("app.js")));
        assert_eq!(cli.language, Language::Javascript);
        assert_eq!(cli.format, OutputMode::Text);
        assert_eq!(cli.chunk_size, 8192);
        assert!(!cli.skip_trivia);
    }

    #[test]
    fn cli_parses_rules_and_format() {
        let cli = Cli::try_parse_from([
            "lexkit",
            "--rules",
            "parens.json",
            "--format",
            "json",
            "--chunk-size",
            "16",
            "--skip-trivia",
        ])
        .unwrap();
        assert_eq!(cli.rules, Some(PathBuf::from("parens.json")));
        assert_eq!(cli.format, OutputMode::Json);
        assert_eq!(cli.chunk_size, 16);
        assert!(cli.skip_trivia);
        assert_eq!(cli.input, None);
    }

    #[test]
    fn rules_conflict_with_explicit_language() {
        let parsed =
            Cli::try_parse_from(["lexkit", "--rules", "r.json", "--language", "javascript"]);
        assert!(parsed.is_err());
    }

    #[test]
    fn report_exit_status() {
        assert_eq!(report(Summary { tokens: 3, errors: 0 }), 0);
        assert_eq!(report(Summary { tokens: 3, errors: 2 }), 1);
    }
}
