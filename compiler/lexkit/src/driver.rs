//! Feeds a reader through the lexer in push mode.

use std::fmt::Display;
use std::io::{self, ErrorKind, Read, Write};

use lexkit_lexer::{Flow, LexerConfig, RuleTable, StreamingLexer};
use log::{debug, info};
use serde::Serialize;

use crate::printer::{Summary, TokenPrinter};

/// Reads `source` in `config.chunk_size` pieces, printing every event as
/// soon as it is produced. Returns the totals once the input ends. An
/// invalid configuration fails with [`ErrorKind::InvalidInput`] before
/// anything is read.
pub fn run<K, R, W, E>(
    rules: &RuleTable<K>,
    config: LexerConfig,
    mut source: R,
    printer: &mut TokenPrinter<W, E>,
) -> io::Result<Summary>
where
    K: Clone + PartialEq + Display + Serialize,
    R: Read,
    W: Write,
    E: Write,
{
    let mut chunk = vec![0; config.chunk_size.clamp(1, 1 << 20)];
    let mut lexer = StreamingLexer::with_config(rules, config)?;

    loop {
        let read = match source.read(&mut chunk) {
            Ok(n) => n,
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        };
        if read == 0 {
            break;
        }
        debug!("read {read} bytes");
        lexer.write_bytes(&chunk[..read]);
        if lexer.drain_into(printer) == Flow::Pause {
            break;
        }
    }

    if !printer.has_failed() {
        lexer.close(printer);
    }
    let summary = printer.summary();
    info!(
        "lexed {} tokens with {} errors, ending at {}",
        summary.tokens,
        summary.errors,
        lexer.location()
    );
    Ok(summary)
}
