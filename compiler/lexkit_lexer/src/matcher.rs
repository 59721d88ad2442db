//! Rule evaluation at a single scan position.
//!
//! Each probe sees `window`, the buffered text starting at the scan
//! position, and whether the input is complete. While input is still
//! arriving a probe answers [`Probe::NeedInput`] whenever more text could
//! change its answer, so a token is never cut at a chunk seam and a later
//! rule never wins just because an earlier one ran out of text.

use log::trace;
use regex_automata::dfa::Automaton;
use regex_automata::{Anchored, Input};

use crate::rules::{Matcher, Pattern, Rule, RuleTable};

/// Outcome of probing one rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Probe {
    /// Matched this many bytes of the window.
    Matched(usize),
    /// Does not match here, whatever input follows.
    NoMatch,
    /// Cannot decide until more input is buffered.
    NeedInput,
}

/// Outcome of evaluating the whole table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Selection {
    /// The rule at `rule` matched `len` bytes.
    Found {
        /// Index of the winning rule
        rule: usize,
        /// Length of the match in bytes
        len: usize,
    },
    /// No rule matches at this position.
    NoMatch,
    /// A rule ahead of any match needs more input.
    NeedInput,
}

/// Evaluates the rules in table order; the first non-empty match wins.
pub fn select<K>(table: &RuleTable<K>, window: &str, complete: bool) -> Selection {
    for (index, rule) in table.rules().iter().enumerate() {
        match probe_rule(rule, window, complete) {
            Probe::Matched(len) => return Selection::Found { rule: index, len },
            Probe::NeedInput => return Selection::NeedInput,
            Probe::NoMatch => {}
        }
    }
    Selection::NoMatch
}

/// Probes a single rule, lookahead included.
pub fn probe_rule<K>(rule: &Rule<K>, window: &str, complete: bool) -> Probe {
    let probe = match &rule.matcher {
        Matcher::Literal(text) => probe_literal(text, window, complete),
        Matcher::Pattern(pattern) => probe_pattern(pattern, window, complete),
    };
    trace!("probe {:?} -> {:?}", rule.matcher, probe);

    let Probe::Matched(len) = probe else {
        return probe;
    };
    match &rule.not_followed_by {
        None => probe,
        Some(forbidden) => match probe_pattern(forbidden, &window[len..], complete) {
            Probe::Matched(_) => Probe::NoMatch,
            Probe::NoMatch => probe,
            Probe::NeedInput => Probe::NeedInput,
        },
    }
}

/// Compares the next `literal.len()` bytes to `literal`.
pub fn probe_literal(literal: &str, window: &str, complete: bool) -> Probe {
    if window.starts_with(literal) {
        Probe::Matched(literal.len())
    } else if !complete && literal.starts_with(window) {
        // The window is a proper prefix of the literal.
        Probe::NeedInput
    } else {
        Probe::NoMatch
    }
}

/// Runs an anchored pattern at the start of `window`.
pub fn probe_pattern(pattern: &Pattern, window: &str, complete: bool) -> Probe {
    let found = pattern
        .regex
        .find(window)
        .map(|m| m.end())
        .filter(|&end| end > 0);

    if complete {
        return found.map_or(Probe::NoMatch, Probe::Matched);
    }

    // Without an automaton to walk, any later fragment could still change
    // the match, so only a complete input settles it.
    let open = pattern
        .prefix_dfa
        .as_ref()
        .and_then(|dfa| extends_past(dfa, window))
        .unwrap_or(true);

    if open {
        Probe::NeedInput
    } else {
        found.map_or(Probe::NoMatch, Probe::Matched)
    }
}

/// Whether some continuation of `window` is still live in the DFA, i.e.
/// more input could produce a different match. `None` if the DFA gave up.
fn extends_past<A: Automaton>(dfa: &A, window: &str) -> Option<bool> {
    let input = Input::new(window).anchored(Anchored::Yes);
    let mut state = dfa.start_state_forward(&input).ok()?;
    for &byte in window.as_bytes() {
        state = dfa.next_state(state, byte);
        if dfa.is_dead_state(state) {
            return Some(false);
        }
        if dfa.is_quit_state(state) {
            return None;
        }
    }
    Some((0..=u8::MAX).any(|byte| {
        let next = dfa.next_state(state, byte);
        !dfa.is_dead_state(next)
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pattern(source: &str) -> Pattern {
        Pattern::new(source).unwrap()
    }

    #[test]
    fn test_literal_probe() {
        assert_eq!(probe_literal("==", "== x", false), Probe::Matched(2));
        assert_eq!(probe_literal("==", "=", false), Probe::NeedInput);
        assert_eq!(probe_literal("==", "=", true), Probe::NoMatch);
        assert_eq!(probe_literal("==", "=+", false), Probe::NoMatch);
        assert_eq!(probe_literal("==", "", false), Probe::NeedInput);
    }

    #[test]
    fn test_pattern_settles_before_window_end() {
        let digits = pattern("[0-9]+");
        assert_eq!(probe_pattern(&digits, "123 \n", false), Probe::Matched(3));
        assert_eq!(probe_pattern(&digits, "x1\n", false), Probe::NoMatch);
    }

    #[test]
    fn test_pattern_at_window_end_needs_input() {
        let digits = pattern("[0-9]+");
        assert_eq!(probe_pattern(&digits, "123", false), Probe::NeedInput);
        assert_eq!(probe_pattern(&digits, "123", true), Probe::Matched(3));
    }

    #[test]
    fn test_unterminated_comment_needs_input() {
        let comment = pattern(r"/\*(?s:.)*?\*/");
        assert_eq!(probe_pattern(&comment, "/* open\n", false), Probe::NeedInput);
        assert_eq!(probe_pattern(&comment, "/* open\n", true), Probe::NoMatch);
        assert_eq!(
            probe_pattern(&comment, "/* a */ b */\n", false),
            Probe::Matched(7)
        );
    }

    #[test]
    fn test_word_boundary_pattern_waits_across_lines() {
        let pair = pattern(r"[a-z]+\n[a-z]+\b");
        assert!(pair.prefix_dfa.is_some());
        assert_eq!(probe_pattern(&pair, "ab\n", false), Probe::NeedInput);
        assert_eq!(probe_pattern(&pair, "ab\ncd \n", false), Probe::Matched(5));
        assert_eq!(probe_pattern(&pair, "ab\n", true), Probe::NoMatch);
    }

    #[test]
    fn test_undecidable_pattern_waits_for_end_of_input() {
        // Non-ASCII bytes stop the word-boundary DFA before it can decide.
        let pair = pattern(r"é+\n[a-z]+\b");
        assert_eq!(probe_pattern(&pair, "éé\n", false), Probe::NeedInput);
        assert_eq!(probe_pattern(&pair, "éé\ncd", true), Probe::Matched(7));
        assert_eq!(probe_pattern(&pair, "éé\n", true), Probe::NoMatch);
    }

    #[test]
    fn test_empty_match_is_no_match() {
        let maybe = pattern("a*");
        assert_eq!(probe_pattern(&maybe, "b\n", false), Probe::NoMatch);
        assert_eq!(probe_pattern(&maybe, "b", true), Probe::NoMatch);
    }

    #[test]
    fn test_first_rule_wins_over_longer_match() {
        let table = RuleTable::new()
            .literal("=", "ASSIGN")
            .and_then(|t| t.literal("==", "EQ"))
            .unwrap();
        assert_eq!(
            select(&table, "== 1\n", false),
            Selection::Found { rule: 0, len: 1 }
        );
    }

    #[test]
    fn test_earlier_undecided_rule_blocks_later_rule() {
        let table = RuleTable::new()
            .literal("==", "EQ")
            .and_then(|t| t.literal("=", "ASSIGN"))
            .unwrap();
        assert_eq!(select(&table, "=", false), Selection::NeedInput);
        assert_eq!(select(&table, "=", true), Selection::Found { rule: 1, len: 1 });
    }

    #[test]
    fn test_not_followed_by() {
        let table = RuleTable::new()
            .pattern_not_followed_by("[0-9]+", "[A-Za-z_]", "NUM")
            .and_then(|t| t.pattern("[0-9A-Za-z_]+", "WORD"))
            .unwrap();
        assert_eq!(select(&table, "12 ", true), Selection::Found { rule: 0, len: 2 });
        assert_eq!(select(&table, "12ab ", true), Selection::Found { rule: 1, len: 4 });
        assert_eq!(select(&table, "12", true), Selection::Found { rule: 0, len: 2 });
    }

    #[test]
    fn test_nothing_matches() {
        let table = RuleTable::new().literal("(", "LPAREN").unwrap();
        assert_eq!(select(&table, "@\n", false), Selection::NoMatch);
    }
}
