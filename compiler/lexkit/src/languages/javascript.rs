//! Token kinds and rules for JavaScript (ECMAScript) source files.

use std::fmt;

use lazy_static::lazy_static;
use lexkit_lexer::{RuleError, RuleTable};
use serde::Serialize;

/// Lines end with a bare line feed.
pub const LINE_SEPARATOR: &str = "\n";

/// Characters that may continue an identifier. Keywords and numbers must
/// not run into one.
const IDENTIFIER_PART: &str = r"[\p{ID_Continue}$\x{200C}\x{200D}]";

/// JavaScript token kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[allow(missing_docs)]
pub enum JsToken {
    // Trivia
    Whitespace,
    Comment,

    // Keywords
    Break,
    Case,
    Catch,
    Const,
    Continue,
    Debugger,
    Default,
    Delete,
    Do,
    Else,
    Enum,
    Export,
    For,
    Function,
    If,
    Import,
    In,
    Instanceof,
    Let,
    New,
    Return,
    Switch,
    This,
    Throw,
    Try,
    Typeof,
    Var,
    Void,
    While,
    With,
    Yield,
    Arguments,
    /// `class`, `extends` and `super`
    DeadKeyword,
    /// Words reserved in strict mode
    FutureKeyword,

    // Literals
    BooleanLiteral,
    NullLiteral,
    UndefinedLiteral,
    NumberLiteral,
    StringLiteral,
    TemplateLiteral,
    Identifier,

    // Punctuation
    OpenBrace,
    CloseBrace,
    OpenParen,
    CloseParen,
    OpenBracket,
    CloseBracket,
    Semicolon,
    Colon,
    Comma,
    Period,
    Ternary,
    Arrow,

    // Operators
    ZeroFillRightShiftAssignment,
    StrictEqual,
    StrictNotEqual,
    LeftShiftAssignment,
    RightShiftAssignment,
    ZeroFillRightShift,
    LogicalOr,
    LogicalAnd,
    NullishCoalescing,
    BitwiseOrAssignment,
    AdditionAssignment,
    SubtractionAssignment,
    MultiplicationAssignment,
    DivisionAssignment,
    RemainderAssignment,
    BitwiseAndAssignment,
    BitwiseXorAssignment,
    Equal,
    NotEqual,
    LeftShift,
    RightShift,
    GreaterThanEqual,
    LessThanEqual,
    Increment,
    Decrement,
    Assignment,
    BitwiseOr,
    LogicalNot,
    BitwiseAnd,
    GreaterThan,
    LessThan,
    Remainder,
    BitwiseXor,
    BitwiseNot,
    Addition,
    Subtraction,
    Multiplication,
    Division,
}

impl fmt::Display for JsToken {
    /// Writes the same name the token serializes to, e.g. `OPEN_PAREN`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = format!("{self:?}");
        for (i, c) in name.char_indices() {
            if i > 0 && c.is_ascii_uppercase() {
                f.write_str("_")?;
            }
            write!(f, "{}", c.to_ascii_uppercase())?;
        }
        Ok(())
    }
}

const KEYWORDS: &[(&str, JsToken)] = &[
    ("break", JsToken::Break),
    ("case", JsToken::Case),
    ("catch", JsToken::Catch),
    ("const", JsToken::Const),
    ("continue", JsToken::Continue),
    ("debugger", JsToken::Debugger),
    ("default", JsToken::Default),
    ("delete", JsToken::Delete),
    ("do", JsToken::Do),
    ("else", JsToken::Else),
    ("enum", JsToken::Enum),
    ("export", JsToken::Export),
    ("for", JsToken::For),
    ("function", JsToken::Function),
    ("if", JsToken::If),
    ("import", JsToken::Import),
    ("in", JsToken::In),
    ("instanceof", JsToken::Instanceof),
    ("let", JsToken::Let),
    ("new", JsToken::New),
    ("return", JsToken::Return),
    ("switch", JsToken::Switch),
    ("this", JsToken::This),
    ("throw", JsToken::Throw),
    ("try", JsToken::Try),
    ("typeof", JsToken::Typeof),
    ("var", JsToken::Var),
    ("void", JsToken::Void),
    ("while", JsToken::While),
    ("with", JsToken::With),
    ("yield", JsToken::Yield),
    ("arguments", JsToken::Arguments),
    ("class", JsToken::DeadKeyword),
    ("extends", JsToken::DeadKeyword),
    ("super", JsToken::DeadKeyword),
    ("implements", JsToken::FutureKeyword),
    ("interface", JsToken::FutureKeyword),
    ("package", JsToken::FutureKeyword),
    ("private", JsToken::FutureKeyword),
    ("protected", JsToken::FutureKeyword),
    ("public", JsToken::FutureKeyword),
    ("static", JsToken::FutureKeyword),
    ("true", JsToken::BooleanLiteral),
    ("false", JsToken::BooleanLiteral),
    ("null", JsToken::NullLiteral),
    ("undefined", JsToken::UndefinedLiteral),
    ("NaN", JsToken::NumberLiteral),
];

// Longer operators come first so that `>>>=` is not read as `>>` `>=`.
const OPERATORS: &[(&str, JsToken)] = &[
    (">>>=", JsToken::ZeroFillRightShiftAssignment),
    ("===", JsToken::StrictEqual),
    ("!==", JsToken::StrictNotEqual),
    ("<<=", JsToken::LeftShiftAssignment),
    (">>=", JsToken::RightShiftAssignment),
    (">>>", JsToken::ZeroFillRightShift),
    ("=>", JsToken::Arrow),
    ("||", JsToken::LogicalOr),
    ("&&", JsToken::LogicalAnd),
    ("??", JsToken::NullishCoalescing),
    ("|=", JsToken::BitwiseOrAssignment),
    ("+=", JsToken::AdditionAssignment),
    ("-=", JsToken::SubtractionAssignment),
    ("*=", JsToken::MultiplicationAssignment),
    ("/=", JsToken::DivisionAssignment),
    ("%=", JsToken::RemainderAssignment),
    ("&=", JsToken::BitwiseAndAssignment),
    ("^=", JsToken::BitwiseXorAssignment),
    ("==", JsToken::Equal),
    ("!=", JsToken::NotEqual),
    ("<<", JsToken::LeftShift),
    (">>", JsToken::RightShift),
    (">=", JsToken::GreaterThanEqual),
    ("<=", JsToken::LessThanEqual),
    ("++", JsToken::Increment),
    ("--", JsToken::Decrement),
    ("{", JsToken::OpenBrace),
    ("}", JsToken::CloseBrace),
    ("(", JsToken::OpenParen),
    (")", JsToken::CloseParen),
    ("[", JsToken::OpenBracket),
    ("]", JsToken::CloseBracket),
    (";", JsToken::Semicolon),
    (":", JsToken::Colon),
    (",", JsToken::Comma),
    (".", JsToken::Period),
    ("?", JsToken::Ternary),
    ("=", JsToken::Assignment),
    ("|", JsToken::BitwiseOr),
    ("!", JsToken::LogicalNot),
    ("&", JsToken::BitwiseAnd),
    (">", JsToken::GreaterThan),
    ("<", JsToken::LessThan),
    ("%", JsToken::Remainder),
    ("^", JsToken::BitwiseXor),
    ("~", JsToken::BitwiseNot),
    ("+", JsToken::Addition),
    ("-", JsToken::Subtraction),
    ("*", JsToken::Multiplication),
    ("/", JsToken::Division),
];

lazy_static! {
    static ref RULES: Result<RuleTable<JsToken>, RuleError> = build_rules();
}

/// The JavaScript rule table, built on first use.
pub fn rules() -> Result<&'static RuleTable<JsToken>, &'static RuleError> {
    RULES.as_ref()
}

fn build_rules() -> Result<RuleTable<JsToken>, RuleError> {
    let mut table = RuleTable::new()
        .pattern(r"\s+", JsToken::Whitespace)?
        .pattern(r"//[^\n]*", JsToken::Comment)?
        .pattern(r"/\*(?s:.)*?\*/", JsToken::Comment)?;

    for &(word, kind) in KEYWORDS {
        table = table.literal_not_followed_by(word, IDENTIFIER_PART, kind)?;
    }

    let number_end = r"[\p{ID_Continue}$]";
    table = table
        .pattern_not_followed_by(r"0[xX][0-9A-Fa-f]+", number_end, JsToken::NumberLiteral)?
        .pattern_not_followed_by(
            r"[0-9]*\.?[0-9]+(?:[eE][-+]?[0-9]+)?",
            number_end,
            JsToken::NumberLiteral,
        )?
        .literal_not_followed_by("Infinity", IDENTIFIER_PART, JsToken::NumberLiteral)?
        .pattern(r"'(?:[^'\\\n]|\\.)*'", JsToken::StringLiteral)?
        .pattern(r#""(?:[^"\\\n]|\\.)*""#, JsToken::StringLiteral)?
        .pattern(r"`(?:[^`\\]|\\(?s:.))*`", JsToken::TemplateLiteral)?
        .pattern(
            r"[\p{ID_Start}$_][\p{ID_Continue}$\x{200C}\x{200D}]*",
            JsToken::Identifier,
        )?;

    for &(text, kind) in OPERATORS {
        table = table.literal(text, kind)?;
    }

    Ok(table.trivia(JsToken::Whitespace).trivia(JsToken::Comment))
}
