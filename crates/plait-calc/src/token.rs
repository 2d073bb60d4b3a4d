//! Calculator tokens and the character-level lexer that produces them.

use std::fmt;

use plait_core::{choice, eof, Parser, Token};
use plait_lexer::chars::is_whitespace;
use plait_lexer::scanner::many_chars;
use plait_lexer::{lexeme, operators, scan_pattern, try_lex, word, Pattern};

/// Every operator and punctuation mark, including `#`, which separates
/// arguments where a comma cannot be typed.
pub const OPERATORS: &[&str] = &[
    "!", "+", "-", "**", "*", "/", "%", "==", "!=", "<=", ">=", "<", ">", "&&", "||", "(", ")",
    ",", "#",
];

#[derive(Debug, Clone, PartialEq)]
pub enum CalcToken {
    Number(f64),
    Word(String),
    Op(&'static str),
}

impl fmt::Display for CalcToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CalcToken::Number(n) => write!(f, "{n}"),
            CalcToken::Word(w) => f.write_str(w),
            CalcToken::Op(op) => f.write_str(op),
        }
    }
}

/// Whitespace-separated operators, decimal numbers and identifiers, up to
/// the end of input.
pub fn lexer() -> Parser<[char], Vec<Token<CalcToken>>> {
    let number = try_lex(scan_pattern(Pattern::decimal(), "number"), |text| {
        text.parse::<f64>().map(CalcToken::Number)
    });
    let token = choice([
        operators(OPERATORS, CalcToken::Op),
        number,
        word(|text| CalcToken::Word(text.to_string())),
    ]);
    lexeme(many_chars(is_whitespace), token).followed_by(eof("end of input"))
}
