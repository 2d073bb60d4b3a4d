//! plait lexer
//!
//! Character-level building blocks for plait grammars: pure [`Pattern`]
//! matchers, scanners that recognize input without producing values, and
//! lexers that turn matched text into [`Token`](plait_core::Token)s. The
//! [`parse_tokens`] bridge runs a token-level grammar over a lexed stream
//! while reporting failures at character positions.
//!
//! ```
//! use plait_core::{eof, run, token, TokenStream, Parser};
//! use plait_lexer::{chars, integer, lexeme, parse_tokens, scanner};
//!
//! let tokens = lexeme(scanner::many_chars(chars::is_whitespace), integer(|s| s.len()));
//! let widths: Parser<TokenStream<usize>, Vec<usize>> =
//!     token(|w: &usize| Some(*w)).many().followed_by(eof("EOF"));
//! let p = parse_tokens(tokens, widths);
//!
//! assert_eq!(run("7 42 100", &p, "demo").unwrap(), vec![1, 2, 3]);
//! ```

pub mod chars;
pub mod lexer;
pub mod pattern;
pub mod scanner;

pub use lexer::{
    decimal, integer, lex, lexeme, operators, parse_tokens, parse_tokens_with, try_lex, word,
    TokenConfig,
};
pub use pattern::Pattern;
pub use scanner::{scan_pattern, Scanner};
