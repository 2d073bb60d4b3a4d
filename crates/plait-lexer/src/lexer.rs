//! Lexers and the lex-then-parse bridge.
//!
//! A lexer is a `Parser<[char], Token<V>>`. [`lexeme`] strings lexers
//! together with a delimiter into a token list, and [`parse_tokens`] runs a
//! token-level grammar over that list as a nested parse, so a two-phase
//! grammar still looks like one parser to its caller.

use std::convert::Infallible;
use std::fmt;
use std::sync::Arc;

use plait_core::{ParseError, ParseState, Parser, Reply, Source, Token, TokenRenderer, TokenStream};
use tracing::debug;

use crate::pattern::Pattern;
use crate::scanner::{scan_pattern, Scanner};

/// Turn what `scanner` matched into a token, or fail with the tokenizer's
/// message at the start of the match.
///
/// A tokenizer failure backs out, so alternatives may still be tried.
pub fn try_lex<V, E>(
    scanner: Scanner,
    tokenizer: impl Fn(&str) -> Result<V, E> + Send + Sync + 'static,
) -> Parser<[char], Token<V>>
where
    V: 'static,
    E: fmt::Display,
{
    let name = scanner.name().to_string();
    Parser::new(name, move |state, budget| {
        let start = state.save();
        let hint = match scanner.parse_with(state, budget) {
            Reply::Ok((), hint) => hint,
            Reply::Err(e) => return Reply::Err(e),
        };
        let text: String = state.source()[start.at..state.at()].iter().collect();
        match tokenizer(&text) {
            Ok(value) => {
                let length = state.at() - start.at;
                if length > 0 {
                    state.set_step(start.step + 1);
                }
                Reply::Ok(Token::new(start.at, length, value), hint)
            }
            Err(e) => {
                state.restore(start);
                Reply::Err(ParseError::merge(hint, Some(state.raw(e.to_string()))))
            }
        }
    })
}

/// Turn what `scanner` matched into a token. The token counts as one step.
pub fn lex<V: 'static>(
    scanner: Scanner,
    tokenizer: impl Fn(&str) -> V + Send + Sync + 'static,
) -> Parser<[char], Token<V>> {
    try_lex(scanner, move |text| Ok::<_, Infallible>(tokenizer(text)))
}

/// Repeatedly skip `delimiter` and run `token`, collecting tokens until no
/// further token follows.
///
/// Trailing delimiters are consumed. A delimiter or token that fails after
/// consuming input fails the whole lexeme.
pub fn lexeme<V: 'static>(
    delimiter: Scanner,
    token: Parser<[char], Token<V>>,
) -> Parser<[char], Vec<Token<V>>> {
    Parser::new("lexeme", move |state, _| {
        let mut tokens = Vec::new();
        let mut hint = None;
        loop {
            let before_delimiter = state.save();
            match delimiter.parse(state) {
                Reply::Ok(_, h) => hint = ParseError::merge(hint, h),
                Reply::Err(e) => {
                    if e.as_ref().is_some_and(ParseError::is_abnormal)
                        || state.consumed_since(before_delimiter)
                    {
                        return Reply::Err(ParseError::merge(hint, e));
                    }
                    state.restore(before_delimiter);
                }
            }
            let before_token = state.save();
            match token.parse(state) {
                Reply::Ok(t, h) => {
                    hint = ParseError::merge(hint, h);
                    if !state.consumed_since(before_token) {
                        break;
                    }
                    tokens.push(t);
                }
                Reply::Err(e) => {
                    if e.as_ref().is_some_and(ParseError::is_abnormal)
                        || state.consumed_since(before_token)
                    {
                        return Reply::Err(ParseError::merge(hint, e));
                    }
                    state.restore(before_token);
                    hint = ParseError::merge(hint, e);
                    break;
                }
            }
        }
        Reply::Ok(tokens, hint)
    })
}

/// How [`parse_tokens_with`] presents the token stream in failures.
pub struct TokenConfig<V> {
    module: Option<String>,
    eof_label: String,
    renderer: TokenRenderer<V>,
}

impl<V> Clone for TokenConfig<V> {
    fn clone(&self) -> Self {
        Self {
            module: self.module.clone(),
            eof_label: self.eof_label.clone(),
            renderer: Arc::clone(&self.renderer),
        }
    }
}

impl<V> fmt::Debug for TokenConfig<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenConfig")
            .field("module", &self.module)
            .field("eof_label", &self.eof_label)
            .finish_non_exhaustive()
    }
}

impl<V: fmt::Debug + 'static> Default for TokenConfig<V> {
    fn default() -> Self {
        Self {
            module: None,
            eof_label: "EOF".to_string(),
            renderer: Arc::new(|v: &V| format!("{v:?}")),
        }
    }
}

impl<V: fmt::Debug + 'static> TokenConfig<V> {
    /// Inherit the outer module name, render tokens with `Debug`, call the
    /// end of input `EOF`.
    pub fn new() -> Self {
        Self::default()
    }
}

impl<V> TokenConfig<V> {
    /// Run the token-level parse under `module` instead of the outer name.
    pub fn with_module(mut self, module: impl Into<String>) -> Self {
        self.module = Some(module.into());
        self
    }

    pub fn with_eof_label(mut self, label: impl Into<String>) -> Self {
        self.eof_label = label.into();
        self
    }

    pub fn with_renderer(
        mut self,
        renderer: impl Fn(&V) -> String + Send + Sync + 'static,
    ) -> Self {
        self.renderer = Arc::new(renderer);
        self
    }
}

/// Lex with `lexeme`, then parse the tokens with `parser`.
pub fn parse_tokens<V, T>(
    lexeme: Parser<[char], Vec<Token<V>>>,
    parser: Parser<TokenStream<V>, T>,
) -> Parser<[char], T>
where
    V: fmt::Debug + 'static,
    T: 'static,
{
    parse_tokens_with(TokenConfig::new(), lexeme, parser)
}

/// [`parse_tokens`] with explicit stream presentation.
///
/// The token-level parse runs on its own state. On success its steps are
/// added to the outer state, and whatever the token grammar was still
/// expecting becomes the hint. On failure the outer cursor moves to the
/// character index where the token-level parse stopped.
pub fn parse_tokens_with<V, T>(
    config: TokenConfig<V>,
    lexeme: Parser<[char], Vec<Token<V>>>,
    parser: Parser<TokenStream<V>, T>,
) -> Parser<[char], T>
where
    V: 'static,
    T: 'static,
{
    let name = parser.name().to_string();
    Parser::new(name, move |state, _| {
        let tokens = match lexeme.parse(state) {
            Reply::Ok(tokens, _) => tokens,
            Reply::Err(e) => return Reply::Err(e),
        };
        let stream = TokenStream::with_parts(
            tokens,
            state.index(),
            config.eof_label.as_str(),
            Arc::clone(&config.renderer),
        );
        debug!(
            tokens = stream.len(),
            end_index = stream.end_index(),
            "lexed"
        );
        let module = config.module.as_deref().unwrap_or(state.module());
        let mut nested = ParseState::new(&stream, module);
        match parser.parse(&mut nested) {
            Reply::Ok(value, hint) => {
                state.set_step(state.step() + nested.step());
                Reply::Ok(value, expectations(hint))
            }
            Reply::Err(e) => {
                state.set_at(nested.index());
                Reply::Err(e)
            }
        }
    })
}

/// Keep only the expectations of a token-level hint. What it encountered
/// describes the token stream, not the characters the outer parse sees.
fn expectations(hint: Option<ParseError>) -> Option<ParseError> {
    let rendered = hint?.render();
    let index = rendered.index;
    rendered.expecting.into_iter().fold(None, |acc, label| {
        ParseError::merge(acc, Some(ParseError::expecting(index, label)))
    })
}

// =============================================================================
// Stock lexers
// =============================================================================

/// Decimal digits.
pub fn integer<V: 'static>(
    tokenizer: impl Fn(&str) -> V + Send + Sync + 'static,
) -> Parser<[char], Token<V>> {
    lex(scan_pattern(Pattern::integer(), "integer"), tokenizer)
}

/// `12`, `1.5` or `.5`.
pub fn decimal<V: 'static>(
    tokenizer: impl Fn(&str) -> V + Send + Sync + 'static,
) -> Parser<[char], Token<V>> {
    lex(scan_pattern(Pattern::decimal(), "decimal number"), tokenizer)
}

/// An identifier: a letter or underscore, then letters, digits or
/// underscores.
pub fn word<V: 'static>(
    tokenizer: impl Fn(&str) -> V + Send + Sync + 'static,
) -> Parser<[char], Token<V>> {
    lex(scan_pattern(Pattern::word(), "word"), tokenizer)
}

/// One of `ops`, longest match first, so `<=` wins over `<`.
pub fn operators<V: 'static>(
    ops: &[&'static str],
    tokenizer: impl Fn(&'static str) -> V + Send + Sync + 'static,
) -> Parser<[char], Token<V>> {
    let mut sorted: Vec<&'static str> = ops.iter().copied().filter(|op| !op.is_empty()).collect();
    sorted.sort_by_key(|op| (std::cmp::Reverse(op.chars().count()), *op));
    sorted.dedup();
    let candidates: Vec<(Pattern, &'static str)> =
        sorted.into_iter().map(|op| (Pattern::string(op), op)).collect();
    Parser::new("operator", move |state, _| {
        let at = state.at();
        let hit = candidates
            .iter()
            .find_map(|(pattern, op)| pattern.match_at(state.source(), at).map(|n| (n, *op)));
        match hit {
            Some((n, op)) => {
                state.advance(n);
                Reply::Ok(Token::new(at, n, tokenizer(op)), None)
            }
            None => Reply::Err(Some(state.expecting("operator"))),
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chars::is_whitespace;
    use crate::scanner::{is_char, many_chars};
    use plait_core::{choice, eof, run, token};
    use pretty_assertions::assert_eq;

    #[derive(Debug, Clone, PartialEq)]
    enum Tok {
        Num(i64),
        Op(&'static str),
    }

    fn lexer() -> Parser<[char], Vec<Token<Tok>>> {
        lexeme(
            many_chars(is_whitespace),
            choice([
                integer(|s| Tok::Num(s.parse().unwrap())),
                operators(&["+", "-"], Tok::Op),
            ]),
        )
    }

    fn num() -> Parser<TokenStream<Tok>, i64> {
        token(|t: &Tok| match t {
            Tok::Num(n) => Some(*n),
            Tok::Op(_) => None,
        })
        .label("number")
    }

    fn op(sym: &'static str) -> Parser<TokenStream<Tok>, ()> {
        token(move |t: &Tok| (*t == Tok::Op(sym)).then_some(())).label(sym)
    }

    fn sum() -> Parser<TokenStream<Tok>, i64> {
        num()
            .zip(op("+").then(num()).many())
            .map(|(first, rest)| first + rest.iter().sum::<i64>())
            .followed_by(eof("EOF"))
    }

    fn render(t: &Tok) -> String {
        match t {
            Tok::Num(n) => n.to_string(),
            Tok::Op(s) => (*s).to_string(),
        }
    }

    // =========================================================================
    // lex / try_lex
    // =========================================================================

    #[test]
    fn test_lex_wraps_match() {
        let p = integer(|s| s.len());
        assert_eq!(run("1234x", &p, "lex"), Ok(Token::new(0, 4, 4)));
    }

    #[test]
    fn test_lex_counts_one_step() {
        let src: Vec<char> = "123".chars().collect();
        let mut state = ParseState::new(&src[..], "lex");
        let word_of_three = lex(is_char('1').then(is_char('2')).then(is_char('3')), str::to_string);
        assert!(word_of_three.parse(&mut state).is_ok());
        assert_eq!(state.step(), 1);
        assert_eq!(state.at(), 3);
    }

    #[test]
    fn test_try_lex_reports_tokenizer_failure() {
        let byte = try_lex(scan_pattern(Pattern::integer(), "integer"), str::parse::<u8>);
        let src: Vec<char> = "300".chars().collect();
        let mut state = ParseState::new(&src[..], "lex");
        assert!(!byte.parse(&mut state).is_ok());
        assert_eq!(state.at(), 0);
        let err = run("300", &byte, "lex").unwrap_err();
        assert_eq!(err.column(), 1);
        assert_eq!(err.message(), "number too large to fit in target type");
    }

    // =========================================================================
    // lexeme
    // =========================================================================

    #[test]
    fn test_lexeme_collects_tokens() {
        let tokens = run("1 22  333 ", &lexer(), "lex").unwrap();
        let indices: Vec<usize> = tokens.iter().map(|t| t.index).collect();
        assert_eq!(indices, vec![0, 2, 6]);
        assert_eq!(tokens[2].value, Tok::Num(333));
    }

    #[test]
    fn test_lexeme_consumes_trailing_delimiter() {
        let src: Vec<char> = "1 + 2  ".chars().collect();
        let mut state = ParseState::new(&src[..], "lex");
        let reply = lexer().parse(&mut state);
        assert_eq!(reply.map(|t| t.len()).into_result().ok(), Some(3));
        assert_eq!(state.at(), 7);
    }

    #[test]
    fn test_lexeme_stops_before_unknown_character() {
        let src: Vec<char> = "1 ?".chars().collect();
        let mut state = ParseState::new(&src[..], "lex");
        assert!(lexer().parse(&mut state).is_ok());
        assert_eq!(state.at(), 2);
    }

    #[test]
    fn test_lexeme_fails_on_partial_token() {
        let ab = lex(is_char('a').then(is_char('b')), str::to_string);
        let p = lexeme(many_chars(is_whitespace), ab);
        let err = run("ab ac", &p, "lex").unwrap_err();
        assert_eq!(err.column(), 5);
        assert_eq!(err.message(), "expecting 'b'");
    }

    #[test]
    fn test_empty_input_lexes_to_nothing() {
        assert_eq!(run("", &lexer(), "lex"), Ok(Vec::new()));
    }

    // =========================================================================
    // operators
    // =========================================================================

    #[test]
    fn test_operators_longest_match() {
        let ops = operators(&["<", "<=", "="], |s| s);
        let p = lexeme(many_chars(is_whitespace), ops);
        let values: Vec<&str> = run("<== <", &p, "lex")
            .unwrap()
            .into_iter()
            .map(|t| t.value)
            .collect();
        assert_eq!(values, vec!["<=", "=", "<"]);
    }

    #[test]
    fn test_operators_mismatch() {
        let err = run("?", &operators(&["+"], |s| s), "lex").unwrap_err();
        assert_eq!(err.message(), "expecting operator");
    }

    // =========================================================================
    // parse_tokens
    // =========================================================================

    #[test]
    fn test_parse_tokens_sums() {
        let p = parse_tokens(lexer(), sum());
        assert_eq!(run("1 + 2 + 39", &p, "sum"), Ok(42));
    }

    #[test]
    fn test_parse_tokens_failure_maps_to_character() {
        let config = TokenConfig::new().with_renderer(render);
        let p = parse_tokens_with(config, lexer(), sum());
        let err = run("1 + + 2", &p, "sum").unwrap_err();
        assert_eq!(err.column(), 5);
        assert_eq!(err.message(), "expecting number, + encountered");
    }

    #[test]
    fn test_parse_tokens_moves_outer_cursor_on_failure() {
        let src: Vec<char> = "1 + + 2".chars().collect();
        let mut state = ParseState::new(&src[..], "sum");
        assert!(!parse_tokens(lexer(), sum()).parse(&mut state).is_ok());
        assert_eq!(state.at(), 4);
    }

    #[test]
    fn test_parse_tokens_hint_reaches_outer_failure() {
        let p = parse_tokens(lexer(), sum()).followed_by(eof("end of input"));
        let err = run("1 + 2 x", &p, "sum").unwrap_err();
        assert_eq!(err.column(), 7);
        assert_eq!(err.message(), "expecting + or end of input");
    }

    #[test]
    fn test_parse_tokens_hint_keeps_expectations_only() {
        let src: Vec<char> = "1 + 2".chars().collect();
        let mut state = ParseState::new(&src[..], "sum");
        match parse_tokens(lexer(), sum()).parse(&mut state) {
            Reply::Ok(value, Some(hint)) => {
                assert_eq!(value, 3);
                let rendered = hint.render();
                assert_eq!(rendered.index, 5);
                assert_eq!(rendered.expecting, vec!["+".to_string()]);
                assert_eq!(rendered.encountered, None);
            }
            other => panic!("expected a success carrying a hint, got {other:?}"),
        }
    }

    #[test]
    fn test_parse_tokens_eof_label() {
        let config = TokenConfig::new()
            .with_renderer(render)
            .with_eof_label("end of expression");
        let p = parse_tokens_with(config, lexer(), sum());
        let err = run("1 +", &p, "sum").unwrap_err();
        assert_eq!(err.column(), 4);
        assert_eq!(err.message(), "expecting number, end of expression encountered");
    }

    #[test]
    fn test_parse_tokens_module() {
        let module: Parser<TokenStream<Tok>, String> =
            Parser::new("module", |state, _| Reply::Ok(state.module().to_string(), None));
        let inherited = parse_tokens(lexer(), module.clone());
        assert_eq!(run("1", &inherited, "chars"), Ok("chars".to_string()));
        let renamed = parse_tokens_with(TokenConfig::new().with_module("tokens"), lexer(), module);
        assert_eq!(run("1", &renamed, "chars"), Ok("tokens".to_string()));
    }
}
