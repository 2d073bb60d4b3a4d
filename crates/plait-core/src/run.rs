//! Entry points that drive a parser over a whole source.

use tracing::{debug, trace};

use crate::error::RenderedError;
use crate::parser::{Parser, Reply};
use crate::position::{DefaultPositionMap, PositionMap};
use crate::state::{ParseState, Source};
use crate::token::TokenStream;
use crate::ParseFailure;

/// Settings for [`run_with_config`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunConfig {
    /// Name reported in failures.
    pub module: String,
    pub start_line: usize,
    pub start_column: usize,
    pub line_break: char,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            module: "parser".to_string(),
            start_line: 1,
            start_column: 1,
            line_break: '\n',
        }
    }
}

impl RunConfig {
    pub fn with_module(mut self, module: impl Into<String>) -> Self {
        self.module = module.into();
        self
    }

    pub fn with_origin(mut self, line: usize, column: usize) -> Self {
        self.start_line = line;
        self.start_column = column;
        self
    }

    pub fn with_line_break(mut self, line_break: char) -> Self {
        self.line_break = line_break;
        self
    }
}

/// Parse `source` with 1-based positions.
pub fn run<T: 'static>(
    source: &str,
    parser: &Parser<[char], T>,
    module: &str,
) -> Result<T, ParseFailure> {
    run_with_config(source, parser, &RunConfig::default().with_module(module))
}

pub fn run_with_config<T: 'static>(
    source: &str,
    parser: &Parser<[char], T>,
    config: &RunConfig,
) -> Result<T, ParseFailure> {
    let chars: Vec<char> = source.chars().collect();
    let mut map = DefaultPositionMap::with_origin(
        &chars,
        config.start_line,
        config.start_column,
        config.line_break,
    );
    drive(&chars[..], parser, &mut map, &config.module)
}

/// Parse pre-split characters, resolving failures through `map`.
pub fn run_with_map<T: 'static>(
    source: &[char],
    parser: &Parser<[char], T>,
    map: &mut dyn PositionMap,
    module: &str,
) -> Result<T, ParseFailure> {
    drive(source, parser, map, module)
}

/// Parse an already lexed token stream.
///
/// `map` resolves the character indices the tokens carry.
pub fn run_tokens<V: 'static, T: 'static>(
    tokens: &TokenStream<V>,
    parser: &Parser<TokenStream<V>, T>,
    map: &mut dyn PositionMap,
    module: &str,
) -> Result<T, ParseFailure> {
    drive(tokens, parser, map, module)
}

fn drive<S, T>(
    source: &S,
    parser: &Parser<S, T>,
    map: &mut dyn PositionMap,
    module: &str,
) -> Result<T, ParseFailure>
where
    S: Source + ?Sized + 'static,
    T: 'static,
{
    let mut state = ParseState::new(source, module);
    trace!(module, parser = parser.name(), units = source.len(), "run started");
    match parser.parse(&mut state) {
        Reply::Ok(value, _) => {
            trace!(module, at = state.at(), steps = state.step(), "run finished");
            Ok(value)
        }
        Reply::Err(err) => {
            let index = err.as_ref().map_or_else(|| state.index(), |e| e.index());
            let position = map.to_pos(index);
            let rendered = err.map_or_else(|| RenderedError::empty(index), |e| e.render());
            debug!(
                module,
                index,
                line = position.line,
                column = position.column,
                error = %rendered,
                "run failed"
            );
            Err(match rendered.abnormal {
                Some(payload) => ParseFailure::Aborted {
                    module: module.to_string(),
                    position,
                    index,
                    payload,
                },
                None => ParseFailure::Syntax {
                    module: module.to_string(),
                    position,
                    message: rendered.to_string(),
                    error: rendered,
                },
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::combinators::{eof, raise};
    use crate::position::Pos;
    use crate::token::{token, Token};
    use pretty_assertions::assert_eq;

    fn ch(c: char) -> Parser<[char], char> {
        Parser::new(format!("{c:?}"), move |state, _| match state.peek() {
            Some(&x) if x == c => {
                state.advance(1);
                Reply::Ok(c, None)
            }
            _ => Reply::Err(Some(state.unexpected_here())),
        })
    }

    #[test]
    fn test_run_success() {
        let p = ch('a').then(ch('b'));
        assert_eq!(run("ab", &p, "t"), Ok('b'));
    }

    #[test]
    fn test_run_failure_position() {
        let p = ch('a').then(ch('\n')).then(ch('b')).followed_by(eof("EOF"));
        let err = run("a\nc", &p, "grammar").unwrap_err();
        assert_eq!(err.position(), Pos::new(2, 1));
        assert_eq!(err.module(), "grammar");
        match &err {
            ParseFailure::Syntax { error, .. } => {
                assert_eq!(error.index, 2);
                assert_eq!(error.encountered.as_deref(), Some("'c'"));
            }
            other => panic!("expected syntax failure, got {other:?}"),
        }
        assert_eq!(
            err.to_string(),
            "grammar: parse error at line 2, column 1: 'c' encountered"
        );
    }

    #[test]
    fn test_run_without_error_uses_cursor() {
        let p = ch('a').then(crate::combinators::zero::<[char], ()>());
        let err = run("ab", &p, "t").unwrap_err();
        assert_eq!(err.position(), Pos::new(1, 2));
        assert_eq!(err.message(), "syntax error");
    }

    #[test]
    fn test_run_abnormal_is_aborted() {
        let p = ch('a').then(raise::<[char], ()>("gave up"));
        match run("ab", &p, "t") {
            Err(ParseFailure::Aborted { index, payload, .. }) => {
                assert_eq!(index, 1);
                assert_eq!(payload, "gave up");
            }
            other => panic!("expected abort, got {other:?}"),
        }
    }

    #[test]
    fn test_run_with_config_origin() {
        let config = RunConfig::default()
            .with_module("cfg")
            .with_origin(10, 5)
            .with_line_break(';');
        let err = run_with_config("a;x", &ch('a').then(ch(';')).then(ch('b')), &config).unwrap_err();
        assert_eq!(err.position(), Pos::new(11, 1));
    }

    #[test]
    fn test_run_with_map() {
        let chars: Vec<char> = "xy".chars().collect();
        let mut map = DefaultPositionMap::new(&chars);
        assert_eq!(run_with_map(&chars, &ch('x'), &mut map, "m"), Ok('x'));
    }

    #[test]
    fn test_run_tokens_reports_character_position() {
        let source: Vec<char> = "1\n  +".chars().collect();
        let stream = TokenStream::new(
            vec![Token::new(0, 1, 1i64), Token::new(4, 1, 0i64)],
            5,
        );
        let one = token(|v: &i64| (*v == 1).then_some(*v));
        let p = one.clone().then(one);
        let mut map = DefaultPositionMap::new(&source);
        let err = run_tokens(&stream, &p, &mut map, "tokens").unwrap_err();
        assert_eq!(err.position(), Pos::new(2, 3));
    }
}
