//! Character-level scanners.
//!
//! A scanner is a `Parser<[char], ()>`: it recognizes input and moves the
//! cursor but produces nothing. Lexers (see [`crate::lexer`]) turn what a
//! scanner matched into tokens.

use plait_core::{ParseError, ParseState, Parser, Reply, Snapshot};

use crate::chars::{is_alphanumeric_, is_whitespace};
use crate::pattern::Pattern;

pub type Scanner = Parser<[char], ()>;

/// Advance by whatever `pattern` matches, or fail with "expecting `label`".
pub fn scan_pattern(pattern: Pattern, label: impl Into<String>) -> Scanner {
    let label: String = label.into();
    Parser::new(label.clone(), move |state, _| {
        match pattern.match_at(state.source(), state.at()) {
            Some(n) => {
                state.advance(n);
                Reply::Ok((), None)
            }
            None => Reply::Err(Some(state.expecting(label.as_str()))),
        }
    })
}

/// One character satisfying `predicate`.
///
/// Unlike [`scan_pattern`], a mismatch reports the character found.
pub fn char_if(
    predicate: impl Fn(char) -> bool + Send + Sync + 'static,
    label: impl Into<String>,
) -> Scanner {
    let label: String = label.into();
    Parser::new(label.clone(), move |state, _| match state.peek() {
        Some(&c) if predicate(c) => {
            state.advance(1);
            Reply::Ok((), None)
        }
        _ => Reply::Err(ParseError::merge(
            Some(state.expecting(label.as_str())),
            Some(state.unexpected_here()),
        )),
    })
}

pub fn is_char(c: char) -> Scanner {
    char_if(move |x| x == c, format!("{c:?}"))
}

pub fn not_char(c: char) -> Scanner {
    char_if(move |x| x != c, format!("not {c:?}"))
}

pub fn any_char() -> Scanner {
    char_if(|_| true, "any character")
}

pub fn among(set: &str, label: impl Into<String>) -> Scanner {
    char_if(crate::chars::among(set), label)
}

pub fn not_among(set: &str, label: impl Into<String>) -> Scanner {
    char_if(crate::chars::not_among(set), label)
}

pub fn string(text: &str) -> Scanner {
    scan_pattern(Pattern::string(text), text)
}

pub fn string_ci(text: &str) -> Scanner {
    scan_pattern(Pattern::string_ci(text), text)
}

/// One or more whitespace characters.
pub fn whitespaces() -> Scanner {
    scan_pattern(Pattern::char_if(is_whitespace).many1(), "whitespaces")
}

/// Zero or more characters satisfying `predicate`.
pub fn many_chars(predicate: impl Fn(char) -> bool + Send + Sync + 'static) -> Scanner {
    scan_pattern(Pattern::char_if(predicate).many(), "characters")
}

/// `scanner`, provided no identifier character follows it.
///
/// `delimited(string("if"))` accepts `if (` but not `iffy`.
pub fn delimited(scanner: Scanner) -> Scanner {
    let label = scanner.name().to_string();
    scanner
        .followed_by(scan_pattern(Pattern::char_if(is_alphanumeric_).not(), "delimiter"))
        .atomic()
        .label(label)
}

/// Run `scanner` and return the text it consumed.
pub fn matched(scanner: Scanner) -> Parser<[char], String> {
    Parser::new("matched", move |state, _| {
        let start = state.at();
        scanner
            .parse(state)
            .map(|()| state.source()[start..state.at()].iter().collect())
    })
}

/// Try a sub-scanner; on failure back out and report whether it matched.
///
/// # Panics
///
/// Panics when the sub-scanner succeeds without consuming input.
fn attempt(
    scanner: &Scanner,
    state: &mut ParseState<'_, [char]>,
    role: &str,
) -> Result<bool, Option<ParseError>> {
    let snapshot: Snapshot = state.save();
    match scanner.parse(state) {
        Reply::Ok(..) => {
            assert!(
                state.consumed_since(snapshot),
                "nestable block {role} scanner `{}` matched without consuming input",
                scanner.name()
            );
            Ok(true)
        }
        Reply::Err(e) if e.as_ref().is_some_and(ParseError::is_abnormal) => Err(e),
        Reply::Err(_) => {
            state.restore(snapshot);
            Ok(false)
        }
    }
}

fn next_depth(
    open: &Scanner,
    close: &Scanner,
    body: &Scanner,
    state: &mut ParseState<'_, [char]>,
    depth: usize,
) -> Result<Option<usize>, Option<ParseError>> {
    if attempt(close, state, "close")? {
        return Ok(Some(depth - 1));
    }
    if attempt(open, state, "open")? {
        return Ok(Some(depth + 1));
    }
    if attempt(body, state, "body")? {
        return Ok(Some(depth));
    }
    Ok(None)
}

/// A block delimited by `open` and `close` that may nest, such as
/// `/* a /* b */ c */`. Between delimiters, `body` consumes the content.
///
/// Counts as a single step.
///
/// # Panics
///
/// Panics when `open`, `close` or `body` succeeds without consuming input,
/// since the block could then never end.
pub fn nestable_block(open: Scanner, close: Scanner, body: Scanner) -> Scanner {
    Parser::new("nestable block", move |state, _| {
        let start = state.save();
        match open.parse(state) {
            Reply::Ok(..) => {}
            Reply::Err(e) => return Reply::Err(e),
        }
        let mut depth = 1usize;
        while depth > 0 {
            match next_depth(&open, &close, &body, state, depth) {
                Ok(Some(d)) => depth = d,
                Ok(None) => return Reply::Err(Some(state.expecting(close.name()))),
                Err(e) => return Reply::Err(e),
            }
        }
        state.set_step(start.step + 1);
        Reply::Ok((), None)
    })
}

/// Run `outer` to find a range, then run `inner` over exactly that range.
///
/// `inner` must consume the whole range. Error indices stay relative to the
/// full source.
pub fn scan_nested(outer: Scanner, inner: Scanner) -> Scanner {
    Parser::new("nested scan", move |state, _| {
        let start = state.save();
        if let Reply::Err(e) = outer.parse(state) {
            return Reply::Err(e);
        }
        let end = state.at();
        let mut nested = ParseState::new(&state.source()[..end], state.module());
        nested.set_at(start.at);
        match inner.parse(&mut nested) {
            Reply::Ok(..) if nested.at() == end => {
                state.set_step(start.step + 1);
                Reply::Ok((), None)
            }
            Reply::Ok(..) => {
                let err = nested.raw("unconsumed input in nested scan");
                state.set_at(nested.at());
                Reply::Err(Some(err))
            }
            Reply::Err(e) => {
                state.set_at(nested.at());
                Reply::Err(e)
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use plait_core::run;
    use pretty_assertions::assert_eq;

    fn scan(s: &Scanner, input: &str) -> (bool, usize) {
        let src: Vec<char> = input.chars().collect();
        let mut state = ParseState::new(&src[..], "scan");
        let ok = s.parse(&mut state).is_ok();
        (ok, state.at())
    }

    fn c_comment() -> Scanner {
        nestable_block(string("/*"), string("*/"), any_char())
    }

    // =========================================================================
    // Basic scanners
    // =========================================================================

    #[test]
    fn test_pattern_scanner() {
        let p = scan_pattern(Pattern::integer(), "integer");
        assert_eq!(scan(&p, "123+"), (true, 3));
        let err = run("x", &p, "scan").unwrap_err();
        assert_eq!(err.message(), "expecting integer");
    }

    #[test]
    fn test_char_scanners() {
        assert_eq!(scan(&is_char('a'), "ab"), (true, 1));
        assert_eq!(scan(&is_char('a'), "b"), (false, 0));
        assert_eq!(scan(&not_char('a'), "b"), (true, 1));
        assert_eq!(scan(&any_char(), ""), (false, 0));
        assert_eq!(scan(&among("+-", "sign"), "-"), (true, 1));
        assert_eq!(scan(&not_among("+-", "non-sign"), "-"), (false, 0));
    }

    #[test]
    fn test_char_mismatch_message() {
        let err = run("b", &is_char('a'), "scan").unwrap_err();
        assert_eq!(err.message(), "expecting 'a'");
    }

    #[test]
    fn test_strings() {
        assert_eq!(scan(&string("let"), "let x"), (true, 3));
        assert_eq!(scan(&string_ci("LET"), "let x"), (true, 3));
        assert_eq!(scan(&whitespaces(), " \t\nx"), (true, 3));
        assert_eq!(scan(&whitespaces(), "x"), (false, 0));
        assert_eq!(scan(&many_chars(|c| c == 'z'), "x"), (true, 0));
    }

    #[test]
    fn test_delimited_keyword() {
        let kw = delimited(string("if"));
        assert_eq!(scan(&kw, "if (x)"), (true, 2));
        assert_eq!(scan(&kw, "if"), (true, 2));
        assert_eq!(scan(&kw, "iffy"), (false, 0));
        let err = run("iffy", &kw, "scan").unwrap_err();
        assert_eq!(err.message(), "expecting if");
    }

    #[test]
    fn test_matched_text() {
        let p = matched(scan_pattern(Pattern::word(), "word"));
        assert_eq!(run("hello world", &p, "scan"), Ok("hello".to_string()));
    }

    // =========================================================================
    // Nestable blocks
    // =========================================================================

    #[test]
    fn test_flat_block() {
        assert_eq!(scan(&c_comment(), "/* hi */x"), (true, 8));
    }

    #[test]
    fn test_nested_block() {
        let input = "/* a /* b */ c */rest";
        assert_eq!(scan(&c_comment(), input), (true, input.len() - 4));
    }

    #[test]
    fn test_unclosed_block() {
        let err = run("/* open", &c_comment(), "scan").unwrap_err();
        assert_eq!(err.message(), "expecting */");
        assert_eq!(err.column(), 8);
    }

    #[test]
    fn test_block_counts_one_step() {
        let src: Vec<char> = "/* x */".chars().collect();
        let mut state = ParseState::new(&src[..], "scan");
        assert!(c_comment().parse(&mut state).is_ok());
        assert_eq!(state.step(), 1);
    }

    #[test]
    #[should_panic(expected = "without consuming input")]
    fn test_block_rejects_empty_body() {
        let block = nestable_block(string("("), string(")"), many_chars(|c| c == 'x'));
        let _ = scan(&block, "(y)");
    }

    // =========================================================================
    // Nested scanning
    // =========================================================================

    #[test]
    fn test_scan_nested_limits_inner() {
        // Outer finds a quoted range; inner must be all digits within it.
        let quoted = is_char('"')
            .then(many_chars(|c| c != '"'))
            .then(is_char('"'));
        let inner = is_char('"')
            .then(scan_pattern(Pattern::integer(), "digits"))
            .then(is_char('"'));
        let p = scan_nested(quoted.clone(), inner.clone());
        assert_eq!(scan(&p, "\"123\" tail"), (true, 5));
        let err = run("\"12a\"", &p, "scan").unwrap_err();
        assert_eq!(err.column(), 4);
    }

    #[test]
    fn test_scan_nested_requires_full_range() {
        let outer = scan_pattern(Pattern::word(), "word");
        let inner = scan_pattern(Pattern::string("ab"), "ab");
        let err = run("abc", &scan_nested(outer, inner), "scan").unwrap_err();
        assert_eq!(err.message(), "unconsumed input in nested scan");
    }
}
