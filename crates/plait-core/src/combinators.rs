//! Free-standing combinators: primitives, choice, and operator folds.

use std::sync::Arc;

use crate::error::ParseError;
use crate::parser::{aborts, Parser, Reply};
use crate::state::{Snapshot, Source};

/// Function produced by a prefix or postfix operator parser.
pub type UnaryOp<T> = Arc<dyn Fn(T) -> T + Send + Sync>;
/// Function produced by an infix operator parser.
pub type BinaryOp<T> = Arc<dyn Fn(T, T) -> T + Send + Sync>;

pub fn unary<T>(f: impl Fn(T) -> T + Send + Sync + 'static) -> UnaryOp<T> {
    Arc::new(f)
}

pub fn binary<T>(f: impl Fn(T, T) -> T + Send + Sync + 'static) -> BinaryOp<T> {
    Arc::new(f)
}

// =============================================================================
// Primitives
// =============================================================================

/// Succeed with `value` without touching the input.
pub fn succeed<S, T>(value: T) -> Parser<S, T>
where
    S: Source + ?Sized + 'static,
    T: Clone + Send + Sync + 'static,
{
    Parser::new("succeed", move |_, _| Reply::Ok(value.clone(), None))
}

/// Fail without an error.
pub fn zero<S, T>() -> Parser<S, T>
where
    S: Source + ?Sized + 'static,
    T: 'static,
{
    Parser::new("zero", |_, _| Reply::Err(None))
}

/// Fail with a raw message.
pub fn fail<S, T>(message: impl Into<String>) -> Parser<S, T>
where
    S: Source + ?Sized + 'static,
    T: 'static,
{
    let message: String = message.into();
    Parser::new("fail", move |state, _| Reply::Err(Some(state.raw(message.as_str()))))
}

/// Fail with "expecting `label`".
pub fn expect<S, T>(label: impl Into<String>) -> Parser<S, T>
where
    S: Source + ?Sized + 'static,
    T: 'static,
{
    let label: String = label.into();
    Parser::new("expect", move |state, _| Reply::Err(Some(state.expecting(label.as_str()))))
}

/// Fail with "unexpected `label`".
pub fn unexpected<S, T>(label: impl Into<String>) -> Parser<S, T>
where
    S: Source + ?Sized + 'static,
    T: 'static,
{
    let label: String = label.into();
    Parser::new("unexpected", move |state, _| {
        Reply::Err(Some(state.unexpected(label.as_str())))
    })
}

/// Abort the whole run with `payload`. No choice point recovers from this;
/// only [`Parser::catch`] does.
pub fn raise<S, T>(payload: impl Into<String>) -> Parser<S, T>
where
    S: Source + ?Sized + 'static,
    T: 'static,
{
    let payload: String = payload.into();
    Parser::new("raise", move |state, _| {
        Reply::Err(Some(ParseError::abnormal(state.index(), payload.as_str())))
    })
}

/// The current character index.
pub fn index<S>() -> Parser<S, usize>
where
    S: Source + ?Sized + 'static,
{
    Parser::new("index", |state, _| Reply::Ok(state.index(), None))
}

/// Succeed only at the end of input.
pub fn eof<S>(label: impl Into<String>) -> Parser<S, ()>
where
    S: Source + ?Sized + 'static,
{
    let label: String = label.into();
    Parser::new("eof", move |state, _| {
        if state.is_at_end() {
            Reply::Ok((), None)
        } else {
            Reply::Err(ParseError::merge(
                Some(state.expecting(label.as_str())),
                Some(state.unexpected_here()),
            ))
        }
    })
}

/// Run a side effect and succeed with `()`.
pub fn action<S>(f: impl Fn() + Send + Sync + 'static) -> Parser<S, ()>
where
    S: Source + ?Sized + 'static,
{
    Parser::new("action", move |_, _| {
        f();
        Reply::Ok((), None)
    })
}

// =============================================================================
// Sequencing
// =============================================================================

pub fn map2<S, A, B, R>(
    a: Parser<S, A>,
    b: Parser<S, B>,
    f: impl Fn(A, B) -> R + Send + Sync + 'static,
) -> Parser<S, R>
where
    S: Source + ?Sized + 'static,
    A: 'static,
    B: 'static,
    R: 'static,
{
    Parser::new("map2", move |state, _| match a.parse(state) {
        Reply::Ok(x, hint) => b.parse(state).merge_hint(hint).map(|y| f(x, y)),
        Reply::Err(e) => Reply::Err(e),
    })
}

pub fn map3<S, A, B, C, R>(
    a: Parser<S, A>,
    b: Parser<S, B>,
    c: Parser<S, C>,
    f: impl Fn(A, B, C) -> R + Send + Sync + 'static,
) -> Parser<S, R>
where
    S: Source + ?Sized + 'static,
    A: 'static,
    B: 'static,
    C: 'static,
    R: 'static,
{
    map2(a.zip(b), c, move |(x, y), z| f(x, y, z))
}

/// Run every parser in order and collect the results.
pub fn sequence<S, T>(parsers: impl IntoIterator<Item = Parser<S, T>>) -> Parser<S, Vec<T>>
where
    S: Source + ?Sized + 'static,
    T: 'static,
{
    let parsers: Vec<Parser<S, T>> = parsers.into_iter().collect();
    Parser::new("sequence", move |state, _| {
        let mut items = Vec::with_capacity(parsers.len());
        let mut hint = None;
        for p in &parsers {
            match p.parse(state) {
                Reply::Ok(v, h) => {
                    items.push(v);
                    hint = ParseError::merge(hint, h);
                }
                Reply::Err(e) => return Reply::Err(ParseError::merge(hint, e)),
            }
        }
        Reply::Ok(items, hint)
    })
}

/// Run every parser in order, keeping the last result.
///
/// # Panics
///
/// Panics if `parsers` is empty.
pub fn seq<S, T>(parsers: impl IntoIterator<Item = Parser<S, T>>) -> Parser<S, T>
where
    S: Source + ?Sized + 'static,
    T: 'static,
{
    let mut init: Vec<Parser<S, T>> = parsers.into_iter().collect();
    let Some(last) = init.pop() else {
        panic!("seq needs at least one parser");
    };
    Parser::new("seq", move |state, _| {
        let mut hint = None;
        for p in &init {
            match p.parse(state) {
                Reply::Ok(_, h) => hint = ParseError::merge(hint, h),
                Reply::Err(e) => return Reply::Err(ParseError::merge(hint, e)),
            }
        }
        last.parse(state).merge_hint(hint)
    })
}

// =============================================================================
// Choice
// =============================================================================

/// Try alternatives in order.
///
/// A failed alternative hands over to the next one only while it consumed
/// fewer steps than the lookahead budget the choice was invoked with (1 by
/// default, so any consumption commits). Abnormal failures are never
/// recovered. Nested choices are flattened.
pub fn choice<S, T>(parsers: impl IntoIterator<Item = Parser<S, T>>) -> Parser<S, T>
where
    S: Source + ?Sized + 'static,
    T: 'static,
{
    let mut flat: Vec<Parser<S, T>> = Vec::new();
    for p in parsers {
        match p.alternatives() {
            Some(alternatives) => flat.extend(alternatives.iter().cloned()),
            None => flat.push(p),
        }
    }
    match flat.len() {
        0 => return zero(),
        1 => return flat.remove(0),
        _ => {}
    }
    let alternatives: Arc<[Parser<S, T>]> = flat.into();
    let tried = Arc::clone(&alternatives);
    Parser::new("choice", move |state, budget| {
        let snapshot = state.save();
        let mut err = None;
        for p in tried.iter() {
            match p.parse(state) {
                Reply::Ok(v, hint) => return Reply::Ok(v, ParseError::merge(err, hint)),
                Reply::Err(e) => {
                    if aborts(&e) {
                        return Reply::Err(e);
                    }
                    err = ParseError::merge(err, e);
                    if state.committed_since(snapshot, budget) {
                        return Reply::Err(err);
                    }
                    state.restore(snapshot);
                }
            }
        }
        Reply::Err(err)
    })
    .with_alternatives(alternatives)
}

/// [`choice`] with an explicit lookahead budget.
pub fn choice_with_lookahead<S, T>(
    parsers: impl IntoIterator<Item = Parser<S, T>>,
    lookahead: usize,
) -> Parser<S, T>
where
    S: Source + ?Sized + 'static,
    T: 'static,
{
    choice(parsers).lookahead(lookahead)
}

fn favored<S, T>(
    name: &'static str,
    parsers: impl IntoIterator<Item = Parser<S, T>>,
    prefer: fn(usize, usize) -> bool,
) -> Parser<S, T>
where
    S: Source + ?Sized + 'static,
    T: 'static,
{
    let parsers: Vec<Parser<S, T>> = parsers.into_iter().collect();
    Parser::new(name, move |state, _| {
        let start = state.save();
        let mut err = None;
        let mut best: Option<(T, Snapshot, Option<ParseError>)> = None;
        for p in &parsers {
            state.restore(start);
            match p.parse(state) {
                Reply::Ok(v, hint) => {
                    let better = best
                        .as_ref()
                        .map_or(true, |(_, end, _)| prefer(state.at(), end.at));
                    if better {
                        best = Some((v, state.save(), hint));
                    }
                }
                Reply::Err(e) => {
                    if aborts(&e) {
                        return Reply::Err(e);
                    }
                    err = ParseError::merge(err, e);
                }
            }
        }
        match best {
            Some((v, end, hint)) => {
                state.restore(end);
                Reply::Ok(v, ParseError::merge(err, hint))
            }
            None => {
                state.restore(start);
                Reply::Err(err)
            }
        }
    })
}

/// Run every alternative; keep the success that got furthest, the first
/// listed on ties.
pub fn longest<S, T>(parsers: impl IntoIterator<Item = Parser<S, T>>) -> Parser<S, T>
where
    S: Source + ?Sized + 'static,
    T: 'static,
{
    favored("longest", parsers, |at, best| at > best)
}

/// Run every alternative; keep the success that moved least, the first
/// listed on ties.
pub fn shortest<S, T>(parsers: impl IntoIterator<Item = Parser<S, T>>) -> Parser<S, T>
where
    S: Source + ?Sized + 'static,
    T: 'static,
{
    favored("shortest", parsers, |at, best| at < best)
}

// =============================================================================
// Operator folds
// =============================================================================

/// Any number of prefix operators before an operand, innermost applied
/// first: `- ! x` is `-(!x)`.
pub fn prefix<S, T>(op: Parser<S, UnaryOp<T>>, operand: Parser<S, T>) -> Parser<S, T>
where
    S: Source + ?Sized + 'static,
    T: 'static,
{
    map2(op.many(), operand, |ops, v| {
        ops.into_iter().rev().fold(v, |acc, f| f(acc))
    })
}

/// An operand followed by any number of postfix operators, applied left to
/// right.
pub fn postfix<S, T>(op: Parser<S, UnaryOp<T>>, operand: Parser<S, T>) -> Parser<S, T>
where
    S: Source + ?Sized + 'static,
    T: 'static,
{
    map2(operand, op.many(), |v, ops| ops.into_iter().fold(v, |acc, f| f(acc)))
}

/// Left-associative chain: `a+b+c` is `(a+b)+c`.
pub fn infixl<S, T>(op: Parser<S, BinaryOp<T>>, operand: Parser<S, T>) -> Parser<S, T>
where
    S: Source + ?Sized + 'static,
    T: 'static,
{
    let rest = op.zip(operand.clone()).many();
    map2(operand, rest, |first, rest| {
        rest.into_iter().fold(first, |acc, (f, rhs)| f(acc, rhs))
    })
}

/// Right-associative chain: `a+b+c` is `a+(b+c)`.
pub fn infixr<S, T>(op: Parser<S, BinaryOp<T>>, operand: Parser<S, T>) -> Parser<S, T>
where
    S: Source + ?Sized + 'static,
    T: 'static,
{
    let rest = op.zip(operand.clone()).many();
    map2(operand, rest, |first, rest| {
        let mut pairs = rest.into_iter().rev();
        let Some((mut pending, mut acc)) = pairs.next() else {
            return first;
        };
        for (f, lhs) in pairs {
            acc = pending(lhs, acc);
            pending = f;
        }
        pending(first, acc)
    })
}

/// Non-associative: at most one operator. `a+b+c` is an error, reported
/// at the second operator.
pub fn infixn<S, T>(op: Parser<S, BinaryOp<T>>, operand: Parser<S, T>) -> Parser<S, T>
where
    S: Source + ?Sized + 'static,
    T: 'static,
{
    let rest = op.clone().zip(operand.clone());
    Parser::new("infixn", move |state, _| {
        let (first, hint) = match operand.parse(state) {
            Reply::Ok(v, h) => (v, h),
            Reply::Err(e) => return Reply::Err(e),
        };
        let before_op = state.save();
        let (value, hint) = match rest.parse(state) {
            Reply::Ok((f, rhs), h) => (f(first, rhs), ParseError::merge(hint, h)),
            Reply::Err(e) => {
                if aborts(&e) || state.consumed_since(before_op) {
                    return Reply::Err(ParseError::merge(hint, e));
                }
                state.restore(before_op);
                return Reply::Ok(first, ParseError::merge(hint, e));
            }
        };
        let second_op = state.save();
        let reply = op.parse(state);
        state.restore(second_op);
        match reply {
            Reply::Ok(..) => Reply::Err(ParseError::merge(
                hint,
                Some(state.raw("non-associative operator cannot be chained")),
            )),
            Reply::Err(e) if aborts(&e) => Reply::Err(e),
            Reply::Err(e) => Reply::Ok(value, ParseError::merge(hint, e)),
        }
    })
}
