//! The parser value and its method algebra.
//!
//! A [`Parser`] is an immutable function object over a [`ParseState`]. It is
//! cheap to clone and may be shared between threads; every run owns its own
//! state. Ordinary failure is a [`Reply::Err`] value, never a Rust error.
//!
//! The `budget` argument threaded through every call is the lookahead budget
//! consulted by choice points (see [`crate::choice`]). Sequencing combinators
//! invoke their children with the default budget of 1; wrappers that do not
//! change what their inner parser consumes pass the budget through.

use std::fmt;
use std::ops::BitOr;
use std::sync::{Arc, OnceLock};

use tracing::trace;

use crate::combinators::{choice, map2};
use crate::error::ParseError;
use crate::state::{ParseState, Snapshot, Source};

/// Default lookahead budget: any consumption commits.
pub const DEFAULT_LOOKAHEAD: usize = 1;

/// Result of applying a parser.
#[derive(Debug, Clone, PartialEq)]
pub enum Reply<T> {
    /// Success. The error is the best one seen on the way (from alternatives
    /// that were tried and abandoned) and is merged into any later failure.
    Ok(T, Option<ParseError>),
    Err(Option<ParseError>),
}

impl<T> Reply<T> {
    pub fn is_ok(&self) -> bool {
        matches!(self, Reply::Ok(..))
    }

    /// The failure, or the hint carried by a success.
    pub fn error(&self) -> Option<&ParseError> {
        match self {
            Reply::Ok(_, hint) | Reply::Err(hint) => hint.as_ref(),
        }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Reply<U> {
        match self {
            Reply::Ok(v, hint) => Reply::Ok(f(v), hint),
            Reply::Err(e) => Reply::Err(e),
        }
    }

    /// Merge an earlier sibling's error into this reply.
    pub fn merge_hint(self, earlier: Option<ParseError>) -> Self {
        match self {
            Reply::Ok(v, hint) => Reply::Ok(v, ParseError::merge(earlier, hint)),
            Reply::Err(e) => Reply::Err(ParseError::merge(earlier, e)),
        }
    }

    pub fn into_result(self) -> Result<T, Option<ParseError>> {
        match self {
            Reply::Ok(v, _) => Ok(v),
            Reply::Err(e) => Err(e),
        }
    }
}

pub(crate) fn aborts(err: &Option<ParseError>) -> bool {
    err.as_ref().is_some_and(ParseError::is_abnormal)
}

/// Decide whether a failure since `snapshot` may fall back to another branch.
///
/// Returns the error unchanged when the failure is abnormal or consumed at
/// least `budget` steps; otherwise restores `snapshot` and runs `fallback`.
pub(crate) fn recover<S, T>(
    state: &mut ParseState<'_, S>,
    snapshot: Snapshot,
    budget: usize,
    err: Option<ParseError>,
    fallback: impl FnOnce(&mut ParseState<'_, S>) -> Reply<T>,
) -> Reply<T>
where
    S: Source + ?Sized,
{
    if aborts(&err) || state.committed_since(snapshot, budget) {
        return Reply::Err(err);
    }
    state.restore(snapshot);
    fallback(state).merge_hint(err)
}

/// Greedy repetition shared by the `many`/`some` family.
///
/// Runs `p` at most `max` times, folding results into `acc`. An iteration
/// that succeeds without moving the cursor ends the loop and is dropped. A
/// failure that consumed input, or an abnormal one, fails the repetition.
pub(crate) fn fold_greedy<S, T, A>(
    p: &Parser<S, T>,
    state: &mut ParseState<'_, S>,
    max: usize,
    mut acc: A,
    f: impl Fn(A, T) -> A,
) -> Result<(A, Option<ParseError>), Option<ParseError>>
where
    S: Source + ?Sized + 'static,
    T: 'static,
{
    let mut hint = None;
    let mut count = 0;
    while count < max {
        let snapshot = state.save();
        match p.parse(state) {
            Reply::Ok(v, h) => {
                hint = ParseError::merge(hint, h);
                if !state.consumed_since(snapshot) {
                    break;
                }
                acc = f(acc, v);
                count += 1;
            }
            Reply::Err(e) => {
                if aborts(&e) || state.consumed_since(snapshot) {
                    return Err(ParseError::merge(hint, e));
                }
                state.restore(snapshot);
                return Ok((acc, ParseError::merge(hint, e)));
            }
        }
    }
    Ok((acc, hint))
}

type ParseFn<S, T> = dyn Fn(&mut ParseState<'_, S>, usize) -> Reply<T> + Send + Sync;

/// A reusable, stateless parser producing `T` from a source `S`.
pub struct Parser<S: ?Sized, T> {
    name: Arc<str>,
    run: Arc<ParseFn<S, T>>,
    alternatives: Option<Arc<[Parser<S, T>]>>,
}

impl<S: ?Sized, T> Clone for Parser<S, T> {
    fn clone(&self) -> Self {
        Self {
            name: Arc::clone(&self.name),
            run: Arc::clone(&self.run),
            alternatives: self.alternatives.clone(),
        }
    }
}

impl<S: ?Sized, T> fmt::Debug for Parser<S, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Parser").field(&self.name).finish()
    }
}

impl<S, T> Parser<S, T>
where
    S: Source + ?Sized + 'static,
    T: 'static,
{
    /// Build a parser from its apply function `(state, budget) -> reply`.
    pub fn new<F>(name: impl Into<Arc<str>>, f: F) -> Self
    where
        F: Fn(&mut ParseState<'_, S>, usize) -> Reply<T> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            run: Arc::new(f),
            alternatives: None,
        }
    }

    pub(crate) fn with_alternatives(mut self, alternatives: Arc<[Parser<S, T>]>) -> Self {
        self.alternatives = Some(alternatives);
        self
    }

    pub(crate) fn alternatives(&self) -> Option<&[Parser<S, T>]> {
        self.alternatives.as_deref()
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Same parser, different name.
    pub fn named(self, name: impl Into<Arc<str>>) -> Self {
        Self {
            name: name.into(),
            ..self
        }
    }

    /// Apply with the default lookahead budget.
    pub fn parse(&self, state: &mut ParseState<'_, S>) -> Reply<T> {
        (self.run)(state, DEFAULT_LOOKAHEAD)
    }

    pub fn parse_with(&self, state: &mut ParseState<'_, S>, budget: usize) -> Reply<T> {
        (self.run)(state, budget)
    }

    // =========================================================================
    // Transformation and sequencing
    // =========================================================================

    pub fn map<U: 'static>(self, f: impl Fn(T) -> U + Send + Sync + 'static) -> Parser<S, U> {
        let name = Arc::clone(&self.name);
        Parser::new(name, move |state, budget| self.parse_with(state, budget).map(&f))
    }

    /// Run `self`, then the parser `f` builds from its result.
    pub fn bind<U: 'static>(
        self,
        f: impl Fn(T) -> Parser<S, U> + Send + Sync + 'static,
    ) -> Parser<S, U> {
        Parser::new("bind", move |state, _| match self.parse(state) {
            Reply::Ok(v, hint) => f(v).parse(state).merge_hint(hint),
            Reply::Err(e) => Reply::Err(e),
        })
    }

    /// Run `self` then `next`, keeping `next`'s result.
    pub fn then<U: 'static>(self, next: Parser<S, U>) -> Parser<S, U> {
        map2(self, next, |_, b| b)
    }

    /// Run `self` then `next`, keeping `self`'s result.
    pub fn followed_by<U: 'static>(self, next: Parser<S, U>) -> Parser<S, T> {
        map2(self, next, |a, _| a)
    }

    pub fn zip<U: 'static>(self, next: Parser<S, U>) -> Parser<S, (T, U)> {
        map2(self, next, |a, b| (a, b))
    }

    pub fn between<O: 'static, C: 'static>(self, open: Parser<S, O>, close: Parser<S, C>) -> Self {
        open.then(self).followed_by(close)
    }

    /// `self`, or `other` if `self` fails without committing.
    pub fn or(self, other: Parser<S, T>) -> Self {
        choice([self, other])
    }

    /// Run `then` on success; run `otherwise` if `self` fails without
    /// committing.
    pub fn if_else<U: 'static>(
        self,
        then: impl Fn(T) -> Parser<S, U> + Send + Sync + 'static,
        otherwise: Parser<S, U>,
    ) -> Parser<S, U> {
        Parser::new("if_else", move |state, budget| {
            let snapshot = state.save();
            match self.parse(state) {
                Reply::Ok(v, hint) => then(v).parse(state).merge_hint(hint),
                Reply::Err(e) => recover(state, snapshot, budget, e, |state| otherwise.parse(state)),
            }
        })
    }

    // =========================================================================
    // Error annotation
    // =========================================================================

    /// Report a failure that consumed nothing as "expecting `label`".
    pub fn label(self, label: impl Into<String>) -> Self {
        let label: String = label.into();
        let name = Arc::clone(&self.name);
        Parser::new(name, move |state, budget| {
            let snapshot = state.save();
            match self.parse_with(state, budget) {
                Reply::Err(e) if !state.consumed_since(snapshot) => Reply::Err(Some(match e {
                    Some(e) => e.set_expecting(label.as_str()),
                    None => state.expecting(label.as_str()),
                })),
                reply => reply,
            }
        })
    }

    /// Succeed only if `predicate` accepts the result; otherwise back out
    /// fully and report "expecting `label`".
    pub fn filter(
        self,
        label: impl Into<String>,
        predicate: impl Fn(&T) -> bool + Send + Sync + 'static,
    ) -> Self {
        let label: String = label.into();
        Parser::new("filter", move |state, _| {
            let snapshot = state.save();
            match self.parse(state) {
                Reply::Ok(v, hint) if predicate(&v) => Reply::Ok(v, hint),
                Reply::Ok(..) => {
                    state.restore(snapshot);
                    Reply::Err(Some(state.expecting(label.as_str())))
                }
                Reply::Err(e) => Reply::Err(e),
            }
        })
    }

    /// Recover from an abnormal condition raised inside `self`.
    ///
    /// The handler receives the raised payload and continues from wherever
    /// the condition was raised.
    pub fn catch(self, handler: impl Fn(&str) -> Parser<S, T> + Send + Sync + 'static) -> Self {
        Parser::new("catch", move |state, _| match self.parse(state) {
            Reply::Err(e) => {
                let payload = e.as_ref().and_then(ParseError::abnormal_payload).map(str::to_string);
                match payload {
                    Some(payload) => handler(&payload).parse(state),
                    None => Reply::Err(e),
                }
            }
            reply => reply,
        })
    }

    // =========================================================================
    // Cursor control
    // =========================================================================

    /// On failure, back out to the starting point however much was consumed.
    /// A consuming success counts as a single step.
    pub fn atomic(self) -> Self {
        Parser::new("atomic", move |state, budget| {
            let snapshot = state.save();
            match self.parse_with(state, budget) {
                Reply::Ok(v, hint) => {
                    if state.consumed_since(snapshot) {
                        state.set_step(snapshot.step + 1);
                    }
                    Reply::Ok(v, hint)
                }
                Reply::Err(e) => {
                    state.restore(snapshot);
                    Reply::Err(e)
                }
            }
        })
    }

    /// Run for the result only; the cursor never moves.
    pub fn peek(self) -> Self {
        Parser::new("peek", move |state, budget| {
            let snapshot = state.save();
            let reply = self.parse_with(state, budget);
            state.restore(snapshot);
            reply
        })
    }

    /// Fail if `self` succeeds without consuming input.
    pub fn consumed(self) -> Self {
        Parser::new("consumed", move |state, _| {
            let snapshot = state.save();
            match self.parse(state) {
                Reply::Ok(_, hint) if !state.consumed_since(snapshot) => {
                    Reply::Err(ParseError::merge(hint, Some(state.raw("input not consumed"))))
                }
                reply => reply,
            }
        })
    }

    /// Fail, backing out, if `self` succeeds and consumes input.
    pub fn not_consumed(self) -> Self {
        Parser::new("not_consumed", move |state, _| {
            let snapshot = state.save();
            match self.parse(state) {
                Reply::Ok(..) if state.consumed_since(snapshot) => {
                    state.restore(snapshot);
                    Reply::Err(Some(state.raw("input consumed")))
                }
                reply => reply,
            }
        })
    }

    /// A success counts as `n` steps regardless of what `self` consumed.
    pub fn step(self, n: usize) -> Self {
        Parser::new("step", move |state, budget| {
            let start = state.step();
            let reply = self.parse_with(state, budget);
            if reply.is_ok() {
                state.set_step(start + n);
            }
            reply
        })
    }

    /// Run `self` with a lookahead budget of `n` for its choice points.
    pub fn lookahead(self, n: usize) -> Self {
        let name = Arc::clone(&self.name);
        Parser::new(name, move |state, _| self.parse_with(state, n))
    }

    /// Succeed with `()` exactly when `self` fails; never consumes.
    pub fn not(self, label: impl Into<String>) -> Parser<S, ()> {
        let label: String = label.into();
        Parser::new("not", move |state, _| {
            let snapshot = state.save();
            let reply = self.parse(state);
            state.restore(snapshot);
            match reply {
                Reply::Ok(..) => Reply::Err(Some(state.unexpected(label.as_str()))),
                Reply::Err(e) if aborts(&e) => Reply::Err(e),
                Reply::Err(_) => Reply::Ok((), None),
            }
        })
    }

    pub fn optional(self) -> Parser<S, Option<T>> {
        Parser::new("optional", move |state, budget| {
            let snapshot = state.save();
            match self.parse(state) {
                Reply::Ok(v, hint) => Reply::Ok(Some(v), hint),
                Reply::Err(e) => recover(state, snapshot, budget, e, |_| Reply::Ok(None, None)),
            }
        })
    }

    pub fn option(self, default: T) -> Self
    where
        T: Clone + Send + Sync,
    {
        self.optional()
            .map(move |v| v.unwrap_or_else(|| default.clone()))
    }

    /// Emit a `trace` event for every application of `self`.
    pub fn traced(self, name: impl Into<Arc<str>>) -> Self {
        let name: Arc<str> = name.into();
        Parser::new(Arc::clone(&name), move |state, budget| {
            let snapshot = state.save();
            let reply = self.parse_with(state, budget);
            trace!(
                parser = %name,
                ok = reply.is_ok(),
                index = state.index(),
                steps = state.step().saturating_sub(snapshot.step),
                consumed = state.at().saturating_sub(snapshot.at),
                "traced"
            );
            reply
        })
    }

    // =========================================================================
    // Repetition
    // =========================================================================

    /// Exactly `n` occurrences.
    pub fn repeat(self, n: usize) -> Parser<S, Vec<T>> {
        Parser::new("repeat", move |state, _| {
            let mut items = Vec::with_capacity(n);
            let mut hint = None;
            for _ in 0..n {
                match self.parse(state) {
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

    /// Between `min` and `max` occurrences, greedily.
    ///
    /// # Panics
    ///
    /// Panics if `min > max`.
    pub fn some_range(self, min: usize, max: usize) -> Parser<S, Vec<T>> {
        assert!(
            min <= max,
            "repetition lower bound {min} exceeds upper bound {max}"
        );
        if max == 0 {
            return Parser::new("some", |_, _| Reply::Ok(Vec::new(), None));
        }
        Parser::new("some", move |state, _| {
            let mut items = Vec::new();
            let mut hint = None;
            for _ in 0..min {
                match self.parse(state) {
                    Reply::Ok(v, h) => {
                        items.push(v);
                        hint = ParseError::merge(hint, h);
                    }
                    Reply::Err(e) => return Reply::Err(ParseError::merge(hint, e)),
                }
            }
            let push = |mut items: Vec<T>, v| {
                items.push(v);
                items
            };
            match fold_greedy(&self, state, max - min, items, push) {
                Ok((items, h)) => Reply::Ok(items, ParseError::merge(hint, h)),
                Err(e) => Reply::Err(ParseError::merge(hint, e)),
            }
        })
    }

    /// Up to `max` occurrences.
    pub fn some(self, max: usize) -> Parser<S, Vec<T>> {
        self.some_range(0, max)
    }

    /// At least `min` occurrences.
    pub fn many_min(self, min: usize) -> Parser<S, Vec<T>> {
        self.some_range(min, usize::MAX)
    }

    pub fn many(self) -> Parser<S, Vec<T>> {
        self.many_min(0)
    }

    pub fn many1(self) -> Parser<S, Vec<T>> {
        self.many_min(1)
    }

    /// Greedy repetition folded into an accumulator instead of a `Vec`.
    pub fn many_fold<A>(
        self,
        init: A,
        f: impl Fn(A, T) -> A + Send + Sync + 'static,
    ) -> Parser<S, A>
    where
        A: Clone + Send + Sync + 'static,
    {
        Parser::new("many_fold", move |state, _| {
            match fold_greedy(&self, state, usize::MAX, init.clone(), &f) {
                Ok((acc, hint)) => Reply::Ok(acc, hint),
                Err(e) => Reply::Err(e),
            }
        })
    }

    pub fn skip_many(self) -> Parser<S, ()> {
        self.many_fold((), |_, _| ())
    }

    pub fn sep_by1<P: 'static>(self, sep: Parser<S, P>) -> Parser<S, Vec<T>> {
        map2(self.clone(), sep.then(self).many(), |first, mut rest| {
            rest.insert(0, first);
            rest
        })
    }

    pub fn sep_by<P: 'static>(self, sep: Parser<S, P>) -> Parser<S, Vec<T>> {
        self.sep_by1(sep).optional().map(Option::unwrap_or_default)
    }

    /// One or more occurrences separated by `sep`, with an optional trailing
    /// separator.
    pub fn sep_end_by1<P: 'static>(self, sep: Parser<S, P>) -> Parser<S, Vec<T>> {
        Parser::new("sep_end_by", move |state, _| {
            let (first, mut hint) = match self.parse(state) {
                Reply::Ok(v, h) => (v, h),
                Reply::Err(e) => return Reply::Err(e),
            };
            let mut items = vec![first];
            loop {
                let round = state.save();
                match sep.parse(state) {
                    Reply::Ok(_, h) => hint = ParseError::merge(hint, h),
                    Reply::Err(e) => {
                        if aborts(&e) || state.consumed_since(round) {
                            return Reply::Err(ParseError::merge(hint, e));
                        }
                        state.restore(round);
                        hint = ParseError::merge(hint, e);
                        break;
                    }
                }
                let item = state.save();
                match self.parse(state) {
                    Reply::Ok(v, h) => {
                        hint = ParseError::merge(hint, h);
                        items.push(v);
                        if !state.consumed_since(round) {
                            break;
                        }
                    }
                    Reply::Err(e) => {
                        if aborts(&e) || state.consumed_since(item) {
                            return Reply::Err(ParseError::merge(hint, e));
                        }
                        state.restore(item);
                        hint = ParseError::merge(hint, e);
                        break;
                    }
                }
            }
            Reply::Ok(items, hint)
        })
    }

    pub fn sep_end_by<P: 'static>(self, sep: Parser<S, P>) -> Parser<S, Vec<T>> {
        self.sep_end_by1(sep).optional().map(Option::unwrap_or_default)
    }

    /// One or more occurrences, each terminated by `sep`.
    pub fn end_by1<P: 'static>(self, sep: Parser<S, P>) -> Parser<S, Vec<T>> {
        self.followed_by(sep).many1()
    }

    pub fn end_by<P: 'static>(self, sep: Parser<S, P>) -> Parser<S, Vec<T>> {
        self.followed_by(sep).many()
    }
}

impl<S, T> BitOr for Parser<S, T>
where
    S: Source + ?Sized + 'static,
    T: 'static,
{
    type Output = Parser<S, T>;

    fn bitor(self, rhs: Self) -> Self::Output {
        choice([self, rhs])
    }
}

/// A parser defined after it is first referenced, for recursive grammars.
///
/// ```
/// use plait_core::{Forward, Parser, Reply};
///
/// let expr: Forward<[char], u32> = Forward::new("expr");
/// let handle: Parser<[char], u32> = expr.parser();
/// expr.define(Parser::new("one", |_, _| Reply::Ok(1, None)));
/// assert_eq!(plait_core::run("", &handle, "demo").unwrap(), 1);
/// ```
pub struct Forward<S: ?Sized, T> {
    name: Arc<str>,
    slot: Arc<OnceLock<Parser<S, T>>>,
}

impl<S, T> Forward<S, T>
where
    S: Source + ?Sized + 'static,
    T: 'static,
{
    pub fn new(name: impl Into<Arc<str>>) -> Self {
        Self {
            name: name.into(),
            slot: Arc::new(OnceLock::new()),
        }
    }

    /// A handle that delegates to whatever [`Forward::define`] installs.
    ///
    /// # Panics
    ///
    /// The handle panics when applied before the definition exists.
    pub fn parser(&self) -> Parser<S, T> {
        let slot = Arc::clone(&self.slot);
        let name = Arc::clone(&self.name);
        Parser::new(Arc::clone(&self.name), move |state, budget| match slot.get() {
            Some(p) => p.parse_with(state, budget),
            None => panic!("forward parser `{name}` applied before it was defined"),
        })
    }

    /// # Panics
    ///
    /// Panics if called twice.
    pub fn define(&self, parser: Parser<S, T>) {
        if self.slot.set(parser).is_err() {
            panic!("forward parser `{}` defined twice", self.name);
        }
    }
}
