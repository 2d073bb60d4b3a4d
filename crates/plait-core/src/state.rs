//! The cursor threaded through a parse run.

use crate::error::ParseError;

/// Anything a [`ParseState`] can walk over.
///
/// Positions (`at`) count units of the source: characters for `[char]`,
/// tokens for a [`TokenStream`](crate::TokenStream). Errors are always
/// reported against a character index, which [`Source::index_at`] supplies.
pub trait Source {
    type Item;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn get(&self, at: usize) -> Option<&Self::Item>;

    /// Character index of the unit at `at` (or of the end of input).
    fn index_at(&self, at: usize) -> usize;

    /// How the unit at `at` reads in an error message.
    fn describe_at(&self, at: usize) -> String;
}

impl Source for [char] {
    type Item = char;

    fn len(&self) -> usize {
        <[char]>::len(self)
    }

    fn get(&self, at: usize) -> Option<&char> {
        <[char]>::get(self, at)
    }

    fn index_at(&self, at: usize) -> usize {
        at
    }

    fn describe_at(&self, at: usize) -> String {
        match <[char]>::get(self, at) {
            Some(c) => format!("{c:?}"),
            None => "EOF".to_string(),
        }
    }
}

/// A saved `(step, at)` pair; the only undo mechanism a run has.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Snapshot {
    pub step: usize,
    pub at: usize,
}

/// Mutable cursor owned by exactly one parse run.
///
/// `at` is the next unconsumed unit. `step` grows by one for every unit of
/// progress and is what choice and repetition consult to decide whether a
/// failed attempt consumed input.
#[derive(Debug)]
pub struct ParseState<'a, S: ?Sized> {
    source: &'a S,
    at: usize,
    step: usize,
    module: &'a str,
}

impl<'a, S: Source + ?Sized> ParseState<'a, S> {
    pub fn new(source: &'a S, module: &'a str) -> Self {
        Self {
            source,
            at: 0,
            step: 0,
            module,
        }
    }

    pub fn source(&self) -> &'a S {
        self.source
    }

    pub fn module(&self) -> &'a str {
        self.module
    }

    pub fn at(&self) -> usize {
        self.at
    }

    pub fn step(&self) -> usize {
        self.step
    }

    /// Character index of the cursor.
    pub fn index(&self) -> usize {
        self.source.index_at(self.at)
    }

    pub fn save(&self) -> Snapshot {
        Snapshot {
            step: self.step,
            at: self.at,
        }
    }

    pub fn restore(&mut self, snapshot: Snapshot) {
        self.step = snapshot.step;
        self.at = snapshot.at;
    }

    /// Move forward `n` units. Any forward move counts as one step.
    pub fn advance(&mut self, n: usize) {
        self.at += n;
        if n > 0 {
            self.step += 1;
        }
    }

    pub fn set_step(&mut self, step: usize) {
        self.step = step;
    }

    /// Reposition the cursor without touching `step`.
    ///
    /// Meant for bridges that run a nested state and need to report where it
    /// stopped.
    pub fn set_at(&mut self, at: usize) {
        self.at = at;
    }

    pub fn peek(&self) -> Option<&'a S::Item> {
        self.source.get(self.at)
    }

    pub fn is_at_end(&self) -> bool {
        self.at >= self.source.len()
    }

    /// True when the cursor moved since `snapshot`.
    pub fn consumed_since(&self, snapshot: Snapshot) -> bool {
        self.at != snapshot.at
    }

    /// True when a failure since `snapshot` may no longer be backtracked
    /// under a lookahead budget of `budget` steps.
    pub fn committed_since(&self, snapshot: Snapshot, budget: usize) -> bool {
        self.at != snapshot.at && self.step.saturating_sub(snapshot.step) >= budget
    }

    // --- Errors at the cursor ---

    /// The mismatch error for whatever sits under the cursor.
    pub fn unexpected_here(&self) -> ParseError {
        ParseError::system_unexpected(self.index(), self.source.describe_at(self.at))
    }

    pub fn expecting(&self, label: impl Into<String>) -> ParseError {
        ParseError::expecting(self.index(), label)
    }

    pub fn unexpected(&self, label: impl Into<String>) -> ParseError {
        ParseError::unexpected(self.index(), label)
    }

    pub fn raw(&self, message: impl Into<String>) -> ParseError {
        ParseError::raw(self.index(), message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn chars(s: &str) -> Vec<char> {
        s.chars().collect()
    }

    #[test]
    fn test_advance_counts_one_step() {
        let src = chars("abcdef");
        let mut state = ParseState::new(&src[..], "test");
        state.advance(3);
        assert_eq!((state.at(), state.step()), (3, 1));
        state.advance(0);
        assert_eq!((state.at(), state.step()), (3, 1));
        state.advance(1);
        assert_eq!((state.at(), state.step()), (4, 2));
    }

    #[test]
    fn test_save_restore() {
        let src = chars("abc");
        let mut state = ParseState::new(&src[..], "test");
        let snap = state.save();
        state.advance(2);
        assert_eq!(state.peek(), Some(&'c'));
        state.restore(snap);
        assert_eq!(state.save(), Snapshot { step: 0, at: 0 });
        assert_eq!(state.peek(), Some(&'a'));
    }

    #[test]
    fn test_at_end() {
        let src = chars("x");
        let mut state = ParseState::new(&src[..], "test");
        assert!(!state.is_at_end());
        state.advance(1);
        assert!(state.is_at_end());
        assert_eq!(state.peek(), None);
    }

    #[test]
    fn test_commit_accounting() {
        let src = chars("abcd");
        let mut state = ParseState::new(&src[..], "test");
        let snap = state.save();
        assert!(!state.committed_since(snap, 1));
        state.advance(1);
        assert!(state.committed_since(snap, 1));
        assert!(!state.committed_since(snap, 2));
        state.advance(1);
        assert!(state.committed_since(snap, 2));
    }

    #[test]
    fn test_unexpected_here_describes_char_or_eof() {
        let src = chars("q");
        let mut state = ParseState::new(&src[..], "test");
        assert_eq!(state.unexpected_here().render().encountered.as_deref(), Some("'q'"));
        state.advance(1);
        assert_eq!(state.unexpected_here().render().encountered.as_deref(), Some("EOF"));
    }
}
