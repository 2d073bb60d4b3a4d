//! Character offset to line/column translation.

use std::fmt;

/// A resolved source position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Pos {
    pub line: usize,
    pub column: usize,
}

impl Pos {
    pub fn new(line: usize, column: usize) -> Self {
        Self { line, column }
    }
}

impl fmt::Display for Pos {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "line {}, column {}", self.line, self.column)
    }
}

/// Maps a flat character index to a [`Pos`].
///
/// Implementations may cache what they have already scanned, hence `&mut self`.
pub trait PositionMap {
    fn to_pos(&mut self, index: usize) -> Pos;
}

/// Line-break caching position map.
///
/// The source is scanned forward at most once; line breaks seen so far are
/// kept in ascending order and looked up with a binary search. A line-break
/// character belongs to the line it terminates.
#[derive(Debug, Clone)]
pub struct DefaultPositionMap<'a> {
    source: &'a [char],
    line_breaks: Vec<usize>,
    scanned: usize,
    start_line: usize,
    start_column: usize,
    line_break: char,
}

impl<'a> DefaultPositionMap<'a> {
    /// A map with 1-based lines and columns over `\n`-separated lines.
    pub fn new(source: &'a [char]) -> Self {
        Self::with_origin(source, 1, 1, '\n')
    }

    /// A map whose first character sits at (`start_line`, `start_column`).
    ///
    /// Only the first line is offset by `start_column`; every following line
    /// starts at column 1.
    pub fn with_origin(
        source: &'a [char],
        start_line: usize,
        start_column: usize,
        line_break: char,
    ) -> Self {
        Self {
            source,
            line_breaks: Vec::new(),
            scanned: 0,
            start_line,
            start_column,
            line_break,
        }
    }

    fn scan_to(&mut self, index: usize) {
        let end = index.min(self.source.len());
        if end <= self.scanned {
            return;
        }
        for (offset, &c) in self.source[self.scanned..end].iter().enumerate() {
            if c == self.line_break {
                self.line_breaks.push(self.scanned + offset);
            }
        }
        self.scanned = end;
    }
}

impl PositionMap for DefaultPositionMap<'_> {
    fn to_pos(&mut self, index: usize) -> Pos {
        self.scan_to(index);
        let breaks_before = self.line_breaks.partition_point(|&b| b < index);
        let line = self.start_line + breaks_before;
        let column = match breaks_before {
            0 => self.start_column + index,
            n => index - self.line_breaks[n - 1],
        };
        Pos { line, column }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;

    fn chars(s: &str) -> Vec<char> {
        s.chars().collect()
    }

    fn naive(source: &[char], index: usize) -> Pos {
        let mut line = 1;
        let mut column = 1;
        for &c in &source[..index.min(source.len())] {
            if c == '\n' {
                line += 1;
                column = 1;
            } else {
                column += 1;
            }
        }
        Pos { line, column }
    }

    #[test]
    fn test_three_lines() {
        let src = chars("ab\ncd\nef");
        let mut map = DefaultPositionMap::new(&src);
        assert_eq!(map.to_pos(0), Pos::new(1, 1));
        assert_eq!(map.to_pos(3), Pos::new(2, 1));
        assert_eq!(map.to_pos(7), Pos::new(3, 2));
    }

    #[test]
    fn test_line_break_belongs_to_its_line() {
        let src = chars("ab\ncd");
        let mut map = DefaultPositionMap::new(&src);
        assert_eq!(map.to_pos(2), Pos::new(1, 3));
    }

    #[test]
    fn test_backwards_lookup_after_full_scan() {
        let src = chars("a\nb\nc\nd");
        let mut map = DefaultPositionMap::new(&src);
        assert_eq!(map.to_pos(6), Pos::new(4, 1));
        assert_eq!(map.to_pos(2), Pos::new(2, 1));
        assert_eq!(map.to_pos(0), Pos::new(1, 1));
    }

    #[test]
    fn test_end_of_input_is_valid() {
        let src = chars("ab\n");
        let mut map = DefaultPositionMap::new(&src);
        assert_eq!(map.to_pos(3), Pos::new(2, 1));
    }

    #[test]
    fn test_custom_origin() {
        let src = chars("xy;z");
        let mut map = DefaultPositionMap::with_origin(&src, 10, 5, ';');
        assert_eq!(map.to_pos(1), Pos::new(10, 6));
        assert_eq!(map.to_pos(3), Pos::new(11, 1));
    }

    #[test]
    fn test_display() {
        assert_eq!(Pos::new(3, 7).to_string(), "line 3, column 7");
    }

    proptest! {
        #[test]
        fn prop_agrees_with_naive_scan(text in "[ab\n]{0,40}", picks in proptest::collection::vec(0usize..41, 1..8)) {
            let src = chars(&text);
            let mut map = DefaultPositionMap::new(&src);
            for index in picks {
                let index = index.min(src.len());
                prop_assert_eq!(map.to_pos(index), naive(&src, index));
            }
        }

        #[test]
        fn prop_monotonic(text in "[a\n]{0,30}") {
            let src = chars(&text);
            let mut map = DefaultPositionMap::new(&src);
            let mut last = map.to_pos(0);
            for index in 1..=src.len() {
                let pos = map.to_pos(index);
                prop_assert!(pos > last);
                last = pos;
            }
        }
    }
}
