//! Pure character matchers.
//!
//! A [`Pattern`] answers one question: how many characters match starting
//! at a given offset? It never builds values and never reports errors, which
//! makes it the cheapest way to describe token shapes. [`crate::scanner::scan_pattern`]
//! turns one into a scanner.

use std::fmt;
use std::sync::Arc;

use crate::chars::{is_alpha_, is_alphanumeric_, is_digit, is_hex_digit};

type MatchFn = dyn Fn(&[char], usize) -> Option<usize> + Send + Sync;

#[derive(Clone)]
pub struct Pattern {
    matcher: Arc<MatchFn>,
}

impl fmt::Debug for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Pattern")
    }
}

impl Pattern {
    /// Wrap a raw matcher `(source, at) -> matched length`.
    pub fn new(matcher: impl Fn(&[char], usize) -> Option<usize> + Send + Sync + 'static) -> Self {
        Self {
            matcher: Arc::new(matcher),
        }
    }

    /// Length of the match at `at`, if any.
    pub fn match_at(&self, source: &[char], at: usize) -> Option<usize> {
        (self.matcher)(source, at)
    }

    // --- Single characters ---

    pub fn char_is(expected: char) -> Self {
        Self::char_if(move |c| c == expected)
    }

    pub fn char_if(predicate: impl Fn(char) -> bool + Send + Sync + 'static) -> Self {
        Self::new(move |src, at| match src.get(at) {
            Some(&c) if predicate(c) => Some(1),
            _ => None,
        })
    }

    pub fn in_range(lo: char, hi: char) -> Self {
        Self::char_if(crate::chars::range(lo, hi))
    }

    pub fn among(set: &str) -> Self {
        Self::char_if(crate::chars::among(set))
    }

    /// Any single character.
    pub fn any_char() -> Self {
        Self::new(|src, at| (at < src.len()).then_some(1))
    }

    // --- Strings ---

    pub fn string(text: &str) -> Self {
        let text: Vec<char> = text.chars().collect();
        Self::new(move |src, at| {
            let end = at + text.len();
            (end <= src.len() && src[at..end] == text[..]).then_some(text.len())
        })
    }

    /// Case-insensitive [`Pattern::string`].
    pub fn string_ci(text: &str) -> Self {
        let text: Vec<char> = text.chars().collect();
        Self::new(move |src, at| {
            let end = at + text.len();
            let matches = end <= src.len()
                && src[at..end]
                    .iter()
                    .zip(&text)
                    .all(|(c, t)| c.to_lowercase().eq(t.to_lowercase()));
            matches.then_some(text.len())
        })
    }

    /// One character, provided `text` does not start here.
    pub fn not_string(text: &str) -> Self {
        let forbidden = Self::string(text);
        Self::new(move |src, at| {
            if at < src.len() && forbidden.match_at(src, at).is_none() {
                Some(1)
            } else {
                None
            }
        })
    }

    // --- Degenerate ---

    /// Matches the empty string everywhere.
    pub fn always() -> Self {
        Self::new(|_, _| Some(0))
    }

    pub fn never() -> Self {
        Self::new(|_, _| None)
    }

    /// Matches the empty string at end of input only.
    pub fn eof() -> Self {
        Self::new(|src, at| (at >= src.len()).then_some(0))
    }

    // --- Composition ---

    pub fn seq(self, next: Pattern) -> Self {
        Self::new(move |src, at| {
            let first = self.match_at(src, at)?;
            let second = next.match_at(src, at + first)?;
            Some(first + second)
        })
    }

    /// First of the two that matches.
    pub fn or(self, other: Pattern) -> Self {
        Self::new(move |src, at| self.match_at(src, at).or_else(|| other.match_at(src, at)))
    }

    pub fn optional(self) -> Self {
        Self::new(move |src, at| Some(self.match_at(src, at).unwrap_or(0)))
    }

    /// Matches the empty string when `self` does not match here.
    pub fn not(self) -> Self {
        Self::new(move |src, at| match self.match_at(src, at) {
            Some(_) => None,
            None => Some(0),
        })
    }

    /// Matches the empty string when `self` matches here.
    pub fn peek(self) -> Self {
        Self::new(move |src, at| self.match_at(src, at).map(|_| 0))
    }

    /// Greedy repetition between `min` and `max` times. An empty match ends
    /// the repetition, and fails it while fewer than `min` matches were made.
    ///
    /// # Panics
    ///
    /// Panics if `min > max`.
    pub fn some_range(self, min: usize, max: usize) -> Self {
        assert!(
            min <= max,
            "repetition lower bound {min} exceeds upper bound {max}"
        );
        Self::new(move |src, at| {
            let mut total = 0;
            for count in 0..max {
                match self.match_at(src, at + total) {
                    Some(0) if count < min => return None,
                    Some(0) => break,
                    Some(n) => total += n,
                    None if count < min => return None,
                    None => break,
                }
            }
            Some(total)
        })
    }

    pub fn many(self) -> Self {
        self.some_range(0, usize::MAX)
    }

    pub fn many1(self) -> Self {
        self.some_range(1, usize::MAX)
    }

    pub fn many_min(self, min: usize) -> Self {
        self.some_range(min, usize::MAX)
    }

    pub fn some(self, max: usize) -> Self {
        self.some_range(0, max)
    }

    pub fn repeat(self, n: usize) -> Self {
        self.some_range(n, n)
    }

    /// The longest of the patterns that match; the first on ties.
    pub fn longest(patterns: impl IntoIterator<Item = Pattern>) -> Self {
        let patterns: Vec<Pattern> = patterns.into_iter().collect();
        Self::new(move |src, at| {
            patterns.iter().filter_map(|p| p.match_at(src, at)).fold(None, |best, n| {
                match best {
                    Some(b) if b >= n => Some(b),
                    _ => Some(n),
                }
            })
        })
    }

    /// The shortest of the patterns that match; the first on ties.
    pub fn shortest(patterns: impl IntoIterator<Item = Pattern>) -> Self {
        let patterns: Vec<Pattern> = patterns.into_iter().collect();
        Self::new(move |src, at| {
            patterns.iter().filter_map(|p| p.match_at(src, at)).fold(None, |best, n| {
                match best {
                    Some(b) if b <= n => Some(b),
                    _ => Some(n),
                }
            })
        })
    }

    // --- Stock shapes ---

    /// One or more decimal digits.
    pub fn integer() -> Self {
        Self::char_if(is_digit).many1()
    }

    /// `123`, `1.5` or `.5`.
    pub fn decimal() -> Self {
        let fraction = Self::char_is('.').seq(Self::integer());
        Self::integer().seq(fraction.clone().optional()).or(fraction)
    }

    /// `0x` or `0X` followed by hex digits.
    pub fn hex_integer() -> Self {
        Self::string("0x")
            .or(Self::string("0X"))
            .seq(Self::char_if(is_hex_digit).many1())
    }

    /// A letter or underscore followed by letters, digits or underscores.
    pub fn word() -> Self {
        Self::char_if(is_alpha_).seq(Self::char_if(is_alphanumeric_).many())
    }

    /// Everything up to, not including, the next `\n`.
    pub fn line_remainder() -> Self {
        Self::char_if(|c| c != '\n').many()
    }
}
