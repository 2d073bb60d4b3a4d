//! Character predicates for scanners and patterns.

pub fn is_digit(c: char) -> bool {
    c.is_ascii_digit()
}

pub fn is_hex_digit(c: char) -> bool {
    c.is_ascii_hexdigit()
}

pub fn is_alpha(c: char) -> bool {
    c.is_alphabetic()
}

/// Letter or underscore: the start of an identifier.
pub fn is_alpha_(c: char) -> bool {
    c == '_' || c.is_alphabetic()
}

/// Letter, digit or underscore.
pub fn is_alphanumeric_(c: char) -> bool {
    c == '_' || c.is_alphanumeric()
}

pub fn is_whitespace(c: char) -> bool {
    c.is_whitespace()
}

/// Accepts any character of `set`.
pub fn among(set: &str) -> impl Fn(char) -> bool + Clone + Send + Sync + 'static {
    let set: Vec<char> = set.chars().collect();
    move |c| set.contains(&c)
}

/// Accepts any character not in `set`.
pub fn not_among(set: &str) -> impl Fn(char) -> bool + Clone + Send + Sync + 'static {
    let accept = among(set);
    move |c| !accept(c)
}

/// Accepts `lo..=hi`.
pub fn range(lo: char, hi: char) -> impl Fn(char) -> bool + Clone + Send + Sync + 'static {
    move |c| (lo..=hi).contains(&c)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identifier_classes() {
        assert!(is_alpha_('_'));
        assert!(!is_alpha_('1'));
        assert!(is_alphanumeric_('1'));
        assert!(!is_alphanumeric_('-'));
    }

    #[test]
    fn test_sets() {
        let ops = among("+-*");
        assert!(ops('-'));
        assert!(!ops('/'));
        let other = not_among("+-*");
        assert!(other('/'));
        assert!(range('a', 'f')('c'));
        assert!(!range('a', 'f')('g'));
    }

    #[test]
    fn test_digits() {
        assert!(is_digit('7'));
        assert!(is_hex_digit('F'));
        assert!(!is_hex_digit('g'));
        assert!(is_whitespace('\t'));
    }
}
