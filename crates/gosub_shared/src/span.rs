//! Half-open source ranges

use std::fmt::{Display, Formatter};

/// A half-open `[start, end)` byte range into a source string
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Span {
    /// Offset of the first byte
    pub start: usize,
    /// Offset one past the last byte
    pub end: usize,
}

impl Span {
    #[must_use]
    pub fn new(start: usize, end: usize) -> Self {
        Span { start, end }
    }

    /// Returns an empty span positioned at the given offset
    #[must_use]
    pub fn empty_at(offset: usize) -> Self {
        Span {
            start: offset,
            end: offset,
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns the smallest span covering both spans
    #[must_use]
    pub fn merge(&self, other: Span) -> Span {
        Span {
            start: self.start.min(other.start),
            end: self.end.max(other.end),
        }
    }

    /// Returns the part of `source` this span covers, or an empty string when out of bounds
    #[must_use]
    pub fn slice<'a>(&self, source: &'a str) -> &'a str {
        source.get(self.start..self.end).unwrap_or_default()
    }
}

impl Display for Span {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}..{}", self.start, self.end)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn merge_covers_both() {
        let a = Span::new(4, 8);
        let b = Span::new(1, 5);
        assert_eq!(a.merge(b), Span::new(1, 8));
        assert_eq!(b.merge(a), Span::new(1, 8));
    }

    #[test]
    fn slice() {
        let span = Span::new(2, 5);
        assert_eq!(span.slice("0 1px 2"), "1px");
        assert_eq!(Span::new(3, 99).slice("abc"), "");
        assert_eq!(span.len(), 3);
        assert!(Span::empty_at(7).is_empty());
        assert_eq!(span.to_string(), "2..5");
    }
}
