//! Inclusive numeric ranges and the `N..M` range grammar.
//!
//! The grammar is shared by `scores` values and the `quantity` / `slot` fields
//! of item conditions:
//!
//! ```text
//! 5..10   min 5,  max 10
//! 5..     min 5
//! ..10    max 10
//! 7       min 7,  max 7
//! ```

use std::fmt;
use std::str::FromStr;

/// An inclusive range with optional bounds.
///
/// Bounds are not checked against each other: an inverted range is legal and
/// simply contains nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Range<T> {
    pub min: Option<T>,
    pub max: Option<T>,
}

impl<T: Copy + PartialOrd> Range<T> {
    /// A range with no bounds.
    #[must_use]
    pub const fn unbounded() -> Self {
        Self {
            min: None,
            max: None,
        }
    }

    /// A range containing exactly `value`.
    #[must_use]
    pub const fn exact(value: T) -> Self {
        Self {
            min: Some(value),
            max: Some(value),
        }
    }

    /// A range with only a lower bound.
    #[must_use]
    pub const fn at_least(min: T) -> Self {
        Self {
            min: Some(min),
            max: None,
        }
    }

    /// A range with only an upper bound.
    #[must_use]
    pub const fn at_most(max: T) -> Self {
        Self {
            min: None,
            max: Some(max),
        }
    }

    /// Whether neither bound is set.
    #[must_use]
    pub const fn is_unbounded(&self) -> bool {
        self.min.is_none() && self.max.is_none()
    }

    /// Check whether `value` lies within both bounds.
    #[must_use]
    pub fn contains(&self, value: T) -> bool {
        self.min.is_none_or(|min| value >= min) && self.max.is_none_or(|max| value <= max)
    }
}

impl<T: fmt::Display + PartialEq> fmt::Display for Range<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.min, &self.max) {
            (Some(min), Some(max)) if min == max => write!(f, "{min}"),
            (Some(min), Some(max)) => write!(f, "{min}..{max}"),
            (Some(min), None) => write!(f, "{min}.."),
            (None, Some(max)) => write!(f, "..{max}"),
            (None, None) => write!(f, ".."),
        }
    }
}

/// Parse the range grammar.
///
/// Returns `None` when the input is neither a `(-?\d+)?..(-?\d+)?` range nor a
/// bare integer, or when a bound does not fit in `T`. Callers leave the field
/// unset in that case.
///
/// ```
/// use entity_selector::{Range, parse_range};
///
/// assert_eq!(parse_range::<i32>("5..10"), Some(Range { min: Some(5), max: Some(10) }));
/// assert_eq!(parse_range::<i32>("..10"), Some(Range { min: None, max: Some(10) }));
/// assert_eq!(parse_range::<i32>("7"), Some(Range::exact(7)));
/// assert_eq!(parse_range::<i32>("seven"), None);
/// ```
pub fn parse_range<T: FromStr + Copy + PartialOrd>(input: &str) -> Option<Range<T>> {
    let input = input.trim();

    if let Some((min, max)) = input.split_once("..") {
        return Some(Range {
            min: parse_bound(min)?,
            max: parse_bound(max)?,
        });
    }

    parse_integer(input).map(Range::exact)
}

/// An empty side is an open bound; anything else must be an integer.
fn parse_bound<T: FromStr>(text: &str) -> Option<Option<T>> {
    if text.is_empty() {
        Some(None)
    } else {
        parse_integer(text).map(Some)
    }
}

fn parse_integer<T: FromStr>(text: &str) -> Option<T> {
    let digits = text.strip_prefix('-').unwrap_or(text);
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    text.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bounded_and_open_ranges() {
        assert_eq!(
            parse_range::<i32>("5..10"),
            Some(Range {
                min: Some(5),
                max: Some(10)
            })
        );
        assert_eq!(parse_range::<i32>("..10"), Some(Range::at_most(10)));
        assert_eq!(parse_range::<i32>("5.."), Some(Range::at_least(5)));
        assert_eq!(parse_range::<i32>(".."), Some(Range::unbounded()));
    }

    #[test]
    fn test_bare_integer() {
        assert_eq!(parse_range::<i32>("7"), Some(Range::exact(7)));
        assert_eq!(parse_range::<i64>("-3"), Some(Range::exact(-3)));
    }

    #[test]
    fn test_negative_bounds() {
        assert_eq!(
            parse_range::<i64>("-10..-2"),
            Some(Range {
                min: Some(-10),
                max: Some(-2)
            })
        );
    }

    #[test]
    fn test_malformed_is_unset() {
        assert_eq!(parse_range::<i32>("abc"), None);
        assert_eq!(parse_range::<i32>("1.5"), None);
        assert_eq!(parse_range::<i32>("1...3"), None);
        assert_eq!(parse_range::<i32>("a..3"), None);
        assert_eq!(parse_range::<i32>("-"), None);
        assert_eq!(parse_range::<i32>(""), None);
        assert_eq!(parse_range::<i32>("99999999999"), None);
    }

    #[test]
    fn test_contains() {
        let range = Range {
            min: Some(5),
            max: Some(10),
        };
        assert!(range.contains(5));
        assert!(range.contains(10));
        assert!(!range.contains(4));
        assert!(!range.contains(11));
        assert!(Range::<i32>::unbounded().contains(i32::MIN));
    }

    #[test]
    fn test_inverted_range_matches_nothing() {
        let range = Range {
            min: Some(10),
            max: Some(5),
        };
        assert!((0..20).all(|v| !range.contains(v)));
    }

    #[test]
    fn test_display() {
        assert_eq!(parse_range::<i32>("5..10").unwrap().to_string(), "5..10");
        assert_eq!(Range::exact(3).to_string(), "3");
        assert_eq!(Range::at_least(1).to_string(), "1..");
        assert_eq!(Range::<i32>::at_most(-1).to_string(), "..-1");
    }
}
