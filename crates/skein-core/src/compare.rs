//! Three-way key comparison.

use std::cmp::Ordering;

/// A total order over `T` used to keep sorted containers ordered.
///
/// Implemented by [`Natural`] for any `T: Ord`, and by every
/// `Fn(&T, &T) -> Ordering` closure.
pub trait Comparator<T: ?Sized> {
    /// Compare two values.
    fn compare(&self, a: &T, b: &T) -> Ordering;
}

/// The ordering given by `T`'s own [`Ord`] implementation.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Natural;

impl<T: Ord + ?Sized> Comparator<T> for Natural {
    fn compare(&self, a: &T, b: &T) -> Ordering {
        a.cmp(b)
    }
}

impl<T: ?Sized, F> Comparator<T> for F
where
    F: Fn(&T, &T) -> Ordering,
{
    fn compare(&self, a: &T, b: &T) -> Ordering {
        self(a, b)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn natural_follows_ord() {
        assert_eq!(Natural.compare(&1, &2), Ordering::Less);
        assert_eq!(Natural.compare("b", "a"), Ordering::Greater);
        assert_eq!(Natural.compare(&5u8, &5u8), Ordering::Equal);
    }

    #[test]
    fn closures_are_comparators() {
        let by_len = |a: &String, b: &String| a.len().cmp(&b.len());
        assert_eq!(
            by_len.compare(&"abc".to_string(), &"z".to_string()),
            Ordering::Greater
        );
    }
}
