use crate::error::{Error, Result};
use std::cmp::Ordering;
use std::fmt;
use std::sync::Arc;

/// Upper bound on the up-front allocation, so that a selector created with a
/// huge capacity only grows as elements actually arrive.
const MAX_INITIAL_RESERVE: usize = 1024;

/// A total order over `T`.
///
/// Any `Fn(&T, &T) -> Ordering` is a comparator. Absent values are modelled
/// as `Option<T>`; the comparator decides where `None` sorts.
pub trait Comparator<T> {
    fn compare(&self, a: &T, b: &T) -> Ordering;
}

impl<T, F> Comparator<T> for F
where
    F: Fn(&T, &T) -> Ordering,
{
    fn compare(&self, a: &T, b: &T) -> Ordering {
        self(a, b)
    }
}

/// The natural order of `T: Ord`.
#[derive(Debug, Clone, Copy, Default)]
pub struct Natural;

impl<T: Ord> Comparator<T> for Natural {
    fn compare(&self, a: &T, b: &T) -> Ordering {
        a.cmp(b)
    }
}

/// Inverts another comparator; turns a least-k selector into a greatest-k one.
#[derive(Debug, Clone, Copy, Default)]
pub struct Reversed<C>(pub C);

impl<T, C: Comparator<T>> Comparator<T> for Reversed<C> {
    fn compare(&self, a: &T, b: &T) -> Ordering {
        self.0.compare(b, a)
    }
}

/// Orders elements by a derived key.
#[derive(Debug, Clone, Copy)]
pub struct ByKey<F>(pub F);

impl<T, K, F> Comparator<T> for ByKey<F>
where
    K: Ord,
    F: Fn(&T) -> K,
{
    fn compare(&self, a: &T, b: &T) -> Ordering {
        (self.0)(a).cmp(&(self.0)(b))
    }
}

/// Builds a comparator from a key extractor.
pub fn by_key<T, K: Ord, F: Fn(&T) -> K>(key: F) -> ByKey<F> {
    ByKey(key)
}

/// Converts a signed limit into a capacity, rejecting negative values.
pub(crate) fn checked_capacity(limit: i64) -> Result<usize> {
    usize::try_from(limit).map_err(|_| {
        Error::InvalidArgument(format!("capacity must be non-negative, got {}", limit))
    })
}

/// Retains the `capacity` smallest elements seen under a comparator.
///
/// The elements live in an array-backed binary max-heap: the root is the
/// worst element still retained, so every `put` on a full selector costs
/// one comparison against the root and, on eviction, one sift-down.
///
/// Complexity:
/// - Put: O(log N) where N is the capacity
/// - Merge: O(n) when the union fits, O(m log N) otherwise (m = smaller side)
/// - Memory: O(N) regardless of how many elements were offered
pub struct BoundedSelector<T, C> {
    items: Vec<T>,
    capacity: usize,
    cmp: Arc<C>,
}

impl<T, C: Comparator<T>> BoundedSelector<T, C> {
    /// Creates an empty selector keeping at most `capacity` elements.
    pub fn new(capacity: usize, cmp: C) -> Self {
        Self::with_shared(capacity, Arc::new(cmp))
    }

    /// Creates a selector that shares its comparator with other selectors.
    ///
    /// Selectors built from the same `Arc` can always be merged.
    pub fn with_shared(capacity: usize, cmp: Arc<C>) -> Self {
        Self {
            items: Vec::with_capacity(capacity.min(MAX_INITIAL_RESERVE)),
            capacity,
            cmp,
        }
    }

    /// Like [`BoundedSelector::new`], but takes a signed limit and fails on
    /// negative values.
    pub fn try_new(limit: i64, cmp: C) -> Result<Self> {
        checked_capacity(limit).map(|capacity| Self::new(capacity, cmp))
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Returns the number of elements currently retained.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn comparator(&self) -> &Arc<C> {
        &self.cmp
    }

    /// The worst retained element, i.e. the next eviction candidate.
    pub fn worst(&self) -> Option<&T> {
        self.items.first()
    }

    /// Offers an element.
    ///
    /// If the selector is not full, the element is kept. If it is full and
    /// the element is strictly smaller than the worst retained one, the worst
    /// is evicted. Otherwise the element is discarded and nothing changes.
    pub fn put(&mut self, item: T) {
        if self.items.len() < self.capacity {
            self.items.push(item);
            self.sift_up(self.items.len() - 1);
        } else if let Some(root) = self.items.first() {
            if self.cmp.compare(&item, root) == Ordering::Less {
                self.items[0] = item;
                self.sift_down(0);
            }
        }
    }

    /// Whether `other` was built with the same capacity and comparator.
    ///
    /// Comparators are identified by their shared `Arc`. Zero-sized
    /// comparators (`Natural`, non-capturing closures) carry no state, so any
    /// two instances of the same type are interchangeable.
    pub fn is_compatible(&self, other: &Self) -> bool {
        self.capacity == other.capacity
            && (std::mem::size_of::<C>() == 0 || Arc::ptr_eq(&self.cmp, &other.cmp))
    }

    /// Merges two selectors, keeping the `capacity` smallest of their union.
    ///
    /// The returned selector is the result; either input may have been
    /// reused to build it.
    pub fn merge(self, other: Self) -> Result<Self> {
        if self.capacity != other.capacity {
            return Err(Error::IncompatibleMerge {
                reason: format!("capacity {} vs {}", self.capacity, other.capacity),
            });
        }
        if !self.is_compatible(&other) {
            return Err(Error::IncompatibleMerge {
                reason: "selectors use different comparators".to_string(),
            });
        }
        Ok(self.absorb(other))
    }

    /// Merge without the compatibility check, for selectors known to come
    /// from the same factory.
    pub(crate) fn absorb(mut self, mut other: Self) -> Self {
        debug_assert!(self.is_compatible(&other));

        if self.items.len() + other.items.len() <= self.capacity {
            self.items.append(&mut other.items);
            self.heapify();
            return self;
        }

        // Drain the smaller heap into the larger one
        if self.items.len() < other.items.len() {
            std::mem::swap(&mut self.items, &mut other.items);
        }
        for item in other.items {
            self.put(item);
        }
        self
    }

    /// Consumes the selector and returns the retained elements in ascending
    /// comparator order.
    pub fn into_sorted_vec(self) -> Vec<T> {
        let cmp = self.cmp;
        let mut items = self.items;
        items.sort_unstable_by(|a, b| cmp.compare(a, b));
        items
    }

    /// Returns the retained elements in ascending order, leaving the
    /// selector untouched.
    pub fn to_sorted_vec(&self) -> Vec<T>
    where
        T: Clone,
    {
        let mut items = self.items.clone();
        items.sort_unstable_by(|a, b| self.cmp.compare(a, b));
        items
    }

    fn sift_up(&mut self, mut idx: usize) {
        while idx > 0 {
            let parent = (idx - 1) / 2;
            if self.cmp.compare(&self.items[idx], &self.items[parent]) == Ordering::Greater {
                self.items.swap(idx, parent);
                idx = parent;
            } else {
                break;
            }
        }
    }

    fn sift_down(&mut self, mut idx: usize) {
        let len = self.items.len();
        loop {
            let left = 2 * idx + 1;
            if left >= len {
                break;
            }
            let right = left + 1;
            let largest = if right < len
                && self.cmp.compare(&self.items[right], &self.items[left]) == Ordering::Greater
            {
                right
            } else {
                left
            };
            if self.cmp.compare(&self.items[largest], &self.items[idx]) == Ordering::Greater {
                self.items.swap(idx, largest);
                idx = largest;
            } else {
                break;
            }
        }
    }

    fn heapify(&mut self) {
        for idx in (0..self.items.len() / 2).rev() {
            self.sift_down(idx);
        }
    }
}

impl<T: Ord> BoundedSelector<T, Natural> {
    /// A least-k selector under the natural order of `T`.
    pub fn natural(capacity: usize) -> Self {
        Self::new(capacity, Natural)
    }
}

impl<T, C: Comparator<T>> Extend<T> for BoundedSelector<T, C> {
    fn extend<I: IntoIterator<Item = T>>(&mut self, iter: I) {
        for item in iter {
            self.put(item);
        }
    }
}

impl<T, C: Comparator<T>> IntoIterator for BoundedSelector<T, C> {
    type Item = T;
    type IntoIter = std::vec::IntoIter<T>;

    /// Iterates the retained elements in ascending order.
    fn into_iter(self) -> Self::IntoIter {
        self.into_sorted_vec().into_iter()
    }
}

impl<T: Clone, C> Clone for BoundedSelector<T, C> {
    fn clone(&self) -> Self {
        Self {
            items: self.items.clone(),
            capacity: self.capacity,
            cmp: Arc::clone(&self.cmp),
        }
    }
}

impl<T: fmt::Debug, C> fmt::Debug for BoundedSelector<T, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BoundedSelector")
            .field("capacity", &self.capacity)
            .field("items", &self.items)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bounded_selector_basic() {
        let mut selector = BoundedSelector::natural(3);

        selector.put(5);
        selector.put(2);
        selector.put(8);

        let sorted = selector.into_sorted_vec();
        assert_eq!(sorted, vec![2, 5, 8]);
    }

    #[test]
    fn test_bounded_selector_eviction() {
        let mut selector = BoundedSelector::natural(3);

        // Fill with [5, 2, 8]
        selector.put(5);
        selector.put(2);
        selector.put(8);

        // Put 1 - should evict 8 (largest)
        selector.put(1);

        assert_eq!(selector.worst(), Some(&5));
        assert_eq!(selector.into_sorted_vec(), vec![1, 2, 5]);
    }

    #[test]
    fn test_bounded_selector_no_eviction_if_larger() {
        let mut selector = BoundedSelector::natural(3);

        selector.put(5);
        selector.put(8);
        selector.put(10);

        // Put 10 again - ties with the worst, must be ignored
        selector.put(10);
        selector.put(42);

        assert_eq!(selector.len(), 3);
        assert_eq!(selector.into_sorted_vec(), vec![5, 8, 10]);
    }

    #[test]
    fn test_bounded_selector_capacity() {
        let mut selector = BoundedSelector::natural(5);

        for i in (0..100).rev() {
            selector.put(i);
        }

        assert_eq!(selector.len(), 5);
        assert_eq!(selector.into_sorted_vec(), vec![0, 1, 2, 3, 4]);
    }

    #[test]
    fn test_bounded_selector_fill_then_overflow() {
        let mut selector = BoundedSelector::natural(5);
        for i in 1..=4 {
            selector.put(i);
        }
        assert_eq!(selector.len(), 4);
        selector.put(5);
        assert_eq!(selector.len(), 5);
        selector.put(6);
        assert_eq!(selector.len(), 5);

        let items: Vec<i32> = selector.into_iter().collect();
        assert_eq!(items, vec![1, 2, 3, 4, 5]);
    }

    #[test]
    fn test_bounded_selector_empty() {
        let selector: BoundedSelector<i32, Natural> = BoundedSelector::natural(10);
        assert!(selector.is_empty());
        assert_eq!(selector.len(), 0);
        assert_eq!(selector.into_sorted_vec(), Vec::<i32>::new());
    }

    #[test]
    fn test_bounded_selector_zero_capacity() {
        let mut selector = BoundedSelector::natural(0);
        selector.put(1);
        selector.put(-1);
        assert!(selector.is_empty());
        assert!(selector.worst().is_none());
        assert_eq!(selector.into_sorted_vec(), Vec::<i32>::new());
    }

    #[test]
    fn test_bounded_selector_huge_capacity() {
        let mut selector = BoundedSelector::natural(i32::MAX as usize / 2);
        selector.extend([3, 1, 2]);
        assert_eq!(selector.into_sorted_vec(), vec![1, 2, 3]);
    }

    #[test]
    fn test_try_new_rejects_negative_capacity() {
        let err = BoundedSelector::<i32, _>::try_new(-1, Natural).unwrap_err();
        assert!(matches!(err, Error::InvalidArgument(_)));

        let selector = BoundedSelector::<i32, _>::try_new(4, Natural).unwrap();
        assert_eq!(selector.capacity(), 4);
    }

    #[test]
    fn test_merge_keeps_least_of_union() {
        let mut left = BoundedSelector::natural(3);
        left.extend([5, 3, 8]);
        let mut right = BoundedSelector::natural(3);
        right.extend([1, 9, 2]);

        let merged = left.merge(right).unwrap();
        assert_eq!(merged.into_sorted_vec(), vec![1, 2, 3]);
    }

    #[test]
    fn test_merge_then_put() {
        let mut left = BoundedSelector::natural(3);
        left.extend([6, 5, 4]);
        let mut right = BoundedSelector::natural(3);
        right.extend([3, 1, 0]);

        let mut result = left.merge(right).unwrap();
        result.put(2);
        assert_eq!(result.to_sorted_vec(), vec![0, 1, 2]);
    }

    #[test]
    fn test_merge_partial_selectors_fits() {
        let mut left = BoundedSelector::natural(10);
        left.extend([7, 4]);
        let mut right = BoundedSelector::natural(10);
        right.extend([9, 1, 5]);

        let merged = left.merge(right).unwrap();
        assert_eq!(merged.len(), 5);
        assert_eq!(merged.worst(), Some(&9));
        assert_eq!(merged.into_sorted_vec(), vec![1, 4, 5, 7, 9]);
    }

    #[test]
    fn test_merge_rejects_different_capacity() {
        let left: BoundedSelector<i32, _> = BoundedSelector::natural(3);
        let right = BoundedSelector::natural(4);
        let err = left.merge(right).unwrap_err();
        assert!(matches!(err, Error::IncompatibleMerge { .. }));
    }

    #[test]
    fn test_merge_rejects_different_comparator_instances() {
        let modulus = 7;
        let cmp = move |a: &i32, b: &i32| (a % modulus).cmp(&(b % modulus));
        let left = BoundedSelector::new(3, cmp);
        let right = BoundedSelector::new(3, cmp);
        assert!(!left.is_compatible(&right));
        assert!(left.merge(right).is_err());

        let shared = Arc::new(cmp);
        let left = BoundedSelector::with_shared(3, Arc::clone(&shared));
        let right = BoundedSelector::with_shared(3, shared);
        assert!(left.merge(right).is_ok());
    }

    #[test]
    fn test_to_sorted_vec_is_idempotent() {
        let mut selector = BoundedSelector::natural(4);
        selector.extend([9, 3, 7, 1, 5]);
        let first = selector.to_sorted_vec();
        let second = selector.to_sorted_vec();
        assert_eq!(first, second);
        assert_eq!(first, vec![1, 3, 5, 7]);
    }

    #[test]
    fn test_reversed_keeps_greatest() {
        let mut selector = BoundedSelector::new(3, Reversed(Natural));
        selector.extend([5, 2, 8, 10, 1]);
        assert_eq!(selector.into_sorted_vec(), vec![10, 8, 5]);
    }

    #[test]
    fn test_absent_values_sort_first() {
        // None sorts before any present value, present values by length
        let cmp = by_key(|s: &Option<&str>| s.map(str::len));
        let mut selector = BoundedSelector::new(3, cmp);
        selector.extend([Some("abgdc"), Some("abc"), None, Some("a"), Some("fgssdfg")]);
        assert_eq!(selector.into_sorted_vec(), vec![None, Some("a"), Some("abc")]);
    }
}
