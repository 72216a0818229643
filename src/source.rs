use std::ops::{ControlFlow, Range};

/// A source of elements that can be split into independent halves for
/// parallel traversal.
pub trait SplitSource: Sized + Send {
    type Item: Send;

    /// Number of remaining elements, if known.
    fn estimated_size(&self) -> Option<usize>;

    /// Splits off the prefix of the remaining elements.
    ///
    /// On success `self` keeps the suffix; the two parts are disjoint and
    /// together cover what `self` held before. Returns `None` when the
    /// source cannot (or should not) be split further.
    fn try_split(&mut self) -> Option<Self>;

    /// Feeds remaining elements to `f` in encounter order until `f` breaks.
    fn try_for_each_remaining<F>(self, f: F) -> ControlFlow<()>
    where
        F: FnMut(Self::Item) -> ControlFlow<()>;

    fn for_each_remaining<F>(self, mut f: F)
    where
        F: FnMut(Self::Item),
    {
        let _ = self.try_for_each_remaining(|item| {
            f(item);
            ControlFlow::Continue(())
        });
    }

    /// Whether the source has a meaningful encounter order. Prefix scans
    /// over unordered sources only compute chunk-local reductions.
    fn is_ordered(&self) -> bool {
        true
    }

    /// Drops the encounter-order guarantee.
    fn unordered(self) -> Unordered<Self> {
        Unordered(self)
    }
}

/// An owned vector, split in halves.
#[derive(Debug, Clone)]
pub struct VecSource<T> {
    items: Vec<T>,
}

impl<T: Send> VecSource<T> {
    pub fn new(items: Vec<T>) -> Self {
        Self { items }
    }
}

impl<T: Send> From<Vec<T>> for VecSource<T> {
    fn from(items: Vec<T>) -> Self {
        Self::new(items)
    }
}

impl<T: Send> SplitSource for VecSource<T> {
    type Item = T;

    fn estimated_size(&self) -> Option<usize> {
        Some(self.items.len())
    }

    fn try_split(&mut self) -> Option<Self> {
        if self.items.len() < 2 {
            return None;
        }
        let suffix = self.items.split_off(self.items.len() / 2);
        let prefix = std::mem::replace(&mut self.items, suffix);
        Some(Self { items: prefix })
    }

    fn try_for_each_remaining<F>(self, mut f: F) -> ControlFlow<()>
    where
        F: FnMut(T) -> ControlFlow<()>,
    {
        for item in self.items {
            f(item)?;
        }
        ControlFlow::Continue(())
    }
}

/// A borrowed slice, yielding references.
#[derive(Debug)]
pub struct SliceSource<'a, T> {
    items: &'a [T],
}

impl<'a, T: Sync> SliceSource<'a, T> {
    pub fn new(items: &'a [T]) -> Self {
        Self { items }
    }
}

impl<'a, T: Sync> SplitSource for SliceSource<'a, T> {
    type Item = &'a T;

    fn estimated_size(&self) -> Option<usize> {
        Some(self.items.len())
    }

    fn try_split(&mut self) -> Option<Self> {
        if self.items.len() < 2 {
            return None;
        }
        let (prefix, suffix) = self.items.split_at(self.items.len() / 2);
        self.items = suffix;
        Some(Self { items: prefix })
    }

    fn try_for_each_remaining<F>(self, mut f: F) -> ControlFlow<()>
    where
        F: FnMut(&'a T) -> ControlFlow<()>,
    {
        for item in self.items {
            f(item)?;
        }
        ControlFlow::Continue(())
    }
}

/// A half-open integer range.
#[derive(Debug, Clone)]
pub struct RangeSource {
    range: Range<i64>,
}

impl RangeSource {
    pub fn new(range: Range<i64>) -> Self {
        Self { range }
    }

    fn remaining(&self) -> u64 {
        if self.range.end > self.range.start {
            self.range.end.abs_diff(self.range.start)
        } else {
            0
        }
    }
}

impl SplitSource for RangeSource {
    type Item = i64;

    fn estimated_size(&self) -> Option<usize> {
        usize::try_from(self.remaining()).ok()
    }

    fn try_split(&mut self) -> Option<Self> {
        let len = self.remaining();
        if len < 2 {
            return None;
        }
        let mid = self.range.start.wrapping_add((len / 2) as i64);
        let prefix = self.range.start..mid;
        self.range.start = mid;
        Some(Self { range: prefix })
    }

    fn try_for_each_remaining<F>(self, mut f: F) -> ControlFlow<()>
    where
        F: FnMut(i64) -> ControlFlow<()>,
    {
        for item in self.range {
            f(item)?;
        }
        ControlFlow::Continue(())
    }
}

/// Wraps a source and reports it as unordered.
#[derive(Debug, Clone)]
pub struct Unordered<S>(pub S);

impl<S: SplitSource> SplitSource for Unordered<S> {
    type Item = S::Item;

    fn estimated_size(&self) -> Option<usize> {
        self.0.estimated_size()
    }

    fn try_split(&mut self) -> Option<Self> {
        self.0.try_split().map(Unordered)
    }

    fn try_for_each_remaining<F>(self, f: F) -> ControlFlow<()>
    where
        F: FnMut(S::Item) -> ControlFlow<()>,
    {
        self.0.try_for_each_remaining(f)
    }

    fn is_ordered(&self) -> bool {
        false
    }
}
