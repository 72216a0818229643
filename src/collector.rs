use crate::bounded_heap::{checked_capacity, BoundedSelector, Comparator, Natural, Reversed};
use crate::error::Result;
use crate::source::SplitSource;
use rayon::prelude::*;
use std::marker::PhantomData;
use std::sync::Arc;

/// The supply/accumulate/combine/finish protocol for parallel collection.
///
/// A collector must produce the same finished result whether it runs with a
/// single accumulator and no `combine` calls, or with many partial
/// accumulators combined pairwise in any tree order.
pub trait Collector<T> {
    type Acc;
    type Output;

    /// Creates a fresh, empty accumulator.
    fn supply(&self) -> Self::Acc;

    /// Folds one element into an accumulator.
    fn accumulate(&self, acc: &mut Self::Acc, item: T);

    /// Merges two partial accumulators; `a` holds the earlier elements.
    fn combine(&self, a: Self::Acc, b: Self::Acc) -> Self::Acc;

    fn finish(&self, acc: Self::Acc) -> Self::Output;
}

/// Collects an iterator sequentially: one accumulator, no combine.
pub fn collect_iter<T, K, I>(collector: &K, iter: I) -> K::Output
where
    K: Collector<T>,
    I: IntoIterator<Item = T>,
{
    let mut acc = collector.supply();
    for item in iter {
        collector.accumulate(&mut acc, item);
    }
    collector.finish(acc)
}

/// Collects a rayon parallel iterator: one accumulator per rayon fold,
/// combined by rayon's reduction tree.
pub fn collect_par<T, K, P>(collector: &K, iter: P) -> K::Output
where
    T: Send,
    K: Collector<T> + Sync,
    K::Acc: Send,
    P: IntoParallelIterator<Item = T>,
{
    let acc = iter
        .into_par_iter()
        .fold(
            || collector.supply(),
            |mut acc, item| {
                collector.accumulate(&mut acc, item);
                acc
            },
        )
        .reduce(|| collector.supply(), |a, b| collector.combine(a, b));
    collector.finish(acc)
}

/// Collects a splittable source by recursive splitting down to `leaf_size`
/// elements, accumulating each leaf on its own task.
pub fn collect_split<K, S>(collector: &K, source: S, leaf_size: usize) -> K::Output
where
    S: SplitSource,
    K: Collector<S::Item> + Sync,
    K::Acc: Send,
{
    let acc = collect_split_acc(collector, source, leaf_size.max(1));
    collector.finish(acc)
}

fn collect_split_acc<K, S>(collector: &K, mut source: S, leaf_size: usize) -> K::Acc
where
    S: SplitSource,
    K: Collector<S::Item> + Sync,
    K::Acc: Send,
{
    let splittable = source.estimated_size().map_or(true, |size| size > leaf_size);
    if splittable {
        if let Some(prefix) = source.try_split() {
            let (left, right) = rayon::join(
                || collect_split_acc(collector, prefix, leaf_size),
                || collect_split_acc(collector, source, leaf_size),
            );
            return collector.combine(left, right);
        }
    }

    let mut acc = collector.supply();
    source.for_each_remaining(|item| collector.accumulate(&mut acc, item));
    acc
}

/// Collects the `capacity` least elements under a comparator, in ascending
/// order.
///
/// Every accumulator shares one comparator, so partial selectors can always
/// be combined.
pub struct LeastK<T, C> {
    capacity: usize,
    cmp: Arc<C>,
    _marker: PhantomData<fn(T)>,
}

impl<T, C: Comparator<T>> LeastK<T, C> {
    pub fn new(capacity: usize, cmp: C) -> Self {
        Self {
            capacity,
            cmp: Arc::new(cmp),
            _marker: PhantomData,
        }
    }

    /// Like [`LeastK::new`], but takes a signed limit and fails on negative
    /// values.
    pub fn try_new(limit: i64, cmp: C) -> Result<Self> {
        checked_capacity(limit).map(|capacity| Self::new(capacity, cmp))
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

impl<T: Ord> LeastK<T, Natural> {
    pub fn natural(capacity: usize) -> Self {
        Self::new(capacity, Natural)
    }
}

impl<T, C: Comparator<T>> LeastK<T, Reversed<C>> {
    /// Collects the `capacity` greatest elements, largest first.
    pub fn greatest(capacity: usize, cmp: C) -> Self {
        Self::new(capacity, Reversed(cmp))
    }
}

impl<T, C: Comparator<T>> Collector<T> for LeastK<T, C> {
    type Acc = BoundedSelector<T, C>;
    type Output = Vec<T>;

    fn supply(&self) -> Self::Acc {
        BoundedSelector::with_shared(self.capacity, Arc::clone(&self.cmp))
    }

    fn accumulate(&self, acc: &mut Self::Acc, item: T) {
        acc.put(item);
    }

    fn combine(&self, a: Self::Acc, b: Self::Acc) -> Self::Acc {
        a.absorb(b)
    }

    fn finish(&self, acc: Self::Acc) -> Vec<T> {
        acc.into_sorted_vec()
    }
}
