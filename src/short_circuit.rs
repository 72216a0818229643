//! Early-exit searches over prefix scans.
//!
//! A search looks for a prefix value satisfying a predicate and stops as
//! soon as the answer is known:
//!
//! - Sequential: a single pass that stops at the first match.
//! - Parallel, ordered: the predicate only ever sees carry-adjusted values,
//!   and leaf `i` is checked only after leaves `0..i` were checked. Each leaf
//!   waits on two dependencies, its own local prefix and the carry from its
//!   left neighbour; whichever task resolves the second one runs the check.
//!   After a match, leaves that have not started are skipped.
//! - Parallel, unordered: any leaf may report a match and cancel the rest.

use crate::scanner::PrefixScanner;
use crate::source::SplitSource;
use parking_lot::Mutex;
use rayon::prelude::*;
use std::ops::ControlFlow;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::debug;

/// In-flight leaves poll the cancellation flag this often.
const CANCEL_CHECK_INTERVAL: usize = 1024;

impl PrefixScanner {
    /// Finds a prefix value satisfying `pred`.
    ///
    /// For ordered sources the result is the first match in encounter
    /// order, exactly as a sequential scan would find it. For unordered
    /// sources on the pool it is any chunk-local value that matches.
    /// Returns `None` once every position was checked without a match.
    pub fn find<S, F, P>(&self, source: S, op: F, pred: P) -> Option<S::Item>
    where
        S: SplitSource,
        F: Fn(&S::Item, &S::Item) -> S::Item + Sync,
        P: Fn(&S::Item) -> bool + Sync,
    {
        if !self.config().scan.parallel {
            return find_in_leaf(source, &op, &pred, &AtomicBool::new(false));
        }

        let ordered = source.is_ordered();
        self.install(|| {
            let leaves = self.plan(source);
            if ordered {
                find_ordered(leaves, &op, &pred)
            } else {
                find_unordered(leaves, &op, &pred)
            }
        })
    }

    /// Whether any prefix value satisfies `pred`.
    pub fn any_match<S, F, P>(&self, source: S, op: F, pred: P) -> bool
    where
        S: SplitSource,
        F: Fn(&S::Item, &S::Item) -> S::Item + Sync,
        P: Fn(&S::Item) -> bool + Sync,
    {
        self.find(source, op, pred).is_some()
    }
}

/// Scans one leaf from scratch and stops at the first local match.
fn find_in_leaf<S, F, P>(leaf: S, op: &F, pred: &P, cancelled: &AtomicBool) -> Option<S::Item>
where
    S: SplitSource,
    F: Fn(&S::Item, &S::Item) -> S::Item,
    P: Fn(&S::Item) -> bool,
{
    let mut acc: Option<S::Item> = None;
    let mut found = None;
    let mut seen = 0usize;

    let _ = leaf.try_for_each_remaining(|item| {
        seen += 1;
        if seen % CANCEL_CHECK_INTERVAL == 0 && cancelled.load(Ordering::Relaxed) {
            return ControlFlow::Break(());
        }

        let next = match acc.take() {
            Some(prev) => op(&prev, &item),
            None => item,
        };
        if pred(&next) {
            found = Some(next);
            return ControlFlow::Break(());
        }
        acc = Some(next);
        ControlFlow::Continue(())
    });

    found
}

fn find_unordered<S, F, P>(leaves: Vec<S>, op: &F, pred: &P) -> Option<S::Item>
where
    S: SplitSource,
    F: Fn(&S::Item, &S::Item) -> S::Item + Sync,
    P: Fn(&S::Item) -> bool + Sync,
{
    let cancelled = AtomicBool::new(false);

    let found = leaves.into_par_iter().find_map_any(|leaf| {
        if cancelled.load(Ordering::Relaxed) {
            return None;
        }
        let hit = find_in_leaf(leaf, op, pred, &cancelled);
        if hit.is_some() {
            cancelled.store(true, Ordering::Relaxed);
        }
        hit
    });

    debug!(matched = found.is_some(), "unordered prefix search finished");
    found
}

fn find_ordered<S, F, P>(leaves: Vec<S>, op: &F, pred: &P) -> Option<S::Item>
where
    S: SplitSource,
    F: Fn(&S::Item, &S::Item) -> S::Item + Sync,
    P: Fn(&S::Item) -> bool + Sync,
{
    let search = OrderedSearch::new(leaves.len(), op, pred);

    leaves.into_par_iter().enumerate().for_each(|(idx, leaf)| {
        if search.cancelled.load(Ordering::Acquire) {
            return;
        }
        if let Some(local) = local_prefix_until(leaf, op, &search.cancelled) {
            search.complete_local(idx, local);
        }
    });

    let found = search.found.into_inner();
    debug!(matched = found.is_some(), "ordered prefix search finished");
    found
}

/// Local prefix of one leaf, abandoned if the search gets cancelled.
fn local_prefix_until<S, F>(leaf: S, op: &F, cancelled: &AtomicBool) -> Option<Vec<S::Item>>
where
    S: SplitSource,
    F: Fn(&S::Item, &S::Item) -> S::Item,
{
    let mut out: Vec<S::Item> = Vec::with_capacity(leaf.estimated_size().unwrap_or(0));
    let flow = leaf.try_for_each_remaining(|item| {
        if out.len() % CANCEL_CHECK_INTERVAL == CANCEL_CHECK_INTERVAL - 1
            && cancelled.load(Ordering::Relaxed)
        {
            return ControlFlow::Break(());
        }
        let next = match out.last() {
            Some(prev) => op(prev, &item),
            None => item,
        };
        out.push(next);
        ControlFlow::Continue(())
    });

    match flow {
        ControlFlow::Continue(()) => Some(out),
        ControlFlow::Break(()) => None,
    }
}

struct LeafSlot<T> {
    local: Option<Vec<T>>,
    carry: Option<T>,
    /// Unresolved dependencies: the local prefix, plus the carry for every
    /// leaf but the first.
    pending: u8,
}

struct OrderedSearch<'a, T, F, P> {
    slots: Vec<Mutex<LeafSlot<T>>>,
    found: Mutex<Option<T>>,
    cancelled: AtomicBool,
    op: &'a F,
    pred: &'a P,
}

impl<'a, T, F, P> OrderedSearch<'a, T, F, P>
where
    F: Fn(&T, &T) -> T,
    P: Fn(&T) -> bool,
{
    fn new(leaf_count: usize, op: &'a F, pred: &'a P) -> Self {
        let slots = (0..leaf_count)
            .map(|idx| {
                Mutex::new(LeafSlot {
                    local: None,
                    carry: None,
                    pending: if idx == 0 { 1 } else { 2 },
                })
            })
            .collect();

        Self {
            slots,
            found: Mutex::new(None),
            cancelled: AtomicBool::new(false),
            op,
            pred,
        }
    }

    /// Records the local prefix of leaf `idx` and checks every leaf this
    /// unblocks.
    fn complete_local(&self, idx: usize, local: Vec<T>) {
        let ready = {
            let mut slot = self.slots[idx].lock();
            slot.local = Some(local);
            slot.pending -= 1;
            slot.pending == 0
        };
        if ready {
            self.check_from(idx);
        }
    }

    fn check_from(&self, mut idx: usize) {
        loop {
            let (local, carry) = {
                let mut slot = self.slots[idx].lock();
                (slot.local.take().unwrap_or_default(), slot.carry.take())
            };

            let carry_out = match self.check_leaf(local, carry) {
                ControlFlow::Break(hit) => {
                    *self.found.lock() = Some(hit);
                    self.cancelled.store(true, Ordering::Release);
                    debug!(leaf = idx, "ordered prefix search matched");
                    return;
                }
                ControlFlow::Continue(carry_out) => carry_out,
            };

            idx += 1;
            if idx == self.slots.len() {
                return;
            }

            let ready = {
                let mut slot = self.slots[idx].lock();
                slot.carry = carry_out;
                slot.pending -= 1;
                slot.pending == 0
            };
            // The right neighbour is still computing; its task picks up from here
            if !ready {
                return;
            }
        }
    }

    /// Applies the carry to a leaf's local prefix and tests every value.
    /// Continues with the carry for the next leaf.
    fn check_leaf(&self, local: Vec<T>, carry: Option<T>) -> ControlFlow<T, Option<T>> {
        let mut last = None;
        for value in local {
            let adjusted = match &carry {
                Some(c) => (self.op)(c, &value),
                None => value,
            };
            if (self.pred)(&adjusted) {
                return ControlFlow::Break(adjusted);
            }
            last = Some(adjusted);
        }
        ControlFlow::Continue(last.or(carry))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ScanConfig;
    use crate::source::{RangeSource, VecSource};
    use std::sync::atomic::AtomicUsize;

    fn sum(a: &i64, b: &i64) -> i64 {
        a + b
    }

    fn scanners() -> Vec<PrefixScanner> {
        vec![
            PrefixScanner::sequential(),
            PrefixScanner::new(ScanConfig::default().with_threads(4).with_leaf_size(7)).unwrap(),
            PrefixScanner::new(ScanConfig::default().with_threads(2).with_leaf_size(1)).unwrap(),
            PrefixScanner::default(),
        ]
    }

    #[test]
    fn test_any_match_not_found() {
        for scanner in scanners() {
            assert!(!scanner.any_match(RangeSource::new(0..100_000), sum, |&x| x == -1));
            assert!(!scanner.any_match(RangeSource::new(0..100_000).unordered(), sum, |&x| x == -1));
        }
    }

    #[test]
    fn test_find_ordered_returns_first_match() {
        for scanner in scanners() {
            // Prefix sums of 0..: 0, 1, 3, 6, 10, 15, ...; first >= 1000 is 1035
            let hit = scanner.find(RangeSource::new(0..10_000), sum, |&x| x >= 1000);
            assert_eq!(hit, Some(1035));
        }
    }

    #[test]
    fn test_find_ordered_non_commutative() {
        let letters: Vec<String> = "abcdefghijklmnopqrstuvwxyz".chars().map(String::from).collect();
        let concat = |a: &String, b: &String| format!("{}{}", a, b);
        for scanner in scanners() {
            let hit = scanner.find(VecSource::new(letters.clone()), concat, |s: &String| {
                s.ends_with("klm")
            });
            assert_eq!(hit.as_deref(), Some("abcdefghijklm"));
        }
    }

    #[test]
    fn test_find_ordered_matches_value_only_reachable_with_carry() {
        // Every leaf is [1]; the value 20 only exists after carry adjustment
        let scanner =
            PrefixScanner::new(ScanConfig::default().with_threads(4).with_leaf_size(1)).unwrap();
        let hit = scanner.find(VecSource::new(vec![1i64; 64]), sum, |&x| x == 20);
        assert_eq!(hit, Some(20));
        assert!(!scanner.any_match(VecSource::new(vec![1i64; 64]), sum, |&x| x == 65));
    }

    #[test]
    fn test_find_unordered_sees_chunk_local_values() {
        // Leaves of [1, 1]: chunk-local sums never exceed 2
        let scanner =
            PrefixScanner::new(ScanConfig::default().with_threads(4).with_leaf_size(2)).unwrap();
        let source = || VecSource::new(vec![1i64; 64]).unordered();
        assert!(scanner.any_match(source(), sum, |&x| x == 2));
        assert!(!scanner.any_match(source(), sum, |&x| x == 3));

        // The ordered view reaches 64
        assert!(scanner.any_match(VecSource::new(vec![1i64; 64]), sum, |&x| x == 64));
    }

    #[test]
    fn test_find_empty_source() {
        for scanner in scanners() {
            assert_eq!(scanner.find(VecSource::new(Vec::<i64>::new()), sum, |_| true), None);
        }
    }

    #[test]
    fn test_ordered_match_skips_remaining_leaves() {
        // One worker visits leaves in order, so the match in leaf 0 cancels
        // everything after it
        let scanner =
            PrefixScanner::new(ScanConfig::default().with_threads(1).with_leaf_size(10)).unwrap();
        let calls = AtomicUsize::new(0);
        let counting_sum = |a: &i64, b: &i64| {
            calls.fetch_add(1, Ordering::Relaxed);
            a + b
        };

        let hit = scanner.find(RangeSource::new(0..10_000), counting_sum, |&x| x >= 0);
        assert_eq!(hit, Some(0));
        assert!(calls.load(Ordering::Relaxed) < 100);
    }

    #[test]
    fn test_check_leaf_carries_through_empty_leaf() {
        let op = sum;
        let pred = |x: &i64| *x > 100;
        let search = OrderedSearch::new(3, &op, &pred);

        assert_eq!(search.check_leaf(vec![], Some(7)), ControlFlow::Continue(Some(7)));
        assert_eq!(search.check_leaf(vec![1, 3], Some(7)), ControlFlow::Continue(Some(10)));
        assert_eq!(search.check_leaf(vec![1, 3], None), ControlFlow::Continue(Some(3)));
        assert_eq!(search.check_leaf(vec![1, 200], Some(7)), ControlFlow::Break(207));
    }
}
