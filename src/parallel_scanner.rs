use crate::scanner::local_prefix;
use crate::source::SplitSource;
use rayon::prelude::*;
use tracing::{debug, trace};

/// Two-phase ordered prefix scan over pre-split leaves.
///
/// Phase 1 computes every leaf's local prefix independently; the last local
/// value is the leaf's total. The carry entering leaf `i` is the fold of the
/// totals of leaves `0..i`, so it only depends on leaves to its left. Phase 2
/// adjusts each leaf by its carry, again independently.
pub(crate) fn scan_ordered<S, F>(leaves: Vec<S>, op: &F) -> Vec<S::Item>
where
    S: SplitSource,
    S::Item: Clone + Sync,
    F: Fn(&S::Item, &S::Item) -> S::Item + Sync,
{
    let mut chunks: Vec<Vec<S::Item>> = leaves
        .into_par_iter()
        .map(|leaf| local_prefix(leaf, op))
        .collect();

    let carries = carry_ins(&chunks, op);

    chunks
        .par_iter_mut()
        .zip(carries.into_par_iter())
        .for_each(|(chunk, carry)| {
            if let Some(carry) = carry {
                for value in chunk.iter_mut() {
                    *value = op(&carry, &*value);
                }
            }
        });

    debug!(leaves = chunks.len(), "ordered prefix scan finished");
    concat(chunks)
}

/// Chunk-local prefix scan: leaves never see each other's values.
pub(crate) fn scan_unordered<S, F>(leaves: Vec<S>, op: &F) -> Vec<S::Item>
where
    S: SplitSource,
    F: Fn(&S::Item, &S::Item) -> S::Item + Sync,
{
    let chunks: Vec<Vec<S::Item>> = leaves
        .into_par_iter()
        .map(|leaf| {
            let chunk = local_prefix(leaf, op);
            trace!(len = chunk.len(), "unordered leaf done");
            chunk
        })
        .collect();

    debug!(leaves = chunks.len(), "unordered prefix scan finished");
    concat(chunks)
}

/// Folds leaf totals left to right. Entry `i` is the reduction of all
/// elements in chunks `0..i`, or `None` when they are all empty.
fn carry_ins<T, F>(chunks: &[Vec<T>], op: &F) -> Vec<Option<T>>
where
    T: Clone,
    F: Fn(&T, &T) -> T,
{
    let mut carries = Vec::with_capacity(chunks.len());
    let mut carry: Option<T> = None;

    for chunk in chunks {
        carries.push(carry.clone());
        if let Some(total) = chunk.last() {
            carry = Some(match &carry {
                Some(prev) => op(prev, total),
                None => total.clone(),
            });
        }
    }

    carries
}

fn concat<T>(chunks: Vec<Vec<T>>) -> Vec<T> {
    let total = chunks.iter().map(Vec::len).sum();
    let mut out = Vec::with_capacity(total);
    for chunk in chunks {
        out.extend(chunk);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::VecSource;

    fn leaves(parts: &[&[i64]]) -> Vec<VecSource<i64>> {
        parts.iter().map(|p| VecSource::new(p.to_vec())).collect()
    }

    fn sum(a: &i64, b: &i64) -> i64 {
        a + b
    }

    #[test]
    fn test_scan_ordered_applies_carry() {
        let out = scan_ordered(leaves(&[&[1, 2], &[3, 4]]), &sum);
        assert_eq!(out, vec![1, 3, 6, 10]);
    }

    #[test]
    fn test_scan_ordered_skips_empty_leaves() {
        let out = scan_ordered(leaves(&[&[], &[5], &[], &[], &[1, 1], &[]]), &sum);
        assert_eq!(out, vec![5, 6, 7]);
    }

    #[test]
    fn test_scan_unordered_restarts_per_leaf() {
        let out = scan_unordered(leaves(&[&[1, 2], &[3, 4]]), &sum);
        assert_eq!(out, vec![1, 3, 3, 7]);
    }

    #[test]
    fn test_carry_ins() {
        let chunks = vec![vec![1i64, 3], vec![], vec![4, 9], vec![2]];
        assert_eq!(carry_ins(&chunks, &sum), vec![None, Some(3), Some(3), Some(12)]);
    }
}
