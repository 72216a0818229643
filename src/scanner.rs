use crate::config::ScanConfig;
use crate::error::Result;
use crate::parallel_scanner;
use crate::source::SplitSource;
use rayon::ThreadPool;
use std::sync::Arc;
use tracing::debug;

/// Computes inclusive running reductions (prefix scans) over split sources.
///
/// The strategy depends on two switches:
/// - `config.scan.parallel` picks the calling thread or the thread pool
/// - `source.is_ordered()` picks a global prefix or chunk-local prefixes
///
/// The operator must be associative; it need not be commutative.
pub struct PrefixScanner {
    config: ScanConfig,
    pool: Option<Arc<ThreadPool>>,
}

impl PrefixScanner {
    /// Creates a scanner. A non-zero `executor.threads` builds a dedicated
    /// pool; otherwise work runs on rayon's global pool.
    pub fn new(config: ScanConfig) -> Result<Self> {
        config.validate()?;

        let pool = if config.executor.threads > 0 {
            let pool = rayon::ThreadPoolBuilder::new()
                .num_threads(config.executor.threads)
                .thread_name(|idx| format!("scanlimit-{}", idx))
                .build()?;
            Some(Arc::new(pool))
        } else {
            None
        };

        Ok(Self { config, pool })
    }

    /// A scanner that never leaves the calling thread.
    pub fn sequential() -> Self {
        Self {
            config: ScanConfig::default().sequential(),
            pool: None,
        }
    }

    pub fn config(&self) -> &ScanConfig {
        &self.config
    }

    /// Number of worker threads parallel scans run on.
    pub fn threads(&self) -> usize {
        match &self.pool {
            Some(pool) => pool.current_num_threads(),
            None => rayon::current_num_threads(),
        }
    }

    /// Runs `op` inside the scanner's pool, so that rayon work started from
    /// it (e.g. [`crate::collect_par`]) uses the same threads.
    pub fn install<R, OP>(&self, op: OP) -> R
    where
        OP: FnOnce() -> R + Send,
        R: Send,
    {
        match &self.pool {
            Some(pool) => pool.install(op),
            None => op(),
        }
    }

    /// Splits a source into leaves, in encounter order.
    pub(crate) fn plan<S: SplitSource>(&self, source: S) -> Vec<S> {
        let threads = self.threads();
        let leaf_size = self.config.leaf_size_for(source.estimated_size(), threads);
        let depth = self.config.unknown_size_depth(threads);

        let mut leaves = Vec::new();
        split_into(source, leaf_size, depth, &mut leaves);

        debug!(leaves = leaves.len(), leaf_size, threads, "planned split");
        leaves
    }

    /// Computes the prefix scan of `source` under `op` and materializes it.
    ///
    /// For ordered sources, position `i` holds `op(e[0], ..., e[i])`,
    /// whatever the split granularity or thread count. For unordered sources
    /// on the pool, every leaf restarts the reduction at its first element.
    pub fn scan<S, F>(&self, source: S, op: F) -> Vec<S::Item>
    where
        S: SplitSource,
        S::Item: Clone + Sync,
        F: Fn(&S::Item, &S::Item) -> S::Item + Sync,
    {
        if !self.config.scan.parallel {
            return local_prefix(source, &op);
        }

        let ordered = source.is_ordered();
        self.install(|| {
            let leaves = self.plan(source);
            if ordered {
                parallel_scanner::scan_ordered(leaves, &op)
            } else {
                parallel_scanner::scan_unordered(leaves, &op)
            }
        })
    }
}

impl Default for PrefixScanner {
    fn default() -> Self {
        Self {
            config: ScanConfig::default(),
            pool: None,
        }
    }
}

fn split_into<S: SplitSource>(mut source: S, leaf_size: usize, depth: u32, out: &mut Vec<S>) {
    // Sources of unknown size are split to a fixed depth
    let wants_split = match source.estimated_size() {
        Some(size) => size > leaf_size,
        None => depth > 0,
    };

    if wants_split {
        if let Some(prefix) = source.try_split() {
            let depth = depth.saturating_sub(1);
            split_into(prefix, leaf_size, depth, out);
            split_into(source, leaf_size, depth, out);
            return;
        }
    }

    out.push(source);
}

/// Single-pass inclusive prefix of one source.
pub(crate) fn local_prefix<S, F>(source: S, op: &F) -> Vec<S::Item>
where
    S: SplitSource,
    F: Fn(&S::Item, &S::Item) -> S::Item,
{
    let mut out: Vec<S::Item> = Vec::with_capacity(source.estimated_size().unwrap_or(0));
    source.for_each_remaining(|item| {
        let next = match out.last() {
            Some(prev) => op(prev, &item),
            None => item,
        };
        out.push(next);
    });
    out
}

/// Lazy running reduction over an iterator; see [`PrefixExt::prefix`].
pub struct PrefixIter<I: Iterator, F> {
    iter: I,
    op: F,
    acc: Option<I::Item>,
}

impl<I, F> Iterator for PrefixIter<I, F>
where
    I: Iterator,
    I::Item: Clone,
    F: FnMut(&I::Item, &I::Item) -> I::Item,
{
    type Item = I::Item;

    fn next(&mut self) -> Option<I::Item> {
        let item = self.iter.next()?;
        let next = match self.acc.take() {
            Some(prev) => (self.op)(&prev, &item),
            None => item,
        };
        self.acc = Some(next.clone());
        Some(next)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.iter.size_hint()
    }
}

pub trait PrefixExt: Iterator + Sized {
    /// Yields `op(e[0], ..., e[i])` for each position, one element at a time.
    ///
    /// Nothing past the last consumed position is computed, so
    /// short-circuiting adapters like `any` or `find` stop the work too.
    fn prefix<F>(self, op: F) -> PrefixIter<Self, F>
    where
        F: FnMut(&Self::Item, &Self::Item) -> Self::Item,
    {
        PrefixIter {
            iter: self,
            op,
            acc: None,
        }
    }
}

impl<I: Iterator> PrefixExt for I {}
