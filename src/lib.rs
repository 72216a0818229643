//! Bounded least-k selection and parallel prefix scans.
//!
//! Two mechanisms share one execution model, a [`SplitSource`] split into
//! leaves that run on a rayon pool:
//!
//! - [`BoundedSelector`] keeps the k smallest elements under a comparator and
//!   merges with other selectors; [`LeastK`] plugs it into the [`Collector`]
//!   protocol, so sequential and parallel collection give the same result.
//! - [`PrefixScanner`] computes running reductions under an associative
//!   operator, materialized ([`PrefixScanner::scan`]), lazily
//!   ([`PrefixExt::prefix`]) or with early exit ([`PrefixScanner::find`]).
//!
//! ```
//! use scanlimit::{collect_iter, LeastK, PrefixScanner, VecSource};
//!
//! let least = collect_iter(&LeastK::natural(3), [5, 3, 8, 1, 9, 2]);
//! assert_eq!(least, vec![1, 2, 3]);
//!
//! let sums = PrefixScanner::default().scan(VecSource::new(vec![1, 2, 3, 4]), |a, b| a + b);
//! assert_eq!(sums, vec![1, 3, 6, 10]);
//! ```

pub mod bounded_heap;
pub mod collector;
pub mod config;
pub mod error;
mod parallel_scanner;
pub mod scanner;
mod short_circuit;
pub mod source;

pub use bounded_heap::{by_key, BoundedSelector, ByKey, Comparator, Natural, Reversed};
pub use collector::{collect_iter, collect_par, collect_split, Collector, LeastK};
pub use config::{ExecutorConfig, ScanConfig, ScanSettings};
pub use error::{Error, Result};
pub use scanner::{PrefixExt, PrefixIter, PrefixScanner};
pub use source::{RangeSource, SliceSource, SplitSource, Unordered, VecSource};
