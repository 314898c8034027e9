// src/aggregate.rs
//! Merging and ranking of per-source result lists

use crate::types::Resume;

/// Merge two result lists, rank by profile completeness, keep the top N.
///
/// Sort is descending on `filling_percentage`; ties carry no defined
/// order. Pure function, no side effects.
pub fn aggregate(a: Vec<Resume>, b: Vec<Resume>, top_n: usize) -> Vec<Resume> {
    let mut combined = a;
    combined.extend(b);
    combined.sort_unstable_by(|x, y| y.filling_percentage.cmp(&x.filling_percentage));
    combined.truncate(top_n);
    combined
}
