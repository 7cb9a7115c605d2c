//! Row-range compaction for in-place deletion.

use crate::error::ReconResult;
use blindsops_sheet::Sheet;

/// A run of `count` rows starting at 1-based `start`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RowRange {
    pub start: usize,
    pub count: usize,
}

impl RowRange {
    #[must_use]
    pub fn new(start: usize, count: usize) -> Self {
        Self { start, count }
    }
}

/// Collapse row indices into maximal consecutive runs, highest start first.
///
/// Applying the ranges in the returned order never shifts a range that is
/// still pending.
#[must_use]
pub fn compact_ranges(indices: &[usize]) -> Vec<RowRange> {
    let mut sorted = indices.to_vec();
    sorted.sort_unstable();
    sorted.dedup();

    let mut ranges: Vec<RowRange> = Vec::new();
    for idx in sorted {
        match ranges.last_mut() {
            Some(run) if run.start + run.count == idx => run.count += 1,
            _ => ranges.push(RowRange::new(idx, 1)),
        }
    }
    ranges.reverse();
    ranges
}

/// Delete `ranges` from `sheet` in the given order; returns rows removed.
pub fn apply_deletions(sheet: &mut Sheet, ranges: &[RowRange]) -> ReconResult<usize> {
    let mut removed = 0;
    for range in ranges {
        removed += sheet.delete_rows(range.start, range.count)?;
    }
    Ok(removed)
}
