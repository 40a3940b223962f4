//! Static partitioning of a flattened index space.

use std::ops::Range;

use crate::error::ReduceError;

/// A contiguous, half-open range `[start, start + count)` of flattened
/// indices owned by one worker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Partition {
    pub index: usize,
    pub start: usize,
    pub count: usize,
}

impl Partition {
    pub fn end(&self) -> usize {
        self.start + self.count
    }

    pub fn range(&self) -> Range<usize> {
        self.start..self.end()
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }
}

/// Split `0..total` into `worker_count` contiguous partitions in index order.
///
/// Sizes differ by at most one: the first `total % worker_count` partitions
/// take one extra element. When there are more workers than elements the
/// trailing partitions are empty and start at `total`.
pub fn partition(total: usize, worker_count: usize) -> Result<Vec<Partition>, ReduceError> {
    if worker_count == 0 {
        return Err(ReduceError::invalid("worker count must be at least 1"));
    }

    let base = total / worker_count;
    let remainder = total % worker_count;

    let mut partitions = Vec::with_capacity(worker_count);
    let mut start = 0;
    for index in 0..worker_count {
        let count = if index < remainder { base + 1 } else { base };
        partitions.push(Partition { index, start, count });
        start += count;
    }

    debug_assert_eq!(start, total);
    Ok(partitions)
}
