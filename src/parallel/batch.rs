//! Batch splitting for the Monte Carlo runner.
//!
//! Trials run in contiguous index batches; batch boundaries are where the
//! orchestrator checks cancellation and emits progress.

/// Split `total` items into up to `num_batches` ranges `[start, end)`.
/// Batches are as equal in size as possible; later batches may be smaller.
///
/// # Example
/// ```
/// # use furlong::parallel::batch_ranges;
/// let ranges = batch_ranges(100, 4);
/// assert_eq!(ranges, vec![(0, 25), (25, 50), (50, 75), (75, 100)]);
/// ```
pub fn batch_ranges(total: usize, num_batches: usize) -> Vec<(usize, usize)> {
    if total == 0 || num_batches == 0 {
        return Vec::new();
    }
    let num_batches = num_batches.min(total);
    let base = total / num_batches;
    let remainder = total % num_batches;
    let mut ranges = Vec::with_capacity(num_batches);
    let mut start = 0;
    for i in 0..num_batches {
        let size = base + usize::from(i < remainder);
        let end = start + size;
        ranges.push((start, end));
        start = end;
    }
    ranges
}

/// Batch count giving roughly `per_batch` trials per batch, at least one
/// batch per worker so every thread has work between checkpoints.
pub fn checkpoint_batches(total: usize, per_batch: usize, workers: usize) -> usize {
    if total == 0 {
        return 0;
    }
    let by_size = total.div_ceil(per_batch.max(1));
    by_size.max(workers.max(1))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn batch_ranges_even_split() {
        let r = batch_ranges(100, 4);
        assert_eq!(r, vec![(0, 25), (25, 50), (50, 75), (75, 100)]);
    }

    #[test]
    fn batch_ranges_with_remainder() {
        let r = batch_ranges(10, 3);
        assert_eq!(r, vec![(0, 4), (4, 7), (7, 10)]);
    }

    #[test]
    fn batch_ranges_more_batches_than_items() {
        let r = batch_ranges(3, 10);
        assert_eq!(r, vec![(0, 1), (1, 2), (2, 3)]);
    }

    #[test]
    fn batch_ranges_cover_every_index_once() {
        let ranges = batch_ranges(1000, 7);
        let mut covered = 0;
        for (start, end) in ranges {
            assert_eq!(start, covered);
            covered = end;
        }
        assert_eq!(covered, 1000);
    }

    #[test]
    fn batch_ranges_empty() {
        assert!(batch_ranges(0, 5).is_empty());
        assert!(batch_ranges(10, 0).is_empty());
    }

    #[test]
    fn checkpoint_batches_scale_with_workers() {
        assert_eq!(checkpoint_batches(1000, 250, 8), 8);
        assert_eq!(checkpoint_batches(1000, 100, 4), 10);
        assert_eq!(checkpoint_batches(0, 100, 4), 0);
    }
}
