//! Chunk planning and size estimation.

use std::iter::FusedIterator;

use meilisync_domain::constants::{
    DEFAULT_CHUNK_SIZE, MAX_CHUNK_SIZE, MAX_MEMORY_BUDGET_MB, MIN_CHUNK_SIZE, MIN_ITEM_SIZE_BYTES,
    SERIALIZATION_OVERHEAD, SIZE_SAMPLE_LIMIT, UNSERIALIZABLE_ITEM_SIZE_BYTES,
};
use meilisync_domain::{Result, TaskError};
use serde::Serialize;

/// Lazy sequence of contiguous chunks over a slice.
///
/// Every chunk holds `chunk_size` items except possibly the last; nothing is
/// materialized beyond the cursor.
#[derive(Debug, Clone)]
pub struct ChunkPlan<'a, T> {
    items: &'a [T],
    chunk_size: usize,
    offset: usize,
}

impl<'a, T> ChunkPlan<'a, T> {
    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }
}

impl<'a, T> Iterator for ChunkPlan<'a, T> {
    type Item = &'a [T];

    fn next(&mut self) -> Option<Self::Item> {
        if self.offset >= self.items.len() {
            return None;
        }
        let end = self.offset.saturating_add(self.chunk_size).min(self.items.len());
        let chunk = &self.items[self.offset..end];
        self.offset = end;
        Some(chunk)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.items.len() - self.offset;
        let chunks = remaining.div_ceil(self.chunk_size);
        (chunks, Some(chunks))
    }
}

impl<T> ExactSizeIterator for ChunkPlan<'_, T> {}

impl<T> FusedIterator for ChunkPlan<'_, T> {}

/// Splits `items` into chunks of `chunk_size`.
///
/// # Errors
/// Returns `TaskError::Validation` when `chunk_size` is zero.
pub fn plan_chunks<T>(items: &[T], chunk_size: usize) -> Result<ChunkPlan<'_, T>> {
    if chunk_size == 0 {
        return Err(TaskError::validation("chunk size must be at least 1"));
    }
    Ok(ChunkPlan { items, chunk_size, offset: 0 })
}

/// Estimates how many items fit in `memory_budget_mb` of serialized payload.
///
/// Sizes up to the first 10 items as JSON, adds 30% serialization overhead
/// and floors the per-item size at 100 bytes. The budget is clamped to
/// `[0, 100]` MB and the result to `[1, 10000]`. An empty sample yields the
/// default chunk size of 1000.
pub fn estimate_chunk_size<T: Serialize>(sample: &[T], memory_budget_mb: f64) -> usize {
    if sample.is_empty() {
        return DEFAULT_CHUNK_SIZE;
    }

    let sampled = &sample[..sample.len().min(SIZE_SAMPLE_LIMIT)];
    let total_bytes: f64 = sampled
        .iter()
        .map(|item| match serde_json::to_vec(item) {
            Ok(bytes) => bytes.len() as f64,
            Err(_) => UNSERIALIZABLE_ITEM_SIZE_BYTES,
        })
        .sum();
    let measured = total_bytes / sampled.len() as f64 * SERIALIZATION_OVERHEAD;
    let avg_item_size = measured.max(MIN_ITEM_SIZE_BYTES);

    // NaN compares false everywhere; treat it as an empty budget
    let budget_mb =
        if memory_budget_mb.is_nan() { 0.0 } else { memory_budget_mb.clamp(0.0, MAX_MEMORY_BUDGET_MB) };
    let budget_bytes = budget_mb * 1024.0 * 1024.0;

    let raw = (budget_bytes / avg_item_size).floor() as usize;
    raw.clamp(MIN_CHUNK_SIZE, MAX_CHUNK_SIZE)
}
