// file: src/pipeline/batcher.rs
// description: order-preserving fixed-size partitioning of discovered files

/// Splits `items` into contiguous chunks of at most `batch_size`, in order.
/// A zero size is treated as one; configuration rejects it before a run.
pub fn partition<T: Clone>(items: &[T], batch_size: usize) -> Vec<Vec<T>> {
    items
        .chunks(batch_size.max(1))
        .map(|chunk| chunk.to_vec())
        .collect()
}
