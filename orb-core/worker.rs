use rayon::prelude::*;

use crate::error::{CoreError, CoreResult};

/// Thread pool handed to the parallel stages of the pipeline.
///
/// Every stage also accepts `None` in place of a worker and then runs on the
/// calling thread; results are identical either way.
#[derive(Debug)]
pub struct Worker {
    pool: rayon::ThreadPool,
    threads: usize,
}

impl Worker {
    pub fn new(n_threads: usize) -> CoreResult<Self> {
        if n_threads == 0 {
            return Err(CoreError::InvalidThreadCount(n_threads));
        }

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(n_threads)
            .thread_name(|index| format!("orb-worker-{index}"))
            .build()?;

        log::debug!("created worker with {n_threads} threads");
        Ok(Self {
            pool,
            threads: n_threads,
        })
    }

    /// Worker with one thread per logical CPU.
    pub fn with_default_threads() -> CoreResult<Self> {
        Self::new(num_cpus::get().max(1))
    }

    pub fn threads(&self) -> usize {
        self.threads
    }

    /// Runs `op` inside the pool.
    pub fn install<R, OP>(&self, op: OP) -> R
    where
        OP: FnOnce() -> R + Send,
        R: Send,
    {
        self.pool.install(op)
    }

    fn chunk_size(&self, len: usize, min_chunk: usize) -> usize {
        len.div_ceil(self.threads).max(min_chunk).max(1)
    }
}

/// Applies `f(offset, chunk)` to disjoint chunks of `items`.
///
/// `offset` is the index of the chunk's first element in `items`. Without a worker,
/// or with fewer than `min_chunk` items, `f` sees the whole slice at offset 0.
pub fn for_each_chunk_mut<T, F>(worker: Option<&Worker>, items: &mut [T], min_chunk: usize, f: F)
where
    T: Send,
    F: Fn(usize, &mut [T]) + Send + Sync,
{
    if items.is_empty() {
        return;
    }

    match worker {
        Some(worker) if worker.threads > 1 && items.len() > min_chunk => {
            let chunk = worker.chunk_size(items.len(), min_chunk);
            worker.install(|| {
                items
                    .par_chunks_mut(chunk)
                    .enumerate()
                    .for_each(|(index, slice)| f(index * chunk, slice));
            });
        }
        _ => f(0, items),
    }
}

/// Splits `[first, first + count)` into ranges, evaluates `f(range_first, range_count)`
/// for each and returns the results in range order.
pub fn map_ranges<T, F>(worker: Option<&Worker>, first: usize, count: usize, min_chunk: usize, f: F) -> Vec<T>
where
    T: Send,
    F: Fn(usize, usize) -> T + Send + Sync,
{
    if count == 0 {
        return Vec::new();
    }

    match worker {
        Some(worker) if worker.threads > 1 && count > min_chunk => {
            let chunk = worker.chunk_size(count, min_chunk);
            let ranges: Vec<(usize, usize)> = (0..count)
                .step_by(chunk)
                .map(|start| (first + start, chunk.min(count - start)))
                .collect();
            worker.install(|| {
                ranges
                    .into_par_iter()
                    .map(|(range_first, range_count)| f(range_first, range_count))
                    .collect()
            })
        }
        _ => vec![f(first, count)],
    }
}
