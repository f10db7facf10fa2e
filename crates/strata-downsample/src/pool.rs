use crossbeam_channel::unbounded;
use rayon::{ThreadPool, ThreadPoolBuildError, ThreadPoolBuilder};
use strata_grid::Grid;

use crate::downsample_into_layer;

/// Bounded set of workers draining a queue of output layers.
pub(crate) struct LayerPool {
    pool: ThreadPool,
    workers: usize,
}

impl LayerPool {
    pub(crate) fn new(workers: usize) -> Result<Self, ThreadPoolBuildError> {
        debug_assert!(workers > 0);
        let pool = ThreadPoolBuilder::new()
            .num_threads(workers)
            .thread_name(|i| format!("strata-downsample-{i}"))
            .build()?;
        Ok(Self { pool, workers })
    }

    #[inline]
    pub(crate) fn workers(&self) -> usize {
        self.workers
    }

    /// Fills `out` from `input`; returns once every layer has been written.
    pub(crate) fn run(&self, input: &Grid, out: &mut Grid) {
        let out_dims = out.dims();
        let n = out_dims.layer_len();
        if n == 0 {
            return;
        }
        let (tx, rx) = unbounded::<(u32, &mut [u32])>();
        for (z, layer) in out.data_mut().chunks_mut(n).enumerate() {
            let _ = tx.send((z as u32, layer));
        }
        // Workers exit once the queue is drained
        drop(tx);

        self.pool.scope(|s| {
            for _ in 0..self.workers {
                let rx = rx.clone();
                s.spawn(move |_| {
                    while let Ok((z, layer)) = rx.recv() {
                        downsample_into_layer(input, out_dims, z, layer);
                    }
                });
            }
        });
    }
}
