//! Half-resolution reduction of binary masks, parallel across output Z-layers.
#![forbid(unsafe_code)]

mod pool;

use std::sync::OnceLock;
use std::thread;

use strata_grid::{Grid, GridDims};
use thiserror::Error;

use crate::pool::LayerPool;

#[derive(Debug, Error)]
pub enum DownsampleError {
    #[error("cannot halve a {dims} grid: every axis needs at least 2 voxels")]
    Degenerate { dims: GridDims },

    #[error("failed to build downsample worker pool: {0}")]
    PoolBuild(#[from] rayon::ThreadPoolBuildError),
}

/// How output Z-layers are scheduled onto threads.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LayerSchedule {
    /// One task per output Z-layer, joined before the grid is returned.
    PerLayer,
    /// A fixed set of workers pulling layers from a queue. `0` means one per core.
    Pool { workers: usize },
    /// `PerLayer` up to `max_layer_tasks` output layers, `Pool` beyond that.
    Auto {
        max_layer_tasks: usize,
        workers: usize,
    },
}

impl Default for LayerSchedule {
    fn default() -> Self {
        LayerSchedule::Auto {
            max_layer_tasks: 256,
            workers: 0,
        }
    }
}

fn resolve_workers(workers: usize) -> usize {
    if workers > 0 {
        return workers;
    }
    thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(8)
}

/// Rejects dims that cannot produce a non-empty next level.
///
/// Odd extents are accepted; the trailing layer on that axis is dropped by the
/// halving and a warning is logged.
pub fn check_reducible(dims: GridDims) -> Result<(), DownsampleError> {
    if dims.x < 2 || dims.y < 2 || dims.z < 2 {
        return Err(DownsampleError::Degenerate { dims });
    }
    if dims.is_odd_on_any_axis() {
        log::warn!(
            "grid {} has an odd extent; halving to {} drops the trailing layer",
            dims,
            dims.halved()
        );
    }
    Ok(())
}

// Candidate input positions are 2*(c + d) for d in -1..=1 on each axis.
#[inline]
fn any_candidate_set(data: &[u32], dims: GridDims, x: u32, y: u32, z: u32) -> bool {
    let (x, y, z) = (i64::from(x), i64::from(y), i64::from(z));
    for dz in -1..=1i64 {
        let zn = 2 * (z + dz);
        if zn < 0 || zn >= i64::from(dims.z) {
            continue;
        }
        for dy in -1..=1i64 {
            let yn = 2 * (y + dy);
            if yn < 0 || yn >= i64::from(dims.y) {
                continue;
            }
            for dx in -1..=1i64 {
                let xn = 2 * (x + dx);
                if xn < 0 || xn >= i64::from(dims.x) {
                    continue;
                }
                if data[dims.index(xn as u32, yn as u32, zn as u32)] == 1 {
                    return true;
                }
            }
        }
    }
    false
}

/// Computes output Z-layer `z` of the half-resolution grid into `layer`.
///
/// `layer` must be zero-filled and exactly `out_dims.layer_len()` long; only
/// set voxels are written.
pub fn downsample_into_layer(input: &Grid, out_dims: GridDims, z: u32, layer: &mut [u32]) {
    debug_assert_eq!(layer.len(), out_dims.layer_len());
    debug_assert!(z < out_dims.z);
    let in_dims = input.dims();
    let data = input.data();
    for y in 0..out_dims.y {
        let row = y as usize * out_dims.x as usize;
        for x in 0..out_dims.x {
            if any_candidate_set(data, in_dims, x, y, z) {
                layer[row + x as usize] = 1;
            }
        }
    }
}

fn run_per_layer(input: &Grid, out: &mut Grid) {
    let out_dims = out.dims();
    let n = out_dims.layer_len();
    if n == 0 {
        return;
    }
    rayon::scope(|s| {
        for (z, layer) in out.data_mut().chunks_mut(n).enumerate() {
            s.spawn(move |_| downsample_into_layer(input, out_dims, z as u32, layer));
        }
    });
}

/// Reduces binary masks to half resolution.
///
/// Build once and reuse across levels. A `Pool` schedule builds its workers
/// up front; `Auto` builds them on the first level that needs them. Either
/// way the threads live as long as the downsampler.
pub struct Downsampler {
    schedule: LayerSchedule,
    pool: OnceLock<Option<LayerPool>>,
}

impl Downsampler {
    pub fn new(schedule: LayerSchedule) -> Result<Self, DownsampleError> {
        let pool = match schedule {
            LayerSchedule::Pool { workers } => {
                OnceLock::from(Some(LayerPool::new(resolve_workers(workers))?))
            }
            LayerSchedule::PerLayer | LayerSchedule::Auto { .. } => OnceLock::new(),
        };
        Ok(Self { schedule, pool })
    }

    // Falls back to per-layer tasks if a lazily built pool cannot start.
    fn pool(&self, workers: usize) -> Option<&LayerPool> {
        self.pool
            .get_or_init(|| match LayerPool::new(resolve_workers(workers)) {
                Ok(pool) => Some(pool),
                Err(e) => {
                    log::warn!("downsample worker pool unavailable, using per-layer tasks: {}", e);
                    None
                }
            })
            .as_ref()
    }

    #[cfg(test)]
    fn pool_is_built(&self) -> bool {
        matches!(self.pool.get(), Some(Some(_)))
    }

    /// Half-resolution copy of `input`, tagged with the same label.
    ///
    /// Output dims are `input.dims().halved()`. Each output voxel is `1` when
    /// any in-range candidate `(2x+2dx, 2y+2dy, 2z+2dz)`, `dx,dy,dz` in
    /// `{-1,0,1}`, is `1` in `input`; all other voxels stay `0`.
    pub fn downsample(&self, input: &Grid) -> Grid {
        let out_dims = input.dims().halved();
        log::info!("Downsampling from {} to {}", input.dims(), out_dims);
        let mut out = Grid::zeroed(out_dims, input.label());

        let pool = match self.schedule {
            LayerSchedule::PerLayer => None,
            LayerSchedule::Pool { workers } => self.pool(workers),
            LayerSchedule::Auto {
                max_layer_tasks,
                workers,
            } if out_dims.z as usize > max_layer_tasks => self.pool(workers),
            LayerSchedule::Auto { .. } => None,
        };
        match pool {
            Some(pool) => {
                log::debug!(
                    "scheduling {} layers on {} pooled workers",
                    out_dims.z,
                    pool.workers()
                );
                pool.run(input, &mut out);
            }
            None => {
                log::debug!("scheduling {} layers as individual tasks", out_dims.z);
                run_per_layer(input, &mut out);
            }
        }
        out
    }
}

impl Default for Downsampler {
    fn default() -> Self {
        Self {
            schedule: LayerSchedule::PerLayer,
            pool: OnceLock::new(),
        }
    }
}

/// Convenience for one-off reductions with the per-layer schedule.
pub fn downsample(input: &Grid) -> Grid {
    Downsampler::default().downsample(input)
}
