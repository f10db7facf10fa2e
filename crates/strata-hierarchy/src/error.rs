use std::fmt;

use strata_downsample::DownsampleError;
use strata_grid::GridDims;
use thiserror::Error;

use crate::engine::EngineError;

/// Pipeline step that was active when a label failed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Stage {
    Mask,
    Downsample,
    Extract,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Stage::Mask => "mask",
            Stage::Downsample => "downsample",
            Stage::Extract => "extract",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Error)]
pub enum StageFailure {
    #[error("volume {dims} holds no voxels")]
    EmptyVolume { dims: GridDims },

    #[error(transparent)]
    Downsample(#[from] DownsampleError),

    #[error(transparent)]
    Engine(#[from] EngineError),
}

/// Failure of one label's pyramid, with the stage and level that were active.
#[derive(Debug, Error)]
#[error("{stage} stage failed for label {label} at level {level}: {source}")]
pub struct HierarchyError {
    pub stage: Stage,
    pub label: u32,
    pub level: u32,
    #[source]
    pub source: StageFailure,
}

impl HierarchyError {
    pub(crate) fn new(stage: Stage, label: u32, level: u32, source: impl Into<StageFailure>) -> Self {
        Self {
            stage,
            label,
            level,
            source: source.into(),
        }
    }
}
