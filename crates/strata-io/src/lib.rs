//! Volume readers that hand dense label grids to the pipeline.
#![forbid(unsafe_code)]

mod dtype;
mod manifest;

use std::io;
use std::path::PathBuf;

use strata_grid::{Grid, GridDims, GridError};
use thiserror::Error;

pub use dtype::Dtype;
pub use manifest::{ChannelSpec, Manifest, ManifestReader};

#[derive(Debug, Error)]
pub enum ReadError {
    #[error("channel {channel:?} not found (available: {})", available.join(", "))]
    ChannelNotFound {
        channel: String,
        available: Vec<String>,
    },

    #[error("channel {channel:?} has element type {dtype:?}; expected an unsigned integer type")]
    UnsupportedDtype { channel: String, dtype: String },

    #[error("channel {channel:?} declares {dims} ({expected} bytes) but {path:?} holds {actual} bytes")]
    SizeMismatch {
        channel: String,
        path: PathBuf,
        dims: GridDims,
        expected: u64,
        actual: u64,
    },

    #[error("failed to read {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("invalid manifest {path:?}: {source}")]
    Manifest {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error(transparent)]
    Grid(#[from] GridError),
}

/// Source of label grids, addressed by channel name.
pub trait VolumeReader {
    fn read_channel(&self, channel: &str) -> Result<Grid, ReadError>;
}
