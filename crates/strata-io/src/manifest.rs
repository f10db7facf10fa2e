//! TOML volume manifest.
//!
//! ```toml
//! [[channels]]
//! name = "segmentation"
//! file = "seg.bin"
//! dims = [512, 512, 120]
//! dtype = "u16"
//! ```
//!
//! Each file is a headerless little-endian dense array, x fastest then y then z.
//! Relative paths resolve against the manifest's directory.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use strata_grid::{Grid, GridDims, UNMASKED};

use crate::{Dtype, ReadError, VolumeReader};

#[derive(Clone, Debug, Deserialize)]
pub struct ChannelSpec {
    pub name: String,
    pub file: PathBuf,
    pub dims: [u32; 3],
    #[serde(default = "default_dtype")]
    pub dtype: String,
}

fn default_dtype() -> String {
    "u32".to_string()
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct Manifest {
    #[serde(default)]
    pub channels: Vec<ChannelSpec>,
}

#[derive(Clone, Debug)]
pub struct ManifestReader {
    root: PathBuf,
    manifest: Manifest,
}

impl ManifestReader {
    pub fn open(path: impl AsRef<Path>) -> Result<Self, ReadError> {
        let path = path.as_ref();
        let s = fs::read_to_string(path).map_err(|source| ReadError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let root = path.parent().map(Path::to_path_buf).unwrap_or_default();
        Self::from_toml(path, &s, root)
    }

    /// `path` is only used in error messages.
    pub fn from_toml(
        path: impl Into<PathBuf>,
        toml_str: &str,
        root: impl Into<PathBuf>,
    ) -> Result<Self, ReadError> {
        let manifest: Manifest = toml::from_str(toml_str).map_err(|source| ReadError::Manifest {
            path: path.into(),
            source,
        })?;
        Ok(Self {
            root: root.into(),
            manifest,
        })
    }

    pub fn channel_names(&self) -> Vec<String> {
        self.manifest.channels.iter().map(|c| c.name.clone()).collect()
    }

    pub fn channel(&self, name: &str) -> Option<&ChannelSpec> {
        self.manifest.channels.iter().find(|c| c.name == name)
    }

    fn resolve(&self, file: &Path) -> PathBuf {
        self.root.join(file)
    }
}

impl VolumeReader for ManifestReader {
    fn read_channel(&self, channel: &str) -> Result<Grid, ReadError> {
        let spec = self.channel(channel).ok_or_else(|| ReadError::ChannelNotFound {
            channel: channel.to_string(),
            available: self.channel_names(),
        })?;
        let dtype = Dtype::parse(&spec.dtype).ok_or_else(|| ReadError::UnsupportedDtype {
            channel: channel.to_string(),
            dtype: spec.dtype.clone(),
        })?;
        let dims = GridDims::from(spec.dims);
        let path = self.resolve(&spec.file);
        log::info!(
            "reading channel {} ({} {}) from {}",
            channel,
            dims,
            dtype.as_str(),
            path.display()
        );

        let bytes = fs::read(&path).map_err(|source| ReadError::Io {
            path: path.clone(),
            source,
        })?;
        let expected = dims.len() as u64 * dtype.size() as u64;
        if bytes.len() as u64 != expected {
            return Err(ReadError::SizeMismatch {
                channel: channel.to_string(),
                path,
                dims,
                expected,
                actual: bytes.len() as u64,
            });
        }
        Ok(Grid::from_data(dims, dtype.decode(&bytes), UNMASKED)?)
    }
}
