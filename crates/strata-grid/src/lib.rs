//! Dense labeled voxel grids, label census, and binary masks.
#![forbid(unsafe_code)]

pub mod census;
pub mod mask;
pub mod raw;

use thiserror::Error;

pub use census::{labels, sorted_labels};
pub use mask::mask;

/// Label tag carried by grids that were not produced by a mask operation.
pub const UNMASKED: u32 = 0;

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum GridError {
    #[error("requested index ({x}, {y}, {z}) is out of range (dims: {dims})")]
    OutOfRange {
        x: u32,
        y: u32,
        z: u32,
        dims: GridDims,
    },

    #[error("voxel buffer holds {actual} values but dims {dims} require {expected}")]
    ShapeMismatch {
        dims: GridDims,
        expected: usize,
        actual: usize,
    },
}

/// Extent of a grid along each axis.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct GridDims {
    pub x: u32,
    pub y: u32,
    pub z: u32,
}

impl GridDims {
    #[inline]
    pub const fn new(x: u32, y: u32, z: u32) -> Self {
        Self { x, y, z }
    }

    /// Number of voxels in a grid of these dimensions.
    #[inline]
    pub fn len(self) -> usize {
        self.x as usize * self.y as usize * self.z as usize
    }

    #[inline]
    pub fn is_empty(self) -> bool {
        self.len() == 0
    }

    /// Voxels in one Z-layer.
    #[inline]
    pub fn layer_len(self) -> usize {
        self.x as usize * self.y as usize
    }

    #[inline]
    pub fn contains(self, x: u32, y: u32, z: u32) -> bool {
        x < self.x && y < self.y && z < self.z
    }

    /// Linear index, x fastest, then y, then z. Caller guarantees `contains`.
    #[inline]
    pub fn index(self, x: u32, y: u32, z: u32) -> usize {
        x as usize + y as usize * self.x as usize + z as usize * self.layer_len()
    }

    /// Half the extent on every axis, rounded down.
    #[inline]
    pub fn halved(self) -> Self {
        Self::new(self.x / 2, self.y / 2, self.z / 2)
    }

    #[inline]
    pub fn is_odd_on_any_axis(self) -> bool {
        self.x % 2 == 1 || self.y % 2 == 1 || self.z % 2 == 1
    }

    #[inline]
    pub fn to_array(self) -> [u32; 3] {
        [self.x, self.y, self.z]
    }
}

impl From<[u32; 3]> for GridDims {
    fn from(value: [u32; 3]) -> Self {
        Self::new(value[0], value[1], value[2])
    }
}

impl From<GridDims> for [u32; 3] {
    fn from(value: GridDims) -> Self {
        value.to_array()
    }
}

impl std::fmt::Display for GridDims {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}x{}x{}", self.x, self.y, self.z)
    }
}

/// Dense 3D array of `u32` voxels.
///
/// `data.len() == dims.len()` holds for every constructed grid. The `label`
/// is [`UNMASKED`] for raw volumes and the masked label for derived grids.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Grid {
    dims: GridDims,
    data: Vec<u32>,
    label: u32,
}

impl Grid {
    /// Allocates a grid with every voxel explicitly set to `0`.
    ///
    /// Derived grids (masks, downsampled levels) only ever write `1`s, so
    /// they rely on this fill.
    pub fn zeroed(dims: GridDims, label: u32) -> Self {
        Self {
            dims,
            data: vec![0; dims.len()],
            label,
        }
    }

    pub fn from_data(dims: GridDims, data: Vec<u32>, label: u32) -> Result<Self, GridError> {
        let expected = dims.len();
        if data.len() != expected {
            return Err(GridError::ShapeMismatch {
                dims,
                expected,
                actual: data.len(),
            });
        }
        Ok(Self { dims, data, label })
    }

    #[inline]
    pub fn dims(&self) -> GridDims {
        self.dims
    }

    #[inline]
    pub fn label(&self) -> u32 {
        self.label
    }

    #[inline]
    pub fn data(&self) -> &[u32] {
        &self.data
    }

    /// Mutable access to the whole buffer, for builders that own a fresh grid.
    #[inline]
    pub fn data_mut(&mut self) -> &mut [u32] {
        &mut self.data
    }

    #[inline]
    fn checked_index(&self, x: u32, y: u32, z: u32) -> Result<usize, GridError> {
        if !self.dims.contains(x, y, z) {
            return Err(GridError::OutOfRange {
                x,
                y,
                z,
                dims: self.dims,
            });
        }
        Ok(self.dims.index(x, y, z))
    }

    pub fn val(&self, x: u32, y: u32, z: u32) -> Result<u32, GridError> {
        let i = self.checked_index(x, y, z)?;
        Ok(self.data[i])
    }

    pub fn set_val(&mut self, x: u32, y: u32, z: u32, value: u32) -> Result<(), GridError> {
        let i = self.checked_index(x, y, z)?;
        self.data[i] = value;
        Ok(())
    }

    /// Number of non-zero voxels.
    pub fn count_set(&self) -> usize {
        self.data.iter().filter(|&&v| v != 0).count()
    }
}
