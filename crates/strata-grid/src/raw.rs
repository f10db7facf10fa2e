//! Headerless float dump of a grid.
//!
//! Each voxel is cast to `f32` and written little-endian in storage order, so a
//! dump is exactly `4 * dims.len()` bytes. Readers must know the dims out of band.

use std::fs::File;
use std::io::{self, BufReader, BufWriter, Read, Write};
use std::path::Path;

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};

use crate::{Grid, GridDims};

pub const BYTES_PER_VOXEL: usize = std::mem::size_of::<f32>();

impl Grid {
    pub fn write_raw_f32<W: Write>(&self, mut w: W) -> io::Result<()> {
        for &v in self.data() {
            w.write_f32::<LittleEndian>(v as f32)?;
        }
        w.flush()
    }

    pub fn save_raw_f32(&self, path: impl AsRef<Path>) -> io::Result<()> {
        let file = File::create(path)?;
        self.write_raw_f32(BufWriter::new(file))
    }
}

/// Reads back a dump written by [`Grid::write_raw_f32`].
pub fn read_raw_f32<R: Read>(mut r: R, dims: GridDims) -> io::Result<Vec<f32>> {
    let mut out = vec![0f32; dims.len()];
    r.read_f32_into::<LittleEndian>(&mut out)?;
    Ok(out)
}

pub fn load_raw_f32(path: impl AsRef<Path>, dims: GridDims) -> io::Result<Vec<f32>> {
    let file = File::open(path)?;
    read_raw_f32(BufReader::new(file), dims)
}
