//! Builds per-label resolution pyramids and hands each level to an extraction engine.
#![forbid(unsafe_code)]

pub mod engine;
mod error;

use std::path::{Path, PathBuf};

use strata_downsample::{Downsampler, check_reducible};
use strata_grid::{Grid, GridDims, mask};

pub use engine::{
    CommandEngine, DryRunEngine, EngineError, ExtractRequest, IsoSurfaceEngine, RawDumpEngine,
};
pub use error::{HierarchyError, Stage, StageFailure};

#[derive(Clone, Debug)]
pub struct HierarchyConfig {
    /// Levels below the base mask; `0` emits the base only.
    pub levels: u32,
    pub z_voxel_res: f32,
    pub iso_value: f32,
    pub flip_normals: bool,
    pub output_dir: PathBuf,
}

impl Default for HierarchyConfig {
    fn default() -> Self {
        Self {
            levels: 0,
            z_voxel_res: 1.0,
            iso_value: 0.5,
            flip_normals: true,
            output_dir: PathBuf::from("."),
        }
    }
}

impl HierarchyConfig {
    #[inline]
    pub fn voxel_res(&self) -> [f32; 3] {
        [1.0, 1.0, self.z_voxel_res]
    }

    /// `<output_dir>/<label>_<level>`
    pub fn destination(&self, label: u32, level: u32) -> PathBuf {
        self.output_dir.join(format!("{label}_{level}"))
    }
}

/// Dims of every level emitted for one label, base first.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LabelReport {
    pub label: u32,
    pub levels: Vec<GridDims>,
}

#[derive(Debug, Default)]
pub struct RunReport {
    pub completed: Vec<LabelReport>,
    pub failed: Vec<HierarchyError>,
}

impl RunReport {
    #[inline]
    pub fn is_success(&self) -> bool {
        self.failed.is_empty()
    }
}

pub struct Hierarchy<E> {
    config: HierarchyConfig,
    downsampler: Downsampler,
    engine: E,
}

impl<E: IsoSurfaceEngine> Hierarchy<E> {
    pub fn new(config: HierarchyConfig, downsampler: Downsampler, engine: E) -> Self {
        Self {
            config,
            downsampler,
            engine,
        }
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    fn emit(&mut self, grid: &Grid, label: u32, level: u32) -> Result<(), HierarchyError> {
        let req = ExtractRequest {
            grid,
            level,
            voxel_res: self.config.voxel_res(),
            iso_value: self.config.iso_value,
            flip_normals: self.config.flip_normals,
            destination: self.config.destination(label, level),
        };
        self.engine
            .extract(&req)
            .map_err(|e| HierarchyError::new(Stage::Extract, label, level, e))
    }

    /// Masks `label` out of `grid`, emits it as level 0, then halves and emits
    /// `config.levels` more times. Stops at the first failure.
    pub fn process_label(&mut self, grid: &Grid, label: u32) -> Result<LabelReport, HierarchyError> {
        if grid.dims().is_empty() {
            return Err(HierarchyError::new(
                Stage::Mask,
                label,
                0,
                StageFailure::EmptyVolume { dims: grid.dims() },
            ));
        }
        log::info!("label {}: building {} level(s) below {}", label, self.config.levels, grid.dims());
        let mut current = mask(grid, label);
        let mut levels = vec![current.dims()];
        self.emit(&current, label, 0)?;

        for level in 1..=self.config.levels {
            check_reducible(current.dims())
                .map_err(|e| HierarchyError::new(Stage::Downsample, label, level, e))?;
            current = self.downsampler.downsample(&current);
            levels.push(current.dims());
            self.emit(&current, label, level)?;
        }
        log::info!("label {}: done", label);
        Ok(LabelReport { label, levels })
    }

    /// Runs [`Self::process_label`] for every label. A failed label is
    /// recorded and does not stop the others.
    pub fn process_all(&mut self, grid: &Grid, labels: impl IntoIterator<Item = u32>) -> RunReport {
        let mut report = RunReport::default();
        for label in labels {
            match self.process_label(grid, label) {
                Ok(done) => report.completed.push(done),
                Err(e) => {
                    log::warn!("{}", e);
                    report.failed.push(e);
                }
            }
        }
        report
    }
}

/// Creates `dir` and its parents if missing.
pub fn ensure_output_dir(dir: &Path) -> Result<(), EngineError> {
    std::fs::create_dir_all(dir).map_err(|source| EngineError::Io {
        path: dir.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn destination_encodes_label_and_level() {
        let cfg = HierarchyConfig {
            output_dir: PathBuf::from("meshes"),
            ..HierarchyConfig::default()
        };
        assert_eq!(cfg.destination(12, 3), PathBuf::from("meshes/12_3"));
    }

    #[test]
    fn voxel_res_only_scales_z() {
        let cfg = HierarchyConfig {
            z_voxel_res: 4.0,
            ..HierarchyConfig::default()
        };
        assert_eq!(cfg.voxel_res(), [1.0, 1.0, 4.0]);
    }

    #[test]
    fn empty_volume_fails_in_mask_stage() {
        let mut h = Hierarchy::new(
            HierarchyConfig::default(),
            Downsampler::default(),
            DryRunEngine::default(),
        );
        let g = Grid::zeroed(GridDims::new(0, 4, 4), 0);
        let err = h.process_label(&g, 1).unwrap_err();
        assert_eq!(err.stage, Stage::Mask);
        assert_eq!(h.engine().requests, 0);
    }

    #[test]
    fn ensure_output_dir_creates_nested_dirs() {
        let root = std::env::temp_dir().join(format!("strata-outdir-{}", std::process::id()));
        let _ = std::fs::remove_dir_all(&root);
        let nested = root.join("meshes").join("run-1");
        ensure_output_dir(&nested).unwrap();
        assert!(nested.is_dir());
        // already present is fine
        ensure_output_dir(&nested).unwrap();
        let _ = std::fs::remove_dir_all(&root);
    }

    #[test]
    fn ensure_output_dir_reports_blocking_file() {
        let root = std::env::temp_dir().join(format!("strata-outfile-{}", std::process::id()));
        let _ = std::fs::remove_dir_all(&root);
        std::fs::create_dir_all(&root).unwrap();
        let file = root.join("taken");
        std::fs::write(&file, b"x").unwrap();
        let err = ensure_output_dir(&file.join("sub")).unwrap_err();
        assert!(matches!(err, EngineError::Io { .. }));
        let _ = std::fs::remove_dir_all(&root);
    }
}
