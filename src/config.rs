use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;
use strata_downsample::LayerSchedule;

#[derive(Clone, Debug, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub pipeline: Pipeline,
    #[serde(default)]
    pub downsample: Downsample,
    #[serde(default)]
    pub engine: Engine,
}

#[derive(Clone, Debug, Deserialize)]
pub struct Pipeline {
    #[serde(default)]
    pub scaling_levels: u32,
    #[serde(default = "default_z_voxel_res")]
    pub z_voxel_res: f32,
    #[serde(default = "default_iso_value")]
    pub iso_value: f32,
    #[serde(default = "default_true")]
    pub flip_normals: bool,
    #[serde(default)]
    pub exclude_labels: Vec<u32>,
}
fn default_z_voxel_res() -> f32 {
    1.0
}
fn default_iso_value() -> f32 {
    0.5
}
fn default_true() -> bool {
    true
}
impl Default for Pipeline {
    fn default() -> Self {
        Self {
            scaling_levels: 0,
            z_voxel_res: default_z_voxel_res(),
            iso_value: default_iso_value(),
            flip_normals: true,
            exclude_labels: Vec::new(),
        }
    }
}

#[derive(Clone, Copy, Debug, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum ScheduleKind {
    #[default]
    Auto,
    PerLayer,
    Pool,
}

#[derive(Clone, Debug, Deserialize)]
pub struct Downsample {
    #[serde(default)]
    pub schedule: ScheduleKind,
    /// 0 picks the available parallelism.
    #[serde(default)]
    pub workers: usize,
    #[serde(default = "default_max_layer_tasks")]
    pub max_layer_tasks: usize,
}
fn default_max_layer_tasks() -> usize {
    256
}
impl Default for Downsample {
    fn default() -> Self {
        Self {
            schedule: ScheduleKind::Auto,
            workers: 0,
            max_layer_tasks: default_max_layer_tasks(),
        }
    }
}

impl Downsample {
    pub fn layer_schedule(&self) -> LayerSchedule {
        match self.schedule {
            ScheduleKind::PerLayer => LayerSchedule::PerLayer,
            ScheduleKind::Pool => LayerSchedule::Pool {
                workers: self.workers,
            },
            ScheduleKind::Auto => LayerSchedule::Auto {
                max_layer_tasks: self.max_layer_tasks,
                workers: self.workers,
            },
        }
    }
}

#[derive(Clone, Copy, Debug, Default, Deserialize, PartialEq, Eq, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum EngineKind {
    #[default]
    Raw,
    Command,
    DryRun,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct Engine {
    #[serde(default)]
    pub kind: EngineKind,
    /// Extractor executable for `kind = "command"`.
    #[serde(default)]
    pub program: Option<PathBuf>,
    /// Leading arguments passed to `program`.
    #[serde(default)]
    pub args: Vec<String>,
    #[serde(default)]
    pub keep_dump: bool,
}

impl Config {
    pub fn from_path(path: &Path) -> Result<Self> {
        let s = fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        Self::from_toml(&s).with_context(|| format!("parsing config {}", path.display()))
    }

    pub fn from_toml(s: &str) -> Result<Self> {
        Ok(toml::from_str(s)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_gives_defaults() {
        let cfg = Config::from_toml("").unwrap();
        assert_eq!(cfg.pipeline.scaling_levels, 0);
        assert_eq!(cfg.pipeline.z_voxel_res, 1.0);
        assert_eq!(cfg.pipeline.iso_value, 0.5);
        assert!(cfg.pipeline.flip_normals);
        assert!(cfg.pipeline.exclude_labels.is_empty());
        assert_eq!(cfg.downsample.schedule, ScheduleKind::Auto);
        assert_eq!(
            cfg.downsample.layer_schedule(),
            LayerSchedule::Auto {
                max_layer_tasks: 256,
                workers: 0
            }
        );
        assert_eq!(cfg.engine.kind, EngineKind::Raw);
        assert!(cfg.engine.program.is_none());
    }

    #[test]
    fn partial_sections_keep_other_defaults() {
        let cfg = Config::from_toml(
            r#"
            [pipeline]
            scaling_levels = 3
            exclude_labels = [0]

            [downsample]
            schedule = "pool"
            workers = 6

            [engine]
            kind = "command"
            program = "/usr/local/bin/mc"
            args = ["--smooth"]
            "#,
        )
        .unwrap();
        assert_eq!(cfg.pipeline.scaling_levels, 3);
        assert_eq!(cfg.pipeline.iso_value, 0.5);
        assert_eq!(cfg.pipeline.exclude_labels, vec![0]);
        assert_eq!(cfg.downsample.layer_schedule(), LayerSchedule::Pool { workers: 6 });
        assert_eq!(cfg.engine.kind, EngineKind::Command);
        assert_eq!(cfg.engine.program, Some(PathBuf::from("/usr/local/bin/mc")));
        assert_eq!(cfg.engine.args, vec!["--smooth".to_string()]);
    }

    #[test]
    fn kebab_case_names() {
        let cfg = Config::from_toml(
            "[downsample]\nschedule = \"per-layer\"\n[engine]\nkind = \"dry-run\"\n",
        )
        .unwrap();
        assert_eq!(cfg.downsample.layer_schedule(), LayerSchedule::PerLayer);
        assert_eq!(cfg.engine.kind, EngineKind::DryRun);
    }

    #[test]
    fn unknown_schedule_is_rejected() {
        assert!(Config::from_toml("[downsample]\nschedule = \"greedy\"\n").is_err());
    }
}
