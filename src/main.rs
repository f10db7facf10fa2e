use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use clap::Parser;
use log::{info, warn};

use strata_downsample::Downsampler;
use strata_grid::{Grid, sorted_labels};
use strata_hierarchy::{
    CommandEngine, DryRunEngine, Hierarchy, HierarchyConfig, IsoSurfaceEngine, RawDumpEngine,
    RunReport, ensure_output_dir,
};
use strata_io::{ManifestReader, VolumeReader};

mod config;

use config::{Config, EngineKind};

/// Build multi-resolution label meshes from a segmented volume.
#[derive(Parser, Debug)]
#[command(name = "strata", version)]
struct Args {
    /// Volume manifest (TOML) describing the channels
    #[arg(long)]
    filename: PathBuf,

    /// Channel holding the label volume
    #[arg(long)]
    channel: String,

    /// Directory receiving one output per label and level
    #[arg(long)]
    output: PathBuf,

    /// Process only this label; every label found when absent
    #[arg(long)]
    label: Option<u32>,

    /// Number of halved levels below the base mask
    #[arg(long)]
    scaling_levels: Option<u32>,

    /// Voxel size along Z relative to X and Y
    #[arg(long)]
    z_voxel_res: Option<f32>,

    #[arg(long, value_enum)]
    engine: Option<EngineKind>,

    /// Downsample worker threads (0 = available parallelism)
    #[arg(long)]
    workers: Option<usize>,

    /// Optional TOML file with pipeline defaults
    #[arg(long)]
    config: Option<PathBuf>,
}

impl Args {
    // flags win over the file
    fn apply(&self, cfg: &mut Config) {
        if let Some(n) = self.scaling_levels {
            cfg.pipeline.scaling_levels = n;
        }
        if let Some(z) = self.z_voxel_res {
            cfg.pipeline.z_voxel_res = z;
        }
        if let Some(kind) = self.engine {
            cfg.engine.kind = kind;
        }
        if let Some(w) = self.workers {
            cfg.downsample.workers = w;
        }
    }
}

fn build_engine(cfg: &config::Engine) -> Result<Box<dyn IsoSurfaceEngine>> {
    let engine: Box<dyn IsoSurfaceEngine> = match cfg.kind {
        EngineKind::Raw => Box::new(RawDumpEngine),
        EngineKind::DryRun => Box::new(DryRunEngine::default()),
        EngineKind::Command => {
            let Some(program) = cfg.program.as_ref().filter(|p| !p.as_os_str().is_empty())
            else {
                bail!("engine kind \"command\" needs [engine].program in the config file");
            };
            Box::new(
                CommandEngine::new(program)
                    .with_args(cfg.args.iter().cloned())
                    .keep_dump(cfg.keep_dump),
            )
        }
    };
    Ok(engine)
}

fn select_labels(grid: &Grid, requested: Option<u32>, exclude: &[u32]) -> Vec<u32> {
    match requested {
        Some(label) => vec![label],
        None => sorted_labels(grid)
            .into_iter()
            .filter(|l| !exclude.contains(l))
            .collect(),
    }
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    let mut cfg = match &args.config {
        Some(path) => Config::from_path(path)?,
        None => Config::default(),
    };
    args.apply(&mut cfg);

    ensure_output_dir(&args.output)
        .with_context(|| format!("creating output directory {}", args.output.display()))?;

    let grid = ManifestReader::open(&args.filename)
        .and_then(|reader| reader.read_channel(&args.channel))
        .with_context(|| {
            format!(
                "read stage failed for channel {} in {}",
                args.channel,
                args.filename.display()
            )
        })?;
    info!("loaded {} ({} non-zero voxels)", grid.dims(), grid.count_set());

    let labels = select_labels(&grid, args.label, &cfg.pipeline.exclude_labels);
    if labels.is_empty() {
        warn!("no labels to process");
        return Ok(());
    }
    info!("processing {} label(s): {:?}", labels.len(), labels);

    let downsampler = Downsampler::new(cfg.downsample.layer_schedule())
        .context("building downsample workers")?;
    let engine = build_engine(&cfg.engine)?;
    info!("extraction engine: {}", engine.name());

    let hierarchy_cfg = HierarchyConfig {
        levels: cfg.pipeline.scaling_levels,
        z_voxel_res: cfg.pipeline.z_voxel_res,
        iso_value: cfg.pipeline.iso_value,
        flip_normals: cfg.pipeline.flip_normals,
        output_dir: args.output.clone(),
    };
    let mut hierarchy = Hierarchy::new(hierarchy_cfg, downsampler, engine);
    let report = hierarchy.process_all(&grid, labels);

    finish(&report)
}

// Failures were already logged per label by `process_all`.
fn finish(report: &RunReport) -> Result<()> {
    info!("{} label(s) completed", report.completed.len());
    if !report.is_success() {
        bail!(
            "{} of {} label(s) failed",
            report.failed.len(),
            report.failed.len() + report.completed.len()
        );
    }
    Ok(())
}
