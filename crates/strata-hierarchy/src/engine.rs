//! Seam to the isosurface extraction engine.
//!
//! The engine is opaque: it receives one binary grid per level together with
//! the extraction parameters and owns persistence of whatever it produces.

use std::ffi::OsString;
use std::io;
use std::path::{Path, PathBuf};
use std::process::{Command, ExitStatus};

use strata_grid::Grid;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("failed to write {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to launch extractor {program:?}: {source}")]
    Spawn {
        program: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("extractor {program:?} exited with {status}")]
    ExitStatus { program: PathBuf, status: ExitStatus },

    #[error("{0}")]
    Rejected(String),
}

/// Everything the engine needs for one level.
#[derive(Clone, Debug)]
pub struct ExtractRequest<'a> {
    pub grid: &'a Grid,
    pub level: u32,
    /// Voxel size per axis; X and Y are unit, Z is configurable.
    pub voxel_res: [f32; 3],
    pub iso_value: f32,
    pub flip_normals: bool,
    /// Output location, encodes label and level.
    pub destination: PathBuf,
}

pub trait IsoSurfaceEngine {
    fn name(&self) -> &'static str;

    fn extract(&mut self, req: &ExtractRequest<'_>) -> Result<(), EngineError>;
}

impl<E: IsoSurfaceEngine + ?Sized> IsoSurfaceEngine for Box<E> {
    fn name(&self) -> &'static str {
        (**self).name()
    }

    fn extract(&mut self, req: &ExtractRequest<'_>) -> Result<(), EngineError> {
        (**self).extract(req)
    }
}

/// `<destination>.raw`
pub fn dump_path(destination: &Path) -> PathBuf {
    let mut s = OsString::from(destination.as_os_str());
    s.push(".raw");
    PathBuf::from(s)
}

fn write_dump(req: &ExtractRequest<'_>) -> Result<PathBuf, EngineError> {
    let path = dump_path(&req.destination);
    req.grid
        .save_raw_f32(&path)
        .map_err(|source| EngineError::Io {
            path: path.clone(),
            source,
        })?;
    Ok(path)
}

fn log_request(engine: &str, req: &ExtractRequest<'_>) {
    let [rx, ry, rz] = req.voxel_res;
    log::debug!(
        "[{}] level {} grid {} ({} set) res {}x{}x{} iso {} flip {} -> {}",
        engine,
        req.level,
        req.grid.dims(),
        req.grid.count_set(),
        rx,
        ry,
        rz,
        req.iso_value,
        req.flip_normals,
        req.destination.display()
    );
}

/// Persists each level as a float dump for an offline extractor.
#[derive(Clone, Debug, Default)]
pub struct RawDumpEngine;

impl IsoSurfaceEngine for RawDumpEngine {
    fn name(&self) -> &'static str {
        "raw"
    }

    fn extract(&mut self, req: &ExtractRequest<'_>) -> Result<(), EngineError> {
        log_request(self.name(), req);
        let path = write_dump(req)?;
        log::info!("wrote {}", path.display());
        Ok(())
    }
}

/// Dumps the grid, then runs an external extractor on it.
///
/// Invocation: `<program> <args..> --input <dump> --dims X Y Z
/// --resolution RX RY RZ --iso V [--flip] --output <destination>`.
#[derive(Clone, Debug)]
pub struct CommandEngine {
    program: PathBuf,
    args: Vec<String>,
    keep_dump: bool,
}

impl CommandEngine {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            keep_dump: false,
        }
    }

    /// Arguments placed before the generated ones.
    pub fn with_args(mut self, args: impl IntoIterator<Item = String>) -> Self {
        self.args.extend(args);
        self
    }

    pub fn keep_dump(mut self, keep: bool) -> Self {
        self.keep_dump = keep;
        self
    }

    fn command(&self, dump: &Path, req: &ExtractRequest<'_>) -> Command {
        let dims = req.grid.dims();
        let [rx, ry, rz] = req.voxel_res;
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args)
            .arg("--input")
            .arg(dump)
            .arg("--dims")
            .args([dims.x.to_string(), dims.y.to_string(), dims.z.to_string()])
            .arg("--resolution")
            .args([rx.to_string(), ry.to_string(), rz.to_string()])
            .arg("--iso")
            .arg(req.iso_value.to_string());
        if req.flip_normals {
            cmd.arg("--flip");
        }
        cmd.arg("--output").arg(&req.destination);
        cmd
    }
}

impl IsoSurfaceEngine for CommandEngine {
    fn name(&self) -> &'static str {
        "command"
    }

    fn extract(&mut self, req: &ExtractRequest<'_>) -> Result<(), EngineError> {
        log_request(self.name(), req);
        let dump = write_dump(req)?;
        let status = self
            .command(&dump, req)
            .status()
            .map_err(|source| EngineError::Spawn {
                program: self.program.clone(),
                source,
            });
        if !self.keep_dump {
            if let Err(e) = std::fs::remove_file(&dump) {
                log::warn!("could not remove {}: {}", dump.display(), e);
            }
        }
        let status = status?;
        if !status.success() {
            return Err(EngineError::ExitStatus {
                program: self.program.clone(),
                status,
            });
        }
        Ok(())
    }
}

/// Logs requests and counts them; produces nothing.
#[derive(Clone, Debug, Default)]
pub struct DryRunEngine {
    pub requests: usize,
}

impl IsoSurfaceEngine for DryRunEngine {
    fn name(&self) -> &'static str {
        "dry-run"
    }

    fn extract(&mut self, req: &ExtractRequest<'_>) -> Result<(), EngineError> {
        self.requests += 1;
        log::info!(
            "[dry-run] level {} grid {} -> {}",
            req.level,
            req.grid.dims(),
            req.destination.display()
        );
        Ok(())
    }
}
