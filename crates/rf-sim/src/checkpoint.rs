//! Checkpoint files: one JSON document per rank and step.
//!
//! Files are named `{case}-{step:04}-{rank:04}.json` inside the restart
//! directory. A run restarted from a checkpoint never overwrites the file it
//! was started from.

use std::fs;
use std::path::{Path, PathBuf};

use rf_fluids::ConservedState;
use rf_mesh::{Discretization, LocalMesh, MeshError, SameMeshConnection};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::driver::StartState;
use crate::error::{RuntimeFailure, SimError, SimResult};
use crate::state::{SimState, TemperatureSeed};

/// Per-rank restart file name for a restart root such as
/// `restart_data/flame-0100`.
pub fn restart_path(root: &Path, rank: usize) -> PathBuf {
    let mut name = root.as_os_str().to_os_string();
    name.push(format!("-{rank:04}.json"));
    PathBuf::from(name)
}

/// Contents of one checkpoint file.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RestartData {
    pub local_mesh: LocalMesh,
    pub cv: ConservedState,
    pub temperature_seed: TemperatureSeed,
    pub t: f64,
    pub step: u64,
    pub order: usize,
    pub global_nelements: usize,
    pub num_parts: usize,
    pub config_fingerprint: String,
    /// RFC 3339 wall-clock time of the write.
    pub written_at: String,
}

#[derive(Clone, Debug)]
pub struct CheckpointManager {
    dir: PathBuf,
    case_name: String,
    rank: usize,
    num_parts: usize,
    fingerprint: String,
    restart_source: Option<PathBuf>,
}

impl CheckpointManager {
    pub fn new(
        dir: impl Into<PathBuf>,
        case_name: impl Into<String>,
        rank: usize,
        num_parts: usize,
        fingerprint: impl Into<String>,
    ) -> Self {
        Self {
            dir: dir.into(),
            case_name: case_name.into(),
            rank,
            num_parts,
            fingerprint: fingerprint.into(),
            restart_source: None,
        }
    }

    /// Remember the file this rank was restarted from.
    pub fn with_restart_source(mut self, path: impl Into<PathBuf>) -> Self {
        self.restart_source = Some(path.into());
        self
    }

    pub fn path_for(&self, step: u64) -> PathBuf {
        self.dir.join(format!(
            "{}-{:04}-{:04}.json",
            self.case_name, step, self.rank
        ))
    }

    fn is_restart_source(&self, path: &Path) -> bool {
        match &self.restart_source {
            Some(src) if src == path => true,
            Some(src) => match (fs::canonicalize(src), fs::canonicalize(path)) {
                (Ok(a), Ok(b)) => a == b,
                _ => false,
            },
            None => false,
        }
    }

    /// Write this rank's checkpoint for `step`.
    ///
    /// Returns `None` without writing when the target is the restart source.
    pub fn write(
        &self,
        discr: &Discretization,
        step: u64,
        t: f64,
        state: &SimState,
    ) -> SimResult<Option<PathBuf>> {
        let path = self.path_for(step);
        if self.is_restart_source(&path) {
            if self.rank == 0 {
                info!(path = %path.display(), "checkpoint matches restart source, not overwriting");
            }
            return Ok(None);
        }

        let data = RestartData {
            local_mesh: discr.mesh().clone(),
            cv: state.integrated.clone(),
            temperature_seed: state.auxiliary.clone(),
            t,
            step,
            order: discr.order(),
            global_nelements: discr.global_nelements(),
            num_parts: self.num_parts,
            config_fingerprint: self.fingerprint.clone(),
            written_at: chrono::Utc::now().to_rfc3339(),
        };

        fs::create_dir_all(&self.dir)?;
        let json = serde_json::to_string(&data)?;
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, json)?;
        fs::rename(&tmp, &path)?;
        if self.rank == 0 {
            info!(step, t, path = %path.display(), "checkpoint written");
        }
        Ok(Some(path))
    }

    pub fn read(path: &Path) -> SimResult<RestartData> {
        let content = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }

    /// Turn restart data into the starting state on `discr`.
    ///
    /// A different worker count is fatal. A different order is handled by
    /// interpolating every field onto `discr`.
    pub fn restore(&self, data: RestartData, discr: &Discretization) -> SimResult<StartState> {
        if data.num_parts != self.num_parts {
            return Err(RuntimeFailure::PartitionMismatch {
                saved: data.num_parts,
                current: self.num_parts,
            }
            .into());
        }
        if data.local_mesh != *discr.mesh() {
            return Err(MeshError::MeshMismatch.into());
        }
        if data.config_fingerprint != self.fingerprint {
            warn!(
                rank = self.rank,
                saved = %data.config_fingerprint,
                current = %self.fingerprint,
                "restart file was written with a different configuration"
            );
        }

        let (cv, seed) = if data.order == discr.order() {
            (data.cv, data.temperature_seed.into_field())
        } else {
            if self.rank == 0 {
                info!(from = data.order, to = discr.order(), "projecting restart state");
            }
            let saved = Discretization::new(data.local_mesh.clone(), data.order)?;
            let conn = SameMeshConnection::new(&saved, discr)?;
            let project = |f: &rf_core::Field| conn.apply(f);
            let cv = ConservedState::new(
                project(&data.cv.mass)?,
                data.cv.momentum.iter().map(project).collect::<Result<_, _>>()?,
                project(&data.cv.energy)?,
                data.cv.species.iter().map(project).collect::<Result<_, _>>()?,
            )?;
            (cv, project(data.temperature_seed.field())?)
        };

        for f in cv.components().chain(std::iter::once(&seed)) {
            discr.check_field(f)?;
        }

        Ok(StartState {
            state: SimState::new(cv, seed),
            t: data.t,
            step: data.step,
        })
    }

    /// Read and restore in one go.
    pub fn load(&self, path: &Path, discr: &Discretization) -> SimResult<StartState> {
        let data = Self::read(path).map_err(|e| match e {
            SimError::Io(io) => SimError::Backend {
                message: format!("cannot read restart file {}: {io}", path.display()),
            },
            other => other,
        })?;
        self.restore(data, discr)
    }
}
