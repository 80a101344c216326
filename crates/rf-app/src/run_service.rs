//! Run execution on one worker or a threaded cluster of workers.

use std::path::{Path, PathBuf};
use std::thread;
use std::time::Instant;

use rf_comm::{Communicator, thread_cluster};
use rf_sim::{
    Driver, NullTelemetry, RunSummary, SimulationConfig, StepProgress, StopAfter, Telemetry,
    TracingTelemetry, restart_path,
};
use tracing::{info, warn};

use crate::case::{self, Prepared};
use crate::error::{AppError, AppResult};
use crate::progress::{RunProgressEvent, RunStage, SteppingProgress};

/// Per-invocation overrides that are not part of the case file.
#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    /// Restart file root; each rank reads `{root}-{rank:04}.json`.
    pub restart_root: Option<PathBuf>,
    /// Replaces `case_name` for every output file.
    pub casename: Option<String>,
}

impl RunOptions {
    fn apply(&self, config: &SimulationConfig) -> SimulationConfig {
        let mut config = config.clone();
        if let Some(name) = &self.casename {
            config.case_name = name.clone();
        }
        config
    }
}

#[derive(Debug, Clone)]
pub enum WorkerOutcome {
    Stopped(StopAfter),
    Completed(RunSummary),
}

/// What one worker did.
#[derive(Debug, Clone)]
pub struct RunReport {
    pub rank: usize,
    pub case_name: String,
    pub started_at: String,
    pub restarted: bool,
    pub outcome: WorkerOutcome,
    pub wall_time_s: f64,
}

impl RunReport {
    pub fn summary(&self) -> Option<&RunSummary> {
        match &self.outcome {
            WorkerOutcome::Completed(summary) => Some(summary),
            WorkerOutcome::Stopped(_) => None,
        }
    }
}

pub fn load_config(path: &Path) -> AppResult<SimulationConfig> {
    let content = std::fs::read_to_string(path).map_err(|source| AppError::ConfigRead {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(SimulationConfig::from_yaml_str(&content)?)
}

fn emit_progress(
    progress_cb: &mut Option<&mut dyn FnMut(RunProgressEvent)>,
    stage: RunStage,
    started: Instant,
    message: Option<String>,
    stepping: Option<SteppingProgress>,
) {
    if let Some(cb) = progress_cb.as_deref_mut() {
        cb(RunProgressEvent {
            stage,
            elapsed_wall_s: started.elapsed().as_secs_f64(),
            message,
            stepping,
        });
    }
}

/// Run the case on the worker behind `comm`.
pub fn run_worker(
    config: &SimulationConfig,
    comm: &dyn Communicator,
    options: &RunOptions,
) -> AppResult<RunReport> {
    run_worker_with_progress(config, comm, options, None)
}

/// Run the case on the worker behind `comm` and stream progress events.
pub fn run_worker_with_progress(
    config: &SimulationConfig,
    comm: &dyn Communicator,
    options: &RunOptions,
    mut progress_cb: Option<&mut dyn FnMut(RunProgressEvent)>,
) -> AppResult<RunReport> {
    let started = Instant::now();
    let started_at = chrono::Utc::now().to_rfc3339();
    let rank = comm.rank();

    emit_progress(&mut progress_cb, RunStage::LoadingConfig, started, None, None);
    let config = options.apply(config);
    config.validate().map_err(rf_sim::SimError::from)?;

    let restart = options
        .restart_root
        .as_deref()
        .map(|root| restart_path(root, rank));
    let prepared = case::assemble(&config, comm, restart.as_deref(), &mut |stage| {
        emit_progress(&mut progress_cb, stage, started, None, None)
    });

    // Every rank learns whether any rank failed before the first collective
    // inside the driver.
    let any_failed = comm.all_reduce_or(prepared.is_err())?;
    let prepared = prepared?;
    if any_failed {
        warn!(rank, "aborting: case setup failed on another worker");
        return Err(AppError::PeerSetupFailed);
    }

    let report = |outcome, restarted| RunReport {
        rank,
        case_name: config.case_name.clone(),
        started_at: started_at.clone(),
        restarted,
        outcome,
        wall_time_s: started.elapsed().as_secs_f64(),
    };

    let case = match prepared {
        Prepared::Stopped(after) => {
            if comm.is_root() {
                info!(?after, "stopping after setup as requested");
            }
            emit_progress(&mut progress_cb, RunStage::Completed, started, None, None);
            return Ok(report(WorkerOutcome::Stopped(after), false));
        }
        Prepared::Ready(case) => *case,
    };
    let restarted = case.restarted;

    let mut telemetry: Box<dyn Telemetry> = if config.execution.telemetry {
        Box::new(TracingTelemetry::new())
    } else {
        Box::new(NullTelemetry)
    };
    telemetry.open(rank);

    emit_progress(
        &mut progress_cb,
        RunStage::Stepping,
        started,
        Some(format!("t0={:e} step0={}", case.start.t, case.start.step)),
        None,
    );
    let result = {
        let mut driver = Driver::new(
            &config,
            case.collaborators,
            case.checkpoints,
            comm,
            telemetry.as_mut(),
        )?;
        driver.run_with_progress(case.start, &mut |p: &StepProgress| {
            emit_progress(
                &mut progress_cb,
                RunStage::Stepping,
                started,
                None,
                Some(SteppingProgress::from(p)),
            )
        })
    };
    telemetry.close();
    let summary = result?;

    emit_progress(&mut progress_cb, RunStage::Completed, started, None, None);
    Ok(report(WorkerOutcome::Completed(summary), restarted))
}

/// Run the case on `ranks` in-process workers, one scoped thread each.
///
/// Reports come back in rank order. When any worker fails, the error of the
/// lowest failing rank is returned.
pub fn run_threads(
    config: &SimulationConfig,
    ranks: usize,
    options: &RunOptions,
) -> AppResult<Vec<RunReport>> {
    run_threads_with_progress(config, ranks, options, None)
}

/// As [`run_threads`]; progress events come from rank 0 only.
pub fn run_threads_with_progress(
    config: &SimulationConfig,
    ranks: usize,
    options: &RunOptions,
    progress_cb: Option<&mut (dyn FnMut(RunProgressEvent) + Send)>,
) -> AppResult<Vec<RunReport>> {
    if ranks == 0 {
        return Err(AppError::InvalidInput(
            "at least one worker is required".to_string(),
        ));
    }
    let comms = thread_cluster(ranks)?;
    let mut progress_cb = progress_cb;

    let results: Vec<AppResult<RunReport>> = thread::scope(|s| {
        let handles: Vec<_> = comms
            .into_iter()
            .map(|comm| {
                let cb = if comm.rank() == 0 {
                    progress_cb.take()
                } else {
                    None
                };
                s.spawn(move || {
                    let cb = cb.map(|c| c as &mut dyn FnMut(RunProgressEvent));
                    run_worker_with_progress(config, &comm, options, cb)
                })
            })
            .collect();
        handles
            .into_iter()
            .enumerate()
            .map(|(rank, h)| {
                h.join()
                    .unwrap_or_else(|_| Err(AppError::WorkerPanicked { rank }))
            })
            .collect()
    });

    results.into_iter().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rf_comm::SerialComm;
    use rf_sim::TimestepMode;

    fn tiny_config(name: &str) -> SimulationConfig {
        let mut cfg = SimulationConfig::default();
        cfg.case_name = name.to_string();
        cfg.mesh.dim = 1;
        cfg.mesh.lower = vec![0.0];
        cfg.mesh.upper = vec![1e-2];
        cfg.mesh.nelements = vec![4];
        cfg.time.t_final = 5e-9;
        cfg.time.mode = TimestepMode::ConstantDt { dt: 1e-9 };
        cfg.intervals.restart = -1;
        cfg.intervals.viz = -1;
        cfg.execution.dummy_rhs = true;
        cfg.output.restart_dir =
            std::env::temp_dir().join(format!("rf_app_rs_{name}_{}", std::process::id()));
        cfg
    }

    #[test]
    fn casename_override_renames_outputs() {
        let cfg = tiny_config("orig");
        let options = RunOptions {
            casename: Some("renamed".to_string()),
            ..RunOptions::default()
        };
        let report = run_worker(&cfg, &SerialComm::new(), &options).unwrap();
        assert_eq!(report.case_name, "renamed");
        let summary = report.summary().unwrap();
        assert_eq!(summary.steps_taken, 5);
        let written = summary.checkpoints[0].file_name().unwrap().to_string_lossy();
        assert_eq!(written, "renamed-0005-0000.json");
        std::fs::remove_dir_all(&cfg.output.restart_dir).unwrap();
    }

    #[test]
    fn progress_stages_arrive_in_order() {
        let mut cfg = tiny_config("stages");
        cfg.execution.timestepping = false;
        let mut stages = Vec::new();
        run_worker_with_progress(
            &cfg,
            &SerialComm::new(),
            &RunOptions::default(),
            Some(&mut |e: RunProgressEvent| stages.push(e.stage)),
        )
        .unwrap();
        assert_eq!(
            stages,
            vec![
                RunStage::LoadingConfig,
                RunStage::BuildingMesh,
                RunStage::BuildingDiscretization,
                RunStage::Initializing,
                RunStage::Stepping,
                RunStage::Completed,
            ]
        );
    }

    #[test]
    fn zero_workers_is_invalid() {
        let cfg = tiny_config("zero");
        assert!(matches!(
            run_threads(&cfg, 0, &RunOptions::default()),
            Err(AppError::InvalidInput(_))
        ));
    }
}
