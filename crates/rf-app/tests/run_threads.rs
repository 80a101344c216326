use std::path::PathBuf;

use rf_app::{AppError, RunOptions, WorkerOutcome, run_threads, run_worker};
use rf_comm::SerialComm;
use rf_sim::{RuntimeFailure, SimulationConfig, StopAfter, TimestepMode};

fn scratch(name: &str) -> PathBuf {
    std::env::temp_dir().join(format!("rf_app_it_{name}_{}", std::process::id()))
}

fn config(name: &str) -> SimulationConfig {
    let mut cfg = SimulationConfig::default();
    cfg.case_name = name.to_string();
    cfg.mesh.dim = 1;
    cfg.mesh.lower = vec![0.0];
    cfg.mesh.upper = vec![1e-2];
    cfg.mesh.nelements = vec![4];
    cfg.time.t_final = 1e-8;
    cfg.time.mode = TimestepMode::ConstantDt { dt: 1e-9 };
    cfg.intervals.health = 5;
    cfg.intervals.restart = 5;
    cfg.intervals.viz = 5;
    cfg.output.restart_dir = scratch(name).join("restart");
    cfg.output.viz_dir = scratch(name).join("viz");
    cfg
}

#[test]
fn threaded_run_reports_every_rank() {
    let cfg = config("threads");
    let reports = run_threads(&cfg, 2, &RunOptions::default()).unwrap();
    assert_eq!(reports.len(), 2);
    for (rank, report) in reports.iter().enumerate() {
        assert_eq!(report.rank, rank);
        let summary = report.summary().unwrap();
        assert_eq!(summary.steps_taken, 10);
        assert_eq!(summary.t, 1e-8);
        // steps 0, 5 and the final step 10
        assert_eq!(summary.checkpoints.len(), 3);
        assert!(
            cfg.output
                .viz_dir
                .join(format!("threads-000005-{rank:04}.json"))
                .exists()
        );
    }
    std::fs::remove_dir_all(scratch("threads")).unwrap();
}

#[test]
fn restart_option_resumes_from_checkpoint() {
    let cfg = config("resume");
    let first = run_worker(&cfg, &SerialComm::new(), &RunOptions::default()).unwrap();
    let full = first.summary().unwrap();

    let options = RunOptions {
        restart_root: Some(cfg.output.restart_dir.join("resume-0005")),
        ..RunOptions::default()
    };
    let resumed = run_worker(&cfg, &SerialComm::new(), &options).unwrap();
    assert!(resumed.restarted);
    let summary = resumed.summary().unwrap();
    assert_eq!(summary.steps_taken, 5);
    assert_eq!(summary.step, 10);
    assert_eq!(summary.state, full.state);
    std::fs::remove_dir_all(scratch("resume")).unwrap();
}

#[test]
fn restart_with_more_workers_fails_everywhere() {
    let cfg = config("grow");
    run_worker(&cfg, &SerialComm::new(), &RunOptions::default()).unwrap();

    let options = RunOptions {
        restart_root: Some(cfg.output.restart_dir.join("grow-0010")),
        ..RunOptions::default()
    };
    // rank 0 finds a one-worker file, rank 1 finds none; neither steps
    let err = run_threads(&cfg, 2, &options).unwrap_err();
    match err {
        AppError::Simulation(e) => assert_eq!(
            e.runtime_failure(),
            Some(&RuntimeFailure::PartitionMismatch {
                saved: 1,
                current: 2
            })
        ),
        other => panic!("expected a partition mismatch, got {other:?}"),
    }
    std::fs::remove_dir_all(scratch("grow")).unwrap();
}

#[test]
fn stop_after_discretization_on_all_ranks() {
    let mut cfg = config("stop");
    cfg.execution.stop_after = Some(StopAfter::Discretization);
    let reports = run_threads(&cfg, 2, &RunOptions::default()).unwrap();
    assert!(reports.iter().all(|r| matches!(
        r.outcome,
        WorkerOutcome::Stopped(StopAfter::Discretization)
    )));
    assert!(!scratch("stop").exists());
}
