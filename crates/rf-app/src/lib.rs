//! Application service layer for reactflow.
//!
//! Turns a [`SimulationConfig`](rf_sim::SimulationConfig) into a ready-to-run
//! case and executes it on one worker or on a threaded cluster of workers.
//! The CLI is a thin front end over this crate.

pub mod case;
pub mod error;
pub mod progress;
pub mod run_service;

pub use case::{
    Case, GasSetup, Prepared, assemble, build_discretization, build_gas, initial_state,
};
pub use error::{AppError, AppResult};
pub use progress::{RunProgressEvent, RunStage, SteppingProgress};
pub use run_service::{
    RunOptions, RunReport, WorkerOutcome, load_config, run_threads, run_threads_with_progress,
    run_worker, run_worker_with_progress,
};
