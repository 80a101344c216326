//! Time-advancement controller for distributed reacting-flow simulations.
//!
//! Provides:
//! - Simulation state: conserved fields plus the temperature seed
//! - Timestep/CFL controller with collective min/max reductions
//! - RHS composer (spatial operator + chemistry source) and a dummy RHS
//! - Health monitor (non-finite fields, temperature-recovery convergence)
//! - Checkpoint/restart manager keyed by case, step and rank
//! - Step-loop driver state machine with graceful abort
//! - Fixed-step RK4 and forward Euler integrators
//! - Injected telemetry and visualization sinks

pub mod checkpoint;
pub mod config;
pub mod driver;
pub mod error;
pub mod health;
pub mod integrator;
pub mod model;
pub mod profiling;
pub mod rhs;
pub mod state;
pub mod status;
pub mod telemetry;
pub mod timestep;
pub mod viz;

// Re-exports for public API
pub use checkpoint::{CheckpointManager, RestartData, restart_path};
pub use config::{
    ExecutionConfig, GasKind, InitialConfig, IntervalConfig, MeshConfig, OutputConfig,
    PhysicsConfig, SimulationConfig, StopAfter, TimeConfig, TimestepMode, TransportConfig,
    check_step,
};
pub use driver::{Collaborators, Driver, DriverPhase, RunSummary, StartState, StepProgress};
pub use error::{ConfigError, RuntimeFailure, SimError, SimResult};
pub use health::{HEALTH_RESIDUAL_TOLERANCE, HealthMonitor, HealthReport};
pub use integrator::{ForwardEuler, Integrator, IntegratorType, RK4};
pub use model::TransientModel;
pub use profiling::{Phase, PhaseTimers};
pub use rhs::{
    ChemistrySource, DummyRhs, InertChemistry, ReactingChemistry, RhsComposer, RhsEvaluation,
    RhsFunction, SeededRhs,
};
pub use state::{SimState, StepContext, TemperatureSeed};
pub use status::StatusReporter;
pub use telemetry::{NullTelemetry, Telemetry, TracingTelemetry};
pub use timestep::{TimestepController, TimestepEstimate, clamp_to_final};
pub use viz::{JsonVizWriter, VizField, VizSnapshot, VizWriter};
