//! Step-loop driver.
//!
//! The driver is a small state machine:
//!
//! ```text
//! Init -> Stepping -> Finalizing -> Done
//!             |            |
//!             +-> Aborting +-> Done
//! ```
//!
//! Each step recomputes the derived fluid state, runs the due diagnostics
//! (health, status, checkpoint, visualization), advances the state with the
//! configured integrator and refreshes the temperature seed.

use std::path::PathBuf;
use std::sync::Arc;

use rf_comm::Communicator;
use rf_fluids::{DerivedFluidState, GasModel};
use rf_mesh::Discretization;
use rf_ops::SpatialOperator;
use tracing::{error, info, warn};

use crate::checkpoint::CheckpointManager;
use crate::config::SimulationConfig;
use crate::error::{RuntimeFailure, SimError, SimResult};
use crate::health::HealthMonitor;
use crate::profiling::{Phase, PhaseTimers};
use crate::rhs::{RhsFunction, SeededRhs};
use crate::state::{SimState, StepContext, TemperatureSeed};
use crate::status::StatusReporter;
use crate::telemetry::Telemetry;
use crate::timestep::{TimestepController, TimestepEstimate};
use crate::viz::{VizField, VizWriter};

/// Largest accepted distance between the final time and `t_final`.
const FINAL_TIME_TOLERANCE: f64 = 1e-16;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DriverPhase {
    Init,
    Stepping,
    Aborting,
    Finalizing,
    Done,
}

/// Strategy objects the driver works with, resolved before the run.
pub struct Collaborators {
    pub gas: GasModel,
    pub operator: Arc<dyn SpatialOperator>,
    pub rhs: Box<dyn RhsFunction>,
    pub viz: Option<Box<dyn VizWriter>>,
}

/// Where the run starts: a fresh initial condition or a restart.
#[derive(Clone, Debug, PartialEq)]
pub struct StartState {
    pub state: SimState,
    pub t: f64,
    pub step: u64,
}

/// Reported after every completed step.
#[derive(Clone, Debug, PartialEq)]
pub struct StepProgress {
    pub step: u64,
    pub t: f64,
    pub dt: f64,
    pub cfl: f64,
    pub t_final: f64,
}

impl StepProgress {
    pub fn fraction_complete(&self) -> f64 {
        if self.t_final > 0.0 {
            (self.t / self.t_final).clamp(0.0, 1.0)
        } else {
            1.0
        }
    }
}

#[derive(Clone, Debug)]
pub struct RunSummary {
    pub state: SimState,
    pub t: f64,
    pub step: u64,
    pub steps_taken: u64,
    /// Step size of the last completed step.
    pub last_dt: f64,
    pub last_cfl: f64,
    pub checkpoints: Vec<PathBuf>,
}

pub struct Driver<'a> {
    config: SimulationConfig,
    collab: Collaborators,
    checkpoints: CheckpointManager,
    comm: &'a dyn Communicator,
    telemetry: &'a mut dyn Telemetry,
    controller: TimestepController,
    health: HealthMonitor,
    status: StatusReporter,
    timers: PhaseTimers,
    phase: DriverPhase,
    aborted: bool,
}

fn write_viz(
    viz: &mut Option<Box<dyn VizWriter>>,
    rank: usize,
    step: u64,
    t: f64,
    fields: &[VizField],
) {
    if let Some(writer) = viz
        && let Err(e) = writer.write(step, t, fields)
    {
        warn!(rank, step, error = %e, "visualization output failed");
    }
}

impl<'a> Driver<'a> {
    pub fn new(
        config: &SimulationConfig,
        collab: Collaborators,
        checkpoints: CheckpointManager,
        comm: &'a dyn Communicator,
        telemetry: &'a mut dyn Telemetry,
    ) -> SimResult<Self> {
        config.validate()?;
        let health = HealthMonitor::new(collab.gas.eos.clone(), config.is_reacting());
        Ok(Self {
            controller: TimestepController::new(config.time.mode, config.time.t_final),
            status: StatusReporter::new(config.time.mode, config.execution.status_fields),
            timers: PhaseTimers::new(config.execution.profiling),
            config: config.clone(),
            collab,
            checkpoints,
            comm,
            telemetry,
            health,
            phase: DriverPhase::Init,
            aborted: false,
        })
    }

    pub fn phase(&self) -> DriverPhase {
        self.phase
    }

    /// True if the last run ended through `Aborting`.
    pub fn aborted(&self) -> bool {
        self.aborted
    }

    pub fn timers(&self) -> &PhaseTimers {
        &self.timers
    }

    fn discretization(&self) -> &Discretization {
        self.collab.operator.discretization()
    }

    pub fn run(&mut self, start: StartState) -> SimResult<RunSummary> {
        self.run_with_progress(start, &mut |_: &StepProgress| {})
    }

    /// Run to `t_final`, calling `progress` after every completed step.
    ///
    /// A runtime failure moves the driver through `Aborting` to `Done`;
    /// any other error goes straight to `Done`. Either way the error is
    /// returned unchanged and nothing is written on the way out.
    pub fn run_with_progress(
        &mut self,
        start: StartState,
        progress: &mut dyn FnMut(&StepProgress),
    ) -> SimResult<RunSummary> {
        self.phase = DriverPhase::Init;
        self.aborted = false;
        let rank = self.comm.rank();
        let result = self.advance(start, progress);
        match &result {
            Ok(_) => {}
            Err(e) if e.is_runtime_failure() => {
                self.phase = DriverPhase::Aborting;
                self.aborted = true;
                error!(rank, error = %e, "runtime failure");
                if self.comm.is_root() {
                    error!("Errors detected; attempting graceful exit.");
                }
                self.phase = DriverPhase::Done;
            }
            Err(e) => {
                error!(rank, error = %e, "run failed");
                self.phase = DriverPhase::Done;
            }
        }
        result
    }

    fn fluid_state(&self, state: &SimState) -> SimResult<DerivedFluidState> {
        Ok(self
            .collab
            .gas
            .make_fluid_state(&state.integrated, state.seed())?)
    }

    fn advance(
        &mut self,
        start: StartState,
        progress: &mut dyn FnMut(&StepProgress),
    ) -> SimResult<RunSummary> {
        let StartState {
            mut state,
            mut t,
            mut step,
        } = start;
        let t_final = self.config.time.t_final;
        let lazy = self.config.execution.lazy && !self.config.time.mode.is_constant_cfl();

        let fluid = self.fluid_state(&state)?;
        let initial_dt = self.controller.initial_timestep(
            self.collab.operator.as_ref(),
            &state.integrated,
            &fluid,
            t,
            self.comm,
        )?;
        if self.comm.is_root() {
            info!(
                case = %self.config.case_name,
                ranks = self.comm.size(),
                step,
                t,
                t_final,
                initial_dt,
                rhs = self.collab.rhs.name(),
                integrator = ?self.config.time.integrator,
                "starting run"
            );
        }

        let mut summary = RunSummary {
            state: state.clone(),
            t,
            step,
            steps_taken: 0,
            last_dt: 0.0,
            last_cfl: 0.0,
            checkpoints: Vec::new(),
        };
        if !self.config.execution.timestepping {
            if self.comm.is_root() {
                info!("timestepping disabled, stopping after initialization");
            }
            self.phase = DriverPhase::Done;
            return Ok(summary);
        }

        self.phase = DriverPhase::Stepping;
        while t < t_final {
            let mut ctx = StepContext::for_step(step, t, &self.config.intervals);
            self.telemetry.set_time(step, t);
            self.telemetry.tick_before(step);

            let fluid = if lazy && !ctx.needs_diagnostics() {
                None
            } else {
                Some(self.timers.time(Phase::Timestep, || self.fluid_state(&state))?)
            };

            if ctx.do_health
                && let Some(fluid) = &fluid
            {
                self.timers.time(Phase::Health, || {
                    self.health
                        .enforce(&state.integrated, fluid, step, t, self.comm)
                })?;
            }

            let est = self.timers.time(Phase::Timestep, || match &fluid {
                Some(fluid) => self.controller.compute_step(
                    self.collab.operator.as_ref(),
                    &state.integrated,
                    fluid,
                    t,
                    self.comm,
                ),
                None => self.controller.fixed_step(t).ok_or(SimError::InvalidArg {
                    what: "state-dependent timestep needs the fluid state",
                }),
            })?;
            if !(est.dt > 0.0 && est.dt.is_finite()) {
                return Err(RuntimeFailure::HealthCheck {
                    step,
                    t,
                    detail: format!("invalid timestep {:e}", est.dt),
                }
                .into());
            }
            ctx.dt = est.dt;
            ctx.cfl = est.cfl;

            self.diagnostics(&ctx, &state, fluid.as_ref(), &est, &mut summary)?;

            let integrator = self.config.time.integrator;
            let (next, recovered) = self.timers.time(Phase::Rhs, || {
                let mut model = SeededRhs::new(self.collab.rhs.as_ref(), self.comm);
                let next = integrator.step(&mut model, t, &state, est.dt)?;
                Ok::<_, SimError>((next, model.take_last_temperature()))
            })?;
            state = next;
            if let Some(temperature) = recovered {
                state.auxiliary = TemperatureSeed(temperature);
            }

            t = if est.lands_on_final { t_final } else { t + est.dt };
            step += 1;
            summary.steps_taken += 1;
            summary.last_dt = est.dt;
            summary.last_cfl = est.cfl;
            self.telemetry.tick_after(est.dt);
            progress(&StepProgress {
                step,
                t,
                dt: est.dt,
                cfl: est.cfl,
                t_final,
            });
        }

        self.phase = DriverPhase::Finalizing;
        self.finalize(&state, t, step, &mut summary)?;

        summary.state = state;
        summary.t = t;
        summary.step = step;
        self.phase = DriverPhase::Done;
        Ok(summary)
    }

    /// Status, checkpoint and visualization for one step.
    fn diagnostics(
        &mut self,
        ctx: &StepContext,
        state: &SimState,
        fluid: Option<&DerivedFluidState>,
        est: &TimestepEstimate,
        summary: &mut RunSummary,
    ) -> SimResult<()> {
        let rank = self.comm.rank();
        if ctx.do_status {
            self.status
                .report(ctx.step, ctx.t, ctx.dt, ctx.cfl, fluid, self.comm)?;
        }
        if ctx.do_restart {
            let discr = self.collab.operator.discretization();
            let written = self.timers.time(Phase::Checkpoint, || {
                self.checkpoints.write(discr, ctx.step, ctx.t, state)
            })?;
            summary.checkpoints.extend(written);
        }
        if ctx.do_viz
            && let Some(fluid) = fluid
        {
            let name = est.field_name(&self.config.time.mode);
            let fields = VizField::collect(&state.integrated, fluid, Some((name, &est.field)));
            let viz = &mut self.collab.viz;
            self.timers.time(Phase::Viz, || {
                write_viz(viz, rank, ctx.step, ctx.t, &fields)
            });
        }
        Ok(())
    }

    fn finalize(
        &mut self,
        state: &SimState,
        t: f64,
        step: u64,
        summary: &mut RunSummary,
    ) -> SimResult<()> {
        let t_final = self.config.time.t_final;
        let mut ctx = StepContext::final_step(step, t);
        let fluid = self.fluid_state(state)?;

        self.timers.time(Phase::Health, || {
            self.health
                .enforce(&state.integrated, &fluid, step, t, self.comm)
        })?;
        let est = self.controller.compute_step(
            self.collab.operator.as_ref(),
            &state.integrated,
            &fluid,
            t,
            self.comm,
        )?;
        ctx.dt = est.dt;
        ctx.cfl = est.cfl;
        self.diagnostics(&ctx, state, Some(&fluid), &est, summary)?;

        if (t - t_final).abs() >= FINAL_TIME_TOLERANCE {
            return Err(RuntimeFailure::FinalTime { t, t_final }.into());
        }
        self.timers.report(self.comm.rank());
        if self.comm.is_root() {
            info!(step, t, steps = summary.steps_taken, "run complete");
        }
        Ok(())
    }
}

impl std::fmt::Debug for Driver<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Driver")
            .field("case", &self.config.case_name)
            .field("rank", &self.comm.rank())
            .field("phase", &self.phase)
            .field("discretization_order", &self.discretization().order())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TimestepMode;
    use crate::rhs::DummyRhs;
    use crate::telemetry::{NullTelemetry, TracingTelemetry};
    use rf_comm::SerialComm;
    use rf_core::Field;
    use rf_fluids::{ConservedState, IdealSingleGas, Thermochemistry};
    use rf_mesh::{generate_box_mesh, partition};
    use rf_ops::{Boundaries, InviscidOperator};

    fn collaborators() -> (Collaborators, StartState) {
        let mesh = generate_box_mesh(1, &[0.0], &[1.0], &[4]).unwrap();
        let discr = Discretization::new(partition(&mesh, 1, 0).unwrap(), 1).unwrap();
        let n = discr.n_nodes();
        let eos = Arc::new(IdealSingleGas::default());
        let rho = Field::filled(n, 1.2);
        let energy = rho.scale(eos.mixture_internal_energy(300.0, &[]));
        let cv = ConservedState::new(rho, vec![Field::zeros(n)], energy, vec![]).unwrap();
        let collab = Collaborators {
            gas: GasModel::inviscid(eos),
            operator: Arc::new(InviscidOperator::new(discr, Boundaries::Periodic)),
            rhs: Box::new(DummyRhs),
            viz: None,
        };
        let start = StartState {
            state: SimState::new(cv, Field::filled(n, 300.0)),
            t: 0.0,
            step: 0,
        };
        (collab, start)
    }

    fn config() -> SimulationConfig {
        let mut cfg = SimulationConfig::default();
        cfg.physics.gas = crate::config::GasKind::Single;
        cfg.intervals.restart = -1;
        cfg.intervals.viz = -1;
        cfg.time.t_final = 2e-8;
        cfg.time.mode = TimestepMode::ConstantDt { dt: 1e-9 };
        cfg
    }

    /// The final state is always checkpointed, so each test gets its own
    /// directory.
    fn checkpoints(test: &str) -> CheckpointManager {
        let dir = std::env::temp_dir().join(format!(
            "rf_sim_driver_{test}_{}",
            std::process::id()
        ));
        CheckpointManager::new(dir, "t", 0, 1, "")
    }

    #[test]
    fn dummy_run_reaches_final_time() {
        let (collab, start) = collaborators();
        let comm = SerialComm::new();
        let mut telemetry = TracingTelemetry::new();
        telemetry.open(0);
        let cfg = config();
        let mut driver = Driver::new(
            &cfg,
            collab,
            checkpoints("dummy_run"),
            &comm,
            &mut telemetry,
        )
        .unwrap();
        assert_eq!(driver.phase(), DriverPhase::Init);
        let mut seen = Vec::new();
        let summary = driver
            .run_with_progress(start.clone(), &mut |p: &StepProgress| seen.push(p.step))
            .unwrap();
        assert_eq!(driver.phase(), DriverPhase::Done);
        assert_eq!(summary.steps_taken, 20);
        assert_eq!(summary.t, 2e-8);
        assert_eq!(summary.state, start.state);
        assert_eq!(seen, (1..=20).collect::<Vec<u64>>());
        drop(driver);
        assert_eq!(telemetry.steps(), 20);
    }

    #[test]
    fn disabled_timestepping_stops_after_init() {
        let (collab, start) = collaborators();
        let comm = SerialComm::new();
        let mut telemetry = NullTelemetry;
        let mut cfg = config();
        cfg.execution.timestepping = false;
        let mut driver = Driver::new(
            &cfg,
            collab,
            checkpoints("disabled_timestepping"),
            &comm,
            &mut telemetry,
        )
        .unwrap();
        let summary = driver.run(start).unwrap();
        assert_eq!(summary.steps_taken, 0);
        assert_eq!(summary.t, 0.0);
        assert_eq!(driver.phase(), DriverPhase::Done);
    }

    #[test]
    fn nan_state_aborts_with_health_failure() {
        let (collab, mut start) = collaborators();
        start.state.integrated.energy[3] = f64::NAN;
        let comm = SerialComm::new();
        let mut telemetry = NullTelemetry;
        let mut cfg = config();
        cfg.intervals.health = 1;
        let mut driver = Driver::new(
            &cfg,
            collab,
            checkpoints("nan_state"),
            &comm,
            &mut telemetry,
        )
        .unwrap();
        let err = driver.run(start).unwrap_err();
        assert!(matches!(
            err.runtime_failure(),
            Some(RuntimeFailure::HealthCheck { step: 0, .. })
        ));
        assert_eq!(driver.phase(), DriverPhase::Done);
        assert!(driver.aborted());
    }

    #[test]
    fn nan_sound_speed_is_an_invalid_cfl_step() {
        let (collab, mut start) = collaborators();
        start.state.integrated.energy[2] = f64::NAN;
        let comm = SerialComm::new();
        let mut telemetry = NullTelemetry;
        let mut cfg = config();
        cfg.time.mode = TimestepMode::ConstantCfl { cfl: 0.5 };
        cfg.intervals.health = -1;
        let mut driver = Driver::new(
            &cfg,
            collab,
            checkpoints("nan_sound_speed"),
            &comm,
            &mut telemetry,
        )
        .unwrap();
        let err = driver.run(start).unwrap_err();
        match err.runtime_failure() {
            Some(RuntimeFailure::HealthCheck { step, detail, .. }) => {
                assert_eq!(*step, 0);
                assert!(detail.contains("invalid timestep"), "{detail}");
            }
            other => panic!("expected an invalid timestep, got {other:?}"),
        }
        assert!(driver.aborted());
    }

    #[test]
    fn io_error_skips_the_abort_path() {
        let (collab, start) = collaborators();
        let comm = SerialComm::new();
        let mut telemetry = NullTelemetry;
        let mut cfg = config();
        cfg.intervals.restart = 1;
        // a regular file where the checkpoint directory should go
        let blocker = std::env::temp_dir().join(format!(
            "rf_sim_driver_blocker_{}",
            std::process::id()
        ));
        std::fs::write(&blocker, "not a directory").unwrap();
        let manager = CheckpointManager::new(blocker.join("restart"), "t", 0, 1, "");
        let mut driver = Driver::new(&cfg, collab, manager, &comm, &mut telemetry).unwrap();
        let err = driver.run(start).unwrap_err();
        assert!(matches!(err, SimError::Io(_)), "{err:?}");
        assert!(!err.is_runtime_failure());
        assert!(!driver.aborted());
        assert_eq!(driver.phase(), DriverPhase::Done);
        std::fs::remove_file(&blocker).unwrap();
    }

    #[test]
    fn start_past_final_time_fails_final_check() {
        let (collab, mut start) = collaborators();
        start.t = 3e-8;
        let comm = SerialComm::new();
        let mut telemetry = NullTelemetry;
        let mut driver = Driver::new(
            &config(),
            collab,
            checkpoints("start_past"),
            &comm,
            &mut telemetry,
        )
        .unwrap();
        let err = driver.run(start).unwrap_err();
        assert!(matches!(
            err.runtime_failure(),
            Some(RuntimeFailure::FinalTime { .. })
        ));
    }

    #[test]
    fn lazy_run_matches_eager_run() {
        let comm = SerialComm::new();
        let mut outcomes = Vec::new();
        for lazy in [false, true] {
            let (collab, start) = collaborators();
            let mut telemetry = NullTelemetry;
            let mut cfg = config();
            cfg.execution.lazy = lazy;
            cfg.intervals.status = 5;
            cfg.intervals.health = 5;
            let mut driver = Driver::new(
                &cfg,
                collab,
                checkpoints("lazy_run"),
                &comm,
                &mut telemetry,
            )
            .unwrap();
            outcomes.push(driver.run(start).unwrap());
        }
        assert_eq!(outcomes[0].state, outcomes[1].state);
        assert_eq!(outcomes[0].steps_taken, outcomes[1].steps_taken);
        assert!(outcomes[1].last_cfl.is_nan());
    }

    #[test]
    fn profiling_counts_rhs_phases() {
        let (collab, start) = collaborators();
        let comm = SerialComm::new();
        let mut telemetry = NullTelemetry;
        let mut cfg = config();
        cfg.execution.profiling = true;
        let mut driver = Driver::new(
            &cfg,
            collab,
            checkpoints("profiling_counts"),
            &comm,
            &mut telemetry,
        )
        .unwrap();
        driver.run(start).unwrap();
        assert_eq!(driver.timers().count(Phase::Rhs), 20);
        // only the forced final checkpoint
        assert_eq!(driver.timers().count(Phase::Checkpoint), 1);
    }
}
