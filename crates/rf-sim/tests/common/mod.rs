//! Shared setup for the scenario tests.

#![allow(dead_code)]

use std::path::PathBuf;
use std::sync::Arc;

use rf_comm::Communicator;
use rf_core::{k, pa};
use rf_fluids::{GasModel, Initializer, Mechanism, MixtureGas, MixtureInitializer};
use rf_mesh::{Discretization, generate_box_mesh, partition};
use rf_ops::{InviscidOperator, SpatialOperator};
use rf_sim::{
    CheckpointManager, Collaborators, Driver, DummyRhs, NullTelemetry, RhsComposer, RhsFunction,
    RunSummary, SimResult, SimState, SimulationConfig, StartState, TimestepMode,
};

/// 1D periodic premixed hydrogen-air box, 20 steps of 1 ns.
pub fn reacting_config(name: &str) -> SimulationConfig {
    let mut cfg = SimulationConfig::default();
    cfg.case_name = name.to_string();
    cfg.mesh.dim = 1;
    cfg.mesh.lower = vec![0.0];
    cfg.mesh.upper = vec![1e-2];
    cfg.mesh.nelements = vec![4];
    cfg.time.t_final = 2e-8;
    cfg.time.mode = TimestepMode::ConstantDt { dt: 1e-9 };
    cfg.intervals.health = 5;
    cfg.intervals.restart = -1;
    cfg.intervals.viz = -1;
    cfg.physics.initial.temperature = 1500.0;
    cfg.output.restart_dir = scratch_dir(name);
    cfg.output.viz_dir = scratch_dir(name).join("viz");
    cfg
}

pub fn scratch_dir(name: &str) -> PathBuf {
    std::env::temp_dir().join(format!("rf_sim_it_{name}_{}", std::process::id()))
}

pub fn discretization(cfg: &SimulationConfig, comm: &dyn Communicator) -> Discretization {
    let mesh = generate_box_mesh(
        cfg.mesh.dim,
        &cfg.mesh.lower,
        &cfg.mesh.upper,
        &cfg.mesh.nelements,
    )
    .unwrap();
    Discretization::new(
        partition(&mesh, comm.size(), comm.rank()).unwrap(),
        cfg.mesh.order,
    )
    .unwrap()
}

pub fn setup(cfg: &SimulationConfig, comm: &dyn Communicator) -> (Collaborators, StartState) {
    let discr = discretization(cfg, comm);
    let gas = Arc::new(
        MixtureGas::hydrogen_air(cfg.is_reacting(), cfg.physics.newton_iterations).unwrap(),
    );
    let init = &cfg.physics.initial;
    let ic = MixtureInitializer::premixed(
        gas.species(),
        &Mechanism::hydrogen_air(),
        3,
        init.equivalence_ratio,
        0.21,
        pa(init.pressure),
        k(init.temperature),
        cfg.initial_velocity(),
    )
    .unwrap()
    .initialize(discr.n_nodes(), discr.dim(), gas.as_ref())
    .unwrap();

    let model = GasModel::inviscid(gas);
    let operator: Arc<dyn SpatialOperator> =
        Arc::new(InviscidOperator::new(discr, cfg.physics.boundary));
    let rhs: Box<dyn RhsFunction> = if cfg.execution.dummy_rhs {
        Box::new(DummyRhs)
    } else {
        Box::new(RhsComposer::for_gas(model.clone(), operator.clone()))
    };
    let collab = Collaborators {
        gas: model,
        operator,
        rhs,
        viz: None,
    };
    let start = StartState {
        state: SimState::new(ic.cv, ic.temperature),
        t: 0.0,
        step: 0,
    };
    (collab, start)
}

pub fn manager(cfg: &SimulationConfig, comm: &dyn Communicator) -> CheckpointManager {
    CheckpointManager::new(
        &cfg.output.restart_dir,
        &cfg.case_name,
        comm.rank(),
        comm.size(),
        cfg.fingerprint().unwrap(),
    )
}

/// Fresh run from the initial condition.
pub fn run(cfg: &SimulationConfig, comm: &dyn Communicator) -> SimResult<RunSummary> {
    let (collab, start) = setup(cfg, comm);
    let mut telemetry = NullTelemetry;
    Driver::new(cfg, collab, manager(cfg, comm), comm, &mut telemetry)?.run(start)
}

/// Run restarted from `path`.
pub fn run_from(
    cfg: &SimulationConfig,
    comm: &dyn Communicator,
    path: &std::path::Path,
) -> SimResult<RunSummary> {
    let (collab, _) = setup(cfg, comm);
    let discr = collab.operator.discretization().clone();
    let checkpoints = manager(cfg, comm).with_restart_source(path);
    let start = checkpoints.load(path, &discr)?;
    let mut telemetry = NullTelemetry;
    Driver::new(cfg, collab, checkpoints, comm, &mut telemetry)?.run(start)
}

/// Largest node difference, relative to the magnitude of each component.
pub fn max_rel_diff(a: &SimState, b: &SimState) -> f64 {
    a.integrated
        .components()
        .zip(b.integrated.components())
        .map(|(x, y)| {
            let scale = x.iter().map(|v| v.abs()).fold(f64::MIN_POSITIVE, f64::max);
            x.iter()
                .zip(y.iter())
                .map(|(p, q)| (p - q).abs() / scale)
                .fold(0.0, f64::max)
        })
        .fold(0.0, f64::max)
}
