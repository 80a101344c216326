//! Case assembly: configuration in, driver inputs out.
//!
//! Everything here is rank-local; no collective is issued until the driver
//! starts, so a worker that fails to assemble cannot strand its peers in a
//! reduction.

use std::path::Path;
use std::sync::Arc;

use rf_comm::Communicator;
use rf_core::{k, pa};
use rf_fluids::{
    GasModel, IdealSingleGas, Initializer, Mechanism, MixtureGas, MixtureInitializer,
    SimpleTransport, Thermochemistry, Uniform,
};
use rf_mesh::{Discretization, LocalMesh, generate_box_mesh, partition};
use rf_ops::{InviscidOperator, SpatialOperator, ViscousOperator};
use rf_sim::{
    CheckpointManager, Collaborators, DummyRhs, GasKind, JsonVizWriter, RhsComposer, RhsFunction,
    SimState, SimulationConfig, StartState, StopAfter, VizWriter,
};
use tracing::info;

use crate::error::AppResult;
use crate::progress::RunStage;

/// Mole fraction of O2 in the oxidizer stream.
const AIR_OXYGEN_FRACTION: f64 = 0.21;

const DILUENT: &str = "N2";

/// Gas model plus the initializer that matches it.
#[derive(Debug)]
pub struct GasSetup {
    pub model: GasModel,
    pub initializer: Box<dyn Initializer>,
}

/// A fully assembled worker, ready for [`rf_sim::Driver`].
pub struct Case {
    pub discretization: Discretization,
    pub collaborators: Collaborators,
    pub checkpoints: CheckpointManager,
    pub start: StartState,
    pub restarted: bool,
}

pub enum Prepared {
    /// `execution.stop_after` cut the setup short.
    Stopped(StopAfter),
    Ready(Box<Case>),
}

fn local_mesh(config: &SimulationConfig, comm: &dyn Communicator) -> AppResult<LocalMesh> {
    let m = &config.mesh;
    let global = generate_box_mesh(m.dim, &m.lower, &m.upper, &m.nelements)?;
    Ok(partition(&global, comm.size(), comm.rank())?)
}

pub fn build_discretization(
    config: &SimulationConfig,
    comm: &dyn Communicator,
) -> AppResult<Discretization> {
    Ok(Discretization::new(
        local_mesh(config, comm)?,
        config.mesh.order,
    )?)
}

pub fn build_gas(config: &SimulationConfig) -> AppResult<GasSetup> {
    let physics = &config.physics;
    let init = &physics.initial;
    let velocity = config.initial_velocity();

    let (eos, initializer): (Arc<dyn Thermochemistry>, Box<dyn Initializer>) = match physics.gas
    {
        GasKind::Mixture => {
            let gas = MixtureGas::hydrogen_air(config.is_reacting(), physics.newton_iterations)?;
            let initializer = MixtureInitializer::premixed(
                gas.species(),
                &Mechanism::hydrogen_air(),
                gas.species_index(DILUENT)?,
                init.equivalence_ratio,
                AIR_OXYGEN_FRACTION,
                pa(init.pressure),
                k(init.temperature),
                velocity,
            )?;
            let eos: Arc<dyn Thermochemistry> = Arc::new(gas);
            let initializer: Box<dyn Initializer> = Box::new(initializer);
            (eos, initializer)
        }
        GasKind::Single => {
            let gas = IdealSingleGas::default();
            let density = init.pressure / (gas.gas_constant(&[]) * init.temperature);
            let eos: Arc<dyn Thermochemistry> = Arc::new(gas);
            let initializer: Box<dyn Initializer> = Box::new(Uniform {
                pressure: pa(init.pressure),
                density,
                velocity,
            });
            (eos, initializer)
        }
    };

    let transport = if physics.viscous {
        let t = &physics.transport;
        Some(SimpleTransport::uniform(
            t.viscosity,
            t.thermal_conductivity,
            t.species_diffusivity,
            eos.nspecies(),
        )?)
    } else {
        None
    };

    Ok(GasSetup {
        model: GasModel::new(eos, transport)?,
        initializer,
    })
}

/// Fresh initial state on this rank's nodes.
pub fn initial_state(gas: &GasSetup, discr: &Discretization) -> AppResult<SimState> {
    let ic = gas
        .initializer
        .initialize(discr.n_nodes(), discr.dim(), gas.model.eos.as_ref())?;
    Ok(SimState::new(ic.cv, ic.temperature))
}

fn build_operator(config: &SimulationConfig, discr: Discretization) -> Arc<dyn SpatialOperator> {
    let boundary = config.physics.boundary;
    if config.physics.viscous {
        Arc::new(ViscousOperator::new(discr, boundary))
    } else {
        Arc::new(InviscidOperator::new(discr, boundary))
    }
}

fn build_rhs(
    config: &SimulationConfig,
    gas: &GasModel,
    operator: &Arc<dyn SpatialOperator>,
) -> Box<dyn RhsFunction> {
    if config.execution.dummy_rhs {
        Box::new(DummyRhs)
    } else {
        Box::new(RhsComposer::for_gas(gas.clone(), Arc::clone(operator)))
    }
}

fn build_viz(config: &SimulationConfig, rank: usize) -> Option<Box<dyn VizWriter>> {
    if config.intervals.viz < 0 {
        return None;
    }
    Some(Box::new(JsonVizWriter::new(
        &config.output.viz_dir,
        &config.case_name,
        rank,
    )))
}

/// Build every collaborator for this rank and the state the run starts from.
///
/// With `restart` set, the state is read from that file (this rank's own
/// checkpoint) instead of the initializer, and the file is protected from
/// being overwritten.
pub fn assemble(
    config: &SimulationConfig,
    comm: &dyn Communicator,
    restart: Option<&Path>,
    stage: &mut dyn FnMut(RunStage),
) -> AppResult<Prepared> {
    let rank = comm.rank();

    stage(RunStage::BuildingMesh);
    let mesh = local_mesh(config, comm)?;
    if comm.is_root() {
        info!(
            dim = config.mesh.dim,
            elements = mesh.global.global_nelements(),
            parts = comm.size(),
            "mesh generated"
        );
    }
    if config.execution.stop_after == Some(StopAfter::Mesh) {
        return Ok(Prepared::Stopped(StopAfter::Mesh));
    }

    stage(RunStage::BuildingDiscretization);
    let discr = Discretization::new(mesh, config.mesh.order)?;
    if comm.is_root() {
        info!(
            order = discr.order(),
            local_nodes = discr.n_nodes(),
            "discretization built"
        );
    }
    if config.execution.stop_after == Some(StopAfter::Discretization) {
        return Ok(Prepared::Stopped(StopAfter::Discretization));
    }

    let gas = build_gas(config)?;
    let mut checkpoints = CheckpointManager::new(
        &config.output.restart_dir,
        &config.case_name,
        rank,
        comm.size(),
        config.fingerprint()?,
    );

    let start = match restart {
        Some(path) => {
            stage(RunStage::Restoring);
            if comm.is_root() {
                info!(path = %path.display(), "restarting");
            }
            checkpoints = checkpoints.with_restart_source(path);
            checkpoints.load(path, &discr)?
        }
        None => {
            stage(RunStage::Initializing);
            StartState {
                state: initial_state(&gas, &discr)?,
                t: 0.0,
                step: 0,
            }
        }
    };

    let operator = build_operator(config, discr.clone());
    let rhs = build_rhs(config, &gas.model, &operator);
    let collaborators = Collaborators {
        gas: gas.model,
        operator,
        rhs,
        viz: build_viz(config, rank),
    };

    Ok(Prepared::Ready(Box::new(Case {
        discretization: discr,
        collaborators,
        checkpoints,
        start,
        restarted: restart.is_some(),
    })))
}
