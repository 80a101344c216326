//! Right-hand side of the semi-discrete system: fluid operator plus chemistry.

use std::fmt::Debug;
use std::sync::Arc;

use rf_comm::Communicator;
use rf_core::Field;
use rf_fluids::{ConservedState, DerivedFluidState, GasModel, Thermochemistry};
use rf_ops::SpatialOperator;

use crate::error::{SimError, SimResult};
use crate::model::TransientModel;
use crate::state::SimState;

/// One evaluation of the right-hand side.
#[derive(Clone, Debug)]
pub struct RhsEvaluation {
    /// `(d cv/dt, 0)`.
    pub derivative: SimState,
    /// Temperature recovered while evaluating, if any.
    pub recovered_temperature: Option<Field>,
}

/// `d/dt` of the simulation state.
pub trait RhsFunction: Send + Sync + Debug {
    fn name(&self) -> &'static str;

    fn evaluate(
        &self,
        t: f64,
        state: &SimState,
        comm: &dyn Communicator,
    ) -> SimResult<RhsEvaluation>;
}

/// Species production term.
pub trait ChemistrySource: Send + Sync + Debug {
    fn name(&self) -> &'static str;

    /// One field of `d(rho Y_i)/dt` per species.
    fn species_sources(
        &self,
        cv: &ConservedState,
        fluid: &DerivedFluidState,
    ) -> SimResult<Vec<Field>>;
}

/// No reactions.
#[derive(Clone, Copy, Debug, Default)]
pub struct InertChemistry;

impl ChemistrySource for InertChemistry {
    fn name(&self) -> &'static str {
        "inert"
    }

    fn species_sources(
        &self,
        cv: &ConservedState,
        _fluid: &DerivedFluidState,
    ) -> SimResult<Vec<Field>> {
        Ok(vec![Field::zeros(cv.n_nodes()); cv.nspecies()])
    }
}

/// Production rates of the gas mechanism at the recovered temperature.
#[derive(Clone, Debug)]
pub struct ReactingChemistry {
    eos: Arc<dyn Thermochemistry>,
}

impl ReactingChemistry {
    pub fn new(eos: Arc<dyn Thermochemistry>) -> Self {
        Self { eos }
    }
}

impl ChemistrySource for ReactingChemistry {
    fn name(&self) -> &'static str {
        "reacting"
    }

    fn species_sources(
        &self,
        cv: &ConservedState,
        fluid: &DerivedFluidState,
    ) -> SimResult<Vec<Field>> {
        Ok(self.eos.species_source_terms(cv, &fluid.temperature)?)
    }
}

/// Spatial operator plus chemistry, with the fluid state rebuilt from the
/// seed on every evaluation.
#[derive(Debug)]
pub struct RhsComposer {
    gas: GasModel,
    operator: Arc<dyn SpatialOperator>,
    chemistry: Box<dyn ChemistrySource>,
}

impl RhsComposer {
    pub fn new(
        gas: GasModel,
        operator: Arc<dyn SpatialOperator>,
        chemistry: Box<dyn ChemistrySource>,
    ) -> Self {
        Self {
            gas,
            operator,
            chemistry,
        }
    }

    /// Chemistry chosen by whether the gas can react.
    pub fn for_gas(gas: GasModel, operator: Arc<dyn SpatialOperator>) -> Self {
        let chemistry: Box<dyn ChemistrySource> = if gas.eos.is_reactive() {
            Box::new(ReactingChemistry::new(gas.eos.clone()))
        } else {
            Box::new(InertChemistry)
        };
        Self::new(gas, operator, chemistry)
    }

    pub fn chemistry(&self) -> &dyn ChemistrySource {
        self.chemistry.as_ref()
    }
}

impl RhsFunction for RhsComposer {
    fn name(&self) -> &'static str {
        "composed"
    }

    fn evaluate(
        &self,
        t: f64,
        state: &SimState,
        comm: &dyn Communicator,
    ) -> SimResult<RhsEvaluation> {
        let cv = &state.integrated;
        let fluid = self.gas.make_fluid_state(cv, state.seed())?;
        let mut rate = self.operator.rate(t, cv, &fluid, comm)?;

        let sources = self.chemistry.species_sources(cv, &fluid)?;
        if sources.len() != rate.species.len() {
            return Err(SimError::Backend {
                message: format!(
                    "{} chemistry returned {} source fields for {} species",
                    self.chemistry.name(),
                    sources.len(),
                    rate.species.len()
                ),
            });
        }
        for (r, s) in rate.species.iter_mut().zip(&sources) {
            r.axpy(1.0, s)?;
        }

        Ok(RhsEvaluation {
            derivative: SimState::derivative(rate),
            recovered_temperature: Some(fluid.temperature),
        })
    }
}

/// Zero right-hand side.
#[derive(Clone, Copy, Debug, Default)]
pub struct DummyRhs;

impl RhsFunction for DummyRhs {
    fn name(&self) -> &'static str {
        "dummy"
    }

    fn evaluate(
        &self,
        _t: f64,
        state: &SimState,
        _comm: &dyn Communicator,
    ) -> SimResult<RhsEvaluation> {
        Ok(RhsEvaluation {
            derivative: state.zeros_like(),
            recovered_temperature: None,
        })
    }
}

/// Adapter that lets the integrators drive an [`RhsFunction`].
///
/// Keeps the temperature of the latest evaluation so the driver can refresh
/// the seed after the step.
pub struct SeededRhs<'a> {
    rhs: &'a dyn RhsFunction,
    comm: &'a dyn Communicator,
    last_temperature: Option<Field>,
    evaluations: usize,
}

impl<'a> SeededRhs<'a> {
    pub fn new(rhs: &'a dyn RhsFunction, comm: &'a dyn Communicator) -> Self {
        Self {
            rhs,
            comm,
            last_temperature: None,
            evaluations: 0,
        }
    }

    pub fn evaluations(&self) -> usize {
        self.evaluations
    }

    pub fn take_last_temperature(&mut self) -> Option<Field> {
        self.last_temperature.take()
    }
}

impl TransientModel for SeededRhs<'_> {
    type State = SimState;

    fn rhs(&mut self, t: f64, x: &SimState) -> SimResult<SimState> {
        let eval = self.rhs.evaluate(t, x, self.comm)?;
        self.evaluations += 1;
        if eval.recovered_temperature.is_some() {
            self.last_temperature = eval.recovered_temperature;
        }
        Ok(eval.derivative)
    }

    fn add(&self, a: &SimState, b: &SimState) -> SimState {
        a.add(b)
    }

    fn scale(&self, a: &SimState, scale: f64) -> SimState {
        a.scale(scale)
    }
}
