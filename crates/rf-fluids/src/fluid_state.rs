//! Derived (non-conserved) fluid state.

use std::sync::Arc;

use rf_core::Field;

use crate::conserved::ConservedState;
use crate::error::{FluidError, FluidResult};
use crate::thermochemistry::Thermochemistry;
use crate::transport::{SimpleTransport, TransportFields};

/// Quantities recovered from the conserved state and a temperature seed.
///
/// Recomputed whenever needed and never persisted.
#[derive(Clone, Debug, PartialEq)]
pub struct DerivedFluidState {
    pub temperature: Field,
    pub pressure: Field,
    pub sound_speed: Field,
    pub heat_capacity_cp: Field,
    /// Present only for viscous runs.
    pub transport: Option<TransportFields>,
}

impl DerivedFluidState {
    pub fn n_nodes(&self) -> usize {
        self.temperature.len()
    }
}

/// Equation of state plus optional transport model.
#[derive(Clone, Debug)]
pub struct GasModel {
    pub eos: Arc<dyn Thermochemistry>,
    pub transport: Option<SimpleTransport>,
}

impl GasModel {
    pub fn new(eos: Arc<dyn Thermochemistry>, transport: Option<SimpleTransport>) -> FluidResult<Self> {
        if let Some(tr) = &transport {
            let ns = eos.nspecies();
            if !tr.species_diffusivity.is_empty() && tr.species_diffusivity.len() != ns {
                return Err(FluidError::ShapeMismatch {
                    what: "species diffusivity count",
                    expected: ns,
                    found: tr.species_diffusivity.len(),
                });
            }
        }
        Ok(Self { eos, transport })
    }

    pub fn inviscid(eos: Arc<dyn Thermochemistry>) -> Self {
        Self {
            eos,
            transport: None,
        }
    }

    pub fn nspecies(&self) -> usize {
        self.eos.nspecies()
    }

    /// Recover temperature from `seed`, then pressure, sound speed and `c_p`.
    pub fn make_fluid_state(
        &self,
        cv: &ConservedState,
        seed: &Field,
    ) -> FluidResult<DerivedFluidState> {
        if seed.len() != cv.n_nodes() {
            return Err(FluidError::ShapeMismatch {
                what: "temperature seed length",
                expected: cv.n_nodes(),
                found: seed.len(),
            });
        }
        if cv.nspecies() != self.eos.nspecies() {
            return Err(FluidError::ShapeMismatch {
                what: "species count",
                expected: self.eos.nspecies(),
                found: cv.nspecies(),
            });
        }

        let temperature = self.eos.recover_temperature(cv, seed)?;
        let pressure = self.eos.pressure(cv, &temperature)?;
        let sound_speed = self.eos.sound_speed(cv, &temperature)?;
        let heat_capacity_cp = self.eos.heat_capacity_cp(cv, &temperature)?;
        let transport = self.transport.as_ref().map(|tr| {
            let mut fields = tr.fields(cv.n_nodes());
            // no diffusivities given: species do not diffuse
            if fields.species_diffusivity.is_empty() && cv.nspecies() > 0 {
                fields.species_diffusivity = vec![Field::zeros(cv.n_nodes()); cv.nspecies()];
            }
            fields
        });

        Ok(DerivedFluidState {
            temperature,
            pressure,
            sound_speed,
            heat_capacity_cp,
            transport,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ideal::IdealSingleGas;

    fn still_air(n: usize) -> (GasModel, ConservedState) {
        let gas = IdealSingleGas::default();
        let e = gas.mixture_internal_energy(300.0, &[]);
        let cv = ConservedState::new(
            Field::filled(n, 1.0),
            vec![Field::zeros(n), Field::zeros(n)],
            Field::filled(n, e),
            vec![],
        )
        .unwrap();
        (GasModel::inviscid(Arc::new(gas)), cv)
    }

    #[test]
    fn builds_all_fields() {
        let (model, cv) = still_air(4);
        let fs = model.make_fluid_state(&cv, &Field::filled(4, 300.0)).unwrap();
        assert_eq!(fs.n_nodes(), 4);
        assert!((fs.temperature[0] - 300.0).abs() < 1e-10);
        assert!((fs.sound_speed[0] - (1.4f64 * 287.1 * 300.0).sqrt()).abs() < 1e-8);
        assert!(fs.transport.is_none());
    }

    #[test]
    fn seed_length_must_match() {
        let (model, cv) = still_air(4);
        let err = model.make_fluid_state(&cv, &Field::zeros(3)).unwrap_err();
        assert!(matches!(err, FluidError::ShapeMismatch { .. }));
    }

    #[test]
    fn viscous_model_carries_transport() {
        let (mut model, cv) = still_air(2);
        model.transport = Some(SimpleTransport::new(1.8e-5, 0.026, vec![]).unwrap());
        let fs = model.make_fluid_state(&cv, &Field::filled(2, 300.0)).unwrap();
        let tr = fs.transport.unwrap();
        assert_eq!(tr.viscosity[1], 1.8e-5);
    }
}
