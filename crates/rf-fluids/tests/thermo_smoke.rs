//! Thermochemistry integration tests.
//!
//! Exercise the gas models through `GasModel` the way the step controller
//! uses them: initialize, recover temperature from a seed, check sources.

use std::sync::Arc;

use proptest::prelude::*;
use rf_core::Field;
use rf_core::units::{k, pa};
use rf_fluids::{
    GasModel, IdealSingleGas, Initializer, Mechanism, MixtureGas, MixtureInitializer,
    SimpleTransport, Thermochemistry, Uniform,
};

fn premixed(t: f64) -> MixtureInitializer {
    let gas = MixtureGas::hydrogen_air(true, 5).unwrap();
    MixtureInitializer::premixed(
        gas.species(),
        &Mechanism::hydrogen_air(),
        3,
        1.0,
        0.21,
        pa(101_325.0),
        k(t),
        vec![1.0, 0.0],
    )
    .unwrap()
}

#[test]
fn mixture_state_round_trips_through_gas_model() {
    let gas = Arc::new(MixtureGas::hydrogen_air(true, 5).unwrap());
    let transport = SimpleTransport::uniform(1e-5, 0.05, 2e-4, 4).unwrap();
    let model = GasModel::new(gas.clone(), Some(transport)).unwrap();

    let ic = premixed(1200.0).initialize(5, 2, gas.as_ref()).unwrap();
    let fs = model.make_fluid_state(&ic.cv, &ic.temperature).unwrap();

    for i in 0..5 {
        assert!((fs.temperature[i] - 1200.0).abs() < 1e-8);
        assert!((fs.pressure[i] - 101_325.0).abs() < 1e-3);
        assert!(fs.sound_speed[i] > 500.0 && fs.sound_speed[i] < 1500.0);
    }
    let tr = fs.transport.unwrap();
    assert_eq!(tr.species_diffusivity.len(), 4);
}

#[test]
fn hotter_mixture_reacts_faster() {
    let gas = MixtureGas::hydrogen_air(true, 5).unwrap();
    let rate_at = |t: f64| {
        let ic = premixed(t).initialize(1, 2, &gas).unwrap();
        let src = gas
            .species_source_terms(&ic.cv, &Field::filled(1, t))
            .unwrap();
        -src[0][0]
    };
    let cold = rate_at(900.0);
    let hot = rate_at(1800.0);
    assert!(cold > 0.0);
    assert!(hot > cold);
}

#[test]
fn gas_model_rejects_wrong_diffusivity_count() {
    let gas = Arc::new(MixtureGas::hydrogen_air(false, 5).unwrap());
    let transport = SimpleTransport::new(1e-5, 0.05, vec![1e-4; 2]).unwrap();
    assert!(GasModel::new(gas, Some(transport)).is_err());
}

#[test]
fn single_gas_ignores_seed() {
    let gas = Arc::new(IdealSingleGas::default());
    let model = GasModel::inviscid(gas.clone());
    let ic = Uniform {
        pressure: pa(101_325.0),
        density: 1.2,
        velocity: vec![0.0],
    }
    .initialize(2, 1, gas.as_ref())
    .unwrap();
    let a = model.make_fluid_state(&ic.cv, &ic.temperature).unwrap();
    let b = model.make_fluid_state(&ic.cv, &Field::filled(2, 1.0)).unwrap();
    assert_eq!(a, b);
}

proptest! {
    #[test]
    fn newton_recovery_converges_from_nearby_seeds(
        t_true in 400.0f64..2500.0,
        offset in -150.0f64..150.0,
    ) {
        let gas = MixtureGas::hydrogen_air(false, 5).unwrap();
        let ic = premixed(t_true).initialize(1, 2, &gas).unwrap();
        let seed = Field::filled(1, t_true + offset);
        let t = gas.recover_temperature(&ic.cv, &seed).unwrap();
        prop_assert!((t[0] - t_true).abs() < 1e-6 * t_true);

        let y = ic.cv.species_mass_fractions();
        let e = ic.cv.specific_internal_energy();
        let r = gas.temperature_update_residual(&e, &t, &y).unwrap();
        prop_assert!((r[0] / t[0]).abs() < 1e-8);
    }
}
