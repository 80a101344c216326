//! SI quantities used at the initial-condition boundary.

use uom::si::f64::{Pressure as UomPressure, ThermodynamicTemperature as UomTemperature};

pub type Pressure = UomPressure;
pub type Temperature = UomTemperature;

#[inline]
pub fn pa(v: f64) -> Pressure {
    use uom::si::pressure::pascal;
    Pressure::new::<pascal>(v)
}

#[inline]
pub fn k(v: f64) -> Temperature {
    use uom::si::thermodynamic_temperature::kelvin;
    Temperature::new::<kelvin>(v)
}

pub mod constants {
    /// Universal gas constant [J/(mol·K)].
    pub const R_UNIVERSAL: f64 = 8.314_462_618;

    /// One standard atmosphere [Pa].
    pub const ONE_ATM_PA: f64 = 101_325.0;

    /// Reference temperature for formation energies [K].
    pub const T_REF_K: f64 = 298.15;
}
