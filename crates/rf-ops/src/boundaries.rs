//! Boundary conditions on the box faces.

use serde::{Deserialize, Serialize};

/// Thermal behaviour of a wall.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum WallThermal {
    Adiabatic,
    Isothermal { temperature: f64 },
}

/// Conditions applied on every face of the box.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Boundaries {
    /// Opposite faces are connected.
    #[default]
    Periodic,
    /// Slip wall for inviscid operators, no-slip for viscous ones.
    Wall(WallThermal),
}

impl Boundaries {
    pub fn is_periodic(&self) -> bool {
        matches!(self, Boundaries::Periodic)
    }

    /// Prescribed wall temperature, if any.
    pub fn wall_temperature(&self) -> Option<f64> {
        match self {
            Boundaries::Wall(WallThermal::Isothermal { temperature }) => Some(*temperature),
            _ => None,
        }
    }
}
