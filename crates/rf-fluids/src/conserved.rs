//! Conserved variables of the reacting gas.

use rf_core::Field;
use serde::{Deserialize, Serialize};

use crate::error::{FluidError, FluidResult};

/// Conserved state on the local partition.
///
/// Component order (used by packing and visualization):
/// mass, momentum[0..dim], energy, species[0..nspecies].
///
/// `species` holds partial densities `rho * Y_i`, so the mass fractions are
/// recovered by dividing by `mass`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ConservedState {
    pub mass: Field,
    pub momentum: Vec<Field>,
    pub energy: Field,
    pub species: Vec<Field>,
}

fn combine(a: &Field, b: &Field, f: impl Fn(f64, f64) -> f64) -> Field {
    debug_assert_eq!(a.len(), b.len());
    Field::from_vec(a.iter().zip(b.iter()).map(|(&x, &y)| f(x, y)).collect())
}

impl ConservedState {
    /// Build a state, checking that every component has the same node count.
    pub fn new(
        mass: Field,
        momentum: Vec<Field>,
        energy: Field,
        species: Vec<Field>,
    ) -> FluidResult<Self> {
        let n = mass.len();
        if momentum.is_empty() || momentum.len() > 3 {
            return Err(FluidError::InvalidArg {
                what: "momentum must have 1 to 3 components",
            });
        }
        for f in momentum.iter().chain(std::iter::once(&energy)).chain(&species) {
            if f.len() != n {
                return Err(FluidError::ShapeMismatch {
                    what: "conserved component length",
                    expected: n,
                    found: f.len(),
                });
            }
        }
        Ok(Self {
            mass,
            momentum,
            energy,
            species,
        })
    }

    pub fn zeros(n_nodes: usize, dim: usize, nspecies: usize) -> Self {
        Self {
            mass: Field::zeros(n_nodes),
            momentum: vec![Field::zeros(n_nodes); dim],
            energy: Field::zeros(n_nodes),
            species: vec![Field::zeros(n_nodes); nspecies],
        }
    }

    pub fn zeros_like(&self) -> Self {
        Self::zeros(self.n_nodes(), self.dim(), self.nspecies())
    }

    pub fn n_nodes(&self) -> usize {
        self.mass.len()
    }

    pub fn dim(&self) -> usize {
        self.momentum.len()
    }

    pub fn nspecies(&self) -> usize {
        self.species.len()
    }

    /// Number of conserved components per node.
    pub fn n_components(&self) -> usize {
        2 + self.dim() + self.nspecies()
    }

    /// True if `other` has the same node count, dimension and species count.
    pub fn same_shape(&self, other: &ConservedState) -> bool {
        self.n_nodes() == other.n_nodes()
            && self.dim() == other.dim()
            && self.nspecies() == other.nspecies()
    }

    pub fn components(&self) -> impl Iterator<Item = &Field> {
        std::iter::once(&self.mass)
            .chain(self.momentum.iter())
            .chain(std::iter::once(&self.energy))
            .chain(self.species.iter())
    }

    pub fn components_mut(&mut self) -> impl Iterator<Item = &mut Field> {
        std::iter::once(&mut self.mass)
            .chain(self.momentum.iter_mut())
            .chain(std::iter::once(&mut self.energy))
            .chain(self.species.iter_mut())
    }

    /// Human-readable component names in component order.
    pub fn component_names(&self) -> Vec<String> {
        let mut names = vec!["mass".to_string()];
        names.extend((0..self.dim()).map(|d| format!("momentum_{d}")));
        names.push("energy".to_string());
        names.extend((0..self.nspecies()).map(|s| format!("species_{s}")));
        names
    }

    /// Element-wise `self + other`.
    ///
    /// Both states come from the same discretization, so shapes agree by
    /// construction.
    pub fn add(&self, other: &ConservedState) -> ConservedState {
        debug_assert!(self.same_shape(other));
        Self {
            mass: combine(&self.mass, &other.mass, |a, b| a + b),
            momentum: self
                .momentum
                .iter()
                .zip(&other.momentum)
                .map(|(a, b)| combine(a, b, |x, y| x + y))
                .collect(),
            energy: combine(&self.energy, &other.energy, |a, b| a + b),
            species: self
                .species
                .iter()
                .zip(&other.species)
                .map(|(a, b)| combine(a, b, |x, y| x + y))
                .collect(),
        }
    }

    /// Element-wise `factor * self`.
    pub fn scale(&self, factor: f64) -> ConservedState {
        Self {
            mass: self.mass.scale(factor),
            momentum: self.momentum.iter().map(|f| f.scale(factor)).collect(),
            energy: self.energy.scale(factor),
            species: self.species.iter().map(|f| f.scale(factor)).collect(),
        }
    }

    /// Velocity components `momentum / mass`.
    pub fn velocity(&self) -> Vec<Field> {
        self.momentum
            .iter()
            .map(|m| combine(m, &self.mass, |a, b| a / b))
            .collect()
    }

    /// Mass fractions `species / mass`.
    pub fn species_mass_fractions(&self) -> Vec<Field> {
        self.species
            .iter()
            .map(|s| combine(s, &self.mass, |a, b| a / b))
            .collect()
    }

    /// Mass fractions at one node.
    pub fn mass_fractions_at(&self, node: usize) -> Vec<f64> {
        let rho = self.mass[node];
        self.species.iter().map(|s| s[node] / rho).collect()
    }

    /// Kinetic energy density `0.5 |m|^2 / rho` at one node.
    pub fn kinetic_energy_density_at(&self, node: usize) -> f64 {
        let m2: f64 = self.momentum.iter().map(|m| m[node] * m[node]).sum();
        0.5 * m2 / self.mass[node]
    }

    /// Specific internal energy `(E - 0.5 |m|^2 / rho) / rho`.
    pub fn specific_internal_energy(&self) -> Field {
        Field::from_fn(self.n_nodes(), |i| {
            (self.energy[i] - self.kinetic_energy_density_at(i)) / self.mass[i]
        })
    }

    /// Component values at one node, in component order.
    pub fn node_values(&self, node: usize) -> Vec<f64> {
        self.components().map(|f| f[node]).collect()
    }
}
