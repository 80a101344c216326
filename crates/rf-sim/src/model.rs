//! TransientModel trait for the systems the integrators advance.

use crate::error::SimResult;

/// A system `x_dot = f(t, x)` with vector-space arithmetic on its state.
pub trait TransientModel {
    /// State type (must be Clone).
    type State: Clone;

    /// Compute state derivative dxdt = f(t, x).
    ///
    /// Takes `&mut self` so models can record side results of an evaluation
    /// (the recovered temperature, evaluation counts).
    fn rhs(&mut self, t: f64, x: &Self::State) -> SimResult<Self::State>;

    /// Add two states element-wise: result = a + b.
    fn add(&self, a: &Self::State, b: &Self::State) -> Self::State;

    /// Scale a state by a scalar: result = scale * a.
    fn scale(&self, a: &Self::State, scale: f64) -> Self::State;
}
