use num_traits::{Float, FromPrimitive};
use std::fmt::Debug;

/// A trait for types that can be used as scalars in trajectory integration.
/// Must support floating-point arithmetic, debug printing, and conversion from f64.
pub trait Scalar: Float + FromPrimitive + Debug + 'static {}

impl<T: Float + FromPrimitive + Debug + 'static> Scalar for T {}

/// The right-hand side of the trajectory ODE, supplied by an external
/// field model.
///
/// The equation is autonomous in the arc-length parameter: the field is
/// sampled at the position carried inside the state vector, so no
/// independent variable is passed.
pub trait EquationOfMotion<T: Scalar> {
    /// Number of active state components (3 position, 3 momentum,
    /// optional auxiliaries).
    fn dimension(&self) -> usize;

    /// Evaluates the derivative of `y` with respect to arc length into
    /// `dydx`. Deterministic and free of side effects.
    fn evaluate(&self, y: &[T], dydx: &mut [T]);
}

/// One embedded Runge-Kutta trial step plus a local error estimate.
pub trait Stepper<T: Scalar> {
    /// Advances `y` by the trial step `h`.
    ///
    /// `dydx` must hold the derivative of `y` at the starting point.
    /// `yout` receives the accepted-order solution and `yerr` the
    /// component-wise truncation-error estimate. Scratch buffers are
    /// reused across calls, so a single instance must not be shared
    /// between concurrent integrations.
    fn step(
        &mut self,
        equation: &impl EquationOfMotion<T>,
        y: &[T],
        dydx: &[T],
        h: T,
        yout: &mut [T],
        yerr: &mut [T],
    );

    /// Formal order of the accepted solution, from which the driver
    /// derives its step-size exponents.
    fn integrator_order(&self) -> usize;

    /// Deviation of the most recent step's curved path from its straight
    /// chord: the distance between the chord midpoint and the position
    /// reached by an independent half-length probe from the same start
    /// point.
    fn dist_chord(&mut self, equation: &impl EquationOfMotion<T>) -> T;

    /// Number of state components this stepper integrates.
    fn num_variables(&self) -> usize;
}
