use num_traits::{Float, FromPrimitive};
use std::fmt::Debug;

/// A trait for types that can be used as scalars in our dynamical systems.
/// Must support basic arithmetic, debug printing, and conversion from f64.
pub trait Scalar: Float + FromPrimitive + Debug + 'static {}

impl<T: Float + FromPrimitive + Debug + 'static> Scalar for T {}

/// Represents a continuous-time dynamical system `x' = f(t, x)`.
pub trait DynamicalSystem<T: Scalar> {
    /// Returns the dimension of the state space.
    fn dimension(&self) -> usize;

    /// Evaluates the vector field.
    /// x: current state
    /// t: current time
    /// out: buffer to write dx/dt into
    fn apply(&self, t: T, x: &[T], out: &mut [T]);
}

/// A solver that attempts single steps of an embedded Runge-Kutta pair.
///
/// The stepper owns its stage buffers. After `attempt`, the proposed state,
/// its derivative and the local error estimate are read back through the
/// accessors; the caller decides whether to accept the step.
pub trait EmbeddedStepper<T: Scalar> {
    /// Order of the embedded error estimate, used by step-size control.
    fn error_order(&self) -> usize;

    /// Attempts a step of size dt.
    /// t: time at the start of the step
    /// state: state at the start of the step
    /// deriv: f(t, state), reused as the first stage
    /// dt: step size
    fn attempt(&mut self, system: &impl DynamicalSystem<T>, t: T, state: &[T], deriv: &[T], dt: T);

    /// State at `t + dt` from the last attempt.
    fn proposal(&self) -> &[T];

    /// Derivative at the proposed state.
    fn proposal_derivative(&self) -> &[T];

    /// Local error estimate of the last attempt.
    fn error_estimate(&self) -> &[T];
}
