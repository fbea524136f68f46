pub mod chord;
pub mod eigenclock;
pub mod error;
pub mod fretboard;
pub mod integrate;
pub mod pendulum;
pub mod quadrature;
pub mod solvers;
pub mod spectrum;
pub mod string;
/// The `oscillo_core` crate provides the numeric engines behind short physics
/// and music animations. Every engine is built once from explicit parameters
/// and then sampled as a pure function of time (and position).
///
/// Key components:
/// - **Traits**: `Scalar` (numeric type abstraction), `DynamicalSystem` (ODE right-hand sides), `EmbeddedStepper` (error-estimating steps).
/// - **Integrate**: Adaptive Dormand-Prince integration with dense (Hermite) output.
/// - **Pendulum**: Double pendulum equations, solution queries, energy and bob geometry.
/// - **String / Chord**: Fourier sine-series string synthesis and six-string chord assembly.
/// - **Fretboard / Eigenclock / Spectrum**: Fret geometry, 2x2 eigen-directions, pickup FFT.
pub mod traits;

pub use error::{OscilloError, Result};
