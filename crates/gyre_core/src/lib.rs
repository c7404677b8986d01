//! The `gyre_core` crate advances a particle's trajectory state through
//! a spatially varying field by integrating its equation of motion with
//! adaptive step-size control.
//!
//! Key components:
//! - **Traits**: `Scalar` (numeric type abstraction), `EquationOfMotion`
//!   (the externally supplied right-hand side), `Stepper` (embedded
//!   Runge-Kutta trial steps with error estimates).
//! - **Track**: fixed-capacity state vector plus its arc-length
//!   parameter, with flat-array dump/load for external storage.
//! - **Steppers**: classical RK4 with step-doubling, Cash-Karp 5(4) and
//!   Dormand-Prince 6(5) embedded pairs, each with a chord-deviation
//!   probe.
//! - **Error norm**: tolerance-normalized worst-of position/momentum
//!   relative error score.
//! - **Driver**: the retry/resize loop that advances a track across a
//!   whole interval within accuracy and step-count budgets.

pub mod driver;
pub mod error_norm;
pub mod steppers;
pub mod track;
pub mod traits;
