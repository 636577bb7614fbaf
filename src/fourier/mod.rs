//! Fourier integrals of sampled functions.
//!
//! [`fourier_integral`] evaluates `int e^{i 2 pi f t} F(f) d(2 pi f)` for a
//! function known on an arbitrary, possibly log-spaced, frequency grid. The
//! Filon-type rule in [`filon`] stays accurate for large `f * t`, and
//! [`correction`] supplies the analytic tails beyond the sampled band.

pub mod correction;
pub mod filon;
mod layout;

pub use correction::{TailDirection, asymptotic_correction};
pub use filon::{FourierIntegralSettings, fourier_integral, fourier_integral_with};
