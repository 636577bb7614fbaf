//! Neffint computes Fourier integrals of functions sampled on arbitrary,
//! non-equidistant frequency grids.
//!
//! Given samples `F(f_k)` on a strictly increasing grid, the crate evaluates
//!
//! ```text
//! I(t) = int e^{i omega t} F(omega) d omega,   omega = 2 pi f
//! ```
//!
//! for any set of times. The integrand is replaced by a monotone cubic Hermite
//! interpolant (PCHIP) and each panel is integrated against the oscillatory
//! factor exactly (a Filon-type rule), so a grid spanning many decades with
//! panels holding thousands of oscillations is still integrated accurately.
//! Optional asymptotic terms extend the range to `+inf` and `-inf`.
//!
//! References:
//! - N. Mounet, *The LHC Transverse Coupled-Bunch Instability*, PhD thesis 5305
//!   (EPFL, 2012), App. E.
//! - Fritsch and Butland (1984), monotone piecewise bicubic interpolation.
//!
//! Numerical considerations:
//! - The Lambda/Phi/Psi kernels switch from closed forms to Taylor series below
//!   `|x| = 1`; the series cap is configurable through [`math::TaylorSettings`].
//! - The tail terms assume the integrand decays at least like `1/omega` beyond
//!   the sampled band. This is not checked.
//!
//! # Quick Start
//! Integrate a constant over a band:
//! ```rust
//! use ndarray::Array1;
//! use num_complex::Complex;
//! use neffint::fourier_integral;
//!
//! let frequencies = [1.0, 1.5, 2.0];
//! let values = Array1::from_elem(3, Complex::new(1.0, 0.0));
//! let t = 0.25;
//!
//! let out = fourier_integral(&[t], &frequencies, &values, false, false).unwrap();
//!
//! let i = Complex::new(0.0, 1.0);
//! let (w0, w1) = (2.0 * std::f64::consts::PI, 4.0 * std::f64::consts::PI);
//! let exact = ((i * w1 * t).exp() - (i * w0 * t).exp()) / (i * t);
//! assert!((out[0] - exact).norm() < 1.0e-12);
//! ```
//!
//! Evaluate the quadrature kernels directly:
//! ```rust
//! use ndarray::array;
//! use neffint::math::phi_and_psi;
//!
//! let (phi, psi) = phi_and_psi(&array![0.0, 0.5, 20.0]).unwrap();
//! assert!((phi[0].re - 0.5).abs() < 1.0e-15);
//! assert!((psi[0].re + 1.0 / 12.0).abs() < 1.0e-15);
//! ```

pub mod core;
pub mod fourier;
pub mod math;

pub use crate::core::{FourierError, Kernel};
pub use crate::fourier::{
    FourierIntegralSettings, TailDirection, asymptotic_correction, fourier_integral,
    fourier_integral_with,
};
