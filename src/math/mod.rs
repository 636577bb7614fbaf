//! Numerical building blocks of the Filon quadrature: the monotone cubic
//! Hermite interpolation primitive, its complex-valued wrapper, and the
//! transcendental weight kernels.

pub mod complex_pchip;
pub mod interpolation;
pub mod kernels;

pub use complex_pchip::{complex_pchip, complex_pchip_orders};
pub use interpolation::{
    ExtrapolationMode, HermiteMonotoneInterpolator, InterpolationError, Interpolator,
    pchip_interpolate,
};
pub use kernels::{
    MAX_TAYLOR_ITERATIONS, TAYLOR_THRESHOLD, TaylorSettings, lambda_fn, lambda_fn_with,
    phi_and_psi, phi_and_psi_with,
};
