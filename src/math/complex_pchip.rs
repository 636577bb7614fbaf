//! Monotone cubic Hermite interpolation of complex-valued samples.
//!
//! The real and imaginary parts are fitted as two independent real PCHIP
//! interpolants and recombined as `re + i im`. Each component keeps the
//! per-interval monotonicity guarantee of the real construction; no notion of
//! monotonicity is claimed for the complex combination.

use ndarray::{ArrayBase, ArrayD, Data, Dimension, Zip};
use num_complex::Complex;

use super::interpolation::{InterpolationError, pchip_interpolate};

fn recombine(re: &ArrayD<f64>, im: &ArrayD<f64>) -> ArrayD<Complex<f64>> {
    Zip::from(re)
        .and(im)
        .map_collect(|&re, &im| Complex::new(re, im))
}

/// Evaluates the `order`-th derivative of the complex PCHIP fitted through
/// `(xi, zi)` along `axis`, at the points `x`.
///
/// `zi` may have any trailing shape; the result has the shape of `zi` with
/// `axis` resized to `x.len()`.
pub fn complex_pchip<S, D>(
    xi: &[f64],
    zi: &ArrayBase<S, D>,
    x: &[f64],
    order: usize,
    axis: usize,
) -> Result<ArrayD<Complex<f64>>, InterpolationError>
where
    S: Data<Elem = Complex<f64>>,
    D: Dimension,
{
    let re = pchip_interpolate(xi, &zi.map(|z| z.re), x, order, axis)?;
    let im = pchip_interpolate(xi, &zi.map(|z| z.im), x, order, axis)?;
    Ok(recombine(&re, &im))
}

/// Like [`complex_pchip`], returning one array per requested derivative order.
pub fn complex_pchip_orders<S, D>(
    xi: &[f64],
    zi: &ArrayBase<S, D>,
    x: &[f64],
    orders: &[usize],
    axis: usize,
) -> Result<Vec<ArrayD<Complex<f64>>>, InterpolationError>
where
    S: Data<Elem = Complex<f64>>,
    D: Dimension,
{
    let re_part = zi.map(|z| z.re);
    let im_part = zi.map(|z| z.im);

    orders
        .iter()
        .map(|&order| {
            let re = pchip_interpolate(xi, &re_part, x, order, axis)?;
            let im = pchip_interpolate(xi, &im_part, x, order, axis)?;
            Ok(recombine(&re, &im))
        })
        .collect()
}
