//! Analytic tail of the Fourier integral beyond the sampled frequency band.
//!
//! Expanding the integrand to first order about the boundary frequency
//! `omega_end` and integrating `e^{i omega t}` analytically out to infinity gives
//!
//! `sign * e^{i t omega_end} * (i f(omega_end)/t - f'(omega_end)/t^2)`
//!
//! with `sign = +1` towards `+inf` and `-1` towards `-inf`. Dropping the
//! derivative leaves the zeroth-order term. The expansion only holds for a
//! function decaying at least like `1/omega` beyond the boundary; that is the
//! caller's responsibility and is not checked.

use ndarray::{Array, ArrayView, Axis, Dimension};
use num_complex::Complex;

use crate::core::FourierError;

const I: Complex<f64> = Complex::new(0.0, 1.0);

/// Which infinite tail a correction term approximates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum TailDirection {
    /// From the highest sampled frequency to `+inf`.
    PositiveInfinity,
    /// From `-inf` to the lowest sampled frequency.
    NegativeInfinity,
}

impl TailDirection {
    #[inline]
    pub fn sign(self) -> f64 {
        match self {
            Self::PositiveInfinity => 1.0,
            Self::NegativeInfinity => -1.0,
        }
    }
}

pub(crate) fn validate_correction_times(times: &[f64]) -> Result<(), FourierError> {
    if let Some((idx, t)) = times
        .iter()
        .enumerate()
        .find(|(_, t)| !t.is_finite() || **t == 0.0)
    {
        return Err(FourierError::InvalidInput(format!(
            "asymptotic correction needs finite non-zero times, got times[{idx}] = {t}"
        )));
    }
    Ok(())
}

/// Computes the tail correction for every time in `times`.
///
/// `value_end` and `derivative_end` carry the function's trailing shape; the
/// result has shape `(times.len(), ...trailing)`. Passing `None` for the
/// derivative gives the first-order (value only) correction.
pub fn asymptotic_correction<D>(
    times: &[f64],
    omega_end: f64,
    value_end: ArrayView<'_, Complex<f64>, D>,
    derivative_end: Option<ArrayView<'_, Complex<f64>, D>>,
    direction: TailDirection,
) -> Result<Array<Complex<f64>, D::Larger>, FourierError>
where
    D: Dimension,
{
    if !omega_end.is_finite() {
        return Err(FourierError::InvalidInput(format!(
            "boundary angular frequency must be finite, got {omega_end}"
        )));
    }
    validate_correction_times(times)?;
    if let Some(derivative) = &derivative_end {
        if derivative.shape() != value_end.shape() {
            return Err(FourierError::InvalidInput(format!(
                "derivative shape {:?} does not match value shape {:?}",
                derivative.shape(),
                value_end.shape()
            )));
        }
    }

    let mut dim = value_end.view().insert_axis(Axis(0)).raw_dim();
    dim[0] = times.len();
    let mut out = Array::from_elem(dim, Complex::new(0.0, 0.0));
    let sign = direction.sign();

    // Samples are divided by `t` one factor at a time so `1/t^2` never
    // overflows on its own for tiny times.
    for (mut row, &t) in out.axis_iter_mut(Axis(0)).zip(times) {
        let phase = (I * (t * omega_end)).exp() * sign;
        let value_weight = phase * I;
        row.zip_mut_with(&value_end, |slot, &v| *slot = value_weight * (v / t));

        if let Some(derivative) = &derivative_end {
            row.zip_mut_with(derivative, |slot, &d| *slot -= phase * (d / t / t));
        }
    }

    Ok(out)
}
