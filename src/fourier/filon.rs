//! Filon-type quadrature of `int e^{i omega t} f(omega) d omega` on a fixed grid.
//!
//! The sampled function is replaced by its monotone cubic Hermite interpolant
//! and each panel `[omega_k, omega_{k+1}]` is integrated against the
//! oscillatory factor exactly. With `d = omega_{k+1} - omega_k` and `x = d t`,
//! one panel contributes
//!
//! ```text
//! d e^{i omega_k t} [ f_k Phi(-x) e^{ix} + f_{k+1} Phi(x)
//!                     - d f'_k Psi(-x) e^{ix} + d f'_{k+1} Psi(x) ]
//! ```
//!
//! which stays accurate when a panel holds many oscillations, where trapezoid
//! or Simpson rules break down. Optional asymptotic terms extend the
//! integration range to `+inf` and/or `-inf`.
//!
//! References: N. Mounet, *The LHC Transverse Coupled-Bunch Instability*, PhD
//! thesis 5305 (EPFL, 2012), App. E.

use std::f64::consts::PI;

use ndarray::{Array, Array2, ArrayBase, Axis, Data, Dimension, Ix2, s};
use num_complex::Complex;
use tracing::debug;

use crate::core::FourierError;
use crate::fourier::correction::{TailDirection, asymptotic_correction, validate_correction_times};
use crate::fourier::layout::FeatureLayout;
use crate::math::complex_pchip::complex_pchip;
use crate::math::kernels::{TaylorSettings, phi_and_psi_with};

const I: Complex<f64> = Complex::new(0.0, 1.0);

/// Configuration of [`fourier_integral_with`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize, serde::Deserialize)]
pub struct FourierIntegralSettings {
    /// Add the analytic tail from the highest frequency to `+inf`.
    pub pos_inf_correction: bool,
    /// Add the analytic tail from `-inf` to the lowest frequency.
    pub neg_inf_correction: bool,
    /// Series controls for the Phi/Psi kernels.
    pub taylor: TaylorSettings,
}

impl FourierIntegralSettings {
    pub fn with_corrections(pos_inf_correction: bool, neg_inf_correction: bool) -> Self {
        Self {
            pos_inf_correction,
            neg_inf_correction,
            taylor: TaylorSettings::default(),
        }
    }

    pub fn with_taylor(mut self, taylor: TaylorSettings) -> Self {
        self.taylor = taylor;
        self
    }

    fn any_correction(&self) -> bool {
        self.pos_inf_correction || self.neg_inf_correction
    }
}

fn validate_inputs<S, D>(
    times: &[f64],
    frequencies: &[f64],
    func_values: &ArrayBase<S, D>,
    settings: &FourierIntegralSettings,
) -> Result<(), FourierError>
where
    S: Data<Elem = Complex<f64>>,
    D: Dimension,
{
    if frequencies.len() < 2 {
        return Err(FourierError::InvalidInput(format!(
            "at least two frequencies are required, got {}",
            frequencies.len()
        )));
    }
    if let Some(idx) = frequencies.iter().position(|f| !f.is_finite()) {
        return Err(FourierError::InvalidInput(format!(
            "frequencies[{idx}] = {} is not finite",
            frequencies[idx]
        )));
    }
    if let Some(idx) = frequencies.windows(2).position(|w| w[1] <= w[0]) {
        return Err(FourierError::InvalidInput(format!(
            "frequencies must be strictly increasing, but frequencies[{}] = {} follows {}",
            idx + 1,
            frequencies[idx + 1],
            frequencies[idx]
        )));
    }
    if func_values.ndim() == 0 || func_values.len_of(Axis(0)) != frequencies.len() {
        return Err(FourierError::InvalidInput(format!(
            "function values of shape {:?} do not match {} frequencies along axis 0",
            func_values.shape(),
            frequencies.len()
        )));
    }
    if settings.any_correction() {
        validate_correction_times(times)
    } else if let Some(idx) = times.iter().position(|t| !t.is_finite()) {
        Err(FourierError::InvalidInput(format!(
            "times[{idx}] = {} is not finite",
            times[idx]
        )))
    } else {
        Ok(())
    }
}

/// Fourier integral of sampled values with the default Taylor settings.
///
/// See [`fourier_integral_with`].
pub fn fourier_integral<S, D>(
    times: &[f64],
    frequencies: &[f64],
    func_values: &ArrayBase<S, D>,
    pos_inf_correction: bool,
    neg_inf_correction: bool,
) -> Result<Array<Complex<f64>, D>, FourierError>
where
    S: Data<Elem = Complex<f64>>,
    D: Dimension,
{
    fourier_integral_with(
        times,
        frequencies,
        func_values,
        &FourierIntegralSettings::with_corrections(pos_inf_correction, neg_inf_correction),
    )
}

/// Computes `int e^{i omega t} f(omega) d omega`, `omega = 2 pi f`, for every time.
///
/// `func_values` has shape `(N, ...trailing)` with axis 0 aligned to the
/// strictly increasing `frequencies`; the result has shape `(M, ...trailing)`
/// for `M = times.len()`. Without corrections the integral runs over the
/// sampled band only.
///
/// A zero time is only accepted when no asymptotic correction is requested;
/// the result is then the integral of the interpolant over the band.
pub fn fourier_integral_with<S, D>(
    times: &[f64],
    frequencies: &[f64],
    func_values: &ArrayBase<S, D>,
    settings: &FourierIntegralSettings,
) -> Result<Array<Complex<f64>, D>, FourierError>
where
    S: Data<Elem = Complex<f64>>,
    D: Dimension,
{
    validate_inputs(times, frequencies, func_values, settings)?;

    let layout = FeatureLayout::of(func_values)?;
    debug!(
        times = times.len(),
        frequencies = frequencies.len(),
        features = layout.features(),
        pos_inf_correction = settings.pos_inf_correction,
        neg_inf_correction = settings.neg_inf_correction,
        "evaluating filon fourier integral"
    );

    let omegas: Vec<f64> = frequencies.iter().map(|f| 2.0 * PI * f).collect();
    let values = layout.flatten(func_values)?;
    let derivatives = complex_pchip(&omegas, &values, &omegas, 1, 0)?
        .into_dimensionality::<Ix2>()
        .map_err(|err| FourierError::InvalidInput(format!("derivative rank: {err}")))?;

    let mut result = Array2::from_elem((times.len(), layout.features()), Complex::new(0.0, 0.0));
    let last = omegas.len() - 1;

    if settings.pos_inf_correction {
        result += &asymptotic_correction(
            times,
            omegas[last],
            values.row(last),
            Some(derivatives.row(last)),
            TailDirection::PositiveInfinity,
        )?;
    }
    if settings.neg_inf_correction {
        result += &asymptotic_correction(
            times,
            omegas[0],
            values.row(0),
            Some(derivatives.row(0)),
            TailDirection::NegativeInfinity,
        )?;
    }

    // (time, sub-interval) grids of kernel arguments and phases.
    let panels = last;
    let delta: Vec<f64> = omegas.windows(2).map(|w| w[1] - w[0]).collect();
    let x = Array2::from_shape_fn((times.len(), panels), |(m, k)| delta[k] * times[m]);
    let start_phase =
        Array2::from_shape_fn((times.len(), panels), |(m, k)| (I * (omegas[k] * times[m])).exp());

    let (phi_x, psi_x) = phi_and_psi_with(&x, &settings.taylor)?;
    let (phi_neg_x, psi_neg_x) = phi_and_psi_with(&x.mapv(|v| -v), &settings.taylor)?;

    // Panel weights of f_k, f_{k+1}, f'_k and f'_{k+1}.
    let mut value_lo = Array2::from_elem(x.raw_dim(), Complex::new(0.0, 0.0));
    let mut value_hi = value_lo.clone();
    let mut slope_lo = value_lo.clone();
    let mut slope_hi = value_lo.clone();
    for ((m, k), &xk) in x.indexed_iter() {
        let d = delta[k];
        let weight = start_phase[[m, k]] * d;
        let shifted = weight * (I * xk).exp();
        value_lo[[m, k]] = shifted * phi_neg_x[[m, k]];
        value_hi[[m, k]] = weight * phi_x[[m, k]];
        slope_lo[[m, k]] = -(shifted * psi_neg_x[[m, k]]) * d;
        slope_hi[[m, k]] = weight * psi_x[[m, k]] * d;
    }

    result += &value_lo.dot(&values.slice(s![..last, ..]));
    result += &value_hi.dot(&values.slice(s![1.., ..]));
    result += &slope_lo.dot(&derivatives.slice(s![..last, ..]));
    result += &slope_hi.dot(&derivatives.slice(s![1.., ..]));

    layout.restore::<_, D>(&result)
}
