//! Lambda, Phi and Psi kernels of the Filon quadrature weights.
//!
//! With `s` running over the unit interval,
//!
//! - `Lambda(x) = -i e^{ix}/x + (e^{ix} - 1)/x^2                    = int_0^1 s e^{ixs} ds`
//! - `Phi(x)    = -i e^{ix}/x - 6i (e^{ix} + 1)/x^3 + 12 (e^{ix} - 1)/x^4 = int_0^1 (3s^2 - 2s^3) e^{ixs} ds`
//! - `Psi(x)    = e^{ix}/x^2 + 2i (2e^{ix} + 1)/x^3 - 6 (e^{ix} - 1)/x^4  = int_0^1 (s^3 - s^2) e^{ixs} ds`
//!
//! The closed forms cancel catastrophically for small `|x|`, so arguments with
//! `|x| < 1` are summed as Taylor series instead. A series stops once a bound on
//! its remainder falls to machine epsilon times the smaller of `|Re|` and `|Im|`
//! for every element of the batch.
//!
//! References: N. Mounet, *The LHC Transverse Coupled-Bunch Instability*, PhD
//! thesis 5305 (EPFL, 2012), Eqs. (E.136), (E.142), (E.143).

use ndarray::{Array, ArrayBase, Data, Dimension};
use num_complex::Complex;
use tracing::{trace, warn};

use crate::core::{FourierError, Kernel};

/// Default cap on the number of Taylor terms summed per kernel.
pub const MAX_TAYLOR_ITERATIONS: usize = 1000;
/// Arguments with magnitude below this use the Taylor series.
pub const TAYLOR_THRESHOLD: f64 = 1.0;

const I: Complex<f64> = Complex::new(0.0, 1.0);
const ZERO: Complex<f64> = Complex::new(0.0, 0.0);

/// Taylor-series controls shared by all kernels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct TaylorSettings {
    /// Maximum number of series terms before reporting non-convergence.
    pub max_iterations: usize,
}

impl Default for TaylorSettings {
    fn default() -> Self {
        Self {
            max_iterations: MAX_TAYLOR_ITERATIONS,
        }
    }
}

impl TaylorSettings {
    pub fn with_max_iterations(max_iterations: usize) -> Self {
        Self { max_iterations }
    }
}

// Divides by a real denominator component-wise so large real arguments never
// go through the squared-norm of complex division.
#[inline]
fn div(num: Complex<f64>, den: Complex<f64>) -> Complex<f64> {
    if den.im == 0.0 {
        num / den.re
    } else {
        num / den
    }
}

// Nested divisions by `x`; powers of `x` overflow beyond |x| ~ 1e77.
#[inline]
fn lambda_closed(x: Complex<f64>) -> Complex<f64> {
    let e = (I * x).exp();
    div(-I * e + div(e - 1.0, x), x)
}

#[inline]
fn phi_psi_closed(x: Complex<f64>) -> (Complex<f64>, Complex<f64>) {
    let e = (I * x).exp();
    let phi_tail = div(-6.0 * I * (e + 1.0) + div(12.0 * (e - 1.0), x), x);
    let phi = div(-I * e + div(phi_tail, x), x);
    let psi_tail = div(2.0 * I * (2.0 * e + 1.0) - div(6.0 * (e - 1.0), x), x);
    let psi = div(div(e + psi_tail, x), x);
    (phi, psi)
}

/// Powers shared by every series: `(ix)^n`, `|x|^(n+1)`, `e^|x|` and `1/n!`.
struct SeriesPowers {
    ix: Vec<Complex<f64>>,
    abs_x: Vec<f64>,
    ix_to_n: Vec<Complex<f64>>,
    abs_x_to_n_plus_1: Vec<f64>,
    exp_abs_x: Vec<f64>,
    inv_factorial: f64,
}

impl SeriesPowers {
    fn new(x: &[Complex<f64>]) -> Self {
        let abs_x: Vec<f64> = x.iter().map(|v| v.norm()).collect();
        Self {
            ix: x.iter().map(|&v| I * v).collect(),
            ix_to_n: vec![Complex::new(1.0, 0.0); x.len()],
            abs_x_to_n_plus_1: abs_x.clone(),
            exp_abs_x: abs_x.iter().map(|a| a.exp()).collect(),
            abs_x,
            inv_factorial: 1.0,
        }
    }

    /// Moves from term `n` to term `n + 1`.
    fn advance(&mut self, n: usize) {
        for (p, ix) in self.ix_to_n.iter_mut().zip(&self.ix) {
            *p *= ix;
        }
        for (p, a) in self.abs_x_to_n_plus_1.iter_mut().zip(&self.abs_x) {
            *p *= a;
        }
        self.inv_factorial /= (n + 1) as f64;
    }
}

/// Running sum of one kernel's series.
struct TaylorAccumulator {
    kernel: Kernel,
    sum: Vec<Complex<f64>>,
    converged: bool,
}

impl TaylorAccumulator {
    fn new(kernel: Kernel, len: usize) -> Self {
        Self {
            kernel,
            sum: vec![ZERO; len],
            converged: false,
        }
    }

    /// Adds `coefficient (ix)^n / n!` and re-tests convergence against
    /// `bound_factor |x|^(n+1) e^|x| / n!`.
    fn step(&mut self, powers: &SeriesPowers, coefficient: f64, bound_factor: f64) {
        let scale = coefficient * powers.inv_factorial;
        for (s, p) in self.sum.iter_mut().zip(&powers.ix_to_n) {
            *s += *p * scale;
        }

        let bound_scale = bound_factor * powers.inv_factorial;
        self.converged = self
            .sum
            .iter()
            .zip(powers.abs_x_to_n_plus_1.iter().zip(&powers.exp_abs_x))
            .all(|(s, (a, e))| {
                let remaining = a * e * bound_scale;
                remaining <= f64::EPSILON * s.re.abs().min(s.im.abs())
            });
    }

    fn finish(self, iterations: usize) -> Vec<Complex<f64>> {
        trace!(kernel = %self.kernel, iterations, "taylor series converged");
        self.sum
    }
}

fn non_convergence(kernel: Kernel, iterations: usize) -> FourierError {
    warn!(kernel = %kernel, iterations, "taylor series did not converge");
    FourierError::NonConvergence { kernel, iterations }
}

fn lambda_series(
    x: &[Complex<f64>],
    settings: &TaylorSettings,
) -> Result<Vec<Complex<f64>>, FourierError> {
    if x.is_empty() {
        return Ok(Vec::new());
    }

    let mut powers = SeriesPowers::new(x);
    let mut lambda = TaylorAccumulator::new(Kernel::Lambda, x.len());

    for n in 0..settings.max_iterations {
        let nf = n as f64;
        lambda.step(&powers, 1.0 / (nf + 2.0), 1.0 / ((nf + 3.0) * (nf + 1.0)));
        if lambda.converged {
            return Ok(lambda.finish(n + 1));
        }
        powers.advance(n);
    }

    Err(non_convergence(Kernel::Lambda, settings.max_iterations))
}

fn phi_psi_series(
    x: &[Complex<f64>],
    settings: &TaylorSettings,
) -> Result<(Vec<Complex<f64>>, Vec<Complex<f64>>), FourierError> {
    if x.is_empty() {
        return Ok((Vec::new(), Vec::new()));
    }

    let mut powers = SeriesPowers::new(x);
    let mut phi = TaylorAccumulator::new(Kernel::Phi, x.len());
    let mut psi = TaylorAccumulator::new(Kernel::Psi, x.len());
    let mut phi_terms = 0;
    let mut psi_terms = 0;

    for n in 0..settings.max_iterations {
        let nf = n as f64;
        // Psi converges faster; each series stops being extended once it is done.
        if !phi.converged {
            phi.step(
                &powers,
                (nf + 6.0) / ((nf + 3.0) * (nf + 4.0)),
                2.0 / ((nf + 1.0) * (nf + 5.0)),
            );
            phi_terms = n + 1;
        }
        if !psi.converged {
            psi.step(
                &powers,
                -1.0 / ((nf + 3.0) * (nf + 4.0)),
                1.0 / ((nf + 1.0) * (nf + 4.0) * (nf + 5.0)),
            );
            psi_terms = n + 1;
        }
        if phi.converged && psi.converged {
            return Ok((phi.finish(phi_terms), psi.finish(psi_terms)));
        }
        powers.advance(n);
    }

    let kernel = if phi.converged {
        Kernel::Psi
    } else {
        Kernel::Phi
    };
    Err(non_convergence(kernel, settings.max_iterations))
}

/// Splits flat indices into (series, closed-form) partitions by `|x| < 1`.
fn split_by_magnitude(x: &[Complex<f64>]) -> (Vec<usize>, Vec<usize>) {
    (0..x.len()).partition(|&k| x[k].norm() < TAYLOR_THRESHOLD)
}

fn gather(x: &[Complex<f64>], indices: &[usize]) -> Vec<Complex<f64>> {
    indices.iter().map(|&k| x[k]).collect()
}

fn scatter(out: &mut [Complex<f64>], indices: &[usize], values: &[Complex<f64>]) {
    for (&k, &v) in indices.iter().zip(values) {
        out[k] = v;
    }
}

fn flatten_args<S, D, A>(x: &ArrayBase<S, D>) -> Vec<Complex<f64>>
where
    S: Data<Elem = A>,
    D: Dimension,
    A: Copy + Into<Complex<f64>>,
{
    x.iter().map(|&v| v.into()).collect()
}

fn shape_like<S, D, A>(x: &ArrayBase<S, D>, flat: Vec<Complex<f64>>) -> Array<Complex<f64>, D>
where
    S: Data<Elem = A>,
    D: Dimension,
{
    let mut out = Array::from_elem(x.raw_dim(), ZERO);
    for (slot, v) in out.iter_mut().zip(flat) {
        *slot = v;
    }
    out
}

/// Evaluates `Lambda(x)` element-wise with the default [`TaylorSettings`].
pub fn lambda_fn<S, D, A>(x: &ArrayBase<S, D>) -> Result<Array<Complex<f64>, D>, FourierError>
where
    S: Data<Elem = A>,
    D: Dimension,
    A: Copy + Into<Complex<f64>>,
{
    lambda_fn_with(x, &TaylorSettings::default())
}

/// Evaluates `Lambda(x)` element-wise.
///
/// Accepts real or complex arguments of any shape; the result has the shape of `x`.
pub fn lambda_fn_with<S, D, A>(
    x: &ArrayBase<S, D>,
    settings: &TaylorSettings,
) -> Result<Array<Complex<f64>, D>, FourierError>
where
    S: Data<Elem = A>,
    D: Dimension,
    A: Copy + Into<Complex<f64>>,
{
    let args = flatten_args(x);
    let (series, closed) = split_by_magnitude(&args);

    let mut out = vec![ZERO; args.len()];
    for &k in &closed {
        out[k] = lambda_closed(args[k]);
    }
    let summed = lambda_series(&gather(&args, &series), settings)?;
    scatter(&mut out, &series, &summed);

    Ok(shape_like(x, out))
}

/// Evaluates `(Phi(x), Psi(x))` element-wise with the default [`TaylorSettings`].
pub fn phi_and_psi<S, D, A>(
    x: &ArrayBase<S, D>,
) -> Result<(Array<Complex<f64>, D>, Array<Complex<f64>, D>), FourierError>
where
    S: Data<Elem = A>,
    D: Dimension,
    A: Copy + Into<Complex<f64>>,
{
    phi_and_psi_with(x, &TaylorSettings::default())
}

/// Evaluates `(Phi(x), Psi(x))` element-wise.
///
/// Both series share one loop; whichever converges first stops accumulating
/// while the other keeps going. Fails with [`FourierError::NonConvergence`]
/// naming the first kernel still unconverged at the cap.
pub fn phi_and_psi_with<S, D, A>(
    x: &ArrayBase<S, D>,
    settings: &TaylorSettings,
) -> Result<(Array<Complex<f64>, D>, Array<Complex<f64>, D>), FourierError>
where
    S: Data<Elem = A>,
    D: Dimension,
    A: Copy + Into<Complex<f64>>,
{
    let args = flatten_args(x);
    let (series, closed) = split_by_magnitude(&args);

    let mut phi = vec![ZERO; args.len()];
    let mut psi = vec![ZERO; args.len()];
    for &k in &closed {
        (phi[k], psi[k]) = phi_psi_closed(args[k]);
    }
    let (series_phi, series_psi) = phi_psi_series(&gather(&args, &series), settings)?;
    scatter(&mut phi, &series, &series_phi);
    scatter(&mut psi, &series, &series_psi);

    Ok((shape_like(x, phi), shape_like(x, psi)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use ndarray::{Array1, arr0, array};

    // Composite Simpson rule for int_0^1 w(s) e^{ixs} ds.
    fn weighted_oscillatory_integral(x: f64, w: impl Fn(f64) -> f64) -> Complex<f64> {
        let n = 20_000;
        let h = 1.0 / n as f64;
        let mut acc = ZERO;
        for k in 0..=n {
            let s = k as f64 * h;
            let coeff = if k == 0 || k == n {
                1.0
            } else if k % 2 == 1 {
                4.0
            } else {
                2.0
            };
            acc += (I * x * s).exp() * (coeff * w(s));
        }
        acc * (h / 3.0)
    }

    fn assert_complex_close(a: Complex<f64>, b: Complex<f64>, tol: f64) {
        assert!(
            (a - b).norm() <= tol * b.norm().max(1.0e-300),
            "got {a}, expected {b}"
        );
    }

    #[test]
    fn series_and_closed_forms_agree_at_the_switch_point() {
        let settings = TaylorSettings::default();
        let boundary = [
            Complex::new(1.0, 0.0),
            Complex::new(-1.0, 0.0),
            Complex::from_polar(1.0, 0.7),
            Complex::from_polar(1.0, -2.1),
        ];

        let lambda = lambda_series(&boundary, &settings).unwrap();
        let (phi, psi) = phi_psi_series(&boundary, &settings).unwrap();
        for (k, &x) in boundary.iter().enumerate() {
            let (phi_c, psi_c) = phi_psi_closed(x);
            assert_complex_close(lambda[k], lambda_closed(x), 1e-13);
            assert_complex_close(phi[k], phi_c, 1e-13);
            assert_complex_close(psi[k], psi_c, 1e-12);
        }
    }

    #[test]
    fn kernels_match_their_integral_representations() {
        for x in [0.3, -0.8, 2.5, -7.0, 20.0] {
            let lambda = lambda_fn(&arr0(x)).unwrap().into_scalar();
            let (phi, psi) = phi_and_psi(&arr0(x)).unwrap();

            assert_complex_close(lambda, weighted_oscillatory_integral(x, |s| s), 1e-9);
            assert_complex_close(
                phi.into_scalar(),
                weighted_oscillatory_integral(x, |s| 3.0 * s * s - 2.0 * s * s * s),
                1e-9,
            );
            assert_complex_close(
                psi.into_scalar(),
                weighted_oscillatory_integral(x, |s| s * s * s - s * s),
                1e-9,
            );
        }
    }

    #[test]
    fn zero_argument_gives_the_hermite_weights() {
        let (phi, psi) = phi_and_psi(&arr0(0.0)).unwrap();
        assert_eq!(phi.into_scalar(), Complex::new(0.5, 0.0));
        assert_abs_diff_eq!(psi.into_scalar().re, -1.0 / 12.0, epsilon = 1e-17);
        assert_eq!(
            lambda_fn(&arr0(0.0)).unwrap().into_scalar(),
            Complex::new(0.5, 0.0)
        );
    }

    #[test]
    fn lambda_at_a_full_period() {
        let two_pi = 2.0 * std::f64::consts::PI;
        let lambda = lambda_fn(&arr0(two_pi)).unwrap().into_scalar();
        assert_abs_diff_eq!(lambda.re, 0.0, epsilon = 1e-16);
        assert_abs_diff_eq!(lambda.im, -1.0 / two_pi, epsilon = 1e-16);
    }

    #[test]
    fn mixed_batches_keep_shape_and_element_independence() {
        let x = array![[0.25, 3.0, -0.9], [12.0, -0.01, 1.0]];
        let (phi, psi) = phi_and_psi(&x).unwrap();
        assert_eq!(phi.shape(), &[2, 3]);
        assert_eq!(psi.shape(), &[2, 3]);

        for ((&xi, &p), &q) in x.iter().zip(phi.iter()).zip(psi.iter()) {
            let (p1, q1) = phi_and_psi(&arr0(xi)).unwrap();
            assert_complex_close(p, p1.into_scalar(), 1e-15);
            assert_complex_close(q, q1.into_scalar(), 1e-15);
        }
    }

    #[test]
    fn complex_arguments_are_supported() {
        let x: Array1<Complex<f64>> = array![Complex::new(0.2, 0.3), Complex::new(1.5, -0.5)];
        let lambda = lambda_fn(&x).unwrap();
        let (phi, psi) = phi_and_psi(&x).unwrap();

        assert_complex_close(lambda[1], lambda_closed(x[1]), 1e-15);
        let (phi_c, psi_c) = phi_psi_closed(x[1]);
        assert_complex_close(phi[1], phi_c, 1e-15);
        assert_complex_close(psi[1], psi_c, 1e-15);
        // Odd symmetry of the series: conj(Phi(x)) = Phi(-conj(x)).
        let mirrored = phi_and_psi(&array![-x[0].conj()]).unwrap().0;
        assert_complex_close(mirrored[0], phi[0].conj(), 1e-15);
        assert!(psi[0].norm() > 0.0);
    }

    #[test]
    fn low_iteration_cap_reports_the_failing_kernel() {
        let settings = TaylorSettings::with_max_iterations(2);
        let x = array![0.9, 5.0];

        assert_eq!(
            phi_and_psi_with(&x, &settings),
            Err(FourierError::NonConvergence {
                kernel: Kernel::Phi,
                iterations: 2
            })
        );
        assert_eq!(
            lambda_fn_with(&x, &settings),
            Err(FourierError::NonConvergence {
                kernel: Kernel::Lambda,
                iterations: 2
            })
        );
    }

    #[test]
    fn huge_arguments_decay_without_overflow() {
        let x: Array1<f64> = array![1.0e80, -1.0e103, 1.0e160];
        let (phi, psi) = phi_and_psi(&x).unwrap();
        let lambda = lambda_fn(&x).unwrap();

        for k in 0..x.len() {
            let e = (I * x[k]).exp();
            // Leading terms: Phi ~ -i e/x, Lambda ~ -i e/x, Psi ~ e/x^2.
            let leading = -I * e / x[k];
            assert_complex_close(phi[k], leading, 1e-12);
            assert_complex_close(lambda[k], leading, 1e-12);
            assert!(psi[k].re.is_finite() && psi[k].im.is_finite());
        }
        let psi_leading = (I * x[0]).exp() / x[0] / x[0];
        assert_complex_close(psi[0], psi_leading, 1e-12);
    }

    #[test]
    fn closed_form_only_batches_ignore_the_iteration_cap() {
        let settings = TaylorSettings::with_max_iterations(0);
        let x = array![1.0, -4.0, 1.0e6];
        assert!(phi_and_psi_with(&x, &settings).is_ok());
        assert!(lambda_fn_with(&x, &settings).is_ok());
    }
}
