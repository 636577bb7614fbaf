//! Shape-preserving cubic Hermite interpolation (PCHIP) for real-valued samples.
//!
//! This is the monotone interpolation primitive the Fourier integrator relies on
//! for derivative estimates. Slopes follow the Fritsch-Butland weighted harmonic
//! mean in the interior and a one-sided three-point formula at the ends, so each
//! sub-interval of monotone data yields a monotone cubic.
//!
//! References:
//! - Fritsch and Carlson (1980), monotone piecewise cubic interpolation.
//! - Fritsch and Butland (1984), *A method for constructing local monotone
//!   piecewise cubic interpolants*, SIAM J. Sci. Comput. 5(2).

use std::fmt;

use ndarray::{ArrayBase, ArrayD, Axis, Data, Dimension, IxDyn};

/// Extrapolation behavior outside the calibrated node range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum ExtrapolationMode {
    /// Keep the endpoint value constant.
    Flat,
    /// Extend using endpoint tangent/slope.
    Linear,
    /// Keep evaluating the end cubic segment.
    Polynomial,
    /// Return an error outside node range.
    Error,
}

/// Errors returned by interpolators.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InterpolationError {
    InvalidInput(&'static str),
    /// Sample axis length differs from the number of abscissas.
    LengthMismatch {
        expected: usize,
        found: usize,
    },
    /// Requested interpolation axis does not exist.
    AxisOutOfBounds {
        axis: usize,
        ndim: usize,
    },
    ExtrapolationDisabled,
}

impl fmt::Display for InterpolationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidInput(msg) => f.write_str(msg),
            Self::LengthMismatch { expected, found } => write!(
                f,
                "sample axis has length {found}, expected {expected} to match abscissas"
            ),
            Self::AxisOutOfBounds { axis, ndim } => {
                write!(f, "axis {axis} out of bounds for array of rank {ndim}")
            }
            Self::ExtrapolationDisabled => f.write_str("query outside node range"),
        }
    }
}

impl std::error::Error for InterpolationError {}

/// Common interpolation interface.
pub trait Interpolator {
    /// Returns the `order`-th derivative of the interpolant at `x`; order 0 is the value.
    fn derivative_of_order(&self, x: f64, order: usize) -> Result<f64, InterpolationError>;

    /// Returns interpolation abscissas.
    fn x(&self) -> &[f64];

    /// Returns interpolation ordinates.
    fn y(&self) -> &[f64];

    /// Returns interpolated value `y(x)`.
    fn value(&self, x: f64) -> Result<f64, InterpolationError> {
        self.derivative_of_order(x, 0)
    }

    /// Returns first derivative `dy/dx`.
    fn derivative(&self, x: f64) -> Result<f64, InterpolationError> {
        self.derivative_of_order(x, 1)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum QueryLocation {
    Left,
    Inside(usize),
    Right,
}

pub(crate) fn validate_abscissas(x: &[f64]) -> Result<(), InterpolationError> {
    if x.len() < 2 {
        return Err(InterpolationError::InvalidInput(
            "not enough interpolation nodes",
        ));
    }
    if x.iter().any(|v| !v.is_finite()) {
        return Err(InterpolationError::InvalidInput("x must be finite"));
    }
    if x.windows(2).any(|w| w[1] <= w[0]) {
        return Err(InterpolationError::InvalidInput(
            "x must be strictly increasing",
        ));
    }
    Ok(())
}

fn validate_xy(x: &[f64], y: &[f64]) -> Result<(), InterpolationError> {
    if x.len() != y.len() {
        return Err(InterpolationError::LengthMismatch {
            expected: x.len(),
            found: y.len(),
        });
    }
    validate_abscissas(x)?;
    if y.iter().any(|v| !v.is_finite()) {
        return Err(InterpolationError::InvalidInput("y must be finite"));
    }
    Ok(())
}

fn query_location(x: &[f64], xq: f64) -> QueryLocation {
    if xq < x[0] {
        return QueryLocation::Left;
    }
    if xq > x[x.len() - 1] {
        return QueryLocation::Right;
    }
    let idx = x.partition_point(|v| *v <= xq);
    if idx == 0 {
        QueryLocation::Inside(0)
    } else if idx >= x.len() {
        QueryLocation::Inside(x.len() - 2)
    } else {
        QueryLocation::Inside(idx - 1)
    }
}

// Zero maps to zero, unlike `f64::signum`.
#[inline]
fn sign(v: f64) -> f64 {
    if v > 0.0 {
        1.0
    } else if v < 0.0 {
        -1.0
    } else {
        0.0
    }
}

fn pchip_end_slope(h0: f64, h1: f64, delta0: f64, delta1: f64) -> f64 {
    let d = ((2.0 * h0 + h1) * delta0 - h0 * delta1) / (h0 + h1);
    if sign(d) != sign(delta0) {
        0.0
    } else if sign(delta0) != sign(delta1) && d.abs() > 3.0 * delta0.abs() {
        3.0 * delta0
    } else {
        d
    }
}

pub(crate) fn pchip_slopes(x: &[f64], y: &[f64]) -> Vec<f64> {
    let n = x.len();
    if n == 2 {
        let m = (y[1] - y[0]) / (x[1] - x[0]);
        return vec![m, m];
    }

    let mut h = vec![0.0; n - 1];
    let mut delta = vec![0.0; n - 1];
    for i in 0..(n - 1) {
        h[i] = x[i + 1] - x[i];
        delta[i] = (y[i + 1] - y[i]) / h[i];
    }

    let mut d = vec![0.0; n];

    for k in 1..(n - 1) {
        // Signs are compared directly; the product of tiny secants underflows.
        if sign(delta[k - 1]) * sign(delta[k]) <= 0.0 {
            d[k] = 0.0;
        } else {
            let w1 = 2.0 * h[k] + h[k - 1];
            let w2 = h[k] + 2.0 * h[k - 1];
            d[k] = (w1 + w2) / (w1 / delta[k - 1] + w2 / delta[k]);
        }
    }

    d[0] = pchip_end_slope(h[0], h[1], delta[0], delta[1]);
    let m = n - 1;
    d[m] = pchip_end_slope(h[m - 1], h[m - 2], delta[m - 1], delta[m - 2]);

    d
}

/// Evaluates the `order`-th derivative of one cubic Hermite segment at `xq`.
#[inline]
#[allow(clippy::too_many_arguments)]
fn hermite_eval(
    x0: f64,
    x1: f64,
    y0: f64,
    y1: f64,
    m0: f64,
    m1: f64,
    xq: f64,
    order: usize,
) -> f64 {
    let h = x1 - x0;
    let s = (xq - x0) / h;
    let s2 = s * s;

    match order {
        0 => {
            let s3 = s2 * s;
            let h00 = 2.0 * s3 - 3.0 * s2 + 1.0;
            let h10 = s3 - 2.0 * s2 + s;
            let h01 = -2.0 * s3 + 3.0 * s2;
            let h11 = s3 - s2;
            h00 * y0 + h10 * h * m0 + h01 * y1 + h11 * h * m1
        }
        1 => {
            ((6.0 * s2 - 6.0 * s) * y0 + (-6.0 * s2 + 6.0 * s) * y1) / h
                + (3.0 * s2 - 4.0 * s + 1.0) * m0
                + (3.0 * s2 - 2.0 * s) * m1
        }
        2 => {
            ((12.0 * s - 6.0) * y0 + (6.0 - 12.0 * s) * y1) / (h * h)
                + ((6.0 * s - 4.0) * m0 + (6.0 * s - 2.0) * m1) / h
        }
        3 => 12.0 * (y0 - y1) / (h * h * h) + 6.0 * (m0 + m1) / (h * h),
        _ => 0.0,
    }
}

/// Shape-preserving cubic Hermite interpolation (PCHIP style).
#[derive(Debug, Clone)]
pub struct HermiteMonotoneInterpolator {
    x: Vec<f64>,
    y: Vec<f64>,
    slopes: Vec<f64>,
    extrapolation: ExtrapolationMode,
}

impl HermiteMonotoneInterpolator {
    pub fn new(
        x: Vec<f64>,
        y: Vec<f64>,
        extrapolation: ExtrapolationMode,
    ) -> Result<Self, InterpolationError> {
        validate_xy(&x, &y)?;
        let slopes = pchip_slopes(&x, &y);
        Ok(Self {
            x,
            y,
            slopes,
            extrapolation,
        })
    }

    /// Node slopes `dy/dx` chosen by the monotone construction.
    pub fn slopes(&self) -> &[f64] {
        &self.slopes
    }

    fn segment(&self, i: usize, xq: f64, order: usize) -> f64 {
        hermite_eval(
            self.x[i],
            self.x[i + 1],
            self.y[i],
            self.y[i + 1],
            self.slopes[i],
            self.slopes[i + 1],
            xq,
            order,
        )
    }

    fn extrapolate(
        &self,
        node: usize,
        segment: usize,
        xq: f64,
        order: usize,
    ) -> Result<f64, InterpolationError> {
        match self.extrapolation {
            ExtrapolationMode::Flat => Ok(if order == 0 { self.y[node] } else { 0.0 }),
            ExtrapolationMode::Linear => Ok(match order {
                0 => self.y[node] + self.slopes[node] * (xq - self.x[node]),
                1 => self.slopes[node],
                _ => 0.0,
            }),
            ExtrapolationMode::Polynomial => Ok(self.segment(segment, xq, order)),
            ExtrapolationMode::Error => Err(InterpolationError::ExtrapolationDisabled),
        }
    }
}

impl Interpolator for HermiteMonotoneInterpolator {
    fn derivative_of_order(&self, xq: f64, order: usize) -> Result<f64, InterpolationError> {
        let n = self.x.len();
        match query_location(&self.x, xq) {
            QueryLocation::Left => self.extrapolate(0, 0, xq, order),
            QueryLocation::Right => self.extrapolate(n - 1, n - 2, xq, order),
            QueryLocation::Inside(i) => Ok(self.segment(i, xq, order)),
        }
    }

    fn x(&self) -> &[f64] {
        &self.x
    }

    fn y(&self) -> &[f64] {
        &self.y
    }
}

/// Fits a PCHIP interpolant along `axis` of `yi` and evaluates its `order`-th
/// derivative at every point of `x`.
///
/// The output has the shape of `yi` with `axis` resized to `x.len()`. Every
/// lane along `axis` is an independent real series; queries outside
/// `[xi[0], xi[N-1]]` extend the end cubics.
pub fn pchip_interpolate<S, D>(
    xi: &[f64],
    yi: &ArrayBase<S, D>,
    x: &[f64],
    order: usize,
    axis: usize,
) -> Result<ArrayD<f64>, InterpolationError>
where
    S: Data<Elem = f64>,
    D: Dimension,
{
    if axis >= yi.ndim() {
        return Err(InterpolationError::AxisOutOfBounds {
            axis,
            ndim: yi.ndim(),
        });
    }
    let len = yi.len_of(Axis(axis));
    if len != xi.len() {
        return Err(InterpolationError::LengthMismatch {
            expected: xi.len(),
            found: len,
        });
    }
    validate_abscissas(xi)?;
    if x.iter().any(|v| !v.is_finite()) {
        return Err(InterpolationError::InvalidInput(
            "evaluation points must be finite",
        ));
    }

    let mut shape = yi.shape().to_vec();
    shape[axis] = x.len();
    let mut out = ArrayD::<f64>::zeros(IxDyn(&shape));

    for (lane, mut out_lane) in yi
        .lanes(Axis(axis))
        .into_iter()
        .zip(out.lanes_mut(Axis(axis)))
    {
        let itp = HermiteMonotoneInterpolator::new(
            xi.to_vec(),
            lane.to_vec(),
            ExtrapolationMode::Polynomial,
        )?;
        for (slot, &xq) in out_lane.iter_mut().zip(x) {
            *slot = itp.derivative_of_order(xq, order)?;
        }
    }

    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use ndarray::{Array2, array};

    #[test]
    fn hermite_monotone_preserves_shape_for_monotone_series() {
        let itp = HermiteMonotoneInterpolator::new(
            vec![0.5, 1.0, 2.0, 5.0],
            vec![0.02, 0.021, 0.025, 0.029],
            ExtrapolationMode::Linear,
        )
        .unwrap();

        let mut prev = itp.value(0.5).unwrap();
        for i in 1..40 {
            let t = 0.5 + (4.5 * i as f64) / 40.0;
            let v = itp.value(t).unwrap();
            assert!(v >= prev - 1.0e-12);
            prev = v;
        }
    }

    #[test]
    fn hermite_monotone_interpolates_nodes_and_reports_slopes() {
        let x = vec![0.0, 1.0, 2.0];
        let y = vec![0.0, 1.0, 4.0];
        let itp =
            HermiteMonotoneInterpolator::new(x.clone(), y.clone(), ExtrapolationMode::Error)
                .unwrap();

        for (xi, yi) in x.iter().zip(y.iter()) {
            assert_relative_eq!(itp.value(*xi).unwrap(), *yi, epsilon = 1e-14);
        }
        // End slope clipped to zero, harmonic-mean interior slope, unclipped right end.
        assert_eq!(itp.slopes(), &[0.0, 1.5, 4.0]);
        assert_relative_eq!(itp.derivative(1.0).unwrap(), 1.5, epsilon = 1e-14);
        assert_relative_eq!(itp.derivative(2.0).unwrap(), 4.0, epsilon = 1e-14);
        assert_relative_eq!(itp.value(0.5).unwrap(), 0.3125, epsilon = 1e-14);
    }

    #[test]
    fn two_nodes_reduce_to_the_secant_line() {
        let itp = HermiteMonotoneInterpolator::new(
            vec![1.0, 3.0],
            vec![2.0, 6.0],
            ExtrapolationMode::Polynomial,
        )
        .unwrap();

        assert_relative_eq!(itp.value(2.0).unwrap(), 4.0, epsilon = 1e-14);
        assert_relative_eq!(itp.derivative(2.5).unwrap(), 2.0, epsilon = 1e-14);
        assert_relative_eq!(itp.derivative_of_order(2.5, 2).unwrap(), 0.0, epsilon = 1e-14);
        assert_relative_eq!(itp.value(5.0).unwrap(), 10.0, epsilon = 1e-14);
    }

    #[test]
    fn higher_derivatives_of_a_cubic_segment() {
        // Linear data keeps every slope equal to the secant, so the cubic is a line.
        let itp = HermiteMonotoneInterpolator::new(
            vec![0.0, 1.0, 3.0, 4.0],
            vec![1.0, 3.0, 7.0, 9.0],
            ExtrapolationMode::Flat,
        )
        .unwrap();

        for xq in [0.25, 1.5, 3.75] {
            assert_relative_eq!(itp.derivative(xq).unwrap(), 2.0, epsilon = 1e-12);
            assert_relative_eq!(itp.derivative_of_order(xq, 2).unwrap(), 0.0, epsilon = 1e-12);
            assert_relative_eq!(itp.derivative_of_order(xq, 3).unwrap(), 0.0, epsilon = 1e-12);
            assert_eq!(itp.derivative_of_order(xq, 4).unwrap(), 0.0);
        }
        assert_eq!(itp.value(-1.0).unwrap(), 1.0);
        assert_eq!(itp.derivative(5.0).unwrap(), 0.0);
    }

    #[test]
    fn flat_segments_and_extrema_get_zero_slopes() {
        let itp = HermiteMonotoneInterpolator::new(
            vec![0.0, 1.0, 2.0, 3.0, 4.0],
            vec![0.0, 1.0, 1.0, 2.0, 0.0],
            ExtrapolationMode::Linear,
        )
        .unwrap();

        assert_eq!(itp.slopes()[1], 0.0);
        assert_eq!(itp.slopes()[2], 0.0);
        assert_eq!(itp.slopes()[3], 0.0);
        for i in 0..=20 {
            let v = itp.value(1.0 + i as f64 / 20.0).unwrap();
            assert_relative_eq!(v, 1.0, epsilon = 1e-14);
        }
    }

    #[test]
    fn tiny_monotone_secants_keep_a_nonzero_interior_slope() {
        let slopes = pchip_slopes(&[0.0, 1.0, 2.0], &[0.0, 1.0e-170, 3.0e-170]);
        assert_relative_eq!(slopes[1], 4.0e-170 / 3.0, max_relative = 1e-14);
        assert_relative_eq!(slopes[0], 5.0e-171, max_relative = 1e-14);
        assert_relative_eq!(slopes[2], 2.5e-170, max_relative = 1e-14);
    }

    #[test]
    fn extrapolation_error_mode_rejects_outside() {
        let itp = HermiteMonotoneInterpolator::new(
            vec![1.0, 2.0],
            vec![0.01, 0.02],
            ExtrapolationMode::Error,
        )
        .unwrap();

        assert!(matches!(
            itp.value(0.5),
            Err(InterpolationError::ExtrapolationDisabled)
        ));
        assert!(matches!(
            itp.value(3.0),
            Err(InterpolationError::ExtrapolationDisabled)
        ));
    }

    #[test]
    fn rejects_unsorted_or_short_inputs() {
        assert!(matches!(
            HermiteMonotoneInterpolator::new(vec![1.0], vec![1.0], ExtrapolationMode::Flat),
            Err(InterpolationError::InvalidInput(_))
        ));
        assert!(matches!(
            HermiteMonotoneInterpolator::new(
                vec![1.0, 1.0, 2.0],
                vec![1.0, 2.0, 3.0],
                ExtrapolationMode::Flat
            ),
            Err(InterpolationError::InvalidInput(_))
        ));
        assert!(matches!(
            HermiteMonotoneInterpolator::new(
                vec![1.0, 2.0],
                vec![1.0, 2.0, 3.0],
                ExtrapolationMode::Flat
            ),
            Err(InterpolationError::LengthMismatch {
                expected: 2,
                found: 3
            })
        ));
    }

    #[test]
    fn batched_evaluation_matches_single_lanes_along_any_axis() {
        let xi = [0.0, 0.5, 2.0, 3.0];
        let columns: Array2<f64> = array![
            [0.0, 4.0],
            [1.0, 3.0],
            [1.5, 1.0],
            [4.0, 0.5],
        ];
        let xq = [0.25, 1.0, 2.5];

        let along_rows = pchip_interpolate(&xi, &columns, &xq, 1, 0).unwrap();
        let along_cols = pchip_interpolate(&xi, &columns.t(), &xq, 1, 1).unwrap();
        assert_eq!(along_rows.shape(), &[3, 2]);
        assert_eq!(along_cols.shape(), &[2, 3]);

        for j in 0..2 {
            let itp = HermiteMonotoneInterpolator::new(
                xi.to_vec(),
                columns.column(j).to_vec(),
                ExtrapolationMode::Polynomial,
            )
            .unwrap();
            for (k, &x) in xq.iter().enumerate() {
                let expected = itp.derivative(x).unwrap();
                assert_eq!(along_rows[[k, j]], expected);
                assert_eq!(along_cols[[j, k]], expected);
            }
        }
    }

    #[test]
    fn batched_evaluation_validates_axis_and_length() {
        let yi = array![[1.0, 2.0], [3.0, 4.0]];
        assert!(matches!(
            pchip_interpolate(&[0.0, 1.0], &yi, &[0.5], 0, 2),
            Err(InterpolationError::AxisOutOfBounds { axis: 2, ndim: 2 })
        ));
        assert!(matches!(
            pchip_interpolate(&[0.0, 1.0, 2.0], &yi, &[0.5], 0, 0),
            Err(InterpolationError::LengthMismatch {
                expected: 3,
                found: 2
            })
        ));
    }
}
