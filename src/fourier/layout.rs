//! Axis layout of the quadrature tensors.
//!
//! Intermediate arrays are indexed `(time, sub-interval, feature)`. The feature
//! axis is the row-major flattening of every trailing axis of the sampled
//! function, so sampled data becomes a `(frequency, feature)` matrix and the
//! result a `(time, feature)` matrix before the trailing shape is restored.

use ndarray::{Array, Array2, ArrayBase, ArrayD, Axis, Data, Dimension, IxDyn};
use num_complex::Complex;

use crate::core::FourierError;

/// Trailing ("function output") shape of a sample array.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct FeatureLayout {
    trailing: Vec<usize>,
}

impl FeatureLayout {
    /// Reads the layout of an array whose axis 0 runs over frequencies.
    pub(crate) fn of<S, D>(samples: &ArrayBase<S, D>) -> Result<Self, FourierError>
    where
        S: Data<Elem = Complex<f64>>,
        D: Dimension,
    {
        if samples.ndim() == 0 {
            return Err(FourierError::InvalidInput(
                "function values need a frequency axis (rank >= 1)".to_string(),
            ));
        }
        Ok(Self {
            trailing: samples.shape()[1..].to_vec(),
        })
    }

    pub(crate) fn features(&self) -> usize {
        self.trailing.iter().product()
    }

    /// Collapses `(N, ...trailing)` into `(N, features)`.
    pub(crate) fn flatten<S, D>(
        &self,
        samples: &ArrayBase<S, D>,
    ) -> Result<Array2<Complex<f64>>, FourierError>
    where
        S: Data<Elem = Complex<f64>>,
        D: Dimension,
    {
        let rows = samples.len_of(Axis(0));
        Array2::from_shape_vec((rows, self.features()), samples.iter().copied().collect())
            .map_err(|err| FourierError::InvalidInput(format!("cannot flatten samples: {err}")))
    }

    /// Expands `(M, features)` back into `(M, ...trailing)` with dimension type `D`.
    pub(crate) fn restore<S, D>(
        &self,
        flat: &ArrayBase<S, ndarray::Ix2>,
    ) -> Result<Array<Complex<f64>, D>, FourierError>
    where
        S: Data<Elem = Complex<f64>>,
        D: Dimension,
    {
        let mut shape = Vec::with_capacity(self.trailing.len() + 1);
        shape.push(flat.nrows());
        shape.extend_from_slice(&self.trailing);

        ArrayD::from_shape_vec(IxDyn(&shape), flat.iter().copied().collect())
            .map_err(|err| FourierError::InvalidInput(format!("cannot restore shape: {err}")))?
            .into_dimensionality::<D>()
            .map_err(|err| FourierError::InvalidInput(format!("cannot restore rank: {err}")))
    }
}
