//! Library-wide error type and kernel identifiers.

use std::fmt;

use crate::math::InterpolationError;

/// Transcendental kernels evaluated by [`crate::math::kernels`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum Kernel {
    /// `Lambda(x) = -i e^{ix}/x + (e^{ix} - 1)/x^2`.
    Lambda,
    /// `Phi(x)`, weight of the sampled values in a Filon panel.
    Phi,
    /// `Psi(x)`, weight of the sampled derivatives in a Filon panel.
    Psi,
}

impl fmt::Display for Kernel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Lambda => f.write_str("lambda"),
            Self::Phi => f.write_str("phi"),
            Self::Psi => f.write_str("psi"),
        }
    }
}

/// Errors surfaced by the Fourier-integral API.
#[derive(Debug, Clone, PartialEq)]
pub enum FourierError {
    /// Input validation error (ordering, shapes, unsupported times).
    InvalidInput(String),
    /// A Taylor series did not meet its remaining-term bound within the iteration cap.
    NonConvergence {
        /// Kernel whose series failed.
        kernel: Kernel,
        /// Number of series terms summed before giving up.
        iterations: usize,
    },
    /// The monotone cubic interpolation primitive rejected its inputs.
    Interpolation(InterpolationError),
}

impl fmt::Display for FourierError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidInput(msg) => write!(f, "invalid input: {msg}"),
            Self::NonConvergence { kernel, iterations } => write!(
                f,
                "{kernel} taylor series failed to converge after {iterations} iterations"
            ),
            Self::Interpolation(err) => write!(f, "interpolation error: {err}"),
        }
    }
}

impl std::error::Error for FourierError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Interpolation(err) => Some(err),
            _ => None,
        }
    }
}

impl From<InterpolationError> for FourierError {
    fn from(err: InterpolationError) -> Self {
        Self::Interpolation(err)
    }
}
