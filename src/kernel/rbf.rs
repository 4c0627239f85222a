//! RBF (Radial Basis Function) kernel implementation
//!
//! The RBF kernel is defined as: K(x, y) = exp(-||x - y||² / (2σ²))
//! where σ (sigma) is the bandwidth controlling the kernel width.

use crate::core::{KernelError, Real, Result};
use crate::kernel::Kernel;

/// Gaussian kernel on dense vectors: K(x, y) = exp(-||x - y||² / (2σ²))
///
/// Used as the ground kernel of a path kernel when sequence symbols are
/// feature vectors. `utils::bandwidth::select_sigma` suggests a σ for a
/// collection of such sequences.
#[derive(Debug, Clone, Copy)]
pub struct RbfKernel {
    sigma: f64,
    /// Precomputed -1 / (2σ²)
    scale: f64,
}

impl RbfKernel {
    /// Create a new RBF kernel with bandwidth `sigma`
    ///
    /// # Errors
    /// `InvalidParameter` if sigma is zero or not finite.
    pub fn new(sigma: f64) -> Result<Self> {
        if sigma == 0.0 || !sigma.is_finite() {
            return Err(KernelError::invalid(
                "sigma",
                format!("bandwidth must be non-zero and finite, got {sigma}"),
            ));
        }
        Ok(Self {
            sigma,
            scale: -1.0 / (2.0 * sigma * sigma),
        })
    }

    /// Get the sigma parameter
    pub fn sigma(&self) -> f64 {
        self.sigma
    }

    /// Equivalent gamma in the K(x, y) = exp(-γ ||x - y||²) parameterization
    pub fn gamma(&self) -> f64 {
        -self.scale
    }
}

impl Default for RbfKernel {
    /// Unit bandwidth
    fn default() -> Self {
        Self {
            sigma: 1.0,
            scale: -0.5,
        }
    }
}

impl<R: Real> Kernel<Vec<R>, R> for RbfKernel {
    fn compute(&mut self, x: &Vec<R>, y: &Vec<R>) -> Result<R> {
        let squared_distance = squared_euclidean_distance(x, y)?;
        Ok((R::from_f64(self.scale) * squared_distance).exp())
    }

    fn compute_self(&mut self, x: &Vec<R>) -> Result<R> {
        if x.is_empty() {
            return Err(KernelError::empty("rbf input vector"));
        }
        Ok(R::one())
    }
}

/// Compute squared Euclidean distance between two dense vectors
///
/// ||x - y||² = Σᵢ (xᵢ - yᵢ)²
pub(crate) fn squared_euclidean_distance<R: Real>(x: &[R], y: &[R]) -> Result<R> {
    if x.is_empty() || y.is_empty() {
        return Err(KernelError::empty("rbf input vector"));
    }
    if x.len() != y.len() {
        return Err(KernelError::DimensionMismatch {
            expected: x.len(),
            actual: y.len(),
        });
    }
    Ok(x
        .iter()
        .zip(y)
        .map(|(&a, &b)| {
            let diff = a - b;
            diff * diff
        })
        .sum())
}
