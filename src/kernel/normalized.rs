//! Normalizing kernel wrapper
//!
//! K̂(x, y) = K(x, y) / sqrt(K(x, x) · K(y, y))
//!
//! Zero kernel values are left at zero so that inputs with a null self
//! similarity do not produce NaN.

use crate::core::{KernelMatrix, Real, Result};
use crate::kernel::Kernel;
use crate::utils::normalization::kernel_to_normalized;

/// Cosine-normalized view of another kernel
#[derive(Debug, Clone)]
pub struct NormalizedKernel<K> {
    inner: K,
}

impl<K> NormalizedKernel<K> {
    /// Wrap `inner`; pass `&mut kernel` to borrow instead of move
    pub fn new(inner: K) -> Self {
        Self { inner }
    }

    /// Wrapped kernel
    pub fn inner(&self) -> &K {
        &self.inner
    }

    /// Wrapped kernel, mutably
    pub fn inner_mut(&mut self) -> &mut K {
        &mut self.inner
    }

    /// Unwrap
    pub fn into_inner(self) -> K {
        self.inner
    }
}

impl<X, R: Real, K: Kernel<X, R>> Kernel<X, R> for NormalizedKernel<K> {
    fn compute(&mut self, x: &X, y: &X) -> Result<R> {
        let k = self.inner.compute(x, y)?;
        if k == R::zero() {
            return Ok(k);
        }
        let kx = self.inner.compute_self(x)?;
        let ky = self.inner.compute_self(y)?;
        Ok(k / (kx * ky).sqrt())
    }

    fn compute_self(&mut self, x: &X) -> Result<R> {
        let k = self.inner.compute_self(x)?;
        Ok(if k == R::zero() { k } else { R::one() })
    }

    fn compute_matrix(&mut self, xs: &[X], ys: &[X]) -> Result<KernelMatrix<R>> {
        let mut matrix = self.inner.compute_matrix(xs, ys)?;
        let dx = self.inner.compute_diagonal(xs)?;
        let dy = self.inner.compute_diagonal(ys)?;
        for (row, &kx) in matrix.iter_mut().zip(&dx) {
            for (value, &ky) in row.iter_mut().zip(&dy) {
                if *value != R::zero() {
                    *value = *value / (kx * ky).sqrt();
                }
            }
        }
        Ok(matrix)
    }

    fn compute_gram(&mut self, xs: &[X]) -> Result<KernelMatrix<R>> {
        let mut matrix = self.inner.compute_gram(xs)?;
        kernel_to_normalized(&mut matrix);
        Ok(matrix)
    }

    fn compute_diagonal(&mut self, xs: &[X]) -> Result<Vec<R>> {
        let diagonal = self.inner.compute_diagonal(xs)?;
        Ok(diagonal
            .into_iter()
            .map(|k| if k == R::zero() { k } else { R::one() })
            .collect())
    }
}
