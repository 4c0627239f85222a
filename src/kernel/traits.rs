//! Kernel trait definition

use crate::core::{KernelError, KernelMatrix, Real, Result};

/// Kernel function trait
///
/// A kernel K(x, y) evaluated on inputs of type `X`, producing values of
/// type `R`. Evaluation takes `&mut self` because some kernels (the path
/// kernel in particular) grow internal tables while they evaluate.
///
/// Only `compute` is required. The batched forms default to repeated
/// single evaluations; kernels override them when a cheaper route exists.
pub trait Kernel<X, R: Real = f64> {
    /// Compute kernel value K(x, y)
    fn compute(&mut self, x: &X, y: &X) -> Result<R>;

    /// Compute K(x, x)
    fn compute_self(&mut self, x: &X) -> Result<R> {
        self.compute(x, x)
    }

    /// Compute the full cross matrix `m[i][j] = K(xs[i], ys[j])`
    ///
    /// No symmetry is assumed.
    fn compute_matrix(&mut self, xs: &[X], ys: &[X]) -> Result<KernelMatrix<R>> {
        if xs.is_empty() || ys.is_empty() {
            return Err(KernelError::empty("kernel matrix input list"));
        }
        let mut matrix = Vec::with_capacity(xs.len());
        for x in xs {
            let mut row = Vec::with_capacity(ys.len());
            for y in ys {
                row.push(self.compute(x, y)?);
            }
            matrix.push(row);
        }
        Ok(matrix)
    }

    /// Compute the symmetric Gram matrix `m[i][j] = K(xs[i], xs[j])`
    ///
    /// Only the diagonal and one triangle are evaluated.
    fn compute_gram(&mut self, xs: &[X]) -> Result<KernelMatrix<R>> {
        if xs.is_empty() {
            return Err(KernelError::empty("gram matrix input list"));
        }
        let n = xs.len();
        let mut matrix = vec![vec![R::zero(); n]; n];
        for i in 0..n {
            matrix[i][i] = self.compute_self(&xs[i])?;
            for j in 0..i {
                let value = self.compute(&xs[i], &xs[j])?;
                matrix[i][j] = value;
                matrix[j][i] = value;
            }
        }
        Ok(matrix)
    }

    /// Compute the diagonal `v[i] = K(xs[i], xs[i])`
    fn compute_diagonal(&mut self, xs: &[X]) -> Result<Vec<R>> {
        if xs.is_empty() {
            return Err(KernelError::empty("diagonal input list"));
        }
        xs.iter().map(|x| self.compute_self(x)).collect()
    }
}

/// Borrowing a kernel is as good as owning it
impl<X, R: Real, K: Kernel<X, R> + ?Sized> Kernel<X, R> for &mut K {
    fn compute(&mut self, x: &X, y: &X) -> Result<R> {
        (**self).compute(x, y)
    }

    fn compute_self(&mut self, x: &X) -> Result<R> {
        (**self).compute_self(x)
    }

    fn compute_matrix(&mut self, xs: &[X], ys: &[X]) -> Result<KernelMatrix<R>> {
        (**self).compute_matrix(xs, ys)
    }

    fn compute_gram(&mut self, xs: &[X]) -> Result<KernelMatrix<R>> {
        (**self).compute_gram(xs)
    }

    fn compute_diagonal(&mut self, xs: &[X]) -> Result<Vec<R>> {
        (**self).compute_diagonal(xs)
    }
}
