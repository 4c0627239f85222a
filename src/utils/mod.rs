//! Utility functions for kernel matrices

use crate::core::{KernelMatrix, Real};

/// Relative slack for inequality checks on floating-point matrices
const INEQUALITY_SLACK: f64 = 1e-9;

fn exceeds<R: Real>(lhs: R, rhs: R) -> bool {
    let (lhs, rhs) = (lhs.to_f64(), rhs.to_f64());
    lhs > rhs + INEQUALITY_SLACK * (1.0 + rhs.abs())
}

/// Kernel normalization utilities
pub mod normalization {
    use super::*;

    /// Normalize a square kernel matrix in place
    ///
    /// Off-diagonal entries become `m[i][j] / sqrt(m[i][i]·m[j][j])`, the
    /// diagonal becomes 1. Zero entries stay zero. The lower triangle is
    /// mirrored onto the upper one.
    pub fn kernel_to_normalized<R: Real>(matrix: &mut KernelMatrix<R>) {
        let n = matrix.len();
        for i in 0..n {
            for j in 0..i {
                if matrix[i][j] != R::zero() {
                    let value = matrix[i][j] / (matrix[i][i] * matrix[j][j]).sqrt();
                    matrix[i][j] = value;
                    matrix[j][i] = value;
                }
            }
        }
        for (i, row) in matrix.iter_mut().enumerate() {
            if row[i] != R::zero() {
                row[i] = R::one();
            }
        }
    }
}

/// Kernel-induced distances
///
/// `d(x, y) = sqrt(k(x, x) + k(y, y) - 2k(x, y))`. Negative radicands from
/// rounding are clamped to zero.
pub mod distance {
    use super::*;
    use crate::core::Result;
    use crate::kernel::Kernel;

    fn from_kernel_values<R: Real>(xx: R, yy: R, xy: R) -> R {
        let radicand = xx + yy - (xy + xy);
        if radicand > R::zero() {
            radicand.sqrt()
        } else {
            R::zero()
        }
    }

    /// Distance between two inputs under `kernel`
    pub fn kernel_distance<X, R: Real, K: Kernel<X, R> + ?Sized>(
        kernel: &mut K,
        x: &X,
        y: &X,
    ) -> Result<R> {
        let xy = kernel.compute(x, y)?;
        let xx = kernel.compute_self(x)?;
        let yy = kernel.compute_self(y)?;
        Ok(from_kernel_values(xx, yy, xy))
    }

    /// Cross distance matrix `d[i][j] = d(xs[i], ys[j])`
    pub fn distance_matrix<X, R: Real, K: Kernel<X, R> + ?Sized>(
        kernel: &mut K,
        xs: &[X],
        ys: &[X],
    ) -> Result<KernelMatrix<R>> {
        let mut matrix = kernel.compute_matrix(xs, ys)?;
        let x_diag = kernel.compute_diagonal(xs)?;
        let y_diag = kernel.compute_diagonal(ys)?;
        for (row, &xx) in matrix.iter_mut().zip(&x_diag) {
            for (cell, &yy) in row.iter_mut().zip(&y_diag) {
                *cell = from_kernel_values(xx, yy, *cell);
            }
        }
        Ok(matrix)
    }

    /// Symmetric distance matrix over one input list
    pub fn distance_gram<X, R: Real, K: Kernel<X, R> + ?Sized>(
        kernel: &mut K,
        xs: &[X],
    ) -> Result<KernelMatrix<R>> {
        let mut matrix = kernel.compute_gram(xs)?;
        kernel_to_distance(&mut matrix);
        Ok(matrix)
    }

    /// Turn a square kernel matrix into a distance matrix in place
    pub fn kernel_to_distance<R: Real>(matrix: &mut KernelMatrix<R>) {
        let n = matrix.len();
        for i in 0..n {
            for j in 0..i {
                let xy = (matrix[i][j] + matrix[j][i]) / R::from_f64(2.0);
                let value = from_kernel_values(matrix[i][i], matrix[j][j], xy);
                matrix[i][j] = value;
                matrix[j][i] = value;
            }
        }
        for (i, row) in matrix.iter_mut().enumerate() {
            row[i] = R::zero();
        }
    }
}

/// Structural checks on kernel and distance matrices
pub mod validation {
    use super::*;

    /// Every row has as many entries as there are rows
    pub fn is_square<R: Real>(matrix: &KernelMatrix<R>) -> bool {
        let n = matrix.len();
        matrix.iter().all(|row| row.len() == n)
    }

    /// Square and exactly symmetric
    pub fn is_symmetric<R: Real>(matrix: &KernelMatrix<R>) -> bool {
        if !is_square(matrix) {
            return false;
        }
        (0..matrix.len()).all(|i| (0..i).all(|j| matrix[i][j] == matrix[j][i]))
    }

    /// `d[i][j] <= d[i][k] + d[k][j]` for every triple of a symmetric
    /// distance matrix
    pub fn respects_triangle_inequality<R: Real>(distances: &KernelMatrix<R>) -> bool {
        if !is_symmetric(distances) {
            return false;
        }
        let n = distances.len();
        for i in 0..n {
            for j in 0..n {
                for k in 0..n {
                    if exceeds(distances[i][j], distances[i][k] + distances[k][j]) {
                        return false;
                    }
                }
            }
        }
        true
    }

    /// `k[i][j]² <= k[i][i]·k[j][j]` for every pair of a symmetric kernel
    /// matrix
    pub fn respects_cauchy_schwarz<R: Real>(matrix: &KernelMatrix<R>) -> bool {
        if !is_symmetric(matrix) {
            return false;
        }
        for i in 0..matrix.len() {
            for j in 0..i {
                if exceeds(matrix[i][j] * matrix[i][j], matrix[i][i] * matrix[j][j]) {
                    return false;
                }
            }
        }
        true
    }
}

/// RBF bandwidth selection for sequence data
pub mod bandwidth {
    use crate::core::{KernelError, Result};
    use crate::kernel::rbf::squared_euclidean_distance;
    use log::debug;
    use rand::Rng;

    /// Suggest a σ for an RBF ground kernel inside a path kernel
    ///
    /// Draws `samples` random pairs of symbols (each symbol from a random
    /// non-empty sequence) and returns the median of their Euclidean
    /// distances. `None` samples `floor(sqrt(total symbols))` pairs.
    pub fn select_sigma<G: Rng + ?Sized>(
        sequences: &[Vec<Vec<f64>>],
        samples: Option<usize>,
        rng: &mut G,
    ) -> Result<f64> {
        let populated: Vec<&Vec<Vec<f64>>> = sequences.iter().filter(|s| !s.is_empty()).collect();
        if populated.is_empty() {
            return Err(KernelError::empty("bandwidth selection sequences"));
        }

        let total: usize = populated.iter().map(|s| s.len()).sum();
        let samples = match samples {
            Some(0) => {
                return Err(KernelError::invalid(
                    "samples",
                    "must draw at least one pair",
                ))
            }
            Some(n) => n,
            None => ((total as f64).sqrt().floor() as usize).max(1),
        };

        let mut distances = Vec::with_capacity(samples);
        for _ in 0..samples {
            let a = populated[rng.gen_range(0..populated.len())];
            let b = populated[rng.gen_range(0..populated.len())];
            let x = &a[rng.gen_range(0..a.len())];
            let y = &b[rng.gen_range(0..b.len())];
            distances.push(squared_euclidean_distance(x, y)?.sqrt());
        }

        distances.sort_by(|a, b| a.total_cmp(b));
        let sigma = distances[distances.len() / 2];
        debug!("Selected sigma {sigma} from {samples} symbol pairs");
        Ok(sigma)
    }
}
