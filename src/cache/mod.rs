//! Path-kernel weight matrix
//!
//! The path kernel weighs every position pair `(i, j)` of two sequences by
//! the number of alignment paths through it, discounted by the step costs.
//! Those weights only depend on `(CHV, CD)`, so a single table is grown on
//! demand and reused across all evaluations:
//!
//! ```text
//! W[0][0] = 1
//! W[i][0] = W[0][i] = CHV * W[i-1][0]
//! W[i][j] = W[j][i] = CHV * (W[i-1][j] + W[i][j-1]) + CD * W[i-1][j-1]
//! ```
//!
//! Growth only computes the cells introduced by the new dimension. Cells are
//! always evaluated with the same operands in the same order, so a table
//! grown in steps is bit-identical to one grown in a single call.

use crate::core::types::validate_step_cost;
use crate::core::{KernelError, Result};
use log::debug;

/// Growable, symmetric table of path weights for one pair of step costs
#[derive(Debug, Clone)]
pub struct WeightMatrix {
    chv: f64,
    cd: f64,
    dim: usize,
    /// Row-major `dim * dim` values
    values: Vec<f64>,
    extensions: u64,
    cells_computed: u64,
}

impl WeightMatrix {
    /// Create a `1x1` table for the given step costs
    ///
    /// # Errors
    /// `InvalidParameter` if either cost is not strictly positive and finite.
    pub fn new(chv: f64, cd: f64) -> Result<Self> {
        validate_step_cost("chv", chv)?;
        validate_step_cost("cd", cd)?;
        Ok(Self {
            chv,
            cd,
            dim: 1,
            values: vec![1.0],
            extensions: 0,
            cells_computed: 0,
        })
    }

    /// Horizontal/vertical and diagonal step costs
    pub fn step_costs(&self) -> (f64, f64) {
        (self.chv, self.cd)
    }

    /// Current dimension of the table
    pub fn dimension(&self) -> usize {
        self.dim
    }

    /// Weight of position pair `(i, j)`
    ///
    /// # Panics
    /// Panics if `i` or `j` is not below `dimension()`.
    #[inline]
    pub fn get(&self, i: usize, j: usize) -> f64 {
        assert!(
            i < self.dim && j < self.dim,
            "Weight index ({i}, {j}) out of range for dimension {}",
            self.dim
        );
        self.values[i * self.dim + j]
    }

    /// Averaged weight of `(i, j)` inside an `ls x lt` alignment grid
    ///
    /// Combines the prefix-anchored weight `W[i][j]` with the
    /// suffix-anchored weight `W[ls-i-1][lt-j-1]`.
    #[inline]
    pub fn path_weight(&self, i: usize, j: usize, ls: usize, lt: usize) -> f64 {
        (self.get(i, j) + self.get(ls - i - 1, lt - j - 1)) / 2.0
    }

    /// Row-major view of all `dimension()^2` values
    pub fn as_slice(&self) -> &[f64] {
        &self.values
    }

    /// Independent copy of the current table
    pub fn snapshot(&self) -> WeightSnapshot {
        WeightSnapshot {
            dim: self.dim,
            values: self.values.clone(),
        }
    }

    /// Growth statistics
    pub fn stats(&self) -> WeightStats {
        WeightStats {
            dimension: self.dim,
            extensions: self.extensions,
            cells_computed: self.cells_computed,
        }
    }

    /// Grow the table to `target` rows and columns
    ///
    /// No-op when `target <= dimension()`. Existing cells are never
    /// recomputed; the cost is proportional to `target^2 - dimension()^2`.
    ///
    /// # Panics
    /// Panics if a `target x target` table cannot be allocated; use
    /// [`WeightMatrix::try_extend`] for caller-supplied dimensions.
    pub fn extend(&mut self, target: usize) {
        if let Err(e) = self.try_extend(target) {
            panic!("{e}");
        }
    }

    /// Fallible [`WeightMatrix::extend`]
    ///
    /// # Errors
    /// `InvalidParameter` if `target * target` cells overflow or cannot be
    /// allocated. The table is left unchanged.
    pub fn try_extend(&mut self, target: usize) -> Result<()> {
        if target <= self.dim {
            return Ok(());
        }
        let old = self.dim;
        self.relayout(target)?;

        // First row and column.
        for i in old..target {
            let value = self.chv * self.at(i - 1, 0);
            self.set_symmetric(i, 0, value);
        }

        // Old rows against new columns.
        for i in 1..old {
            for j in old..target {
                let value = self.step(i, j);
                self.set_symmetric(i, j, value);
            }
        }

        // New rows: diagonal, then the remainder of the upper triangle.
        for i in old..target {
            let diagonal = 2.0 * self.chv * self.at(i - 1, i) + self.cd * self.at(i - 1, i - 1);
            self.set_symmetric(i, i, diagonal);
            for j in (i + 1)..target {
                let value = self.step(i, j);
                self.set_symmetric(i, j, value);
            }
        }

        let computed = (target * target - old * old) as u64;
        self.extensions += 1;
        self.cells_computed += computed;
        debug!(
            "Extended weight matrix (chv={}, cd={}) from {} to {} ({} cells)",
            self.chv, self.cd, old, target, computed
        );
        Ok(())
    }

    /// Replace the table with a larger one read from a cache record
    ///
    /// The record must be square, larger than the current table, and its
    /// leading cells must match what these step costs produce.
    pub(crate) fn restore(&mut self, dim: usize, values: Vec<f64>) -> Result<()> {
        if dim <= self.dim {
            return Err(KernelError::CorruptCache(format!(
                "record dimension {dim} does not exceed current dimension {}",
                self.dim
            )));
        }
        if dim.checked_mul(dim) != Some(values.len()) {
            return Err(KernelError::CorruptCache(format!(
                "expected {dim}x{dim} values, found {}",
                values.len()
            )));
        }

        let mut reference = Self::new(self.chv, self.cd)?;
        reference.extend(dim.min(2));
        for i in 0..reference.dim {
            for j in 0..reference.dim {
                if values[i * dim + j].to_bits() != reference.at(i, j).to_bits() {
                    return Err(KernelError::CorruptCache(format!(
                        "cell ({i}, {j}) does not match step costs chv={}, cd={}",
                        self.chv, self.cd
                    )));
                }
            }
        }

        self.dim = dim;
        self.values = values;
        Ok(())
    }

    #[inline]
    fn at(&self, i: usize, j: usize) -> f64 {
        self.values[i * self.dim + j]
    }

    #[inline]
    fn step(&self, i: usize, j: usize) -> f64 {
        self.chv * (self.at(i - 1, j) + self.at(i, j - 1)) + self.cd * self.at(i - 1, j - 1)
    }

    #[inline]
    fn set_symmetric(&mut self, i: usize, j: usize, value: f64) {
        let dim = self.dim;
        self.values[i * dim + j] = value;
        self.values[j * dim + i] = value;
    }

    /// Move the existing rows into a `target x target` buffer
    fn relayout(&mut self, target: usize) -> Result<()> {
        let too_large = || {
            KernelError::invalid(
                "dimension",
                format!("a {target}x{target} weight matrix cannot be allocated"),
            )
        };
        let cells = target.checked_mul(target).ok_or_else(too_large)?;
        let mut values = Vec::new();
        values.try_reserve_exact(cells).map_err(|_| too_large())?;
        values.resize(cells, 0.0);

        let old = self.dim;
        for (i, row) in self.values.chunks_exact(old).enumerate() {
            values[i * target..i * target + old].copy_from_slice(row);
        }
        self.values = values;
        self.dim = target;
        Ok(())
    }
}

/// Immutable copy of a weight matrix at some point in time
#[derive(Debug, Clone, PartialEq)]
pub struct WeightSnapshot {
    dim: usize,
    values: Vec<f64>,
}

impl WeightSnapshot {
    /// Dimension at the time the snapshot was taken
    pub fn dimension(&self) -> usize {
        self.dim
    }

    /// Weight of position pair `(i, j)`
    ///
    /// # Panics
    /// Panics if `i` or `j` is not below `dimension()`.
    pub fn get(&self, i: usize, j: usize) -> f64 {
        assert!(i < self.dim && j < self.dim, "Weight index out of range");
        self.values[i * self.dim + j]
    }

    /// Row-major view of all values
    pub fn as_slice(&self) -> &[f64] {
        &self.values
    }

    /// Copy into nested rows
    pub fn to_rows(&self) -> Vec<Vec<f64>> {
        self.values
            .chunks_exact(self.dim)
            .map(|row| row.to_vec())
            .collect()
    }
}

/// Weight matrix growth statistics
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WeightStats {
    pub dimension: usize,
    pub extensions: u64,
    pub cells_computed: u64,
}
