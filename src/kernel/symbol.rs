//! Label-similarity kernel
//!
//! Kernel on labeled data where symbols are indices `0..n` into a
//! pre-computed, symmetric table of label similarities.

use crate::core::{KernelError, KernelMatrix, Real, Result};
use crate::kernel::Kernel;

/// Table-lookup kernel over label indices
#[derive(Debug, Clone, PartialEq)]
pub struct SymbolKernel {
    table: Vec<Vec<f64>>,
}

impl SymbolKernel {
    /// Create a kernel from a square, symmetric similarity table
    ///
    /// # Errors
    /// `InvalidParameter` if the table is empty, not square or not symmetric.
    pub fn new(table: Vec<Vec<f64>>) -> Result<Self> {
        let n = table.len();
        if n == 0 {
            return Err(KernelError::invalid("table", "similarity table is empty"));
        }
        for (i, row) in table.iter().enumerate() {
            if row.len() != n {
                return Err(KernelError::invalid(
                    "table",
                    format!("row {i} has {} entries, expected {n}", row.len()),
                ));
            }
        }
        for i in 0..n {
            for j in 0..i {
                if table[i][j] != table[j][i] {
                    return Err(KernelError::invalid(
                        "table",
                        format!("entries ({i}, {j}) and ({j}, {i}) differ"),
                    ));
                }
            }
        }
        Ok(Self { table })
    }

    /// Kronecker delta over `n` labels: 1 for equal labels, 0 otherwise
    pub fn identity(n: usize) -> Result<Self> {
        if n == 0 {
            return Err(KernelError::invalid(
                "n",
                "number of labels must be positive",
            ));
        }
        let table = (0..n)
            .map(|i| (0..n).map(|j| if i == j { 1.0 } else { 0.0 }).collect())
            .collect();
        Ok(Self { table })
    }

    /// Number of labels
    pub fn len(&self) -> usize {
        self.table.len()
    }

    /// Always false; construction rejects empty tables
    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    #[inline]
    fn lookup(&self, i: usize, j: usize) -> Result<f64> {
        let len = self.table.len();
        for index in [i, j] {
            if index >= len {
                return Err(KernelError::IndexOutOfRange { index, len });
            }
        }
        Ok(self.table[i][j])
    }

    fn check_all(&self, indices: &[usize]) -> Result<()> {
        let len = self.table.len();
        match indices.iter().find(|&&index| index >= len) {
            Some(&index) => Err(KernelError::IndexOutOfRange { index, len }),
            None => Ok(()),
        }
    }
}

impl<R: Real> Kernel<usize, R> for SymbolKernel {
    fn compute(&mut self, x: &usize, y: &usize) -> Result<R> {
        self.lookup(*x, *y).map(R::from_f64)
    }

    fn compute_self(&mut self, x: &usize) -> Result<R> {
        self.lookup(*x, *x).map(R::from_f64)
    }

    fn compute_matrix(&mut self, xs: &[usize], ys: &[usize]) -> Result<KernelMatrix<R>> {
        if xs.is_empty() || ys.is_empty() {
            return Err(KernelError::empty("label index list"));
        }
        self.check_all(xs)?;
        self.check_all(ys)?;
        Ok(xs
            .iter()
            .map(|&i| ys.iter().map(|&j| R::from_f64(self.table[i][j])).collect())
            .collect())
    }

    fn compute_gram(&mut self, xs: &[usize]) -> Result<KernelMatrix<R>> {
        if xs.is_empty() {
            return Err(KernelError::empty("label index list"));
        }
        self.check_all(xs)?;
        Ok(xs
            .iter()
            .map(|&i| xs.iter().map(|&j| R::from_f64(self.table[i][j])).collect())
            .collect())
    }

    fn compute_diagonal(&mut self, xs: &[usize]) -> Result<Vec<R>> {
        if xs.is_empty() {
            return Err(KernelError::empty("label index list"));
        }
        self.check_all(xs)?;
        Ok(xs.iter().map(|&i| R::from_f64(self.table[i][i])).collect())
    }
}
