//! Path kernel on sequences
//!
//! For non-empty sequences s and t the path kernel is
//!
//! ```text
//! K(s, t) = k(s₁, t₁) + CHV·K(s₂:, t) + CHV·K(s, t₂:) + CD·K(s₂:, t₂:)
//! ```
//!
//! with k the ground kernel on symbols. Unrolling the recursion turns it into
//! a weighted sum over all symbol pairs, with weight `W[i][j]` for the pair
//! `(sᵢ, tⱼ)`, where W is the [`WeightMatrix`] for (CHV, CD). Unrolling it
//! from the back of both sequences gives the mirrored weights instead. The
//! kernel takes the mean of both:
//!
//! ```text
//! K(s, t) = Σᵢ Σⱼ k(sᵢ, tⱼ) · (W[i][j] + W[|s|-i-1][|t|-j-1]) / 2
//! ```
//!
//! The weight matrix is grown to the longest sequence seen so far and kept
//! for the lifetime of the kernel; a [`WeightStore`] can persist it across
//! runs.

use crate::cache::{WeightMatrix, WeightSnapshot, WeightStats};
use crate::core::{KernelError, KernelMatrix, Real, Result, DEFAULT_CD, DEFAULT_CHV};
use crate::kernel::Kernel;
use crate::persistence::WeightStore;
use std::marker::PhantomData;
use std::path::{Path, PathBuf};

/// Path kernel over sequences of symbols accepted by the ground kernel `K`
///
/// `R` is the numeric type of the produced values. The ground kernel may be
/// owned or borrowed: `PathKernel::new(&mut rbf)` borrows `rbf` for the
/// lifetime of the path kernel.
///
/// # Examples
///
/// ```
/// use pathkernel::{PathKernel, SymbolKernel};
///
/// let mut path = PathKernel::with_step_costs(SymbolKernel::identity(2)?, 0.3, 0.4)?;
/// let value = path.pairwise(&[0, 1], &[0, 1])?;
/// assert!((value - 1.58).abs() < 1e-12);
/// # Ok::<(), pathkernel::KernelError>(())
/// ```
#[derive(Debug)]
pub struct PathKernel<K, R: Real = f64> {
    ground: K,
    weights: WeightMatrix,
    store: WeightStore,
    _precision: PhantomData<fn() -> R>,
}

impl<K> PathKernel<K> {
    /// Path kernel with the default step costs (CHV = 0.9/3, CD = 1.1/3)
    pub fn new(ground: K) -> Self {
        Self {
            ground,
            weights: default_weights(),
            store: WeightStore::disabled(),
            _precision: PhantomData,
        }
    }

    /// Path kernel with explicit step costs
    ///
    /// # Errors
    /// `InvalidParameter` if either cost is not strictly positive and finite.
    pub fn with_step_costs(ground: K, chv: f64, cd: f64) -> Result<Self> {
        Self::try_new(ground, chv, cd)
    }
}

impl<K, R: Real> PathKernel<K, R> {
    /// Path kernel producing values of type `R`
    ///
    /// # Errors
    /// `InvalidParameter` if either cost is not strictly positive and finite.
    pub fn try_new(ground: K, chv: f64, cd: f64) -> Result<Self> {
        Ok(Self {
            ground,
            weights: WeightMatrix::new(chv, cd)?,
            store: WeightStore::disabled(),
            _precision: PhantomData,
        })
    }

    /// Horizontal/vertical and diagonal step costs
    pub fn step_costs(&self) -> (f64, f64) {
        self.weights.step_costs()
    }

    /// Current dimension of the weight matrix
    pub fn dimension(&self) -> usize {
        self.weights.dimension()
    }

    /// Copy of the current weight matrix
    pub fn weights(&self) -> WeightSnapshot {
        self.weights.snapshot()
    }

    /// Weight matrix growth statistics
    pub fn weight_stats(&self) -> WeightStats {
        self.weights.stats()
    }

    /// Grow the weight matrix ahead of time; no-op if already large enough
    ///
    /// # Panics
    /// Panics if the table cannot be allocated; see [`PathKernel::try_extend`].
    pub fn extend(&mut self, dimension: usize) {
        self.weights.extend(dimension);
    }

    /// Grow the weight matrix ahead of time, reporting allocation failure
    ///
    /// # Errors
    /// `InvalidParameter` if a `dimension x dimension` table cannot be
    /// allocated.
    pub fn try_extend(&mut self, dimension: usize) -> Result<()> {
        self.weights.try_extend(dimension)
    }

    /// Ground kernel
    pub fn ground(&self) -> &K {
        &self.ground
    }

    /// Ground kernel, mutably
    pub fn ground_mut(&mut self) -> &mut K {
        &mut self.ground
    }

    /// Release the ground kernel
    pub fn into_ground(self) -> K {
        self.ground
    }

    /// Point the weight cache at `directory`
    ///
    /// The directory grants read permission; `writable` also grants write
    /// permission.
    pub fn set_cache_dir<P: Into<PathBuf>>(&mut self, directory: P, writable: bool) {
        self.store.configure(directory, writable);
    }

    /// Configured cache directory
    pub fn cache_dir(&self) -> Option<&Path> {
        self.store.directory()
    }

    /// Path of the cache record for this kernel's step costs
    pub fn cache_record(&self) -> Option<PathBuf> {
        let (chv, cd) = self.step_costs();
        self.store.record_path(chv, cd)
    }

    /// Persist the weight matrix
    ///
    /// Does nothing, and returns `false`, if no directory is configured, the
    /// store is read-only, a record of equal or larger dimension already
    /// exists, or the write fails.
    pub fn save_weights(&self) -> bool {
        self.store.save(&self.weights)
    }

    /// Load a larger weight matrix from the cache
    ///
    /// Does nothing, and returns `false`, if no directory is configured, no
    /// valid record exists, or the record is not larger than the current
    /// matrix.
    pub fn load_weights(&mut self) -> bool {
        self.store.load(&mut self.weights)
    }

    /// K(s, t)
    ///
    /// # Errors
    /// `EmptyInput` if either sequence is empty; ground kernel errors are
    /// propagated.
    pub fn pairwise<S>(&mut self, s: &[S], t: &[S]) -> Result<R>
    where
        K: Kernel<S, R>,
    {
        let (ls, lt) = (s.len(), t.len());
        if ls == 0 || lt == 0 {
            return Err(KernelError::empty("path kernel sequence"));
        }
        self.weights.try_extend(ls.max(lt))?;
        let symbols = self.ground.compute_matrix(s, t)?;

        let mut k = R::zero();
        for (i, row) in symbols.iter().enumerate() {
            for (j, &value) in row.iter().enumerate() {
                k += value * R::from_f64(self.weights.path_weight(i, j, ls, lt));
            }
        }
        Ok(k)
    }

    /// K(s, s), evaluating the ground kernel on one triangle only
    ///
    /// # Errors
    /// `EmptyInput` if the sequence is empty; ground kernel errors are
    /// propagated.
    pub fn self_kernel<S>(&mut self, s: &[S]) -> Result<R>
    where
        K: Kernel<S, R>,
    {
        let ls = s.len();
        if ls == 0 {
            return Err(KernelError::empty("path kernel sequence"));
        }
        self.weights.try_extend(ls)?;
        let symbols = self.ground.compute_gram(s)?;

        let two = R::from_f64(2.0);
        let mut k = R::zero();
        for i in 0..ls {
            k += symbols[i][i] * R::from_f64(self.weights.path_weight(i, i, ls, ls));
            for j in (i + 1)..ls {
                k += two * symbols[i][j] * R::from_f64(self.weights.path_weight(i, j, ls, ls));
            }
        }
        Ok(k)
    }

    /// Cross matrix `m[i][j] = K(slist[i], tlist[j])`
    ///
    /// # Errors
    /// `EmptyInput` if either list, or any sequence in them, is empty.
    pub fn pairwise_matrix<S>(&mut self, slist: &[Vec<S>], tlist: &[Vec<S>]) -> Result<KernelMatrix<R>>
    where
        K: Kernel<S, R>,
    {
        if slist.is_empty() || tlist.is_empty() {
            return Err(KernelError::empty("sequence list"));
        }
        self.reserve(slist.iter().chain(tlist))?;
        let mut matrix = Vec::with_capacity(slist.len());
        for s in slist {
            let mut row = Vec::with_capacity(tlist.len());
            for t in tlist {
                row.push(self.pairwise(s, t)?);
            }
            matrix.push(row);
        }
        Ok(matrix)
    }

    /// Symmetric Gram matrix `m[i][j] = K(slist[i], slist[j])`
    ///
    /// # Errors
    /// `EmptyInput` if the list, or any sequence in it, is empty.
    pub fn self_matrix<S>(&mut self, slist: &[Vec<S>]) -> Result<KernelMatrix<R>>
    where
        K: Kernel<S, R>,
    {
        if slist.is_empty() {
            return Err(KernelError::empty("sequence list"));
        }
        self.reserve(slist.iter())?;
        let n = slist.len();
        let mut matrix = vec![vec![R::zero(); n]; n];
        for i in 0..n {
            matrix[i][i] = self.self_kernel(&slist[i])?;
            for j in 0..i {
                let value = self.pairwise(&slist[i], &slist[j])?;
                matrix[i][j] = value;
                matrix[j][i] = value;
            }
        }
        Ok(matrix)
    }

    /// Diagonal `v[i] = K(slist[i], slist[i])`
    ///
    /// # Errors
    /// `EmptyInput` if the list, or any sequence in it, is empty.
    pub fn self_vector<S>(&mut self, slist: &[Vec<S>]) -> Result<Vec<R>>
    where
        K: Kernel<S, R>,
    {
        if slist.is_empty() {
            return Err(KernelError::empty("sequence list"));
        }
        self.reserve(slist.iter())?;
        slist.iter().map(|s| self.self_kernel(s)).collect()
    }

    /// Grow once to the longest sequence instead of once per length seen
    fn reserve<'a, S: 'a>(&mut self, sequences: impl Iterator<Item = &'a Vec<S>>) -> Result<()> {
        match sequences.map(Vec::len).max() {
            Some(longest) => self.weights.try_extend(longest),
            None => Ok(()),
        }
    }
}

fn default_weights() -> WeightMatrix {
    match WeightMatrix::new(DEFAULT_CHV, DEFAULT_CD) {
        Ok(weights) => weights,
        Err(_) => unreachable!("default step costs are positive"),
    }
}

impl<S, R: Real, K: Kernel<S, R>> Kernel<Vec<S>, R> for PathKernel<K, R> {
    fn compute(&mut self, x: &Vec<S>, y: &Vec<S>) -> Result<R> {
        self.pairwise(x, y)
    }

    fn compute_self(&mut self, x: &Vec<S>) -> Result<R> {
        self.self_kernel(x)
    }

    fn compute_matrix(&mut self, xs: &[Vec<S>], ys: &[Vec<S>]) -> Result<KernelMatrix<R>> {
        self.pairwise_matrix(xs, ys)
    }

    fn compute_gram(&mut self, xs: &[Vec<S>]) -> Result<KernelMatrix<R>> {
        self.self_matrix(xs)
    }

    fn compute_diagonal(&mut self, xs: &[Vec<S>]) -> Result<Vec<R>> {
        self.self_vector(xs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kernel::{NormalizedKernel, RbfKernel, SymbolKernel};
    use approx::assert_relative_eq;

    fn labels() -> SymbolKernel {
        SymbolKernel::identity(3).unwrap()
    }

    /// Direct evaluation of the recursive definition
    fn recursive(ground: &[Vec<f64>], chv: f64, cd: f64, i: usize, j: usize) -> f64 {
        let (ls, lt) = (ground.len(), ground[0].len());
        if i >= ls || j >= lt {
            return 0.0;
        }
        ground[i][j]
            + chv * recursive(ground, chv, cd, i + 1, j)
            + chv * recursive(ground, chv, cd, i, j + 1)
            + cd * recursive(ground, chv, cd, i + 1, j + 1)
    }

    #[test]
    fn test_invalid_step_costs() {
        assert!(matches!(
            PathKernel::with_step_costs(labels(), 0.0, 0.4),
            Err(KernelError::InvalidParameter { name: "chv", .. })
        ));
        assert!(matches!(
            PathKernel::with_step_costs(labels(), 0.3, -0.1),
            Err(KernelError::InvalidParameter { name: "cd", .. })
        ));
    }

    #[test]
    fn test_defaults() {
        let kernel = PathKernel::new(labels());
        assert_eq!(kernel.step_costs(), (DEFAULT_CHV, DEFAULT_CD));
        assert_eq!(kernel.dimension(), 1);
        assert!(kernel.cache_dir().is_none());
        assert!(!kernel.save_weights());
    }

    #[test]
    fn test_two_symbol_scenario() {
        let mut kernel = PathKernel::with_step_costs(labels(), 0.3, 0.4).unwrap();
        let value = kernel.pairwise(&[0, 1], &[0, 1]).unwrap();
        assert_relative_eq!(value, 1.58, epsilon = 1e-12);
        assert_eq!(kernel.dimension(), 2);

        let weights = kernel.weights();
        assert_relative_eq!(weights.get(1, 1), 0.58, epsilon = 1e-12);
    }

    #[test]
    fn test_matches_recursive_definition() {
        let s = vec![0usize, 1, 2, 1];
        let t = vec![1usize, 1, 0];
        let delta = |a: &usize, b: &usize| if a == b { 1.0 } else { 0.0 };
        let forward: Vec<Vec<f64>> = s
            .iter()
            .map(|a| t.iter().map(|b| delta(a, b)).collect())
            .collect();
        let backward: Vec<Vec<f64>> = s
            .iter()
            .rev()
            .map(|a| t.iter().rev().map(|b| delta(a, b)).collect())
            .collect();

        let mut kernel = PathKernel::with_step_costs(labels(), 0.3, 0.4).unwrap();
        let value = kernel.pairwise(&s, &t).unwrap();
        let expected = (recursive(&forward, 0.3, 0.4, 0, 0)
            + recursive(&backward, 0.3, 0.4, 0, 0))
            / 2.0;
        assert_relative_eq!(value, expected, epsilon = 1e-9);
    }

    #[test]
    fn test_pairwise_is_symmetric() {
        let mut kernel = PathKernel::new(labels());
        let s = [0usize, 2, 2, 1, 0];
        let t = [1usize, 2];
        let st = kernel.pairwise(&s, &t).unwrap();
        let ts = kernel.pairwise(&t, &s).unwrap();
        assert_relative_eq!(st, ts, epsilon = 1e-12);
    }

    #[test]
    fn test_self_kernel_matches_pairwise() {
        let mut kernel = PathKernel::new(RbfKernel::new(0.8).unwrap());
        let s = vec![vec![0.0, 1.0], vec![0.5, 0.2], vec![1.0, -1.0], vec![0.3, 0.3]];
        let fast = kernel.self_kernel(&s).unwrap();
        let slow = kernel.pairwise(&s, &s).unwrap();
        assert_relative_eq!(fast, slow, epsilon = 1e-12);
    }

    #[test]
    fn test_empty_sequences_rejected() {
        let mut kernel = PathKernel::new(labels());
        let empty: [usize; 0] = [];
        assert!(matches!(
            kernel.pairwise(&empty, &[0]),
            Err(KernelError::EmptyInput { .. })
        ));
        assert!(matches!(
            kernel.pairwise(&[0], &empty),
            Err(KernelError::EmptyInput { .. })
        ));
        assert!(matches!(
            kernel.self_kernel(&empty),
            Err(KernelError::EmptyInput { .. })
        ));
        assert_eq!(kernel.dimension(), 1);
    }

    #[test]
    fn test_empty_lists_rejected() {
        let mut kernel = PathKernel::new(labels());
        let none: Vec<Vec<usize>> = Vec::new();
        let some = vec![vec![0usize, 1]];
        assert!(matches!(
            kernel.pairwise_matrix(&none, &some),
            Err(KernelError::EmptyInput { .. })
        ));
        assert!(matches!(
            kernel.pairwise_matrix(&some, &none),
            Err(KernelError::EmptyInput { .. })
        ));
        assert!(matches!(
            kernel.self_matrix(&none),
            Err(KernelError::EmptyInput { .. })
        ));
        assert!(matches!(
            kernel.self_vector(&none),
            Err(KernelError::EmptyInput { .. })
        ));
    }

    #[test]
    fn test_ground_errors_propagate() {
        let mut kernel = PathKernel::new(labels());
        assert!(matches!(
            kernel.pairwise(&[0, 7], &[1]),
            Err(KernelError::IndexOutOfRange { index: 7, len: 3 })
        ));
    }

    #[test]
    fn test_self_matrix_matches_pairwise() {
        let mut kernel = PathKernel::with_step_costs(labels(), 0.2, 0.5).unwrap();
        let slist = vec![vec![0usize, 1, 2], vec![2usize, 1], vec![1usize]];
        let gram = kernel.self_matrix(&slist).unwrap();
        let cross = kernel.pairwise_matrix(&slist, &slist).unwrap();
        for i in 0..3 {
            for j in 0..3 {
                assert_relative_eq!(gram[i][j], cross[i][j], epsilon = 1e-12);
                assert_eq!(gram[i][j], gram[j][i]);
            }
        }
        assert_eq!(kernel.dimension(), 3);
    }

    #[test]
    fn test_self_vector() {
        let mut kernel = PathKernel::new(labels());
        let slist = vec![vec![0usize, 1], vec![2usize, 2, 2]];
        let diagonal = kernel.self_vector(&slist).unwrap();
        assert_eq!(diagonal.len(), 2);
        assert_relative_eq!(diagonal[0], kernel.self_kernel(&slist[0]).unwrap(), epsilon = 1e-12);
        assert_relative_eq!(
            diagonal[1],
            kernel.pairwise(&slist[1], &slist[1]).unwrap(),
            epsilon = 1e-12
        );
    }

    #[test]
    fn test_pairwise_matrix_shape() {
        let mut kernel = PathKernel::new(labels());
        let slist = vec![vec![0usize], vec![1usize, 2]];
        let tlist = vec![vec![2usize, 2, 0], vec![0usize], vec![1usize]];
        let matrix = kernel.pairwise_matrix(&slist, &tlist).unwrap();
        assert_eq!(matrix.len(), 2);
        assert!(matrix.iter().all(|row| row.len() == 3));
        assert_relative_eq!(matrix[1][0], kernel.pairwise(&slist[1], &tlist[0]).unwrap());
    }

    #[test]
    fn test_weights_only_grow() {
        let mut kernel = PathKernel::new(labels());
        kernel.pairwise(&[0, 1, 2, 0, 1], &[0]).unwrap();
        assert_eq!(kernel.dimension(), 5);
        kernel.pairwise(&[0], &[1]).unwrap();
        assert_eq!(kernel.dimension(), 5);
        kernel.extend(8);
        assert_eq!(kernel.dimension(), 8);
        assert_eq!(kernel.weight_stats().extensions, 2);
    }

    #[test]
    fn test_single_precision() {
        let mut kernel: PathKernel<_, f32> = PathKernel::try_new(labels(), 0.3, 0.4).unwrap();
        let value = kernel.pairwise(&[0, 1], &[0, 1]).unwrap();
        assert!((value - 1.58_f32).abs() < 1e-5);
    }

    #[test]
    fn test_try_extend_reports_unallocatable_dimension() {
        let mut kernel = PathKernel::new(labels());
        kernel.try_extend(3).unwrap();
        assert!(matches!(
            kernel.try_extend(usize::MAX),
            Err(KernelError::InvalidParameter { name: "dimension", .. })
        ));
        assert_eq!(kernel.dimension(), 3);
        assert!(kernel.pairwise(&[0usize, 1], &[2usize]).is_ok());
    }

    #[test]
    fn test_borrowed_ground_kernel() {
        let mut rbf = RbfKernel::new(1.0).unwrap();
        {
            let mut kernel = PathKernel::new(&mut rbf);
            let s = vec![vec![0.0], vec![1.0]];
            assert!(kernel.self_kernel(&s).unwrap() > 0.0);
        }
        assert_eq!(rbf.sigma(), 1.0);
    }

    #[test]
    fn test_as_ground_of_normalized_kernel() {
        let mut normalized = NormalizedKernel::new(PathKernel::new(labels()));
        let slist = vec![vec![0usize, 1], vec![0usize, 1, 2], vec![2usize]];
        let gram = normalized.compute_gram(&slist).unwrap();
        for i in 0..3 {
            assert_eq!(gram[i][i], 1.0);
            for j in 0..3 {
                assert_eq!(gram[i][j], gram[j][i]);
            }
        }
        let direct = normalized.compute(&slist[0], &slist[1]).unwrap();
        assert_relative_eq!(direct, gram[0][1], epsilon = 1e-12);
    }

    #[test]
    fn test_nested_path_kernel() {
        // Sequences of sequences: the inner path kernel is the ground kernel.
        let mut outer = PathKernel::new(PathKernel::new(labels()));
        let a = vec![vec![0usize, 1], vec![2usize]];
        let b = vec![vec![0usize], vec![2usize, 2]];
        let ab = outer.pairwise(&a, &b).unwrap();
        let ba = outer.pairwise(&b, &a).unwrap();
        assert_relative_eq!(ab, ba, epsilon = 1e-12);
        assert_eq!(outer.ground().dimension(), 2);
    }
}
