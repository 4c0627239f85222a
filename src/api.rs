//! High-level API for path kernel evaluation
//!
//! This module provides a builder that turns a [`PathKernelConfig`] (or
//! individual settings) into a ready [`PathKernel`], with the weight cache
//! wired up, plus one-call helpers for the common kernels.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use pathkernel::api::PathKernelBuilder;
//! use pathkernel::{Kernel, RbfKernel};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let mut path = PathKernelBuilder::new()
//!     .with_step_costs(0.3, 0.4)
//!     .with_cache_dir("weights", true)
//!     .with_preload(true)
//!     .build(RbfKernel::new(0.5)?)?;
//!
//! let sequences = vec![vec![vec![0.0, 1.0], vec![1.0, 0.0]], vec![vec![0.5, 0.5]]];
//! let gram = path.compute_gram(&sequences)?;
//! path.save_weights();
//! println!("{gram:?}");
//! # Ok(())
//! # }
//! ```

use crate::core::{KernelMatrix, PathKernelConfig, Real, Result};
use crate::kernel::PathKernel;
use log::{debug, info};
use std::path::PathBuf;

/// Builder for [`PathKernel`]
#[derive(Debug, Clone, Default)]
pub struct PathKernelBuilder {
    config: PathKernelConfig,
}

impl PathKernelBuilder {
    /// Builder with default step costs and no cache
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder starting from an existing configuration
    pub fn from_config(config: PathKernelConfig) -> Self {
        Self { config }
    }

    /// Replace the whole configuration
    pub fn with_config(mut self, config: PathKernelConfig) -> Self {
        self.config = config;
        self
    }

    /// Set both step costs
    pub fn with_step_costs(mut self, chv: f64, cd: f64) -> Self {
        self.config.chv = chv;
        self.config.cd = cd;
        self
    }

    /// Set the horizontal/vertical step cost
    pub fn with_chv(mut self, chv: f64) -> Self {
        self.config.chv = chv;
        self
    }

    /// Set the diagonal step cost
    pub fn with_cd(mut self, cd: f64) -> Self {
        self.config.cd = cd;
        self
    }

    /// Read weight records from `directory`, and write them if `writable`
    pub fn with_cache_dir<P: Into<PathBuf>>(mut self, directory: P, writable: bool) -> Self {
        self.config.cache_dir = Some(directory.into());
        self.config.writable = writable;
        self
    }

    /// Load the cached record while building
    pub fn with_preload(mut self, preload: bool) -> Self {
        self.config.preload = preload;
        self
    }

    /// Grow the weight table to `dimension` while building
    pub fn with_initial_dimension(mut self, dimension: usize) -> Self {
        self.config.initial_dimension = Some(dimension);
        self
    }

    /// Current configuration
    pub fn config(&self) -> &PathKernelConfig {
        &self.config
    }

    /// Build an `f64` path kernel around `ground`
    pub fn build<K>(self, ground: K) -> Result<PathKernel<K>> {
        self.build_with_precision(ground)
    }

    /// Build a path kernel producing values of type `R`
    ///
    /// Preloading runs before the initial extension so that a large cached
    /// record saves the work of growing.
    pub fn build_with_precision<K, R: Real>(self, ground: K) -> Result<PathKernel<K, R>> {
        let config = self.config;
        config.validate()?;

        let mut kernel = PathKernel::try_new(ground, config.chv, config.cd)?;
        if let Some(directory) = config.cache_dir {
            debug!(
                "Using weight cache at {} (writable: {})",
                directory.display(),
                config.writable
            );
            kernel.set_cache_dir(directory, config.writable);
            if config.preload && kernel.load_weights() {
                info!("Preloaded weight matrix of dimension {}", kernel.dimension());
            }
        }
        if let Some(dimension) = config.initial_dimension {
            kernel.try_extend(dimension)?;
        }
        Ok(kernel)
    }
}

/// Convenience functions for common use cases
pub mod quick {
    use super::*;
    use crate::data::{LabelSequences, VectorSequences};
    use crate::kernel::{Kernel, NormalizedKernel, RbfKernel, SymbolKernel};
    use std::path::Path;

    /// Gram matrix of vector sequences under a path kernel with RBF ground
    /// kernel and default step costs
    pub fn rbf_gram(sequences: &[Vec<Vec<f64>>], sigma: f64) -> Result<KernelMatrix<f64>> {
        PathKernel::new(RbfKernel::new(sigma)?).self_matrix(sequences)
    }

    /// Normalized version of [`rbf_gram`]
    pub fn normalized_rbf_gram(
        sequences: &[Vec<Vec<f64>>],
        sigma: f64,
    ) -> Result<KernelMatrix<f64>> {
        NormalizedKernel::new(PathKernel::new(RbfKernel::new(sigma)?)).compute_gram(sequences)
    }

    /// Gram matrix of label sequences under a path kernel with the identity
    /// label kernel over `labels` labels
    pub fn label_gram(sequences: &[Vec<usize>], labels: usize) -> Result<KernelMatrix<f64>> {
        PathKernel::new(SymbolKernel::identity(labels)?).self_matrix(sequences)
    }

    /// Normalized version of [`label_gram`]
    pub fn normalized_label_gram(
        sequences: &[Vec<usize>],
        labels: usize,
    ) -> Result<KernelMatrix<f64>> {
        NormalizedKernel::new(PathKernel::new(SymbolKernel::identity(labels)?))
            .compute_gram(sequences)
    }

    /// Load vector sequences from a file and compute their RBF path Gram matrix
    pub fn rbf_gram_from_file<P: AsRef<Path>>(path: P, sigma: f64) -> Result<KernelMatrix<f64>> {
        let data = VectorSequences::from_file(path)?;
        rbf_gram(data.sequences(), sigma)
    }

    /// Load label sequences from a file and compute their path Gram matrix
    pub fn label_gram_from_file<P: AsRef<Path>>(
        path: P,
        labels: usize,
    ) -> Result<KernelMatrix<f64>> {
        let data = LabelSequences::from_file(path)?;
        label_gram(data.sequences(), labels)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::KernelError;
    use crate::kernel::{Kernel, SymbolKernel};
    use approx::assert_relative_eq;
    use tempfile::TempDir;

    #[test]
    fn test_builder_defaults() {
        let kernel = PathKernelBuilder::new()
            .build(SymbolKernel::identity(2).unwrap())
            .unwrap();
        assert_eq!(kernel.step_costs(), (0.9 / 3.0, 1.1 / 3.0));
        assert_eq!(kernel.dimension(), 1);
        assert!(kernel.cache_dir().is_none());
    }

    #[test]
    fn test_builder_settings() {
        let kernel = PathKernelBuilder::new()
            .with_chv(0.25)
            .with_cd(0.5)
            .with_initial_dimension(6)
            .build(SymbolKernel::identity(2).unwrap())
            .unwrap();
        assert_eq!(kernel.step_costs(), (0.25, 0.5));
        assert_eq!(kernel.dimension(), 6);
    }

    #[test]
    fn test_builder_rejects_bad_costs() {
        let result = PathKernelBuilder::new()
            .with_step_costs(0.3, -1.0)
            .build(SymbolKernel::identity(2).unwrap());
        assert!(matches!(
            result,
            Err(KernelError::InvalidParameter { name: "cd", .. })
        ));
    }

    #[test]
    fn test_builder_rejects_unallocatable_initial_dimension() {
        let result = PathKernelBuilder::new()
            .with_initial_dimension(usize::MAX)
            .build(SymbolKernel::identity(2).unwrap());
        assert!(matches!(
            result,
            Err(KernelError::InvalidParameter { name: "dimension", .. })
        ));
    }

    #[test]
    fn test_builder_preloads_cache() {
        let dir = TempDir::new().unwrap();

        let warm = PathKernelBuilder::new()
            .with_step_costs(0.3, 0.4)
            .with_cache_dir(dir.path(), true)
            .with_initial_dimension(9)
            .build(SymbolKernel::identity(2).unwrap())
            .unwrap();
        assert!(warm.save_weights());

        let config = PathKernelConfig {
            chv: 0.3,
            cd: 0.4,
            cache_dir: Some(dir.path().to_path_buf()),
            writable: false,
            preload: true,
            initial_dimension: None,
        };
        let cold = PathKernelBuilder::from_config(config)
            .build(SymbolKernel::identity(2).unwrap())
            .unwrap();
        assert_eq!(cold.dimension(), 9);
        assert_eq!(cold.weights().as_slice(), warm.weights().as_slice());
    }

    #[test]
    fn test_builder_f32() {
        let mut kernel = PathKernelBuilder::new()
            .with_step_costs(0.3, 0.4)
            .build_with_precision::<_, f32>(SymbolKernel::identity(2).unwrap())
            .unwrap();
        let value = kernel.compute(&vec![0usize, 1], &vec![0usize, 1]).unwrap();
        assert_relative_eq!(value, 1.58_f32, epsilon = 1e-6);
    }

    #[test]
    fn test_quick_label_gram() {
        let sequences = vec![vec![0, 1], vec![1], vec![0, 1, 0]];
        let gram = quick::label_gram(&sequences, 2).unwrap();
        assert_eq!(gram.len(), 3);
        for i in 0..3 {
            for j in 0..3 {
                assert_eq!(gram[i][j], gram[j][i]);
            }
        }

        let normalized = quick::normalized_label_gram(&sequences, 2).unwrap();
        for i in 0..3 {
            assert_eq!(normalized[i][i], 1.0);
            for j in 0..3 {
                assert_relative_eq!(
                    normalized[i][j],
                    gram[i][j] / (gram[i][i] * gram[j][j]).sqrt(),
                    epsilon = 1e-12
                );
            }
        }
    }

    #[test]
    fn test_quick_rbf_gram() {
        let sequences = vec![
            vec![vec![0.0, 0.0], vec![1.0, 0.0]],
            vec![vec![0.0, 1.0]],
        ];
        let gram = quick::rbf_gram(&sequences, 1.0).unwrap();
        let normalized = quick::normalized_rbf_gram(&sequences, 1.0).unwrap();
        assert_relative_eq!(
            normalized[0][1],
            gram[0][1] / (gram[0][0] * gram[1][1]).sqrt(),
            epsilon = 1e-12
        );
        assert!(matches!(
            quick::rbf_gram(&sequences, 0.0),
            Err(KernelError::InvalidParameter { .. })
        ));
    }
}
