//! Path kernels for sequences of arbitrary symbols
//!
//! Based on "The Path Kernel" by Andrea Baisero, Florian T. Pokorny, Danica
//! Kragic and Carl Henrik Ek. The kernel compares two sequences through all
//! monotone alignments of their symbols, weighted by the step costs of a
//! lattice walk, on top of any ground kernel between symbols.

pub mod api;
pub mod cache;
pub mod core;
pub mod data;
pub mod kernel;
pub mod persistence;
pub mod utils;

// Re-export main types for convenience
pub use crate::api::PathKernelBuilder;
pub use crate::cache::{WeightMatrix, WeightSnapshot, WeightStats};
pub use crate::core::error::KernelError;
pub use crate::core::traits::*;
pub use crate::core::types::*;
pub use crate::data::{LabelSequences, SequenceDataset, VectorSequences};
pub use crate::kernel::{Kernel, NormalizedKernel, PathKernel, RbfKernel, SymbolKernel};
pub use crate::persistence::{KernelReport, WeightStore};

// Version info
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
