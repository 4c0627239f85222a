//! Persistence of weight matrices and kernel results
//!
//! - [`WeightStore`]: binary cache records of path-kernel weight matrices,
//!   keyed by step costs, so growth survives across process runs.
//! - [`KernelReport`]: JSON reports of computed kernel matrices.

pub mod report;
pub mod weights;

pub use self::report::{KernelReport, ReportMetadata};
pub use self::weights::{record_file_name, WeightStore};
