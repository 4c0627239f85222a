//! Kernel matrix reports
//!
//! JSON serialization of computed kernel matrices together with the
//! parameters that produced them, for use by the CLI and downstream tools.

use crate::core::{KernelError, KernelMatrix, Result};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;

/// Kernel matrix plus provenance
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KernelReport {
    /// `matrix[i][j]` is the kernel value of row input i and column input j
    pub matrix: KernelMatrix<f64>,
    /// How the matrix was computed
    pub metadata: ReportMetadata,
}

/// Provenance of a kernel report
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportMetadata {
    /// Library version used to compute the matrix
    pub library_version: String,
    /// Human-readable kernel description, e.g. "path(rbf sigma=1)"
    pub kernel: String,
    /// Horizontal/vertical step cost
    pub chv: f64,
    /// Diagonal step cost
    pub cd: f64,
    /// Dimension of the weight matrix after evaluation
    pub weight_dimension: usize,
    pub n_rows: usize,
    pub n_cols: usize,
    /// Creation timestamp (RFC 3339)
    pub created_at: String,
}

impl KernelReport {
    /// Wrap a matrix, stamping it with the current time and library version
    pub fn new(
        matrix: KernelMatrix<f64>,
        kernel: impl Into<String>,
        step_costs: (f64, f64),
        weight_dimension: usize,
    ) -> Self {
        let n_rows = matrix.len();
        let n_cols = matrix.first().map_or(0, |row| row.len());
        Self {
            matrix,
            metadata: ReportMetadata {
                library_version: env!("CARGO_PKG_VERSION").to_string(),
                kernel: kernel.into(),
                chv: step_costs.0,
                cd: step_costs.1,
                weight_dimension,
                n_rows,
                n_cols,
                created_at: chrono::Utc::now().to_rfc3339(),
            },
        }
    }

    /// Save report to file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let file = File::create(path).map_err(KernelError::IoError)?;
        let writer = BufWriter::new(file);
        serde_json::to_writer_pretty(writer, self)
            .map_err(|e| KernelError::SerializationError(e.to_string()))?;
        Ok(())
    }

    /// Load report from file
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::open(path).map_err(KernelError::IoError)?;
        let reader = BufReader::new(file);
        let report = serde_json::from_reader(reader)
            .map_err(|e| KernelError::SerializationError(e.to_string()))?;
        Ok(report)
    }

    /// Print report summary and matrix
    pub fn print(&self) {
        println!("=== Kernel Report ===");
        println!("Kernel: {}", self.metadata.kernel);
        println!(
            "Step costs: CHV={}, CD={}",
            self.metadata.chv, self.metadata.cd
        );
        println!("Weight matrix dimension: {}", self.metadata.weight_dimension);
        println!("Size: {}x{}", self.metadata.n_rows, self.metadata.n_cols);
        println!("Created: {}", self.metadata.created_at);
        for row in &self.matrix {
            let cells: Vec<String> = row.iter().map(|v| format!("{v:.6}")).collect();
            println!("{}", cells.join(" "));
        }
    }
}
