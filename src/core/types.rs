//! Core type definitions

use crate::core::{KernelError, Result};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

/// Dense kernel matrix, `m[i][j]` is the kernel value of the i-th left
/// input against the j-th right input
pub type KernelMatrix<R> = Vec<Vec<R>>;

/// Default horizontal/vertical step cost of the path kernel
pub const DEFAULT_CHV: f64 = 0.9 / 3.0;

/// Default diagonal step cost of the path kernel
pub const DEFAULT_CD: f64 = 1.1 / 3.0;

/// Configuration for a path kernel and its weight cache
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PathKernelConfig {
    /// Horizontal/vertical step cost (must be positive)
    pub chv: f64,
    /// Diagonal step cost (must be positive)
    pub cd: f64,
    /// Directory holding weight cache records; enables loading
    pub cache_dir: Option<PathBuf>,
    /// Also allow writing records into `cache_dir`
    pub writable: bool,
    /// Load the cached record for these step costs when the kernel is built
    pub preload: bool,
    /// Grow the weight table to this dimension when the kernel is built
    pub initial_dimension: Option<usize>,
}

impl Default for PathKernelConfig {
    fn default() -> Self {
        Self {
            chv: DEFAULT_CHV,
            cd: DEFAULT_CD,
            cache_dir: None,
            writable: false,
            preload: false,
            initial_dimension: None,
        }
    }
}

impl PathKernelConfig {
    /// Read a configuration from a JSON file
    ///
    /// Missing fields take their default values.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::open(path).map_err(KernelError::IoError)?;
        let reader = BufReader::new(file);
        let config = serde_json::from_reader(reader)
            .map_err(|e| KernelError::SerializationError(e.to_string()))?;
        Ok(config)
    }

    /// Check the step costs without constructing a kernel
    pub fn validate(&self) -> Result<()> {
        validate_step_cost("chv", self.chv)?;
        validate_step_cost("cd", self.cd)
    }
}

pub(crate) fn validate_step_cost(name: &'static str, value: f64) -> Result<()> {
    if value > 0.0 && value.is_finite() {
        Ok(())
    } else {
        Err(KernelError::invalid(
            name,
            format!("step cost must be positive and finite, got {value}"),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_config_default() {
        let config = PathKernelConfig::default();
        assert_eq!(config.chv, 0.3);
        assert_eq!(config.cd, 1.1 / 3.0);
        assert!(config.cache_dir.is_none());
        assert!(!config.writable);
        assert!(!config.preload);
        assert!(config.initial_dimension.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_validation() {
        let config = PathKernelConfig {
            chv: 0.0,
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(KernelError::InvalidParameter { name: "chv", .. })
        ));

        let config = PathKernelConfig {
            cd: f64::NAN,
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(KernelError::InvalidParameter { name: "cd", .. })
        ));
    }

    #[test]
    fn test_config_from_file_partial() {
        let mut file = NamedTempFile::new().expect("Failed to create temp file");
        writeln!(file, r#"{{ "chv": 0.2, "cache_dir": "/tmp/wmat", "writable": true }}"#)
            .expect("Failed to write");
        file.flush().expect("Failed to flush");

        let config = PathKernelConfig::from_file(file.path()).expect("Config should parse");
        assert_eq!(config.chv, 0.2);
        assert_eq!(config.cd, DEFAULT_CD);
        assert_eq!(config.cache_dir, Some(PathBuf::from("/tmp/wmat")));
        assert!(config.writable);
    }

    #[test]
    fn test_config_from_file_invalid_json() {
        let mut file = NamedTempFile::new().expect("Failed to create temp file");
        writeln!(file, "not json").expect("Failed to write");
        file.flush().expect("Failed to flush");

        assert!(matches!(
            PathKernelConfig::from_file(file.path()),
            Err(KernelError::SerializationError(_))
        ));
    }
}
