//! Weight matrix cache records
//!
//! One record per pair of step costs, named after them:
//! `wmat_CHV_3.0000000000e-01_CD_3.6666666667e-01.bin`. The layout is a
//! little-endian `u64` dimension followed by `D * D` little-endian `f64`
//! values in row-major order. There is no header beyond the dimension.
//!
//! Saving and loading are best effort. Failures are logged and reported as
//! "nothing happened"; they never reach the caller as errors.

use crate::cache::WeightMatrix;
use crate::core::{KernelError, Result};
use log::{info, trace, warn};
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

const DIMENSION_BYTES: u64 = 8;
const VALUE_BYTES: u64 = 8;

/// Location and permissions of the weight cache
///
/// A configured directory grants read access; `writable` additionally
/// grants write access.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WeightStore {
    directory: Option<PathBuf>,
    writable: bool,
}

impl WeightStore {
    /// Store with no directory: every save and load is a no-op
    pub fn disabled() -> Self {
        Self::default()
    }

    /// Store reading from, and optionally writing to, `directory`
    pub fn new<P: Into<PathBuf>>(directory: P, writable: bool) -> Self {
        Self {
            directory: Some(directory.into()),
            writable,
        }
    }

    /// Change the directory and write permission
    pub fn configure<P: Into<PathBuf>>(&mut self, directory: P, writable: bool) {
        self.directory = Some(directory.into());
        self.writable = writable;
    }

    /// Configured directory, if any
    pub fn directory(&self) -> Option<&Path> {
        self.directory.as_deref()
    }

    /// Whether saving is permitted
    pub fn is_writable(&self) -> bool {
        self.directory.is_some() && self.writable
    }

    /// Path of the record for the given step costs
    pub fn record_path(&self, chv: f64, cd: f64) -> Option<PathBuf> {
        self.directory
            .as_ref()
            .map(|dir| dir.join(record_file_name(chv, cd)))
    }

    /// Dimension of the stored record for the given step costs
    ///
    /// `None` if the record is missing, unreadable, or its length disagrees
    /// with its dimension.
    pub fn stored_dimension(&self, chv: f64, cd: f64) -> Option<usize> {
        let path = self.record_path(chv, cd)?;
        read_dimension(&path).ok()
    }

    /// Write `weights` unless an equal or larger record already exists
    ///
    /// Returns `true` iff a record was written.
    pub fn save(&self, weights: &WeightMatrix) -> bool {
        let (chv, cd) = weights.step_costs();
        let Some(path) = self.record_path(chv, cd) else {
            trace!("Weight cache save skipped: no cache directory");
            return false;
        };
        if !self.writable {
            trace!("Weight cache save skipped: {path:?} is read-only");
            return false;
        }
        match read_dimension(&path) {
            Ok(stored) if stored >= weights.dimension() => {
                trace!(
                    "Weight cache save skipped: stored dimension {stored} >= {}",
                    weights.dimension()
                );
                return false;
            }
            Err(KernelError::CorruptCache(reason)) => {
                warn!("Replacing damaged weight record {path:?}: {reason}");
            }
            _ => {}
        }

        match write_record(&path, weights) {
            Ok(()) => {
                info!(
                    "Saved {}x{} weight matrix to {path:?}",
                    weights.dimension(),
                    weights.dimension()
                );
                true
            }
            Err(e) => {
                warn!("Failed to save weight matrix to {path:?}: {e}");
                false
            }
        }
    }

    /// Replace `weights` with the stored record if it is larger
    ///
    /// Returns `true` iff the in-memory table was replaced.
    pub fn load(&self, weights: &mut WeightMatrix) -> bool {
        let (chv, cd) = weights.step_costs();
        let Some(path) = self.record_path(chv, cd) else {
            trace!("Weight cache load skipped: no cache directory");
            return false;
        };
        if !path.exists() {
            trace!("Weight cache load skipped: no record at {path:?}");
            return false;
        }

        let result = read_record(&path, weights.dimension()).and_then(|record| match record {
            Some((dim, values)) => weights.restore(dim, values).map(|()| Some(dim)),
            None => Ok(None),
        });
        match result {
            Ok(Some(dim)) => {
                info!("Loaded {dim}x{dim} weight matrix from {path:?}");
                true
            }
            Ok(None) => {
                trace!(
                    "Weight cache load skipped: record is not larger than {}",
                    weights.dimension()
                );
                false
            }
            Err(e) => {
                warn!("Failed to load weight matrix from {path:?}: {e}");
                false
            }
        }
    }
}

/// File name of the record for a pair of step costs
pub fn record_file_name(chv: f64, cd: f64) -> String {
    format!(
        "wmat_CHV_{}_CD_{}.bin",
        scientific(chv),
        scientific(cd)
    )
}

/// C-style `%.10e` formatting: `3.0000000000e-01`
fn scientific(value: f64) -> String {
    let formatted = format!("{value:.10e}");
    match formatted.split_once('e') {
        Some((mantissa, exponent)) => match exponent.parse::<i32>() {
            Ok(exponent) => format!("{mantissa}e{exponent:+03}"),
            Err(_) => formatted,
        },
        None => formatted,
    }
}

/// Byte length of a record of dimension `dim`, if representable
fn record_length(dim: u64) -> Option<u64> {
    dim.checked_mul(dim)
        .and_then(|cells| cells.checked_mul(VALUE_BYTES))
        .and_then(|bytes| bytes.checked_add(DIMENSION_BYTES))
}

fn check_length(dim: u64, length: u64) -> Result<()> {
    if record_length(dim) == Some(length) {
        Ok(())
    } else {
        Err(KernelError::CorruptCache(format!(
            "record claims dimension {dim} but holds {length} bytes"
        )))
    }
}

/// Dimension of a well-formed record
fn read_dimension(path: &Path) -> Result<usize> {
    let mut file = File::open(path)?;
    let length = file.metadata()?.len();
    let mut header = [0u8; DIMENSION_BYTES as usize];
    file.read_exact(&mut header)?;
    let dim = u64::from_le_bytes(header);
    check_length(dim, length)?;
    usize::try_from(dim)
        .map_err(|_| KernelError::CorruptCache("dimension does not fit in memory".to_string()))
}

/// Read the record at `path` if its dimension exceeds `current`
fn read_record(path: &Path, current: usize) -> Result<Option<(usize, Vec<f64>)>> {
    let file = File::open(path)?;
    let length = file.metadata()?.len();
    let mut reader = BufReader::new(file);

    let mut header = [0u8; DIMENSION_BYTES as usize];
    reader.read_exact(&mut header)?;
    let dim = u64::from_le_bytes(header);
    if dim <= current as u64 {
        return Ok(None);
    }

    check_length(dim, length)?;
    let dim = usize::try_from(dim)
        .map_err(|_| KernelError::CorruptCache("dimension does not fit in memory".to_string()))?;

    let mut values = Vec::with_capacity(dim * dim);
    let mut cell = [0u8; VALUE_BYTES as usize];
    for _ in 0..dim * dim {
        reader.read_exact(&mut cell)?;
        values.push(f64::from_le_bytes(cell));
    }
    Ok(Some((dim, values)))
}

/// Write the record through a temporary file renamed into place
fn write_record(path: &Path, weights: &WeightMatrix) -> Result<()> {
    let directory = path
        .parent()
        .ok_or_else(|| KernelError::ParseError(format!("no parent directory for {path:?}")))?;
    fs::create_dir_all(directory)?;

    let temp = NamedTempFile::new_in(directory)?;
    {
        let mut writer = BufWriter::new(temp.as_file());
        writer.write_all(&(weights.dimension() as u64).to_le_bytes())?;
        for value in weights.as_slice() {
            writer.write_all(&value.to_le_bytes())?;
        }
        writer.flush()?;
    }
    temp.persist(path).map_err(|e| KernelError::IoError(e.error))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn grown(chv: f64, cd: f64, dim: usize) -> WeightMatrix {
        let mut weights = WeightMatrix::new(chv, cd).unwrap();
        weights.extend(dim);
        weights
    }

    #[test]
    fn test_record_file_name() {
        assert_eq!(
            record_file_name(0.3, 0.4),
            "wmat_CHV_3.0000000000e-01_CD_4.0000000000e-01.bin"
        );
        assert_eq!(
            record_file_name(12.5, 1.0),
            "wmat_CHV_1.2500000000e+01_CD_1.0000000000e+00.bin"
        );
        assert_ne!(record_file_name(0.3, 0.4), record_file_name(0.4, 0.3));
    }

    #[test]
    fn test_disabled_store_is_noop() {
        let store = WeightStore::disabled();
        let mut weights = grown(0.3, 0.4, 4);
        assert!(!store.save(&weights));
        assert!(!store.load(&mut weights));
        assert!(store.record_path(0.3, 0.4).is_none());
        assert!(!store.is_writable());
    }

    #[test]
    fn test_read_only_store_does_not_write() {
        let dir = TempDir::new().unwrap();
        let store = WeightStore::new(dir.path(), false);
        assert!(!store.save(&grown(0.3, 0.4, 4)));
        assert!(store.stored_dimension(0.3, 0.4).is_none());
    }

    #[test]
    fn test_record_layout() {
        let dir = TempDir::new().unwrap();
        let store = WeightStore::new(dir.path(), true);
        let weights = grown(0.3, 0.4, 3);
        assert!(store.save(&weights));

        let path = store.record_path(0.3, 0.4).unwrap();
        let bytes = fs::read(&path).unwrap();
        assert_eq!(bytes.len(), 8 + 9 * 8);
        assert_eq!(u64::from_le_bytes(bytes[..8].try_into().unwrap()), 3);
        let second = f64::from_le_bytes(bytes[16..24].try_into().unwrap());
        assert_eq!(second, weights.get(0, 1));
        assert_eq!(store.stored_dimension(0.3, 0.4), Some(3));
    }

    #[test]
    fn test_save_never_shrinks_record() {
        let dir = TempDir::new().unwrap();
        let store = WeightStore::new(dir.path(), true);
        assert!(store.save(&grown(0.3, 0.4, 5)));
        assert!(!store.save(&grown(0.3, 0.4, 5)));
        assert!(!store.save(&grown(0.3, 0.4, 3)));
        assert_eq!(store.stored_dimension(0.3, 0.4), Some(5));
        assert!(store.save(&grown(0.3, 0.4, 7)));
        assert_eq!(store.stored_dimension(0.3, 0.4), Some(7));
    }

    #[test]
    fn test_load_only_grows() {
        let dir = TempDir::new().unwrap();
        let store = WeightStore::new(dir.path(), true);
        let saved = grown(0.3, 0.4, 6);
        assert!(store.save(&saved));

        let mut fresh = WeightMatrix::new(0.3, 0.4).unwrap();
        assert!(store.load(&mut fresh));
        assert_eq!(fresh.as_slice(), saved.as_slice());

        let mut larger = grown(0.3, 0.4, 8);
        let before = larger.snapshot();
        assert!(!store.load(&mut larger));
        assert_eq!(larger.snapshot(), before);

        let mut equal = grown(0.3, 0.4, 6);
        assert!(!store.load(&mut equal));
    }

    #[test]
    fn test_load_keys_on_step_costs() {
        let dir = TempDir::new().unwrap();
        let store = WeightStore::new(dir.path(), true);
        assert!(store.save(&grown(0.3, 0.4, 6)));

        let mut other = WeightMatrix::new(0.3, 0.5).unwrap();
        assert!(!store.load(&mut other));
        assert_eq!(other.dimension(), 1);
    }

    #[test]
    fn test_truncated_record_is_ignored() {
        let dir = TempDir::new().unwrap();
        let store = WeightStore::new(dir.path(), true);
        assert!(store.save(&grown(0.3, 0.4, 4)));

        let path = store.record_path(0.3, 0.4).unwrap();
        let bytes = fs::read(&path).unwrap();
        fs::write(&path, &bytes[..bytes.len() - 8]).unwrap();

        let mut weights = WeightMatrix::new(0.3, 0.4).unwrap();
        assert!(!store.load(&mut weights));
        assert_eq!(weights.dimension(), 1);
    }

    #[test]
    fn test_mismatched_record_is_ignored() {
        let dir = TempDir::new().unwrap();
        let store = WeightStore::new(dir.path(), true);
        let foreign = grown(0.9, 0.1, 4);
        let path = store.record_path(0.3, 0.4).unwrap();
        write_record(&path, &foreign).unwrap();

        let mut weights = WeightMatrix::new(0.3, 0.4).unwrap();
        assert!(!store.load(&mut weights));
        assert_eq!(weights.dimension(), 1);
    }

    #[test]
    fn test_damaged_header_does_not_block_saving() {
        let dir = TempDir::new().unwrap();
        let store = WeightStore::new(dir.path(), true);
        let path = store.record_path(0.3, 0.4).unwrap();

        let mut bytes = u64::MAX.to_le_bytes().to_vec();
        bytes.extend_from_slice(&1.0f64.to_le_bytes());
        fs::write(&path, &bytes).unwrap();

        let mut weights = grown(0.3, 0.4, 3);
        assert!(!store.load(&mut weights));
        assert!(store.stored_dimension(0.3, 0.4).is_none());

        assert!(store.save(&weights));
        assert_eq!(store.stored_dimension(0.3, 0.4), Some(3));
        let mut fresh = WeightMatrix::new(0.3, 0.4).unwrap();
        assert!(store.load(&mut fresh));
        assert_eq!(fresh.as_slice(), weights.as_slice());
    }

    #[test]
    fn test_truncated_record_is_replaced_by_smaller_table() {
        let dir = TempDir::new().unwrap();
        let store = WeightStore::new(dir.path(), true);
        assert!(store.save(&grown(0.3, 0.4, 6)));

        let path = store.record_path(0.3, 0.4).unwrap();
        let bytes = fs::read(&path).unwrap();
        fs::write(&path, &bytes[..bytes.len() - 8]).unwrap();

        assert!(store.save(&grown(0.3, 0.4, 2)));
        assert_eq!(store.stored_dimension(0.3, 0.4), Some(2));
    }

    #[test]
    fn test_save_creates_directory() {
        let dir = TempDir::new().unwrap();
        let nested = dir.path().join("a").join("b");
        let store = WeightStore::new(&nested, true);
        assert!(store.save(&grown(0.3, 0.4, 2)));
        assert!(nested.join(record_file_name(0.3, 0.4)).exists());
    }

    #[test]
    fn test_configure() {
        let mut store = WeightStore::disabled();
        store.configure("/tmp/weights", true);
        assert_eq!(store.directory(), Some(Path::new("/tmp/weights")));
        assert!(store.is_writable());
    }
}
