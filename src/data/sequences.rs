//! Text format for symbol sequences
//!
//! One sequence per line, symbols separated by `;`:
//! - vector symbols list their components separated by `,`
//!   (`0.1,0.2;0.3,0.4` is a sequence of two 2-dimensional vectors)
//! - label symbols are non-negative integers (`0;2;1`)
//!
//! Blank lines and lines starting with `#` are skipped.

use crate::core::{KernelError, Result};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

/// A symbol that can be read from one `;`-separated field
pub trait ParseSymbol: Sized {
    fn parse_symbol(field: &str) -> std::result::Result<Self, String>;
}

impl ParseSymbol for Vec<f64> {
    fn parse_symbol(field: &str) -> std::result::Result<Self, String> {
        field
            .split(',')
            .map(|component| {
                let component = component.trim();
                component
                    .parse::<f64>()
                    .map_err(|_| format!("invalid vector component '{component}'"))
            })
            .collect()
    }
}

impl ParseSymbol for usize {
    fn parse_symbol(field: &str) -> std::result::Result<Self, String> {
        field
            .parse::<usize>()
            .map_err(|_| format!("invalid label '{field}'"))
    }
}

/// A list of symbol sequences loaded from text
#[derive(Debug, Clone, PartialEq)]
pub struct SequenceDataset<S> {
    sequences: Vec<Vec<S>>,
}

/// Sequences of real-valued feature vectors
pub type VectorSequences = SequenceDataset<Vec<f64>>;

/// Sequences of label indices
pub type LabelSequences = SequenceDataset<usize>;

impl<S> SequenceDataset<S> {
    /// Wrap already-built sequences
    pub fn new(sequences: Vec<Vec<S>>) -> Result<Self> {
        if sequences.is_empty() {
            return Err(KernelError::empty("sequence dataset"));
        }
        Ok(Self { sequences })
    }

    pub fn len(&self) -> usize {
        self.sequences.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sequences.is_empty()
    }

    pub fn sequences(&self) -> &[Vec<S>] {
        &self.sequences
    }

    pub fn into_sequences(self) -> Vec<Vec<S>> {
        self.sequences
    }

    /// Number of symbols across all sequences
    pub fn total_symbols(&self) -> usize {
        self.sequences.iter().map(|s| s.len()).sum()
    }

    /// Length of the longest sequence
    pub fn max_length(&self) -> usize {
        self.sequences.iter().map(|s| s.len()).max().unwrap_or(0)
    }
}

impl<S: ParseSymbol> SequenceDataset<S> {
    /// Load sequences from a file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::open(path).map_err(KernelError::IoError)?;
        let reader = BufReader::new(file);
        Self::from_reader(reader)
    }

    /// Load sequences from any buffered reader
    pub fn from_reader<B: BufRead>(reader: B) -> Result<Self> {
        let mut sequences = Vec::new();

        for (index, line) in reader.lines().enumerate() {
            let line = line.map_err(KernelError::IoError)?;
            let line = line.trim();

            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            let sequence = Self::parse_line(line)
                .map_err(|msg| KernelError::ParseError(format!("line {}: {msg}", index + 1)))?;
            sequences.push(sequence);
        }

        Self::new(sequences)
    }

    fn parse_line(line: &str) -> std::result::Result<Vec<S>, String> {
        line.split(';')
            .map(|field| {
                let field = field.trim();
                if field.is_empty() {
                    return Err("empty symbol".to_string());
                }
                S::parse_symbol(field)
            })
            .collect()
    }
}
