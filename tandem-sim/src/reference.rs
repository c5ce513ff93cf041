use std::io::BufRead;
use std::path::Path;

use fxhash::FxHashMap;
use log::info;

use tandem_core::utils::get_dynamic_reader;
use tandem_core::{Result, TandemError};

///
/// Source of reference bases for simulation.
///
pub trait ReferenceProvider {
    /// Names of all sequences, in a stable order
    fn names(&self) -> &[String];

    fn sequence_length(&self, name: &str) -> Result<usize>;

    /// `length` bases of `name` starting at 0-based `offset`
    fn get(&self, name: &str, offset: usize, length: usize) -> Result<&[u8]>;
}

///
/// Whole reference held in memory, loaded from (optionally gzip'd) FASTA.
///
#[derive(Debug, Clone, Default)]
pub struct InMemoryReference {
    names: Vec<String>,
    sequences: Vec<Vec<u8>>,
    index: FxHashMap<String, usize>,
}

impl InMemoryReference {
    pub fn new() -> Self {
        Self::default()
    }

    ///
    /// Add a named sequence. Names must be unique.
    ///
    pub fn add_sequence(&mut self, name: &str, seq: Vec<u8>) -> Result<()> {
        if self.index.contains_key(name) {
            return Err(TandemError::InvalidConfig(format!(
                "duplicate reference sequence name: {}",
                name
            )));
        }
        self.index.insert(name.to_string(), self.names.len());
        self.names.push(name.to_string());
        self.sequences.push(seq);
        Ok(())
    }

    pub fn from_fasta(path: &Path) -> anyhow::Result<Self> {
        let mut reference = Self::new();
        reference.add_fasta(path)?;
        Ok(reference)
    }

    /// Add every sequence of a (optionally gzip'd) FASTA file
    pub fn add_fasta(&mut self, path: &Path) -> anyhow::Result<()> {
        let reader = get_dynamic_reader(path)?;
        let before = self.names.len();
        self.add_reader(reader)?;
        info!(
            "Loaded {} reference sequences from {:?} ({} bases in total)",
            self.names.len() - before,
            path,
            self.total_length()
        );
        Ok(())
    }

    pub fn from_reader<R: BufRead>(reader: R) -> Result<Self> {
        let mut reference = Self::new();
        reference.add_reader(reader)?;
        Ok(reference)
    }

    ///
    /// Parse FASTA text. Sequence names end at the first whitespace.
    ///
    pub fn add_reader<R: BufRead>(&mut self, mut reader: R) -> Result<()> {
        let mut line = String::new();
        let mut current: Option<(String, Vec<u8>)> = None;

        loop {
            line.clear();
            let bytes_read = reader.read_line(&mut line)?;
            if bytes_read == 0 {
                if let Some((name, seq)) = current.take() {
                    self.add_sequence(&name, seq)?;
                }
                break;
            }

            let trimmed = line.trim_end();
            if let Some(header) = trimmed.strip_prefix('>') {
                if let Some((name, seq)) = current.take() {
                    self.add_sequence(&name, seq)?;
                }
                let name = header.split_whitespace().next().unwrap_or_default();
                current = Some((name.to_string(), Vec::new()));
            } else if let Some((_, seq)) = current.as_mut() {
                seq.extend_from_slice(trimmed.as_bytes());
            }
        }

        Ok(())
    }

    pub fn total_length(&self) -> usize {
        self.sequences.iter().map(|s| s.len()).sum()
    }

    fn lookup(&self, name: &str) -> Result<&[u8]> {
        self.index
            .get(name)
            .map(|&i| self.sequences[i].as_slice())
            .ok_or_else(|| TandemError::UnknownReference(name.to_string()))
    }
}

impl ReferenceProvider for InMemoryReference {
    fn names(&self) -> &[String] {
        &self.names
    }

    fn sequence_length(&self, name: &str) -> Result<usize> {
        Ok(self.lookup(name)?.len())
    }

    fn get(&self, name: &str, offset: usize, length: usize) -> Result<&[u8]> {
        let seq = self.lookup(name)?;
        match offset.checked_add(length) {
            Some(end) if end <= seq.len() => Ok(&seq[offset..end]),
            _ => Err(TandemError::ReferenceOutOfBounds {
                name: name.to_string(),
                offset,
                length,
                available: seq.len(),
            }),
        }
    }
}
