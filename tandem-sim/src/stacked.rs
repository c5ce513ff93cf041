use std::fmt::{self, Display};

use serde::{Deserialize, Serialize};

use tandem_core::{Result, TandemError};

/// Gap placeholder used on either side of a stacked alignment.
pub const GAP: u8 = b'-';

///
/// Classification of a single stacked-alignment column.
///
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Column {
    /// Read base with no reference counterpart
    Insertion { read: u8 },
    /// Reference base with no read counterpart
    Deletion { reference: u8 },
    Mismatch { read: u8, reference: u8 },
    Match { base: u8 },
}

impl Column {
    pub fn consumes_read(&self) -> bool {
        !matches!(self, Column::Deletion { .. })
    }

    pub fn consumes_reference(&self) -> bool {
        !matches!(self, Column::Insertion { .. })
    }
}

///
/// Read and reference rows of an alignment, equal in length, with `-`
/// marking gaps. No column has a gap on both sides.
///
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StackedAlignment {
    read_side: Vec<u8>,
    ref_side: Vec<u8>,
}

impl StackedAlignment {
    pub fn new(read_side: Vec<u8>, ref_side: Vec<u8>) -> Result<Self> {
        if read_side.len() != ref_side.len() {
            return Err(TandemError::LengthMismatch(format!(
                "stacked read side has {} columns, reference side has {}",
                read_side.len(),
                ref_side.len()
            )));
        }
        if let Some(i) = read_side
            .iter()
            .zip(ref_side.iter())
            .position(|(&rd, &rf)| rd == GAP && rf == GAP)
        {
            return Err(TandemError::CigarMdMismatch(format!(
                "column {} is a gap on both sides",
                i
            )));
        }
        Ok(Self {
            read_side,
            ref_side,
        })
    }

    pub fn read_side(&self) -> &[u8] {
        &self.read_side
    }

    pub fn ref_side(&self) -> &[u8] {
        &self.ref_side
    }

    /// Number of columns
    pub fn len(&self) -> usize {
        self.read_side.len()
    }

    pub fn is_empty(&self) -> bool {
        self.read_side.is_empty()
    }

    pub fn column(&self, i: usize) -> Column {
        let (rd, rf) = (self.read_side[i], self.ref_side[i]);
        if rf == GAP {
            Column::Insertion { read: rd }
        } else if rd == GAP {
            Column::Deletion { reference: rf }
        } else if !rd.eq_ignore_ascii_case(&rf) {
            Column::Mismatch {
                read: rd,
                reference: rf,
            }
        } else {
            Column::Match { base: rd }
        }
    }

    pub fn columns(&self) -> impl Iterator<Item = Column> + '_ {
        (0..self.len()).map(move |i| self.column(i))
    }

    /// Read bases covered by the alignment
    pub fn read_len(&self) -> usize {
        self.read_side.iter().filter(|&&b| b != GAP).count()
    }

    /// Reference bases covered by the alignment
    pub fn ref_len(&self) -> usize {
        self.ref_side.iter().filter(|&&b| b != GAP).count()
    }

    pub fn num_insertions(&self) -> usize {
        self.ref_side.iter().filter(|&&b| b == GAP).count()
    }

    pub fn num_deletions(&self) -> usize {
        self.read_side.iter().filter(|&&b| b == GAP).count()
    }

    pub fn num_gaps(&self) -> usize {
        self.num_insertions() + self.num_deletions()
    }

    /// Mismatch columns, including those where the read has an `N`
    pub fn num_mismatches(&self) -> usize {
        self.columns()
            .filter(|c| matches!(c, Column::Mismatch { .. }))
            .count()
    }

    ///
    /// Edits a perfect-scoring alignment could not contain: gaps and
    /// mismatches other than an `N` in the read.
    ///
    pub fn num_edits(&self) -> usize {
        self.columns()
            .filter(|c| match c {
                Column::Insertion { .. } | Column::Deletion { .. } => true,
                Column::Mismatch { read, .. } => !read.eq_ignore_ascii_case(&b'N'),
                Column::Match { .. } => false,
            })
            .count()
    }

    pub fn ungapped_read(&self) -> Vec<u8> {
        self.read_side.iter().copied().filter(|&b| b != GAP).collect()
    }

    pub fn ungapped_reference(&self) -> Vec<u8> {
        self.ref_side.iter().copied().filter(|&b| b != GAP).collect()
    }

    ///
    /// The same alignment read right to left. Bases are not complemented.
    ///
    pub fn reversed(&self) -> Self {
        Self {
            read_side: self.read_side.iter().rev().copied().collect(),
            ref_side: self.ref_side.iter().rev().copied().collect(),
        }
    }
}

impl Display for StackedAlignment {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        writeln!(f, "{}", String::from_utf8_lossy(&self.read_side))?;
        write!(f, "{}", String::from_utf8_lossy(&self.ref_side))
    }
}
