//! CIGAR and MD:Z parsing, and reconstruction of the stacked alignment they
//! describe together.
//!
//! The CIGAR string gives the shape of an alignment (runs of aligned,
//! inserted, deleted and clipped bases). The MD:Z string fills in the
//! reference bases the read does not carry: the reference side of every
//! mismatch and every deleted reference base. Walking both at once yields a
//! [`StackedAlignment`], the read and reference rows of the alignment printed
//! one above the other.
use tandem_core::{Result, TandemError};

use crate::stacked::{GAP, StackedAlignment};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CigarOp {
    Match(usize),
    Insertion(usize),
    Deletion(usize),
    SkippedRegion(usize),
    SoftClip(usize),
    HardClip(usize),
    Padding(usize),
}

impl CigarOp {
    pub fn len(&self) -> usize {
        match *self {
            CigarOp::Match(n)
            | CigarOp::Insertion(n)
            | CigarOp::Deletion(n)
            | CigarOp::SkippedRegion(n)
            | CigarOp::SoftClip(n)
            | CigarOp::HardClip(n)
            | CigarOp::Padding(n) => n,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn consumes_read(&self) -> bool {
        matches!(
            self,
            CigarOp::Match(_) | CigarOp::Insertion(_) | CigarOp::SoftClip(_)
        )
    }

    pub fn consumes_reference(&self) -> bool {
        matches!(
            self,
            CigarOp::Match(_) | CigarOp::Deletion(_) | CigarOp::SkippedRegion(_)
        )
    }

    fn with_len(&self, n: usize) -> CigarOp {
        match self {
            CigarOp::Match(_) => CigarOp::Match(n),
            CigarOp::Insertion(_) => CigarOp::Insertion(n),
            CigarOp::Deletion(_) => CigarOp::Deletion(n),
            CigarOp::SkippedRegion(_) => CigarOp::SkippedRegion(n),
            CigarOp::SoftClip(_) => CigarOp::SoftClip(n),
            CigarOp::HardClip(_) => CigarOp::HardClip(n),
            CigarOp::Padding(_) => CigarOp::Padding(n),
        }
    }

    fn same_kind(&self, other: &CigarOp) -> bool {
        std::mem::discriminant(self) == std::mem::discriminant(other)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MdOp {
    MatchRun(usize),
    /// Reference bases at consecutive mismatched positions
    MismatchRun(Vec<u8>),
    /// Reference bases deleted from the read
    ReadGap(Vec<u8>),
}

impl MdOp {
    pub fn len(&self) -> usize {
        match self {
            MdOp::MatchRun(n) => *n,
            MdOp::MismatchRun(bases) | MdOp::ReadGap(bases) => bases.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

///
/// Parse a CIGAR string into its runs. `=` and `X` are folded into `Match`
/// since mismatch placement comes from MD:Z, and adjacent runs of the same
/// kind are merged. Zero-length runs are dropped.
///
pub fn parse_cigar(cigar: &str) -> Result<Vec<CigarOp>> {
    let mut ops: Vec<CigarOp> = Vec::new();
    let mut num: Option<usize> = None;

    for c in cigar.chars() {
        if let Some(d) = c.to_digit(10) {
            let acc = num.unwrap_or(0);
            num = Some(
                acc.checked_mul(10)
                    .and_then(|v| v.checked_add(d as usize))
                    .ok_or_else(|| {
                        TandemError::MalformedCigar(format!("run length overflow in {}", cigar))
                    })?,
            );
            continue;
        }

        let n = num.take().ok_or_else(|| {
            TandemError::MalformedCigar(format!("operation '{}' has no run length in {}", c, cigar))
        })?;
        let op = match c {
            'M' | '=' | 'X' => CigarOp::Match(n),
            'I' => CigarOp::Insertion(n),
            'D' => CigarOp::Deletion(n),
            'N' => CigarOp::SkippedRegion(n),
            'S' => CigarOp::SoftClip(n),
            'H' => CigarOp::HardClip(n),
            'P' => CigarOp::Padding(n),
            _ => {
                return Err(TandemError::MalformedCigar(format!(
                    "unrecognized operation '{}' in {}",
                    c, cigar
                )));
            }
        };
        if op.is_empty() {
            continue;
        }
        match ops.last_mut() {
            Some(last) if last.same_kind(&op) => *last = last.with_len(last.len() + op.len()),
            _ => ops.push(op),
        }
    }

    if num.is_some() {
        return Err(TandemError::MalformedCigar(format!(
            "trailing run length without an operation in {}",
            cigar
        )));
    }
    if ops.is_empty() {
        return Err(TandemError::MalformedCigar(format!("no operations in '{}'", cigar)));
    }

    Ok(ops)
}

///
/// Parse an MD:Z string into match runs, mismatch runs and deletions.
/// Reference bases are upper-cased.
///
pub fn parse_mdz(md: &str) -> Result<Vec<MdOp>> {
    if md.is_empty() {
        return Err(TandemError::MalformedMdString("empty MD:Z string".to_string()));
    }

    let bytes = md.as_bytes();
    let mut ops = Vec::new();
    let mut i = 0;

    while i < bytes.len() {
        let c = bytes[i];
        if c.is_ascii_digit() {
            let start = i;
            while i < bytes.len() && bytes[i].is_ascii_digit() {
                i += 1;
            }
            let n: usize = md[start..i]
                .parse()
                .map_err(|_| TandemError::MalformedMdString(md.to_string()))?;
            if n > 0 {
                ops.push(MdOp::MatchRun(n));
            }
        } else if c == b'^' {
            i += 1;
            let start = i;
            while i < bytes.len() && bytes[i].is_ascii_alphabetic() {
                i += 1;
            }
            if start == i {
                return Err(TandemError::MalformedMdString(format!(
                    "deletion without reference bases in {}",
                    md
                )));
            }
            ops.push(MdOp::ReadGap(bytes[start..i].to_ascii_uppercase()));
        } else if c.is_ascii_alphabetic() {
            let start = i;
            while i < bytes.len() && bytes[i].is_ascii_alphabetic() {
                i += 1;
            }
            ops.push(MdOp::MismatchRun(bytes[start..i].to_ascii_uppercase()));
        } else {
            return Err(TandemError::MalformedMdString(format!(
                "unrecognized character '{}' in {}",
                c as char, md
            )));
        }
    }

    Ok(ops)
}

///
/// Number of soft-clipped read bases at the left and right ends of an
/// alignment. Hard clips outside the soft clips are skipped over.
///
pub fn soft_clip_lengths(ops: &[CigarOp]) -> (usize, usize) {
    let left = ops
        .iter()
        .skip_while(|op| matches!(op, CigarOp::HardClip(_)))
        .take_while(|op| matches!(op, CigarOp::SoftClip(_)))
        .map(|op| op.len())
        .sum();
    let right = ops
        .iter()
        .rev()
        .skip_while(|op| matches!(op, CigarOp::HardClip(_)))
        .take_while(|op| matches!(op, CigarOp::SoftClip(_)))
        .map(|op| op.len())
        .sum();
    (left, right)
}

pub fn read_length(ops: &[CigarOp]) -> usize {
    ops.iter().filter(|op| op.consumes_read()).map(|op| op.len()).sum()
}

pub fn reference_length(ops: &[CigarOp]) -> usize {
    ops.iter()
        .filter(|op| op.consumes_reference())
        .map(|op| op.len())
        .sum()
}

/// Cursor over MD:Z operations that allows a single operation to be
/// consumed across several CIGAR runs.
struct MdCursor<'a> {
    ops: &'a [MdOp],
    idx: usize,
    used: usize,
}

impl<'a> MdCursor<'a> {
    fn current(&self) -> Option<&'a MdOp> {
        self.ops.get(self.idx)
    }

    fn remaining_in_current(&self) -> usize {
        self.current().map_or(0, |op| op.len() - self.used)
    }

    fn advance(&mut self, n: usize) {
        self.used += n;
        if self.current().is_some_and(|op| self.used >= op.len()) {
            self.idx += 1;
            self.used = 0;
        }
    }

    fn exhausted(&self) -> bool {
        self.idx >= self.ops.len()
    }
}

///
/// Rebuild the stacked alignment described by a read, its CIGAR and its
/// MD:Z. Soft-clipped bases do not appear in the result.
///
/// # Arguments
///
/// - read: the read sequence as stored in the alignment record
/// - cigar: parsed CIGAR
/// - md: parsed MD:Z
///
pub fn to_stacked_alignment(read: &[u8], cigar: &[CigarOp], md: &[MdOp]) -> Result<StackedAlignment> {
    let expected_read_len = read_length(cigar);
    if expected_read_len != read.len() {
        return Err(TandemError::MalformedCigar(format!(
            "CIGAR consumes {} read bases but the read has {}",
            expected_read_len,
            read.len()
        )));
    }

    let mut read_side = Vec::with_capacity(read.len());
    let mut ref_side = Vec::with_capacity(read.len());
    let mut rdoff = 0;
    let mut cursor = MdCursor {
        ops: md,
        idx: 0,
        used: 0,
    };

    for op in cigar {
        match *op {
            CigarOp::Match(n) => {
                let mut left = n;
                while left > 0 {
                    match cursor.current() {
                        Some(MdOp::MatchRun(_)) => {
                            let take = left.min(cursor.remaining_in_current());
                            let bases = &read[rdoff..rdoff + take];
                            read_side.extend_from_slice(bases);
                            ref_side.extend_from_slice(bases);
                            cursor.advance(take);
                            rdoff += take;
                            left -= take;
                        }
                        Some(MdOp::MismatchRun(ref_bases)) => {
                            let take = left.min(cursor.remaining_in_current());
                            for k in 0..take {
                                let rd = read[rdoff + k];
                                let rf = ref_bases[cursor.used + k];
                                if rd.eq_ignore_ascii_case(&rf) {
                                    return Err(TandemError::CigarMdMismatch(format!(
                                        "MD:Z mismatch at read offset {} has identical base {}",
                                        rdoff + k,
                                        rd as char
                                    )));
                                }
                                read_side.push(rd);
                                ref_side.push(rf);
                            }
                            cursor.advance(take);
                            rdoff += take;
                            left -= take;
                        }
                        Some(MdOp::ReadGap(_)) => {
                            return Err(TandemError::CigarMdMismatch(
                                "MD:Z deletion falls inside a CIGAR match run".to_string(),
                            ));
                        }
                        None => {
                            // MD:Z ran out early; the rest of the run is taken as matching
                            let bases = &read[rdoff..rdoff + left];
                            read_side.extend_from_slice(bases);
                            ref_side.extend_from_slice(bases);
                            rdoff += left;
                            left = 0;
                        }
                    }
                }
            }
            CigarOp::Insertion(n) => {
                read_side.extend_from_slice(&read[rdoff..rdoff + n]);
                ref_side.extend(std::iter::repeat_n(GAP, n));
                rdoff += n;
            }
            CigarOp::Deletion(n) => match cursor.current() {
                Some(MdOp::ReadGap(ref_bases)) if cursor.used == 0 && ref_bases.len() == n => {
                    read_side.extend(std::iter::repeat_n(GAP, n));
                    ref_side.extend_from_slice(ref_bases);
                    cursor.advance(n);
                }
                Some(other) => {
                    return Err(TandemError::CigarMdMismatch(format!(
                        "CIGAR deletion of {} does not line up with MD:Z operation {:?}",
                        n, other
                    )));
                }
                None => {
                    return Err(TandemError::CigarMdMismatch(format!(
                        "CIGAR deletion of {} has no MD:Z counterpart",
                        n
                    )));
                }
            },
            CigarOp::SoftClip(n) => {
                rdoff += n;
            }
            CigarOp::HardClip(_) => {}
            CigarOp::SkippedRegion(_) | CigarOp::Padding(_) => {
                return Err(TandemError::MalformedCigar(format!(
                    "{:?} cannot be represented in a stacked alignment",
                    op
                )));
            }
        }
    }

    if !cursor.exhausted() {
        return Err(TandemError::CigarMdMismatch(format!(
            "{} MD:Z operations left unconsumed",
            md.len() - cursor.idx
        )));
    }

    StackedAlignment::new(read_side, ref_side)
}
