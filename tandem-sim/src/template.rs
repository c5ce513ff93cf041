use serde::{Deserialize, Serialize};

use tandem_core::models::{AlignmentRecord, Strand};
use tandem_core::{Result, TandemError};

use crate::cigar::{parse_cigar, parse_mdz, soft_clip_lengths, to_stacked_alignment};
use crate::consts::MISSING_QUALITY_FILL;
use crate::stacked::StackedAlignment;

///
/// The edit and quality profile of one observed alignment, reusable to
/// generate synthetic reads that look like it.
///
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReadTemplate {
    pub score: i64,
    pub strand: Strand,
    /// Qualities of the aligned (non-soft-clipped) read bases
    pub quality: Vec<u8>,
    pub alignment: StackedAlignment,
    pub is_mate1: bool,
    /// Read length of the opposite mate, for ends of a pair
    pub opposite_len: Option<usize>,
}

impl ReadTemplate {
    ///
    /// Build a template from an aligned record. Soft-clipped bases are
    /// dropped from both the alignment and the qualities; a missing quality
    /// string (`*`) is replaced by a constant high quality.
    ///
    pub fn from_record(rec: &AlignmentRecord) -> Result<Self> {
        let ops = parse_cigar(&rec.cigar)?;
        let md = parse_mdz(&rec.mdz)?;
        let seq = rec.seq.as_bytes().to_ascii_uppercase();
        let alignment = to_stacked_alignment(&seq, &ops, &md)?;

        let aligned_len = alignment.read_len();
        if aligned_len == 0 || alignment.ref_len() == 0 {
            return Err(TandemError::LengthMismatch(format!(
                "alignment {} covers {} read and {} reference bases",
                rec.cigar,
                aligned_len,
                alignment.ref_len()
            )));
        }

        let quality = if rec.qual == "*" {
            vec![MISSING_QUALITY_FILL; aligned_len]
        } else {
            let qual = rec.qual.as_bytes();
            if qual.len() != seq.len() {
                return Err(TandemError::LengthMismatch(format!(
                    "read has {} bases but {} qualities",
                    seq.len(),
                    qual.len()
                )));
            }
            let (left, right) = soft_clip_lengths(&ops);
            qual[left..qual.len() - right].to_vec()
        };

        Ok(Self {
            score: rec.score,
            strand: rec.strand,
            quality,
            alignment,
            is_mate1: rec.is_mate1,
            opposite_len: rec.opposite_len,
        })
    }

    /// Reference bases a read drawn from this template must be mutated from
    pub fn reference_span(&self) -> usize {
        self.alignment.ref_len()
    }

    /// Length of the synthetic read this template produces
    pub fn read_len(&self) -> usize {
        self.alignment.read_len()
    }
}

///
/// Two templates observed together as a properly or improperly paired
/// alignment. `first` is mate 1.
///
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PairTemplate {
    pub first: ReadTemplate,
    pub second: ReadTemplate,
    pub fragment_length: usize,
    /// Whether mate 1 is the leftmost mate on the reference
    pub first_upstream: bool,
}

impl PairTemplate {
    ///
    /// Build a pair template from both mates' records. Returns `None` when
    /// the mates align to different reference sequences, since no fragment
    /// length exists for them.
    ///
    pub fn from_records(a: &AlignmentRecord, b: &AlignmentRecord) -> Result<Option<Self>> {
        if a.ref_name != b.ref_name {
            return Ok(None);
        }
        let (rec1, rec2) = if !a.is_mate1 && b.is_mate1 { (b, a) } else { (a, b) };

        let mut first = ReadTemplate::from_record(rec1)?;
        let mut second = ReadTemplate::from_record(rec2)?;
        first.opposite_len = Some(second.read_len());
        second.opposite_len = Some(first.read_len());

        let start1 = rec1.ref_pos;
        let start2 = rec2.ref_pos;
        let end1 = start1 + first.reference_span() as u64;
        let end2 = start2 + second.reference_span() as u64;
        let fragment_length = (end1.max(end2) - start1.min(start2)) as usize;

        let first_upstream = start1 < start2 || (start1 == start2 && first.strand.is_forward());

        Ok(Some(Self {
            first,
            second,
            fragment_length,
            first_upstream,
        }))
    }

    /// Sum of both mates' scores, the stratification key for pairs
    pub fn score(&self) -> i64 {
        self.first.score + self.second.score
    }

    pub fn upstream(&self) -> &ReadTemplate {
        if self.first_upstream { &self.first } else { &self.second }
    }

    pub fn downstream(&self) -> &ReadTemplate {
        if self.first_upstream { &self.second } else { &self.first }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::*;

    #[rstest]
    fn test_template_trims_soft_clips() {
        let rec = AlignmentRecord::new("chr1", 100, Strand::Forward, -6, "2S4M1S", "2A1", "TTACGTG", "!#ABCD$");
        let t = ReadTemplate::from_record(&rec).unwrap();
        assert_eq!(t.quality, b"ABCD".to_vec());
        assert_eq!(t.read_len(), 4);
        assert_eq!(t.reference_span(), 4);
        assert_eq!(t.alignment.ref_side(), b"ACAT");
    }

    #[rstest]
    fn test_missing_quality_is_filled() {
        let rec = AlignmentRecord::new("chr1", 0, Strand::Reverse, 0, "3M1I2M", "5", "acgtac", "*");
        let t = ReadTemplate::from_record(&rec).unwrap();
        assert_eq!(t.quality, b"IIIIII".to_vec());
        assert_eq!(t.alignment.read_side(), b"ACGTAC");
        assert_eq!(t.reference_span(), 5);
    }

    #[rstest]
    #[case("4M", "4", "ACGT", "III")]
    #[case("4I", "0", "ACGT", "IIII")]
    fn test_template_length_errors(#[case] cigar: &str, #[case] md: &str, #[case] seq: &str, #[case] qual: &str) {
        let rec = AlignmentRecord::new("chr1", 0, Strand::Forward, 0, cigar, md, seq, qual);
        let err = ReadTemplate::from_record(&rec).unwrap_err();
        assert!(matches!(err, TandemError::LengthMismatch(_)));
    }

    #[rstest]
    fn test_pair_fragment_length() {
        // mate 1 at [100, 110), mate 2 reverse at [250, 258) with a 2-base deletion
        let m1 = AlignmentRecord::new("chr2", 100, Strand::Forward, -2, "10M", "10", "ACGTACGTAC", "IIIIIIIIII");
        let m2 = AlignmentRecord::new("chr2", 250, Strand::Reverse, -9, "3M2D3M", "3^GG3", "ACGTAC", "IIIIII")
            .with_mate1(false);

        let pair = PairTemplate::from_records(&m2, &m1).unwrap().unwrap();
        assert_eq!(pair.fragment_length, 158);
        assert!(pair.first_upstream);
        assert_eq!(pair.first.read_len(), 10);
        assert_eq!(pair.first.opposite_len, Some(6));
        assert_eq!(pair.second.opposite_len, Some(10));
        assert_eq!(pair.score(), -11);
        assert_eq!(pair.upstream().read_len(), 10);
        assert_eq!(pair.downstream().read_len(), 6);
    }

    #[rstest]
    fn test_pair_downstream_mate1() {
        let m1 = AlignmentRecord::new("chr2", 500, Strand::Reverse, 0, "4M", "4", "ACGT", "IIII");
        let m2 = AlignmentRecord::new("chr2", 480, Strand::Forward, 0, "4M", "4", "ACGT", "IIII").with_mate1(false);
        let pair = PairTemplate::from_records(&m1, &m2).unwrap().unwrap();
        assert_eq!(pair.fragment_length, 24);
        assert!(!pair.first_upstream);
    }

    #[rstest]
    fn test_pair_on_different_references() {
        let m1 = AlignmentRecord::new("chr1", 0, Strand::Forward, 0, "4M", "4", "ACGT", "IIII");
        let m2 = AlignmentRecord::new("chr2", 0, Strand::Forward, 0, "4M", "4", "ACGT", "IIII").with_mate1(false);
        assert!(PairTemplate::from_records(&m1, &m2).unwrap().is_none());
    }
}
