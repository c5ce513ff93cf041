use std::borrow::Cow;

use rand::Rng;

use tandem_core::models::Strand;
use tandem_core::{Result, TandemError};

use crate::stacked::{Column, StackedAlignment};
use crate::template::ReadTemplate;

const BASES: [u8; 4] = *b"ACGT";

///
/// Bases and qualities of a synthetic read, in sequencing orientation.
///
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MutatedRead {
    pub seq: Vec<u8>,
    pub qual: Vec<u8>,
}

impl MutatedRead {
    pub fn len(&self) -> usize {
        self.seq.len()
    }

    pub fn is_empty(&self) -> bool {
        self.seq.is_empty()
    }
}

///
/// Applies a template's edits to a reference substring.
///
/// The substring must already be in the orientation the read will be
/// sequenced in. When that orientation differs from the template's, the
/// template's alignment and qualities are walked back to front so that the
/// edits land where the template's sequencer would have put them.
///
#[derive(Debug, Clone, Copy, Default)]
pub struct ReadMutator {
    perfect_score: Option<i64>,
}

impl ReadMutator {
    pub fn new(perfect_score: Option<i64>) -> Self {
        Self { perfect_score }
    }

    pub fn perfect_score(&self) -> Option<i64> {
        self.perfect_score
    }

    pub fn mutate<R: Rng>(
        &self,
        substring: &[u8],
        strand: Strand,
        template: &ReadTemplate,
        rng: &mut R,
    ) -> Result<MutatedRead> {
        let span = template.reference_span();
        if substring.len() != span {
            return Err(TandemError::LengthMismatch(format!(
                "substring has {} bases, template spans {}",
                substring.len(),
                span
            )));
        }
        if let Some(perfect) = self.perfect_score {
            let edits = template.alignment.num_edits();
            if template.score == perfect && edits > 0 {
                return Err(TandemError::PerfectScoreViolation {
                    score: template.score,
                    edits,
                });
            }
        }

        let flip = template.strand != strand;
        let alignment: Cow<StackedAlignment> = if flip {
            Cow::Owned(template.alignment.reversed())
        } else {
            Cow::Borrowed(&template.alignment)
        };
        let qual: Vec<u8> = if flip {
            template.quality.iter().rev().copied().collect()
        } else {
            template.quality.clone()
        };

        let mut seq = Vec::with_capacity(qual.len());
        let mut rfi = 0;
        for column in alignment.columns() {
            match column {
                Column::Insertion { read } => seq.push(read),
                Column::Deletion { .. } => rfi += 1,
                Column::Mismatch { read, .. } if read.eq_ignore_ascii_case(&b'N') => {
                    seq.push(b'N');
                    rfi += 1;
                }
                Column::Mismatch { .. } => {
                    seq.push(substitute(substring[rfi], rng));
                    rfi += 1;
                }
                Column::Match { .. } => {
                    seq.push(substring[rfi]);
                    rfi += 1;
                }
            }
        }

        if seq.len() != qual.len() {
            return Err(TandemError::LengthMismatch(format!(
                "mutated read has {} bases but template has {} qualities",
                seq.len(),
                qual.len()
            )));
        }
        Ok(MutatedRead { seq, qual })
    }
}

/// A base other than `base`, uniformly among the remaining three
fn substitute<R: Rng>(base: u8, rng: &mut R) -> u8 {
    let upper = base.to_ascii_uppercase();
    match BASES.iter().position(|&b| b == upper) {
        Some(pos) => BASES[(pos + 1 + rng.random_range(0..3)) % 4],
        None => BASES[rng.random_range(0..4)],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use rstest::*;

    fn template(score: i64, strand: Strand, read_side: &str, ref_side: &str, qual: &str) -> ReadTemplate {
        ReadTemplate {
            score,
            strand,
            quality: qual.as_bytes().to_vec(),
            alignment: StackedAlignment::new(read_side.as_bytes().to_vec(), ref_side.as_bytes().to_vec())
                .unwrap(),
            is_mate1: true,
            opposite_len: None,
        }
    }

    fn levenshtein(a: &[u8], b: &[u8]) -> usize {
        let mut row: Vec<usize> = (0..=b.len()).collect();
        for i in 1..=a.len() {
            let prev = row.clone();
            row[0] = i;
            for j in 1..=b.len() {
                let sub = prev[j - 1] + usize::from(a[i - 1] != b[j - 1]);
                row[j] = sub.min(prev[j] + 1).min(row[j - 1] + 1);
            }
        }
        row[b.len()]
    }

    #[fixture]
    fn gapped() -> ReadTemplate {
        // mismatches at columns 3 and 20, insertion at 10, deletion at 17
        template(
            -20,
            Strand::Forward,
            "TTTATTTTTTGTTTTTT-TTATTT",
            "TTTTTTTTTT-TTTTTTTTTTTTT",
            "ABCDEFGHIJKLMNOPQRSTUVW",
        )
    }

    #[rstest]
    fn test_edit_distance_matches_template(gapped: ReadTemplate) {
        let mutator = ReadMutator::new(Some(0));
        let substring = b"ACGTTGCAAGTCCATGGACTGAT";
        let expected = gapped.alignment.num_gaps() + gapped.alignment.num_mismatches();
        assert_eq!(expected, 4);

        let mut rng = StdRng::seed_from_u64(11);
        for _ in 0..100 {
            let read = mutator.mutate(substring, Strand::Forward, &gapped, &mut rng).unwrap();
            assert_eq!(read.len(), gapped.read_len());
            assert_eq!(read.seq.len(), read.qual.len());
            assert_eq!(read.seq[10], b'G');
            assert_eq!(levenshtein(substring, &read.seq), expected);
        }
    }

    #[rstest]
    fn test_substitutions_differ_from_reference() {
        let t = template(-12, Strand::Forward, "AGAAGA", "AAAAAA", "IIIIII");
        let mutator = ReadMutator::new(None);
        let substring = b"ACGTAC";
        let mut rng = StdRng::seed_from_u64(3);
        let mut seen = [[false; 4]; 2];

        for _ in 0..300 {
            let read = mutator.mutate(substring, Strand::Forward, &t, &mut rng).unwrap();
            for (slot, col) in [1usize, 4].iter().enumerate() {
                assert_ne!(read.seq[*col], substring[*col]);
                let pos = BASES.iter().position(|&b| b == read.seq[*col]).unwrap();
                seen[slot][pos] = true;
            }
            for col in [0usize, 2, 3, 5] {
                assert_eq!(read.seq[col], substring[col]);
            }
        }
        // C and A are never produced at their own columns; the other three are
        assert_eq!(seen[0], [true, false, true, true]);
        assert_eq!(seen[1], [false, true, true, true]);
    }

    #[rstest]
    fn test_opposite_strand_reverses_template() {
        let t = template(-9, Strand::Forward, "AAGAAA-A", "AA-AAAAA", "ABCDEFG");
        let mutator = ReadMutator::new(Some(0));
        let mut rng = StdRng::seed_from_u64(0);

        let same = mutator.mutate(b"ACGTACG", Strand::Forward, &t, &mut rng).unwrap();
        assert_eq!(same.seq, b"ACGGTAG".to_vec());
        assert_eq!(same.qual, b"ABCDEFG".to_vec());

        let flipped = mutator.mutate(b"ACGTACG", Strand::Reverse, &t, &mut rng).unwrap();
        assert_eq!(flipped.seq, b"AGTAGCG".to_vec());
        assert_eq!(flipped.qual, b"GFEDCBA".to_vec());
    }

    #[rstest]
    fn test_n_mismatch_is_kept() {
        let t = template(0, Strand::Reverse, "ACNT", "ACGT", "IIII");
        let mutator = ReadMutator::new(Some(0));
        let mut rng = StdRng::seed_from_u64(0);
        let read = mutator.mutate(b"TTTT", Strand::Reverse, &t, &mut rng).unwrap();
        assert_eq!(read.seq, b"TTNT".to_vec());
    }

    #[rstest]
    fn test_perfect_score_guard() {
        let t = template(0, Strand::Forward, "ACGA", "ACGT", "IIII");
        let mut rng = StdRng::seed_from_u64(0);

        let err = ReadMutator::new(Some(0))
            .mutate(b"ACGT", Strand::Forward, &t, &mut rng)
            .unwrap_err();
        assert!(matches!(err, TandemError::PerfectScoreViolation { score: 0, edits: 1 }));

        let read = ReadMutator::new(None)
            .mutate(b"ACGT", Strand::Forward, &t, &mut rng)
            .unwrap();
        assert_eq!(read.len(), 4);
    }

    #[rstest]
    #[case(b"ACG".as_slice())]
    #[case(b"ACGTA".as_slice())]
    fn test_wrong_substring_length(#[case] substring: &[u8]) {
        let t = template(-1, Strand::Forward, "ACGT", "ACGT", "IIII");
        let mut rng = StdRng::seed_from_u64(0);
        assert!(matches!(
            ReadMutator::new(None).mutate(substring, Strand::Forward, &t, &mut rng),
            Err(TandemError::LengthMismatch(_))
        ));
    }
}
