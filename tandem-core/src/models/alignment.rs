use std::fmt::{self, Display};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::models::strand::Strand;

///
/// One aligned read as reported by the external aligner. This is the unit of
/// training input: everything needed to build a template from it.
///
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlignmentRecord {
    pub ref_name: String,
    /// 0-based leftmost aligned reference position (soft clips excluded)
    pub ref_pos: u64,
    pub strand: Strand,
    pub is_mate1: bool,
    pub score: i64,
    pub cigar: String,
    pub mdz: String,
    pub seq: String,
    pub qual: String,
    /// Length of the opposite mate, when this is one end of a pair
    #[serde(default)]
    pub opposite_len: Option<usize>,
    /// Whether the aligner placed this read correctly, when known
    #[serde(default)]
    pub correct: Option<bool>,
}

impl AlignmentRecord {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        ref_name: &str,
        ref_pos: u64,
        strand: Strand,
        score: i64,
        cigar: &str,
        mdz: &str,
        seq: &str,
        qual: &str,
    ) -> Self {
        Self {
            ref_name: ref_name.to_string(),
            ref_pos,
            strand,
            is_mate1: true,
            score,
            cigar: cigar.to_string(),
            mdz: mdz.to_string(),
            seq: seq.to_string(),
            qual: qual.to_string(),
            opposite_len: None,
            correct: None,
        }
    }

    pub fn with_mate1(mut self, is_mate1: bool) -> Self {
        self.is_mate1 = is_mate1;
        self
    }

    pub fn with_opposite_len(mut self, len: usize) -> Self {
        self.opposite_len = Some(len);
        self
    }

    pub fn with_correct(mut self, correct: bool) -> Self {
        self.correct = Some(correct);
        self
    }
}

///
/// The four alignment outcomes the simulator reproduces.
///
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum AlignmentKind {
    Unpaired,
    BadEnd,
    Concordant,
    Discordant,
}

impl AlignmentKind {
    pub const ALL: [AlignmentKind; 4] = [
        AlignmentKind::Unpaired,
        AlignmentKind::BadEnd,
        AlignmentKind::Concordant,
        AlignmentKind::Discordant,
    ];

    /// Short label used in synthetic read names and output file names.
    pub fn label(self) -> &'static str {
        match self {
            AlignmentKind::Unpaired => "unp",
            AlignmentKind::BadEnd => "bad_end",
            AlignmentKind::Concordant => "conc",
            AlignmentKind::Discordant => "disc",
        }
    }

    pub fn is_paired(self) -> bool {
        !matches!(self, AlignmentKind::Unpaired)
    }
}

impl Display for AlignmentKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

impl FromStr for AlignmentKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        AlignmentKind::ALL
            .into_iter()
            .find(|k| k.label() == s)
            .ok_or_else(|| format!("Unknown alignment kind: {}", s))
    }
}
