use tandem_core::models::{AlignmentKind, Strand};
use tandem_core::{Result, TandemError};

pub const NAME_PREFIX: &str = "!!ts!!";
pub const NAME_SEP: &str = "!!ts-sep!!";

/// Names at or above this many bytes are rejected by common alignment formats
pub const MAX_NAME_LEN: usize = 255;

/// Reference name recorded for a mate that was never placed on the genome
pub const UNPLACED_REF: &str = "*";

///
/// Where a synthetic read truly came from.
///
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MateOrigin {
    pub ref_name: String,
    pub strand: Strand,
    /// 0-based leftmost reference position
    pub offset: u64,
    /// Score of the template the read was simulated from
    pub score: i64,
}

impl MateOrigin {
    pub fn new(ref_name: &str, strand: Strand, offset: u64, score: i64) -> Self {
        Self {
            ref_name: ref_name.to_string(),
            strand,
            offset,
            score,
        }
    }

    /// Origin of a random mate that is not expected to align
    pub fn unplaced() -> Self {
        Self::new(UNPLACED_REF, Strand::Forward, 0, 0)
    }

    pub fn is_placed(&self) -> bool {
        self.ref_name != UNPLACED_REF
    }

    ///
    /// Whether an alignment at 0-based `pos` on `ref_name`/`strand`
    /// recovers this origin, allowing `wiggle` bases of slop.
    ///
    pub fn is_correct(&self, ref_name: &str, strand: Strand, pos: u64, wiggle: u64) -> bool {
        self.is_placed()
            && self.ref_name == ref_name
            && self.strand == strand
            && self.offset.abs_diff(pos) < wiggle
    }

    fn push_fields(&self, fields: &mut Vec<String>) {
        fields.push(self.ref_name.clone());
        fields.push(self.strand.symbol().to_string());
        fields.push(self.offset.to_string());
        fields.push(self.score.to_string());
    }

    fn parse_fields(fields: &[&str], name: &str) -> Result<Self> {
        let malformed = || TandemError::MalformedSyntheticName(name.to_string());
        let [ref_name, strand, offset, score] = fields else {
            return Err(malformed());
        };
        Ok(Self {
            ref_name: ref_name.to_string(),
            strand: strand.parse().map_err(|_| malformed())?,
            offset: offset.parse().map_err(|_| malformed())?,
            score: score.parse().map_err(|_| malformed())?,
        })
    }
}

///
/// Ground truth carried in a synthetic read's name so it survives a trip
/// through an aligner. Both mates of a pair share one name; `first` is
/// always mate 1.
///
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyntheticName {
    pub first: MateOrigin,
    pub second: Option<MateOrigin>,
    pub kind: AlignmentKind,
}

impl SyntheticName {
    pub fn unpaired(origin: MateOrigin) -> Self {
        Self {
            first: origin,
            second: None,
            kind: AlignmentKind::Unpaired,
        }
    }

    pub fn paired(mate1: MateOrigin, mate2: MateOrigin, kind: AlignmentKind) -> Self {
        Self {
            first: mate1,
            second: Some(mate2),
            kind,
        }
    }

    pub fn mate(&self, is_mate1: bool) -> Option<&MateOrigin> {
        if is_mate1 {
            Some(&self.first)
        } else {
            self.second.as_ref()
        }
    }

    pub fn encode(&self) -> Result<String> {
        let mut fields = vec![NAME_PREFIX.to_string()];
        self.first.push_fields(&mut fields);
        if let Some(second) = &self.second {
            second.push_fields(&mut fields);
        }
        fields.push(self.kind.label().to_string());

        let name = fields.join(NAME_SEP);
        if name.len() >= MAX_NAME_LEN {
            return Err(TandemError::NameTooLong(name.len()));
        }
        Ok(name)
    }

    ///
    /// Recover the ground truth from a read name as reported by an aligner.
    /// Anything after the first whitespace and a trailing `/1` or `/2` are
    /// ignored.
    ///
    pub fn parse(name: &str) -> Result<Self> {
        let malformed = || TandemError::MalformedSyntheticName(name.to_string());
        let token = name.split_whitespace().next().ok_or_else(malformed)?;
        let token = token
            .strip_suffix("/1")
            .or_else(|| token.strip_suffix("/2"))
            .unwrap_or(token);

        let fields: Vec<&str> = token.split(NAME_SEP).collect();
        let Some((&prefix, rest)) = fields.split_first() else {
            return Err(malformed());
        };
        let Some((&label, origins)) = rest.split_last() else {
            return Err(malformed());
        };
        if prefix != NAME_PREFIX {
            return Err(malformed());
        }
        let kind: AlignmentKind = label.parse().map_err(|_| malformed())?;

        match (origins.len(), kind.is_paired()) {
            (4, false) => Ok(Self::unpaired(MateOrigin::parse_fields(origins, name)?)),
            (8, true) => Ok(Self::paired(
                MateOrigin::parse_fields(&origins[..4], name)?,
                MateOrigin::parse_fields(&origins[4..], name)?,
                kind,
            )),
            _ => Err(malformed()),
        }
    }

    ///
    /// Whether an alignment of mate `is_mate1` (or the unpaired read) at
    /// 0-based `pos` recovers its true origin within `wiggle` bases.
    ///
    pub fn is_correct(
        &self,
        is_mate1: bool,
        ref_name: &str,
        strand: Strand,
        pos: u64,
        wiggle: u64,
    ) -> bool {
        self.mate(is_mate1)
            .is_some_and(|origin| origin.is_correct(ref_name, strand, pos, wiggle))
    }

    /// Whether `name` looks like one of ours, without fully parsing it
    pub fn is_synthetic(name: &str) -> bool {
        name.starts_with(NAME_PREFIX)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::*;

    #[rstest]
    fn test_unpaired_encoding() {
        let name = SyntheticName::unpaired(MateOrigin::new("chr1", Strand::Reverse, 1234, -7));
        assert_eq!(
            name.encode().unwrap(),
            "!!ts!!!!ts-sep!!chr1!!ts-sep!!-!!ts-sep!!1234!!ts-sep!!-7!!ts-sep!!unp"
        );
    }

    #[rstest]
    #[case(SyntheticName::unpaired(MateOrigin::new("chrX", Strand::Forward, 0, 0)))]
    #[case(SyntheticName::paired(
        MateOrigin::new("chr2", Strand::Forward, 100, -3),
        MateOrigin::new("chr2", Strand::Reverse, 350, -12),
        AlignmentKind::Concordant
    ))]
    #[case(SyntheticName::paired(
        MateOrigin::unplaced(),
        MateOrigin::new("chr7", Strand::Reverse, 9, -1),
        AlignmentKind::BadEnd
    ))]
    fn test_parse_recovers_name(#[case] name: SyntheticName) {
        let encoded = name.encode().unwrap();
        assert!(SyntheticName::is_synthetic(&encoded));
        assert_eq!(SyntheticName::parse(&encoded).unwrap(), name);
    }

    #[rstest]
    fn test_parse_ignores_mate_suffix_and_comment() {
        let name = SyntheticName::paired(
            MateOrigin::new("chr2", Strand::Forward, 100, -3),
            MateOrigin::new("chr3", Strand::Forward, 5, -4),
            AlignmentKind::Discordant,
        );
        let encoded = format!("{}/2 extra", name.encode().unwrap());
        let parsed = SyntheticName::parse(&encoded).unwrap();
        assert_eq!(parsed, name);
        assert_eq!(parsed.mate(false).unwrap().ref_name, "chr3");
    }

    #[rstest]
    #[case("read1")]
    #[case("")]
    #[case("!!ts!!!!ts-sep!!chr1!!ts-sep!!+!!ts-sep!!12!!ts-sep!!-1")]
    #[case("!!ts!!!!ts-sep!!chr1!!ts-sep!!?!!ts-sep!!12!!ts-sep!!-1!!ts-sep!!unp")]
    #[case("!!ts!!!!ts-sep!!chr1!!ts-sep!!+!!ts-sep!!12!!ts-sep!!-1!!ts-sep!!conc")]
    fn test_malformed(#[case] name: &str) {
        assert!(matches!(
            SyntheticName::parse(name),
            Err(TandemError::MalformedSyntheticName(_))
        ));
    }

    #[rstest]
    fn test_name_too_long() {
        let long_ref = "c".repeat(240);
        let name = SyntheticName::unpaired(MateOrigin::new(&long_ref, Strand::Forward, 1, 0));
        assert!(matches!(name.encode(), Err(TandemError::NameTooLong(_))));
    }

    #[rstest]
    #[case("chr1", Strand::Forward, 129, true)]
    #[case("chr1", Strand::Forward, 71, true)]
    #[case("chr1", Strand::Forward, 130, false)]
    #[case("chr1", Strand::Reverse, 100, false)]
    #[case("chr2", Strand::Forward, 100, false)]
    fn test_is_correct(#[case] ref_name: &str, #[case] strand: Strand, #[case] pos: u64, #[case] expected: bool) {
        let origin = MateOrigin::new("chr1", Strand::Forward, 100, -5);
        assert_eq!(origin.is_correct(ref_name, strand, pos, 30), expected);
    }

    #[rstest]
    fn test_name_is_correct_per_mate() {
        let name = SyntheticName::paired(
            MateOrigin::new("chr1", Strand::Forward, 100, -3),
            MateOrigin::new("chr1", Strand::Reverse, 400, -3),
            AlignmentKind::Concordant,
        );
        assert!(name.is_correct(true, "chr1", Strand::Forward, 110, 30));
        assert!(name.is_correct(false, "chr1", Strand::Reverse, 395, 30));
        assert!(!name.is_correct(false, "chr1", Strand::Forward, 100, 30));

        let unpaired = SyntheticName::unpaired(MateOrigin::new("chr1", Strand::Forward, 5, 0));
        assert!(!unpaired.is_correct(false, "chr1", Strand::Forward, 5, 30));
    }

    #[rstest]
    fn test_unplaced_never_correct() {
        assert!(!MateOrigin::unplaced().is_correct("*", Strand::Forward, 0, 30));
    }
}
