use thiserror::Error;

#[derive(Error, Debug)]
pub enum TandemError {
    #[error("Malformed CIGAR string: {0}")]
    MalformedCigar(String),

    #[error("Malformed MD:Z string: {0}")]
    MalformedMdString(String),

    #[error("CIGAR and MD:Z disagree: {0}")]
    CigarMdMismatch(String),

    #[error("Cannot draw from an empty reservoir")]
    EmptyReservoir,

    #[error("Cannot draw from an empty distribution: {0}")]
    EmptyDistribution(String),

    #[error("Distribution must be finalized before drawing")]
    NotFinalized,

    #[error("Distribution is finalized; no more alignments can be added")]
    AlreadyFinalized,

    #[error("No ACGT-only substring of length {length} found after {attempts} attempts")]
    NoValidSubstring { length: usize, attempts: usize },

    #[error("Requested {length} bases at offset {offset} of {name}, which is {available} bases long")]
    ReferenceOutOfBounds {
        name: String,
        offset: usize,
        length: usize,
        available: usize,
    },

    #[error("Unknown reference sequence: {0}")]
    UnknownReference(String),

    #[error("Synthetic read name is {0} bytes; names must be shorter than 255 bytes")]
    NameTooLong(usize),

    #[error("Length mismatch: {0}")]
    LengthMismatch(String),

    #[error("Template with perfect score {score} carries {edits} edits")]
    PerfectScoreViolation { score: i64, edits: usize },

    #[error("Malformed synthetic read name: {0}")]
    MalformedSyntheticName(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Model serialization failed: {0}")]
    Serialization(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl TandemError {
    ///
    /// True for errors caused by a single bad input alignment. Training skips
    /// these records instead of aborting.
    ///
    pub fn is_record_error(&self) -> bool {
        matches!(
            self,
            TandemError::MalformedCigar(_)
                | TandemError::MalformedMdString(_)
                | TandemError::CigarMdMismatch(_)
                | TandemError::LengthMismatch(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, TandemError>;

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::*;

    #[rstest]
    #[case(TandemError::MalformedCigar("10Q".to_string()), true)]
    #[case(TandemError::MalformedMdString("5%".to_string()), true)]
    #[case(TandemError::CigarMdMismatch("extra ops".to_string()), true)]
    #[case(TandemError::NotFinalized, false)]
    #[case(TandemError::NameTooLong(300), false)]
    fn test_record_errors(#[case] err: TandemError, #[case] expected: bool) {
        assert_eq!(err.is_record_error(), expected);
    }

    #[rstest]
    fn test_error_messages() {
        let err = TandemError::NoValidSubstring {
            length: 50,
            attempts: 10,
        };
        assert_eq!(
            err.to_string(),
            "No ACGT-only substring of length 50 found after 10 attempts"
        );
    }
}
