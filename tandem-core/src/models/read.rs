use std::fmt::{self, Display};

///
/// A synthetic read ready to be written out for re-alignment.
///
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Read {
    pub name: String,
    pub seq: Vec<u8>,
    pub qual: Vec<u8>,
}

impl Read {
    pub fn new(name: String, seq: Vec<u8>, qual: Vec<u8>) -> Self {
        Self { name, seq, qual }
    }

    pub fn len(&self) -> usize {
        self.seq.len()
    }

    pub fn is_empty(&self) -> bool {
        self.seq.is_empty()
    }

    ///
    /// Render as a four-line FASTQ record (no trailing newline).
    ///
    pub fn to_fastq(&self) -> String {
        fastq_record(&self.name, &self.seq, &self.qual)
    }

    ///
    /// Render one or two reads as FASTQ, adding `/1` and `/2` suffixes to
    /// the names of a pair so the records can be interleaved in one file.
    ///
    pub fn to_interleaved_fastq(rd1: &Read, rd2: Option<&Read>) -> String {
        match rd2 {
            Some(rd2) => {
                let name1 = with_mate_suffix(&rd1.name, "/1");
                let name2 = with_mate_suffix(&rd2.name, "/2");
                format!(
                    "{}\n{}",
                    fastq_record(&name1, &rd1.seq, &rd1.qual),
                    fastq_record(&name2, &rd2.seq, &rd2.qual)
                )
            }
            None => rd1.to_fastq(),
        }
    }

    ///
    /// Render one or two reads as a single tab6 line: name, sequence and
    /// qualities for each mate.
    ///
    pub fn to_tab6(rd1: &Read, rd2: Option<&Read>) -> String {
        let mut fields = vec![
            rd1.name.clone(),
            String::from_utf8_lossy(&rd1.seq).into_owned(),
            String::from_utf8_lossy(&rd1.qual).into_owned(),
        ];
        if let Some(rd2) = rd2 {
            fields.push(rd2.name.clone());
            fields.push(String::from_utf8_lossy(&rd2.seq).into_owned());
            fields.push(String::from_utf8_lossy(&rd2.qual).into_owned());
        }
        fields.join("\t")
    }
}

impl Display for Read {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.to_fastq())
    }
}

fn fastq_record(name: &str, seq: &[u8], qual: &[u8]) -> String {
    format!(
        "@{}\n{}\n+\n{}",
        name,
        String::from_utf8_lossy(seq),
        String::from_utf8_lossy(qual)
    )
}

fn with_mate_suffix(name: &str, suffix: &str) -> String {
    if name.ends_with(suffix) {
        name.to_string()
    } else {
        format!("{}{}", name, suffix)
    }
}
