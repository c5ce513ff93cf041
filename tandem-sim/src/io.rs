use std::collections::BTreeMap;
use std::fmt::{self, Display};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::str::FromStr;

use anyhow::{Context, Result, bail};
use csv::ReaderBuilder;
use log::info;
use serde::Deserialize;

use tandem_core::models::{AlignmentKind, AlignmentRecord, Read, Strand};
use tandem_core::utils::{get_dynamic_reader, get_dynamic_writer};

use crate::model::TrainingItem;
use crate::simulator::SimulatedReads;

// ============================================================================
// Training Alignment Reader
// ============================================================================

/// One row of the tab-separated training table
#[derive(Debug, Deserialize)]
struct TrainingRow {
    category: String,
    ref_name: String,
    ref_pos: u64,
    fw: String,
    mate1: String,
    score: i64,
    cigar: String,
    mdz: String,
    seq: String,
    qual: String,
    opposite_len: Option<usize>,
    correct: Option<String>,
}

impl TrainingRow {
    fn into_record(self, row_num: usize) -> Result<AlignmentRecord> {
        let fw = parse_flag(&self.fw)
            .with_context(|| format!("Invalid fw flag {:?} on row {}", self.fw, row_num))?;
        let mate1 = parse_flag(&self.mate1)
            .with_context(|| format!("Invalid mate1 flag {:?} on row {}", self.mate1, row_num))?;
        let correct = match self.correct.as_deref() {
            None | Some("") => None,
            Some(flag) => Some(
                parse_flag(flag)
                    .with_context(|| format!("Invalid correct flag {:?} on row {}", flag, row_num))?,
            ),
        };

        let mut rec = AlignmentRecord::new(
            &self.ref_name,
            self.ref_pos,
            Strand::from_forward(fw),
            self.score,
            &self.cigar,
            &self.mdz,
            &self.seq,
            &self.qual,
        )
        .with_mate1(mate1);
        rec.opposite_len = self.opposite_len;
        rec.correct = correct;
        Ok(rec)
    }
}

fn parse_flag(s: &str) -> Option<bool> {
    match s {
        "1" | "T" | "true" | "+" => Some(true),
        "0" | "F" | "false" | "-" => Some(false),
        _ => None,
    }
}

///
/// Read a (optionally gzip'd) training table into training items.
///
/// The table is tab-separated with a header row naming the columns
/// `category ref_name ref_pos fw mate1 score cigar mdz seq qual opposite_len
/// correct`. Concordant and discordant pairs occupy two consecutive rows.
///
pub fn read_training_items(path: &Path) -> Result<Vec<TrainingItem>> {
    let reader = get_dynamic_reader(path)?;
    let items = parse_training_items(reader)
        .with_context(|| format!("Failed to read training alignments from {:?}", path))?;
    info!("Read {} training items from {:?}", items.len(), path);
    Ok(items)
}

pub fn parse_training_items<R: std::io::Read>(reader: R) -> Result<Vec<TrainingItem>> {
    let mut csv_reader = ReaderBuilder::new()
        .delimiter(b'\t')
        .comment(Some(b'#'))
        .from_reader(reader);
    let mut rows = csv_reader.deserialize::<TrainingRow>();
    let mut items = Vec::new();
    let mut row_num = 0;

    while let Some(row) = rows.next() {
        row_num += 1;
        let row = row.with_context(|| format!("Failed to parse training row {}", row_num))?;
        let kind: AlignmentKind = row.category.parse().map_err(anyhow::Error::msg)?;

        let item = match kind {
            AlignmentKind::Unpaired => TrainingItem::Unpaired(row.into_record(row_num)?),
            AlignmentKind::BadEnd => TrainingItem::BadEnd(row.into_record(row_num)?),
            AlignmentKind::Concordant | AlignmentKind::Discordant => {
                let first = row.into_record(row_num)?;
                let Some(mate) = rows.next() else {
                    bail!("{} alignment on row {} has no mate row", kind, row_num);
                };
                row_num += 1;
                let mate = mate.with_context(|| format!("Failed to parse training row {}", row_num))?;
                if mate.category != kind.label() {
                    bail!(
                        "row {} should be the {} mate of row {}, found {:?}",
                        row_num,
                        kind,
                        row_num - 1,
                        mate.category
                    );
                }
                let second = mate.into_record(row_num)?;
                if kind == AlignmentKind::Concordant {
                    TrainingItem::Concordant(first, second)
                } else {
                    TrainingItem::Discordant(first, second)
                }
            }
        };
        items.push(item);
    }

    Ok(items)
}

// ============================================================================
// Simulated Read Writer
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    /// FASTQ, with both ends of a pair interleaved
    #[default]
    Fastq,
    /// One tab-separated line per read or pair
    Tab6,
}

impl OutputFormat {
    pub fn extension(self) -> &'static str {
        match self {
            OutputFormat::Fastq => "fastq",
            OutputFormat::Tab6 => "tab6",
        }
    }

    pub fn render(self, reads: &SimulatedReads) -> String {
        let (rd1, rd2) = (reads.mate1(), reads.mate2());
        match self {
            OutputFormat::Fastq => Read::to_interleaved_fastq(rd1, rd2),
            OutputFormat::Tab6 => Read::to_tab6(rd1, rd2),
        }
    }
}

impl Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.extension())
    }
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "fastq" | "fq" => Ok(OutputFormat::Fastq),
            "tab6" => Ok(OutputFormat::Tab6),
            _ => Err(format!("Unknown output format: {}", s)),
        }
    }
}

///
/// Writes simulated reads to one file per alignment kind, named
/// `training_<label>.<format>` (plus `.gz` when compressing).
///
pub struct SimulationWriter {
    format: OutputFormat,
    writers: BTreeMap<AlignmentKind, (PathBuf, BufWriter<Box<dyn Write>>)>,
}

impl SimulationWriter {
    pub fn create(
        dir: &Path,
        format: OutputFormat,
        gzip: bool,
        kinds: &[AlignmentKind],
    ) -> Result<Self> {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create output directory: {:?}", dir))?;
        let mut writers = BTreeMap::new();
        for &kind in kinds {
            let path = Self::output_path(dir, kind, format, gzip);
            let writer = get_dynamic_writer(&path)?;
            writers.insert(kind, (path, writer));
        }
        Ok(Self { format, writers })
    }

    pub fn output_path(dir: &Path, kind: AlignmentKind, format: OutputFormat, gzip: bool) -> PathBuf {
        let mut file_name = format!("training_{}.{}", kind.label(), format.extension());
        if gzip {
            file_name.push_str(".gz");
        }
        dir.join(file_name)
    }

    ///
    /// Append reads of `kind`. Kinds without a file are an error.
    ///
    pub fn write(&mut self, kind: AlignmentKind, reads: &SimulatedReads) -> tandem_core::Result<()> {
        let Some((_, writer)) = self.writers.get_mut(&kind) else {
            return Err(tandem_core::TandemError::InvalidConfig(format!(
                "no output file was opened for {} reads",
                kind
            )));
        };
        writeln!(writer, "{}", self.format.render(reads))?;
        Ok(())
    }

    /// Flush and close every file, returning their paths
    pub fn finish(self) -> Result<Vec<PathBuf>> {
        let mut paths = Vec::with_capacity(self.writers.len());
        for (_, (path, mut writer)) in self.writers {
            writer
                .flush()
                .with_context(|| format!("Failed to flush {:?}", path))?;
            paths.push(path);
        }
        Ok(paths)
    }
}
