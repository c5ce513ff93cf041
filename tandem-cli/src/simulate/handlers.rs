use std::path::Path;

use anyhow::{Context, Result, anyhow};
use clap::ArgMatches;
use indicatif::{ProgressBar, ProgressStyle};
use log::info;

use tandem_core::models::AlignmentKind;
use tandem_sim::consts::DEFAULT_READS_OUT;
use tandem_sim::io::{OutputFormat, SimulationWriter};
use tandem_sim::{BatchPlan, InMemoryReference, InputModel, SimulatorWrapper};

use crate::config::handlers::load_config;

pub fn run_simulate(matches: &ArgMatches) -> Result<()> {
    let model_path = matches
        .get_one::<String>("model")
        .context("A path to a trained model is required.")?;

    let fastas: Vec<&String> = matches
        .get_many::<String>("ref")
        .context("At least one reference FASTA is required.")?
        .collect();

    let default_out = DEFAULT_READS_OUT.to_string();
    let output = matches.get_one::<String>("output_dir").unwrap_or(&default_out);

    let format: OutputFormat = matches
        .get_one::<String>("format")
        .map(|f| f.parse::<OutputFormat>())
        .transpose()
        .map_err(|e: String| anyhow!(e))?
        .unwrap_or_default();
    let gzip = matches.get_flag("gzip");

    let config = load_config(matches)?;

    let model = InputModel::load(Path::new(model_path))
        .with_context(|| format!("Failed to load model from {}", model_path))?;

    let mut reference = InMemoryReference::new();
    for fasta in fastas {
        reference
            .add_fasta(Path::new(fasta))
            .with_context(|| format!("Failed to load reference from {}", fasta))?;
    }

    let plan = BatchPlan::from_model(&model, &config);
    let kinds: Vec<AlignmentKind> = AlignmentKind::ALL
        .into_iter()
        .filter(|kind| plan.get(*kind) > 0)
        .collect();
    for kind in &kinds {
        info!("Simulating {} {} reads", plan.get(*kind), kind);
    }

    let mut sim = SimulatorWrapper::new(model, reference, &config)?;
    let mut writer = SimulationWriter::create(Path::new(output), format, gzip, &kinds)?;

    let progress = ProgressBar::new(plan.total() as u64);
    progress.set_style(
        ProgressStyle::default_bar()
            .template("[{elapsed_precise}] {bar:40.cyan/blue} {pos}/{len} {msg}")?,
    );

    let counts = sim.simulate_batch(&plan, |kind, reads| {
        progress.inc(1);
        writer.write(kind, &reads)
    })?;
    progress.finish_and_clear();

    for path in writer.finish()? {
        info!("Wrote {}", path.display());
    }
    info!("Simulated {} reads and pairs in total", counts.total());

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::simulate::cli::create_simulate_cli;
    use pretty_assertions::assert_eq;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use rstest::*;
    use std::io::BufRead;
    use tempfile::tempdir;

    use tandem_core::models::{AlignmentRecord, Strand};
    use tandem_core::utils::get_dynamic_reader;
    use tandem_sim::TandemConfig;

    #[rstest]
    fn test_format_must_be_known() {
        let result = create_simulate_cli().try_get_matches_from([
            "simulate", "--model", "m.bin", "--ref", "g.fa", "--format", "bam",
        ]);
        assert!(result.is_err());
    }

    #[rstest]
    fn test_run_simulate_unpaired() {
        let dir = tempdir().unwrap();

        let fasta1 = dir.path().join("a.fa");
        let fasta2 = dir.path().join("b.fa");
        std::fs::write(&fasta1, format!(">chr1\n{}\n", "ACGTTGCA".repeat(50))).unwrap();
        std::fs::write(&fasta2, format!(">chr2\n{}\n", "TTGACCAG".repeat(50))).unwrap();

        let config = TandemConfig::default();
        let mut model = InputModel::new(&config);
        let mut rng = StdRng::seed_from_u64(1);
        let rec = AlignmentRecord::new(
            "chr1",
            10,
            Strand::Forward,
            -6,
            "10M",
            "4A5",
            "ACGTTCGTAC",
            "IIIIIIIIII",
        );
        model.add_unpaired(&rec, &mut rng).unwrap();
        model.finalize();
        let model_path = dir.path().join("model.bin");
        model.save(&model_path).unwrap();

        let out_dir = dir.path().join("reads");
        let matches = create_simulate_cli()
            .try_get_matches_from([
                "simulate",
                "--model",
                model_path.to_str().unwrap(),
                "--ref",
                fasta1.to_str().unwrap(),
                fasta2.to_str().unwrap(),
                "--output-dir",
                out_dir.to_str().unwrap(),
                "--format",
                "tab6",
            ])
            .unwrap();
        run_simulate(&matches).unwrap();

        let path = SimulationWriter::output_path(
            &out_dir,
            AlignmentKind::Unpaired,
            OutputFormat::Tab6,
            false,
        );
        let lines = get_dynamic_reader(&path).unwrap().lines().count();
        assert_eq!(lines, config.sim_unp_min);
    }
}
