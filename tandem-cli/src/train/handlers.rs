use std::path::Path;

use anyhow::{Context, Result};
use clap::ArgMatches;
use log::info;
use rand::SeedableRng;
use rand::rngs::StdRng;

use tandem_sim::consts::DEFAULT_MODEL_OUT;
use tandem_sim::io::read_training_items;
use tandem_sim::InputModel;

use crate::config::handlers::load_config;

pub fn run_train(matches: &ArgMatches) -> Result<()> {
    let alignments = matches
        .get_one::<String>("alignments")
        .context("A path to training alignments is required.")?;

    let default_out = DEFAULT_MODEL_OUT.to_string();
    let output = matches.get_one::<String>("output").unwrap_or(&default_out);

    let config = load_config(matches)?;

    let items = read_training_items(Path::new(alignments))
        .with_context(|| format!("Failed to read training alignments from {}", alignments))?;
    info!("Read {} training items from {}", items.len(), alignments);

    let mut rng = StdRng::seed_from_u64(config.seed);
    let mut model = InputModel::new(&config);
    model.ingest_all(&items, &mut rng)?;
    model.finalize();

    if model.num_skipped_records() > 0 {
        info!(
            "Skipped {} records that could not be turned into templates",
            model.num_skipped_records()
        );
    }

    model
        .save(Path::new(output))
        .with_context(|| format!("Failed to write model to {}", output))?;
    info!("Model written to {}", output);

    if let Some(summary_path) = matches.get_one::<String>("summary") {
        let summary = model.summary().to_json()?;
        std::fs::write(summary_path, summary)
            .with_context(|| format!("Failed to write model summary to {}", summary_path))?;
    }

    Ok(())
}
