use std::path::Path;

use anyhow::{Context, Result};
use clap::ArgMatches;
use log::info;

use tandem_sim::consts::DEFAULT_CONFIG_OUT;
use tandem_sim::TandemConfig;

///
/// Configuration for `train` and `simulate`: the `--config` file if given,
/// defaults otherwise, with `--seed` applied on top.
///
pub fn load_config(matches: &ArgMatches) -> Result<TandemConfig> {
    let mut config = match matches.get_one::<String>("config") {
        Some(path) => TandemConfig::from_file(Path::new(path))
            .with_context(|| format!("Failed to load configuration from {}", path))?,
        None => TandemConfig::default(),
    };

    if let Some(seed) = matches.get_one::<u64>("seed") {
        config = config.with_seed(*seed);
    }

    config.validate()?;
    Ok(config)
}

pub fn run_config(matches: &ArgMatches) -> Result<()> {
    let default_out = DEFAULT_CONFIG_OUT.to_string();
    let output = matches.get_one::<String>("output").unwrap_or(&default_out);

    TandemConfig::default()
        .to_file(Path::new(output))
        .with_context(|| format!("Failed to write configuration to {}", output))?;
    info!("Default configuration written to {}", output);

    Ok(())
}
