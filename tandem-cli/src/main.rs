mod config;
mod simulate;
mod train;

use anyhow::Result;
use clap::{ArgAction, Command, arg};
use env_logger::Env;

pub mod consts {
    pub const VERSION: &str = env!("CARGO_PKG_VERSION");
    pub const PKG_NAME: &str = "tandem";
    pub const BIN_NAME: &str = "tandem";
}

fn build_parser() -> Command {
    Command::new(consts::BIN_NAME)
        .bin_name(consts::BIN_NAME)
        .version(consts::VERSION)
        .about("Learn alignment profiles from aligned reads and simulate reads that reproduce them, for training mapping quality predictors.")
        .arg(arg!(-v --verbose "Log debug messages").action(ArgAction::SetTrue))
        .subcommand_required(true)
        .subcommand(train::cli::create_train_cli())
        .subcommand(simulate::cli::create_simulate_cli())
        .subcommand(config::cli::create_config_cli())
}

fn main() -> Result<()> {
    let app = build_parser();
    let matches = app.get_matches();

    let level = if matches.get_flag("verbose") {
        "debug"
    } else {
        "info"
    };
    env_logger::Builder::from_env(Env::default().default_filter_or(level)).init();

    match matches.subcommand() {
        //
        // TRAIN
        //
        Some((train::cli::TRAIN_CMD, matches)) => {
            train::handlers::run_train(matches)?;
        }

        //
        // SIMULATE
        //
        Some((simulate::cli::SIMULATE_CMD, matches)) => {
            simulate::handlers::run_simulate(matches)?;
        }

        //
        // CONFIG
        //
        Some((config::cli::CONFIG_CMD, matches)) => {
            config::handlers::run_config(matches)?;
        }

        _ => unreachable!("Subcommand not found"),
    };

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::*;

    #[rstest]
    fn test_parser_is_consistent() {
        build_parser().debug_assert();
    }

    #[rstest]
    fn test_subcommand_required() {
        assert!(build_parser().try_get_matches_from(["tandem"]).is_err());
    }

    #[rstest]
    fn test_verbose_before_subcommand() {
        let matches = build_parser()
            .try_get_matches_from(["tandem", "-v", "config"])
            .unwrap();
        assert!(matches.get_flag("verbose"));
        assert_eq!(matches.subcommand_name(), Some(config::cli::CONFIG_CMD));
    }
}
