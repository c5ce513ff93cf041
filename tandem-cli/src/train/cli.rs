use clap::{Command, arg};

pub use tandem_sim::consts::TRAIN_CMD;

pub fn create_train_cli() -> Command {
    Command::new(TRAIN_CMD)
        .about("Build an input model from a table of aligned training reads.")
        .arg(
            arg!(-a --alignments <alignments> "Tab-separated training alignments, optionally gzip'd")
                .required(true),
        )
        .arg(arg!(-c --config <config> "TOML configuration file"))
        .arg(arg!(-o --output <output> "Where to write the trained model"))
        .arg(arg!(--summary <summary> "Also write a JSON summary of the model"))
        .arg(
            arg!(--seed <seed> "Override the configured random seed")
                .value_parser(clap::value_parser!(u64)),
        )
}
