use clap::{Arg, ArgAction, Command, arg};

pub use tandem_sim::consts::SIMULATE_CMD;

pub fn create_simulate_cli() -> Command {
    Command::new(SIMULATE_CMD)
        .about("Simulate reads from a trained input model and a reference genome.")
        .arg(arg!(-m --model <model> "Trained input model").required(true))
        .arg(
            Arg::new("ref")
                .long("ref")
                .short('r')
                .help("Reference FASTA file(s), optionally gzip'd")
                .num_args(1..)
                .action(ArgAction::Append)
                .required(true),
        )
        .arg(
            Arg::new("output_dir")
                .long("output-dir")
                .short('o')
                .value_name("DIR")
                .help("Directory for the simulated reads"),
        )
        .arg(arg!(-c --config <config> "TOML configuration file"))
        .arg(
            arg!(--format <format> "Output format")
                .value_parser(["fastq", "tab6"])
                .default_value("fastq"),
        )
        .arg(arg!(--gzip "Compress the output files").action(ArgAction::SetTrue))
        .arg(
            arg!(--seed <seed> "Override the configured random seed")
                .value_parser(clap::value_parser!(u64)),
        )
}
