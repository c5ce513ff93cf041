use clap::{Command, arg};

pub use tandem_sim::consts::CONFIG_CMD;

pub fn create_config_cli() -> Command {
    Command::new(CONFIG_CMD)
        .about("Write the default configuration as TOML, as a starting point for edits.")
        .arg(arg!(-o --output <output> "Where to write the configuration"))
}
