use clap::Parser;

#[derive(Debug, Clone, Parser)]
#[command(name = "groups-broker")]
#[command(about = "Command-file driver for the groups service adaptor")]
pub struct CliConfig {
    /// Path to the service configuration file
    #[arg(short, long, default_value = "default.toml")]
    pub config: String,

    /// Path to the pipe-delimited command file
    #[arg(long, default_value = "commands.psv")]
    pub commands: String,

    /// Enable verbose output
    #[arg(short, long)]
    pub verbose: bool,
}
