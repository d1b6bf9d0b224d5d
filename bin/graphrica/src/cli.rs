use std::path::PathBuf;

use clap::Parser;
use graphrica_deploy::{CONFIG_FILENAME, NETWORK_ENV_VAR};
use tracing::level_filters::LevelFilter;

#[derive(Parser)]
#[command(name = "graphrica")]
#[command(
    author,
    version,
    about = "Deploy the Graphrica Publication contract and publish its first posts"
)]
pub struct Cli {
    /// The verbosity level.
    #[arg(short, long, env = "GRAPHRICA_VERBOSITY", default_value_t = LevelFilter::INFO)]
    pub verbosity: LevelFilter,

    /// Path to the configuration file. A missing file means built-in defaults.
    #[arg(long, alias = "conf", env = "GRAPHRICA_CONFIG", default_value = CONFIG_FILENAME)]
    pub config: PathBuf,

    /// The target network.
    ///
    /// `localhost` and `hardhat` are local development chains, any other name is a public
    /// network and must be configured. Defaults to `localhost`.
    #[arg(short, long, env = NETWORK_ENV_VAR)]
    pub network: Option<String>,

    /// Directory holding the compiled contract artifacts.
    ///
    /// Overrides the `artifacts` entry of the configuration.
    #[arg(long)]
    pub artifacts: Option<PathBuf>,
}
