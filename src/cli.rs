use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "renderbox")]
#[command(about = "Concurrent batch renderer for tiered HTML datasets")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Render every document in the dataset and aggregate the results
    Run(RunArgs),
}

#[derive(Args, Debug)]
pub struct RunArgs {
    /// Dataset directory containing one subdirectory per tier
    #[arg(long, value_name = "DIR")]
    pub input: Option<PathBuf>,

    /// Directory for results, screenshots and the error log
    #[arg(long, value_name = "DIR")]
    pub output: Option<PathBuf>,

    /// Number of concurrent render sessions
    #[arg(long, short = 'c')]
    pub concurrency: Option<usize>,

    /// Path to a TOML configuration file
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,
}
