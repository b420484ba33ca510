mod cli;

use clap::Parser;
use cli::{Cli, Commands, RunArgs};
use renderbox::batch;
use renderbox::config::Config;
use renderbox::humanize;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    // Progress output owns stdout; diagnostics go to stderr.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Run(args) => run(args).await?,
    }

    Ok(())
}

async fn run(args: RunArgs) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let mut config = match args.config {
        Some(path) => Config::load_from_path(path)?,
        None => Config::load()?,
    };

    if let Some(input) = args.input {
        config.render.input_dir = input;
    }
    if let Some(output) = args.output {
        config.render.output_dir = output;
    }
    if let Some(concurrency) = args.concurrency {
        config.pool.concurrency = concurrency;
    }
    config.validate()?;

    info!(
        input = %config.render.input_dir.display(),
        output = %config.render.output_dir.display(),
        concurrency = config.pool.concurrency,
        "renderbox starting"
    );

    let summary = batch::run(&config).await?;

    // Per-document failures are recorded in the output and error log;
    // the run itself still counts as successful.
    println!(
        "Processed {} documents ({} errors) in {}",
        summary.processed,
        summary.errors,
        humanize::format_compact(summary.elapsed)
    );
    println!("Results saved to {}", summary.output_file.display());

    Ok(())
}
