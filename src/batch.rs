//! End-to-end batch run: scan, render, aggregate, persist

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::{error, info};

use crate::config::Config;
use crate::engine::chromium::{ChromiumEngine, ChromiumOptions};
use crate::engine::{EngineError, RenderEngine};
use crate::errlog::ErrorLog;
use crate::output::{self, OutputError};
use crate::pool::{PoolError, PoolOptions, Task, WorkerPool};
use crate::progress::ProgressTracker;
use crate::scanner::{self, ScanError};

#[derive(Debug, Error)]
pub enum BatchError {
    #[error("input scan failed: {0}")]
    Scan(#[from] ScanError),

    #[error("rendering engine failed to start: {0}")]
    EngineStart(#[from] EngineError),

    #[error(transparent)]
    Pool(#[from] PoolError),

    #[error("failed to write results: {0}")]
    WriteOutput(#[from] OutputError),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSummary {
    pub processed: usize,
    pub errors: usize,
    pub elapsed: Duration,
    pub output_file: PathBuf,
}

/// Run a full batch against headless Chromium.
///
/// Individual task failures are absorbed into the output; only
/// infrastructure failures (scan, engine start, output write) surface
/// here and should terminate the process with a non-zero status.
pub async fn run(config: &Config) -> Result<RunSummary, BatchError> {
    let tasks = scanner::scan_tiers(&config.render.input_dir)?;

    let engine = ChromiumEngine::launch(ChromiumOptions {
        viewport_width: config.viewport.width,
        viewport_height: config.viewport.height,
        device_scale_factor: config.viewport.device_scale_factor,
    })
    .await?;

    run_tasks(config, Arc::new(engine), tasks).await
}

/// Same pipeline with a caller-supplied engine; the test suites drive
/// this with the mock backend.
pub async fn run_with_engine(
    config: &Config,
    engine: Arc<dyn RenderEngine>,
) -> Result<RunSummary, BatchError> {
    let tasks = scanner::scan_tiers(&config.render.input_dir)?;
    run_tasks(config, engine, tasks).await
}

async fn run_tasks(
    config: &Config,
    engine: Arc<dyn RenderEngine>,
    tasks: Vec<Task>,
) -> Result<RunSummary, BatchError> {
    info!(documents = tasks.len(), "starting batch render");

    let progress = Arc::new(ProgressTracker::new(
        &tasks,
        config.timeouts.progress_interval.as_duration(),
    ));
    let errors = Arc::new(ErrorLog::new());

    let pool = WorkerPool::new(
        engine,
        PoolOptions {
            concurrency: config.pool.concurrency,
            page_load_timeout: config.timeouts.page_load.as_duration(),
            screenshot_timeout: config.timeouts.screenshot.as_duration(),
            screenshot_dir: config.render.screenshot_dir(),
        },
        Arc::clone(&progress),
        Arc::clone(&errors),
    );

    let outcomes = pool.run(tasks).await?;
    let processed = outcomes.len();

    let output_file = config.render.output_file();
    let grouped = output::group_by_tier(outcomes);
    output::write(&grouped, &output_file)?;

    // The error log is diagnostic, not part of the contract result.
    if let Err(e) = errors.flush(&config.render.error_log_file()) {
        error!(error = %e, "failed to flush error log");
    }

    let snapshot = progress.snapshot();
    Ok(RunSummary {
        processed,
        errors: snapshot.errors,
        elapsed: progress.elapsed(),
        output_file,
    })
}
