//! The concurrent rendering pipeline
//!
//! A fixed-size pool of workers drains a shared task queue. Each worker
//! owns one long-lived render session that it reuses across many
//! documents; per-task failures are absorbed into outcomes and never
//! abort the run.

pub mod task;

pub use task::{FailureRecord, SuccessRecord, Task, TaskOutcome};

use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::Mutex;
use tokio::task::JoinSet;
use tracing::{debug, warn};

use crate::engine::{EngineError, RenderEngine, RenderSession};
use crate::errlog::ErrorLog;
use crate::progress::ProgressTracker;

#[derive(Debug, Error)]
pub enum PoolError {
    #[error("failed to initialize render sessions: {0}")]
    SessionInit(#[source] EngineError),
}

#[derive(Debug, Clone)]
pub struct PoolOptions {
    pub concurrency: usize,
    pub page_load_timeout: Duration,
    pub screenshot_timeout: Duration,
    pub screenshot_dir: PathBuf,
}

/// Executes every task in the shared queue using at most N concurrent
/// render sessions. Owns engine shutdown: once every worker has exited,
/// sessions are closed and the engine instance is terminated, even if
/// some tasks failed.
pub struct WorkerPool {
    engine: Arc<dyn RenderEngine>,
    options: PoolOptions,
    progress: Arc<ProgressTracker>,
    errors: Arc<ErrorLog>,
}

#[derive(Clone)]
struct WorkerCtx {
    queue: Arc<Mutex<VecDeque<Task>>>,
    results: Arc<Mutex<Vec<TaskOutcome>>>,
    progress: Arc<ProgressTracker>,
    errors: Arc<ErrorLog>,
    page_load_timeout: Duration,
    screenshot_timeout: Duration,
    screenshot_dir: PathBuf,
}

impl WorkerPool {
    pub fn new(
        engine: Arc<dyn RenderEngine>,
        options: PoolOptions,
        progress: Arc<ProgressTracker>,
        errors: Arc<ErrorLog>,
    ) -> Self {
        Self {
            engine,
            options,
            progress,
            errors,
        }
    }

    /// Drain `tasks` through the pool. Fails only if session creation
    /// itself fails; every submitted task yields exactly one outcome,
    /// collected in completion order (unordered under concurrency).
    pub async fn run(&self, tasks: Vec<Task>) -> Result<Vec<TaskOutcome>, PoolError> {
        let total = tasks.len();
        let workers = self.options.concurrency.min(total);

        if workers == 0 {
            self.progress.maybe_render(None, true);
            self.shutdown_engine().await;
            return Ok(Vec::new());
        }

        // One session per worker slot, created up front so an engine that
        // cannot produce sessions aborts before any task is claimed.
        let mut sessions = Vec::with_capacity(workers);
        for _ in 0..workers {
            match self.engine.new_session().await {
                Ok(session) => sessions.push(session),
                Err(e) => {
                    for session in sessions {
                        if let Err(close_err) = session.close().await {
                            warn!(error = %close_err, "failed to close render session");
                        }
                    }
                    self.shutdown_engine().await;
                    return Err(PoolError::SessionInit(e));
                }
            }
        }

        let ctx = WorkerCtx {
            queue: Arc::new(Mutex::new(VecDeque::from(tasks))),
            results: Arc::new(Mutex::new(Vec::with_capacity(total))),
            progress: Arc::clone(&self.progress),
            errors: Arc::clone(&self.errors),
            page_load_timeout: self.options.page_load_timeout,
            screenshot_timeout: self.options.screenshot_timeout,
            screenshot_dir: self.options.screenshot_dir.clone(),
        };

        let mut join_set = JoinSet::new();
        for (worker_id, session) in sessions.into_iter().enumerate() {
            join_set.spawn(worker_loop(worker_id, session, ctx.clone()));
        }
        while let Some(joined) = join_set.join_next().await {
            if let Err(e) = joined {
                warn!(error = %e, "render worker aborted");
            }
        }

        // The terminal must settle at 100% regardless of throttling.
        self.progress.maybe_render(None, true);
        self.shutdown_engine().await;

        let outcomes = std::mem::take(&mut *ctx.results.lock().await);
        Ok(outcomes)
    }

    async fn shutdown_engine(&self) {
        if let Err(e) = self.engine.shutdown().await {
            warn!(error = %e, "render engine shutdown failed");
        }
    }
}

/// Pull-loop of one worker: claim the next task, render it against the
/// worker's own session, record the outcome, repeat until the queue is
/// empty, then close the session.
async fn worker_loop(worker_id: usize, mut session: Box<dyn RenderSession>, ctx: WorkerCtx) {
    debug!(worker_id, "render worker started");

    loop {
        let task = { ctx.queue.lock().await.pop_front() };
        let Some(task) = task else { break };

        let outcome = process_task(session.as_mut(), &task, &ctx).await;

        ctx.progress.record_completion(&task.tier);
        ctx.results.lock().await.push(outcome);
        ctx.progress.maybe_render(Some(&task.tier), false);
    }

    if let Err(e) = session.close().await {
        warn!(worker_id, error = %e, "failed to close render session");
    }
    debug!(worker_id, "render worker finished");
}

/// The per-task render sequence: navigate (bounded), ensure the tier's
/// screenshot directory, capture the viewport (bounded, non-fatal on
/// failure), extract and normalize the visible text.
async fn process_task(session: &mut dyn RenderSession, task: &Task, ctx: &WorkerCtx) -> TaskOutcome {
    let url = match file_url(&task.path) {
        Ok(url) => url,
        Err(e) => return task_failure(task, ctx, format!("unresolvable path: {e}")),
    };

    if let Err(e) = session.navigate(&url, ctx.page_load_timeout).await {
        return task_failure(task, ctx, e.to_string());
    }

    let tier_dir = ctx.screenshot_dir.join(&task.tier);
    let screenshot_path = tier_dir.join(format!("{}.png", task.filename()));

    // Directory creation is idempotent; workers sharing a tier may race it.
    let captured = match tokio::fs::create_dir_all(&tier_dir).await {
        Ok(()) => {
            session
                .capture_screenshot(&screenshot_path, ctx.screenshot_timeout)
                .await
        }
        Err(e) => Err(EngineError::Screenshot(e.to_string())),
    };

    let mut screenshot_failed = false;
    if let Err(e) = captured {
        ctx.errors
            .record(task.path.display(), format!("screenshot failed: {e}"));
        ctx.progress.record_error();
        screenshot_failed = true;
    }

    match session.visible_text().await {
        Ok(raw) => TaskOutcome::success(
            task,
            normalize_text(&raw),
            &screenshot_path,
            screenshot_failed,
        ),
        Err(e) => task_failure(task, ctx, e.to_string()),
    }
}

fn task_failure(task: &Task, ctx: &WorkerCtx, message: String) -> TaskOutcome {
    ctx.errors.record(task.path.display(), &message);
    ctx.progress.record_error();
    TaskOutcome::failure(task, message)
}

fn file_url(path: &Path) -> std::io::Result<String> {
    let absolute = std::path::absolute(path)?;
    Ok(format!("file://{}", absolute.display()))
}

/// Collapse runs of line breaks to a single newline and trim the ends,
/// matching what a user would read off the rendered page.
pub fn normalize_text(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut at_break = false;
    for c in raw.chars() {
        if c == '\n' || c == '\r' {
            if !at_break {
                out.push('\n');
                at_break = true;
            }
        } else {
            out.push(c);
            at_break = false;
        }
    }
    out.trim().to_string()
}
