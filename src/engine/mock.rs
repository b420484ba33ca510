//! Deterministic in-memory engine used by the test suites
//!
//! Behaviors are scripted per path substring; the engine also instruments
//! how many sessions are concurrently inside an engine step so tests can
//! assert the pool's concurrency bound.

use async_trait::async_trait;
use std::path::Path;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use super::{EngineError, RenderEngine, RenderSession};

/// Scripted response for documents whose path matches a needle
#[derive(Debug, Clone)]
pub enum MockBehavior {
    /// Navigation, screenshot, and extraction all succeed with this text
    Succeed { text: String },
    /// Navigation fails immediately
    FailNavigation { message: String },
    /// Navigation takes `delay`; trips the caller's timeout when shorter
    SlowNavigation { delay: Duration },
    /// Screenshot fails; navigation and extraction succeed with this text
    FailScreenshot { text: String },
    /// Extraction fails after a successful navigation
    FailExtraction { message: String },
}

struct MockState {
    behaviors: Vec<(String, MockBehavior)>,
    fail_sessions: bool,
    step_delay: Duration,
    active_steps: AtomicUsize,
    max_active_steps: AtomicUsize,
    open_sessions: AtomicUsize,
    shutdown_called: AtomicBool,
}

pub struct MockEngine {
    state: Arc<MockState>,
}

impl MockEngine {
    pub fn new() -> Self {
        Self {
            state: Arc::new(MockState {
                behaviors: Vec::new(),
                fail_sessions: false,
                step_delay: Duration::from_millis(5),
                active_steps: AtomicUsize::new(0),
                max_active_steps: AtomicUsize::new(0),
                open_sessions: AtomicUsize::new(0),
                shutdown_called: AtomicBool::new(false),
            }),
        }
    }

    /// Script a behavior for every document whose URL contains `needle`.
    /// First match wins; unmatched documents succeed with a default text.
    pub fn with_behavior(mut self, needle: impl Into<String>, behavior: MockBehavior) -> Self {
        let state = Arc::get_mut(&mut self.state)
            .expect("with_behavior must be called before the engine is shared");
        state.behaviors.push((needle.into(), behavior));
        self
    }

    /// An engine whose session creation always fails (launch-failure path)
    pub fn failing_sessions() -> Self {
        let mut engine = Self::new();
        Arc::get_mut(&mut engine.state).unwrap().fail_sessions = true;
        engine
    }

    /// High-water mark of sessions simultaneously inside an engine step
    pub fn max_concurrent_steps(&self) -> usize {
        self.state.max_active_steps.load(Ordering::SeqCst)
    }

    pub fn open_sessions(&self) -> usize {
        self.state.open_sessions.load(Ordering::SeqCst)
    }

    pub fn shutdown_called(&self) -> bool {
        self.state.shutdown_called.load(Ordering::SeqCst)
    }
}

impl Default for MockEngine {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RenderEngine for MockEngine {
    async fn new_session(&self) -> Result<Box<dyn RenderSession>, EngineError> {
        if self.state.fail_sessions {
            return Err(EngineError::Session("no sessions available".to_string()));
        }
        self.state.open_sessions.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(MockSession {
            state: Arc::clone(&self.state),
            current_url: None,
        }))
    }

    async fn shutdown(&self) -> Result<(), EngineError> {
        self.state.shutdown_called.store(true, Ordering::SeqCst);
        Ok(())
    }
}

struct MockSession {
    state: Arc<MockState>,
    current_url: Option<String>,
}

impl MockSession {
    fn behavior_for(&self, url: &str) -> MockBehavior {
        for (needle, behavior) in &self.state.behaviors {
            if url.contains(needle.as_str()) {
                return behavior.clone();
            }
        }
        MockBehavior::Succeed {
            text: format!("rendered text for {url}"),
        }
    }

    fn current_behavior(&self) -> MockBehavior {
        match &self.current_url {
            Some(url) => self.behavior_for(url),
            None => MockBehavior::FailNavigation {
                message: "no document loaded".to_string(),
            },
        }
    }
}

/// Counts a session as "inside a step" for the duration of a guard
struct StepGuard {
    state: Arc<MockState>,
}

impl StepGuard {
    fn enter(state: &Arc<MockState>) -> Self {
        let active = state.active_steps.fetch_add(1, Ordering::SeqCst) + 1;
        state.max_active_steps.fetch_max(active, Ordering::SeqCst);
        Self {
            state: Arc::clone(state),
        }
    }
}

impl Drop for StepGuard {
    fn drop(&mut self) {
        self.state.active_steps.fetch_sub(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl RenderSession for MockSession {
    async fn navigate(&mut self, url: &str, timeout: Duration) -> Result<(), EngineError> {
        let _guard = StepGuard::enter(&self.state);
        self.current_url = None;

        match self.behavior_for(url) {
            MockBehavior::FailNavigation { message } => Err(EngineError::Navigation(message)),
            MockBehavior::SlowNavigation { delay } => {
                if tokio::time::timeout(timeout, tokio::time::sleep(delay))
                    .await
                    .is_err()
                {
                    Err(EngineError::Timeout {
                        step: "navigation",
                        after: timeout,
                    })
                } else {
                    self.current_url = Some(url.to_string());
                    Ok(())
                }
            }
            _ => {
                tokio::time::sleep(self.state.step_delay).await;
                self.current_url = Some(url.to_string());
                Ok(())
            }
        }
    }

    async fn capture_screenshot(
        &mut self,
        output: &Path,
        _timeout: Duration,
    ) -> Result<(), EngineError> {
        let _guard = StepGuard::enter(&self.state);

        if let MockBehavior::FailScreenshot { .. } = self.current_behavior() {
            return Err(EngineError::Screenshot("capture failed".to_string()));
        }

        tokio::fs::write(output, b"\x89PNG\r\n\x1a\n")
            .await
            .map_err(|e| EngineError::Screenshot(e.to_string()))
    }

    async fn visible_text(&mut self) -> Result<String, EngineError> {
        let _guard = StepGuard::enter(&self.state);

        match self.current_behavior() {
            MockBehavior::FailExtraction { message } => Err(EngineError::Extraction(message)),
            MockBehavior::FailNavigation { message } => Err(EngineError::Extraction(message)),
            MockBehavior::Succeed { text } | MockBehavior::FailScreenshot { text } => Ok(text),
            MockBehavior::SlowNavigation { .. } => Ok(String::new()),
        }
    }

    async fn close(self: Box<Self>) -> Result<(), EngineError> {
        self.state.open_sessions.fetch_sub(1, Ordering::SeqCst);
        Ok(())
    }
}
