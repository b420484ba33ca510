//! Rendering-engine abstraction
//!
//! The pool drives documents through these traits; the production backend
//! lives in [`chromium`], the deterministic test backend in [`mock`].

pub mod chromium;
pub mod mock; // Expose for tests (MockEngine)

use async_trait::async_trait;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("engine launch failed: {0}")]
    Launch(String),

    #[error("session setup failed: {0}")]
    Session(String),

    #[error("navigation failed: {0}")]
    Navigation(String),

    #[error("{step} timed out after {after:?}")]
    Timeout { step: &'static str, after: Duration },

    #[error("screenshot capture failed: {0}")]
    Screenshot(String),

    #[error("text extraction failed: {0}")]
    Extraction(String),

    #[error("engine shutdown failed: {0}")]
    Shutdown(String),
}

/// Category of a network subresource requested while loading a document
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceKind {
    Document,
    Script,
    Image,
    Stylesheet,
    Font,
    Media,
    Other,
}

/// Cost-control policy: non-essential subresources are never fetched.
/// Evaluated once per intercepted request, uniformly for every session.
pub fn should_suppress(kind: ResourceKind) -> bool {
    matches!(
        kind,
        ResourceKind::Image | ResourceKind::Stylesheet | ResourceKind::Font | ResourceKind::Media
    )
}

/// One reusable handle to the rendering engine.
///
/// A session renders one document at a time; navigating to a new document
/// discards the previous document's state. Sessions are configured before
/// first navigation to suppress non-essential subresources and to disable
/// script execution on loaded documents.
#[async_trait]
pub trait RenderSession: Send {
    /// Load a document and wait for its structure to be parsed, bounded by
    /// `timeout`. Timeout or load failure is a navigation error.
    async fn navigate(&mut self, url: &str, timeout: Duration) -> Result<(), EngineError>;

    /// Capture the current viewport (not the full scrollable page) to
    /// `output`, bounded by `timeout`.
    async fn capture_screenshot(
        &mut self,
        output: &Path,
        timeout: Duration,
    ) -> Result<(), EngineError>;

    /// Extract the rendered visible text of the current document.
    async fn visible_text(&mut self) -> Result<String, EngineError>;

    async fn close(self: Box<Self>) -> Result<(), EngineError>;
}

/// A running rendering-engine instance that hands out sessions
#[async_trait]
pub trait RenderEngine: Send + Sync {
    async fn new_session(&self) -> Result<Box<dyn RenderSession>, EngineError>;

    /// Terminate the engine instance. Called once, after every session has
    /// been closed.
    async fn shutdown(&self) -> Result<(), EngineError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_suppresses_cosmetic_resources() {
        assert!(should_suppress(ResourceKind::Image));
        assert!(should_suppress(ResourceKind::Stylesheet));
        assert!(should_suppress(ResourceKind::Font));
        assert!(should_suppress(ResourceKind::Media));
    }

    #[test]
    fn test_passes_essential_resources() {
        assert!(!should_suppress(ResourceKind::Document));
        assert!(!should_suppress(ResourceKind::Script));
        assert!(!should_suppress(ResourceKind::Other));
    }
}
