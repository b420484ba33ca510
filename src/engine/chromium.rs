//! Headless-Chromium rendering backend (chromiumoxide)

use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::cdp::browser_protocol::emulation::{
    SetDeviceMetricsOverrideParams, SetScriptExecutionDisabledParams,
};
use chromiumoxide::cdp::browser_protocol::fetch::{
    ContinueRequestParams, EnableParams as FetchEnableParams, EventRequestPaused,
    FailRequestParams,
};
use chromiumoxide::cdp::browser_protocol::network::{ErrorReason, ResourceType};
use chromiumoxide::cdp::browser_protocol::page::CaptureScreenshotFormat;
use chromiumoxide::page::{Page, ScreenshotParams};
use futures::StreamExt;
use std::path::Path;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use super::{should_suppress, EngineError, RenderEngine, RenderSession, ResourceKind};

/// Launch options for the Chromium instance
#[derive(Debug, Clone)]
pub struct ChromiumOptions {
    pub viewport_width: u32,
    pub viewport_height: u32,
    pub device_scale_factor: f64,
}

impl Default for ChromiumOptions {
    fn default() -> Self {
        Self {
            viewport_width: 800,
            viewport_height: 600,
            device_scale_factor: 0.5,
        }
    }
}

/// A running headless-Chromium instance
pub struct ChromiumEngine {
    browser: Mutex<Browser>,
    handler_task: JoinHandle<()>,
    options: ChromiumOptions,
}

impl ChromiumEngine {
    /// Launch headless Chromium and spawn its CDP message loop
    pub async fn launch(options: ChromiumOptions) -> Result<Self, EngineError> {
        let config = BrowserConfig::builder()
            .no_sandbox()
            .args(vec!["--disable-gpu", "--disable-dev-shm-usage"])
            .build()
            .map_err(EngineError::Launch)?;

        let (browser, mut handler) = Browser::launch(config)
            .await
            .map_err(|e| EngineError::Launch(e.to_string()))?;

        let handler_task = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if event.is_err() {
                    break;
                }
            }
        });

        debug!("Chromium launched");

        Ok(Self {
            browser: Mutex::new(browser),
            handler_task,
            options,
        })
    }
}

#[async_trait]
impl RenderEngine for ChromiumEngine {
    async fn new_session(&self) -> Result<Box<dyn RenderSession>, EngineError> {
        let page = {
            let browser = self.browser.lock().await;
            browser
                .new_page("about:blank")
                .await
                .map_err(|e| EngineError::Session(e.to_string()))?
        };

        configure_page(&page, &self.options).await?;
        let intercept_task = spawn_request_interceptor(&page).await?;

        Ok(Box::new(ChromiumSession {
            page,
            intercept_task,
        }))
    }

    async fn shutdown(&self) -> Result<(), EngineError> {
        let mut browser = self.browser.lock().await;
        browser
            .close()
            .await
            .map_err(|e| EngineError::Shutdown(e.to_string()))?;
        if let Err(e) = browser.wait().await {
            warn!(error = %e, "Chromium did not exit cleanly");
        }
        self.handler_task.abort();
        debug!("Chromium terminated");
        Ok(())
    }
}

/// Apply the session-wide policy before first navigation: fixed viewport,
/// no script execution on loaded documents (Runtime evaluation still works).
async fn configure_page(page: &Page, options: &ChromiumOptions) -> Result<(), EngineError> {
    page.execute(SetDeviceMetricsOverrideParams::new(
        i64::from(options.viewport_width),
        i64::from(options.viewport_height),
        options.device_scale_factor,
        false,
    ))
    .await
    .map_err(|e| EngineError::Session(e.to_string()))?;

    page.execute(SetScriptExecutionDisabledParams::new(true))
        .await
        .map_err(|e| EngineError::Session(e.to_string()))?;

    Ok(())
}

/// Pause every request through the Fetch domain and fail the suppressed
/// resource categories with BlockedByClient; everything else continues.
async fn spawn_request_interceptor(page: &Page) -> Result<JoinHandle<()>, EngineError> {
    page.execute(FetchEnableParams::default())
        .await
        .map_err(|e| EngineError::Session(e.to_string()))?;

    let mut paused = page
        .event_listener::<EventRequestPaused>()
        .await
        .map_err(|e| EngineError::Session(e.to_string()))?;

    let page = page.clone();
    Ok(tokio::spawn(async move {
        while let Some(event) = paused.next().await {
            let request_id = event.request_id.clone();
            let result = if should_suppress(resource_kind(&event.resource_type)) {
                page.execute(FailRequestParams::new(
                    request_id,
                    ErrorReason::BlockedByClient,
                ))
                .await
                .map(|_| ())
            } else {
                page.execute(ContinueRequestParams::new(request_id))
                    .await
                    .map(|_| ())
            };
            if let Err(e) = result {
                debug!(error = %e, "request interception command failed");
            }
        }
    }))
}

fn resource_kind(resource_type: &ResourceType) -> ResourceKind {
    match resource_type {
        ResourceType::Document => ResourceKind::Document,
        ResourceType::Script => ResourceKind::Script,
        ResourceType::Image => ResourceKind::Image,
        ResourceType::Stylesheet => ResourceKind::Stylesheet,
        ResourceType::Font => ResourceKind::Font,
        ResourceType::Media => ResourceKind::Media,
        _ => ResourceKind::Other,
    }
}

struct ChromiumSession {
    page: Page,
    intercept_task: JoinHandle<()>,
}

#[async_trait]
impl RenderSession for ChromiumSession {
    async fn navigate(&mut self, url: &str, timeout: Duration) -> Result<(), EngineError> {
        match tokio::time::timeout(timeout, self.page.goto(url)).await {
            Ok(Ok(_)) => Ok(()),
            Ok(Err(e)) => Err(EngineError::Navigation(e.to_string())),
            Err(_) => Err(EngineError::Timeout {
                step: "navigation",
                after: timeout,
            }),
        }
    }

    async fn capture_screenshot(
        &mut self,
        output: &Path,
        timeout: Duration,
    ) -> Result<(), EngineError> {
        let params = ScreenshotParams::builder()
            .format(CaptureScreenshotFormat::Png)
            .full_page(false)
            .build();

        match tokio::time::timeout(timeout, self.page.save_screenshot(params, output)).await {
            Ok(Ok(_)) => Ok(()),
            Ok(Err(e)) => Err(EngineError::Screenshot(e.to_string())),
            Err(_) => Err(EngineError::Timeout {
                step: "screenshot",
                after: timeout,
            }),
        }
    }

    async fn visible_text(&mut self) -> Result<String, EngineError> {
        let result = self
            .page
            .evaluate("document.body ? document.body.innerText : ''")
            .await
            .map_err(|e| EngineError::Extraction(e.to_string()))?;

        result
            .into_value()
            .map_err(|e| EngineError::Extraction(e.to_string()))
    }

    async fn close(self: Box<Self>) -> Result<(), EngineError> {
        self.intercept_task.abort();
        self.page
            .close()
            .await
            .map_err(|e| EngineError::Session(e.to_string()))
    }
}
