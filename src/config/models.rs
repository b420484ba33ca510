use crate::humanize::Millis;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Top-level configuration
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct Config {
    #[serde(default)]
    pub render: RenderConfig,
    #[serde(default)]
    pub pool: PoolConfig,
    #[serde(default)]
    pub timeouts: TimeoutConfig,
    #[serde(default)]
    pub viewport: ViewportConfig,
}

/// Input/output locations
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RenderConfig {
    #[serde(default = "default_input_dir")]
    pub input_dir: PathBuf,
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
}

impl RenderConfig {
    pub fn output_file(&self) -> PathBuf {
        self.output_dir.join("render_results.json")
    }

    pub fn screenshot_dir(&self) -> PathBuf {
        self.output_dir.join("screenshots")
    }

    pub fn error_log_file(&self) -> PathBuf {
        self.output_dir.join("error_log.txt")
    }
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            input_dir: default_input_dir(),
            output_dir: default_output_dir(),
        }
    }
}

fn default_input_dir() -> PathBuf {
    PathBuf::from("dataset")
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("output")
}

/// Worker pool sizing
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PoolConfig {
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            concurrency: default_concurrency(),
        }
    }
}

fn default_concurrency() -> usize {
    8
}

/// Per-task deadlines. The screenshot timeout must be strictly shorter
/// than the page-load timeout (enforced by validation).
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TimeoutConfig {
    #[serde(default = "default_page_load")]
    pub page_load: Millis,
    #[serde(default = "default_screenshot")]
    pub screenshot: Millis,
    #[serde(default = "default_progress_interval")]
    pub progress_interval: Millis,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            page_load: default_page_load(),
            screenshot: default_screenshot(),
            progress_interval: default_progress_interval(),
        }
    }
}

fn default_page_load() -> Millis {
    Millis(30_000)
}

fn default_screenshot() -> Millis {
    Millis(5_000)
}

fn default_progress_interval() -> Millis {
    Millis(250)
}

/// Browser viewport applied to every render session
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ViewportConfig {
    #[serde(default = "default_viewport_width")]
    pub width: u32,
    #[serde(default = "default_viewport_height")]
    pub height: u32,
    #[serde(default = "default_scale_factor")]
    pub device_scale_factor: f64,
}

impl Default for ViewportConfig {
    fn default() -> Self {
        Self {
            width: default_viewport_width(),
            height: default_viewport_height(),
            device_scale_factor: default_scale_factor(),
        }
    }
}

fn default_viewport_width() -> u32 {
    800
}

fn default_viewport_height() -> u32 {
    600
}

fn default_scale_factor() -> f64 {
    0.5
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();

        assert_eq!(config.render.input_dir, PathBuf::from("dataset"));
        assert_eq!(config.pool.concurrency, 8);
        assert_eq!(config.timeouts.page_load.as_u64(), 30_000);
        assert_eq!(config.timeouts.screenshot.as_u64(), 5_000);
        assert_eq!(config.viewport.width, 800);
    }

    #[test]
    fn test_derived_output_paths() {
        let render = RenderConfig {
            input_dir: PathBuf::from("in"),
            output_dir: PathBuf::from("out"),
        };

        assert_eq!(render.output_file(), PathBuf::from("out/render_results.json"));
        assert_eq!(render.screenshot_dir(), PathBuf::from("out/screenshots"));
        assert_eq!(render.error_log_file(), PathBuf::from("out/error_log.txt"));
    }
}
