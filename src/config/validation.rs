use super::models::Config;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("Pool concurrency must be at least 1")]
    ZeroConcurrency,

    #[error("Timeout '{field}' must be positive")]
    ZeroTimeout { field: &'static str },

    #[error(
        "Screenshot timeout ({screenshot}ms) must be strictly shorter than the page-load timeout ({page_load}ms)"
    )]
    ScreenshotTimeoutTooLong { screenshot: u64, page_load: u64 },

    #[error("Viewport dimensions must be positive: {width}x{height}")]
    InvalidViewport { width: u32, height: u32 },

    #[error("Device scale factor must be positive: {value}")]
    InvalidScaleFactor { value: f64 },
}

/// Validate the entire configuration
pub fn validate(config: &Config) -> Result<(), ValidationError> {
    validate_pool(config)?;
    validate_timeouts(config)?;
    validate_viewport(config)?;
    Ok(())
}

fn validate_pool(config: &Config) -> Result<(), ValidationError> {
    if config.pool.concurrency == 0 {
        return Err(ValidationError::ZeroConcurrency);
    }
    Ok(())
}

fn validate_timeouts(config: &Config) -> Result<(), ValidationError> {
    let timeouts = &config.timeouts;
    if timeouts.page_load.as_u64() == 0 {
        return Err(ValidationError::ZeroTimeout { field: "page_load" });
    }
    if timeouts.screenshot.as_u64() == 0 {
        return Err(ValidationError::ZeroTimeout {
            field: "screenshot",
        });
    }
    // The screenshot step must never outlast a navigation deadline
    if timeouts.screenshot.as_u64() >= timeouts.page_load.as_u64() {
        return Err(ValidationError::ScreenshotTimeoutTooLong {
            screenshot: timeouts.screenshot.as_u64(),
            page_load: timeouts.page_load.as_u64(),
        });
    }
    Ok(())
}

fn validate_viewport(config: &Config) -> Result<(), ValidationError> {
    let viewport = &config.viewport;
    if viewport.width == 0 || viewport.height == 0 {
        return Err(ValidationError::InvalidViewport {
            width: viewport.width,
            height: viewport.height,
        });
    }
    if viewport.device_scale_factor <= 0.0 {
        return Err(ValidationError::InvalidScaleFactor {
            value: viewport.device_scale_factor,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::humanize::Millis;

    #[test]
    fn test_default_config_is_valid() {
        assert!(validate(&Config::default()).is_ok());
    }

    #[test]
    fn test_zero_concurrency_rejected() {
        let mut config = Config::default();
        config.pool.concurrency = 0;
        assert!(matches!(
            validate(&config),
            Err(ValidationError::ZeroConcurrency)
        ));
    }

    #[test]
    fn test_screenshot_timeout_must_be_strictly_shorter() {
        let mut config = Config::default();
        config.timeouts.page_load = Millis(5_000);
        config.timeouts.screenshot = Millis(5_000);
        assert!(matches!(
            validate(&config),
            Err(ValidationError::ScreenshotTimeoutTooLong { .. })
        ));
    }

    #[test]
    fn test_zero_timeout_rejected() {
        let mut config = Config::default();
        config.timeouts.page_load = Millis(0);
        assert!(matches!(
            validate(&config),
            Err(ValidationError::ZeroTimeout { field: "page_load" })
        ));
    }

    #[test]
    fn test_invalid_viewport_rejected() {
        let mut config = Config::default();
        config.viewport.width = 0;
        assert!(matches!(
            validate(&config),
            Err(ValidationError::InvalidViewport { .. })
        ));
    }
}
