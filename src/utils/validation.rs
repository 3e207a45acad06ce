use crate::core::AppConfig;
use crate::utils::{AppError, AppResult};

/// Validates configuration values are within acceptable ranges
pub fn validate_config(config: &AppConfig) -> AppResult<()> {
    if config.pipeline.filter.trim().is_empty() {
        return Err(AppError::config("pipeline.filter cannot be empty"));
    }

    if let Some(limit) = config.pipeline.max_parallel {
        if limit == 0 {
            return Err(AppError::config("pipeline.max_parallel must be at least 1"));
        }
    }

    if config.simulator.steps == 0 {
        return Err(AppError::config("simulator.steps must be at least 1"));
    }

    if config.assets.count == 0 {
        return Err(AppError::config("assets.count must be at least 1"));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        assert!(validate_config(&AppConfig::default()).is_ok());
    }

    #[test]
    fn blank_filter_is_rejected() {
        let mut config = AppConfig::default();
        config.pipeline.filter = "  ".to_string();
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn zero_asset_count_is_rejected() {
        let mut config = AppConfig::default();
        config.assets.count = 0;
        assert!(validate_config(&config).is_err());
    }
}
