//! Configuration loader
//!
//! Loads configuration from an optional .env file and the process
//! environment, then validates it before handing it out.

use std::path::Path;

use super::dto::PipelineConfigDto;
use super::error::{ConfigError, Result};
use super::validator::validate_pipeline_config;

/// Configuration loader
///
/// Loads configuration from:
/// 1. `.env` file (optional, highest priority)
/// 2. Environment variables
///
/// # Example
///
/// ```ignore
/// use tavolo_shared::config::ConfigLoader;
///
/// let loader = ConfigLoader::new(Some(".env".into()));
/// let config = loader.load_pipeline_config()?;
/// ```
#[derive(Debug, Clone)]
pub struct ConfigLoader {
    /// Optional path to .env file
    env_file_path: Option<std::path::PathBuf>,
}

impl ConfigLoader {
    pub fn new(env_file_path: Option<std::path::PathBuf>) -> Self {
        Self { env_file_path }
    }

    /// Load and validate the pipeline configuration.
    pub fn load_pipeline_config(&self) -> Result<PipelineConfigDto> {
        if let Some(path) = &self.env_file_path {
            self.load_env_file(path)?;
        }

        let config = PipelineConfigDto::from_env()?;
        validate_pipeline_config(&config)?;

        Ok(config)
    }

    fn load_env_file(&self, path: &Path) -> Result<()> {
        if !path.exists() {
            return Err(ConfigError::EnvFileLoad {
                path: path.to_path_buf(),
                source: dotenv::Error::Io(std::io::Error::new(
                    std::io::ErrorKind::NotFound,
                    format!("File not found: {}", path.display()),
                )),
            });
        }

        dotenv::from_path(path).map_err(|source| ConfigError::EnvFileLoad {
            path: path.to_path_buf(),
            source,
        })?;

        tracing::debug!(path = %path.display(), "Loaded .env file");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_env_file_is_an_error() {
        let loader = ConfigLoader::new(Some("/nonexistent/.env".into()));
        let result = loader.load_pipeline_config();
        assert!(matches!(result, Err(ConfigError::EnvFileLoad { .. })));
    }
}
