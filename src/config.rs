//! Configuration handling for the form runner

use anyhow::{anyhow, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::submit::{FileSubmitter, HttpSubmitter, Submitter};
use crate::value::FormState;

/// Environment variable overriding the schema path
pub const SCHEMA_ENV: &str = "DYNFORM_SCHEMA";
/// Environment variable overriding the submit URL
pub const SUBMIT_URL_ENV: &str = "DYNFORM_SUBMIT_URL";

const DEFAULT_LOG_FILTER: &str = "dynform=info";

/// User configuration for the form runner
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct FormConfig {
    /// Form schema to open when none is given on the command line
    pub schema_path: Option<PathBuf>,
    /// JSON file with values to pre-fill the form with
    pub initial_values_path: Option<PathBuf>,
    /// Directory receiving submissions when no URL is set
    pub output_dir: Option<PathBuf>,
    /// Endpoint receiving submissions as a JSON POST
    pub submit_url: Option<String>,
    /// tracing filter directive, e.g. `dynform=debug`
    pub log_filter: Option<String>,
}

impl FormConfig {
    fn project_dirs() -> Option<ProjectDirs> {
        ProjectDirs::from("io", "dynform", "dynform")
    }

    /// Get the config file path
    pub fn config_path() -> Option<PathBuf> {
        Self::project_dirs().map(|dirs| dirs.config_dir().join("config.json"))
    }

    /// Directory for logs and file submissions
    pub fn data_dir() -> Option<PathBuf> {
        Self::project_dirs().map(|dirs| dirs.data_dir().to_path_buf())
    }

    /// Load configuration from the default location
    pub fn load() -> Result<Self> {
        match Self::config_path() {
            Some(path) => Self::load_from(&path),
            None => Ok(Self::default()),
        }
    }

    /// Load configuration from `path`, or defaults when it does not exist
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = fs::read_to_string(path)
            .map_err(|e| anyhow!("Failed to read config {}: {}", path.display(), e))?;
        let config: FormConfig = serde_json::from_str(&content)
            .map_err(|e| anyhow!("Failed to parse config {}: {}", path.display(), e))?;
        Ok(config)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let content = serde_json::to_string_pretty(self)?;
        fs::write(path, content)?;
        Ok(())
    }

    /// Apply overrides from the process environment
    pub fn with_env(self) -> Self {
        self.with_overrides(|key| std::env::var(key).ok())
    }

    /// Apply overrides from any key lookup; blank values are ignored
    pub fn with_overrides<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let lookup = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        if let Some(schema) = lookup(SCHEMA_ENV) {
            self.schema_path = Some(PathBuf::from(schema));
        }
        if let Some(url) = lookup(SUBMIT_URL_ENV) {
            self.submit_url = Some(url);
        }
        self
    }

    /// A schema path from the command line wins over everything else
    pub fn with_schema_arg(mut self, arg: Option<String>) -> Self {
        if let Some(path) = arg {
            self.schema_path = Some(PathBuf::from(path));
        }
        self
    }

    pub fn schema_path(&self) -> Result<&Path> {
        self.schema_path.as_deref().ok_or_else(|| {
            anyhow!("No form schema given; pass a path or set {}", SCHEMA_ENV)
        })
    }

    pub fn log_filter(&self) -> &str {
        self.log_filter.as_deref().unwrap_or(DEFAULT_LOG_FILTER)
    }

    /// Where the file submitter writes
    pub fn submissions_dir(&self) -> PathBuf {
        self.output_dir.clone().unwrap_or_else(|| {
            Self::data_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join("submissions")
        })
    }

    /// HTTP when a URL is configured, files otherwise
    pub fn submitter(&self) -> Arc<dyn Submitter> {
        match &self.submit_url {
            Some(url) => Arc::new(HttpSubmitter::new(url.clone())),
            None => Arc::new(FileSubmitter::new(self.submissions_dir())),
        }
    }

    /// Read the pre-fill values, if configured
    pub fn load_initial_values(&self) -> Result<Option<FormState>> {
        let Some(path) = &self.initial_values_path else {
            return Ok(None);
        };
        let content = fs::read_to_string(path)
            .map_err(|e| anyhow!("Failed to read initial values {}: {}", path.display(), e))?;
        let state = FormState::from_json_str(&content)
            .map_err(|e| anyhow!("Failed to parse initial values {}: {}", path.display(), e))?;
        Ok(Some(state))
    }
}
