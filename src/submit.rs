//! Submit boundary
//!
//! The form hands its values to a [`Submitter`] and only learns whether the
//! operation succeeded. The adapters here cover the common cases: a closure,
//! a directory of JSON files, and an HTTP endpoint accepting a JSON POST.

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use chrono::Utc;
use std::future::Future;
use std::path::PathBuf;
use uuid::Uuid;

use crate::value::FormState;

/// External operation that receives a validated form
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Submitter: Send + Sync {
    /// Deliver the full values tree; an `Err` is reported to the user as a failed submission
    async fn submit(&self, values: &FormState) -> Result<()>;
}

/// Submitter backed by an async closure
pub struct FnSubmitter<F> {
    f: F,
}

impl<F, Fut> FnSubmitter<F>
where
    F: Fn(FormState) -> Fut + Send + Sync,
    Fut: Future<Output = Result<()>> + Send + 'static,
{
    pub fn new(f: F) -> Self {
        Self { f }
    }
}

#[async_trait]
impl<F, Fut> Submitter for FnSubmitter<F>
where
    F: Fn(FormState) -> Fut + Send + Sync,
    Fut: Future<Output = Result<()>> + Send + 'static,
{
    async fn submit(&self, values: &FormState) -> Result<()> {
        (self.f)(values.clone()).await
    }
}

/// Writes each submission as a pretty-printed JSON file into a directory
#[derive(Debug, Clone)]
pub struct FileSubmitter {
    dir: PathBuf,
}

impl FileSubmitter {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &PathBuf {
        &self.dir
    }

    fn file_name() -> String {
        format!(
            "submission-{}-{}.json",
            Utc::now().format("%Y%m%dT%H%M%S"),
            Uuid::new_v4().simple()
        )
    }
}

#[async_trait]
impl Submitter for FileSubmitter {
    async fn submit(&self, values: &FormState) -> Result<()> {
        tokio::fs::create_dir_all(&self.dir)
            .await
            .map_err(|e| anyhow!("Failed to create {}: {}", self.dir.display(), e))?;

        let path = self.dir.join(Self::file_name());
        let content = values.to_json_pretty()?;
        tokio::fs::write(&path, content)
            .await
            .map_err(|e| anyhow!("Failed to write {}: {}", path.display(), e))?;

        tracing::info!("Wrote submission to {}", path.display());
        Ok(())
    }
}

/// POSTs the values as JSON; any non-success status is a failure
#[derive(Debug, Clone)]
pub struct HttpSubmitter {
    client: reqwest::Client,
    url: String,
}

impl HttpSubmitter {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            url: url.into(),
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl Submitter for HttpSubmitter {
    async fn submit(&self, values: &FormState) -> Result<()> {
        let response = self
            .client
            .post(&self.url)
            .json(values)
            .send()
            .await
            .map_err(|e| anyhow!("Failed to reach {}: {}", self.url, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(anyhow!("Server rejected submission ({status})"));
        }

        tracing::info!("Submitted form to {} ({status})", self.url);
        Ok(())
    }
}
