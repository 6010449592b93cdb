use async_trait::async_trait;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum FetchError {
    #[error("version {0} not found")]
    NotFound(semver::Version),
    #[error("couldn't install the compiler: {0:#}")]
    Install(anyhow::Error),
}

/// Provides a path to the compiler executable of the requested release,
/// installing it first if required.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Fetcher: Send + Sync {
    async fn fetch(&self, ver: &semver::Version) -> Result<PathBuf, FetchError>;
}
