use crate::compiler::{FetchError, Fetcher};
use async_trait::async_trait;
use ethers_solc::Solc;
use std::path::PathBuf;

/// Installs solc releases through svm, reusing already installed binaries.
#[derive(Default)]
pub struct SvmFetcher {}

#[async_trait]
impl Fetcher for SvmFetcher {
    async fn fetch(&self, ver: &semver::Version) -> Result<PathBuf, FetchError> {
        let installed = Solc::find_svm_installed_version(ver.to_string())
            .map_err(|err| FetchError::Install(err.into()))?;
        if let Some(solc) = installed {
            tracing::debug!(version = %ver, "solc is already installed");
            return Ok(solc.solc);
        }

        tracing::info!(version = %ver, "installing solc");
        Solc::install(ver).await.map(|x| x.solc).map_err(|err| {
            let message = err.to_string();
            if message.contains("Unknown version") {
                FetchError::NotFound(ver.clone())
            } else {
                FetchError::Install(anyhow::anyhow!(message))
            }
        })
    }
}
