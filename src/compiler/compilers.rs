use super::{
    fetcher::{FetchError, Fetcher},
    input::StandardJsonInput,
    output::CompilerOutput,
    version::CompilerVersion,
};
use async_trait::async_trait;
use std::{path::Path, sync::Arc};
use thiserror::Error;
use tracing::instrument;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Error while fetching compiler: {0:#}")]
    Fetch(#[from] FetchError),
    #[error("Internal error while compiling: {0:#}")]
    Internal(anyhow::Error),
    #[error("Compilation error: {0:?}")]
    Compilation(Vec<String>),
}

/// Runs a compiler executable over the standard-json input.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait EvmCompiler: Send + Sync {
    async fn compile(
        &self,
        path: &Path,
        ver: &semver::Version,
        input: &StandardJsonInput,
    ) -> Result<CompilerOutput, anyhow::Error>;
}

pub struct Compilers<C> {
    fetcher: Arc<dyn Fetcher>,
    evm_compiler: C,
}

impl<C> Compilers<C>
where
    C: EvmCompiler,
{
    pub fn new(fetcher: Arc<dyn Fetcher>, evm_compiler: C) -> Self {
        Self {
            fetcher,
            evm_compiler,
        }
    }

    #[instrument(name = "download_and_compile", skip(self, input), fields(ver = %compiler_version), level = "debug")]
    pub async fn compile(
        &self,
        compiler_version: &CompilerVersion,
        input: &StandardJsonInput,
    ) -> Result<CompilerOutput, Error> {
        let version = compiler_version.version();
        let path = self.fetcher.fetch(version).await?;

        tracing::info!(version = %version, "compiling with standard json input");
        let output = self
            .evm_compiler
            .compile(&path, version, input)
            .await
            .map_err(Error::Internal)?;

        // Compilations errors, warnings and info messages are returned in `CompilerOutput.error`
        let errors = output.error_messages();
        if !errors.is_empty() {
            return Err(Error::Compilation(errors));
        }

        Ok(output)
    }
}
