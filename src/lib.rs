mod cli;
mod consts;
mod settings;
mod tracer;

pub mod bytecode;
pub mod compiler;
pub mod provider;
pub mod solidity;
pub mod verifier;

pub use cli::Args;
pub use consts::{
    BYTECODE_CACHE_DIR, DEFAULT_CACHE_DIR, DEFAULT_CHAIN_ID, DEFAULT_PROVIDER_URL,
    SOURCE_CACHE_DIR, VERDICT_CACHE_DIR,
};
pub use settings::{CacheSettings, ProviderSettings, Settings, TracingFormat, TracingSettings};
pub use tracer::init_logs;
pub use verifier::{Error, VerificationVerdict, Verifier};

use compiler::Compilers;
use provider::{Cache, EtherscanClient};
use solidity::{SolcCompiler, SvmFetcher};
use std::sync::Arc;

/// Verifies a single contract with the explorer client, svm installed compilers
/// and the on-disk cache described by `settings`.
pub async fn run(settings: &Settings, address: &str) -> Result<VerificationVerdict, Error> {
    let provider = EtherscanClient::new(&settings.provider)?;
    let compilers = Compilers::new(Arc::new(SvmFetcher::default()), SolcCompiler::new());
    let verifier = Verifier::new(
        Arc::new(provider),
        compilers,
        Cache::new(settings.cache.dir.clone()),
    );
    verifier.verify(address).await
}
