mod cache;
mod client;
mod types;

pub use cache::{Cache, CacheError, Verdict};
pub use client::EtherscanClient;
pub use types::{parse_libraries, parse_source_response, ApiResponse, ContractRecord};

use async_trait::async_trait;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ProviderError {
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("unexpected status code {status_code}: {msg}")]
    UnexpectedStatusCode {
        status_code: reqwest::StatusCode,
        msg: String,
    },
    #[error("api error: {0}")]
    Api(String),
    #[error("no source code found for this contract")]
    MissingSource,
    #[error("invalid response: {0}")]
    InvalidResponse(String),
}

/// Source of contract metadata and on-chain bytecode.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ContractProvider: Send + Sync {
    /// Raw `getsourcecode` response.
    async fn fetch_source(&self, address: &str) -> Result<serde_json::Value, ProviderError>;

    /// `0x` prefixed runtime bytecode at the latest block.
    async fn fetch_bytecode(&self, address: &str) -> Result<String, ProviderError>;
}
