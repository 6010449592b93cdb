pub const DEFAULT_PROVIDER_URL: &str = "https://api.etherscan.io/v2/api";

pub const DEFAULT_CHAIN_ID: u64 = 1;

pub const DEFAULT_CACHE_DIR: &str = "cache";

pub const SOURCE_CACHE_DIR: &str = "etherscan_verified";
pub const BYTECODE_CACHE_DIR: &str = "etherscan_bytecode";
pub const VERDICT_CACHE_DIR: &str = "VERIFICATION_SUCCESSFUL";

/// Marker the provider puts into the compiler version of non-Solidity contracts.
pub const UNSUPPORTED_LANGUAGE_MARKER: &str = "vyper";
