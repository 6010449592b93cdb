mod constructor;
mod immutables;
mod metadata;

pub use constructor::{split_constructor_args, ConstructorArgs};
pub use immutables::{patch_immutables, PatchWarning};
pub use metadata::{strip_metadata, ContentHash, HashScheme, MetadataHash, SolcTag, Stripped};

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum BytecodeError {
    #[error("{kind} bytecode contains unlinked library references")]
    Unlinked { kind: &'static str },
    #[error("{kind} bytecode is not valid hex: {error}")]
    InvalidHex {
        kind: &'static str,
        error: hex::FromHexError,
    },
}

/// Decodes a hex encoded bytecode, with or without `0x` prefix.
pub fn decode_bytecode(kind: &'static str, bytecode: &str) -> Result<Vec<u8>, BytecodeError> {
    let bytecode = bytecode.trim();
    let bytecode = bytecode
        .strip_prefix("0x")
        .or_else(|| bytecode.strip_prefix("0X"))
        .unwrap_or(bytecode);
    // Library placeholders look like `__$<hash>$__` or `__<name>___`
    if bytecode.contains("__") {
        return Err(BytecodeError::Unlinked { kind });
    }
    hex::decode(bytecode).map_err(|error| BytecodeError::InvalidHex { kind, error })
}

/// Whether `needle` occurs inside `haystack` as a contiguous byte sequence.
pub fn contains(haystack: &[u8], needle: &[u8]) -> bool {
    !needle.is_empty()
        && needle.len() <= haystack.len()
        && haystack
            .windows(needle.len())
            .any(|window| window == needle)
}
