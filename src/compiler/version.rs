use crate::consts::UNSUPPORTED_LANGUAGE_MARKER;
use std::{
    fmt::{Display, Formatter},
    str::FromStr,
};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum VersionError {
    #[error("unsupported compiler (only solidity contracts can be verified): {0}")]
    UnsupportedLanguage(String),
    #[error("invalid compiler version '{0}': expected 'major.minor.patch'")]
    VersionParse(String),
}

/// Compiler version as reported by the provider (e.g. `v0.8.20+commit.a1b79de6`)
/// together with its release triple.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CompilerVersion {
    raw: String,
    version: semver::Version,
}

impl CompilerVersion {
    pub fn version(&self) -> &semver::Version {
        &self.version
    }

    pub fn raw(&self) -> &str {
        &self.raw
    }

    /// Compilers older than 0.4.21 reject the `evmVersion` setting.
    pub fn supports_evm_version(&self) -> bool {
        self.version >= semver::Version::new(0, 4, 21)
    }
}

impl FromStr for CompilerVersion {
    type Err = VersionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.to_ascii_lowercase().contains(UNSUPPORTED_LANGUAGE_MARKER) {
            return Err(VersionError::UnsupportedLanguage(s.to_string()));
        }

        let release = s.strip_prefix('v').unwrap_or(s);
        let release = release.split('+').next().unwrap_or_default();
        let release = release.split('-').next().unwrap_or_default();

        let parts = release
            .split('.')
            .map(u64::from_str)
            .collect::<Result<Vec<_>, _>>()
            .map_err(|_| VersionError::VersionParse(s.to_string()))?;
        let version = match parts.as_slice() {
            [major, minor, patch] => semver::Version::new(*major, *minor, *patch),
            _ => return Err(VersionError::VersionParse(s.to_string())),
        };

        Ok(Self {
            raw: s.to_string(),
            version,
        })
    }
}

impl Display for CompilerVersion {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.raw)
    }
}

/// Execution forks a compiler falls back to when the contract
/// was compiled with the "default" EVM target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum EvmFork {
    Byzantium,
    Petersburg,
    Istanbul,
    Berlin,
    London,
    Paris,
    Shanghai,
}

impl EvmFork {
    pub fn as_str(&self) -> &'static str {
        match self {
            EvmFork::Byzantium => "byzantium",
            EvmFork::Petersburg => "petersburg",
            EvmFork::Istanbul => "istanbul",
            EvmFork::Berlin => "berlin",
            EvmFork::London => "london",
            EvmFork::Paris => "paris",
            EvmFork::Shanghai => "shanghai",
        }
    }

    pub fn default_for(version: &semver::Version) -> Self {
        match (version.major, version.minor, version.patch) {
            (0, 8.., 20..) => EvmFork::Shanghai,
            (0, 8.., 18..) => EvmFork::Paris,
            (0, 8.., 13..) => EvmFork::London,
            (0, 8.., 7..) => EvmFork::Berlin,
            (0, 7.., _) => EvmFork::Istanbul,
            (0, 5.., 5..) => EvmFork::Petersburg,
            _ => EvmFork::Byzantium,
        }
    }
}

impl Display for EvmFork {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// EVM target declared for the contract.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EvmVersion {
    Default,
    Explicit(String),
}

impl EvmVersion {
    /// Concrete fork name to compile for.
    pub fn resolve(&self, compiler: &CompilerVersion) -> String {
        match self {
            EvmVersion::Default => EvmFork::default_for(compiler.version()).to_string(),
            EvmVersion::Explicit(name) => name.clone(),
        }
    }
}

impl From<Option<&str>> for EvmVersion {
    fn from(value: Option<&str>) -> Self {
        match value.map(str::trim) {
            Some(value) if value.eq_ignore_ascii_case("default") => EvmVersion::Default,
            Some(value) if !value.is_empty() => EvmVersion::Explicit(value.to_ascii_lowercase()),
            _ => EvmVersion::Explicit(EvmFork::Byzantium.to_string()),
        }
    }
}
