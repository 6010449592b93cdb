use crate::consts::{BYTECODE_CACHE_DIR, SOURCE_CACHE_DIR, VERDICT_CACHE_DIR};
use serde::{Deserialize, Serialize};
use std::{
    io,
    path::{Path, PathBuf},
};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CacheError {
    #[error("cache file {path} i/o error: {source}")]
    Io { path: PathBuf, source: io::Error },
    #[error("cache file {path} is malformed: {source}")]
    Json {
        path: PathBuf,
        source: serde_json::Error,
    },
}

#[derive(Serialize, Deserialize)]
struct CachedBytecode {
    result: String,
}

/// Verification success marker contents.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Verdict<'a> {
    pub address: &'a str,
    pub contract_name: &'a str,
    pub compiler_version: &'a str,
}

/// File-per-address caches of provider responses and successful verdicts.
/// Entries never expire.
#[derive(Clone, Debug)]
pub struct Cache {
    dir: PathBuf,
}

impl Cache {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn entry(&self, kind: &str, address: &str, extension: &str) -> PathBuf {
        self.dir
            .join(kind)
            .join(format!("{}.{extension}", address.to_lowercase()))
    }

    pub fn source_path(&self, address: &str) -> PathBuf {
        self.entry(SOURCE_CACHE_DIR, address, "json")
    }

    pub fn bytecode_path(&self, address: &str) -> PathBuf {
        self.entry(BYTECODE_CACHE_DIR, address, "json")
    }

    pub fn verdict_path(&self, address: &str) -> PathBuf {
        self.entry(VERDICT_CACHE_DIR, address, "txt")
    }

    /// Whole `getsourcecode` response stored for the address.
    pub fn load_source(&self, address: &str) -> Result<Option<serde_json::Value>, CacheError> {
        let path = self.source_path(address);
        let Some(content) = read_if_exists(&path)? else {
            return Ok(None);
        };
        tracing::info!(address, "loading contract source from cache");
        serde_json::from_str(&content)
            .map(Some)
            .map_err(|source| CacheError::Json { path, source })
    }

    pub fn store_source(
        &self,
        address: &str,
        response: &serde_json::Value,
    ) -> Result<(), CacheError> {
        let path = self.source_path(address);
        let content = serde_json::to_string_pretty(response).map_err(|source| {
            CacheError::Json {
                path: path.clone(),
                source,
            }
        })?;
        write(&path, content)?;
        tracing::info!(address, "saved contract source to cache");
        Ok(())
    }

    pub fn load_bytecode(&self, address: &str) -> Result<Option<String>, CacheError> {
        let path = self.bytecode_path(address);
        let Some(content) = read_if_exists(&path)? else {
            return Ok(None);
        };
        tracing::info!(address, "loading bytecode from cache");
        let cached: CachedBytecode =
            serde_json::from_str(&content).map_err(|source| CacheError::Json { path, source })?;
        Ok(Some(cached.result))
    }

    pub fn store_bytecode(&self, address: &str, bytecode: &str) -> Result<(), CacheError> {
        let path = self.bytecode_path(address);
        let cached = CachedBytecode {
            result: bytecode.to_string(),
        };
        let content = serde_json::to_string_pretty(&cached).map_err(|source| CacheError::Json {
            path: path.clone(),
            source,
        })?;
        write(&path, content)
    }

    pub fn is_verified(&self, address: &str) -> bool {
        self.verdict_path(address).exists()
    }

    pub fn store_verdict(&self, verdict: &Verdict<'_>) -> Result<(), CacheError> {
        let path = self.verdict_path(verdict.address);
        let timestamp = chrono::Utc::now().to_rfc3339();
        let content = format!(
            "Verification successful at {timestamp}\nAddress: {}\nContract: {}\nCompiler: {}\n",
            verdict.address, verdict.contract_name, verdict.compiler_version
        );
        write(&path, content)
    }
}

fn read_if_exists(path: &Path) -> Result<Option<String>, CacheError> {
    match std::fs::read_to_string(path) {
        Ok(content) => Ok(Some(content)),
        Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
        Err(source) => Err(CacheError::Io {
            path: path.to_path_buf(),
            source,
        }),
    }
}

fn write(path: &Path, content: String) -> Result<(), CacheError> {
    let io_error = |source| CacheError::Io {
        path: path.to_path_buf(),
        source,
    };
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(io_error)?;
    }
    std::fs::write(path, content).map_err(io_error)
}
