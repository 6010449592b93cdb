mod diagnostics;

pub use diagnostics::{disassemble, find_codecopy, opcode_diff, DiagnosticsError, MismatchReport};

use crate::{
    bytecode::{
        self, decode_bytecode, patch_immutables, split_constructor_args, strip_metadata,
        BytecodeError, ConstructorArgs, Stripped,
    },
    compiler::{
        self, CompilerVersion, Compilers, EvmCompiler, FetchError, Optimizer, SettingsBuilder,
        StandardJsonInput, VersionError,
    },
    provider::{
        parse_source_response, Cache, CacheError, ContractProvider, ContractRecord, ProviderError,
        Verdict,
    },
    solidity::{SourceError, SourceSet},
};
use std::{str::FromStr, sync::Arc};
use thiserror::Error;
use tracing::instrument;

#[derive(Error, Debug)]
pub enum Error {
    #[error("{0}")]
    UnsupportedLanguage(VersionError),
    #[error("{0}")]
    VersionParse(VersionError),
    #[error("provider error: {0}")]
    Provider(#[from] ProviderError),
    #[error("toolchain error: {0}")]
    Toolchain(FetchError),
    #[error("compilation failed: {0}")]
    Compile(compiler::Error),
    #[error("source error: {0}")]
    Source(#[from] SourceError),
    #[error("contract {0} not found in the compiler output")]
    ContractNotFound(String),
    #[error("invalid bytecode: {0}")]
    InvalidBytecode(#[from] BytecodeError),
    #[error("cache error: {0}")]
    Cache(#[from] CacheError),
}

impl From<VersionError> for Error {
    fn from(error: VersionError) -> Self {
        match error {
            VersionError::UnsupportedLanguage(_) => Error::UnsupportedLanguage(error),
            VersionError::VersionParse(_) => Error::VersionParse(error),
        }
    }
}

impl From<compiler::Error> for Error {
    fn from(error: compiler::Error) -> Self {
        match error {
            compiler::Error::Fetch(error) => Error::Toolchain(error),
            error => Error::Compile(error),
        }
    }
}

/// Result of a single verification run.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct VerificationVerdict {
    pub matched: bool,
    /// Set when the verdict comes from a previous successful run.
    pub cached: bool,
    /// Recoverable issues and mismatch details, in the order they were found.
    pub diagnostics: Vec<String>,
}

impl VerificationVerdict {
    fn cached() -> Self {
        Self {
            matched: true,
            cached: true,
            diagnostics: vec![],
        }
    }

    /// Outcome line for `address`, followed by the diagnostics of a mismatch
    /// when `with_diagnostics` is set.
    pub fn report(&self, address: &str, with_diagnostics: bool) -> String {
        if self.matched {
            return format!("✅ Contract {address} verified");
        }
        let mut report = format!("❌ Contract {address} does not match its published source");
        if with_diagnostics {
            for line in &self.diagnostics {
                report.push('\n');
                report.push_str(line);
            }
        }
        report
    }
}

pub struct Verifier<C> {
    provider: Arc<dyn ContractProvider>,
    compilers: Compilers<C>,
    cache: Cache,
}

impl<C> Verifier<C>
where
    C: EvmCompiler,
{
    pub fn new(provider: Arc<dyn ContractProvider>, compilers: Compilers<C>, cache: Cache) -> Self {
        Self {
            provider,
            compilers,
            cache,
        }
    }

    #[instrument(skip(self), level = "info")]
    pub async fn verify(&self, address: &str) -> Result<VerificationVerdict, Error> {
        let address = address.trim().to_lowercase();
        let address = address.as_str();

        if self.cache.is_verified(address) {
            tracing::info!(address, "contract already verified (cached result)");
            return Ok(VerificationVerdict::cached());
        }

        let record = self.contract_record(address).await?;
        tracing::info!(
            contract_name = %record.contract_name,
            compiler_version = %record.compiler_version,
            optimization = record.optimization_used,
            runs = record.optimization_runs(),
            "contract source loaded"
        );
        let compiler_version = CompilerVersion::from_str(&record.compiler_version)?;

        let deployed_raw = self.deployed_bytecode(address).await?;
        let deployed_raw = decode_bytecode("deployed", &deployed_raw)?;

        let input = compilation_input(&record, &compiler_version)?;
        let output = self.compilers.compile(&compiler_version, &input).await?;
        let artifact = output
            .artifact(&record.contract_name)
            .ok_or_else(|| Error::ContractNotFound(record.contract_name.clone()))?;
        tracing::info!(file_name = %artifact.file_name, "contract compiled");
        let mut compiled = decode_bytecode("compiled", &artifact.deployed_bytecode)?;

        let mut diagnostics = Vec::new();

        let immutable_references = &artifact.immutable_references;
        if !record.constructor_arguments.is_empty() && !immutable_references.is_empty() {
            tracing::info!("contract has both constructor arguments and immutable references");
            for (i, arg) in split_constructor_args(&record.constructor_arguments)
                .iter()
                .enumerate()
            {
                tracing::info!("Arg {i}: 0x{arg}");
            }
        }
        let warnings = patch_immutables(&mut compiled, &deployed_raw, immutable_references);
        diagnostics.extend(warnings.iter().map(ToString::to_string));

        let compiled = strip_metadata(&compiled);
        let deployed = strip_metadata(&deployed_raw);
        log_metadata("compiled", &compiled, &mut diagnostics);
        log_metadata("deployed", &deployed, &mut diagnostics);

        let constructor_args =
            ConstructorArgs::reconcile(&record.constructor_arguments, compiled.code, deployed.code);
        if constructor_args.is_suspicious() {
            tracing::warn!("{constructor_args}");
            diagnostics.push(constructor_args.to_string());
        } else {
            tracing::info!("{constructor_args}");
        }

        if bytecode::contains(deployed.code, compiled.code) {
            tracing::info!(address, "verification successful: source code matches deployed bytecode");
            self.cache.store_verdict(&Verdict {
                address,
                contract_name: &record.contract_name,
                compiler_version: &record.compiler_version,
            })?;
            return Ok(VerificationVerdict {
                matched: true,
                cached: false,
                diagnostics,
            });
        }

        tracing::warn!(address, "verification failed: source code does not match deployed bytecode");
        let report = MismatchReport::new(compiled.code, deployed.code, &deployed_raw);
        for line in report.lines() {
            tracing::warn!("{line}");
            diagnostics.push(line);
        }
        Ok(VerificationVerdict {
            matched: false,
            cached: false,
            diagnostics,
        })
    }

    async fn contract_record(&self, address: &str) -> Result<ContractRecord, Error> {
        if let Some(response) = self.cache.load_source(address)? {
            return Ok(parse_source_response(response)?);
        }

        let response = self.provider.fetch_source(address).await?;
        let record = parse_source_response(response.clone())?;
        self.cache.store_source(address, &response)?;
        Ok(record)
    }

    async fn deployed_bytecode(&self, address: &str) -> Result<String, Error> {
        if let Some(bytecode) = self.cache.load_bytecode(address)? {
            return Ok(bytecode);
        }

        let bytecode = self.provider.fetch_bytecode(address).await?;
        self.cache.store_bytecode(address, &bytecode)?;
        Ok(bytecode)
    }
}

fn compilation_input(
    record: &ContractRecord,
    compiler_version: &CompilerVersion,
) -> Result<StandardJsonInput, Error> {
    let source = SourceSet::normalize(&record.contract_name, &record.source_code)?;
    let optimizer = Optimizer {
        enabled: record.optimization_used,
        runs: record.optimization_runs(),
    };
    let settings = SettingsBuilder::new(compiler_version, optimizer)
        .evm_version(record.evm_version())
        .embedded(source.embedded_settings())
        .libraries(source.libraries(&record.library))
        .build();
    Ok(StandardJsonInput::solidity(source.sources(), settings))
}

fn log_metadata(kind: &str, stripped: &Stripped<'_>, diagnostics: &mut Vec<String>) {
    match stripped.decode_metadata() {
        None => tracing::info!(kind, "no metadata found"),
        Some(Ok(metadata)) => tracing::info!(kind, %metadata, "decoded metadata"),
        Some(Err(err)) => {
            let message = format!("could not decode {kind} metadata: {err}");
            tracing::warn!("{message}");
            diagnostics.push(message);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        compiler::{CompilerOutput, FetchError, Fetcher},
        provider::MockContractProvider,
    };
    use async_trait::async_trait;
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use std::path::{Path, PathBuf};

    const ADDRESS: &str = "0x00000000000000000000000000000000000000aa";
    const DEPLOYED: &str = "0x6080604052600080fdfea2646970667358221220dceca8706b29e917d2358f278d6f966d54639965254247559c551d740c88316364736f6c63430008000033";

    struct FixedFetcher;

    #[async_trait]
    impl Fetcher for FixedFetcher {
        async fn fetch(&self, _ver: &semver::Version) -> Result<PathBuf, FetchError> {
            Ok(PathBuf::from("solc"))
        }
    }

    struct FixedCompiler {
        output: serde_json::Value,
    }

    #[async_trait]
    impl EvmCompiler for FixedCompiler {
        async fn compile(
            &self,
            _path: &Path,
            _ver: &semver::Version,
            _input: &StandardJsonInput,
        ) -> Result<CompilerOutput, anyhow::Error> {
            Ok(serde_json::from_value(self.output.clone())?)
        }
    }

    fn source_response(compiler_version: &str, constructor_arguments: &str) -> serde_json::Value {
        json!({"status": "1", "message": "OK", "result": [{
            "SourceCode": "pragma solidity 0.8.0; contract Test {}",
            "ContractName": "Test",
            "CompilerVersion": compiler_version,
            "OptimizationUsed": "1",
            "Runs": "200",
            "ConstructorArguments": constructor_arguments,
            "EVMVersion": "Default",
            "Library": ""
        }]})
    }

    fn compiler_output(deployed: &str, immutables: serde_json::Value) -> serde_json::Value {
        json!({"contracts": {"Test.sol": {"Test": {"evm": {
            "bytecode": {"object": format!("6080604052348015600f57600080fd5b50603f80601d6000396000f3fe{deployed}")},
            "deployedBytecode": {"object": deployed, "immutableReferences": immutables}
        }}}}})
    }

    fn provider(source: serde_json::Value, bytecode: &'static str) -> MockContractProvider {
        let mut provider = MockContractProvider::new();
        provider
            .expect_fetch_source()
            .times(1)
            .returning(move |_| Ok(source.clone()));
        provider
            .expect_fetch_bytecode()
            .times(1)
            .returning(move |_| Ok(bytecode.to_string()));
        provider
    }

    fn verifier(
        provider: MockContractProvider,
        output: serde_json::Value,
        cache: &Path,
    ) -> Verifier<FixedCompiler> {
        let compilers = Compilers::new(Arc::new(FixedFetcher), FixedCompiler { output });
        Verifier::new(Arc::new(provider), compilers, Cache::new(cache))
    }

    #[tokio::test]
    async fn matching_contract_is_verified_and_cached() {
        let dir = tempfile::tempdir().unwrap();
        let verifier = verifier(
            provider(source_response("v0.8.0+commit.c7dfd78e", ""), DEPLOYED),
            compiler_output("6080604052600080fdfe", json!({})),
            dir.path(),
        );

        let verdict = verifier.verify(ADDRESS).await.expect("verification runs");
        assert!(verdict.matched, "{verdict:?}");
        assert!(!verdict.cached);
        assert_eq!(Vec::<String>::new(), verdict.diagnostics);

        // second run is served from the success marker without any provider call
        let verdict = verifier.verify(ADDRESS).await.expect("verification runs");
        assert_eq!(VerificationVerdict::cached(), verdict);
    }

    #[tokio::test]
    async fn immutables_are_patched_before_comparison() {
        let dir = tempfile::tempdir().unwrap();
        let deployed = "0x7f000000000000000000000000000000000000000000000000000000000000002a50";
        let verifier = verifier(
            provider(source_response("v0.8.0+commit.c7dfd78e", ""), deployed),
            compiler_output(
                "7f000000000000000000000000000000000000000000000000000000000000000050",
                json!({"5": [{"start": 1, "length": 32}]}),
            ),
            dir.path(),
        );

        let verdict = verifier.verify(ADDRESS).await.expect("verification runs");
        assert!(verdict.matched, "{verdict:?}");
    }

    #[tokio::test]
    async fn mismatch_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let verifier = verifier(
            provider(source_response("v0.8.0+commit.c7dfd78e", ""), DEPLOYED),
            compiler_output("6080604052600180fdfe", json!({})),
            dir.path(),
        );

        let verdict = verifier.verify(ADDRESS).await.expect("verification runs");
        assert!(!verdict.matched);
        assert!(
            verdict
                .diagnostics
                .iter()
                .any(|line| line == "compiled bytecode length: 10"),
            "{:?}",
            verdict.diagnostics
        );
        assert!(verdict
            .diagnostics
            .iter()
            .any(|line| line.starts_with("found CODECOPY") || line == "no CODECOPY opcodes found"));
        assert!(!Cache::new(dir.path()).is_verified(ADDRESS));
    }

    #[test]
    fn mismatch_report_carries_diagnostics() {
        let verdict = VerificationVerdict {
            matched: false,
            cached: false,
            diagnostics: vec![
                "compiled bytecode length: 10".into(),
                "no CODECOPY opcodes found".into(),
            ],
        };
        assert_eq!(
            "❌ Contract 0xaa does not match its published source\n\
             compiled bytecode length: 10\n\
             no CODECOPY opcodes found",
            verdict.report("0xaa", true)
        );
        assert_eq!(
            "❌ Contract 0xaa does not match its published source",
            verdict.report("0xaa", false)
        );
        assert_eq!(
            "✅ Contract 0xaa verified",
            VerificationVerdict::cached().report("0xaa", true)
        );
    }

    #[tokio::test]
    async fn unsupported_language_short_circuits() {
        let dir = tempfile::tempdir().unwrap();
        let source = source_response("vyper:0.3.7", "");
        let mut provider = MockContractProvider::new();
        provider
            .expect_fetch_source()
            .times(1)
            .returning(move |_| Ok(source.clone()));
        provider.expect_fetch_bytecode().times(0);

        let mut compiler = compiler::MockEvmCompiler::new();
        compiler.expect_compile().times(0);
        let verifier = Verifier::new(
            Arc::new(provider),
            Compilers::new(Arc::new(FixedFetcher), compiler),
            Cache::new(dir.path()),
        );

        let err = verifier.verify(ADDRESS).await.expect_err("vyper is not supported");
        assert!(matches!(err, Error::UnsupportedLanguage(_)), "{err:?}");
    }

    #[tokio::test]
    async fn missing_contract_in_output() {
        let dir = tempfile::tempdir().unwrap();
        let verifier = verifier(
            provider(source_response("v0.8.0+commit.c7dfd78e", ""), DEPLOYED),
            json!({"contracts": {"Test.sol": {"Other": {}}}}),
            dir.path(),
        );

        let err = verifier.verify(ADDRESS).await.expect_err("contract is missing");
        assert!(matches!(err, Error::ContractNotFound(name) if name == "Test"));
    }

    #[tokio::test]
    async fn unlinked_bytecode_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let verifier = verifier(
            provider(source_response("v0.8.0+commit.c7dfd78e", ""), DEPLOYED),
            compiler_output("73__$b4c1da1b3c20f6b1d1a2e9e3c1e7e2e1a4$__6080", json!({})),
            dir.path(),
        );

        let err = verifier.verify(ADDRESS).await.expect_err("unlinked bytecode");
        assert!(
            matches!(err, Error::InvalidBytecode(BytecodeError::Unlinked { .. })),
            "{err:?}"
        );
    }

    #[tokio::test]
    async fn cached_provider_responses_are_reused() {
        let dir = tempfile::tempdir().unwrap();
        let cache = Cache::new(dir.path());
        cache
            .store_source(ADDRESS, &source_response("v0.8.0+commit.c7dfd78e", ""))
            .unwrap();
        cache.store_bytecode(ADDRESS, DEPLOYED).unwrap();

        let mut provider = MockContractProvider::new();
        provider.expect_fetch_source().times(0);
        provider.expect_fetch_bytecode().times(0);

        let verifier = verifier(
            provider,
            compiler_output("6080604052600080fdfe", json!({})),
            dir.path(),
        );
        let verdict = verifier.verify(ADDRESS).await.expect("verification runs");
        assert!(verdict.matched);
    }
}
