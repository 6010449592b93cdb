use crate::compiler::{CompilerOutput, EvmCompiler, StandardJsonInput};
use async_trait::async_trait;
use ethers_solc::Solc;
use std::path::Path;

#[derive(Default)]
pub struct SolcCompiler {}

impl SolcCompiler {
    pub fn new() -> Self {
        SolcCompiler {}
    }
}

#[async_trait]
impl EvmCompiler for SolcCompiler {
    async fn compile(
        &self,
        path: &Path,
        _ver: &semver::Version,
        input: &StandardJsonInput,
    ) -> Result<CompilerOutput, anyhow::Error> {
        let solc = Solc::from(path);
        let output: CompilerOutput = solc.compile_as(input)?;
        Ok(output)
    }
}
