//! Subset of the standard-JSON compiler output required for bytecode reconciliation.

use serde::Deserialize;
use std::collections::BTreeMap;

#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
pub struct CompilerOutput {
    #[serde(default)]
    pub errors: Vec<OutputError>,
    /// File name -> contract name -> contract.
    #[serde(default)]
    pub contracts: BTreeMap<String, BTreeMap<String, Contract>>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
    Info,
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OutputError {
    pub severity: Severity,
    pub message: String,
    pub formatted_message: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
pub struct Contract {
    pub evm: Option<Evm>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Evm {
    pub bytecode: Option<BytecodeOutput>,
    pub deployed_bytecode: Option<DeployedBytecodeOutput>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
pub struct BytecodeOutput {
    #[serde(default)]
    pub object: String,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeployedBytecodeOutput {
    #[serde(default)]
    pub object: String,
    #[serde(default)]
    pub immutable_references: ImmutableReferences,
}

/// Byte range of a placeholder the compiler left for an immutable variable.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
pub struct Offsets {
    pub start: usize,
    pub length: usize,
}

/// Immutable variable id -> placeholder ranges inside the runtime bytecode.
pub type ImmutableReferences = BTreeMap<String, Vec<Offsets>>;

/// Compilation result of the contract under verification.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CompiledArtifact {
    pub file_name: String,
    pub deployed_bytecode: String,
    pub creation_bytecode: String,
    pub immutable_references: ImmutableReferences,
}

impl CompilerOutput {
    /// Looks up the first file declaring `contract_name`.
    pub fn artifact(&self, contract_name: &str) -> Option<CompiledArtifact> {
        self.contracts
            .iter()
            .find_map(|(file_name, contracts)| {
                contracts
                    .get(contract_name)
                    .map(|contract| (file_name, contract))
            })
            .map(|(file_name, contract)| {
                let evm = contract.evm.clone().unwrap_or_default();
                let deployed = evm.deployed_bytecode.unwrap_or_default();
                CompiledArtifact {
                    file_name: file_name.clone(),
                    deployed_bytecode: deployed.object,
                    creation_bytecode: evm.bytecode.unwrap_or_default().object,
                    immutable_references: deployed.immutable_references,
                }
            })
    }

    pub fn error_messages(&self) -> Vec<String> {
        self.errors
            .iter()
            .filter(|err| err.severity == Severity::Error)
            .map(|err| {
                err.formatted_message
                    .as_ref()
                    .unwrap_or(&err.message)
                    .clone()
            })
            .collect()
    }
}
