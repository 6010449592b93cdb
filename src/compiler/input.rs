use super::version::{CompilerVersion, EvmVersion};
use crate::solidity::Sources;
use serde::Serialize;
use serde_json::{json, Map, Value};

/// Standard-json compiler input.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct StandardJsonInput {
    pub language: String,
    pub sources: Sources,
    pub settings: Map<String, Value>,
}

impl StandardJsonInput {
    pub fn solidity(sources: Sources, settings: Map<String, Value>) -> Self {
        Self {
            language: "Solidity".to_string(),
            sources,
            settings,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Optimizer {
    pub enabled: bool,
    pub runs: u32,
}

/// Assembles the `settings` section of the compiler input.
///
/// Settings embedded into the published source take precedence over the values
/// declared for the contract, except for the output selection, which is always
/// replaced, and the optimizer details, which are always dropped.
#[derive(Clone, Debug)]
pub struct SettingsBuilder<'a> {
    compiler_version: &'a CompilerVersion,
    evm_version: EvmVersion,
    optimizer: Optimizer,
    embedded: Option<&'a Map<String, Value>>,
    libraries: Option<Map<String, Value>>,
}

impl<'a> SettingsBuilder<'a> {
    pub fn new(compiler_version: &'a CompilerVersion, optimizer: Optimizer) -> Self {
        Self {
            compiler_version,
            evm_version: EvmVersion::Default,
            optimizer,
            embedded: None,
            libraries: None,
        }
    }

    pub fn evm_version(mut self, evm_version: EvmVersion) -> Self {
        self.evm_version = evm_version;
        self
    }

    pub fn embedded(mut self, embedded: Option<&'a Map<String, Value>>) -> Self {
        self.embedded = embedded;
        self
    }

    pub fn libraries(mut self, libraries: Option<Map<String, Value>>) -> Self {
        self.libraries = libraries;
        self
    }

    pub fn build(self) -> Map<String, Value> {
        let mut settings = self.embedded.cloned().unwrap_or_default();

        if let Some(Value::Object(optimizer)) = settings.get_mut("optimizer") {
            optimizer.remove("details");
        }

        settings.insert("outputSelection".into(), output_selection());

        if !settings.contains_key("optimizer") {
            settings.insert(
                "optimizer".into(),
                json!({
                    "enabled": self.optimizer.enabled,
                    "runs": self.optimizer.runs,
                }),
            );
        }

        if let Some(libraries) = self.libraries.filter(|libraries| !libraries.is_empty()) {
            tracing::info!("adding libraries to compilation settings");
            settings.insert("libraries".into(), Value::Object(libraries));
        }

        if self.compiler_version.supports_evm_version() {
            let evm_version = self.evm_version.resolve(self.compiler_version);
            settings.insert("evmVersion".into(), Value::String(evm_version));
        }

        settings
    }
}

fn output_selection() -> Value {
    json!({
        "*": {
            "*": [
                "evm.bytecode",
                "evm.deployedBytecode",
                "evm.deployedBytecode.immutableReferences",
                "metadata"
            ]
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::str::FromStr;

    const OPTIMIZER: Optimizer = Optimizer {
        enabled: true,
        runs: 200,
    };

    fn version(s: &str) -> CompilerVersion {
        CompilerVersion::from_str(s).expect("valid version")
    }

    fn object(value: Value) -> Map<String, Value> {
        value.as_object().expect("json object").clone()
    }

    #[test]
    fn settings_from_declared_values() {
        let compiler = version("v0.8.19+commit.7dd6d404");
        let settings = SettingsBuilder::new(&compiler, OPTIMIZER).build();

        let expected = object(json!({
            "outputSelection": output_selection(),
            "optimizer": { "enabled": true, "runs": 200 },
            "evmVersion": "paris"
        }));
        assert_eq!(expected, settings);
    }

    #[test]
    fn embedded_settings_take_precedence() {
        let compiler = version("v0.8.20+commit.a1b79de6");
        let embedded = object(json!({
            "optimizer": { "enabled": false, "runs": 1000, "details": { "yul": true } },
            "viaIR": true,
            "outputSelection": { "*": { "*": ["abi"] } },
            "remappings": ["@oz/=lib/oz/"]
        }));
        let settings = SettingsBuilder::new(&compiler, OPTIMIZER)
            .evm_version(EvmVersion::Explicit("london".into()))
            .embedded(Some(&embedded))
            .build();

        let expected = object(json!({
            "optimizer": { "enabled": false, "runs": 1000 },
            "viaIR": true,
            "outputSelection": output_selection(),
            "remappings": ["@oz/=lib/oz/"],
            "evmVersion": "london"
        }));
        assert_eq!(expected, settings);
    }

    #[test]
    fn evm_version_omitted_for_old_compilers() {
        let compiler = version("v0.4.18+commit.9cf6e910");
        let settings = SettingsBuilder::new(&compiler, OPTIMIZER).build();
        assert!(!settings.contains_key("evmVersion"), "{settings:?}");
    }

    #[test]
    fn evm_version_compared_as_release() {
        let compiler = version("v0.5.0+commit.1d4f565a");
        let settings = SettingsBuilder::new(&compiler, OPTIMIZER).build();
        assert_eq!(Some(&json!("byzantium")), settings.get("evmVersion"));

        let compiler = version("v0.4.21+commit.dfe3193c");
        let settings = SettingsBuilder::new(&compiler, OPTIMIZER)
            .evm_version(EvmVersion::Explicit("byzantium".into()))
            .build();
        assert_eq!(Some(&json!("byzantium")), settings.get("evmVersion"));
    }

    #[test]
    fn libraries_are_included_when_not_empty() {
        let compiler = version("v0.6.12+commit.27d51765");
        let libraries = object(json!({
            "A.sol": { "SafeMath": "0x0000000000000000000000000000000000000001" }
        }));

        let settings = SettingsBuilder::new(&compiler, OPTIMIZER)
            .libraries(Some(libraries.clone()))
            .build();
        assert_eq!(Some(&Value::Object(libraries)), settings.get("libraries"));

        let settings = SettingsBuilder::new(&compiler, OPTIMIZER)
            .libraries(Some(Map::new()))
            .build();
        assert_eq!(None, settings.get("libraries"));
    }

    #[test]
    fn input_serialization() {
        let compiler = version("v0.8.0+commit.c7dfd78e");
        let sources = crate::solidity::SourceSet::normalize("Test", "contract Test { }")
            .expect("valid source")
            .sources();
        let input = StandardJsonInput::solidity(
            sources,
            SettingsBuilder::new(&compiler, OPTIMIZER).build(),
        );

        let expected = json!({
            "language": "Solidity",
            "sources": { "Test.sol": { "content": "contract Test { }" } },
            "settings": {
                "outputSelection": output_selection(),
                "optimizer": { "enabled": true, "runs": 200 },
                "evmVersion": "istanbul"
            }
        });
        assert_eq!(expected, serde_json::to_value(&input).unwrap());
    }
}
