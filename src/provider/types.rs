use super::ProviderError;
use crate::compiler::EvmVersion;
use serde::{Deserialize, Deserializer, Serialize};
use serde_with::{serde_as, NoneAsEmptyString};
use std::collections::BTreeMap;

pub const DEFAULT_OPTIMIZATION_RUNS: u32 = 200;

/// Envelope of every `module=contract` response.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub status: String,
    #[serde(default)]
    pub message: String,
    pub result: T,
}

/// `module=proxy` responses follow json-rpc, but api errors come in the
/// regular envelope.
#[derive(Clone, Debug, Deserialize)]
pub(super) struct ProxyResponse {
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub result: Option<serde_json::Value>,
    #[serde(default)]
    pub error: Option<serde_json::Value>,
}

/// Contract metadata published for a verified contract.
#[serde_as]
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ContractRecord {
    #[serde(default)]
    pub source_code: String,
    pub contract_name: String,
    pub compiler_version: String,
    #[serde(deserialize_with = "string_flag", default)]
    pub optimization_used: bool,
    #[serde_as(as = "NoneAsEmptyString")]
    #[serde(default)]
    pub runs: Option<u32>,
    #[serde(rename = "EVMVersion", default)]
    pub evm_version: Option<String>,
    #[serde(default)]
    pub constructor_arguments: String,
    #[serde(deserialize_with = "libraries", default)]
    pub library: BTreeMap<String, String>,
}

impl ContractRecord {
    pub fn optimization_runs(&self) -> u32 {
        self.runs.unwrap_or(DEFAULT_OPTIMIZATION_RUNS)
    }

    pub fn evm_version(&self) -> EvmVersion {
        EvmVersion::from(self.evm_version.as_deref())
    }
}

/// Extracts the contract record out of a `getsourcecode` response.
pub fn parse_source_response(response: serde_json::Value) -> Result<ContractRecord, ProviderError> {
    let response: ApiResponse<serde_json::Value> = serde_json::from_value(response)
        .map_err(|err| ProviderError::InvalidResponse(err.to_string()))?;
    if response.status != "1" {
        let message = match &response.result {
            serde_json::Value::String(details) => format!("{}: {details}", response.message),
            _ => response.message,
        };
        return Err(ProviderError::Api(message));
    }

    let records: Vec<ContractRecord> = serde_json::from_value(response.result)
        .map_err(|err| ProviderError::InvalidResponse(err.to_string()))?;
    let record = records
        .into_iter()
        .next()
        .ok_or_else(|| ProviderError::InvalidResponse("empty result list".into()))?;

    if record.source_code.trim().is_empty() {
        return Err(ProviderError::MissingSource);
    }
    Ok(record)
}

fn string_flag<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    let value = String::deserialize(deserializer)?;
    Ok(value.trim() == "1")
}

/// Libraries are published as `Name1:0xaddress1;Name2:0xaddress2`.
fn libraries<'de, D>(deserializer: D) -> Result<BTreeMap<String, String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = String::deserialize(deserializer)?;
    Ok(parse_libraries(&value))
}

pub fn parse_libraries(value: &str) -> BTreeMap<String, String> {
    value
        .split(';')
        .filter_map(|entry| entry.split_once(':'))
        .map(|(name, address)| (name.trim().to_string(), address.trim().to_string()))
        .filter(|(name, address)| !name.is_empty() && !address.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn record_json() -> serde_json::Value {
        json!({
            "SourceCode": "contract Test {}",
            "ABI": "[]",
            "ContractName": "Test",
            "CompilerVersion": "v0.8.0+commit.c7dfd78e",
            "OptimizationUsed": "1",
            "Runs": "200",
            "ConstructorArguments": "",
            "EVMVersion": "Default",
            "Library": "",
            "LicenseType": "MIT",
            "Proxy": "0",
            "Implementation": "",
            "SwarmSource": ""
        })
    }

    #[test]
    fn parses_successful_response() {
        let response = json!({"status": "1", "message": "OK", "result": [record_json()]});
        let record = parse_source_response(response).expect("valid response");
        assert_eq!(
            ContractRecord {
                source_code: "contract Test {}".into(),
                contract_name: "Test".into(),
                compiler_version: "v0.8.0+commit.c7dfd78e".into(),
                optimization_used: true,
                runs: Some(200),
                evm_version: Some("Default".into()),
                constructor_arguments: "".into(),
                library: BTreeMap::new(),
            },
            record
        );
        assert_eq!(EvmVersion::Default, record.evm_version());
    }

    #[test]
    fn missing_optional_fields() {
        let response = json!({"status": "1", "message": "OK", "result": [{
            "SourceCode": "contract Test {}",
            "ContractName": "Test",
            "CompilerVersion": "v0.4.24+commit.e67f0147",
            "OptimizationUsed": "0",
            "Runs": ""
        }]});
        let record = parse_source_response(response).expect("valid response");
        assert!(!record.optimization_used);
        assert_eq!(DEFAULT_OPTIMIZATION_RUNS, record.optimization_runs());
        assert_eq!(EvmVersion::Explicit("byzantium".into()), record.evm_version());
    }

    #[test]
    fn api_error_is_reported() {
        let response = json!({"status": "0", "message": "NOTOK", "result": "Invalid API Key"});
        let err = parse_source_response(response).expect_err("api error");
        assert!(
            matches!(&err, ProviderError::Api(message) if message == "NOTOK: Invalid API Key"),
            "{err:?}"
        );
    }

    #[test]
    fn unverified_contract_has_no_source() {
        let mut record = record_json();
        record["SourceCode"] = json!("");
        let response = json!({"status": "1", "message": "OK", "result": [record]});
        let err = parse_source_response(response).expect_err("missing source");
        assert!(matches!(err, ProviderError::MissingSource), "{err:?}");
    }

    #[test]
    fn libraries_are_parsed() {
        assert_eq!(
            BTreeMap::from([
                ("SafeMath".to_string(), "0x01".to_string()),
                ("Strings".to_string(), "0x02".to_string()),
            ]),
            parse_libraries("SafeMath:0x01;Strings:0x02;")
        );
        assert!(parse_libraries("").is_empty());
        assert!(parse_libraries("garbage").is_empty());
    }
}
