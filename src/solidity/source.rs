use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use thiserror::Error;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Source {
    pub content: String,
}

/// File path -> file content.
pub type Sources = BTreeMap<String, Source>;

#[derive(Error, Debug)]
pub enum SourceError {
    #[error("source code is empty")]
    Empty,
    #[error("invalid standard json source: {0}")]
    StandardJson(serde_json::Error),
    #[error("invalid multi-file source: {0}")]
    MultiFile(serde_json::Error),
}

#[derive(Deserialize)]
struct StandardJsonPayload {
    sources: Sources,
    #[serde(default)]
    settings: Option<Map<String, Value>>,
    #[serde(default)]
    libraries: Option<Map<String, Value>>,
}

/// Source code of a contract in one of the shapes the provider publishes it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SourceSet {
    /// Full standard-json input (`{{ ... }}` payload); may carry its own settings.
    StandardJson {
        sources: Sources,
        settings: Option<Map<String, Value>>,
        libraries: Option<Map<String, Value>>,
    },
    /// Plain JSON mapping of file paths to contents.
    MultiFile { sources: Sources },
    /// Single flattened file.
    SingleFile { file_name: String, content: String },
}

impl SourceSet {
    pub fn normalize(contract_name: &str, payload: &str) -> Result<Self, SourceError> {
        let trimmed = payload.trim();
        if trimmed.is_empty() {
            return Err(SourceError::Empty);
        }

        if trimmed.starts_with("{{") {
            // The outer braces do not belong to the json document
            let inner = trimmed
                .strip_prefix('{')
                .and_then(|inner| inner.strip_suffix('}'))
                .unwrap_or(trimmed);
            let payload: StandardJsonPayload =
                serde_json::from_str(inner).map_err(SourceError::StandardJson)?;
            Ok(SourceSet::StandardJson {
                sources: payload.sources,
                settings: payload.settings,
                libraries: payload.libraries,
            })
        } else if trimmed.starts_with('{') {
            let sources = serde_json::from_str(trimmed).map_err(SourceError::MultiFile)?;
            Ok(SourceSet::MultiFile { sources })
        } else {
            Ok(SourceSet::SingleFile {
                file_name: format!("{contract_name}.sol"),
                content: payload.to_string(),
            })
        }
    }

    pub fn sources(&self) -> Sources {
        match self {
            SourceSet::StandardJson { sources, .. } | SourceSet::MultiFile { sources } => {
                sources.clone()
            }
            SourceSet::SingleFile { file_name, content } => BTreeMap::from([(
                file_name.clone(),
                Source {
                    content: content.clone(),
                },
            )]),
        }
    }

    pub fn embedded_settings(&self) -> Option<&Map<String, Value>> {
        match self {
            SourceSet::StandardJson { settings, .. } => settings.as_ref(),
            _ => None,
        }
    }

    pub fn embedded_libraries(&self) -> Option<&Map<String, Value>> {
        match self {
            SourceSet::StandardJson { libraries, .. } => libraries.as_ref(),
            _ => None,
        }
    }

    /// Name of the only file of a flattened source.
    pub fn single_file_name(&self) -> Option<&str> {
        match self {
            SourceSet::SingleFile { file_name, .. } => Some(file_name),
            _ => None,
        }
    }

    /// Library links to compile with.
    ///
    /// Libraries embedded into a standard-json source are used verbatim. Libraries declared
    /// alongside the contract can only be attributed to a file for flattened sources.
    pub fn libraries(&self, declared: &BTreeMap<String, String>) -> Option<Map<String, Value>> {
        if let Some(embedded) = self.embedded_libraries().filter(|libs| !libs.is_empty()) {
            return Some(embedded.clone());
        }

        match self.single_file_name() {
            Some(file_name) if !declared.is_empty() => {
                let links = declared
                    .iter()
                    .map(|(name, address)| (name.clone(), Value::String(address.clone())))
                    .collect();
                Some(Map::from_iter([(file_name.to_string(), Value::Object(links))]))
            }
            _ => None,
        }
    }
}
