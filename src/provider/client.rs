use super::{types::ProxyResponse, ContractProvider, ProviderError};
use crate::settings::ProviderSettings;
use async_trait::async_trait;
use reqwest::Response;
use serde::de::DeserializeOwned;
use std::time::Duration;
use url::Url;

/// Client of an etherscan compatible explorer API.
#[derive(Clone, Debug)]
pub struct EtherscanClient {
    base_url: Url,
    chain_id: u64,
    api_key: Option<String>,
    reqwest_client: reqwest::Client,
}

impl EtherscanClient {
    pub fn new(settings: &ProviderSettings) -> Result<Self, ProviderError> {
        let reqwest_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(settings.request_timeout))
            .build()?;
        Ok(Self {
            base_url: settings.base_url.clone(),
            chain_id: settings.chain_id,
            api_key: settings.api_key.clone(),
            reqwest_client,
        })
    }

    async fn get<T: DeserializeOwned>(
        &self,
        params: &[(&str, &str)],
    ) -> Result<T, ProviderError> {
        let chain_id = self.chain_id.to_string();
        let mut request = self
            .reqwest_client
            .get(self.base_url.clone())
            .query(&[("chainid", chain_id.as_str())])
            .query(params);
        if let Some(api_key) = &self.api_key {
            request = request.query(&[("apikey", api_key.as_str())]);
        }

        let response = request.send().await?;
        Self::process_response(response).await
    }

    async fn process_response<T: DeserializeOwned>(response: Response) -> Result<T, ProviderError> {
        let status = response.status();
        if !status.is_success() {
            return Err(ProviderError::UnexpectedStatusCode {
                status_code: status,
                msg: response.text().await?,
            });
        }
        Ok(response.json::<T>().await?)
    }
}

#[async_trait]
impl ContractProvider for EtherscanClient {
    async fn fetch_source(&self, address: &str) -> Result<serde_json::Value, ProviderError> {
        tracing::info!(address, "downloading contract source");
        self.get(&[
            ("module", "contract"),
            ("action", "getsourcecode"),
            ("address", address),
        ])
        .await
    }

    async fn fetch_bytecode(&self, address: &str) -> Result<String, ProviderError> {
        tracing::info!(address, "fetching deployed bytecode");
        let response: ProxyResponse = self
            .get(&[
                ("module", "proxy"),
                ("action", "eth_getCode"),
                ("address", address),
                ("tag", "latest"),
            ])
            .await?;

        if let Some(error) = response.error {
            return Err(ProviderError::Api(error.to_string()));
        }
        match (response.status.as_deref(), response.result) {
            (Some("0"), result) => {
                let details = result.map(|value| value.to_string()).unwrap_or_default();
                Err(ProviderError::Api(format!(
                    "{}: {details}",
                    response.message.unwrap_or_default()
                )))
            }
            (_, Some(serde_json::Value::String(code))) if code.starts_with("0x") => Ok(code),
            (_, result) => Err(ProviderError::InvalidResponse(format!(
                "unexpected bytecode result: {result:?}"
            ))),
        }
    }
}
