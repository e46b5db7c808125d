//! Generic JSON-over-HTTP provider wallet client.
//!
//! Each provider type maps to a base endpoint. A balance query is
//! `POST {endpoint}/balance` with the root partner's access token as a bearer
//! token and `{ "operator_code", "username" }` as the body; the provider
//! answers `{ "balance": <decimal> }` or `{ "error": <message> }`.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::debug;
use url::Url;

use crate::domain::{ProviderCredential, ProviderType};
use crate::error::{ExternalWalletError, Result};
use crate::port::outbound::wallet::WalletClient;

#[derive(Debug)]
pub struct HttpWalletClient {
    client: Client,
    endpoints: HashMap<ProviderType, Url>,
}

#[derive(Serialize)]
struct BalanceRequest<'a> {
    operator_code: &'a str,
    username: &'a str,
}

#[derive(Deserialize)]
struct BalanceResponse {
    #[serde(default)]
    balance: Option<Decimal>,
    #[serde(default)]
    error: Option<String>,
}

impl HttpWalletClient {
    /// Build a client with a per-request timeout.
    ///
    /// # Errors
    /// Returns an error if the HTTP client cannot be constructed.
    pub fn new(endpoints: HashMap<ProviderType, Url>, timeout: Duration) -> Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self { client, endpoints })
    }

    fn balance_url(&self, provider: ProviderType) -> std::result::Result<Url, ExternalWalletError> {
        let base = self.endpoints.get(&provider).ok_or_else(|| {
            ExternalWalletError::Request(format!("no wallet endpoint configured for {provider}"))
        })?;
        let mut url = base.clone();
        url.path_segments_mut()
            .map_err(|()| ExternalWalletError::Request(format!("endpoint {base} cannot be a base")))?
            .pop_if_empty()
            .push("balance");
        Ok(url)
    }

    fn interpret(body: &str) -> std::result::Result<Decimal, ExternalWalletError> {
        let response: BalanceResponse = serde_json::from_str(body)
            .map_err(|e| ExternalWalletError::Malformed(e.to_string()))?;
        if let Some(error) = response.error {
            return Err(ExternalWalletError::Rejected(error));
        }
        response
            .balance
            .ok_or_else(|| ExternalWalletError::Malformed("missing balance".to_string()))
    }
}

#[async_trait]
impl WalletClient for HttpWalletClient {
    async fn balance(
        &self,
        credential: &ProviderCredential,
        external_username: &str,
    ) -> std::result::Result<Decimal, ExternalWalletError> {
        let url = self.balance_url(credential.provider)?;
        debug!(provider = %credential.provider, %url, "Querying provider wallet");

        let response = self
            .client
            .post(url)
            .bearer_auth(&credential.access_token)
            .json(&BalanceRequest {
                operator_code: &credential.operator_code,
                username: external_username,
            })
            .send()
            .await
            .map_err(|e| ExternalWalletError::Request(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ExternalWalletError::Status(status.as_u16()));
        }
        let body = response
            .text()
            .await
            .map_err(|e| ExternalWalletError::Request(e.to_string()))?;
        Self::interpret(&body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn client(base: &str) -> HttpWalletClient {
        let endpoints = HashMap::from([(ProviderType::Evolution, Url::parse(base).unwrap())]);
        HttpWalletClient::new(endpoints, Duration::from_secs(1)).unwrap()
    }

    #[test]
    fn balance_url_appends_segment() {
        assert_eq!(
            client("https://wallet.example/api/v2")
                .balance_url(ProviderType::Evolution)
                .unwrap()
                .as_str(),
            "https://wallet.example/api/v2/balance"
        );
        assert_eq!(
            client("https://wallet.example/api/")
                .balance_url(ProviderType::Evolution)
                .unwrap()
                .as_str(),
            "https://wallet.example/api/balance"
        );
    }

    #[test]
    fn unconfigured_provider_is_a_request_error() {
        let err = client("https://wallet.example")
            .balance_url(ProviderType::Habanero)
            .unwrap_err();
        assert!(matches!(err, ExternalWalletError::Request(_)));
    }

    #[test]
    fn accepts_string_and_number_balances() {
        assert_eq!(
            HttpWalletClient::interpret(r#"{"balance":"15.75"}"#).unwrap(),
            dec!(15.75)
        );
        assert_eq!(
            HttpWalletClient::interpret(r#"{"balance":42}"#).unwrap(),
            dec!(42)
        );
    }

    #[test]
    fn provider_error_is_rejected() {
        let err = HttpWalletClient::interpret(r#"{"error":"unknown player"}"#).unwrap_err();
        assert_eq!(err, ExternalWalletError::Rejected("unknown player".to_string()));
    }

    #[test]
    fn garbage_is_malformed() {
        assert!(matches!(
            HttpWalletClient::interpret("<html>"),
            Err(ExternalWalletError::Malformed(_))
        ));
        assert!(matches!(
            HttpWalletClient::interpret("{}"),
            Err(ExternalWalletError::Malformed(_))
        ));
    }
}
