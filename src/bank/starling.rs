//! Starling Bank v2 REST client.

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;
use uuid::Uuid;

use super::error::BankError;
use super::{BankApi, TransferReceipt};
use crate::config::BankConfig;
use crate::money::Amount;

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct BalanceResponse {
    effective_balance: Amount,
}

#[derive(Serialize)]
struct TopUpRequest<'a> {
    amount: &'a Amount,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct TransferResponse {
    #[serde(default)]
    transfer_uid: String,
    #[serde(default = "default_success")]
    success: bool,
    #[serde(default)]
    errors: Vec<ErrorDetail>,
}

fn default_success() -> bool {
    true
}

#[derive(Deserialize)]
struct ErrorDetail {
    #[serde(default)]
    message: String,
}

/// Client for the two Starling endpoints the sweeper uses.
///
/// The `reqwest::Client` is injected so callers control pooling and tests can
/// point the base URL at a local fake.
pub struct StarlingClient {
    http: reqwest::Client,
    base_url: String,
    access_token: String,
    timeout: Duration,
}

impl StarlingClient {
    pub fn new(
        http: reqwest::Client,
        base_url: impl Into<String>,
        access_token: impl Into<String>,
    ) -> Self {
        Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            access_token: access_token.into(),
            timeout: Duration::from_secs(30),
        }
    }

    pub fn from_config(http: reqwest::Client, config: &BankConfig) -> Self {
        Self::new(http, &config.base_url, &config.access_token)
            .with_timeout(Duration::from_secs(config.timeout_secs))
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn read_json<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, BankError> {
        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(BankError::Status {
                status: status.as_u16(),
                body,
            });
        }
        serde_json::from_str(&body).map_err(|e| BankError::Decode(e.to_string()))
    }
}

#[async_trait]
impl BankApi for StarlingClient {
    async fn effective_balance(&self, account_uid: &str) -> Result<Amount, BankError> {
        let url = format!("{}/api/v2/accounts/{}/balance", self.base_url, account_uid);
        debug!(url = %url, "Fetching account balance");

        let response = self
            .http
            .get(&url)
            .bearer_auth(&self.access_token)
            .timeout(self.timeout)
            .send()
            .await?;
        let balance: BalanceResponse = Self::read_json(response).await?;
        Ok(balance.effective_balance)
    }

    async fn transfer_to_goal(
        &self,
        account_uid: &str,
        goal_uid: &str,
        amount: &Amount,
    ) -> Result<TransferReceipt, BankError> {
        let transfer_uid = Uuid::new_v4();
        let url = format!(
            "{}/api/v2/account/{}/savings-goals/{}/add-money/{}",
            self.base_url, account_uid, goal_uid, transfer_uid
        );
        debug!(
            url = %url,
            minor_units = amount.minor_units,
            currency = %amount.currency,
            "Adding money to savings goal"
        );

        let response = self
            .http
            .put(&url)
            .bearer_auth(&self.access_token)
            .timeout(self.timeout)
            .json(&TopUpRequest { amount })
            .send()
            .await?;
        let status = response.status();
        let result: TransferResponse = Self::read_json(response).await?;

        if !result.success {
            return Err(BankError::Rejected {
                errors: result.errors.into_iter().map(|e| e.message).collect(),
            });
        }

        // An empty uid in a 2xx response still means the transfer went through.
        let transfer_uid = if result.transfer_uid.is_empty() {
            transfer_uid.to_string()
        } else {
            result.transfer_uid
        };
        debug!(transfer_uid = %transfer_uid, status = %status, "Transfer accepted");
        Ok(TransferReceipt { transfer_uid })
    }
}
