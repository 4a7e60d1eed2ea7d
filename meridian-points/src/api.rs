//! Wire protocol for the points service
//!
//! [`PointsApi`] is the transport seam: one method per service endpoint,
//! taking and returning the raw wire DTOs. [`HttpPointsApi`] is the
//! reqwest-backed production implementation; tests substitute mocks.
//! Success-flag interpretation happens above this layer, so every response
//! DTO carries its `success` field through unchanged.

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, error};

use crate::error::{Error, Result};
use crate::types::{PointBalances, PointType, PointsTransfer, TransferBatch, TransferBatchList};

/// Body of the auth challenge request
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChallengeRequest {
    /// Contract the operator authenticates for
    pub contract_address: String,
    /// Operator address derived from the operator key
    pub operator_address: String,
}

/// Response of the auth challenge endpoint
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChallengeResponse {
    pub success: bool,
    /// Opaque challenge payload, echoed verbatim into the solve request
    #[serde(default)]
    pub challenge_data: Option<serde_json::Value>,
    /// Message to sign under ERC-191
    #[serde(default)]
    pub message: Option<String>,
}

/// Body of the auth solve request
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SolveRequest {
    /// The challenge payload exactly as the challenge endpoint returned it
    pub challenge_data: serde_json::Value,
    /// ERC-191 signature over the challenge message, `0x`-prefixed hex
    pub signature: String,
}

/// Response of the auth solve endpoint
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SolveResponse {
    pub success: bool,
    #[serde(default)]
    pub bearer_token: Option<String>,
}

/// Raw per-type balances keyed by uppercase point type
#[derive(Debug, Clone, Deserialize)]
pub struct BalancesByPointType {
    #[serde(rename = "LIQUIDITY")]
    pub liquidity: PointBalances,
    #[serde(rename = "DEVELOPER")]
    pub developer: PointBalances,
}

/// Response of the point-balances endpoint
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PointBalancesResponse {
    pub success: bool,
    #[serde(default)]
    pub balances_by_point_type: Option<BalancesByPointType>,
}

/// Response of the batch-listing endpoint (one page)
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListBatchesResponse {
    pub success: bool,
    #[serde(default)]
    pub batches: Vec<TransferBatch>,
    /// Cursor of the next page; `None` on the final page
    #[serde(default)]
    pub cursor: Option<String>,
}

/// Response of the single-batch endpoint
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GetBatchResponse {
    pub success: bool,
    #[serde(default)]
    pub batch: Option<TransferBatchList>,
}

/// Body of the transfer submission request
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PutBatchRequest {
    pub point_type: PointType,
    pub transfers: Vec<PointsTransfer>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seconds_to_finalize: Option<u64>,
}

/// Response of the transfer submission endpoint
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PutBatchResponse {
    pub success: bool,
    #[serde(default)]
    pub batch_id: Option<String>,
}

/// Response of the batch cancellation endpoint
#[derive(Debug, Clone, Deserialize)]
pub struct CancelBatchResponse {
    pub success: bool,
}

/// Transport seam for the points service
///
/// One method per endpoint. Implementations map transport failures into
/// [`Error::Auth`] for the two auth endpoints and [`Error::Request`] for
/// everything else; success flags are interpreted by the caller.
#[async_trait]
pub trait PointsApi: Send + Sync {
    /// POST /v1/dapp-auth/challenge
    async fn request_challenge(&self, body: &ChallengeRequest) -> Result<ChallengeResponse>;

    /// POST /v1/dapp-auth/solve
    async fn solve_challenge(&self, body: &SolveRequest) -> Result<SolveResponse>;

    /// GET /v1/contracts/{addr}/point-balances
    async fn point_balances(&self, token: &str, contract: &str) -> Result<PointBalancesResponse>;

    /// GET /v1/contracts/{addr}/batches[?cursor=X]
    async fn list_batches(
        &self,
        token: &str,
        contract: &str,
        cursor: Option<&str>,
    ) -> Result<ListBatchesResponse>;

    /// GET /v1/contracts/{addr}/batches/{id}
    async fn get_batch(
        &self,
        token: &str,
        contract: &str,
        batch_id: &str,
    ) -> Result<GetBatchResponse>;

    /// PUT /v1/contracts/{addr}/batches/{id}
    async fn put_batch(
        &self,
        token: &str,
        contract: &str,
        batch_id: &str,
        body: &PutBatchRequest,
    ) -> Result<PutBatchResponse>;

    /// DELETE /v1/contracts/{addr}/batches/{id}
    async fn cancel_batch(
        &self,
        token: &str,
        contract: &str,
        batch_id: &str,
    ) -> Result<CancelBatchResponse>;
}

/// reqwest-backed implementation of [`PointsApi`]
pub struct HttpPointsApi {
    client: reqwest::Client,
    base_url: String,
}

impl HttpPointsApi {
    /// Create a client against the given base URL
    pub fn new(base_url: &str) -> Result<Self> {
        reqwest::Url::parse(base_url)
            .map_err(|e| Error::Config(format!("Invalid base URL '{}': {}", base_url, e)))?;

        Ok(Self {
            client: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    fn contract_url(&self, contract: &str, suffix: &str) -> String {
        format!("{}/v1/contracts/{}{}", self.base_url, contract, suffix)
    }

    /// Check the HTTP status, then decode the JSON body.
    ///
    /// `wrap` selects the error variant for the failure site (auth endpoints
    /// map to `Error::Auth`, the rest to `Error::Request`).
    async fn decode<T: DeserializeOwned>(
        response: reqwest::Response,
        wrap: fn(String) -> Error,
    ) -> Result<T> {
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            error!(status = %status, body = %body, "points service returned an error status");
            return Err(wrap(format!(
                "points service returned {}: {}",
                status, body
            )));
        }

        response.json::<T>().await.map_err(|e| {
            error!(status = %status, error = %e, "failed to decode points service response");
            wrap(format!("failed to decode points service response: {}", e))
        })
    }
}

#[async_trait]
impl PointsApi for HttpPointsApi {
    async fn request_challenge(&self, body: &ChallengeRequest) -> Result<ChallengeResponse> {
        let url = format!("{}/v1/dapp-auth/challenge", self.base_url);
        debug!(url = %url, operator = %body.operator_address, "requesting auth challenge");

        let response = self
            .client
            .post(url)
            .json(body)
            .send()
            .await
            .map_err(|e| Error::Auth(format!("challenge request failed: {}", e)))?;

        Self::decode(response, Error::Auth).await
    }

    async fn solve_challenge(&self, body: &SolveRequest) -> Result<SolveResponse> {
        let url = format!("{}/v1/dapp-auth/solve", self.base_url);
        debug!(url = %url, "submitting challenge signature");

        let response = self
            .client
            .post(url)
            .json(body)
            .send()
            .await
            .map_err(|e| Error::Auth(format!("solve request failed: {}", e)))?;

        Self::decode(response, Error::Auth).await
    }

    async fn point_balances(&self, token: &str, contract: &str) -> Result<PointBalancesResponse> {
        let url = self.contract_url(contract, "/point-balances");
        debug!(url = %url, "fetching point balances");

        let response = self
            .client
            .get(url)
            .header("Authorization", format!("Bearer {}", token))
            .send()
            .await
            .map_err(|e| Error::Request(format!("point balances request failed: {}", e)))?;

        Self::decode(response, Error::Request).await
    }

    async fn list_batches(
        &self,
        token: &str,
        contract: &str,
        cursor: Option<&str>,
    ) -> Result<ListBatchesResponse> {
        let url = self.contract_url(contract, "/batches");
        debug!(url = %url, cursor = ?cursor, "fetching transfer batch page");

        let mut request = self
            .client
            .get(url)
            .header("Authorization", format!("Bearer {}", token));
        if let Some(cursor) = cursor {
            request = request.query(&[("cursor", cursor)]);
        }

        let response = request
            .send()
            .await
            .map_err(|e| Error::Request(format!("batch listing request failed: {}", e)))?;

        Self::decode(response, Error::Request).await
    }

    async fn get_batch(
        &self,
        token: &str,
        contract: &str,
        batch_id: &str,
    ) -> Result<GetBatchResponse> {
        let url = self.contract_url(contract, &format!("/batches/{}", batch_id));
        debug!(url = %url, "fetching transfer batch");

        let response = self
            .client
            .get(url)
            .header("Authorization", format!("Bearer {}", token))
            .send()
            .await
            .map_err(|e| Error::Request(format!("batch query request failed: {}", e)))?;

        Self::decode(response, Error::Request).await
    }

    async fn put_batch(
        &self,
        token: &str,
        contract: &str,
        batch_id: &str,
        body: &PutBatchRequest,
    ) -> Result<PutBatchResponse> {
        let url = self.contract_url(contract, &format!("/batches/{}", batch_id));
        debug!(url = %url, transfers = body.transfers.len(), "submitting transfer batch");

        let response = self
            .client
            .put(url)
            .header("Authorization", format!("Bearer {}", token))
            .json(body)
            .send()
            .await
            .map_err(|e| Error::Request(format!("transfer submission failed: {}", e)))?;

        Self::decode(response, Error::Request).await
    }

    async fn cancel_batch(
        &self,
        token: &str,
        contract: &str,
        batch_id: &str,
    ) -> Result<CancelBatchResponse> {
        let url = self.contract_url(contract, &format!("/batches/{}", batch_id));
        debug!(url = %url, "cancelling transfer batch");

        let response = self
            .client
            .delete(url)
            .header("Authorization", format!("Bearer {}", token))
            .send()
            .await
            .map_err(|e| Error::Request(format!("batch cancellation failed: {}", e)))?;

        Self::decode(response, Error::Request).await
    }
}
