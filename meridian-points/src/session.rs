//! Client session for the points service

use std::sync::Arc;

use tracing::debug;
use uuid::Uuid;

use crate::api::{HttpPointsApi, PointsApi, PutBatchRequest};
use crate::auth::TokenManager;
use crate::config::SessionConfig;
use crate::error::{Error, Result};
use crate::signer::OperatorKey;
use crate::types::{
    PointType, PointsBalancesAcross, PointsTransfer, TransferBatch, TransferBatchList,
    TransferBatchPage,
};

/// Operator session for one contract on the points service
///
/// Holds the operator key, the contract address, and the cached bearer token.
/// Every operation resolves a valid token (refreshing if necessary) before
/// issuing its HTTP call. The session is `Send + Sync`; share one instance
/// across tasks via `Arc` rather than creating one per call.
pub struct Session {
    api: Arc<dyn PointsApi>,
    tokens: TokenManager,
    contract_address: String,
    operator_address: String,
    seconds_to_finalize: Option<u64>,
}

impl Session {
    /// Create a session against the live points service
    ///
    /// Fails with [`Error::Config`] before any network call if the operator
    /// key or contract address is missing or malformed.
    pub fn new(config: SessionConfig) -> Result<Self> {
        let api = HttpPointsApi::new(&config.resolved_base_url())?;
        Self::with_api(config, Arc::new(api))
    }

    /// Create a session over a caller-supplied transport
    pub fn with_api(config: SessionConfig, api: Arc<dyn PointsApi>) -> Result<Self> {
        let key_hex = config.operator_key.as_deref().ok_or_else(|| {
            Error::Config("operator private key is not configured".to_string())
        })?;
        let key = OperatorKey::from_hex(key_hex)?;

        let contract_address = config.contract_address.clone().ok_or_else(|| {
            Error::Config("contract address is not configured".to_string())
        })?;

        let operator_address = key.address();
        debug!(operator = %operator_address, contract = %contract_address, "session created");

        Ok(Self {
            tokens: TokenManager::new(api.clone(), key, contract_address.clone()),
            api,
            contract_address,
            operator_address,
            seconds_to_finalize: config.seconds_to_finalize,
        })
    }

    /// Checksummed operator address derived from the configured key
    pub fn operator_address(&self) -> &str {
        &self.operator_address
    }

    /// Contract address this session operates on
    pub fn contract_address(&self) -> &str {
        &self.contract_address
    }

    /// Query point balances for both point types of the contract
    pub async fn query_points(&self) -> Result<PointsBalancesAcross> {
        let token = self.tokens.bearer_token().await?;
        let response = self
            .api
            .point_balances(&token, &self.contract_address)
            .await?;
        if !response.success {
            return Err(Error::Request(
                "points service failed to return point balances".to_string(),
            ));
        }

        let balances = response.balances_by_point_type.ok_or_else(|| {
            Error::Request("point balances response is missing balancesByPointType".to_string())
        })?;
        Ok(PointsBalancesAcross {
            liquidity: balances.liquidity,
            developer: balances.developer,
        })
    }

    /// Query a single transfer batch with its constituent transfers
    pub async fn query_transfer(&self, batch_id: &str) -> Result<TransferBatchList> {
        let token = self.tokens.bearer_token().await?;
        let response = self
            .api
            .get_batch(&token, &self.contract_address, batch_id)
            .await?;
        if !response.success {
            return Err(Error::Request(format!(
                "points service failed to return transfer batch {}",
                batch_id
            )));
        }

        response.batch.ok_or_else(|| {
            Error::Request(format!("transfer batch {} is missing from the response", batch_id))
        })
    }

    /// Cancel a transfer batch
    ///
    /// Only meaningful while the batch is PENDING or FINALIZING; the service
    /// enforces that, not the client.
    pub async fn cancel_transfer(&self, batch_id: &str) -> Result<()> {
        let token = self.tokens.bearer_token().await?;
        let response = self
            .api
            .cancel_batch(&token, &self.contract_address, batch_id)
            .await?;
        if !response.success {
            return Err(Error::Request(format!(
                "points service failed to cancel transfer batch {}",
                batch_id
            )));
        }

        Ok(())
    }

    /// Submit a batch of point transfers, returning the batch id
    ///
    /// When `batch_id` is absent a fresh random identifier is generated per
    /// call. Resubmitting with the same explicit id is the caller's
    /// retry-safety mechanism; the client performs no deduplication.
    pub async fn transfer(
        &self,
        point_type: PointType,
        transfers: Vec<PointsTransfer>,
        batch_id: Option<String>,
    ) -> Result<String> {
        let batch_id = batch_id.unwrap_or_else(|| Uuid::new_v4().to_string());
        let body = PutBatchRequest {
            point_type,
            transfers,
            seconds_to_finalize: self.seconds_to_finalize,
        };

        let token = self.tokens.bearer_token().await?;
        let response = self
            .api
            .put_batch(&token, &self.contract_address, &batch_id, &body)
            .await?;
        if !response.success {
            return Err(Error::Request(format!(
                "points service rejected transfer batch {}",
                batch_id
            )));
        }

        response.batch_id.ok_or_else(|| {
            Error::Request("transfer response is missing batchId".to_string())
        })
    }

    /// Submit liquidity point transfers
    pub async fn transfer_liquidity(
        &self,
        transfers: Vec<PointsTransfer>,
        batch_id: Option<String>,
    ) -> Result<String> {
        self.transfer(PointType::Liquidity, transfers, batch_id).await
    }

    /// Submit developer point transfers
    pub async fn transfer_developer(
        &self,
        transfers: Vec<PointsTransfer>,
        batch_id: Option<String>,
    ) -> Result<String> {
        self.transfer(PointType::Developer, transfers, batch_id).await
    }

    /// Fetch one page of transfer history
    pub async fn list_transfers(&self, cursor: Option<&str>) -> Result<TransferBatchPage> {
        let token = self.tokens.bearer_token().await?;
        let response = self
            .api
            .list_batches(&token, &self.contract_address, cursor)
            .await?;
        if !response.success {
            return Err(Error::Request(
                "points service failed to list transfer batches".to_string(),
            ));
        }

        debug!(
            batches = response.batches.len(),
            has_more = response.cursor.is_some(),
            "fetched transfer batch page"
        );
        Ok(TransferBatchPage {
            batches: response.batches,
            cursor: response.cursor,
        })
    }

    /// Fetch the complete transfer history, following cursors to the end
    ///
    /// Batches accumulate in server-provided page order with no client-side
    /// sort or dedup. A failure at any page aborts the whole traversal.
    pub async fn query_transfer_history(&self) -> Result<Vec<TransferBatch>> {
        let mut page = self.list_transfers(None).await?;
        let mut batches = page.batches;

        while let Some(cursor) = page.cursor {
            page = self.list_transfers(Some(&cursor)).await?;
            batches.append(&mut page.batches);
        }

        Ok(batches)
    }
}
