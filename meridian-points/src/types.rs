//! Domain types for points, transfers, and transfer batches
//!
//! All of these are transient views reconstructed from service responses;
//! field names follow the service's camelCase wire format.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Point type a balance or batch is accounted under
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum PointType {
    Liquidity,
    Developer,
}

/// Lifecycle status of a transfer batch
///
/// Transitions are server-owned; the client only observes them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum BatchStatus {
    Pending,
    Cancelled,
    Finalizing,
    Finalized,
}

/// A single point transfer to a recipient address
///
/// Sent to the service verbatim; `points` is a decimal string whose format
/// and precision are validated server-side.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PointsTransfer {
    /// Recipient chain address
    pub to_address: String,
    /// Amount as a decimal string
    pub points: String,
}

/// Metadata of a transfer batch
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransferBatch {
    /// Contract the batch belongs to
    pub contract_address: String,
    /// Batch identifier (the batch's identity)
    pub id: String,
    /// Point type of all transfers in the batch
    pub point_type: PointType,
    /// Creation time
    pub created_at: DateTime<Utc>,
    /// Last update time, if any
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
    /// Current lifecycle status
    pub status: BatchStatus,
    /// Sum of transferred points as a decimal string
    pub points: String,
    /// Number of transfers in the batch
    pub transfer_count: u64,
}

/// A transfer batch together with its constituent transfers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransferBatchList {
    /// Batch metadata
    #[serde(flatten)]
    pub batch: TransferBatch,
    /// The batch's transfers
    pub transfers: Vec<PointsTransfer>,
}

/// One page of transfer history
#[derive(Debug, Clone, PartialEq)]
pub struct TransferBatchPage {
    /// Batches in server-provided order
    pub batches: Vec<TransferBatch>,
    /// Cursor for the next page; `None` on the final page
    pub cursor: Option<String>,
}

/// Point balances for a single point type
///
/// All counters are decimal strings; the cumulative counters are monotonically
/// non-decreasing even while underlying batches are still finalizing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PointBalances {
    /// Points currently available to transfer
    pub available: String,
    /// Points locked in pending outbound batches
    pub pending_sent: String,
    /// Total points ever earned
    pub earned_cumulative: String,
    /// Total points ever received
    pub received_cumulative: String,
    /// Total points sent in finalized batches
    pub finalized_sent_cumulative: String,
}

/// Point balances for both point types of a contract
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PointsBalancesAcross {
    /// Liquidity point balances
    pub liquidity: PointBalances,
    /// Developer point balances
    pub developer: PointBalances,
}
