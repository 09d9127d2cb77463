use crate::address::Address;
use crate::amount::TokenAmount;
use crate::asset::{AssetId, AssetMetadata, ShareType};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[serde(transparent)]
pub struct RequestId(pub u64);

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum RequestStatus {
    Pending,
    Approved,
    Rejected,
    Cancelled,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct ShareStructure {
    pub total_shares: u64,
    pub price_per_share: TokenAmount,
    pub min_purchase_amount: u64,
    pub max_purchase_amount: u64,
    pub share_type: ShareType,
}

/// Payload of a create-request write.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct NewAssetRequest {
    pub metadata: AssetMetadata,
    pub shares: ShareStructure,
    pub requires_purchaser_kyc: bool,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct FractionalizationRequest {
    pub id: RequestId,
    pub proposer: Address,
    pub metadata: AssetMetadata,
    pub shares: ShareStructure,
    pub requires_purchaser_kyc: bool,
    pub status: RequestStatus,
    /// Set once the request is approved and the asset is minted.
    pub asset_id: Option<AssetId>,
    pub rejection_reason: Option<String>,
    pub submitted_at: u64,
}

impl FractionalizationRequest {
    pub fn from_new(id: RequestId, proposer: Address, new: NewAssetRequest, submitted_at: u64) -> Self {
        Self {
            id,
            proposer,
            metadata: new.metadata,
            shares: new.shares,
            requires_purchaser_kyc: new.requires_purchaser_kyc,
            status: RequestStatus::Pending,
            asset_id: None,
            rejection_reason: None,
            submitted_at,
        }
    }

    pub fn is_pending(&self) -> bool {
        self.status == RequestStatus::Pending
    }
}
