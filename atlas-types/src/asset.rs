use crate::address::Address;
use crate::amount::TokenAmount;
use crate::request::{FractionalizationRequest, RequestId};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[serde(transparent)]
pub struct AssetId(pub u64);

impl fmt::Display for AssetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub enum AssetCategory {
    #[default]
    #[serde(rename = "Real Estate")]
    RealEstate,
    Art,
    Collectibles,
    Commodities,
    Vehicles,
    Other,
}

impl AssetCategory {
    pub const ALL: [AssetCategory; 6] = [
        AssetCategory::RealEstate,
        AssetCategory::Art,
        AssetCategory::Collectibles,
        AssetCategory::Commodities,
        AssetCategory::Vehicles,
        AssetCategory::Other,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            AssetCategory::RealEstate => "Real Estate",
            AssetCategory::Art => "Art",
            AssetCategory::Collectibles => "Collectibles",
            AssetCategory::Commodities => "Commodities",
            AssetCategory::Vehicles => "Vehicles",
            AssetCategory::Other => "Other",
        }
    }
}

impl fmt::Display for AssetCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for AssetCategory {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase().replace(['-', '_'], " ");
        AssetCategory::ALL
            .into_iter()
            .find(|c| c.label().to_lowercase() == wanted)
            .ok_or_else(|| format!("unknown asset category `{s}`"))
    }
}

/// How ownership rights attach to shares.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum ShareType {
    /// Proportional ownership based on investment.
    #[default]
    Weighted,
    /// Fixed units with equal rights.
    Equal,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum AssetStatus {
    Pending,
    Approved,
    Active,
    Rejected,
    Cancelled,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Default)]
pub struct AssetMetadata {
    pub name: String,
    pub description: String,
    pub image_url: String,
    pub category: AssetCategory,
}

/// A tokenized asset as reported by the ledger.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct FractionalizedAsset {
    pub id: AssetId,
    pub request_id: RequestId,
    pub creator: Address,
    pub metadata: AssetMetadata,
    pub total_shares: u64,
    pub available_shares: u64,
    pub price_per_share: TokenAmount,
    pub min_purchase_amount: u64,
    /// Per-user cap; zero means unlimited.
    pub max_purchase_amount: u64,
    pub requires_purchaser_kyc: bool,
    pub share_type: ShareType,
    pub status: AssetStatus,
    pub total_revenue: TokenAmount,
    pub created_at: u64,
}

impl FractionalizedAsset {
    /// Mints the listing for an approved request with its full supply available.
    pub fn from_request(request: &FractionalizationRequest, id: AssetId, created_at: u64) -> Self {
        Self {
            id,
            request_id: request.id,
            creator: request.proposer,
            metadata: request.metadata.clone(),
            total_shares: request.shares.total_shares,
            available_shares: request.shares.total_shares,
            price_per_share: request.shares.price_per_share,
            min_purchase_amount: request.shares.min_purchase_amount,
            max_purchase_amount: request.shares.max_purchase_amount,
            requires_purchaser_kyc: request.requires_purchaser_kyc,
            share_type: request.shares.share_type,
            status: AssetStatus::Active,
            total_revenue: TokenAmount::ZERO,
            created_at,
        }
    }

    pub fn is_active(&self) -> bool {
        self.status == AssetStatus::Active
    }

    pub fn sold_shares(&self) -> u64 {
        self.total_shares.saturating_sub(self.available_shares)
    }

    pub fn has_purchase_cap(&self) -> bool {
        self.max_purchase_amount > 0
    }

    pub fn is_sold_out(&self) -> bool {
        self.available_shares == 0
    }
}
