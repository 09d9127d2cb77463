use crate::address::Address;
use crate::amount::TokenAmount;
use crate::asset::AssetId;
use crate::request::RequestId;
use serde::{Deserialize, Serialize};

/// Notifications emitted by the ledger after a successful write.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub enum LedgerEvent {
    RequestCreated {
        request_id: RequestId,
        proposer: Address,
        asset_name: String,
        total_shares: u64,
        price_per_share: TokenAmount,
    },
    RequestApproved {
        request_id: RequestId,
        asset_id: AssetId,
        approver: Address,
    },
    RequestRejected {
        request_id: RequestId,
        rejector: Address,
        reason: String,
    },
    SharesPurchased {
        asset_id: AssetId,
        buyer: Address,
        amount: u64,
        total_cost: TokenAmount,
    },
    SharesTransferred {
        asset_id: AssetId,
        from: Address,
        to: Address,
        amount: u64,
    },
    RevenueWithdrawn {
        asset_id: AssetId,
        creator: Address,
        amount: TokenAmount,
    },
}

impl LedgerEvent {
    /// The asset whose listing this event changes, if any.
    pub fn asset_id(&self) -> Option<AssetId> {
        match self {
            LedgerEvent::RequestApproved { asset_id, .. }
            | LedgerEvent::SharesPurchased { asset_id, .. }
            | LedgerEvent::SharesTransferred { asset_id, .. }
            | LedgerEvent::RevenueWithdrawn { asset_id, .. } => Some(*asset_id),
            LedgerEvent::RequestCreated { .. } | LedgerEvent::RequestRejected { .. } => None,
        }
    }
}
